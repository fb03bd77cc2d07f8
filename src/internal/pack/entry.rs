//! Lightweight representation of one object headed into a pack stream, with
//! conversions from the strongly typed object model.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{
    hash::ObjectHash,
    internal::object::{ObjectTrait, blob::Blob, commit::Commit, tree::Tree, types::ObjectType},
};

/// One packable object: its type, its payload (loose form without the
/// header), and its id.
#[derive(Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Entry {
    pub obj_type: ObjectType,
    pub data: Vec<u8>,
    pub hash: ObjectHash,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.obj_type == other.obj_type && self.hash == other.hash
    }
}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.obj_type.hash(state);
        self.hash.hash(state);
    }
}

impl Entry {
    /// Reconstruct the loose form `"<kind> <len>\0<payload>"`.
    pub fn to_loose(&self) -> Vec<u8> {
        let mut loose = Vec::with_capacity(self.data.len() + 16);
        loose.extend(self.obj_type.to_bytes());
        loose.push(b' ');
        loose.extend(self.data.len().to_string().as_bytes());
        loose.push(b'\x00');
        loose.extend(&self.data);
        loose
    }
}

impl From<Blob> for Entry {
    fn from(value: Blob) -> Self {
        Self {
            obj_type: ObjectType::Blob,
            data: value.data,
            hash: value.id,
        }
    }
}

impl From<Commit> for Entry {
    fn from(value: Commit) -> Self {
        Self {
            obj_type: ObjectType::Commit,
            data: value.to_data().unwrap(),
            hash: value.id,
        }
    }
}

impl From<Tree> for Entry {
    fn from(value: Tree) -> Self {
        Self {
            obj_type: ObjectType::Tree,
            data: value.to_data().unwrap(),
            hash: value.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ObjectHash;

    #[test]
    fn test_loose_form_hashes_to_entry_hash() {
        let blob = Blob::from_content("hello\n");
        let entry = Entry::from(blob);
        assert_eq!(ObjectHash::new(&entry.to_loose()), entry.hash);
    }
}

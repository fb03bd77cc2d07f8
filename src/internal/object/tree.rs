//! The Tree object represents one directory. Each entry pairs a file mode,
//! an entry name, and the id of the referenced blob or subtree. The payload
//! is the concatenation of `"<mode> <name>\0"` followed by the 20 raw hash
//! bytes, with entries in Git's canonical order: byte-lexicographic by
//! name, where directory names compare as if they ended with `/`.

use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::GitError;
use crate::hash::{HASH_SIZE, ObjectHash};
use crate::internal::object::ObjectTrait;
use crate::internal::object::types::ObjectType;

/// File mode of a tree entry, in the ASCII octal form Git serializes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TreeItemMode {
    /// Regular file, `100644`.
    Blob,
    /// Executable file, `100755`.
    BlobExecutable,
    /// Symbolic link, `120000`; the blob holds the link target.
    Link,
    /// Subdirectory, `40000`.
    Tree,
}

impl Display for TreeItemMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TreeItemMode::Blob => write!(f, "100644"),
            TreeItemMode::BlobExecutable => write!(f, "100755"),
            TreeItemMode::Link => write!(f, "120000"),
            TreeItemMode::Tree => write!(f, "40000"),
        }
    }
}

impl TreeItemMode {
    /// Mode digits as serialized into the tree payload.
    pub fn to_bytes(self) -> &'static [u8] {
        match self {
            TreeItemMode::Blob => b"100644",
            TreeItemMode::BlobExecutable => b"100755",
            TreeItemMode::Link => b"120000",
            TreeItemMode::Tree => b"40000",
        }
    }

    /// Parse the mode digits of a tree entry.
    pub fn tree_item_type_from_bytes(mode: &[u8]) -> Result<TreeItemMode, GitError> {
        Ok(match mode {
            b"100644" | b"644" => TreeItemMode::Blob,
            b"100755" | b"755" => TreeItemMode::BlobExecutable,
            b"120000" => TreeItemMode::Link,
            b"40000" | b"040000" => TreeItemMode::Tree,
            _ => {
                return Err(GitError::InvalidTreeItem(
                    String::from_utf8_lossy(mode).to_string(),
                ));
            }
        })
    }
}

/// One entry of a tree: mode, referenced object id, and entry name
/// (a single path component, never containing `/` or NUL).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TreeItem {
    pub mode: TreeItemMode,
    pub id: ObjectHash,
    pub name: String,
}

impl TreeItem {
    pub fn new(mode: TreeItemMode, id: ObjectHash, name: String) -> TreeItem {
        TreeItem { mode, id, name }
    }

    /// Serialize to `"<mode> <name>\0"` + 20 raw hash bytes.
    pub fn to_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.name.len() + HASH_SIZE + 8);
        data.extend(self.mode.to_bytes());
        data.push(b' ');
        data.extend(self.name.as_bytes());
        data.push(b'\x00');
        data.extend(self.id.as_ref());
        data
    }

    /// Sort key implementing Git's tree ordering: a directory entry
    /// compares as if its name carried a trailing slash.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.as_bytes().to_vec();
        if self.mode == TreeItemMode::Tree {
            key.push(b'/');
        }
        key
    }

    fn validate(&self) -> Result<(), GitError> {
        if self.name.is_empty()
            || self.name.as_bytes().contains(&b'\x00')
            || self.name.contains('/')
        {
            return Err(GitError::InvalidTreeItem(self.name.clone()));
        }
        Ok(())
    }
}

impl Display for TreeItem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {}", self.mode, self.id, self.name)
    }
}

/// A directory snapshot: a sorted list of entries, addressed by the SHA-1
/// of the serialized payload. An empty tree is valid (an empty directory
/// root still produces a commit-able tree).
#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub id: ObjectHash,
    pub tree_items: Vec<TreeItem>,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Type: Tree: {}", self.id)?;
        for item in &self.tree_items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

impl Tree {
    /// Build a tree from entries, sorting them canonically and computing
    /// the id. Entry names are validated (non-empty, no `/`, no NUL).
    pub fn from_tree_items(mut tree_items: Vec<TreeItem>) -> Result<Tree, GitError> {
        for item in &tree_items {
            item.validate()?;
        }
        tree_items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut tree = Tree {
            id: ObjectHash::default(),
            tree_items,
        };
        tree.id = ObjectHash::from_type_and_data(ObjectType::Tree, &tree.to_data()?);
        Ok(tree)
    }
}

impl ObjectTrait for Tree {
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError> {
        let mut tree_items = Vec::new();
        let mut rest = data;
        while !rest.is_empty() {
            let name_end = rest.find_byte(b'\x00').ok_or(GitError::InvalidTreeObject)?;
            if rest.len() < name_end + 1 + HASH_SIZE {
                return Err(GitError::InvalidTreeObject);
            }
            let mode_end = rest[..name_end]
                .find_byte(b' ')
                .ok_or(GitError::InvalidTreeObject)?;
            let mode = TreeItemMode::tree_item_type_from_bytes(&rest[..mode_end])?;
            let name = String::from_utf8_lossy(&rest[mode_end + 1..name_end]).to_string();
            let id = ObjectHash::from_bytes(&rest[name_end + 1..name_end + 1 + HASH_SIZE])
                .map_err(GitError::InvalidHashValue)?;

            tree_items.push(TreeItem::new(mode, id, name));
            rest = &rest[name_end + 1 + HASH_SIZE..];
        }
        Ok(Tree {
            id: hash,
            tree_items,
        })
    }

    fn get_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        let mut data = Vec::new();
        for item in &self.tree_items {
            data.extend(item.to_data());
        }
        Ok(data)
    }
}

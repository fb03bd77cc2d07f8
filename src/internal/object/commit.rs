//! The Commit object records one version of the tree together with its
//! provenance: the top-level tree id, zero or more parent commit ids, the
//! author and committer signatures, and the message. The serialized form is
//! line oriented: `tree`, optional `parent` lines, `author`, `committer`,
//! a blank line, then the message with no trailing newline appended.

use std::fmt::Display;
use std::str::FromStr;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::GitError;
use crate::hash::ObjectHash;
use crate::internal::object::ObjectTrait;
use crate::internal::object::signature::Signature;
use crate::internal::object::types::ObjectType;

#[derive(Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectHash,
    pub tree_id: ObjectHash,
    pub parent_commit_ids: Vec<ObjectHash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "tree: {}", self.tree_id)?;
        for parent in self.parent_commit_ids.iter() {
            writeln!(f, "parent: {parent}")?;
        }
        writeln!(f, "author {}", self.author)?;
        writeln!(f, "committer {}", self.committer)?;
        writeln!(f, "{}", self.message)
    }
}

impl Commit {
    pub fn new(
        author: Signature,
        committer: Signature,
        tree_id: ObjectHash,
        parent_commit_ids: Vec<ObjectHash>,
        message: &str,
    ) -> Commit {
        let mut commit = Commit {
            id: ObjectHash::default(),
            tree_id,
            parent_commit_ids,
            author,
            committer,
            message: message.to_string(),
        };
        commit.id =
            ObjectHash::from_type_and_data(ObjectType::Commit, &commit.to_data().unwrap());
        commit
    }
}

impl ObjectTrait for Commit {
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError> {
        let mut rest = data;

        // tree <hex>\n
        let tree_end = rest.find_byte(b'\x0a').ok_or(GitError::InvalidCommitObject)?;
        let tree_line = &rest[..tree_end];
        let tree_hex = tree_line
            .strip_prefix(b"tree ")
            .ok_or(GitError::InvalidCommitObject)?;
        let tree_id = ObjectHash::from_str(
            tree_hex
                .to_str()
                .map_err(|_| GitError::InvalidCommitObject)?,
        )
        .map_err(GitError::InvalidHashValue)?;
        rest = &rest[tree_end + 1..];

        // zero or more parent <hex>\n
        let mut parent_commit_ids = Vec::new();
        while let Some(parent_hex) = rest
            .find_byte(b'\x0a')
            .and_then(|end| rest[..end].strip_prefix(b"parent "))
        {
            let parent = ObjectHash::from_str(
                parent_hex
                    .to_str()
                    .map_err(|_| GitError::InvalidCommitObject)?,
            )
            .map_err(GitError::InvalidHashValue)?;
            parent_commit_ids.push(parent);
            rest = &rest[rest.find_byte(b'\x0a').unwrap() + 1..];
        }

        // author line
        let author_end = rest.find_byte(b'\x0a').ok_or(GitError::InvalidCommitObject)?;
        let author = Signature::from_data(rest[..author_end].to_vec())?;
        rest = &rest[author_end + 1..];

        // committer line
        let committer_end = rest.find_byte(b'\x0a').ok_or(GitError::InvalidCommitObject)?;
        let committer = Signature::from_data(rest[..committer_end].to_vec())?;
        rest = &rest[committer_end + 1..];

        // A blank line separates the headers from the message.
        let message = match rest.first() {
            Some(b'\x0a') => String::from_utf8_lossy(&rest[1..]).to_string(),
            _ => String::from_utf8_lossy(rest).to_string(),
        };

        Ok(Commit {
            id: hash,
            tree_id,
            parent_commit_ids,
            author,
            committer,
            message,
        })
    }

    fn get_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    /// [Git-Internals-Git-Objects](https://git-scm.com/book/en/v2/Git-Internals-Git-Objects)
    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        let mut data = Vec::new();

        data.extend(b"tree ");
        data.extend(self.tree_id.to_string().as_bytes());
        data.extend(&[0x0a]);

        for parent_commit_id in &self.parent_commit_ids {
            data.extend(b"parent ");
            data.extend(parent_commit_id.to_string().as_bytes());
            data.extend(&[0x0a]);
        }

        data.extend(self.author.to_data()?);
        data.extend(&[0x0a]);
        data.extend(self.committer.to_data()?);
        data.extend(&[0x0a]);
        data.extend(&[0x0a]);
        data.extend(self.message.as_bytes());

        Ok(data)
    }
}

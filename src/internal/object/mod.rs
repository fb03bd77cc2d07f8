//! Object model definitions for Git blobs, trees, and commits, and the
//! trait that lets the pack and snapshot layers create strongly typed
//! values from raw bytes.

pub mod blob;
pub mod commit;
pub mod signature;
pub mod tree;
pub mod types;

use std::fmt::Display;

use crate::{errors::GitError, hash::ObjectHash, internal::object::types::ObjectType};

/// **The Object Trait**
/// Defines the common interface for all Git object types, including blobs, trees, and commits.
pub trait ObjectTrait: Send + Sync + Display {
    /// Creates a new object from a byte slice (the payload, without the
    /// loose-form header).
    fn from_bytes(data: &[u8], hash: ObjectHash) -> Result<Self, GitError>
    where
        Self: Sized;

    /// Returns the type of the object.
    fn get_type(&self) -> ObjectType;

    /// Serializes the object payload, i.e. the loose form without the
    /// `"<kind> <len>\0"` header.
    fn to_data(&self) -> Result<Vec<u8>, GitError>;

    /// Computes the object hash from serialized data.
    ///
    /// Default implementation serializes the object and computes the hash from that data.
    fn object_hash(&self) -> Result<ObjectHash, GitError> {
        let data = self.to_data()?;
        Ok(ObjectHash::from_type_and_data(self.get_type(), &data))
    }
}

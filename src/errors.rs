//! Error types for the gitdir crate.
//!
//! A unified error enumeration used across object construction, snapshot
//! assembly, and pack encoding. Integrates with `thiserror` for `Display`
//! implementations and source chaining.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for object, snapshot, and pack operations.
pub enum GitError {
    /// Invalid or unsupported git object type name.
    #[error("The `{0}` is not a valid git object type.")]
    InvalidObjectType(String),

    /// Malformed tree object.
    #[error("Not a valid git tree object.")]
    InvalidTreeObject,

    /// Invalid tree entry (mode/name/hash).
    #[error("The `{0}` is not a valid git tree item.")]
    InvalidTreeItem(String),

    /// Invalid commit signature line.
    #[error("The `{0}` is not a valid git commit signature.")]
    InvalidSignatureType(String),

    /// Malformed commit object.
    #[error("Not a valid git commit object.")]
    InvalidCommitObject,

    /// I/O error from underlying reader, writer, or filesystem walk.
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    /// Invalid SHA-1 hash formatting or value.
    #[error("The `{0}` is not a valid hash value.")]
    InvalidHashValue(String),

    /// Failed to encode entries into a pack.
    #[error("Can't encode entries to pack: {0}")]
    PackEncodeError(String),

    /// Object missing from the snapshot store.
    #[error("Can't find specific object: {0}")]
    ObjectNotFound(String),
}

//! SHA-1 content addressing for Git objects.
//!
//! Every object is named by the SHA-1 of its loose form,
//! `"<kind> <len>\0<payload>"`. The hex rendering is always lowercase.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::internal::object::types::ObjectType;

/// Raw byte length of a SHA-1 digest.
pub const HASH_SIZE: usize = 20;
/// Hex string length of a SHA-1 digest.
pub const HASH_HEX_LEN: usize = 40;

/// The all-zero id, used by the wire protocol to mean "no object".
pub const ZERO_ID: &str = "0000000000000000000000000000000000000000";

/// A Git object id: the SHA-1 digest of the object's loose form.
///
/// Supports conversion to/from hex strings, byte slices, and stream reading.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub struct ObjectHash(pub [u8; HASH_SIZE]);

impl Display for ObjectHash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for ObjectHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

/// Parse 40 lowercase/uppercase hex characters into an `ObjectHash`.
impl FromStr for ObjectHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_HEX_LEN {
            return Err("Invalid hash length".to_string());
        }
        let mut h = [0u8; HASH_SIZE];
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        h.copy_from_slice(bytes.as_slice());
        Ok(ObjectHash(h))
    }
}

impl ObjectHash {
    /// Compute the SHA-1 of raw data.
    pub fn new(data: &[u8]) -> ObjectHash {
        let digest = Sha1::digest(data);
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(digest.as_ref());
        ObjectHash(bytes)
    }

    /// Compute the object id from a kind and its payload, i.e.
    /// `SHA1("<kind> <len>\0<payload>")`.
    pub fn from_type_and_data(object_type: ObjectType, data: &[u8]) -> ObjectHash {
        let mut d: Vec<u8> = Vec::with_capacity(data.len() + 16);
        d.extend(object_type.to_bytes());
        d.push(b' ');
        d.extend(data.len().to_string().as_bytes());
        d.push(b'\x00');
        d.extend(data);
        ObjectHash::new(&d)
    }

    /// Create an `ObjectHash` from exactly 20 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<ObjectHash, String> {
        if bytes.len() != HASH_SIZE {
            return Err(format!(
                "Invalid byte length: got {}, expected {}",
                bytes.len(),
                HASH_SIZE
            ));
        }
        let mut h = [0u8; HASH_SIZE];
        h.copy_from_slice(bytes);
        Ok(ObjectHash(h))
    }

    /// Return the raw bytes of the hash.
    pub fn to_data(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

//! Writer for version-2 pack streams.
//!
//! Layout: `PACK` magic, a big-endian version word, a big-endian object
//! count, then one record per object (variable-length type+size header
//! followed by the zlib-deflated payload), and finally the SHA-1 of every
//! byte written before it.

use std::io::Write;

use bytes::{BufMut, BytesMut};
use flate2::{Compression, write::ZlibEncoder};
use sha1::{Digest, Sha1};

use crate::{
    errors::GitError,
    internal::pack::{PACK_MAGIC, PACK_VERSION, entry::Entry},
};

/// Encodes a fixed set of entries into an in-memory pack stream.
///
/// The trailing checksum is maintained by a rolling hasher, so the encoder
/// never revisits bytes it has already emitted.
pub struct PackEncoder {
    buf: BytesMut,
    hasher: Sha1,
    object_number: usize,
}

impl PackEncoder {
    pub fn new(object_number: usize) -> Self {
        PackEncoder {
            buf: BytesMut::new(),
            hasher: Sha1::new(),
            object_number,
        }
    }

    /// Encode all entries and return the complete pack bytes.
    ///
    /// The entry count must match the number announced at construction;
    /// a mismatch would produce a pack whose header lies to the client.
    pub fn encode(mut self, entries: Vec<Entry>) -> Result<Vec<u8>, GitError> {
        if entries.len() != self.object_number {
            return Err(GitError::PackEncodeError(format!(
                "entry count {} does not match declared object number {}",
                entries.len(),
                self.object_number
            )));
        }

        self.write_head()?;
        for entry in &entries {
            self.encode_one_object(entry)?;
        }

        let checksum = self.hasher.finalize();
        self.buf.extend_from_slice(&checksum);
        tracing::debug!(
            objects = self.object_number,
            bytes = self.buf.len(),
            "pack stream encoded"
        );
        Ok(self.buf.to_vec())
    }

    fn write(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.buf.extend_from_slice(data);
    }

    /// Write the pack header: magic, version, object count.
    fn write_head(&mut self) -> Result<(), GitError> {
        let mut head = BytesMut::with_capacity(12);
        head.extend_from_slice(PACK_MAGIC);
        head.put_u32(PACK_VERSION);
        head.put_u32(
            self.object_number
                .try_into()
                .map_err(|_| GitError::PackEncodeError("object count exceeds u32".to_string()))?,
        );
        self.write(&head);
        Ok(())
    }

    /// Write one object record: type+size header, then deflated payload.
    fn encode_one_object(&mut self, entry: &Entry) -> Result<(), GitError> {
        let header = encode_type_and_size(entry.obj_type.to_pack_type_u8(), entry.data.len());
        self.write(&header);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&entry.data)
            .map_err(|e| GitError::PackEncodeError(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| GitError::PackEncodeError(e.to_string()))?;
        self.write(&compressed);
        Ok(())
    }
}

/// Encode the per-object header. The first byte carries the 3 type bits
/// (6..4) and the low 4 size bits; each continuation byte carries 7 more
/// size bits, little-endian by byte, with bit 7 flagging continuation.
pub fn encode_type_and_size(type_bits: u8, mut size: usize) -> Vec<u8> {
    let mut header = Vec::with_capacity(4);
    let mut byte = (type_bits << 4) | ((size & 0x0f) as u8);
    size >>= 4;
    while size > 0 {
        header.push(byte | 0x80);
        byte = (size & 0x7f) as u8;
        size >>= 7;
    }
    header.push(byte);
    header
}

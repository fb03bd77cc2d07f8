//! Pack file encoding that follows the
//! [pack-format spec](https://git-scm.com/docs/pack-format): `PACK` magic,
//! version 2, object count, per-object type+size headers with zlib-deflated
//! payloads, and a trailing SHA-1 over everything before it.

pub mod encode;
pub mod entry;

/// Pack stream magic bytes.
pub const PACK_MAGIC: &[u8; 4] = b"PACK";
/// Only version 2 packs are produced.
pub const PACK_VERSION: u32 = 2;

#[cfg(test)]
pub(crate) mod tests {
    /// Shared tracing setup for pack tests; safe to call repeatedly.
    pub(crate) fn init_logger() {
        use tracing_subscriber::util::SubscriberInitExt;
        let _ = tracing_subscriber::fmt::Subscriber::builder()
            .with_target(false)
            .without_time()
            .with_level(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
            .try_init();
    }
}

//! Git smart-HTTP protocol engine: pkt-line framing, the ref advertisement,
//! upload-pack negotiation, side-band multiplexing, and the axum surface.

pub mod http;
pub mod smart;
pub mod types;
pub mod utils;

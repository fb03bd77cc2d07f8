//! pkt-line framing helpers shared by the smart protocol handlers.
//!
//! A pkt-line is four ASCII hex digits (a length that counts itself)
//! followed by the payload; `0000` is the flush packet. The readers here
//! never panic on malformed input: a bad frame yields a zero consumed
//! count and the caller stops scanning.

use bytes::{Buf, Bytes, BytesMut};

use super::types::PKT_LINE_END_MARKER;

/// Read one pkt-line from the front of `bytes`.
///
/// Returns `(consumed, payload)`. A flush packet consumes its four marker
/// bytes and yields an empty payload. Nothing is consumed when the buffer
/// is too short, the prefix is not hex, or the declared length is bogus.
pub fn read_pkt_line(bytes: &mut Bytes) -> (usize, Bytes) {
    let Some(prefix) = bytes.get(..4) else {
        return (0, Bytes::new());
    };
    let declared = core::str::from_utf8(prefix)
        .ok()
        .and_then(|hex| usize::from_str_radix(hex, 16).ok());

    match declared {
        None => {
            tracing::warn!(prefix = ?prefix, "pkt-line prefix is not four hex digits");
            (0, Bytes::new())
        }
        Some(0) => {
            bytes.advance(4);
            (4, Bytes::new()) // flush packet
        }
        Some(total @ 1..=3) => {
            tracing::warn!(declared = total, "pkt-line length below the framing minimum");
            (0, Bytes::new())
        }
        Some(total) if bytes.len() < total => {
            tracing::warn!(
                declared = total,
                available = bytes.len(),
                "pkt-line runs past the end of the buffer"
            );
            (0, Bytes::new())
        }
        Some(total) => {
            bytes.advance(4);
            let payload = bytes.copy_to_bytes(total - 4);
            tracing::debug!(pkt_line = ?payload);
            (total, payload)
        }
    }
}

/// Append `line` to `out` as a pkt-line, prefixing the self-inclusive
/// length.
pub fn add_pkt_line_string(out: &mut BytesMut, line: String) {
    out.extend_from_slice(format!("{:04x}", line.len() + 4).as_bytes());
    out.extend_from_slice(line.as_bytes());
}

/// Split the next token off the front of `bytes`, consuming the single
/// whitespace or NUL delimiter after it. Returns an empty string for a
/// token that is not valid UTF-8.
pub fn read_until_white_space(bytes: &mut Bytes) -> String {
    let token_len = bytes
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == 0)
        .unwrap_or(bytes.len());
    let token = bytes.split_to(token_len);
    if bytes.has_remaining() {
        bytes.advance(1); // delimiter
    }
    String::from_utf8(token.to_vec()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "request token is not UTF-8");
        String::new()
    })
}

/// Frame the smart HTTP advertisement: the `# service=` banner, a flush,
/// every ref line, and a closing flush.
pub fn build_smart_reply(ref_list: &[String], service: String) -> BytesMut {
    let mut reply = BytesMut::new();
    add_pkt_line_string(&mut reply, format!("# service={service}\n"));
    reply.extend_from_slice(PKT_LINE_END_MARKER);
    for ref_line in ref_list {
        add_pkt_line_string(&mut reply, ref_line.clone());
    }
    reply.extend_from_slice(PKT_LINE_END_MARKER);
    reply
}

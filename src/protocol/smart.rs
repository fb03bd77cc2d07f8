//! The upload-pack engine: ref advertisement, want/have negotiation, and
//! the side-band multiplexed pack response.
//!
//! Per clone the flow is two requests: the advertisement names the head
//! commit of the snapshot, the upload request asks for it by hash, and the
//! reply is a `NAK` followed by the pack stream. There is never a common
//! ancestor to acknowledge, so every clone ships a full pack.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    hash::ObjectHash,
    internal::pack::encode::PackEncoder,
    protocol::{
        types::{
            Capability, LF, NUL, PKT_LINE_END_MARKER, ProtocolError, SIDE_BAND_64K_DATA_MAX,
            SIDE_BAND_DATA_MAX, SP, ServiceType, SideBand, UPLOAD_CAP_LIST,
        },
        utils::{add_pkt_line_string, build_smart_reply, read_pkt_line, read_until_white_space},
    },
    snapshot::Snapshot,
};

/// Smart protocol engine for one request, borrowing the process-wide
/// snapshot. Capability state lives for a single upload-pack exchange.
pub struct SmartProtocol<'a> {
    snapshot: &'a Snapshot,
    pub capabilities: Vec<Capability>,
}

impl<'a> SmartProtocol<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            capabilities: Vec::new(),
        }
    }

    /// Build the `/info/refs` advertisement body.
    ///
    /// The head commit is announced twice: as `HEAD` (carrying the
    /// capability list behind the NUL) and as `refs/heads/main`.
    pub fn git_info_refs(&self) -> BytesMut {
        let head = self.snapshot.head.to_string();
        let ref_list = vec![
            format!("{head}{SP}HEAD{NUL}{UPLOAD_CAP_LIST}{LF}"),
            format!("{head}{SP}refs/heads/main{LF}"),
        ];
        let pkt_line_stream = build_smart_reply(&ref_list, ServiceType::UploadPack.to_string());
        tracing::debug!("git_info_refs, return: --------> {:?}", pkt_line_stream);
        pkt_line_stream
    }

    /// Handle a git-upload-pack request body and build the full response.
    pub fn git_upload_pack(&mut self, upload_request: Bytes) -> Result<BytesMut, ProtocolError> {
        self.capabilities.clear();
        let mut upload_request = upload_request;
        let mut want: Vec<String> = Vec::new();
        let mut have: Vec<String> = Vec::new();

        let mut read_first_line = false;
        loop {
            let (bytes_take, pkt_line) = read_pkt_line(&mut upload_request);

            if bytes_take == 0 {
                break;
            }

            if pkt_line.is_empty() {
                break;
            }

            let mut pkt_line = pkt_line;
            let command = read_until_white_space(&mut pkt_line);

            match command.as_str() {
                "want" => {
                    let hash = read_until_white_space(&mut pkt_line);
                    want.push(hash);
                    if !read_first_line {
                        let cap_str = String::from_utf8_lossy(&pkt_line).to_string();
                        self.parse_capabilities(&cap_str);
                        read_first_line = true;
                    }
                }
                "have" => {
                    let hash = read_until_white_space(&mut pkt_line);
                    have.push(hash);
                }
                "done" => {
                    break;
                }
                _ => {
                    tracing::warn!("Unknown upload-pack command: {}", command);
                }
            }
        }

        if want.is_empty() {
            return Err(ProtocolError::invalid_request(
                "No want lines in upload-pack request",
            ));
        }
        // A single-ref repository produces exactly one meaningful want.
        if want.len() > 1 {
            tracing::debug!("honoring first of {} want lines", want.len());
        }
        if !have.is_empty() {
            tracing::debug!("ignoring {} have lines, shipping full pack", have.len());
        }

        let want_hash: ObjectHash = want[0]
            .parse()
            .map_err(|_| ProtocolError::InvalidRequest(format!("Invalid want hash: {}", want[0])))?;

        let entries = self.snapshot.reachable_entries(&want_hash)?;
        let object_count = entries.len();
        let pack_data = PackEncoder::new(object_count).encode(entries)?;
        tracing::debug!(
            objects = object_count,
            bytes = pack_data.len(),
            "upload-pack response ready"
        );

        // No common objects to acknowledge: a clone always starts from scratch.
        let mut protocol_buf = BytesMut::new();
        add_pkt_line_string(&mut protocol_buf, String::from("NAK\n"));

        match self.side_band_data_limit() {
            Some(limit) => {
                if !self.capabilities.contains(&Capability::NoProgress) {
                    let progress = format!("Counting objects: {object_count}, done.\n");
                    add_side_band_chunk(
                        &mut protocol_buf,
                        SideBand::ProgressInfo,
                        progress.as_bytes(),
                    );
                }
                for chunk in pack_data.chunks(limit) {
                    add_side_band_chunk(&mut protocol_buf, SideBand::PackfileData, chunk);
                }
                protocol_buf.put(&PKT_LINE_END_MARKER[..]);
            }
            None => {
                // Without side-band the raw pack follows the NAK directly.
                protocol_buf.extend_from_slice(&pack_data);
            }
        }

        Ok(protocol_buf)
    }

    /// Parse capabilities from the tail of the first want line.
    pub fn parse_capabilities(&mut self, cap_str: &str) {
        for cap in cap_str.split_whitespace() {
            if let Ok(capability) = cap.parse::<Capability>() {
                self.capabilities.push(capability);
            }
        }
    }

    /// Largest data chunk per side-band packet for the negotiated
    /// capability set, or `None` when the client did not ask for side-band.
    fn side_band_data_limit(&self) -> Option<usize> {
        if self.capabilities.contains(&Capability::SideBand64k) {
            Some(SIDE_BAND_64K_DATA_MAX)
        } else if self.capabilities.contains(&Capability::SideBand) {
            Some(SIDE_BAND_DATA_MAX)
        } else {
            None
        }
    }
}

/// Append one side-band packet: 4-digit length covering the channel byte
/// and data, the channel byte, then the data.
pub fn add_side_band_chunk(to_bytes: &mut BytesMut, channel: SideBand, data: &[u8]) {
    let length = data.len() + 5;
    to_bytes.put(Bytes::from(format!("{length:04x}")));
    to_bytes.put_u8(channel.value());
    to_bytes.put(data);
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sha1::{Digest, Sha1};

    use super::*;
    use crate::hash::ZERO_ID;
    use crate::protocol::utils::read_pkt_line;
    use crate::snapshot::Snapshot;

    fn snapshot_with(files: &[(&str, &[u8])]) -> Snapshot {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        Snapshot::capture(tmp.path()).unwrap()
    }

    fn upload_request(lines: &[&str], done: bool) -> Bytes {
        let mut buf = BytesMut::new();
        for line in lines {
            add_pkt_line_string(&mut buf, format!("{line}\n"));
        }
        buf.put(&PKT_LINE_END_MARKER[..]);
        if done {
            add_pkt_line_string(&mut buf, "done\n".to_string());
        }
        buf.freeze()
    }

    /// Demultiplex a side-band response that starts after the NAK;
    /// returns (pack bytes, data chunk count, progress messages).
    fn demux_side_band(bytes: &mut Bytes) -> (Vec<u8>, usize, Vec<String>) {
        let mut pack = Vec::new();
        let mut chunks = 0;
        let mut progress = Vec::new();
        loop {
            let (consumed, line) = read_pkt_line(bytes);
            assert_ne!(consumed, 0, "response must end with a flush");
            if line.is_empty() {
                break; // flush
            }
            match line[0] {
                1 => {
                    chunks += 1;
                    pack.extend_from_slice(&line[1..]);
                }
                2 => progress.push(String::from_utf8_lossy(&line[1..]).to_string()),
                other => panic!("unexpected side-band channel {other}"),
            }
        }
        (pack, chunks, progress)
    }

    #[test]
    fn test_info_refs_layout() {
        let snapshot = snapshot_with(&[("a.txt", b"A")]);
        let head = snapshot.head.to_string();
        let smart = SmartProtocol::new(&snapshot);

        let mut bytes = smart.git_info_refs().freeze();

        let (_, banner) = read_pkt_line(&mut bytes);
        assert_eq!(&banner[..], b"# service=git-upload-pack\n");
        let (consumed, flush) = read_pkt_line(&mut bytes);
        assert_eq!((consumed, flush.len()), (4, 0));

        let (_, head_line) = read_pkt_line(&mut bytes);
        let head_line = head_line.to_vec();
        assert!(head_line.starts_with(format!("{head} HEAD\0").as_bytes()));
        let caps = String::from_utf8_lossy(&head_line);
        assert!(caps.contains("side-band-64k"));
        assert!(caps.contains("multi_ack_detailed"));

        // The second-to-last pkt-line names refs/heads/main.
        let (_, main_line) = read_pkt_line(&mut bytes);
        assert_eq!(main_line.to_vec(), format!("{head} refs/heads/main\n").into_bytes());

        let (consumed, flush) = read_pkt_line(&mut bytes);
        assert_eq!((consumed, flush.len()), (4, 0));
        assert!(bytes.is_empty());
    }

    /// The advertised head is stable across repeated advertisements.
    #[test]
    fn test_info_refs_stable_head() {
        let snapshot = snapshot_with(&[]);
        let smart = SmartProtocol::new(&snapshot);
        assert_eq!(smart.git_info_refs(), smart.git_info_refs());
    }

    #[test]
    fn test_upload_pack_full_clone() {
        let snapshot = snapshot_with(&[("a.txt", b"A"), ("b.txt", b"B")]);
        let head = snapshot.head.to_string();
        let mut smart = SmartProtocol::new(&snapshot);

        let request = upload_request(
            &[&format!("want {head} multi_ack_detailed side-band-64k ofs-delta")],
            true,
        );
        let mut response = smart.git_upload_pack(request).unwrap().freeze();

        let (_, nak) = read_pkt_line(&mut response);
        assert_eq!(&nak[..], b"NAK\n");

        let (pack, _, progress) = demux_side_band(&mut response);
        assert!(response.is_empty());
        assert!(!progress.is_empty());

        // 2 blobs + 1 tree + 1 commit.
        assert_eq!(&pack[..4], b"PACK");
        assert_eq!(u32::from_be_bytes(pack[8..12].try_into().unwrap()), 4);
        let trailer = &pack[pack.len() - 20..];
        assert_eq!(trailer, Sha1::digest(&pack[..pack.len() - 20]).as_slice());
    }

    #[test]
    fn test_upload_pack_without_side_band() {
        let snapshot = snapshot_with(&[("a.txt", b"A")]);
        let head = snapshot.head.to_string();
        let mut smart = SmartProtocol::new(&snapshot);

        let request = upload_request(&[&format!("want {head} multi_ack_detailed")], true);
        let mut response = smart.git_upload_pack(request).unwrap().freeze();

        let (_, nak) = read_pkt_line(&mut response);
        assert_eq!(&nak[..], b"NAK\n");
        // The raw pack follows the NAK, unframed.
        assert_eq!(&response[..4], b"PACK");
    }

    #[test]
    fn test_upload_pack_large_file_spans_chunks() {
        // Pseudo-random content stays incompressible enough to exceed one
        // side-band packet after deflate.
        let mut content = Vec::with_capacity(200_000);
        let mut state: u32 = 0x2545_f491;
        for _ in 0..200_000 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            content.push((state >> 24) as u8);
        }
        let snapshot = snapshot_with(&[("big.bin", &content)]);
        let head = snapshot.head.to_string();
        let mut smart = SmartProtocol::new(&snapshot);

        let request = upload_request(&[&format!("want {head} side-band-64k no-progress")], true);
        let mut response = smart.git_upload_pack(request).unwrap().freeze();

        let (_, nak) = read_pkt_line(&mut response);
        assert_eq!(&nak[..], b"NAK\n");
        let (pack, chunks, progress) = demux_side_band(&mut response);
        assert!(chunks > 1, "expected multiple side-band chunks");
        assert!(progress.is_empty(), "no-progress must silence channel 2");
        let trailer = &pack[pack.len() - 20..];
        assert_eq!(trailer, Sha1::digest(&pack[..pack.len() - 20]).as_slice());
    }

    #[test]
    fn test_upload_pack_ignores_haves() {
        let snapshot = snapshot_with(&[("a.txt", b"A")]);
        let head = snapshot.head.to_string();
        let mut smart = SmartProtocol::new(&snapshot);

        let request = upload_request(
            &[
                &format!("want {head} side-band-64k"),
                &format!("have {ZERO_ID}"),
            ],
            true,
        );
        let mut response = smart.git_upload_pack(request).unwrap().freeze();
        let (_, nak) = read_pkt_line(&mut response);
        assert_eq!(&nak[..], b"NAK\n");
    }

    #[test]
    fn test_upload_pack_no_want() {
        let snapshot = snapshot_with(&[]);
        let mut smart = SmartProtocol::new(&snapshot);
        let request = upload_request(&[], true);
        let res = smart.git_upload_pack(request);
        assert!(matches!(res, Err(ProtocolError::InvalidRequest(_))));
    }

    #[test]
    fn test_upload_pack_unknown_want() {
        let snapshot = snapshot_with(&[]);
        let mut smart = SmartProtocol::new(&snapshot);
        let request = upload_request(&[&format!("want {ZERO_ID}")], true);
        let res = smart.git_upload_pack(request);
        assert!(matches!(res, Err(ProtocolError::ObjectNotFound(_))));
    }

    #[test]
    fn test_upload_pack_malformed_want() {
        let snapshot = snapshot_with(&[]);
        let mut smart = SmartProtocol::new(&snapshot);
        let request = upload_request(&["want not-a-hash"], true);
        let res = smart.git_upload_pack(request);
        assert!(matches!(res, Err(ProtocolError::InvalidRequest(_))));
    }

    #[test]
    fn test_side_band_chunk_framing() {
        let mut buf = BytesMut::new();
        add_side_band_chunk(&mut buf, SideBand::PackfileData, b"data");
        // length = 4 (prefix) + 1 (channel) + 4 (data) = 9
        assert_eq!(&buf[..], b"0009\x01data");
    }
}

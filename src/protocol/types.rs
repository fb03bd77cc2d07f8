//! Shared protocol types: the error taxonomy, service identification,
//! capability parsing, side-band channels, and wire constants.

use std::fmt;
use std::str::FromStr;

use crate::errors::GitError;

/// Protocol error types
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid service: {0}")]
    InvalidService(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    pub fn invalid_service(service: &str) -> Self {
        ProtocolError::InvalidService(service.to_string())
    }

    pub fn invalid_request(msg: &str) -> Self {
        ProtocolError::InvalidRequest(msg.to_string())
    }
}

impl From<GitError> for ProtocolError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::ObjectNotFound(hash) => ProtocolError::ObjectNotFound(hash),
            GitError::IOError(e) => ProtocolError::Io(e),
            other => ProtocolError::Internal(other.to_string()),
        }
    }
}

/// Git service types for the smart protocol. Only upload-pack is served;
/// receive-pack is recognized so the rejection can name it.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ServiceType {
    UploadPack,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceType::UploadPack => write!(f, "git-upload-pack"),
        }
    }
}

impl FromStr for ServiceType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git-upload-pack" => Ok(ServiceType::UploadPack),
            _ => Err(ProtocolError::InvalidService(s.to_string())),
        }
    }
}

/// Capabilities negotiated over upload-pack.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// Multi-ack-detailed capability for granular acknowledgment
    MultiAckDetailed,
    /// Thin-pack capability for efficient pack transmission
    ThinPack,
    /// Side-band capability for multiplexing data streams
    SideBand,
    /// Side-band-64k capability for larger side-band packets
    SideBand64k,
    /// OFS-delta capability for offset-based delta compression
    OfsDelta,
    /// No-progress capability to suppress channel-2 output
    NoProgress,
    /// Agent capability for client/server identification
    Agent(String),
    /// Unknown capability for forward compatibility
    Unknown(String),
}

impl FromStr for Capability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("agent=") {
            return Ok(Capability::Agent(rest.to_string()));
        }
        match s {
            "multi_ack_detailed" => Ok(Capability::MultiAckDetailed),
            "thin-pack" => Ok(Capability::ThinPack),
            "side-band" => Ok(Capability::SideBand),
            "side-band-64k" => Ok(Capability::SideBand64k),
            "ofs-delta" => Ok(Capability::OfsDelta),
            "no-progress" => Ok(Capability::NoProgress),
            _ => Ok(Capability::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::MultiAckDetailed => write!(f, "multi_ack_detailed"),
            Capability::ThinPack => write!(f, "thin-pack"),
            Capability::SideBand => write!(f, "side-band"),
            Capability::SideBand64k => write!(f, "side-band-64k"),
            Capability::OfsDelta => write!(f, "ofs-delta"),
            Capability::NoProgress => write!(f, "no-progress"),
            Capability::Agent(agent) => write!(f, "agent={agent}"),
            Capability::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Side-band channels for multiplexed data streams
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SideBand {
    /// Channel 1 carries packfile data
    PackfileData,
    /// Channel 2 carries progress information
    ProgressInfo,
    /// Channel 3 carries a fatal error message
    Error,
}

impl SideBand {
    pub fn value(&self) -> u8 {
        match self {
            Self::PackfileData => b'\x01',
            Self::ProgressInfo => b'\x02',
            Self::Error => b'\x03',
        }
    }
}

/// Protocol constants
pub const LF: char = '\n';
pub const SP: char = ' ';
pub const NUL: char = '\0';
pub const PKT_LINE_END_MARKER: &[u8; 4] = b"0000";

/// Largest data chunk in one side-band-64k packet: 65535 minus the 4-byte
/// length, minus the channel byte, minus git's own slack.
pub const SIDE_BAND_64K_DATA_MAX: usize = 65519;
/// Largest data chunk when only plain side-band was negotiated.
pub const SIDE_BAND_DATA_MAX: usize = 995;

/// Capabilities advertised on the first ref of the upload-pack listing.
pub const UPLOAD_CAP_LIST: &str = concat!(
    "multi_ack_detailed thin-pack side-band side-band-64k ofs-delta ",
    "symref=HEAD:refs/heads/main agent=gitdir/",
    env!("CARGO_PKG_VERSION"),
);

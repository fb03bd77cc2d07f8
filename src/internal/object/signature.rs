//! The author/committer line of a commit object: a role tag, a name, an
//! email wrapped in angle brackets, the Unix timestamp in seconds, and a
//! timezone offset such as `+0000`.

use std::fmt::Display;

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::errors::GitError;

/// Which header line of the commit this signature belongs to.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SignatureType {
    Author,
    Committer,
}

impl Display for SignatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SignatureType::Author => write!(f, "author"),
            SignatureType::Committer => write!(f, "committer"),
        }
    }
}

impl SignatureType {
    pub fn from_data(data: &[u8]) -> Result<SignatureType, GitError> {
        match data {
            b"author" => Ok(SignatureType::Author),
            b"committer" => Ok(SignatureType::Committer),
            _ => Err(GitError::InvalidSignatureType(
                String::from_utf8_lossy(data).to_string(),
            )),
        }
    }
}

/// One `author`/`committer` header of a commit.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub signature_type: SignatureType,
    pub name: String,
    pub email: String,
    pub timestamp: i64,
    pub timezone: String,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name, self.email, self.timestamp, self.timezone
        )
    }
}

impl Signature {
    /// Build a signature with an explicit timestamp and timezone.
    pub fn new_with_time(
        signature_type: SignatureType,
        name: String,
        email: String,
        timestamp: i64,
        timezone: String,
    ) -> Signature {
        Signature {
            signature_type,
            name,
            email,
            timestamp,
            timezone,
        }
    }

    /// Parse a full signature line, e.g.
    /// `author GitDIR <gitdir@localhost> 1754000000 +0000`.
    pub fn from_data(data: Vec<u8>) -> Result<Signature, GitError> {
        let invalid = || GitError::InvalidSignatureType(String::from_utf8_lossy(&data).to_string());

        let role_end = data.find_byte(b' ').ok_or_else(invalid)?;
        let signature_type = SignatureType::from_data(&data[..role_end])?;
        let rest = &data[role_end + 1..];

        let email_open = rest.find_byte(b'<').ok_or_else(invalid)?;
        let email_close = rest.find_byte(b'>').ok_or_else(invalid)?;
        if email_close < email_open {
            return Err(invalid());
        }

        // The name is everything before " <"; it may be empty.
        let name = String::from_utf8_lossy(rest[..email_open].trim_end())
            .trim_end()
            .to_string();
        let email = String::from_utf8_lossy(&rest[email_open + 1..email_close]).to_string();

        let tail = rest[email_close + 1..].trim();
        let mut parts = tail.splitn_str(2, " ");
        let timestamp: i64 = parts
            .next()
            .and_then(|s| s.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let timezone = parts
            .next()
            .and_then(|s| s.to_str().ok())
            .ok_or_else(invalid)?
            .to_string();

        Ok(Signature {
            signature_type,
            name,
            email,
            timestamp,
            timezone,
        })
    }

    /// Serialize back to the commit header form, role tag included.
    pub fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(format!(
            "{} {} <{}> {} {}",
            self.signature_type, self.name, self.email, self.timestamp, self.timezone
        )
        .into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_author_line() {
        let sig = Signature::from_data(
            b"author GitDIR <gitdir@localhost> 1754000000 +0000".to_vec(),
        )
        .unwrap();
        assert_eq!(sig.signature_type, SignatureType::Author);
        assert_eq!(sig.name, "GitDIR");
        assert_eq!(sig.email, "gitdir@localhost");
        assert_eq!(sig.timestamp, 1754000000);
        assert_eq!(sig.timezone, "+0000");
    }

    #[test]
    fn test_round_trip() {
        let line = b"committer Some One <some.one@example.com> 1640995200 -0600".to_vec();
        let sig = Signature::from_data(line.clone()).unwrap();
        assert_eq!(sig.to_data().unwrap(), line);
    }

    #[test]
    fn test_rejects_unknown_role() {
        let res = Signature::from_data(b"tagger x <x@y> 0 +0000".to_vec());
        assert!(matches!(res, Err(GitError::InvalidSignatureType(_))));
    }

    #[test]
    fn test_rejects_missing_email() {
        let res = Signature::from_data(b"author nobody 0 +0000".to_vec());
        assert!(res.is_err());
    }
}

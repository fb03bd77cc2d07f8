//! gitdir serves a local directory as a cloneable read-only Git repository
//! over the smart-HTTP v1 transport.
//!
//! On the first request the directory is walked once and turned into a
//! synthetic object graph (one blob per file, one tree per directory, and
//! a single parentless commit) advertised as `refs/heads/main`. A standard
//! `git clone` against the server's base URL then receives that commit as
//! a side-band multiplexed pack stream.

pub mod config;
pub mod errors;
pub mod hash;
pub mod internal;
pub mod protocol;
pub mod snapshot;

//! Error taxonomy shared by every pipeline stage.
//!
//! Tile-level format errors (a single corrupt "QDV2" record) never reach this
//! type: they are dropped silently by [`crate::codec::frame`] instead. What
//! remains here is strictly fatal.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Magic mismatch, truncated header, or an out-of-range field on an
    /// envelope-level record (the payload envelope, the sealed private key,
    /// or a manifest/metadata record).
    Format(String),
    /// AEAD tag verification failed, at either the payload or the
    /// private-key layer.
    CryptoAuth(String),
    /// RSA-OAEP unwrap of the session key, or unwrap of the private key,
    /// failed.
    KeyUnwrap(String),
    /// Fewer than `K` blocks were received; reconstruction is impossible.
    InsufficientBlocks { have: usize, need: usize },
    /// Loss fraction exceeds the declared recovery ceiling (0.35); the
    /// decoder refuses to attempt reconstruction.
    RecoveryLimit { missing: usize, total: usize },
    /// An external collaborator (barcode tool, video muxer) is missing.
    Dependency(String),
    /// The video muxer ran but exited non-zero while composing frames into
    /// a video (§6: the encoder CLI reports this with its own exit code,
    /// distinct from a missing binary or any other failure).
    MuxFailed(String),
    /// Filesystem I/O failure.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(reason) => write!(f, "format error: {reason}"),
            Self::CryptoAuth(reason) => write!(f, "authentication failed: {reason}"),
            Self::KeyUnwrap(reason) => write!(f, "key unwrap failed: {reason}"),
            Self::InsufficientBlocks { have, need } => {
                write!(f, "insufficient blocks: have {have}, need at least {need}")
            }
            Self::RecoveryLimit { missing, total } => {
                write!(
                    f,
                    "recovery limit exceeded: {missing} of {total} blocks missing"
                )
            }
            Self::Dependency(reason) => write!(f, "missing dependency: {reason}"),
            Self::MuxFailed(reason) => write!(f, "video muxer failed: {reason}"),
            Self::Io(reason) => write!(f, "I/O error: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl Error {
    /// Maps this error onto the process exit codes from the external
    /// interface contract (distinct dependency-failure code; everything
    /// else not otherwise called out is the generic failure code).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Dependency(_) => 2,
            Self::MuxFailed(_) => 3,
            _ => 1,
        }
    }
}

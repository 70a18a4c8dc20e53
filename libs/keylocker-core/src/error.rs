use thiserror::Error;

/// Internal, diagnostic-only error kind. Never exposed past the public
/// `KeyFile::get` boundary in a release build — see [`RecoveryFailure`] and
/// the error handling design this mirrors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid usage: {0}")]
    Usage(String),

    #[error("fewer than the threshold number of slots decoded plausibly")]
    InsufficientShares,

    #[error("enough shares decoded but none combined to a valid entry")]
    UnrecoverableEntry,

    #[error("entry checksum mismatch")]
    CorruptEntry,

    #[error(transparent)]
    Primitive(#[from] keylocker_primitives::PrimitiveError),
}

/// The only two outcomes a release build of the public API exposes for a
/// `get`: the operation produced an entry, or it did not. Collapsing
/// `InsufficientShares`, `UnrecoverableEntry` and a wrong password into one
/// undifferentiated failure is deliberate — see spec §7: a tool that
/// distinguishes "right password, corrupt data" from "wrong password" leaks
/// the existence of an entry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no entry was recovered")]
pub struct RecoveryFailure;

impl Error {
    /// Collapse any reconstruction-domain error into the single public
    /// failure. I/O and usage errors propagate unchanged, per spec §7's
    /// propagation policy.
    pub fn into_public(self) -> PublicError {
        match self {
            Error::Io(e) => PublicError::Io(e),
            Error::Usage(s) => PublicError::Usage(s),
            Error::InsufficientShares | Error::UnrecoverableEntry | Error::CorruptEntry => {
                PublicError::BadPassword(RecoveryFailure)
            }
            Error::Primitive(p) => PublicError::Usage(p.to_string()),
        }
    }
}

/// The error surface `KeyFile::get`/`KeyFile::put` actually return to a
/// caller outside this crate's tests.
#[derive(Debug, Error)]
pub enum PublicError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid usage: {0}")]
    Usage(String),

    #[error(transparent)]
    BadPassword(#[from] RecoveryFailure),
}

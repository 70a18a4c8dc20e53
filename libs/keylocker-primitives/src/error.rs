use thiserror::Error;

/// Failures internal to the primitive wrappers.
///
/// None of these ever reach a KeyLocker user directly: the core engine
/// collapses everything except [`PrimitiveError::Io`]-shaped causes into the
/// single generic recovery failure described in the top-level error design.
#[derive(Debug, Error)]
pub enum PrimitiveError {
    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("stream expansion failed: {0}")]
    Expand(String),
}

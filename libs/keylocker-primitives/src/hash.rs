use hkdf::Hkdf;
use sha2::{Digest, Sha256};

use crate::error::PrimitiveError;

/// Cryptographic checksum used for share/entry verification and for
/// deriving slot keys and nonces. A thin, explicit wrapper so call sites
/// never import `sha2` directly and the hash choice stays in one place.
pub fn checksum(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Truncated checksum used as a slot plausibility tag (and, at the entry
/// layer, as the reconstructed-secret verification tag). Intentionally
/// short: random slots should have a small but non-negligible chance of
/// tagging as plausible, which is why the Shamir layer tries every
/// plausible-looking candidate subset rather than trusting the first one.
pub fn short_tag(bytes: &[u8]) -> [u8; 8] {
    let digest = checksum(bytes);
    let mut tag = [0u8; 8];
    tag.copy_from_slice(&digest[..8]);
    tag
}

/// Expand `ikm` (the entry master key) into `out.len()` pseudorandom bytes
/// bound to `info`, via HKDF-SHA256. Used to derive the slot-selection
/// stream (`info = b"slots"`).
pub fn expand(ikm: &[u8], info: &[u8], out: &mut [u8]) -> Result<(), PrimitiveError> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    hk.expand(info, out).map_err(|e| PrimitiveError::Expand(e.to_string()))
}

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::PrimitiveError;

/// Cost parameters for the memory-hard password hash.
///
/// The defaults are sized so a single derivation takes at least half a
/// second and touches at least 256 MiB on a modern CPU. Tests use
/// [`KdfCost::for_tests`] instead, the same way the teacher shrinks its own
/// bcrypt cost under `#[cfg(test)]`.
#[derive(Debug, Clone, Copy)]
pub struct KdfCost {
    pub mem_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl KdfCost {
    pub const fn production() -> Self {
        KdfCost { mem_cost_kib: 256 * 1024, time_cost: 3, parallelism: 1 }
    }

    pub const fn for_tests() -> Self {
        KdfCost { mem_cost_kib: 8 * 1024, time_cost: 1, parallelism: 1 }
    }
}

impl Default for KdfCost {
    fn default() -> Self {
        Self::production()
    }
}

/// Output length of [`kdf`], in bytes. This is the entry's master key size.
pub const DKEY_LEN: usize = 32;

/// Derive the entry master key `dkey` from password bytes and a salt.
///
/// Deterministic: the same `(password, salt, cost)` always yields the same
/// key. Callers are responsible for folding the KeyFile's head/tail salts
/// and the device-identifier hash into `salt` before calling this (see
/// `keylocker-core::derive::derive_dkey`).
pub fn kdf(
    password: &[u8],
    salt: &[u8],
    cost: KdfCost,
) -> Result<Zeroizing<[u8; DKEY_LEN]>, PrimitiveError> {
    let params = Params::new(cost.mem_cost_kib, cost.time_cost, cost.parallelism, Some(DKEY_LEN))
        .map_err(|e| PrimitiveError::Kdf(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = Zeroizing::new([0u8; DKEY_LEN]);
    argon2
        .hash_password_into(password, salt, out.as_mut())
        .map_err(|e| PrimitiveError::Kdf(e.to_string()))?;
    Ok(out)
}

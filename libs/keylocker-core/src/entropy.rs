//! Cryptographically strong random bytes, with an explicit hook for folding
//! in external entropy (pointer-motion samples, timestamp jitter, ...).
//!
//! Held as an explicit handle passed into operations rather than an ambient
//! singleton, so tests can inject a deterministic stream.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

pub struct EntropySource {
    rng: ChaCha20Rng,
    mix_state: Sha256,
}

impl EntropySource {
    /// Seed from the OS CSPRNG.
    pub fn new() -> Self {
        EntropySource { rng: ChaCha20Rng::from_entropy(), mix_state: Sha256::new() }
    }

    /// Construct a deterministic instance for tests. Never used in the CLI
    /// binary outside its own test suite.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        EntropySource { rng: ChaCha20Rng::from_seed(seed), mix_state: Sha256::new() }
    }

    /// Fold `data` into the mixing state and reseed the stream from it. This
    /// never replaces the initial OS seed as the sole entropy source — it
    /// only adds to it.
    pub fn mix(&mut self, data: &[u8]) {
        self.mix_state.update(data);
        let digest: [u8; 32] = self.mix_state.clone().finalize().into();
        let mut combined = [0u8; 32];
        self.rng.fill_bytes(&mut combined);
        for i in 0..32 {
            combined[i] ^= digest[i];
        }
        self.rng = ChaCha20Rng::from_seed(combined);
    }

    /// Produce `n` bytes indistinguishable from uniform, regardless of the
    /// history of prior `mix` calls.
    pub fn random(&mut self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        self.rng.fill_bytes(&mut buf);
        buf
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

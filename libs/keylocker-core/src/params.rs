use keylocker_primitives::kdf::KdfCost;

/// Default slot payload size, in bytes.
pub const SLOT_SIZE_DEFAULT: usize = 64;
/// Slot size when `--extended` is selected.
pub const SLOT_SIZE_EXTENDED: usize = 128;

/// Default Shamir share count and threshold.
pub const DEFAULT_N: u8 = 7;
pub const DEFAULT_T: u8 = 4;

/// Default number of copies in plain mode.
pub const DEFAULT_PLAIN_COPIES: u8 = 3;

/// Per-slot overhead reserved for the length prefix and plausibility tag.
/// See `slot::encode_payload`.
pub const SLOT_OVERHEAD: usize = 2 + 8;

/// Sharing mode for a single entry. No inheritance or dynamic dispatch is
/// needed to capture this dimension — a tagged variant is enough, exactly
/// as the design notes call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Shamir { n: u8, t: u8 },
    Plain { copies: u8 },
}

impl Mode {
    pub fn shamir(n: u8, t: u8) -> Result<Self, String> {
        if t == 0 || t > n {
            return Err(format!("threshold T={t} must satisfy 1 <= T <= N={n}"));
        }
        Ok(Mode::Shamir { n, t })
    }

    pub fn plain(copies: u8) -> Result<Self, String> {
        if copies == 0 {
            return Err("plain mode requires at least one copy".to_string());
        }
        Ok(Mode::Plain { copies })
    }

    /// Number of slots this entry occupies.
    pub fn slot_count(&self) -> u8 {
        match self {
            Mode::Shamir { n, .. } => *n,
            Mode::Plain { copies } => *copies,
        }
    }

    /// Minimum slots that must survive for recovery to succeed.
    pub fn threshold(&self) -> u8 {
        match self {
            Mode::Shamir { t, .. } => *t,
            Mode::Plain { .. } => 1,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Shamir { n: DEFAULT_N, t: DEFAULT_T }
    }
}

/// Fixed parameters of a KeyFile region, computed once from its length and
/// threaded explicitly through every engine call — no global state, per the
/// design notes' explicit-handle requirement.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub slot_size: usize,
    pub salt_size: usize,
    pub slot_count: u64,
    pub region_len: u64,
    pub kdf_cost: KdfCost,
    /// Upper bound on the number of plausible-looking slots scanned during
    /// Shamir reconstruction (spec §4.6: "caller may cap m at a small
    /// constant").
    pub max_scanned_shares: u8,
}

impl Params {
    /// Compute `K` from a region length and extended-slot flag, rounding
    /// `region_len` down to the nearest whole-slot boundary as required by
    /// spec §6.
    pub fn for_region_len(total_len: u64, extended: bool, kdf_cost: KdfCost) -> Result<Self, String> {
        let slot_size = if extended { SLOT_SIZE_EXTENDED } else { SLOT_SIZE_DEFAULT };
        let salt_size = slot_size;
        let overhead = 2 * salt_size as u64;
        if total_len <= overhead {
            return Err(format!(
                "region of {total_len} bytes is too small to hold even the salt regions ({overhead} bytes)"
            ));
        }
        let slot_count = (total_len - overhead) / slot_size as u64;
        if slot_count == 0 {
            return Err("region is too small to hold a single slot".to_string());
        }
        let region_len = overhead + slot_count * slot_size as u64;
        Ok(Params {
            slot_size,
            salt_size,
            slot_count,
            region_len,
            kdf_cost,
            max_scanned_shares: DEFAULT_N + 2,
        })
    }

    pub fn head_salt_range(&self) -> std::ops::Range<u64> {
        0..self.salt_size as u64
    }

    pub fn tail_salt_range(&self) -> std::ops::Range<u64> {
        (self.region_len - self.salt_size as u64)..self.region_len
    }

    pub fn slot_offset(&self, index: u64) -> u64 {
        self.salt_size as u64 + index * self.slot_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_len_matches_spec_scenario_e1() {
        let params = Params::for_region_len(8192, false, KdfCost::for_tests()).unwrap();
        assert_eq!(params.slot_size, 64);
        assert_eq!(params.salt_size, 64);
        assert_eq!(params.slot_count, 126);
        assert_eq!(params.region_len, 8192);
    }

    #[test]
    fn region_len_rounds_down() {
        let params = Params::for_region_len(8200, false, KdfCost::for_tests()).unwrap();
        assert_eq!(params.slot_count, 126);
        assert_eq!(params.region_len, 8192);
    }

    #[test]
    fn mode_rejects_bad_threshold() {
        assert!(Mode::shamir(4, 0).is_err());
        assert!(Mode::shamir(4, 5).is_err());
        assert!(Mode::shamir(7, 4).is_ok());
    }
}

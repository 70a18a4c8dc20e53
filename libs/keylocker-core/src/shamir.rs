//! Splits a payload into N shares with threshold T over GF(2^8);
//! reconstructs from any T correct shares; rejects corrupted candidates
//! during reconstruction (spec §4.6).

use keylocker_primitives::gf256::{self, Polynomial};
use keylocker_primitives::hash::checksum;

use crate::entropy::EntropySource;
use crate::error::Error;

/// One fragment of a secret: an x-coordinate and the polynomial evaluations
/// for every byte of the secret at that x.
#[derive(Debug, Clone)]
pub struct Share {
    pub x: u8,
    pub ys: Vec<u8>,
}

/// Split `secret` into `n` shares with threshold `t`. Each byte of `secret`
/// is shared independently with its own random degree-`(t-1)` polynomial,
/// exactly as specified.
pub fn split(secret: &[u8], n: u8, t: u8, entropy: &mut EntropySource) -> Vec<Share> {
    assert!(t >= 1 && t <= n, "threshold must satisfy 1 <= t <= n");
    let mut shares: Vec<Share> = (1..=n).map(|x| Share { x, ys: Vec::with_capacity(secret.len()) }).collect();

    for &byte in secret {
        let mut coeffs = vec![byte];
        if t > 1 {
            coeffs.extend(entropy.random((t - 1) as usize));
        }
        let poly = Polynomial { coeffs: &coeffs };
        for share in shares.iter_mut() {
            share.ys.push(poly.eval(share.x));
        }
    }
    shares
}

/// Reconstruct a byte string from exactly `t` shares (all assumed to carry
/// the secret's full length). The caller (KeyFile engine) is responsible
/// for trying candidate subsets and validating the result; this function
/// only performs the arithmetic for one fixed subset.
pub fn interpolate(shares: &[Share]) -> Result<Vec<u8>, Error> {
    if shares.is_empty() {
        return Err(Error::InsufficientShares);
    }
    let len = shares[0].ys.len();
    if shares.iter().any(|s| s.ys.len() != len) {
        return Err(Error::CorruptEntry);
    }
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let points: Vec<(u8, u8)> = shares.iter().map(|s| (s.x, s.ys[i])).collect();
        out.push(gf256::interpolate_at_zero(&points));
    }
    Ok(out)
}

/// A decrypted, plausible-looking slot payload, tagged with the slot index
/// it came from (used only for diagnostics; the public API never reports
/// which slots contributed).
pub struct Candidate {
    pub share: Share,
}

/// Reconstruct the entry from a set of decrypted share candidates, per the
/// canonical-subset search in spec §4.6: try T-subsets in ascending order
/// of their source slot index, interpolate, and accept the first candidate
/// whose result passes `verify`. `verify` is the entry deserializer's
/// checksum check.
///
/// Candidates come from slots whose plausibility tag happened to match by
/// chance (spec §4.6's deliberately short tag), so their `x` coordinates
/// are untrusted: a spurious candidate can carry `x == 0` or duplicate a
/// genuine share's `x`, either of which would hand `interpolate_at_zero` a
/// zero denominator. Both are filtered out before any subset is built, so
/// only a well-formed Lagrange basis ever reaches the arithmetic.
pub fn reconstruct<F>(
    candidates: &[Candidate],
    t: u8,
    max_scanned: u8,
    verify: F,
) -> Result<Vec<u8>, Error>
where
    F: Fn(&[u8]) -> bool,
{
    let t = t as usize;
    let mut seen_x = std::collections::HashSet::new();
    let valid: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.share.x != 0 && seen_x.insert(c.share.x))
        .collect();
    if valid.len() < t {
        return Err(Error::InsufficientShares);
    }
    let scan_limit = (max_scanned as usize).min(valid.len());
    let pool = &valid[..scan_limit];

    for subset in combinations(pool.len(), t) {
        let shares: Vec<Share> = subset.iter().map(|&i| pool[i].share.clone()).collect();
        if let Ok(secret) = interpolate(&shares) {
            if verify(&secret) {
                return Ok(secret);
            }
        }
    }
    Err(Error::UnrecoverableEntry)
}

/// Enumerate all `t`-combinations of `0..n` in canonical (lexicographic)
/// order. Small `n`/`t` in practice (spec bounds `max_scanned_shares` to a
/// small constant), so a simple recursive generator is appropriate.
fn combinations(n: usize, t: usize) -> Vec<Vec<usize>> {
    fn go(start: usize, n: usize, t: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == t {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            go(i + 1, n, t, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    go(0, n, t, &mut Vec::new(), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_interpolate_recovers_secret() {
        let mut entropy = EntropySource::from_seed([1u8; 32]);
        let secret = b"the keys to the kingdom".to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);
        let subset: Vec<Share> = shares[1..5].to_vec().into_iter().collect();
        let recovered = interpolate(&subset).unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn any_t_subset_recovers_the_same_secret() {
        let mut entropy = EntropySource::from_seed([2u8; 32]);
        let secret = b"0123456789".to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);
        let a = interpolate(&shares[0..4]).unwrap();
        let b = interpolate(&shares[3..7]).unwrap();
        assert_eq!(a, secret);
        assert_eq!(b, secret);
    }

    #[test]
    fn fewer_than_threshold_shares_do_not_recover_secret() {
        let mut entropy = EntropySource::from_seed([3u8; 32]);
        let secret = b"0123456789".to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);
        let short = interpolate(&shares[0..3]).unwrap();
        assert_ne!(short, secret);
    }

    #[test]
    fn reconstruct_finds_valid_subset_among_spurious_candidates() {
        let mut entropy = EntropySource::from_seed([4u8; 32]);
        let secret = checksum(b"payload-for-reconstruction-test").to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);

        let mut candidates: Vec<Candidate> =
            shares.into_iter().map(|share| Candidate { share }).collect();
        // inject two spurious "plausible" candidates that won't interpolate correctly
        candidates.push(Candidate { share: Share { x: 250, ys: entropy.random(secret.len()) } });
        candidates.push(Candidate { share: Share { x: 251, ys: entropy.random(secret.len()) } });

        let verify = |bytes: &[u8]| bytes == secret.as_slice();
        let recovered = reconstruct(&candidates, 4, 9, verify).unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn reconstruct_tolerates_spurious_candidate_colliding_a_real_x() {
        let mut entropy = EntropySource::from_seed([6u8; 32]);
        let secret = checksum(b"payload-for-collision-test").to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);

        let mut candidates: Vec<Candidate> =
            shares.into_iter().map(|share| Candidate { share }).collect();
        // a spurious candidate colliding the genuine share at x=1, and one at
        // x=0, which has no multiplicative inverse at all: neither should
        // panic, and reconstruction should still succeed from the genuine set.
        candidates.push(Candidate { share: Share { x: 1, ys: entropy.random(secret.len()) } });
        candidates.push(Candidate { share: Share { x: 0, ys: entropy.random(secret.len()) } });

        let verify = |bytes: &[u8]| bytes == secret.as_slice();
        let recovered = reconstruct(&candidates, 4, 9, verify).unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn reconstruct_fails_below_threshold() {
        let mut entropy = EntropySource::from_seed([5u8; 32]);
        let secret = b"abc".to_vec();
        let shares = split(&secret, 7, 4, &mut entropy);
        let candidates: Vec<Candidate> =
            shares.into_iter().take(3).map(|share| Candidate { share }).collect();
        let verify = |bytes: &[u8]| bytes == secret.as_slice();
        assert!(matches!(reconstruct(&candidates, 4, 9, verify), Err(Error::InsufficientShares)));
    }
}

//! Owns the full KeyFile layout (salt regions + slot array). Allocates slot
//! positions deterministically from the password, writes/overwrites slots,
//! and reads by attempting decryption at derived positions (spec §4.7).
//!
//! No index, no free-list, no occupancy metadata: adding one entry can
//! overwrite another's shares if their slot sets intersect, which is what
//! the Shamir threshold exists to tolerate.

use keylocker_primitives::cipher::{KEY_LEN, NONCE_LEN};

use crate::derive::plan_slots;
use crate::entropy::EntropySource;
use crate::entry::{self, Entry};
use crate::error::{Error, PublicError};
use crate::params::{Mode, Params};
use crate::region::Region;
use crate::shamir::{self, Candidate, Share};
use crate::slot;

const CHUNK: usize = 64 * 1024;

/// Fill `region` entirely with uniform random bytes. This is how a KeyFile
/// is both created and destroyed: the two operations are identical, with
/// the caveat (documented to the user, not enforceable here) that flash
/// storage may retain remapped sectors.
pub fn create(region: &mut dyn Region, entropy: &mut EntropySource) -> Result<(), Error> {
    let total = region.size();
    let mut pos = 0u64;
    while pos < total {
        let n = (total - pos).min(CHUNK as u64) as usize;
        let buf = entropy.random(n);
        region.write_at(pos, &buf)?;
        pos += n as u64;
    }
    Ok(())
}

/// Overwrite `region` with fresh random bytes. Semantically identical to
/// [`create`]; kept as a distinct name at the call site for clarity about
/// intent (spec §3 lifecycle: "destroyed by overwriting with random bytes").
pub fn destroy(region: &mut dyn Region, entropy: &mut EntropySource) -> Result<(), Error> {
    create(region, entropy)
}

fn read_salts(region: &mut dyn Region, params: &Params) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let mut head = vec![0u8; params.salt_size];
    region.read_at(params.head_salt_range().start, &mut head)?;
    let mut tail = vec![0u8; params.salt_size];
    region.read_at(params.tail_salt_range().start, &mut tail)?;
    Ok((head, tail))
}

/// Derive slot positions for `device_id` under `password`, serialize
/// `entry`, split/encode it per `mode`, and write each share or copy to its
/// slot. No slot outside this entry's derived set is touched.
pub fn put(
    region: &mut dyn Region,
    params: &Params,
    password: &[u8],
    device_id: &str,
    entry: &Entry,
    mode: Mode,
    entropy: &mut EntropySource,
) -> Result<(), PublicError> {
    put_inner(region, params, password, device_id, entry, mode, entropy).map_err(Error::into_public)
}

fn put_inner(
    region: &mut dyn Region,
    params: &Params,
    password: &[u8],
    device_id: &str,
    entry: &Entry,
    mode: Mode,
    entropy: &mut EntropySource,
) -> Result<(), Error> {
    let (head_salt, tail_salt) = read_salts(region, params)?;
    let plan = plan_slots(password, params, &head_salt, &tail_salt, device_id, mode.slot_count())?;
    let serialized = entry::serialize(entry)?;

    log::debug!("writing entry for device '{device_id}' across {} slots", plan.slots.len());

    match mode {
        Mode::Shamir { n, t } => {
            let shares = shamir::split(&serialized, n, t, entropy);
            for (slot_keys, share) in plan.slots.iter().zip(shares.into_iter()) {
                let mut payload = Vec::with_capacity(1 + share.ys.len());
                payload.push(share.x);
                payload.extend_from_slice(&share.ys);
                write_one(region, params, slot_keys.index, &slot_keys.key, &slot_keys.nonce, &payload, entropy)?;
            }
        }
        Mode::Plain { .. } => {
            for slot_keys in &plan.slots {
                write_one(
                    region,
                    params,
                    slot_keys.index,
                    &slot_keys.key,
                    &slot_keys.nonce,
                    &serialized,
                    entropy,
                )?;
            }
        }
    }
    Ok(())
}

fn write_one(
    region: &mut dyn Region,
    params: &Params,
    index: u64,
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    payload: &[u8],
    entropy: &mut EntropySource,
) -> Result<(), Error> {
    slot::write_slot(region, params, index, key, nonce, payload, entropy)
}

/// Derive slot positions, attempt decryption at each, and reconstruct the
/// entry per `mode`. Returns the single undifferentiated recovery failure
/// for anything other than an I/O or usage error (spec §7).
pub fn get(
    region: &mut dyn Region,
    params: &Params,
    password: &[u8],
    device_id: &str,
    mode: Mode,
) -> Result<Entry, PublicError> {
    get_inner(region, params, password, device_id, mode).map_err(Error::into_public)
}

fn get_inner(
    region: &mut dyn Region,
    params: &Params,
    password: &[u8],
    device_id: &str,
    mode: Mode,
) -> Result<Entry, Error> {
    let (head_salt, tail_salt) = read_salts(region, params)?;
    let plan = plan_slots(password, params, &head_salt, &tail_salt, device_id, mode.slot_count())?;

    log::debug!("attempting recovery for device '{device_id}' across {} slots", plan.slots.len());

    match mode {
        Mode::Shamir { t, .. } => {
            let mut candidates = Vec::new();
            for slot_keys in &plan.slots {
                if let Some(payload) = slot::read_slot(region, params, slot_keys.index, &slot_keys.key, &slot_keys.nonce)? {
                    if payload.is_empty() {
                        continue;
                    }
                    let (x, ys) = (payload[0], payload[1..].to_vec());
                    candidates.push(Candidate { share: Share { x, ys } });
                }
            }
            let secret = shamir::reconstruct(&candidates, t, params.max_scanned_shares, |bytes| {
                entry::deserialize(bytes).is_ok()
            })?;
            entry::deserialize(&secret)
        }
        Mode::Plain { .. } => {
            for slot_keys in &plan.slots {
                if let Some(payload) = slot::read_slot(region, params, slot_keys.index, &slot_keys.key, &slot_keys.nonce)? {
                    if let Ok(e) = entry::deserialize(&payload) {
                        return Ok(e);
                    }
                }
            }
            Err(Error::UnrecoverableEntry)
        }
    }
}

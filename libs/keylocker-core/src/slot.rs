//! Encodes/decodes a single fixed-size slot (spec §4.5): per-slot key
//! derivation happens one level up in `derive`; this module only handles
//! the padding/tag/encrypt layer and the raw region access.

use keylocker_primitives::cipher::{decrypt_in_place, encrypt_in_place, KEY_LEN, NONCE_LEN};
use keylocker_primitives::hash::short_tag;

use crate::entropy::EntropySource;
use crate::error::Error;
use crate::params::{Params, SLOT_OVERHEAD};
use crate::region::Region;

/// Build the slot plaintext: `[len: u16 LE][payload][random padding][tag: 8 bytes]`.
fn encode_payload(payload: &[u8], slot_size: usize, entropy: &mut EntropySource) -> Result<Vec<u8>, Error> {
    let capacity = slot_size - SLOT_OVERHEAD;
    if payload.len() > capacity {
        return Err(Error::Usage(format!(
            "payload of {} bytes exceeds slot capacity of {capacity} bytes",
            payload.len()
        )));
    }
    let mut buf = Vec::with_capacity(slot_size);
    buf.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    buf.extend_from_slice(payload);
    let padding_len = capacity - payload.len();
    buf.extend_from_slice(&entropy.random(padding_len));

    let tag = short_tag(&buf);
    buf.extend_from_slice(&tag);
    debug_assert_eq!(buf.len(), slot_size);
    Ok(buf)
}

/// Inverse of [`encode_payload`]: verify the tag, then slice out the
/// claimed-length payload. Returns `None` on any implausibility — a
/// deliberately uninformative result, since a slot failing to decode here
/// is indistinguishable from one that simply never held this entry.
fn decode_payload(buf: &[u8]) -> Option<Vec<u8>> {
    if buf.len() < SLOT_OVERHEAD {
        return None;
    }
    let tagged_len = buf.len() - 8;
    let (body, tag) = buf.split_at(tagged_len);
    if short_tag(body) != tag {
        return None;
    }
    let len = u16::from_le_bytes(body[0..2].try_into().ok()?) as usize;
    let capacity = tagged_len - 2;
    if len > capacity {
        return None;
    }
    Some(body[2..2 + len].to_vec())
}

/// Encrypt `payload` (padded to slot size with a length/checksum tag) and
/// write it at slot `index`. Touches only this one slot.
pub fn write_slot(
    region: &mut dyn Region,
    params: &Params,
    index: u64,
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    payload: &[u8],
    entropy: &mut EntropySource,
) -> Result<(), Error> {
    let mut buf = encode_payload(payload, params.slot_size, entropy)?;
    encrypt_in_place(key, nonce, &mut buf);
    region.write_at(params.slot_offset(index), &buf)
}

/// Decrypt slot `index` and check its tag. `None` on tag mismatch — the
/// slot was overwritten by another entry, or never held this one.
pub fn read_slot(
    region: &mut dyn Region,
    params: &Params,
    index: u64,
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Option<Vec<u8>>, Error> {
    let mut buf = vec![0u8; params.slot_size];
    region.read_at(params.slot_offset(index), &mut buf)?;
    decrypt_in_place(key, nonce, &mut buf);
    Ok(decode_payload(&buf))
}

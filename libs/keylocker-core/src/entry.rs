//! Packs a partition descriptor into the compact byte string used as the
//! Shamir secret, and is the final arbiter of a successful reconstruction:
//! the checksum here is what `shamir::reconstruct` verifies against.

use zeroize::Zeroize;

use crate::error::Error;

/// A logical secret: the key and byte range of a hidden partition, plus an
/// optional free-text note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub device_id: String,
    pub start: u64,
    pub length: u64,
    pub cipher_key: Vec<u8>,
    pub text: Option<String>,
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
    }
}

/// `E`'s fields carry a one-byte length prefix, not four: the whole point of
/// this encoding is to fit inside a single slot's few dozen spare bytes, so a
/// field longer than 255 bytes (and in practice much shorter, bounded by
/// `slot_size`) is a usage error, not a format limitation to plan around.
fn write_field(buf: &mut Vec<u8>, field: &[u8]) -> Result<(), Error> {
    if field.len() > u8::MAX as usize {
        return Err(Error::Usage(format!("field of {} bytes exceeds the 255-byte entry field limit", field.len())));
    }
    buf.push(field.len() as u8);
    buf.extend_from_slice(field);
    Ok(())
}

fn read_field<'a>(buf: &'a [u8], pos: &mut usize) -> Result<&'a [u8], Error> {
    if buf.len() <= *pos {
        return Err(Error::CorruptEntry);
    }
    let len = buf[*pos] as usize;
    *pos += 1;
    if buf.len() < *pos + len {
        return Err(Error::CorruptEntry);
    }
    let field = &buf[*pos..*pos + len];
    *pos += len;
    Ok(field)
}

const FORMAT_RAW: u8 = 0;
const FORMAT_ZSTD: u8 = 1;

/// Serialize `entry` into the checksummed byte string `E` that the Shamir
/// layer splits. Field order: device_id, start, length, cipher_key, text
/// (absent text is a presence byte of 0 with no following field).
///
/// `E` must fit inside a single slot's spare capacity (spec §4.3/§4.5), so
/// the checksum is the short, truncated tag rather than a full digest, and
/// zstd framing — whose fixed overhead exceeds its savings on an entry this
/// small — is only used when it actually shrinks the payload.
pub fn serialize(entry: &Entry) -> Result<Vec<u8>, Error> {
    let mut plain = Vec::new();
    write_field(&mut plain, entry.device_id.as_bytes())?;
    plain.extend_from_slice(&entry.start.to_le_bytes());
    plain.extend_from_slice(&entry.length.to_le_bytes());
    write_field(&mut plain, &entry.cipher_key)?;
    match &entry.text {
        Some(text) => {
            plain.push(1);
            write_field(&mut plain, text.as_bytes())?;
        }
        None => plain.push(0),
    }

    let compressed = zstd::stream::encode_all(plain.as_slice(), 3).map_err(Error::Io)?;
    let (format, body) = if compressed.len() < plain.len() { (FORMAT_ZSTD, compressed) } else { (FORMAT_RAW, plain) };

    let mut out = Vec::with_capacity(1 + body.len() + 8);
    out.push(format);
    out.extend_from_slice(&body);
    out.extend_from_slice(&keylocker_primitives::hash::short_tag(&out));
    Ok(out)
}

/// Inverse of [`serialize`]. Checks the tag first (the final arbiter of a
/// successful Shamir reconstruction), then undoes whichever framing
/// `serialize` picked and unpacks fields. Any length overrun fails
/// `CorruptEntry`.
pub fn deserialize(bytes: &[u8]) -> Result<Entry, Error> {
    if bytes.len() < 1 + 8 {
        return Err(Error::CorruptEntry);
    }
    let (tagged, tag) = bytes.split_at(bytes.len() - 8);
    if keylocker_primitives::hash::short_tag(tagged) != tag {
        return Err(Error::CorruptEntry);
    }

    let (format, body) = (tagged[0], &tagged[1..]);
    let plain = match format {
        FORMAT_RAW => body.to_vec(),
        FORMAT_ZSTD => zstd::stream::decode_all(body).map_err(|_| Error::CorruptEntry)?,
        _ => return Err(Error::CorruptEntry),
    };
    let mut pos = 0usize;

    let device_id = String::from_utf8(read_field(&plain, &mut pos)?.to_vec())
        .map_err(|_| Error::CorruptEntry)?;

    if plain.len() < pos + 16 {
        return Err(Error::CorruptEntry);
    }
    let start = u64::from_le_bytes(plain[pos..pos + 8].try_into().unwrap());
    pos += 8;
    let length = u64::from_le_bytes(plain[pos..pos + 8].try_into().unwrap());
    pos += 8;

    let cipher_key = read_field(&plain, &mut pos)?.to_vec();

    if plain.len() <= pos {
        return Err(Error::CorruptEntry);
    }
    let has_text = plain[pos];
    pos += 1;
    let text = match has_text {
        0 => None,
        1 => Some(
            String::from_utf8(read_field(&plain, &mut pos)?.to_vec()).map_err(|_| Error::CorruptEntry)?,
        ),
        _ => return Err(Error::CorruptEntry),
    };

    Ok(Entry { device_id, start, length, cipher_key, text })
}

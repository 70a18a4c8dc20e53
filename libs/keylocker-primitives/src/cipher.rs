use aes::Aes256;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

/// Size of an AES-256 key, in bytes.
pub const KEY_LEN: usize = 32;
/// Size of the CTR-mode nonce/IV, in bytes.
pub const NONCE_LEN: usize = 16;

type Aes256Ctr = Ctr128BE<Aes256>;

/// Encrypt `buf` in place under `(key, nonce)`.
///
/// This is a bare streaming cipher, not an AEAD: it adds no tag and no
/// length expansion, because any expansion would make a written slot
/// distinguishable from a random one. CTR mode is its own inverse, so
/// encryption and decryption are the same operation; `decrypt_in_place` is
/// provided separately only for readability at call sites.
pub fn encrypt_in_place(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], buf: &mut [u8]) {
    let mut cipher = Aes256Ctr::new(key.into(), nonce.into());
    cipher.apply_keystream(buf);
}

/// Decrypt `buf` in place under `(key, nonce)`. See [`encrypt_in_place`].
pub fn decrypt_in_place(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], buf: &mut [u8]) {
    encrypt_in_place(key, nonce, buf)
}

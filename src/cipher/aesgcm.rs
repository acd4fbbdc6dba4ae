//! Passphrase-derived AES-256-GCM, the symmetric primitive shared by the
//! payload envelope (§4.1) and the private-key envelope (§4.7).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;

use crate::error::{Error, Result};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Draws fresh random salt and nonce bytes from a cryptographic source.
pub fn random_salt_and_nonce() -> ([u8; SALT_LEN], [u8; NONCE_LEN]) {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);
    (salt, nonce)
}

/// Derives a 32-byte AES-256 key from a passphrase and salt via
/// PBKDF2-HMAC-SHA256, 100 000 iterations.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> SecretSlice<u8> {
    let mut key = vec![0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase, salt, PBKDF2_ROUNDS, &mut key);
    SecretSlice::from(key)
}

/// Encrypts `plaintext` under (`key`, `nonce`) with empty AAD.
pub fn encrypt(key: &SecretSlice<u8>, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|err| Error::CryptoAuth(format!("encryption failed: {err}")))
}

/// Decrypts `ciphertext` under (`key`, `nonce`). A tag mismatch is always a
/// `CryptoAuth` error, never silently returned as garbage plaintext.
pub fn decrypt(key: &SecretSlice<u8>, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|err| Error::CryptoAuth(format!("tag verification failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic_given_same_salt() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(b"hunter2", &salt);
        let b = derive_key(b"hunter2", &salt);
        assert_eq!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn derive_key_differs_across_salts() {
        let a = derive_key(b"hunter2", &[1u8; SALT_LEN]);
        let b = derive_key(b"hunter2", &[2u8; SALT_LEN]);
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let key = derive_key(b"pw", &[0u8; SALT_LEN]);
        let nonce = [1u8; NONCE_LEN];
        let ct = encrypt(&key, &nonce, b"hello world").unwrap();
        let pt = decrypt(&key, &nonce, &ct).unwrap();
        assert_eq!(pt, b"hello world");
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = derive_key(b"pw", &[0u8; SALT_LEN]);
        let nonce = [1u8; NONCE_LEN];
        let mut ct = encrypt(&key, &nonce, b"hello world").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert!(matches!(decrypt(&key, &nonce, &ct), Err(Error::CryptoAuth(_))));
    }
}

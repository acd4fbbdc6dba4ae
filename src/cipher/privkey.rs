//! Private-key sealer / unsealer (§4.7).
//!
//! Identical construction to the payload envelope, minus the asymmetric
//! wrap: the AEAD key is directly the PBKDF2-derived key from the
//! private-key passphrase.
//!
//! ```text
//! magic="PRIVKEY_AES" (11) | salt(16) | nonce(12) | ciphertext
//! ```

use secrecy::SecretSlice;

use super::aesgcm::{self, NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};

const MAGIC: &[u8] = b"PRIVKEY_AES";
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

/// Seals a serialized private key (DER bytes) under a passphrase.
pub fn seal(private_key_der: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let (salt, nonce) = aesgcm::random_salt_and_nonce();
    let key = aesgcm::derive_key(passphrase, &salt);
    let ciphertext = aesgcm::encrypt(&key, &nonce, private_key_der)?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Unseals a private key sealed by [`seal`], returning its DER bytes inside
/// a zeroizing container.
pub fn unseal(sealed: &[u8], passphrase: &[u8]) -> Result<SecretSlice<u8>> {
    if sealed.len() < HEADER_LEN || &sealed[..MAGIC.len()] != MAGIC {
        return Err(Error::Format(
            "sealed private key: bad magic or truncated header".into(),
        ));
    }

    let mut offset = MAGIC.len();
    let salt = &sealed[offset..offset + SALT_LEN];
    offset += SALT_LEN;
    let nonce = &sealed[offset..offset + NONCE_LEN];
    offset += NONCE_LEN;
    let ciphertext = &sealed[offset..];

    let key = aesgcm::derive_key(passphrase, salt);
    aesgcm::decrypt(&key, nonce, ciphertext).map(SecretSlice::from)
}

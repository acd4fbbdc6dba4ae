//! Payload sealer / unsealer (§4.1).
//!
//! ```text
//! magic="AES256GCM" (9) | salt(16) | nonce(12) | wrapped_key_len(2, BE) | wrapped_key | ciphertext
//! ```
//!
//! The passphrase does not gate decryption: the session key is derived from
//! it deterministically and then *also* wrapped to the recipient's public
//! key. Decrypting only ever needs the private key. That asymmetry is
//! intentional and is preserved here rather than "fixed".

use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;

use super::aesgcm::{self, NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};

const MAGIC: &[u8] = b"AES256GCM";
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN + 2;

/// Seals `plaintext` for `public_key`, deriving the session key from
/// `passphrase` alongside a random salt and nonce.
pub fn seal(plaintext: &[u8], passphrase: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    let (salt, nonce) = aesgcm::random_salt_and_nonce();
    let key = aesgcm::derive_key(passphrase, &salt);
    let ciphertext = aesgcm::encrypt(&key, &nonce, plaintext)?;
    let wrapped_key = oaep_wrap(public_key, key.expose_secret())?;

    let wrapped_key_len = u16::try_from(wrapped_key.len())
        .map_err(|_| Error::Format("wrapped key too long to encode".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + wrapped_key.len() + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&wrapped_key_len.to_be_bytes());
    out.extend_from_slice(&wrapped_key);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Unseals an envelope produced by [`seal`], using the recipient's private
/// key. The passphrase plays no role here; see the module note above.
pub fn unseal(envelope: &[u8], private_key: &RsaPrivateKey) -> Result<Vec<u8>> {
    if envelope.len() < HEADER_LEN || &envelope[..MAGIC.len()] != MAGIC {
        return Err(Error::Format("envelope: bad magic or truncated header".into()));
    }

    let mut offset = MAGIC.len();
    let salt = &envelope[offset..offset + SALT_LEN];
    offset += SALT_LEN;
    let nonce = &envelope[offset..offset + NONCE_LEN];
    offset += NONCE_LEN;
    let wrapped_key_len = u16::from_be_bytes([envelope[offset], envelope[offset + 1]]) as usize;
    offset += 2;

    if envelope.len() < offset + wrapped_key_len {
        return Err(Error::Format("envelope: truncated wrapped key".into()));
    }
    let wrapped_key = &envelope[offset..offset + wrapped_key_len];
    offset += wrapped_key_len;
    let ciphertext = &envelope[offset..];

    let key = oaep_unwrap(private_key, wrapped_key)?;
    aesgcm::decrypt(&key, nonce, ciphertext)
}

fn oaep_wrap(public_key: &RsaPublicKey, session_key: &[u8]) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), session_key)
        .map_err(|err| Error::KeyUnwrap(format!("session key wrap failed: {err}")))
}

fn oaep_unwrap(private_key: &RsaPrivateKey, wrapped_key: &[u8]) -> Result<SecretSlice<u8>> {
    private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped_key)
        .map(SecretSlice::from)
        .map_err(|err| Error::KeyUnwrap(format!("session key unwrap failed: {err}")))
}

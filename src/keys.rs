//! Asymmetric key-pair generation and serialization.
//!
//! Keys are carried on the wire as DER (`SubjectPublicKeyInfo` for the public
//! half, PKCS8 for the private half) rather than PEM: the records that carry
//! them ("META2", the sealed-private-key ciphertext) are already binary
//! containers, so a textual wrapper would be pure overhead.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretSlice};

use crate::error::{Error, Result};

/// RSA key size used for the session-key wrap. 2048 bits yields a 256-byte
/// OAEP-SHA256 ciphertext, the `wrapped_key_len` assumed by the concrete
/// scenarios in the testable-properties section.
const KEY_BITS: usize = 2048;

/// A freshly generated key pair, held only from generation through sealing.
///
/// The private half is kept DER-encoded inside a zeroizing container; it is
/// decoded back into an `RsaPrivateKey` only for the instant an unwrap
/// actually needs it.
pub struct KeyPair {
    pub public: RsaPublicKey,
    private_der: SecretSlice<u8>,
}

impl KeyPair {
    /// Generates a fresh key pair from a cryptographic RNG.
    pub fn generate() -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, KEY_BITS)
            .map_err(|err| Error::KeyUnwrap(format!("key generation failed: {err}")))?;
        let public = RsaPublicKey::from(&private);
        let private_der = private
            .to_pkcs8_der()
            .map_err(|err| Error::Format(format!("private key encoding failed: {err}")))?;
        Ok(Self {
            public,
            private_der: SecretSlice::from(private_der.as_bytes().to_vec()),
        })
    }

    /// Decodes the private key back out of its zeroizing DER container.
    pub fn private_key(&self) -> Result<RsaPrivateKey> {
        private_key_from_der(self.private_der.expose_secret())
    }

    /// Public key serialized as DER, the exact bytes carried by a "META2"
    /// record.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        public_key_to_der(&self.public)
    }

    /// Private key serialized as DER, the exact bytes sealed into a
    /// "PRIVKEY_AES" record.
    pub fn private_key_der(&self) -> SecretSlice<u8> {
        SecretSlice::from(self.private_der.expose_secret().to_vec())
    }
}

pub fn public_key_to_der(key: &RsaPublicKey) -> Result<Vec<u8>> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|err| Error::Format(format!("public key encoding failed: {err}")))
}

pub fn public_key_from_der(der: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_der(der)
        .map_err(|err| Error::Format(format!("public key decoding failed: {err}")))
}

pub fn private_key_from_der(der: &[u8]) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der)
        .map_err(|err| Error::KeyUnwrap(format!("private key decoding failed: {err}")))
}

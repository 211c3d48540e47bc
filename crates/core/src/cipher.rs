//! Field-level encryption for identifiers stored at rest.
//!
//! AES-256-GCM keyed by the SHA-256 digest of the environment's encryption secret. Every call
//! to [`FieldCipher::encrypt`] draws a fresh 96-bit nonce, so equal plaintexts never produce
//! equal ciphertexts. The stored form is `base64(nonce || ciphertext || tag)`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,
    #[error("ciphertext is not valid base64")]
    Encoding,
    #[error("ciphertext is too short to contain a nonce")]
    Truncated,
    #[error("ciphertext failed authentication")]
    Authentication,
    #[error("decrypted value is not utf-8")]
    Utf8,
}

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    pub fn new(secret: &SecretString) -> Self {
        let key = Sha256::digest(secret.expose_secret().as_bytes());
        Self { cipher: Aes256Gcm::new(&key) }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed =
            self.cipher.encrypt(&nonce, plaintext.as_bytes()).map_err(|_| CipherError::Encrypt)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload))
    }

    /// Fail-soft decryption: anything that does not decrypt under this key is returned as-is.
    pub fn decrypt(&self, ciphertext: &str) -> String {
        self.try_decrypt(ciphertext).unwrap_or_else(|_| ciphertext.to_owned())
    }

    pub fn try_decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let payload = STANDARD.decode(ciphertext.trim()).map_err(|_| CipherError::Encoding)?;
        if payload.len() <= NONCE_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)?;
        String::from_utf8(opened).map_err(|_| CipherError::Utf8)
    }
}

//! AES-256-GCM encryption of token values at rest
//!
//! Envelope: base64(nonce || ciphertext+tag), with a fresh random 96-bit
//! nonce per encryption. The key is SHA-256 of the configured secret.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Failure to encrypt or decrypt a stored token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("no encryption secret configured")]
    MissingKey,

    #[error("malformed encrypted payload: {0}")]
    Malformed(String),

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed (wrong key or tampered payload)")]
    Decryption,
}

/// Symmetric cipher keyed by an out-of-band secret
#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCipher(..)")
    }
}

impl TokenCipher {
    /// Derive the key from `secret`. An empty secret is refused.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::MissingKey);
        }

        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());

        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(nonce.as_slice());
        envelope.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(envelope))
    }

    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(envelope)
            .map_err(|e| CryptoError::Malformed(e.to_string()))?;

        if bytes.len() <= NONCE_LEN {
            return Err(CryptoError::Malformed(format!(
                "payload is {} bytes, too short for nonce and tag",
                bytes.len()
            )));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = TokenCipher::from_secret("s3cret").unwrap();
        let envelope = cipher.encrypt("abc.def.ghi").unwrap();

        assert!(!envelope.contains("abc.def.ghi"));
        assert_eq!(cipher.decrypt(&envelope).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_nonce_is_fresh() {
        let cipher = TokenCipher::from_secret("s3cret").unwrap();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = TokenCipher::from_secret("one").unwrap().encrypt("token").unwrap();
        let other = TokenCipher::from_secret("two").unwrap();

        assert_eq!(other.decrypt(&envelope), Err(CryptoError::Decryption));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let cipher = TokenCipher::from_secret("s3cret").unwrap();
        let mut bytes = STANDARD.decode(cipher.encrypt("token").unwrap()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert_eq!(cipher.decrypt(&STANDARD.encode(bytes)), Err(CryptoError::Decryption));
    }

    #[test]
    fn test_malformed_payloads() {
        let cipher = TokenCipher::from_secret("s3cret").unwrap();

        assert!(matches!(cipher.decrypt("%%% not base64"), Err(CryptoError::Malformed(_))));
        assert!(matches!(cipher.decrypt(&STANDARD.encode([0u8; 4])), Err(CryptoError::Malformed(_))));
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(matches!(TokenCipher::from_secret(""), Err(CryptoError::MissingKey)));
    }
}

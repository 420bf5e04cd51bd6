//! AES-256-GCM with a caller-supplied key. Used directly in local mode and
//! as the payload cipher under envelope encryption.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use vigil_core::constants::LOCAL_KEY_LEN;
use vigil_core::errors::{CryptoError, VigilResult};

const NONCE_LEN: usize = 12;

/// Symmetric authenticated encryption with a fixed key.
pub struct LocalCipher {
    cipher: Aes256Gcm,
}

impl LocalCipher {
    /// Build from the server-held key as configured (base64, 32 bytes).
    pub fn from_base64_key(encoded: &str) -> VigilResult<Self> {
        let bytes = B64.decode(encoded.trim()).map_err(|e| CryptoError::KeyConfig {
            reason: format!("local key is not valid base64: {e}"),
        })?;
        Self::from_key_bytes(&bytes)
    }

    pub fn from_key_bytes(bytes: &[u8]) -> VigilResult<Self> {
        if bytes.len() != LOCAL_KEY_LEN {
            return Err(CryptoError::KeyConfig {
                reason: format!("key must be {LOCAL_KEY_LEN} bytes, got {}", bytes.len()),
            }
            .into());
        }
        let key = Key::<Aes256Gcm>::from_slice(bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt and encode as base64 of `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> VigilResult<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Cipher {
                reason: "AEAD encryption failed".to_string(),
            })?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(B64.encode(out))
    }

    /// Decrypt a blob produced by [`LocalCipher::encrypt`].
    ///
    /// Any failure here means the stored payload is corrupt or the key is
    /// wrong; both are permanent.
    pub fn decrypt(&self, encoded: &str) -> VigilResult<Vec<u8>> {
        let raw = B64.decode(encoded).map_err(|e| CryptoError::Cipher {
            reason: format!("ciphertext is not valid base64: {e}"),
        })?;
        if raw.len() < NONCE_LEN {
            return Err(CryptoError::Cipher {
                reason: "ciphertext shorter than nonce".to_string(),
            }
            .into());
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                CryptoError::Cipher {
                    reason: "AEAD authentication failed".to_string(),
                }
                .into()
            })
    }
}

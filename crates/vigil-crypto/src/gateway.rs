//! The encryption gateway the run repository writes through.

use std::sync::Arc;

use vigil_core::config::EncryptionConfig;
use vigil_core::errors::{CryptoError, VigilResult};
use vigil_core::models::EncryptionMode;
use vigil_core::traits::KmsClient;

use crate::envelope::EnvelopeCipher;
use crate::kms_http::HttpKmsClient;
use crate::local::LocalCipher;

/// An encrypted findings blob as persisted: ciphertext, the mode tag it
/// must be decrypted under, and the wrapped data key for kms rows.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    pub mode: EncryptionMode,
    pub ciphertext: String,
    pub wrapped_data_key: Option<String>,
}

impl EncryptedPayload {
    /// Rebuild from persisted columns, rejecting unknown mode tags.
    pub fn from_columns(
        mode_tag: &str,
        ciphertext: String,
        wrapped_data_key: Option<String>,
    ) -> VigilResult<Self> {
        let mode = EncryptionMode::from_tag(mode_tag).ok_or_else(|| CryptoError::UnknownMode {
            tag: mode_tag.to_string(),
        })?;
        Ok(Self {
            mode,
            ciphertext,
            wrapped_data_key,
        })
    }
}

/// Dual-mode payload encryption.
///
/// The write mode is fixed per deployment. The read path dispatches on the
/// persisted tag instead, so a deployment that switched modes still reads
/// its old rows; it only needs the matching key material configured.
pub struct EncryptionGateway {
    mode: EncryptionMode,
    local: Option<LocalCipher>,
    envelope: Option<EnvelopeCipher>,
}

impl std::fmt::Debug for EncryptionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionGateway")
            .field("mode", &self.mode)
            .field("local", &self.local.is_some())
            .field("envelope", &self.envelope.is_some())
            .finish()
    }
}

impl EncryptionGateway {
    /// Build with an explicit KMS client (tests inject a mock here).
    pub fn new(cfg: &EncryptionConfig, kms: Option<Arc<dyn KmsClient>>) -> VigilResult<Self> {
        let local = match &cfg.local_key_b64 {
            Some(key) => Some(LocalCipher::from_base64_key(key)?),
            None => None,
        };
        let envelope = kms.map(|client| {
            EnvelopeCipher::new(client, cfg.kms.cache_ttl_secs, cfg.kms.cache_capacity)
        });

        match cfg.mode {
            EncryptionMode::Local if local.is_none() => {
                return Err(CryptoError::KeyConfig {
                    reason: "local mode requires encryption.local_key_b64".to_string(),
                }
                .into());
            }
            EncryptionMode::Kms if envelope.is_none() => {
                return Err(CryptoError::KeyConfig {
                    reason: "kms mode requires a configured KMS client".to_string(),
                }
                .into());
            }
            _ => {}
        }

        Ok(Self {
            mode: cfg.mode,
            local,
            envelope,
        })
    }

    /// Build from configuration, constructing the HTTP KMS client when the
    /// deployment needs one.
    pub fn from_config(cfg: &EncryptionConfig) -> VigilResult<Self> {
        let wants_kms = cfg.mode == EncryptionMode::Kms || !cfg.kms.endpoint.is_empty();
        let kms: Option<Arc<dyn KmsClient>> = if wants_kms {
            Some(Arc::new(HttpKmsClient::from_config(&cfg.kms)?))
        } else {
            None
        };
        Self::new(cfg, kms)
    }

    pub fn mode(&self) -> EncryptionMode {
        self.mode
    }

    /// Encrypt a payload under the deployment's configured mode.
    pub fn encrypt(&self, plaintext: &str) -> VigilResult<EncryptedPayload> {
        match self.mode {
            EncryptionMode::Local => {
                let cipher = self.local.as_ref().expect("checked at construction");
                Ok(EncryptedPayload {
                    mode: EncryptionMode::Local,
                    ciphertext: cipher.encrypt(plaintext.as_bytes())?,
                    wrapped_data_key: None,
                })
            }
            EncryptionMode::Kms => {
                let envelope = self.envelope.as_ref().expect("checked at construction");
                let (ciphertext, wrapped) = envelope.encrypt(plaintext.as_bytes())?;
                Ok(EncryptedPayload {
                    mode: EncryptionMode::Kms,
                    ciphertext,
                    wrapped_data_key: Some(wrapped),
                })
            }
        }
    }

    /// Decrypt a stored payload by dispatching on its persisted mode tag.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> VigilResult<String> {
        let bytes = match payload.mode {
            EncryptionMode::Local => {
                let cipher = self.local.as_ref().ok_or_else(|| CryptoError::KeyConfig {
                    reason: "row is local-mode but no local key is configured".to_string(),
                })?;
                cipher.decrypt(&payload.ciphertext)?
            }
            EncryptionMode::Kms => {
                let envelope = self.envelope.as_ref().ok_or_else(|| CryptoError::KeyConfig {
                    reason: "row is kms-mode but no KMS client is configured".to_string(),
                })?;
                let wrapped =
                    payload
                        .wrapped_data_key
                        .as_deref()
                        .ok_or_else(|| CryptoError::Cipher {
                            reason: "kms-mode row has no wrapped data key".to_string(),
                        })?;
                envelope.decrypt(&payload.ciphertext, wrapped)?
            }
        };
        String::from_utf8(bytes).map_err(|_| {
            CryptoError::Cipher {
                reason: "decrypted payload is not UTF-8".to_string(),
            }
            .into()
        })
    }

    /// Whether encryption can currently be performed, for health checks.
    pub fn available(&self) -> bool {
        match self.mode {
            EncryptionMode::Local => self.local.is_some(),
            EncryptionMode::Kms => self
                .envelope
                .as_ref()
                .is_some_and(EnvelopeCipher::kms_available),
        }
    }
}

/// Encryption-gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The server-held key or KMS configuration is unusable. Permanent.
    #[error("encryption key misconfigured: {reason}")]
    KeyConfig { reason: String },

    /// AEAD failure. On decrypt this means the stored payload is corrupt.
    #[error("cipher failure: {reason}")]
    Cipher { reason: String },

    /// The KMS could not unwrap the data key. Often transient (network, IAM);
    /// kept distinct from corrupt-data failures so callers can recover.
    #[error("decryption unavailable: {reason}")]
    DecryptionUnavailable { reason: String },

    /// The KMS could not be reached while generating a data key.
    #[error("KMS request failed: {reason}")]
    KmsUnavailable { reason: String },

    #[error("unknown encryption mode tag '{tag}'")]
    UnknownMode { tag: String },
}

impl CryptoError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CryptoError::DecryptionUnavailable { .. } | CryptoError::KmsUnavailable { .. }
        )
    }
}

use crate::errors::VigilResult;

/// A freshly generated data key: the plaintext half encrypts the payload
/// locally, the wrapped half is persisted next to the ciphertext.
#[derive(Debug, Clone)]
pub struct DataKey {
    pub plaintext: Vec<u8>,
    /// Opaque KMS-encrypted form, base64.
    pub wrapped: String,
}

/// External key-management service used for envelope encryption.
pub trait KmsClient: Send + Sync {
    /// Generate a data key under the configured master key.
    fn generate_data_key(&self) -> VigilResult<DataKey>;

    /// Unwrap a previously wrapped data key.
    ///
    /// Failures here must surface as recoverable `DecryptionUnavailable`
    /// errors: they are often transient (network, IAM) and must not be
    /// conflated with corrupt ciphertext.
    fn decrypt_data_key(&self, wrapped: &str) -> VigilResult<Vec<u8>>;

    /// Implementation name for logs and status reporting.
    fn name(&self) -> &str;

    /// Cheap reachability probe used by backend health checks.
    fn is_available(&self) -> bool {
        true
    }
}

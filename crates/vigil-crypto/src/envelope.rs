//! Envelope encryption: payload encrypted with a data key, data key
//! wrapped by the external KMS.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::sync::Cache;

use vigil_core::errors::VigilResult;
use vigil_core::traits::{DataKey, KmsClient};

use crate::local::LocalCipher;

struct CachedDataKey {
    key: DataKey,
    acquired: Instant,
}

/// Payload cipher backed by a KMS-wrapped data key.
///
/// Data keys are reused on the write path and unwrapped keys cached on the
/// read path, both within a configurable TTL, so steady-state traffic does
/// not pay one KMS round trip per payload.
pub struct EnvelopeCipher {
    client: Arc<dyn KmsClient>,
    unwrap_cache: Cache<String, Vec<u8>>,
    current_key: Mutex<Option<CachedDataKey>>,
    reuse_ttl: Duration,
}

impl EnvelopeCipher {
    pub fn new(client: Arc<dyn KmsClient>, cache_ttl_secs: u64, cache_capacity: u64) -> Self {
        let unwrap_cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();
        Self {
            client,
            unwrap_cache,
            current_key: Mutex::new(None),
            reuse_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }

    /// Encrypt a payload. Returns `(ciphertext_b64, wrapped_data_key)`.
    pub fn encrypt(&self, plaintext: &[u8]) -> VigilResult<(String, String)> {
        let key = self.obtain_data_key()?;
        let ciphertext = LocalCipher::from_key_bytes(&key.plaintext)?.encrypt(plaintext)?;
        Ok((ciphertext, key.wrapped))
    }

    /// Decrypt a payload given its stored wrapped key.
    ///
    /// Requires one KMS unwrap call unless the key is cached. KMS failures
    /// propagate as `DecryptionUnavailable`; an AEAD failure afterwards
    /// means corrupt data.
    pub fn decrypt(&self, ciphertext: &str, wrapped: &str) -> VigilResult<Vec<u8>> {
        let key_bytes = match self.unwrap_cache.get(wrapped) {
            Some(bytes) => bytes,
            None => {
                let bytes = self.client.decrypt_data_key(wrapped)?;
                self.unwrap_cache.insert(wrapped.to_string(), bytes.clone());
                bytes
            }
        };
        LocalCipher::from_key_bytes(&key_bytes)?.decrypt(ciphertext)
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    pub fn kms_available(&self) -> bool {
        self.client.is_available()
    }

    /// Reuse the current data key while fresh, otherwise generate a new one.
    fn obtain_data_key(&self) -> VigilResult<DataKey> {
        let mut slot = self
            .current_key
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cached) = slot.as_ref() {
            if cached.acquired.elapsed() < self.reuse_ttl {
                return Ok(cached.key.clone());
            }
        }
        let key = self.client.generate_data_key()?;
        // Warm the read path for rows written with this key.
        self.unwrap_cache
            .insert(key.wrapped.clone(), key.plaintext.clone());
        *slot = Some(CachedDataKey {
            key: key.clone(),
            acquired: Instant::now(),
        });
        Ok(key)
    }
}

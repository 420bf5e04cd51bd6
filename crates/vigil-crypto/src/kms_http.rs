//! HTTP client for the external key-management service.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use vigil_core::config::KmsConfig;
use vigil_core::errors::{CryptoError, VigilResult};
use vigil_core::traits::{DataKey, KmsClient};

#[derive(Debug, Serialize)]
struct GenerateDataKeyRequest<'a> {
    key_id: &'a str,
    key_spec: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateDataKeyResponse {
    plaintext_key_b64: String,
    wrapped_key: String,
}

#[derive(Debug, Serialize)]
struct DecryptRequest<'a> {
    key_id: &'a str,
    wrapped_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct DecryptResponse {
    plaintext_key_b64: String,
}

/// KMS client over HTTP with bearer auth.
pub struct HttpKmsClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    key_id: String,
    auth_token: Option<String>,
}

impl HttpKmsClient {
    pub fn from_config(cfg: &KmsConfig) -> VigilResult<Self> {
        if cfg.endpoint.is_empty() {
            return Err(CryptoError::KeyConfig {
                reason: "kms.endpoint is not configured".to_string(),
            }
            .into());
        }
        if cfg.key_id.is_empty() {
            return Err(CryptoError::KeyConfig {
                reason: "kms.key_id is not configured".to_string(),
            }
            .into());
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| CryptoError::KeyConfig {
                reason: format!("build KMS HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            key_id: cfg.key_id.clone(),
            auth_token: cfg.auth_token.clone(),
        })
    }

    fn post<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = format!("{}{path}", self.endpoint);
        let mut req = self.http.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().map_err(|e| format!("POST {url}: {e}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("POST {url}: HTTP {status}"));
        }
        resp.json().map_err(|e| format!("decode {url} response: {e}"))
    }
}

impl KmsClient for HttpKmsClient {
    fn generate_data_key(&self) -> VigilResult<DataKey> {
        let resp: GenerateDataKeyResponse = self
            .post(
                "/v1/datakey/generate",
                &GenerateDataKeyRequest {
                    key_id: &self.key_id,
                    key_spec: "AES_256",
                },
            )
            .map_err(|reason| CryptoError::KmsUnavailable { reason })?;
        let plaintext = B64
            .decode(&resp.plaintext_key_b64)
            .map_err(|e| CryptoError::KmsUnavailable {
                reason: format!("malformed data key in KMS response: {e}"),
            })?;
        Ok(DataKey {
            plaintext,
            wrapped: resp.wrapped_key,
        })
    }

    fn decrypt_data_key(&self, wrapped: &str) -> VigilResult<Vec<u8>> {
        let resp: DecryptResponse = self
            .post(
                "/v1/datakey/decrypt",
                &DecryptRequest {
                    key_id: &self.key_id,
                    wrapped_key: wrapped,
                },
            )
            .map_err(|reason| CryptoError::DecryptionUnavailable { reason })?;
        B64.decode(&resp.plaintext_key_b64)
            .map_err(|e| {
                CryptoError::DecryptionUnavailable {
                    reason: format!("malformed data key in KMS response: {e}"),
                }
                .into()
            })
    }

    fn name(&self) -> &str {
        "http-kms"
    }

    fn is_available(&self) -> bool {
        let url = format!("{}/healthz", self.endpoint);
        match self.http.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "KMS health probe failed");
                false
            }
        }
    }
}

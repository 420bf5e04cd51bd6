//! # vigil-crypto
//!
//! Encryption at rest for findings payloads. Two interchangeable modes:
//! local AEAD with a server-held key, and envelope encryption where the
//! data key is wrapped by an external KMS. The persisted mode tag makes
//! the decrypt path a dispatch, so mixed-mode history reads correctly.

pub mod envelope;
pub mod gateway;
pub mod kms_http;
pub mod local;

pub use envelope::EnvelopeCipher;
pub use gateway::{EncryptedPayload, EncryptionGateway};
pub use kms_http::HttpKmsClient;
pub use local::LocalCipher;

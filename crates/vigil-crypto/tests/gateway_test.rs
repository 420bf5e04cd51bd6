//! Round-trip and failure-mode tests for the encryption gateway.

use std::sync::Arc;

use test_fixtures::{local_test_key_b64, MockKms};
use vigil_core::config::EncryptionConfig;
use vigil_core::errors::{CryptoError, VigilError};
use vigil_core::models::EncryptionMode;
use vigil_crypto::{EncryptedPayload, EncryptionGateway};

fn local_config() -> EncryptionConfig {
    EncryptionConfig {
        mode: EncryptionMode::Local,
        local_key_b64: Some(local_test_key_b64()),
        ..Default::default()
    }
}

fn kms_config() -> EncryptionConfig {
    EncryptionConfig {
        mode: EncryptionMode::Kms,
        local_key_b64: None,
        ..Default::default()
    }
}

fn kms_gateway(kms: Arc<MockKms>) -> EncryptionGateway {
    EncryptionGateway::new(&kms_config(), Some(kms)).unwrap()
}

// ─── Round trips ───

#[test]
fn local_mode_round_trips() {
    let gateway = EncryptionGateway::new(&local_config(), None).unwrap();
    let payload = gateway.encrypt(r#"{"db_metadata":{"version":"16.3"}}"#).unwrap();
    assert_eq!(payload.mode, EncryptionMode::Local);
    assert!(payload.wrapped_data_key.is_none());
    assert_ne!(payload.ciphertext, r#"{"db_metadata":{"version":"16.3"}}"#);

    let plain = gateway.decrypt(&payload).unwrap();
    assert_eq!(plain, r#"{"db_metadata":{"version":"16.3"}}"#);
}

#[test]
fn kms_mode_round_trips_and_stores_wrapped_key() {
    let gateway = kms_gateway(Arc::new(MockKms::new()));
    let payload = gateway.encrypt("sensitive findings").unwrap();
    assert_eq!(payload.mode, EncryptionMode::Kms);
    assert!(payload.wrapped_data_key.is_some());

    assert_eq!(gateway.decrypt(&payload).unwrap(), "sensitive findings");
}

#[test]
fn mixed_history_reads_by_stored_tag() {
    // Deployment writes kms but still holds the old local key.
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Kms,
        local_key_b64: Some(local_test_key_b64()),
        ..Default::default()
    };
    let gateway = EncryptionGateway::new(&cfg, Some(Arc::new(MockKms::new()))).unwrap();

    let old_writer = EncryptionGateway::new(&local_config(), None).unwrap();
    let old_row = old_writer.encrypt("written before the switch").unwrap();

    assert_eq!(gateway.encrypt("new").unwrap().mode, EncryptionMode::Kms);
    assert_eq!(gateway.decrypt(&old_row).unwrap(), "written before the switch");
}

// ─── Failure modes ───

#[test]
fn kms_outage_on_decrypt_is_recoverable() {
    let kms = Arc::new(MockKms::new());
    let gateway = kms_gateway(kms.clone());
    let payload = gateway.encrypt("payload").unwrap();

    // A fresh gateway has a cold cache, so decrypt must call the KMS.
    let cold_gateway = kms_gateway(kms.clone());
    kms.set_fail_decrypt(true);

    let err = cold_gateway.decrypt(&payload).unwrap_err();
    assert!(matches!(
        err,
        VigilError::Crypto(CryptoError::DecryptionUnavailable { .. })
    ));
    assert!(err.is_retryable());

    // Outage over: same row decrypts fine.
    kms.set_fail_decrypt(false);
    assert_eq!(cold_gateway.decrypt(&payload).unwrap(), "payload");
}

#[test]
fn corrupt_ciphertext_is_not_conflated_with_kms_outage() {
    let gateway = EncryptionGateway::new(&local_config(), None).unwrap();
    let mut payload = gateway.encrypt("payload").unwrap();
    payload.ciphertext = payload.ciphertext.chars().rev().collect();

    let err = gateway.decrypt(&payload).unwrap_err();
    assert!(matches!(err, VigilError::Crypto(CryptoError::Cipher { .. })));
    assert!(!err.is_retryable());
}

#[test]
fn wrong_local_key_fails_authentication() {
    let gateway = EncryptionGateway::new(&local_config(), None).unwrap();
    let payload = gateway.encrypt("payload").unwrap();

    let other_key = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        [0x99u8; 32],
    );
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Local,
        local_key_b64: Some(other_key),
        ..Default::default()
    };
    let other = EncryptionGateway::new(&cfg, None).unwrap();
    assert!(matches!(
        other.decrypt(&payload).unwrap_err(),
        VigilError::Crypto(CryptoError::Cipher { .. })
    ));
}

#[test]
fn unwrap_cache_bounds_kms_calls() {
    let kms = Arc::new(MockKms::new());
    let gateway = kms_gateway(kms.clone());
    let payload = gateway.encrypt("cached").unwrap();

    for _ in 0..5 {
        gateway.decrypt(&payload).unwrap();
    }
    // The generate call warmed the cache; no unwrap round trips needed.
    assert_eq!(kms.decrypt_calls(), 0);
}

// ─── Construction and tag handling ───

#[test]
fn local_mode_without_key_is_a_config_error() {
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Local,
        local_key_b64: None,
        ..Default::default()
    };
    assert!(matches!(
        EncryptionGateway::new(&cfg, None).unwrap_err(),
        VigilError::Crypto(CryptoError::KeyConfig { .. })
    ));
}

#[test]
fn malformed_key_is_a_config_error() {
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Local,
        local_key_b64: Some("too-short".to_string()),
        ..Default::default()
    };
    assert!(EncryptionGateway::new(&cfg, None).is_err());
}

#[test]
fn unknown_mode_tag_is_rejected() {
    let err = EncryptedPayload::from_columns("rot13", "abc".to_string(), None).unwrap_err();
    assert!(matches!(
        err,
        VigilError::Crypto(CryptoError::UnknownMode { .. })
    ));
}

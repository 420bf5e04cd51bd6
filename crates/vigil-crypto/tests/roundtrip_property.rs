//! Property: decrypting what the gateway encrypted always yields the
//! original payload, for any findings string.

use proptest::prelude::*;

use test_fixtures::local_test_key_b64;
use vigil_core::config::EncryptionConfig;
use vigil_core::models::EncryptionMode;
use vigil_crypto::EncryptionGateway;

proptest! {
    #[test]
    fn local_encrypt_decrypt_round_trips(payload in ".{0,512}") {
        let cfg = EncryptionConfig {
            mode: EncryptionMode::Local,
            local_key_b64: Some(local_test_key_b64()),
            ..Default::default()
        };
        let gateway = EncryptionGateway::new(&cfg, None).unwrap();
        let encrypted = gateway.encrypt(&payload).unwrap();
        prop_assert_eq!(gateway.decrypt(&encrypted).unwrap(), payload);
    }

    #[test]
    fn ciphertext_never_leaks_plaintext(payload in "[a-z]{16,64}") {
        let cfg = EncryptionConfig {
            mode: EncryptionMode::Local,
            local_key_b64: Some(local_test_key_b64()),
            ..Default::default()
        };
        let gateway = EncryptionGateway::new(&cfg, None).unwrap();
        let encrypted = gateway.encrypt(&payload).unwrap();
        prop_assert!(!encrypted.ciphertext.contains(&payload));
    }
}

//! Golden test vector validation
//!
//! The vectors in `testdata/golden-vectors.json` were produced by an
//! independent PBKDF2 + AES-GCM implementation.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::Deserialize;

use saltgcm::aead::NONCE_LEN;
use saltgcm::crypt::{self, SALT_LEN};
use saltgcm::{Params, Prf};

#[derive(Debug, Deserialize)]
struct GoldenVector {
    plaintext: String,
    passphrase: String,
    salt: String,
    nonce: String,
    prf: String,
    iterations: u32,
    envelope: String,
    comment: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

fn decode(field: &str) -> Vec<u8> {
    BASE64_STANDARD.decode(field).expect("invalid base64 in golden vector")
}

#[test]
fn test_golden_vectors() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were loaded");

    let mut failures = Vec::new();

    for (i, vector) in vectors.iter().enumerate() {
        let expected_plaintext = decode(&vector.plaintext);
        let passphrase = decode(&vector.passphrase);
        let salt: [u8; SALT_LEN] = decode(&vector.salt)
            .try_into()
            .expect("salt must be 16 bytes");
        let nonce: [u8; NONCE_LEN] = decode(&vector.nonce)
            .try_into()
            .expect("nonce must be 12 bytes");
        let prf: Prf = vector.prf.parse().expect("unknown prf in golden vector");
        let params = Params::new(prf, vector.iterations).expect("invalid params");

        let encrypted = match crypt::encrypt_deterministic(
            &passphrase,
            &expected_plaintext,
            &salt,
            &nonce,
            &params,
        ) {
            Ok(envelope) => envelope,
            Err(e) => {
                failures.push(format!(
                    "vector {} ({}): encrypt failed: {}",
                    i, vector.comment, e
                ));
                continue;
            }
        };
        if encrypted != vector.envelope {
            failures.push(format!(
                "vector {} ({}): envelope mismatch\n  expected: {}\n  actual:   {}",
                i, vector.comment, vector.envelope, encrypted
            ));
            continue;
        }

        match crypt::decrypt(&passphrase, &vector.envelope, &params) {
            Ok(decrypted) if decrypted == expected_plaintext => {}
            Ok(decrypted) => failures.push(format!(
                "vector {} ({}): plaintext mismatch, expected {} bytes, got {}",
                i,
                vector.comment,
                expected_plaintext.len(),
                decrypted.len()
            )),
            Err(e) => failures.push(format!(
                "vector {} ({}): decrypt failed: {}",
                i, vector.comment, e
            )),
        }
    }

    assert!(
        failures.is_empty(),
        "golden vector failures:\n{}",
        failures.join("\n")
    );
}

#[test]
fn test_golden_vectors_reject_wrong_passphrase() {
    let vectors = load_golden_vectors();
    let vector = &vectors[0];
    let params = Params::new(vector.prf.parse().unwrap(), vector.iterations).unwrap();

    let err = crypt::decrypt(b"not the passphrase", &vector.envelope, &params).unwrap_err();
    assert_eq!(err.kind, Some(saltgcm::ErrorKind::AuthenticationFailed));
}

//! Password-based encryption using PBKDF2 + AES-256-GCM
//!
//! This module ties the pieces together:
//! - a fresh random salt feeds PBKDF2 to derive a 256-bit key from the password
//! - a fresh random nonce and the key drive AES-256-GCM
//! - salt, nonce and sealed ciphertext are framed into one envelope string
//!
//! Decryption parses the envelope, re-derives the key from the stored salt
//! and verifies the GCM tag before returning anything.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::aead::{self, NONCE_LEN};
use crate::envelope::{self, Envelope};
use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};
use crate::kdf::{self, DerivedKey};
use crate::params::Params;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Generate a fresh salt from `rng`.
pub fn generate_salt<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    salt
}

/// Generate a fresh nonce from `rng`.
pub fn generate_nonce<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    nonce
}

fn derive(password: &[u8], salt: &[u8], params: &Params) -> Result<DerivedKey> {
    kdf::derive_key(
        params.prf(),
        password,
        salt,
        params.iterations(),
        params.key_bits(),
    )
}

/// Encrypt plaintext with a password using random salt and nonce from the OS.
///
/// Returns the envelope string `base64(salt):base64(nonce):base64(ciphertext)`.
pub fn encrypt(password: &[u8], plaintext: &[u8], params: &Params) -> Result<String> {
    encrypt_with_rng(&mut OsRng, password, plaintext, params)
}

/// Encrypt plaintext with a password, drawing salt and nonce from `rng`.
pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    password: &[u8],
    plaintext: &[u8],
    params: &Params,
) -> Result<String> {
    let salt = generate_salt(rng);
    let nonce = generate_nonce(rng);

    encrypt_deterministic(password, plaintext, &salt, &nonce, params)
}

/// Encrypt plaintext with a password using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - reusing a nonce under the same key breaks
/// AES-GCM. Use `encrypt()` which generates random salt/nonce.
pub fn encrypt_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    params: &Params,
) -> Result<String> {
    tracing::debug!(
        prf = %params.prf(),
        iterations = params.iterations(),
        plaintext_len = plaintext.len(),
        "encrypting"
    );

    let key = derive(password, salt, params)?;
    let sealed = aead::seal(key.as_bytes(), nonce, plaintext)?;

    Ok(envelope::encode_envelope(salt, nonce, &sealed))
}

/// Decrypt an envelope string with a password
pub fn decrypt(password: &[u8], encoded: &str, params: &Params) -> Result<Vec<u8>> {
    let Envelope {
        salt,
        nonce,
        ciphertext,
    } = envelope::decode_envelope(encoded)?;

    if salt.len() != SALT_LEN {
        return Err(SaltgcmError::malformed_envelope(format!(
            "salt must be {} bytes, got {}",
            SALT_LEN,
            salt.len()
        )));
    }
    if nonce.len() != NONCE_LEN {
        return Err(SaltgcmError::malformed_envelope(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }

    tracing::debug!(
        prf = %params.prf(),
        iterations = params.iterations(),
        ciphertext_len = ciphertext.len(),
        "decrypting"
    );

    let key = derive(password, &salt, params)?;
    aead::open(key.as_bytes(), &nonce, &ciphertext)
}

/// Decrypt an envelope string whose plaintext is expected to be UTF-8 text.
pub fn decrypt_to_string(password: &[u8], encoded: &str, params: &Params) -> Result<String> {
    let plaintext = decrypt(password, encoded, params)?;
    String::from_utf8(plaintext).map_err(|e| {
        SaltgcmError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidUtf8,
            "decrypted data is not valid UTF-8",
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::TAG_LEN;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params() -> Params {
        Params::default()
    }

    #[test]
    fn test_passtest1_scenario() {
        let encrypted = encrypt(b"passtest1", b"Secret message", &params()).unwrap();

        let parts: Vec<&str> = encrypted.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(STANDARD.decode(parts[0]).unwrap().len(), SALT_LEN);
        assert_eq!(STANDARD.decode(parts[1]).unwrap().len(), NONCE_LEN);
        assert_eq!(
            STANDARD.decode(parts[2]).unwrap().len(),
            b"Secret message".len() + TAG_LEN
        );

        let decrypted = decrypt_to_string(b"passtest1", &encrypted, &params()).unwrap();
        assert_eq!(decrypted, "Secret message");
    }

    #[test]
    fn test_empty_plaintext() {
        let encrypted = encrypt(b"test", b"", &params()).unwrap();
        let decrypted = decrypt_to_string(b"test", &encrypted, &params()).unwrap();
        assert_eq!(decrypted, "");
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();

        let encrypted = encrypt(b"test", &plaintext, &params()).unwrap();
        let decrypted = decrypt(b"test", &encrypted, &params()).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_non_utf8_password() {
        let password: &[u8] = &[0xff, 0xfe, 0x00, 0x01];

        let encrypted = encrypt(password, b"hello", &params()).unwrap();
        let decrypted = decrypt(password, &encrypted, &params()).unwrap();

        assert_eq!(decrypted, b"hello");
    }

    #[test]
    fn test_wrong_password() {
        let encrypted = encrypt(b"correct", b"secret", &params()).unwrap();
        let err = decrypt(b"wrong", &encrypted, &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_mismatched_params() {
        let encrypted = encrypt(b"test", b"secret", &params()).unwrap();
        let other = Params::new(params().prf(), 20_000).unwrap();
        let err = decrypt(b"test", &encrypted, &other).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_fresh_salt_and_nonce() {
        let e1 = encrypt(b"test", b"same plaintext", &params()).unwrap();
        let e2 = encrypt(b"test", b"same plaintext", &params()).unwrap();

        let d1 = envelope::decode_envelope(&e1).unwrap();
        let d2 = envelope::decode_envelope(&e2).unwrap();
        assert_ne!(d1.salt, d2.salt);
        assert_ne!(d1.nonce, d2.nonce);
        assert_ne!(e1, e2);

        assert_eq!(decrypt(b"test", &e1, &params()).unwrap(), b"same plaintext");
        assert_eq!(decrypt(b"test", &e2, &params()).unwrap(), b"same plaintext");
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let seeded = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            encrypt_with_rng(&mut rng, b"test", b"hi", &params()).unwrap()
        };

        assert_eq!(seeded(7), seeded(7));
        assert_ne!(seeded(7), seeded(8));
    }

    #[test]
    fn test_generators_draw_from_rng() {
        let mut rng = StdRng::seed_from_u64(1);
        let salt = generate_salt(&mut rng);
        let nonce = generate_nonce(&mut rng);
        assert_ne!(salt, [0u8; SALT_LEN]);
        assert_ne!(nonce, [0u8; NONCE_LEN]);
        assert_ne!(&salt[..NONCE_LEN], &nonce[..]);
    }

    #[test]
    fn test_tampered_ciphertext() {
        let encrypted = encrypt(b"test", b"hello", &params()).unwrap();
        let original = envelope::decode_envelope(&encrypted).unwrap();

        for pos in 0..original.ciphertext.len() {
            let mut tampered = original.clone();
            tampered.ciphertext[pos] ^= 0x01;
            let err = decrypt(b"test", &tampered.encode(), &params()).unwrap_err();
            assert_eq!(
                err.kind,
                Some(ErrorKind::AuthenticationFailed),
                "position {}",
                pos
            );
        }
    }

    #[test]
    fn test_tampered_salt_and_nonce() {
        let encrypted = encrypt(b"test", b"hello", &params()).unwrap();
        let original = envelope::decode_envelope(&encrypted).unwrap();

        let mut tampered = original.clone();
        tampered.salt[0] ^= 0x80;
        let err = decrypt(b"test", &tampered.encode(), &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));

        let mut tampered = original;
        tampered.nonce[11] ^= 0x01;
        let err = decrypt(b"test", &tampered.encode(), &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_truncated_ciphertext() {
        let encrypted = encrypt(b"test", b"hello", &params()).unwrap();
        let mut truncated = envelope::decode_envelope(&encrypted).unwrap();
        truncated.ciphertext.truncate(TAG_LEN - 1);

        let err = decrypt(b"test", &truncated.encode(), &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_wrong_field_sizes() {
        let short_salt = envelope::encode_envelope(&[0u8; 8], &[0u8; NONCE_LEN], &[0u8; 32]);
        let err = decrypt(b"test", &short_salt, &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::MalformedEnvelope));

        let long_nonce = envelope::encode_envelope(&[0u8; SALT_LEN], &[0u8; 16], &[0u8; 32]);
        let err = decrypt(b"test", &long_nonce, &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::MalformedEnvelope));
    }

    #[test]
    fn test_wrong_part_count() {
        let err = decrypt(b"test", "QUJD:REVG", &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::MalformedEnvelope));
    }

    #[test]
    fn test_non_utf8_plaintext() {
        let encrypted = encrypt(b"test", &[0xff, 0xfe], &params()).unwrap();

        assert_eq!(decrypt(b"test", &encrypted, &params()).unwrap(), [0xff, 0xfe]);
        let err = decrypt_to_string(b"test", &encrypted, &params()).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidUtf8));
    }

    #[test]
    fn test_cross_implementation_compatibility() {
        // Produced by an independent PBKDF2-HMAC-SHA256 + AES-256-GCM
        // implementation with 100,000 iterations.
        let salt = [0x42u8; SALT_LEN];
        let nonce = [0x24u8; NONCE_LEN];

        let encrypted =
            encrypt_deterministic(b"test", b"test payload", &salt, &nonce, &params()).unwrap();

        assert_eq!(
            encrypted,
            "QkJCQkJCQkJCQkJCQkJCQg==:JCQkJCQkJCQkJCQk:/jmy3vpnKzgODh7RAftAl59yQ6jHM+33+rbfXg=="
        );

        let decrypted = decrypt(b"test", &encrypted, &params()).unwrap();
        assert_eq!(decrypted, b"test payload");
    }
}

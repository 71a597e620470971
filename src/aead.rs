//! AES-256-GCM authenticated encryption
//!
//! `seal` returns the ciphertext with the 16-byte GCM tag appended; `open`
//! verifies that tag before releasing any plaintext. No associated data is
//! used.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};

/// Length of an AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// Length of a GCM nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
pub const TAG_LEN: usize = 16;

fn cipher_for(key: &[u8], nonce: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_LEN {
        return Err(SaltgcmError::invalid_parameter(format!(
            "key must be {} bytes, got {}",
            KEY_LEN,
            key.len()
        )));
    }
    if nonce.len() != NONCE_LEN {
        return Err(SaltgcmError::invalid_parameter(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            nonce.len()
        )));
    }
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| SaltgcmError::invalid_parameter("key rejected by AES-256-GCM"))
}

/// Encrypt and authenticate `plaintext`.
pub fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key, nonce)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| SaltgcmError::new(ErrorCategory::Internal, "AES-256-GCM encryption failed"))
}

/// Verify and decrypt `sealed` (ciphertext followed by tag).
///
/// Returns the complete plaintext or an [`ErrorKind::AuthenticationFailed`]
/// error; nothing is released when verification fails.
pub fn open(key: &[u8], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key, nonce)?;
    cipher.decrypt(Nonce::from_slice(nonce), sealed).map_err(|_| {
        SaltgcmError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or bad password",
        )
    })
}

//! saltgcm - password-based encryption with PBKDF2 and AES-256-GCM
//!
//! A password and a random salt go through PBKDF2-HMAC-SHA256 to produce a
//! 256-bit key, which encrypts the plaintext under AES-256-GCM with a random
//! nonce. Salt, nonce and ciphertext travel together as one printable
//! envelope string:
//!
//! ```text
//! base64(salt):base64(nonce):base64(ciphertext || tag)
//! ```
//!
//! ```no_run
//! use saltgcm::Params;
//!
//! let params = Params::default();
//! let envelope = saltgcm::encrypt(b"passtest1", b"Secret message", &params)?;
//! let plaintext = saltgcm::decrypt_to_string(b"passtest1", &envelope, &params)?;
//! assert_eq!(plaintext, "Secret message");
//! # Ok::<(), saltgcm::SaltgcmError>(())
//! ```

#![forbid(unsafe_code)]

pub mod aead;
pub mod crypt;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod params;
pub mod passphrase;

pub use crypt::{decrypt, decrypt_to_string, encrypt, encrypt_with_rng};
pub use envelope::{Envelope, decode_envelope, encode_envelope};
pub use error::{ErrorCategory, ErrorKind, Result, SaltgcmError};
pub use kdf::{DerivedKey, Prf, derive_key};
pub use params::Params;

//! Password-based key derivation (PBKDF2)
//!
//! Keys are derived with PBKDF2 over an HMAC pseudorandom function. The
//! derivation is deterministic: the same password, salt, iteration count
//! and key length always produce the same key, which is what allows a
//! decryptor to rebuild the key from the salt stored in the envelope.

use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};

/// Iteration counts below this are considered too cheap to brute-force.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Pseudorandom function driving PBKDF2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Prf {
    #[default]
    HmacSha256,
    HmacSha512,
}

impl Prf {
    /// Canonical algorithm name, as accepted by [`Prf::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            Prf::HmacSha256 => "PBKDF2WithHmacSHA256",
            Prf::HmacSha512 => "PBKDF2WithHmacSHA512",
        }
    }
}

impl fmt::Display for Prf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Prf {
    type Err = SaltgcmError;

    fn from_str(s: &str) -> Result<Self> {
        const SHA256_NAMES: [&str; 2] = ["PBKDF2WithHmacSHA256", "hmac-sha256"];
        const SHA512_NAMES: [&str; 2] = ["PBKDF2WithHmacSHA512", "hmac-sha512"];

        if SHA256_NAMES.iter().any(|n| n.eq_ignore_ascii_case(s)) {
            Ok(Prf::HmacSha256)
        } else if SHA512_NAMES.iter().any(|n| n.eq_ignore_ascii_case(s)) {
            Ok(Prf::HmacSha512)
        } else {
            Err(SaltgcmError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnsupportedAlgorithm,
                format!("unsupported key derivation algorithm: {}", s),
            ))
        }
    }
}

/// Symmetric key produced by [`derive_key`].
///
/// The bytes are wiped when the key is dropped and never shown by `Debug`.
pub struct DerivedKey(Zeroizing<Vec<u8>>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED; {}])", self.0.len())
    }
}

/// Derive a `key_bits`-bit key from a password and salt.
///
/// Fails with [`ErrorKind::InvalidParameter`] when `key_bits` is not a
/// positive multiple of 8, when `salt` is empty, or when `iterations` is
/// zero. Counts below [`MIN_ITERATIONS`] are accepted but logged.
pub fn derive_key(
    prf: Prf,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_bits: u32,
) -> Result<DerivedKey> {
    if key_bits == 0 || key_bits % 8 != 0 {
        return Err(SaltgcmError::invalid_parameter(format!(
            "key length must be a positive multiple of 8 bits, got {}",
            key_bits
        )));
    }
    if salt.is_empty() {
        return Err(SaltgcmError::invalid_parameter("salt must not be empty"));
    }
    if iterations == 0 {
        return Err(SaltgcmError::invalid_parameter(
            "iteration count must be positive",
        ));
    }
    if iterations < MIN_ITERATIONS {
        tracing::warn!(
            iterations,
            minimum = MIN_ITERATIONS,
            "weak PBKDF2 iteration count"
        );
    }

    tracing::trace!(%prf, iterations, key_bits, salt_len = salt.len(), "deriving key");

    let mut key = Zeroizing::new(vec![0u8; (key_bits / 8) as usize]);
    match prf {
        Prf::HmacSha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut_slice()),
        Prf::HmacSha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, key.as_mut_slice()),
    }

    Ok(DerivedKey(key))
}

//! Pipeline parameters

use crate::error::{Result, SaltgcmError};
use crate::kdf::{MIN_ITERATIONS, Prf};

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Length of the derived AES key in bits
pub const KEY_BITS: u32 = 256;

/// Key derivation settings used for both encryption and decryption.
///
/// Envelopes do not record these; decrypting needs the same values that
/// were used to encrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    prf: Prf,
    iterations: u32,
}

impl Params {
    /// Fails with `InvalidParameter` if `iterations` is below [`MIN_ITERATIONS`].
    pub fn new(prf: Prf, iterations: u32) -> Result<Self> {
        if iterations < MIN_ITERATIONS {
            return Err(SaltgcmError::invalid_parameter(format!(
                "iteration count {} is below the minimum of {}",
                iterations, MIN_ITERATIONS
            )));
        }
        Ok(Self { prf, iterations })
    }

    pub fn prf(&self) -> Prf {
        self.prf
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn key_bits(&self) -> u32 {
        KEY_BITS
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            prf: Prf::HmacSha256,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

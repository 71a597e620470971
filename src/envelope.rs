//! Transport encoding for encrypted payloads
//!
//! An envelope carries the three values needed to decrypt: the KDF salt,
//! the GCM nonce, and the ciphertext with its tag. The text form is:
//!
//! `base64(salt):base64(nonce):base64(ciphertext)`
//!
//! Standard base64 (with padding) never produces `:`, so the delimiter
//! cannot collide with field contents. The result is a single printable
//! line, safe for text files, environment variables and JSON strings.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};

/// Field delimiter
const DELIMITER: char = ':';

/// Number of delimited fields
const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(salt: Vec<u8>, nonce: Vec<u8>, ciphertext: Vec<u8>) -> Self {
        Self {
            salt,
            nonce,
            ciphertext,
        }
    }

    /// Render the envelope as its transport string.
    pub fn encode(&self) -> String {
        encode_envelope(&self.salt, &self.nonce, &self.ciphertext)
    }

    /// Parse a transport string. Equivalent to [`decode_envelope`].
    pub fn decode(encoded: &str) -> Result<Self> {
        decode_envelope(encoded)
    }
}

/// Join salt, nonce and ciphertext into a transport string.
pub fn encode_envelope(salt: &[u8], nonce: &[u8], ciphertext: &[u8]) -> String {
    format!(
        "{}{}{}{}{}",
        STANDARD.encode(salt),
        DELIMITER,
        STANDARD.encode(nonce),
        DELIMITER,
        STANDARD.encode(ciphertext)
    )
}

/// Split a transport string back into salt, nonce and ciphertext.
///
/// Field lengths are not checked here; this is framing only.
pub fn decode_envelope(encoded: &str) -> Result<Envelope> {
    let parts: Vec<&str> = encoded.split(DELIMITER).collect();
    if parts.len() != FIELD_COUNT {
        return Err(SaltgcmError::malformed_envelope(format!(
            "expected {} '{}'-separated fields, found {}",
            FIELD_COUNT,
            DELIMITER,
            parts.len()
        )));
    }

    let salt = decode_field("salt", parts[0])?;
    let nonce = decode_field("nonce", parts[1])?;
    let ciphertext = decode_field("ciphertext", parts[2])?;

    Ok(Envelope::new(salt, nonce, ciphertext))
}

fn decode_field(name: &str, field: &str) -> Result<Vec<u8>> {
    STANDARD.decode(field).map_err(|e| {
        SaltgcmError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedEnvelope,
            format!("base64 decoding of {} failed: {}", name, e),
            e,
        )
    })
}

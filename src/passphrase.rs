//! Password sources for the command-line tool

use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};
use std::io::{self, IsTerminal, Read};
use zeroize::Zeroizing;

const PROMPT: &str = "Password (saltgcm): ";
const CONFIRM_PROMPT: &str = "Confirm password (saltgcm): ";

/// Something that can hand out the password for an operation.
pub trait PassphraseReader {
    /// Read a password as arbitrary bytes (not necessarily UTF-8).
    ///
    /// The result is wrapped in `Zeroizing` so it is wiped from memory when
    /// dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed password (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.passphrase.to_vec()))
    }
}

/// Reads the whole of an `io::Read` source as the password.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
    trim_newline: bool,
}

impl ReaderPassphraseReader {
    /// Every byte read, including any trailing newline, is part of the password.
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self {
            reader,
            trim_newline: false,
        }
    }

    /// Like `new`, but a single trailing `\n` or `\r\n` is dropped, so that
    /// `echo secret | saltgcm ...` behaves as expected.
    pub fn trimming_newline(reader: Box<dyn Read>) -> Self {
        Self {
            reader,
            trim_newline: true,
        }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            SaltgcmError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading password: {}", e),
                e,
            )
        })?;
        if self.trim_newline && data.last() == Some(&b'\n') {
            data.pop();
            if data.last() == Some(&b'\r') {
                data.pop();
            }
        }
        Ok(data)
    }
}

/// Prompts on the terminal and reads the password with echo disabled.
#[derive(Default)]
pub struct TerminalPassphraseReader {
    confirm: bool,
}

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask twice and fail if the two entries differ. Used when encrypting,
    /// where a typo would make the output undecryptable.
    pub fn with_confirmation() -> Self {
        Self { confirm: true }
    }

    fn prompt(prompt: &str) -> Result<Zeroizing<Vec<u8>>> {
        // rpassword hands back a String (UTF-8 only); use --passphrase-stdin
        // for arbitrary bytes.
        let passphrase = rpassword::prompt_password(prompt).map_err(|e| {
            SaltgcmError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading password: {}", e),
                e,
            )
        })?;
        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(SaltgcmError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read password from terminal - stdin is not a terminal",
            ));
        }

        let passphrase = Self::prompt(PROMPT)?;
        if self.confirm {
            let again = Self::prompt(CONFIRM_PROMPT)?;
            if *again != *passphrase {
                return Err(SaltgcmError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::PassphraseUnavailable,
                    "passwords do not match",
                ));
            }
        }
        Ok(passphrase)
    }
}

/// Wraps another reader and asks it at most once.
///
/// Failures are not cached: the next call asks upstream again. The cached
/// password is wiped when this reader is dropped.
pub struct CachingPassphraseReader {
    upstream: Box<dyn PassphraseReader>,
    cached: Option<Zeroizing<Vec<u8>>>,
}

impl CachingPassphraseReader {
    pub fn new(upstream: Box<dyn PassphraseReader>) -> Self {
        Self {
            upstream,
            cached: None,
        }
    }
}

impl PassphraseReader for CachingPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if let Some(cached) = &self.cached {
            return Ok(Zeroizing::new(cached.to_vec()));
        }
        let passphrase = self.upstream.read_passphrase()?;
        let copy = Zeroizing::new(passphrase.to_vec());
        self.cached = Some(passphrase);
        Ok(copy)
    }
}

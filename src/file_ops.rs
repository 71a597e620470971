//! Whole-file encryption, decryption and in-place update
//!
//! Encrypted files hold a single envelope line. Outputs are created with mode
//! 0o600 on Unix, since they contain either the secret or its ciphertext.

use crate::crypt;
use crate::error::{ErrorCategory, ErrorKind, Result, SaltgcmError};
use crate::params::Params;
use crate::passphrase::PassphraseReader;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Encrypt `input_path` into an envelope file at `output_path`.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &Params,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let envelope = crypt::encrypt(&passphrase, &plaintext, params)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(output_path, envelope.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "encrypted file"
    );
    Ok(())
}

/// Decrypt the envelope file at `input_path` into `output_path`.
///
/// Trailing whitespace after the envelope (such as a final newline) is ignored.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &Params,
) -> Result<()> {
    let envelope = read_envelope(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = crypt::decrypt(&passphrase, &envelope, params)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        "decrypted file"
    );
    Ok(())
}

/// Replace the envelope at `crypt_path` with a fresh encryption of `plain_path`.
///
/// The existing file is decrypted first, so a mistyped password cannot
/// silently change the password protecting the file. The replacement is
/// atomic (tempfile + fsync + rename): either the old or the new envelope
/// exists afterwards, never a partial one.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &Params,
) -> Result<()> {
    let envelope = read_envelope(crypt_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;

    crypt::decrypt(&passphrase, &envelope, params)
        .map_err(|e| e.with_context("failed to decrypt"))?;

    let crypt_dir = match crypt_path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => {
            return Err(SaltgcmError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                "crypt_path has no parent directory",
            ));
        }
    };
    let new_plaintext = fs::read(plain_path).map_err(|e| read_error(plain_path, e))?;
    let new_envelope = crypt::encrypt(&passphrase, &new_plaintext, params)
        .map_err(|e| e.with_context("failed to encrypt"))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(crypt_dir)
        .map_err(|e| io_error("failed to create tempfile", e))?;
    temp_file
        .write_all(new_envelope.as_bytes())
        .map_err(|e| io_error("failed to write to tempfile", e))?;
    temp_file
        .flush()
        .map_err(|e| io_error("failed to flush tempfile", e))?;
    // The rename below must only ever expose a fully written file.
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error("failed to set tempfile permissions", e))?;
    }
    temp_file.persist(crypt_path).map_err(|e| {
        io_error(
            format!("failed to rename to target file {}", crypt_path.display()),
            e.error,
        )
    })?;

    tracing::info!(
        input = %plain_path.display(),
        output = %crypt_path.display(),
        "updated encrypted file"
    );
    Ok(())
}

fn read_envelope(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        SaltgcmError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedEnvelope,
            format!("{} is not valid UTF-8", path.display()),
            e,
        )
    })?;
    Ok(text.trim_end().to_owned())
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    let opened = {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    };

    #[cfg(not(unix))]
    let opened = fs::File::create(path);

    let mut file = opened.map_err(|e| open_error(path, e))?;
    file.write_all(contents)
        .map_err(|e| io_error(format!("failed to write {}", path.display()), e))
}

fn io_error(msg: impl Into<String>, err: io::Error) -> SaltgcmError {
    SaltgcmError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn open_error(path: &Path, err: io::Error) -> SaltgcmError {
    SaltgcmError::with_kind_and_source(
        ErrorCategory::User,
        ErrorKind::Io,
        format!("failed to open {}", path.display()),
        err,
    )
}

fn read_error(path: &Path, err: io::Error) -> SaltgcmError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    SaltgcmError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

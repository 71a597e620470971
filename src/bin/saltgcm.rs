//! saltgcm CLI - password-based file encryption
//!
//! Encrypts files into `salt:nonce:ciphertext` envelopes using
//! PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error as _;
use std::path::PathBuf;
use std::process;
use tracing::Level;

use saltgcm::file_ops;
use saltgcm::params::DEFAULT_ITERATIONS;
use saltgcm::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use saltgcm::{Params, Prf, SaltgcmError};

#[derive(Parser)]
#[command(name = "saltgcm")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal (a single trailing
    /// newline is ignored)
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// PBKDF2 iteration count; decryption must use the same value
    #[arg(long, global = true, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// PBKDF2 pseudorandom function (PBKDF2WithHmacSHA256 or PBKDF2WithHmacSHA512)
    #[arg(long, global = true, default_value_t = Prf::HmacSha256)]
    prf: Prf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the envelope to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the envelope file to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the plaintext to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Update an encrypted file with new content, while validating
    /// that the password is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing envelope file to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> saltgcm::Result<()> {
    let params = Params::new(cli.prf, cli.iterations)?;

    match cli.command {
        Commands::Encrypt { input, output } => {
            let mut reader = passphrase_reader(cli.passphrase_stdin, true);
            file_ops::encrypt_file(&input, &output, &mut *reader, &params)
        }
        Commands::Decrypt { input, output } => {
            let mut reader = passphrase_reader(cli.passphrase_stdin, false);
            file_ops::decrypt_file(&input, &output, &mut *reader, &params)
        }
        Commands::Update { input, output } => {
            let mut reader = passphrase_reader(cli.passphrase_stdin, false);
            file_ops::update_file(&input, &output, &mut *reader, &params)
        }
    }
}

fn passphrase_reader(use_stdin: bool, confirm: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::trimming_newline(Box::new(
            std::io::stdin(),
        )))
    } else if confirm {
        Box::new(TerminalPassphraseReader::with_confirmation())
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Render an error and its sources as `outer: inner: ...`.
fn error_chain(err: &SaltgcmError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        source = inner.source();
    }
    rendered
}

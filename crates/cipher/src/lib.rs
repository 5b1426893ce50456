//! Streaming AES-CBC encryption for IronBox uploads.
//!
//! Files are encrypted with the session key and IV handed out by the
//! IronBox key exchange: AES (128, 192 or 256-bit key) in CBC mode with
//! PKCS#7 padding applied once, at the true end of the stream.

mod block;
mod stream;

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

pub use stream::StreamCipher;

/// Cipher block size in bytes. IVs must be exactly this long.
pub const BLOCK_SIZE: usize = 16;

/// Accepted key lengths in bytes (AES-128, AES-192, AES-256).
pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Default read granularity in bytes.
pub const DEFAULT_READ_SIZE: usize = 1024;

/// Errors produced by the cipher crate.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    #[error("invalid IV length: {0} bytes (expected {BLOCK_SIZE})")]
    InvalidIvLength(usize),

    #[error("ciphertext length {0} is not a positive multiple of {BLOCK_SIZE}")]
    TruncatedCiphertext(u64),

    #[error("invalid padding")]
    InvalidPadding,
}

/// Ciphertext length produced for `plaintext_len` bytes of input.
pub fn padded_len(plaintext_len: u64) -> u64 {
    (plaintext_len / BLOCK_SIZE as u64 + 1) * BLOCK_SIZE as u64
}

/// Encrypts everything `reader` yields into `writer`.
///
/// Returns the number of ciphertext bytes written.
pub fn encrypt<R: Read, W: Write>(reader: R, writer: W, key: &[u8], iv: &[u8]) -> Result<u64, CipherError> {
    StreamCipher::new(key, iv)?.encrypt(reader, writer)
}

/// Decrypts everything `reader` yields into `writer`.
///
/// Returns the number of plaintext bytes written.
pub fn decrypt<R: Read, W: Write>(reader: R, writer: W, key: &[u8], iv: &[u8]) -> Result<u64, CipherError> {
    StreamCipher::new(key, iv)?.decrypt(reader, writer)
}

/// Encrypts the file at `input` into a new file at `output`.
pub fn encrypt_file(input: &Path, output: &Path, key: &[u8], iv: &[u8]) -> Result<u64, CipherError> {
    let cipher = StreamCipher::new(key, iv)?;
    let reader = File::open(input)?;
    let writer = BufWriter::new(File::create(output)?);
    cipher.encrypt(reader, writer)
}

/// Decrypts the file at `input` into a new file at `output`.
pub fn decrypt_file(input: &Path, output: &Path, key: &[u8], iv: &[u8]) -> Result<u64, CipherError> {
    let cipher = StreamCipher::new(key, iv)?;
    let reader = File::open(input)?;
    let writer = BufWriter::new(File::create(output)?);
    cipher.decrypt(reader, writer)
}

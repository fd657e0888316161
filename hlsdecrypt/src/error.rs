use thiserror::Error;

/// The error type returned by decrypt operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid key size: expected 16, 24 or 32 bytes, got {0} bytes")]
    InvalidKeySize(usize),

    #[error("invalid iv size: expected at least 16 bytes, got {0} bytes")]
    InvalidIvSize(usize),

    #[error("invalid data size: {0} bytes is not a non-zero multiple of the block size")]
    InvalidDataSize(usize),

    #[error("invalid padding length {padding} for {len} bytes of decrypted data")]
    InvalidPadding { padding: usize, len: usize },
}

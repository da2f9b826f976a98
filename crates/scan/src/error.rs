use thiserror::Error;

/// Errors produced while scanning or materializing buffered bytes.
///
/// Every fallible operation in this crate takes an error factory, so callers can map
/// failures straight onto their own protocol error. `ScanError` is the ready-made choice
/// when no such mapping is needed.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("token too long, scanned {scanned} bytes exceed the limit {max_len}")]
    TooLong { scanned: usize, max_len: usize },

    #[error("invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    #[error("invalid digit: {digit:#04x}")]
    InvalidDigit { digit: u8 },

    #[error("illegal reserved value")]
    IllegalValue,

    #[error("buffer allocation error: {source}")]
    Alloc {
        #[from]
        source: AllocError,
    },
}

impl ScanError {
    pub fn too_long(scanned: usize, max_len: usize) -> Self {
        Self::TooLong { scanned, max_len }
    }

    pub fn invalid_encoding<S: ToString>(str: S) -> Self {
        Self::InvalidEncoding { reason: str.to_string() }
    }

    pub fn invalid_digit(digit: u8) -> Self {
        Self::InvalidDigit { digit }
    }

    pub fn illegal_value() -> Self {
        Self::IllegalValue
    }
}

/// Failure of the raw buffer allocator behind a [`BufferPool`](crate::buffer::BufferPool).
#[derive(Error, Debug)]
pub enum AllocError {
    #[error("allocator exhausted: {reason}")]
    Exhausted { reason: String },

    #[error("invalid buffer capacity {capacity}")]
    InvalidCapacity { capacity: usize },
}

impl AllocError {
    pub fn exhausted<S: ToString>(str: S) -> Self {
        Self::Exhausted { reason: str.to_string() }
    }

    pub fn invalid_capacity(capacity: usize) -> Self {
        Self::InvalidCapacity { capacity }
    }
}

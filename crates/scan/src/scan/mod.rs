//! Delimiter search and the resumable scanner built on it.
//!
//! # Components
//!
//! - [`ScanTarget`]: a delimiter byte prepared for word-at-a-time search
//! - [`Scanner`]: cuts a [`BufferChain`](crate::buffer::BufferChain) into tokens and
//!   fixed-width values

mod scanner;
mod target;

pub use scanner::DEFAULT_MAX_TOKEN_BYTES;
pub use scanner::Scanner;
pub use target::ScanTarget;

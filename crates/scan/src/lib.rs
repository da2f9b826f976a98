//! Zero-copy buffer scanning for the micro http server
//!
//! This crate is the byte level layer under the http/1.1 request parser. Bytes read from
//! a connection land in fixed-capacity pooled buffers; the scanner finds delimiters and
//! fixed-width fields across buffer boundaries and hands out views of the bytes it found.
//! Nothing is copied until a caller asks for a materialized value such as a string or an
//! integer.
//!
//! # Features
//!
//! - Two tier buffer pool: a lock free per-thread free list backed by a shared one
//! - Buffer chains that grow as more bytes arrive
//! - Delimiter search eight bytes at a time
//! - Resumable scans: an incomplete token returns `None` and the next call only looks
//!   at bytes that arrived since
//! - In-place trim, dequote and percent-decoding of scanned tokens
//! - Decimal and hexadecimal parsing without building a string
//!
//! # Example
//!
//! ```
//! use micro_scan::buffer::{BufferPool, PoolConfig};
//! use micro_scan::error::ScanError;
//! use micro_scan::scan::{ScanTarget, Scanner, DEFAULT_MAX_TOKEN_BYTES};
//!
//! let pool = BufferPool::new(PoolConfig::builder().buffer_capacity(8).build());
//! let mut local = pool.local();
//! let mut scanner = Scanner::new();
//!
//! // the request line arrives in two reads
//! scanner.feed(&mut local, b"GET /hello%20wo").unwrap();
//! let too_long = |scanned| ScanError::too_long(scanned, DEFAULT_MAX_TOKEN_BYTES);
//!
//! let method = scanner.scan_to_target(&ScanTarget::SPACE, DEFAULT_MAX_TOKEN_BYTES, too_long).unwrap();
//! assert_eq!(method.unwrap().as_char_view().method(), Some(http::Method::GET));
//!
//! let path = scanner.scan_to_target(&ScanTarget::SPACE, DEFAULT_MAX_TOKEN_BYTES, too_long).unwrap();
//! assert!(path.is_none());
//!
//! scanner.feed(&mut local, b"rld HTTP/1.1\r\n").unwrap();
//! let mut path = scanner.scan_to_target(&ScanTarget::SPACE, DEFAULT_MAX_TOKEN_BYTES, too_long).unwrap().unwrap();
//! path.decode_uri(|| ScanError::invalid_encoding("bad escape")).unwrap();
//! assert_eq!(path, "/hello world");
//!
//! // hand the buffers the scanner moved past back to the pool
//! scanner.release_drained(&mut local);
//! ```
//!
//! # Architecture
//!
//! - [`buffer`]: pooled buffers, the two tier pool and the buffer chain
//! - [`scan`]: the delimiter search and the resumable [`Scanner`](scan::Scanner)
//! - [`view`]: [`ByteView`](view::ByteView) and its transforms
//! - [`error`]: [`ScanError`](error::ScanError) and [`AllocError`](error::AllocError)
//!
//! # Threading
//!
//! A chain, its scanner and the views it produced belong to one connection and are used
//! by one thread at a time. The only state shared between threads is the shared free
//! list of a [`BufferPool`](buffer::BufferPool), guarded by a mutex.
//!
//! # Errors
//!
//! Scanning operations take an error factory instead of returning a fixed error type, so
//! a protocol layer can build its own error right where the failure is detected.
//! [`ScanError`](error::ScanError) provides constructors that fit those factories.

pub mod buffer;
pub mod error;
pub mod scan;
pub mod view;

mod utils;
pub(crate) use utils::ensure;

#![allow(dead_code, reason = "each test binary uses a different part of the helpers")]
//! Shared integration test helpers.

use std::sync::Once;

use micro_scan::buffer::{BufferPool, LocalBufferPool, PoolConfig};
use micro_scan::error::ScanError;
use micro_scan::scan::{DEFAULT_MAX_TOKEN_BYTES, ScanTarget, Scanner};
use micro_scan::view::ByteView;
use proptest::prelude::ProptestConfig;

static INIT_LOGGING: Once = Once::new();

pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

pub fn proptest_config(cases: u32) -> ProptestConfig {
    ProptestConfig::with_cases(cases)
}

pub fn pool(buffer_capacity: usize) -> BufferPool {
    BufferPool::new(PoolConfig::builder().buffer_capacity(buffer_capacity).build())
}

/// Splits `input` into consecutive chunks, cycling through `sizes`.
pub fn chunks<'a>(input: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut out = vec![];
    let mut rest = input;
    let mut sizes = sizes.iter().copied().filter(|&s| s > 0).cycle();
    while !rest.is_empty() {
        let size = sizes.next().unwrap_or(rest.len()).min(rest.len());
        let (head, tail) = rest.split_at(size);
        out.push(head);
        rest = tail;
    }
    out
}

/// Plays the network side: delivers the next chunk whenever a scan runs dry.
#[derive(Debug)]
pub struct Feeder<'a> {
    chunks: std::vec::IntoIter<&'a [u8]>,
    pub local: LocalBufferPool,
    pub scanner: Scanner,
}

impl<'a> Feeder<'a> {
    pub fn new(pool: &BufferPool, chunks: Vec<&'a [u8]>) -> Self {
        Self { chunks: chunks.into_iter(), local: pool.local(), scanner: Scanner::new() }
    }

    /// Scans for `target`, feeding chunks until the delimiter shows up.
    pub fn scan(&mut self, target: &ScanTarget) -> ByteView {
        loop {
            let view = self
                .scanner
                .scan_to_target(target, DEFAULT_MAX_TOKEN_BYTES, |scanned| ScanError::too_long(scanned, DEFAULT_MAX_TOKEN_BYTES))
                .unwrap();
            if let Some(view) = view {
                return view;
            }
            self.feed_next();
        }
    }

    pub fn feed_next(&mut self) {
        let chunk = self.chunks.next().expect("input ended before the delimiter");
        self.scanner.feed(&mut self.local, chunk).unwrap();
    }

    pub fn is_exhausted(&self) -> bool {
        self.chunks.len() == 0
    }
}

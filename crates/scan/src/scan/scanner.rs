use tracing::debug;

use super::target::ScanTarget;
use crate::buffer::{Buffer, BufferChain, LocalBufferPool};
use crate::error::AllocError;
use crate::view::ByteView;

/// Default bound for a single scanned token, the same as the maximum http header size.
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 8 * 1024;

/// A cursor over a [`BufferChain`] that cuts the byte stream into tokens.
///
/// The token being recognized always starts at the first readable byte of the chain.
/// A delimiter search remembers how far it got, so calling it again after more bytes
/// arrived only looks at the new bytes:
///
/// ```text
///  previous buffers (fully searched)       current buffer
/// [ ........ ] [ ........ ]  [ ...... ^scan_offset ...... ]
///  ^token start
/// ```
///
/// The saved position belongs to one delimiter; searching for another starts over at
/// the token start.
///
/// Every scanning operation returns `None` when the buffered bytes are not enough yet.
/// The caller appends more buffers and retries the same call; nothing is consumed by a
/// call returning `None`.
#[derive(Debug, Default)]
pub struct Scanner {
    chain: BufferChain,
    /// index of the buffer holding the scan position
    scan_index: usize,
    /// offset of the scan position inside that buffer
    scan_offset: usize,
    /// readable bytes of the buffers before `scan_index`
    previous_len: usize,
    /// delimiter the saved position was searched for
    scan_value: Option<u8>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `buffer` the new current buffer.
    ///
    /// More bytes for the current buffer are written through [`current_mut`](Self::current_mut)
    /// or [`feed`](Self::feed) instead.
    pub fn append(&mut self, buffer: Buffer) {
        self.chain.push(buffer);
    }

    /// The buffer the network side is currently filling.
    pub fn current_mut(&mut self) -> Option<&mut Buffer> {
        self.chain.tail_mut()
    }

    /// Writes `data` into the chain, acquiring buffers from `pool` as the current one fills up.
    ///
    /// # Errors
    ///
    /// Propagates allocation failures of the pool unchanged.
    pub fn feed(&mut self, pool: &mut LocalBufferPool, data: &[u8]) -> Result<(), AllocError> {
        self.chain.write_all(pool, data)
    }

    pub fn chain(&self) -> &BufferChain {
        &self.chain
    }

    /// Number of bytes buffered past the cursor.
    pub fn buffered(&self) -> usize {
        self.chain.readable()
    }

    /// Hands the buffers the scanner has moved past back to `pool`.
    ///
    /// Bytes of those buffers referenced by live views stay valid; such buffers are
    /// dropped by the pool instead of being reused.
    pub fn release_drained(&mut self, pool: &mut LocalBufferPool) {
        self.chain.release_drained(pool);
    }

    /// Forgets all buffered bytes, moving every buffer aside for release.
    pub fn reset(&mut self) {
        self.chain.clear();
        self.reset_cursor();
    }

    /// Scans forward for `target`.
    ///
    /// Returns the bytes from the cursor up to, not including, the delimiter, and moves the
    /// cursor past the delimiter. The delimiter is never part of the returned view.
    ///
    /// A token of exactly `max_len` bytes is accepted.
    ///
    /// # Errors
    ///
    /// Returns the error built by `too_long` from the token length when the delimiter is
    /// found more than `max_len` bytes away, or from the searched length when no delimiter
    /// is buffered and the bytes searched so far reach `max_len`.
    pub fn scan_to_target<E, F>(
        &mut self,
        target: &ScanTarget,
        max_len: usize,
        too_long: F,
    ) -> Result<Option<ByteView>, E>
    where
        F: FnOnce(usize) -> E,
    {
        if self.scan_value != Some(target.value()) {
            self.reset_cursor();
            self.scan_value = Some(target.value());
        }

        while let Some(buffer) = self.chain.get(self.scan_index) {
            let data = buffer.chunk();
            if let Some(position) = target.find(&data[self.scan_offset..]) {
                let len = self.previous_len + self.scan_offset + position;
                if len > max_len {
                    debug!(len, max_len, delimiter = target.value(), "token too long");
                    return Err(too_long(len));
                }
                let view = self.take(len);
                self.discard(1);
                return Ok(Some(view));
            }

            self.scan_offset = data.len();
            if self.scan_index + 1 == self.chain.len() {
                break;
            }
            self.previous_len += data.len();
            self.scan_index += 1;
            self.scan_offset = 0;
        }

        let scanned = self.previous_len + self.scan_offset;
        if scanned >= max_len {
            debug!(scanned, max_len, delimiter = target.value(), "token too long");
            return Err(too_long(scanned));
        }
        Ok(None)
    }

    /// Takes the next `n` bytes as a view, or `None` if fewer are buffered.
    pub fn scan_bytes(&mut self, n: usize) -> Option<ByteView> {
        if self.chain.readable() < n {
            return None;
        }
        Some(self.take(n))
    }

    /// Returns the distance from the cursor to the next `target`, without moving the cursor.
    pub fn peek_to_target(&self, target: &ScanTarget) -> Option<usize> {
        let mut offset = 0;
        for buffer in self.chain.iter() {
            if let Some(position) = target.find(buffer.chunk()) {
                return Some(offset + position);
            }
            offset += buffer.len();
        }
        None
    }

    /// Moves the cursor forward by up to `n` bytes without producing a view.
    ///
    /// Returns how many bytes were skipped. Buffers left fully behind are set aside for
    /// [`release_drained`](Self::release_drained); the scanner never releases them itself.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.chain.readable());
        self.discard(n);
        n
    }

    pub fn build_u8(&mut self) -> Option<u8> {
        self.build_array::<1>().map(u8::from_be_bytes)
    }

    pub fn build_u16(&mut self) -> Option<u16> {
        self.build_array::<2>().map(u16::from_be_bytes)
    }

    pub fn build_u32(&mut self) -> Option<u32> {
        self.build_array::<4>().map(u32::from_be_bytes)
    }

    pub fn build_u64(&mut self) -> Option<u64> {
        self.build_array::<8>().map(u64::from_be_bytes)
    }

    /// Reads a signed byte, rejecting the reserved all-ones value.
    ///
    /// # Errors
    ///
    /// Returns `illegal()` when the byte read is `-1`; the byte is consumed either way.
    pub fn build_byte<E>(&mut self, illegal: impl FnOnce() -> E) -> Result<Option<i8>, E> {
        reject_reserved(self.build_array::<1>().map(i8::from_be_bytes), -1, illegal)
    }

    /// Reads a big-endian `i16`, rejecting the reserved all-ones value.
    ///
    /// # Errors
    ///
    /// Returns `illegal()` when the value read is `-1`.
    pub fn build_short<E>(&mut self, illegal: impl FnOnce() -> E) -> Result<Option<i16>, E> {
        reject_reserved(self.build_array::<2>().map(i16::from_be_bytes), -1, illegal)
    }

    /// Reads a big-endian `i32`, rejecting the reserved all-ones value.
    ///
    /// # Errors
    ///
    /// Returns `illegal()` when the value read is `-1`.
    pub fn build_int<E>(&mut self, illegal: impl FnOnce() -> E) -> Result<Option<i32>, E> {
        reject_reserved(self.build_array::<4>().map(i32::from_be_bytes), -1, illegal)
    }

    /// Reads a big-endian `i64`, rejecting the reserved all-ones value.
    ///
    /// # Errors
    ///
    /// Returns `illegal()` when the value read is `-1`.
    pub fn build_long<E>(&mut self, illegal: impl FnOnce() -> E) -> Result<Option<i64>, E> {
        reject_reserved(self.build_array::<8>().map(i64::from_be_bytes), -1, illegal)
    }

    /// Reads `N` bytes, straight from the first buffer when it holds all of them, otherwise
    /// byte by byte across the buffer boundaries.
    ///
    /// Nothing is consumed until all `N` bytes are buffered, so any scan may follow a call
    /// that returned `None`.
    fn build_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.chain.readable() < N {
            return None;
        }

        let mut value = [0u8; N];
        match self.chain.get(0) {
            Some(front) if front.len() >= N => value.copy_from_slice(&front.chunk()[..N]),
            _ => {
                let bytes = self.chain.iter().flat_map(|buffer| buffer.chunk().iter().copied());
                for (slot, byte) in value.iter_mut().zip(bytes) {
                    *slot = byte;
                }
            }
        }

        self.discard(N);
        Some(value)
    }

    /// Splits the first `len` readable bytes off the chain into a view.
    fn take(&mut self, len: usize) -> ByteView {
        let mut view = ByteView::new();
        let mut rest = len;
        for buffer in self.chain.iter_mut() {
            if rest == 0 {
                break;
            }
            let n = rest.min(buffer.len());
            view.push_segment(buffer.split_to(n));
            rest -= n;
        }
        debug_assert_eq!(rest, 0);

        self.after_consume();
        view
    }

    /// Drops the first `len` readable bytes of the chain.
    fn discard(&mut self, len: usize) {
        let mut rest = len;
        for buffer in self.chain.iter_mut() {
            if rest == 0 {
                break;
            }
            let n = rest.min(buffer.len());
            buffer.advance(n);
            rest -= n;
        }
        debug_assert_eq!(rest, 0);

        self.after_consume();
    }

    fn after_consume(&mut self) {
        self.chain.retire_consumed();
        self.reset_cursor();
    }

    fn reset_cursor(&mut self) {
        self.scan_index = 0;
        self.scan_offset = 0;
        self.previous_len = 0;
        self.scan_value = None;
    }
}

fn reject_reserved<T: PartialEq, E>(value: Option<T>, reserved: T, illegal: impl FnOnce() -> E) -> Result<Option<T>, E> {
    match value {
        Some(v) if v == reserved => Err(illegal()),
        v => Ok(v),
    }
}

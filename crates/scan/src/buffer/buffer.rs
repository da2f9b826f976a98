use std::fmt;

use bytes::{Buf, BytesMut};

use crate::error::AllocError;

/// The raw allocation backend behind a [`BufferPool`](super::BufferPool).
///
/// The pool only calls the allocator when both free lists are empty; an allocation
/// failure is handed back to the caller of `acquire` unchanged.
pub trait BufferAllocator: Send + Sync {
    /// Allocates an empty `BytesMut` able to hold at least `capacity` bytes.
    fn allocate(&self, capacity: usize) -> Result<BytesMut, AllocError>;
}

/// Allocates buffers from the global heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, capacity: usize) -> Result<BytesMut, AllocError> {
        if capacity == 0 {
            return Err(AllocError::invalid_capacity(capacity));
        }
        Ok(BytesMut::with_capacity(capacity))
    }
}

/// A fixed-capacity byte buffer.
///
/// Bytes are written at the write position until the capacity is reached; writes never
/// grow the buffer. The readable region is whatever has been written and not yet split
/// off into a view or skipped.
///
/// ```text
/// 0          consumed           written            capacity
/// |--- gone ---|--- readable ---|--- remaining ---|
/// ```
pub struct Buffer {
    bytes: BytesMut,
    capacity: usize,
    written: usize,
    consumed: usize,
}

impl Buffer {
    pub(crate) fn new(bytes: BytesMut, capacity: usize) -> Self {
        debug_assert!(bytes.is_empty());
        debug_assert!(bytes.capacity() >= capacity);
        Self { bytes, capacity, written: 0, consumed: 0 }
    }

    /// Returns the fixed capacity of this buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the write position, the number of bytes written since the buffer was acquired.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Returns the number of readable bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns how many more bytes can be written.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.written
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.written == self.capacity
    }

    /// Returns the readable bytes.
    #[inline]
    pub fn chunk(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes a single byte, returning `false` if the buffer is full.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.bytes.extend_from_slice(&[byte]);
        self.written += 1;
        true
    }

    /// Writes as much of `src` as fits and returns the number of bytes accepted.
    ///
    /// A short count means the buffer is now full and the rest of `src` belongs in the
    /// next buffer of the chain.
    pub fn write(&mut self, src: &[u8]) -> usize {
        let accepted = src.len().min(self.remaining());
        self.bytes.extend_from_slice(&src[..accepted]);
        self.written += accepted;
        accepted
    }

    /// Returns the buffer to the pool it came from.
    pub fn release(self, pool: &mut super::LocalBufferPool) {
        pool.release(self);
    }

    /// A buffer is drained once nothing is readable and nothing more can be written.
    #[inline]
    pub(crate) fn is_drained(&self) -> bool {
        self.is_empty() && self.is_full()
    }

    /// Splits the first `at` readable bytes off into their own handle.
    ///
    /// The returned handle shares the allocation with this buffer, no bytes are copied.
    pub(crate) fn split_to(&mut self, at: usize) -> BytesMut {
        self.consumed += at;
        self.bytes.split_to(at)
    }

    pub(crate) fn advance(&mut self, cnt: usize) {
        self.consumed += cnt;
        self.bytes.advance(cnt);
    }

    /// Rewinds the buffer for reuse.
    ///
    /// Returns `None` when bytes split off this buffer are still alive somewhere, in
    /// which case the allocation can't be reclaimed and the buffer must be dropped.
    pub(crate) fn recycle(mut self) -> Option<Self> {
        self.bytes.clear();
        if !self.bytes.try_reclaim(self.capacity) {
            return None;
        }
        self.written = 0;
        self.consumed = 0;
        Some(self)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.capacity)
            .field("written", &self.written)
            .field("consumed", &self.consumed)
            .finish()
    }
}

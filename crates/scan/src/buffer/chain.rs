use std::collections::VecDeque;

use tracing::trace;

use super::buffer::Buffer;
use super::pool::LocalBufferPool;
use crate::error::AllocError;

/// The buffers holding one connection's not yet consumed bytes, oldest first.
///
/// The network side writes into the last buffer; the scanner consumes from the first.
/// Buffers at the front that have been fully consumed are moved aside as drained and
/// stay there until the owner hands them back to a pool with
/// [`release_drained`](BufferChain::release_drained).
#[derive(Debug, Default)]
pub struct BufferChain {
    buffers: VecDeque<Buffer>,
    drained: Vec<Buffer>,
}

impl BufferChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links a new buffer at the end of the chain.
    pub fn push(&mut self, buffer: Buffer) {
        self.buffers.push_back(buffer);
    }

    /// Writes all of `data`, acquiring and linking new buffers whenever the last one fills up.
    ///
    /// # Errors
    ///
    /// Propagates allocator failures from the pool; bytes written before the failure stay
    /// in the chain.
    pub fn write_all(&mut self, pool: &mut LocalBufferPool, mut data: &[u8]) -> Result<(), AllocError> {
        while !data.is_empty() {
            if self.buffers.back().is_none_or(Buffer::is_full) {
                self.buffers.push_back(pool.acquire()?);
            }
            if let Some(tail) = self.buffers.back_mut() {
                let accepted = tail.write(data);
                data = &data[accepted..];
            }
        }
        Ok(())
    }

    /// Number of linked buffers, the drained ones excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Total readable bytes across the chain.
    pub fn readable(&self) -> usize {
        self.buffers.iter().map(Buffer::len).sum()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Buffer> {
        self.buffers.get(index)
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut Buffer> {
        self.buffers.front_mut()
    }

    /// The buffer currently being written by the network side.
    #[inline]
    pub fn tail_mut(&mut self) -> Option<&mut Buffer> {
        self.buffers.back_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Buffer> {
        self.buffers.iter_mut()
    }

    /// Number of drained buffers waiting to be released.
    pub fn drained_len(&self) -> usize {
        self.drained.len()
    }

    /// Takes the drained buffers out of the chain.
    pub fn drain(&mut self) -> impl Iterator<Item = Buffer> + '_ {
        self.drained.drain(..)
    }

    /// Hands every drained buffer back to `pool`.
    pub fn release_drained(&mut self, pool: &mut LocalBufferPool) {
        for buffer in self.drained.drain(..) {
            pool.release(buffer);
        }
    }

    /// Moves every buffer, drained or not, aside for release.
    pub fn clear(&mut self) {
        self.drained.extend(self.buffers.drain(..));
    }

    /// Moves fully consumed buffers from the front of the chain aside.
    ///
    /// An empty buffer is retired once it is full, or once a later buffer exists, since
    /// the network side only ever writes into the last one.
    pub(crate) fn retire_consumed(&mut self) {
        while let Some(front) = self.buffers.front() {
            let is_tail = self.buffers.len() == 1;
            if !(front.is_drained() || (front.is_empty() && !is_tail)) {
                break;
            }
            if let Some(buffer) = self.buffers.pop_front() {
                trace!(written = buffer.written(), "buffer drained");
                self.drained.push(buffer);
            }
        }
    }
}

//! Two-tier buffer pool.
//!
//! Buffers are cached in two places:
//!
//! - a [`LocalBufferPool`] owned by one worker thread, touched without any locking
//! - the shared free list inside [`BufferPool`], guarded by a mutex and used as the
//!   fallback for every local pool created from it
//!
//! Nothing is allocated up front. A buffer is created by the [`BufferAllocator`] only
//! when both tiers are empty, and dropped only when both tiers are at their caps.
//!
//! # Thread teardown
//!
//! Dropping a [`LocalBufferPool`] (typically because the thread owning it ended) moves
//! its cached buffers into the shared list, bounded by the shared cap, so buffers are
//! not pinned to a dead thread. [`LocalBufferPool::flush`] runs the same hook on demand.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};
use triomphe::Arc;

use super::buffer::{Buffer, BufferAllocator, HeapAllocator};
use crate::error::AllocError;

/// Default capacity of a single buffer, matches the read capacity of an http connection.
const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default number of buffers a single thread keeps cached.
const DEFAULT_LOCAL_CAP: usize = 16;

/// Default number of buffers kept in the shared free list.
const DEFAULT_SHARED_CAP: usize = 256;

/// Sizing of a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    buffer_capacity: usize,
    local_cap: usize,
    shared_cap: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { buffer_capacity: DEFAULT_BUFFER_CAPACITY, local_cap: DEFAULT_LOCAL_CAP, shared_cap: DEFAULT_SHARED_CAP }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn local_cap(&self) -> usize {
        self.local_cap
    }

    pub fn shared_cap(&self) -> usize {
        self.shared_cap
    }
}

#[derive(Debug)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    fn new() -> Self {
        Self { config: PoolConfig::default() }
    }

    pub fn buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.config.buffer_capacity = buffer_capacity;
        self
    }

    pub fn local_cap(mut self, local_cap: usize) -> Self {
        self.config.local_cap = local_cap;
        self
    }

    pub fn shared_cap(mut self, shared_cap: usize) -> Self {
        self.config.shared_cap = shared_cap;
        self
    }

    pub fn build(self) -> PoolConfig {
        self.config
    }
}

struct Shared {
    config: PoolConfig,
    allocator: Box<dyn BufferAllocator>,
    free: Mutex<Vec<Buffer>>,
    allocated: AtomicUsize,
}

impl Shared {
    fn pop(&self) -> Option<Buffer> {
        self.free.lock().pop()
    }

    /// Pushes into the shared list, handing the buffer back if the list is full.
    fn push(&self, buffer: Buffer) -> Result<(), Buffer> {
        let mut free = self.free.lock();
        if free.len() >= self.config.shared_cap {
            return Err(buffer);
        }
        free.push(buffer);
        Ok(())
    }

    fn allocate(&self) -> Result<Buffer, AllocError> {
        let capacity = self.config.buffer_capacity;
        let bytes = self.allocator.allocate(capacity)?;
        let total = self.allocated.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(capacity, total, "allocated new buffer");
        Ok(Buffer::new(bytes, capacity))
    }
}

/// The process-wide side of the pool.
///
/// `BufferPool` is cheap to clone; every clone shares the same free list. Worker threads
/// call [`BufferPool::local`] once and acquire/release through the returned
/// [`LocalBufferPool`].
#[derive(Clone)]
pub struct BufferPool {
    shared: Arc<Shared>,
}

impl BufferPool {
    /// Creates a pool backed by the heap allocator.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_allocator(config, HeapAllocator)
    }

    /// Creates a pool backed by a custom allocator.
    pub fn with_allocator<A: BufferAllocator + 'static>(config: PoolConfig, allocator: A) -> Self {
        let shared = Shared {
            config,
            allocator: Box::new(allocator),
            free: Mutex::new(Vec::with_capacity(config.shared_cap)),
            allocated: AtomicUsize::new(0),
        };
        Self { shared: Arc::new(shared) }
    }

    /// Creates the thread-local tier of this pool.
    pub fn local(&self) -> LocalBufferPool {
        LocalBufferPool { free: Vec::with_capacity(self.shared.config.local_cap), shared: Arc::clone(&self.shared) }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Number of buffers currently cached in the shared free list.
    pub fn shared_len(&self) -> usize {
        self.shared.free.lock().len()
    }

    /// Number of buffers created by the allocator over the lifetime of the pool.
    pub fn allocated(&self) -> usize {
        self.shared.allocated.load(Ordering::Relaxed)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.shared.config)
            .field("shared_len", &self.shared_len())
            .field("allocated", &self.allocated())
            .finish()
    }
}

/// The per-thread tier of a [`BufferPool`].
///
/// Acquiring and releasing through a local pool never takes a lock while its own list
/// can satisfy the request. A `LocalBufferPool` is meant to stay on the thread that
/// created it; dropping it flushes the cached buffers into the shared list.
pub struct LocalBufferPool {
    free: Vec<Buffer>,
    shared: Arc<Shared>,
}

impl LocalBufferPool {
    /// Returns an empty buffer ready to be written.
    ///
    /// # Errors
    ///
    /// Fails only when both tiers are empty and the allocator fails.
    pub fn acquire(&mut self) -> Result<Buffer, AllocError> {
        if let Some(buffer) = self.free.pop() {
            return Ok(buffer);
        }

        if let Some(buffer) = self.shared.pop() {
            trace!("acquired buffer from shared pool");
            return Ok(buffer);
        }

        self.shared.allocate()
    }

    /// Returns a drained buffer for reuse.
    ///
    /// The buffer is dropped instead when both tiers are full, when it was created with
    /// a different capacity, or when bytes split off it are still referenced by a view.
    pub fn release(&mut self, buffer: Buffer) {
        if buffer.capacity() != self.shared.config.buffer_capacity {
            debug!(capacity = buffer.capacity(), "dropped buffer of foreign capacity");
            return;
        }

        let Some(buffer) = buffer.recycle() else {
            trace!("dropped buffer still referenced by a view");
            return;
        };

        if self.free.len() < self.shared.config.local_cap {
            self.free.push(buffer);
            return;
        }

        if self.shared.push(buffer).is_err() {
            trace!("dropped buffer, both pools are full");
        }
    }

    /// Moves every cached buffer into the shared list; buffers over the shared cap are dropped.
    ///
    /// This is the thread teardown hook, it also runs when the local pool is dropped.
    pub fn flush(&mut self) {
        if self.free.is_empty() {
            return;
        }

        let cached = self.free.len();
        let mut shared = self.shared.free.lock();
        let room = self.shared.config.shared_cap.saturating_sub(shared.len());
        let moved = room.min(cached);
        shared.extend(self.free.drain(..moved));
        drop(shared);

        self.free.clear();
        debug!(moved, dropped = cached - moved, "flushed local buffer pool");
    }

    /// Number of buffers cached by this local pool.
    pub fn cached(&self) -> usize {
        self.free.len()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }
}

impl Drop for LocalBufferPool {
    fn drop(&mut self) {
        self.flush();
    }
}

impl std::fmt::Debug for LocalBufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBufferPool").field("cached", &self.free.len()).finish()
    }
}

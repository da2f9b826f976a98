//! Pooled fixed-capacity buffers and the chain the scanner reads from.
//!
//! # Components
//!
//! - [`Buffer`]: a fixed-capacity byte buffer with a write position
//! - [`BufferAllocator`]: the raw allocation backend used when the pool is empty
//! - [`BufferPool`] / [`LocalBufferPool`]: the shared and per-thread free lists
//! - [`BufferChain`]: the ordered buffers of one connection's byte stream
//!
//! # Ownership
//!
//! A [`Buffer`] is owned by exactly one place at a time: a chain, a local pool or the
//! shared pool. Moving it between them is a move in the Rust sense, so no buffer can
//! be referenced from two containers.
//!
//! Bytes handed out to views are split off the buffer's allocation. The allocation is
//! reference counted, which keeps those bytes valid even after the buffer itself has
//! been released; such a buffer just can't be recycled until every view is gone.

mod buffer;
mod chain;
mod pool;

pub use buffer::Buffer;
pub use buffer::BufferAllocator;
pub use buffer::HeapAllocator;
pub use chain::BufferChain;
pub use pool::BufferPool;
pub use pool::LocalBufferPool;
pub use pool::PoolConfig;
pub use pool::PoolConfigBuilder;

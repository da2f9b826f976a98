//! Retention bounds of the two tier pool under arbitrary acquire/release traffic.

mod common;

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use bytes::BytesMut;
use common::proptest_config;
use micro_scan::buffer::{BufferAllocator, BufferPool, PoolConfig};
use micro_scan::error::AllocError;
use proptest::prelude::*;

#[derive(Debug, Default, Clone)]
struct CountingAllocator {
    calls: Arc<AtomicUsize>,
}

impl BufferAllocator for CountingAllocator {
    fn allocate(&self, capacity: usize) -> Result<BytesMut, AllocError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(BytesMut::with_capacity(capacity))
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Acquire,
    Release,
    Flush,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![4 => Just(Op::Acquire), 4 => Just(Op::Release), 1 => Just(Op::Flush)]
}

proptest! {
    #![proptest_config(proptest_config(128))]

    #[test]
    fn retained_never_exceeds_caps(
        local_cap in 0usize..8,
        shared_cap in 0usize..8,
        ops in prop::collection::vec(arb_op(), 0..128),
    ) {
        let config = PoolConfig::builder().buffer_capacity(16).local_cap(local_cap).shared_cap(shared_cap).build();
        let pool = BufferPool::new(config);
        let mut local = pool.local();
        let mut held = vec![];

        for op in ops {
            match op {
                Op::Acquire => held.push(local.acquire().unwrap()),
                Op::Release => {
                    if let Some(buffer) = held.pop() {
                        local.release(buffer);
                    }
                }
                Op::Flush => local.flush(),
            }
            prop_assert!(local.cached() <= local_cap);
            prop_assert!(pool.shared_len() <= shared_cap);
        }

        for buffer in held {
            local.release(buffer);
        }
        prop_assert!(local.cached() + pool.shared_len() <= local_cap + shared_cap);
    }

    #[test]
    fn cached_buffers_skip_the_allocator(count in 1usize..24, local_cap in 0usize..12, shared_cap in 0usize..12) {
        let allocator = CountingAllocator::default();
        let config = PoolConfig::builder().buffer_capacity(32).local_cap(local_cap).shared_cap(shared_cap).build();
        let pool = BufferPool::with_allocator(config, allocator.clone());
        let mut local = pool.local();

        let buffers = (0..count).map(|_| local.acquire().unwrap()).collect::<Vec<_>>();
        for buffer in buffers {
            local.release(buffer);
        }
        let cached = local.cached() + pool.shared_len();
        prop_assert_eq!(cached, count.min(local_cap + shared_cap));

        let before = allocator.calls.load(Ordering::Relaxed);
        let again = (0..cached).map(|_| local.acquire().unwrap()).collect::<Vec<_>>();
        prop_assert_eq!(allocator.calls.load(Ordering::Relaxed), before);
        drop(again);
    }
}

#[test]
fn threads_return_buffers_on_exit() {
    let config = PoolConfig::builder().buffer_capacity(64).local_cap(4).shared_cap(6).build();
    let pool = BufferPool::new(config);
    let barrier = Arc::new(Barrier::new(4));

    let handles = (0..4)
        .map(|_| {
            let pool = pool.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut local = pool.local();
                let buffers = (0..3).map(|_| local.acquire().unwrap()).collect::<Vec<_>>();
                barrier.wait();
                for buffer in buffers {
                    local.release(buffer);
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap();
    }

    // twelve buffers were cached at thread exit, the shared list keeps at most six
    assert_eq!(pool.shared_len(), 6);
}

//! Fixed-size block pool for short-lived sample buffers
//!
//! Blocks are handed out as [`PooledBlock`] guards and go back on the free
//! list when the guard is dropped. The pool grows when it runs dry, so
//! acquiring never fails; after warm-up no further allocation happens.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_INITIAL_BLOCKS: usize = 16;

struct PoolInner {
    free: Vec<Vec<f32>>,
    total: usize,
}

/// Shared handle to a pool of equally sized `f32` blocks
#[derive(Clone)]
pub struct BlockPool {
    block_len: usize,
    inner: Arc<Mutex<PoolInner>>,
}

impl BlockPool {
    /// Create a pool with `initial_blocks` preallocated blocks of `block_len` samples
    pub fn new(block_len: usize, initial_blocks: usize) -> Self {
        let free = (0..initial_blocks).map(|_| vec![0.0; block_len]).collect();
        Self {
            block_len,
            inner: Arc::new(Mutex::new(PoolInner {
                free,
                total: initial_blocks,
            })),
        }
    }

    /// Take a zeroed block, allocating a new one if none is free
    pub fn acquire(&self) -> PooledBlock {
        let recycled = self.lock().free.pop();
        let data = match recycled {
            Some(mut block) => {
                block.fill(0.0);
                block
            }
            None => {
                let mut inner = self.lock();
                inner.total += 1;
                log::debug!("Block pool grown to {} blocks of {} samples", inner.total, self.block_len);
                vec![0.0; self.block_len]
            }
        };

        PooledBlock {
            data,
            pool: Arc::clone(&self.inner),
        }
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Blocks ever allocated by this pool
    pub fn total_blocks(&self) -> usize {
        self.lock().total
    }

    /// Blocks currently on the free list
    pub fn available_blocks(&self) -> usize {
        self.lock().free.len()
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // The free list stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for BlockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockPool")
            .field("block_len", &self.block_len)
            .field("total_blocks", &self.total_blocks())
            .field("available_blocks", &self.available_blocks())
            .finish()
    }
}

/// A block on loan from a [`BlockPool`]
pub struct PooledBlock {
    data: Vec<f32>,
    pool: Arc<Mutex<PoolInner>>,
}

impl Deref for PooledBlock {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for PooledBlock {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl std::fmt::Debug for PooledBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl Drop for PooledBlock {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        let mut inner = self.pool.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.free.push(data);
    }
}

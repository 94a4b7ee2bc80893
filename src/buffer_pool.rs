//! Buffer pool shared by the stream adapter: a thread-safe pool of
//! fixed-capacity byte buffers, returned on task completion.

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock};

use crossbeam_queue::ArrayQueue;

const POOL_CAPACITY: usize = 128;
/// Minimum capacity handed out; buffers that shrink below this on return
/// are dropped rather than recycled.
pub const MIN_BUFFER_CAPACITY: usize = 8 * 1024;

/// Global buffer pool shared by all packet-ingest reads.
pub static GLOBAL_BUFFER_POOL: LazyLock<Arc<BufferPool>> =
    LazyLock::new(|| Arc::new(BufferPool::default()));

/// A pooled `Vec<u8>` that returns itself to the pool on drop.
pub struct PooledBuffer {
    pool: Arc<BufferPool>,
    inner: ManuallyDrop<Vec<u8>>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // SAFETY: inner is never accessed after this
        let buffer = unsafe { ManuallyDrop::take(&mut self.inner) };
        self.pool.return_buffer(buffer);
    }
}

/// Pool of reusable read buffers, each at least [`MIN_BUFFER_CAPACITY`].
#[derive(Debug)]
pub struct BufferPool {
    buffers: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self { buffers: ArrayQueue::new(capacity) }
    }

    /// Take an empty buffer with at least [`MIN_BUFFER_CAPACITY`] reserved,
    /// or allocate a fresh one.
    pub fn get_buffer(self: &Arc<Self>) -> PooledBuffer {
        let mut buffer = self.buffers.pop().unwrap_or_default();
        if buffer.capacity() < MIN_BUFFER_CAPACITY {
            buffer.reserve(MIN_BUFFER_CAPACITY - buffer.capacity());
        }
        PooledBuffer { pool: Arc::clone(self), inner: ManuallyDrop::new(buffer) }
    }

    fn return_buffer(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let _ignored = self.buffers.push(buffer);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(POOL_CAPACITY)
    }
}

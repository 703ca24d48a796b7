//! Bounded pool of reusable transfer buffers.
//!
//! Each fetch takes one buffer for the duration of the backend read and
//! returns it on drop. Returned buffers are truncated to zero length, so a
//! later acquirer never sees a previous payload as data.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;

use crate::config::CredentialsConfig;

/// Pool of idle buffers shared by all calls on one service instance.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    state: Mutex<PoolState>,
    capacity: usize,
    buffer_size: usize,
    max_retained_size: usize,
}

struct PoolState {
    idle: Vec<BytesMut>,
    closed: bool,
}

impl PoolInner {
    // The state is a plain Vec and flag; a panic elsewhere cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, mut buf: BytesMut) {
        buf.clear();
        if buf.capacity() > self.max_retained_size {
            return;
        }

        let mut state = self.lock();
        if !state.closed && state.idle.len() < self.capacity {
            state.idle.push(buf);
        }
    }
}

impl BufferPool {
    /// Create a pool retaining at most `capacity` idle buffers.
    pub fn new(capacity: usize, buffer_size: usize, max_retained_size: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    idle: Vec::with_capacity(capacity),
                    closed: false,
                }),
                capacity,
                buffer_size,
                max_retained_size,
            }),
        }
    }

    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self::new(
            config.pool_capacity,
            config.buffer_size,
            config.max_retained_size,
        )
    }

    /// Take a buffer out of the pool, allocating one if none is idle.
    ///
    /// The returned buffer is always empty.
    pub fn acquire(&self) -> PooledBuffer {
        let reused = self.inner.lock().idle.pop();
        let buf = reused.unwrap_or_else(|| BytesMut::with_capacity(self.inner.buffer_size));

        PooledBuffer {
            buf,
            pool: self.inner.clone(),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle_count(&self) -> usize {
        self.inner.lock().idle.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// True once [`drain`](Self::drain) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Drop all idle buffers and close the pool.
    ///
    /// Buffers still checked out are freed when released instead of being
    /// retained. Acquiring after drain still works but never reuses.
    /// Returns the number of buffers dropped.
    pub fn drain(&self) -> usize {
        let mut state = self.inner.lock();
        state.closed = true;
        let drained = state.idle.len();
        state.idle.clear();
        drained
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("BufferPool")
            .field("idle", &state.idle.len())
            .field("capacity", &self.inner.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}

/// A buffer checked out of a [`BufferPool`]. Returned to the pool on drop.
pub struct PooledBuffer {
    buf: BytesMut,
    pool: Arc<PoolInner>,
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

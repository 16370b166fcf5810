//! Reusable staging buffers for request bodies.
//!
//! # Responsibilities
//! - Hand out empty `BytesMut` buffers, allocating only when the pool is dry
//! - Take buffers back exactly once per acquisition
//! - Count acquisitions and releases so leaks are observable
//!
//! # Design Decisions
//! - Ownership is carried by [`PooledBuffer`]; release happens on `release()`
//!   or on drop, whichever comes first, so every code path returns the buffer
//! - A buffer lent to an outbound body is reclaimed only if nothing else still
//!   references its storage; otherwise it is counted as released and dropped
//! - Buffers grown by a large body, and buffers beyond `max_idle`, are freed
//!   on return instead of being kept on the free list

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

/// Returned buffers whose capacity exceeds this multiple of the initial
/// capacity are freed rather than recycled.
const MAX_GROWTH: usize = 16;

/// A thread-safe pool of byte buffers.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
    buffer_capacity: usize,
    max_retained_capacity: usize,
    max_idle: usize,
    acquired: AtomicU64,
    released: AtomicU64,
    recycled: AtomicU64,
}

impl BufferPool {
    /// Create an empty pool. New buffers start with `buffer_capacity` bytes
    /// reserved; at most `max_idle` returned buffers are kept for reuse.
    pub fn new(buffer_capacity: usize, max_idle: usize) -> Arc<Self> {
        Arc::new(Self {
            free: Mutex::new(Vec::new()),
            buffer_capacity,
            max_retained_capacity: buffer_capacity.max(1).saturating_mul(MAX_GROWTH),
            max_idle,
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            recycled: AtomicU64::new(0),
        })
    }

    /// Check out an empty buffer.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self.free.lock().pop();
        let mut buf = reused.unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity));
        buf.clear();
        self.acquired.fetch_add(1, Ordering::Relaxed);

        PooledBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    fn put_back(&self, buf: Option<BytesMut>) {
        self.released.fetch_add(1, Ordering::Relaxed);

        let Some(mut buf) = buf else { return };
        if buf.capacity() > self.max_retained_capacity {
            tracing::trace!(capacity = buf.capacity(), "Freeing oversized buffer");
            return;
        }

        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            buf.clear();
            free.push(buf);
            self.recycled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total buffers handed out.
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    /// Total buffers returned (recycled, freed or forfeited).
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Buffers returned with their storage intact and put back on the free list.
    pub fn recycled(&self) -> u64 {
        self.recycled.load(Ordering::Relaxed)
    }

    /// Buffers currently checked out.
    pub fn outstanding(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }

    /// Buffers sitting on the free list.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/// Exclusive ownership of one pooled buffer.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Give the buffer back to its pool.
    pub fn release(self) {
        drop(self);
    }

    /// Append a chunk of body data.
    pub fn extend_from_slice(&mut self, chunk: &[u8]) {
        self.buf.get_or_insert_with(BytesMut::new).extend_from_slice(chunk);
    }

    /// Lend the contents out as immutable `Bytes`.
    ///
    /// The guard is left empty until [`restore`](Self::restore) hands the
    /// storage back.
    pub fn freeze(&mut self) -> Bytes {
        self.buf.take().unwrap_or_default().freeze()
    }

    /// Reclaim storage previously lent by [`freeze`](Self::freeze).
    ///
    /// Returns false when other handles still share the storage, in which
    /// case it is left to them and will not be recycled.
    pub fn restore(&mut self, bytes: Bytes) -> bool {
        match bytes.try_into_mut() {
            Ok(buf) => {
                self.buf = Some(buf);
                true
            }
            Err(_) => false,
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.put_back(self.buf.take());
    }
}

//! Reusable fixed-capacity write buffers.
//!
//! A [`Buffer`] is moved between owners (pool, producer, queue, writer) and is
//! never shared, so exclusive access follows from ownership alone. The pool is
//! a lock-free free-list; acquiring never blocks and never fails, falling back
//! to a fresh allocation when the free-list is empty. The in-flight ceiling is
//! enforced by the queue capacity, not here.

use crate::utils::constants::{FIELD_SEPARATOR, LINE_TERMINATOR};
use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed-capacity byte region plus the length of its populated prefix
#[derive(Debug)]
pub struct Buffer {
    data: Box<[u8]>,
    len: usize,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Valid length: bytes `[0, len)` are populated
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append `name;value\n`, or leave the buffer untouched and return
    /// `false` when the line does not fit.
    pub fn append_line(&mut self, name: &[u8], value: &[u8]) -> bool {
        let line_len = name.len() + value.len() + 2;
        if line_len > self.remaining() {
            return false;
        }

        let mut pos = self.len;
        self.data[pos..pos + name.len()].copy_from_slice(name);
        pos += name.len();
        self.data[pos] = FIELD_SEPARATOR;
        pos += 1;
        self.data[pos..pos + value.len()].copy_from_slice(value);
        pos += value.len();
        self.data[pos] = LINE_TERMINATOR;
        self.len = pos + 1;
        true
    }
}

/// Shared pool of [`Buffer`]s of one capacity
#[derive(Debug)]
pub struct BufferPool {
    free: SegQueue<Buffer>,
    buffer_capacity: usize,
    allocated: AtomicUsize,
    reused: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            free: SegQueue::new(),
            buffer_capacity,
            allocated: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
        }
    }

    /// Take an empty buffer, recycling an idle one when available
    pub fn acquire(&self) -> Buffer {
        match self.free.pop() {
            Some(mut buffer) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                buffer.clear();
                buffer
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Buffer::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Return a buffer for reuse. Buffers of a foreign capacity are dropped.
    pub fn release(&self, mut buffer: Buffer) {
        if buffer.capacity() != self.buffer_capacity {
            tracing::trace!(
                "Dropping buffer of capacity {} (pool capacity {})",
                buffer.capacity(),
                self.buffer_capacity
            );
            return;
        }
        buffer.clear();
        self.free.push(buffer);
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Buffers created over the pool's lifetime
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Acquisitions served from the free-list
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::Relaxed)
    }

    /// Buffers currently sitting in the free-list
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}

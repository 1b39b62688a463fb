//! Scoped allocation for transient per-call buffers.

use std::cell::{Cell, RefCell};

use bytes::BytesMut;

use crate::config::BucketConfig;

/// Default size of the blocks a scope carves allocations from.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// An allocation scope passed by reference into every bucket operation.
///
/// Allocations are carved from a shared block, so many small buffers cost a
/// single heap allocation. Dropping the scope releases its block in bulk;
/// allocations still held by the caller keep their chunk alive, never the
/// whole scope.
///
/// Buckets must not keep scratch allocations past the call that received the
/// scope. Data a bucket returns in a `Span` lives in storage the bucket owns.
///
/// # Example
///
/// ```
/// use sluice_bucket::Scratch;
///
/// let scratch = Scratch::new();
/// let buf = scratch.alloc(16);
/// assert_eq!(buf.len(), 16);
///
/// let nested = scratch.scope();
/// assert_eq!(nested.depth(), 1);
/// ```
#[derive(Debug)]
pub struct Scratch {
    block: RefCell<BytesMut>,
    block_size: usize,
    allocated: Cell<usize>,
    depth: usize,
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

impl Scratch {
    /// Creates a root scope with the default block size.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates a root scope with the specified block size.
    pub fn with_block_size(block_size: usize) -> Self {
        Scratch {
            block: RefCell::new(BytesMut::new()),
            block_size: block_size.max(1),
            allocated: Cell::new(0),
            depth: 0,
        }
    }

    /// Creates a root scope sized by `config`.
    pub fn with_config(config: &BucketConfig) -> Self {
        Self::with_block_size(config.scratch_block_size)
    }

    /// Opens a nested scope. Its allocations are released when it drops,
    /// independent of the parent.
    pub fn scope(&self) -> Scratch {
        Scratch {
            block: RefCell::new(BytesMut::new()),
            block_size: self.block_size,
            allocated: Cell::new(0),
            depth: self.depth + 1,
        }
    }

    /// Allocates `len` zeroed bytes.
    pub fn alloc(&self, len: usize) -> BytesMut {
        let mut block = self.block.borrow_mut();
        if block.len() < len {
            let size = len.max(self.block_size);
            let mut fresh = BytesMut::with_capacity(size);
            fresh.resize(size, 0);
            *block = fresh;
        }
        self.allocated.set(self.allocated.get() + len);
        block.split_to(len)
    }

    /// Allocates an empty buffer with room for `capacity` bytes.
    ///
    /// Growing past `capacity` moves the buffer to its own allocation.
    pub fn buffer(&self, capacity: usize) -> BytesMut {
        let mut buf = self.alloc(capacity);
        buf.clear();
        buf
    }

    /// Copies `data` into a fresh allocation.
    pub fn copy_from(&self, data: &[u8]) -> BytesMut {
        let mut buf = self.buffer(data.len());
        buf.extend_from_slice(data);
        buf
    }

    /// Returns the total number of bytes handed out by this scope.
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }

    /// Returns the nesting depth; root scopes are at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the block size used for new blocks.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

//! Allocator trait and implementations behind `Save` and `Free`
//!
//! The engine defines only the stack contract of the two opcodes: `Save`
//! consumes a size and produces a handle, `Free` consumes a handle. Where the
//! memory comes from is decided by the host through the [`Allocator`] trait.

use crate::error::{Result, VmError};
use std::collections::BTreeMap;

/// Allocation backend used by the `Save` and `Free` opcodes
///
/// # Example Implementation
///
/// ```rust
/// use flvm_program_runtime::{heap::Allocator, Result, VmError};
///
/// /// Hands out offsets into a fixed scratch area, never reclaiming them
/// struct BumpAllocator {
///     next: u64,
///     end: u64,
/// }
///
/// impl Allocator for BumpAllocator {
///     fn save(&mut self, size: u64) -> Result<u64> {
///         let start = self.next;
///         let end = start
///             .checked_add(size)
///             .filter(|end| *end <= self.end)
///             .ok_or(VmError::AllocationFailure { requested: size })?;
///         self.next = end;
///         Ok(start)
///     }
///
///     fn free(&mut self, _handle: u64) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Allocator {
    /// Reserve a block of `size` bytes and return its handle
    ///
    /// # Errors
    /// [`VmError::AllocationFailure`] if the block cannot be provided.
    fn save(&mut self, size: u64) -> Result<u64>;

    /// Release the block identified by `handle`
    ///
    /// # Errors
    /// [`VmError::InvalidFree`] if the handle is not live.
    fn free(&mut self, handle: u64) -> Result<()>;
}

/// Engine-managed heap of zero-filled blocks
///
/// Handles are opaque, non-zero and never reused, so a stale handle is
/// always detected by `free`. The total size of live blocks is capped by a
/// byte limit.
#[derive(Debug)]
pub struct HandleAllocator {
    blocks: BTreeMap<u64, Vec<u8>>,
    next_handle: u64,
    limit: u64,
    live_bytes: u64,
}

impl HandleAllocator {
    /// Creates an empty heap holding at most `limit` live bytes
    pub fn new(limit: u64) -> Self {
        Self {
            blocks: BTreeMap::new(),
            next_handle: 1,
            limit,
            live_bytes: 0,
        }
    }

    /// Contents of a live block
    pub fn block(&self, handle: u64) -> Option<&[u8]> {
        self.blocks.get(&handle).map(Vec::as_slice)
    }

    /// Mutable contents of a live block
    pub fn block_mut(&mut self, handle: u64) -> Option<&mut [u8]> {
        self.blocks.get_mut(&handle).map(Vec::as_mut_slice)
    }

    /// Number of live blocks
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Total size of live blocks in bytes
    pub fn live_bytes(&self) -> u64 {
        self.live_bytes
    }

    /// Byte limit for live blocks
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Allocator for HandleAllocator {
    fn save(&mut self, size: u64) -> Result<u64> {
        let live_bytes = self
            .live_bytes
            .checked_add(size)
            .filter(|total| *total <= self.limit)
            .ok_or_else(|| {
                log::debug!(
                    "heap limit reached: {} live + {} requested > {}",
                    self.live_bytes,
                    size,
                    self.limit
                );
                VmError::AllocationFailure { requested: size }
            })?;
        let len = usize::try_from(size).map_err(|_| VmError::AllocationFailure { requested: size })?;
        let handle = self.next_handle;
        let next_handle = handle
            .checked_add(1)
            .ok_or(VmError::AllocationFailure { requested: size })?;

        let mut block = Vec::new();
        block
            .try_reserve_exact(len)
            .map_err(|_| VmError::AllocationFailure { requested: size })?;
        block.resize(len, 0);

        self.blocks.insert(handle, block);
        self.next_handle = next_handle;
        self.live_bytes = live_bytes;
        log::trace!("save: {} bytes -> handle {:#x}", size, handle);
        Ok(handle)
    }

    fn free(&mut self, handle: u64) -> Result<()> {
        let block = self
            .blocks
            .remove(&handle)
            .ok_or(VmError::InvalidFree(handle))?;
        self.live_bytes = self.live_bytes.saturating_sub(block.len() as u64);
        log::trace!("free: handle {:#x} ({} bytes)", handle, block.len());
        Ok(())
    }
}

/// A lent allocator, so the host can inspect it once the engine is dropped
impl<A: Allocator + ?Sized> Allocator for &mut A {
    fn save(&mut self, size: u64) -> Result<u64> {
        (**self).save(size)
    }

    fn free(&mut self, handle: u64) -> Result<()> {
        (**self).free(handle)
    }
}

/// Allocator that refuses every request
///
/// Useful for hosts whose programs must not allocate.
pub struct NoAllocator;

impl Allocator for NoAllocator {
    fn save(&mut self, size: u64) -> Result<u64> {
        Err(VmError::AllocationFailure { requested: size })
    }

    fn free(&mut self, handle: u64) -> Result<()> {
        Err(VmError::InvalidFree(handle))
    }
}

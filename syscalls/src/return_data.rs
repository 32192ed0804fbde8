//! Return data syscalls for flvm programs
//!
//! A program hands a result back to its host by calling one of the
//! `set_return_*` syscalls. The host keeps a [`ReturnData`] handle and reads
//! the recorded bytes once `exec` has finished.

use flvm_program_runtime::{Stack, SyscallResult};
use std::{cell::RefCell, rc::Rc};
use thiserror::Error as ThisError;

/// Return data error types
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ReturnDataError {
    /// Return data is too large
    #[error("Return data too large: {0} bytes (max {1})")]
    ReturnDataTooLarge(usize, usize),
}

/// Maximum return data size in bytes
pub const MAX_RETURN_DATA: usize = 1024;

/// Shared slot holding the last value a program returned
///
/// Clones share the same slot, so one clone can be captured by the syscall
/// closures while the host keeps another.
#[derive(Debug, Clone, Default)]
pub struct ReturnData {
    slot: Rc<RefCell<Option<Vec<u8>>>>,
}

impl ReturnData {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes recorded by the last `set_return_*` call, if any
    pub fn get(&self) -> Option<Vec<u8>> {
        self.slot.borrow().clone()
    }

    /// The recorded bytes read as a little-endian `u64`
    ///
    /// Returns `None` unless exactly eight bytes were recorded.
    pub fn as_u64(&self) -> Option<u64> {
        let slot = self.slot.borrow();
        let bytes: [u8; 8] = slot.as_deref()?.try_into().ok()?;
        Some(u64::from_le_bytes(bytes))
    }

    /// Forget any recorded value
    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    /// Record `data`, replacing any earlier value
    pub fn set(&self, data: Vec<u8>) -> Result<(), ReturnDataError> {
        if data.len() > MAX_RETURN_DATA {
            return Err(ReturnDataError::ReturnDataTooLarge(
                data.len(),
                MAX_RETURN_DATA,
            ));
        }
        log::debug!("return data set ({} bytes)", data.len());
        *self.slot.borrow_mut() = Some(data);
        Ok(())
    }

    /// Pop a `u64` and record it
    pub fn set_return_u64(&self, stack: &mut Stack) -> SyscallResult {
        let value = stack.pop_u64()?;
        self.set(value.to_le_bytes().to_vec())?;
        Ok(())
    }

    /// Pop a `u16` length, then that many bytes, and record them
    ///
    /// Bytes are recorded in the order they were pushed.
    pub fn set_return_bytes(&self, stack: &mut Stack) -> SyscallResult {
        let len = usize::from(stack.pop_u16()?);
        if len > MAX_RETURN_DATA {
            return Err(Box::new(ReturnDataError::ReturnDataTooLarge(
                len,
                MAX_RETURN_DATA,
            )));
        }
        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(stack.pop_u8()?);
        }
        data.reverse();
        self.set(data)?;
        Ok(())
    }
}

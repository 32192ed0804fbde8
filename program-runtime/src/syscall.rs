//! Syscall table
//!
//! Maps small integer indices to native host handlers. A handler receives the
//! operand stack for the duration of its call, pops its own arguments and
//! pushes its own results; the argument convention is entirely up to the
//! host. The engine only checks that the index resolves to a handler.

use crate::{
    error::{Result, SyscallError, VmError},
    stack::Stack,
};
use std::{collections::BTreeMap, fmt};

/// Outcome of a syscall handler
pub type SyscallResult = std::result::Result<(), SyscallError>;

/// A native syscall handler
pub type SyscallFn = Box<dyn Fn(&mut Stack) -> SyscallResult>;

/// A registered handler together with its name
pub struct SyscallEntry {
    name: &'static str,
    handler: SyscallFn,
}

impl SyscallEntry {
    /// Name the handler was registered under
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the handler against `stack`
    pub fn call(&self, stack: &mut Stack) -> SyscallResult {
        (self.handler)(stack)
    }
}

impl fmt::Debug for SyscallEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyscallEntry").field("name", &self.name).finish()
    }
}

/// Host-supplied mapping from syscall index to handler
#[derive(Debug, Default)]
pub struct SyscallTable {
    entries: BTreeMap<u8, SyscallEntry>,
}

impl SyscallTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler at `index`
    ///
    /// # Errors
    /// [`VmError::DuplicateSyscall`] if the index is already taken.
    pub fn register<F>(&mut self, index: u8, name: &'static str, handler: F) -> Result<()>
    where
        F: Fn(&mut Stack) -> SyscallResult + 'static,
    {
        if let Some(existing) = self.entries.get(&index) {
            return Err(VmError::DuplicateSyscall {
                index,
                existing: existing.name,
            });
        }

        log::debug!("registered syscall {} as '{}'", index, name);
        self.entries.insert(
            index,
            SyscallEntry {
                name,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    /// Looks up the handler at `index`
    pub fn get(&self, index: u8) -> Option<&SyscallEntry> {
        self.entries.get(&index)
    }

    /// Returns true if a handler is registered at `index`
    pub fn contains(&self, index: u8) -> bool {
        self.entries.contains_key(&index)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handler is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered `(index, name)` pairs in index order
    pub fn names(&self) -> impl Iterator<Item = (u8, &'static str)> + '_ {
        self.entries.iter().map(|(index, entry)| (*index, entry.name))
    }

    /// Dispatches to the handler at `index`
    ///
    /// # Errors
    /// [`VmError::UnmappedSyscall`] if nothing is registered at `index`,
    /// [`VmError::SyscallFailure`] if the handler fails.
    pub fn dispatch(&self, index: u8, stack: &mut Stack) -> Result<()> {
        let entry = self.get(index).ok_or(VmError::UnmappedSyscall(index))?;
        entry.call(stack).map_err(|source| VmError::SyscallFailure {
            index,
            name: entry.name,
            source,
        })
    }
}

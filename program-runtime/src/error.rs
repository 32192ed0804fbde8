//! Error types for the flvm engine

use crate::{encoding::Width, opcode::Opcode};
use thiserror::Error;

/// Result type for flvm operations
pub type Result<T> = std::result::Result<T, VmError>;

/// Error returned by a host syscall handler
///
/// Handlers are free to fail with any error type; the engine wraps it in
/// [`VmError::SyscallFailure`] and keeps it reachable through `source()`.
pub type SyscallError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while creating, loading or executing an engine
#[derive(Debug, Error)]
pub enum VmError {
    /// Memory for the stack, the engine or a heap block could not be obtained
    #[error("Allocation failure: could not obtain {requested} bytes")]
    AllocationFailure {
        /// Number of bytes requested
        requested: u64,
    },

    /// A required input was missing at an API boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A push would exceed the stack capacity
    #[error("Stack overflow: cannot push {width} with {size}/{capacity} bytes in use")]
    StackOverflow {
        /// Width of the rejected push
        width: Width,
        /// Bytes in use when the push was attempted
        size: usize,
        /// Stack capacity in bytes
        capacity: usize,
    },

    /// A pop would read past the bottom of the stack
    #[error("Stack underflow: cannot pop {width} with {size} bytes in use")]
    StackUnderflow {
        /// Width of the rejected pop
        width: Width,
        /// Bytes in use when the pop was attempted
        size: usize,
    },

    /// A pop used a different width than the push that produced the top value
    #[error("Width mismatch: popped {requested} but the top value is {found}")]
    WidthMismatch {
        /// Width asked for by the pop
        requested: Width,
        /// Width recorded when the value was pushed
        found: Width,
    },

    /// The byte at the program counter is not an opcode
    #[error("Invalid opcode {opcode:#04x} at pc {pc}")]
    InvalidOpcode {
        /// The offending byte
        opcode: u8,
        /// Offset of the byte in the code buffer
        pc: usize,
    },

    /// The code buffer ends inside an instruction's immediate operand
    #[error("Truncated immediate for {opcode} at pc {pc}: need {needed} bytes, {available} left")]
    TruncatedImmediate {
        /// The instruction being decoded
        opcode: Opcode,
        /// Offset of the opcode byte
        pc: usize,
        /// Immediate length required by the opcode
        needed: usize,
        /// Bytes remaining after the opcode byte
        available: usize,
    },

    /// A data segment access falls outside the segment
    #[error("Out of bounds data access at {address:#x} ({width}, segment is {len} bytes)")]
    OutOfBounds {
        /// Address popped from the stack
        address: u64,
        /// Width of the access
        width: Width,
        /// Length of the loaded data segment
        len: usize,
    },

    /// No handler is registered at the syscall index
    #[error("Unmapped syscall {0}")]
    UnmappedSyscall(u8),

    /// The registered syscall handler failed
    #[error("Syscall '{name}' ({index}) failed: {source}")]
    SyscallFailure {
        /// Syscall index
        index: u8,
        /// Name the handler was registered under
        name: &'static str,
        /// Error reported by the handler
        #[source]
        source: SyscallError,
    },

    /// `Free` was given a handle that is not live
    #[error("Invalid free of handle {0:#x}")]
    InvalidFree(u64),

    /// The configured instruction budget ran out before the program halted
    #[error("Instruction limit of {0} exceeded")]
    InstructionLimitExceeded(u64),

    /// A syscall index was registered twice
    #[error("Syscall index {index} already registered as '{existing}'")]
    DuplicateSyscall {
        /// Syscall index
        index: u8,
        /// Name of the handler already occupying the index
        existing: &'static str,
    },

    /// A serialized program image could not be encoded or decoded
    #[error("Invalid program image: {0}")]
    InvalidImage(String),
}

impl From<bincode::Error> for VmError {
    fn from(err: bincode::Error) -> Self {
        VmError::InvalidImage(err.to_string())
    }
}

impl VmError {
    /// Returns true for failures raised by the operand stack
    pub fn is_stack_error(&self) -> bool {
        matches!(
            self,
            VmError::StackOverflow { .. }
                | VmError::StackUnderflow { .. }
                | VmError::WidthMismatch { .. }
        )
    }
}

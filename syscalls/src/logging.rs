//! Logging syscalls for flvm programs
//!
//! Each `log_*` syscall pops one value of its width from the stack and
//! writes it to the host log at `info` level. `dump_stack` logs the stack
//! summary without touching it.

use flvm_program_runtime::{Scalar, Stack, SyscallResult};
use std::fmt::Display;

/// Target used for every message emitted by a program
pub const LOG_TARGET: &str = "flvm::program";

fn log_value<T: Scalar + Display>(stack: &mut Stack) -> SyscallResult {
    let value: T = stack.pop()?;
    log::info!(target: LOG_TARGET, "[Program] {}", value);
    Ok(())
}

/// Pop a byte and log it
pub fn log_u8(stack: &mut Stack) -> SyscallResult {
    log_value::<u8>(stack)
}

/// Pop a 16-bit value and log it
pub fn log_u16(stack: &mut Stack) -> SyscallResult {
    log_value::<u16>(stack)
}

/// Pop a 32-bit value and log it
pub fn log_u32(stack: &mut Stack) -> SyscallResult {
    log_value::<u32>(stack)
}

/// Pop a 64-bit value and log it
pub fn log_u64(stack: &mut Stack) -> SyscallResult {
    log_value::<u64>(stack)
}

/// Pop 32 bits and log them as an `f32`
pub fn log_f32(stack: &mut Stack) -> SyscallResult {
    log_value::<f32>(stack)
}

/// Pop 64 bits and log them as an `f64`
pub fn log_f64(stack: &mut Stack) -> SyscallResult {
    log_value::<f64>(stack)
}

/// Log capacity, size and the top bytes of the stack
pub fn dump_stack(stack: &mut Stack) -> SyscallResult {
    log::info!(target: LOG_TARGET, "[Program] {}", stack);
    Ok(())
}

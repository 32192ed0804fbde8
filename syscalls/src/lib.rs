//! flvm Syscalls
//!
//! This crate provides the standard syscall set hosts register with the
//! flvm engine. A program reaches a syscall through `SYSCALL <index>`; the
//! handler pops its own arguments from the operand stack.
//!
//! # Available Syscalls
//!
//! ## Logging
//! - `log_u8` .. `log_u64` - Pop an integer and log it
//! - `log_f32`, `log_f64` - Pop a float and log it
//! - `dump_stack` - Log the stack summary
//!
//! ## Return data
//! - `set_return_u64` - Pop a `u64` and hand it to the host
//! - `set_return_bytes` - Pop a length and that many bytes
//!
//! # Usage
//!
//! ```rust
//! use flvm_program_runtime::SyscallTable;
//! use flvm_syscalls::{register_return_data, register_syscalls, ReturnData};
//!
//! let mut table = SyscallTable::new();
//! register_syscalls(&mut table).unwrap();
//!
//! let ret = ReturnData::new();
//! register_return_data(&mut table, &ret).unwrap();
//! assert!(table.contains(flvm_syscalls::syscall_numbers::SET_RETURN_U64));
//! ```

#![warn(missing_docs)]
#![deny(clippy::arithmetic_side_effects)]

pub mod logging;
pub mod return_data;

pub use return_data::{ReturnData, ReturnDataError, MAX_RETURN_DATA};

use flvm_program_runtime::{SyscallTable, VmError};

/// Register the logging syscalls
///
/// # Errors
/// [`VmError::DuplicateSyscall`] if one of the indices in
/// [`syscall_numbers`] is already taken.
pub fn register_syscalls(table: &mut SyscallTable) -> Result<(), VmError> {
    use syscall_numbers::*;

    table.register(LOG_U8, "log_u8", logging::log_u8)?;
    table.register(LOG_U16, "log_u16", logging::log_u16)?;
    table.register(LOG_U32, "log_u32", logging::log_u32)?;
    table.register(LOG_U64, "log_u64", logging::log_u64)?;
    table.register(LOG_F32, "log_f32", logging::log_f32)?;
    table.register(LOG_F64, "log_f64", logging::log_f64)?;
    table.register(DUMP_STACK, "dump_stack", logging::dump_stack)?;

    Ok(())
}

/// Register the return data syscalls, recording into `ret`
pub fn register_return_data(table: &mut SyscallTable, ret: &ReturnData) -> Result<(), VmError> {
    use syscall_numbers::*;

    let slot = ret.clone();
    table.register(SET_RETURN_U64, "set_return_u64", move |stack| {
        slot.set_return_u64(stack)
    })?;
    let slot = ret.clone();
    table.register(SET_RETURN_BYTES, "set_return_bytes", move |stack| {
        slot.set_return_bytes(stack)
    })?;

    Ok(())
}

/// Syscall indices
///
/// These are the operands programs pass to `SYSCALL`.
pub mod syscall_numbers {
    /// Pop and log a `u8`
    pub const LOG_U8: u8 = 0x00;
    /// Pop and log a `u16`
    pub const LOG_U16: u8 = 0x01;
    /// Pop and log a `u32`
    pub const LOG_U32: u8 = 0x02;
    /// Pop and log a `u64`
    pub const LOG_U64: u8 = 0x03;
    /// Pop and log an `f32`
    pub const LOG_F32: u8 = 0x04;
    /// Pop and log an `f64`
    pub const LOG_F64: u8 = 0x05;
    /// Log the stack summary
    pub const DUMP_STACK: u8 = 0x06;

    /// Pop a `u64` as the return value
    pub const SET_RETURN_U64: u8 = 0x10;
    /// Pop a `u16` length and that many bytes as the return value
    pub const SET_RETURN_BYTES: u8 = 0x11;
}

#[cfg(test)]
mod tests {
    use super::*;
    use flvm_program_runtime::{Config, Engine, HaltReason, Opcode};

    #[test]
    fn test_register_syscalls() {
        let mut table = SyscallTable::new();
        register_syscalls(&mut table).unwrap();

        assert_eq!(table.len(), 7);
        assert_eq!(table.get(syscall_numbers::LOG_F32).unwrap().name(), "log_f32");
    }

    #[test]
    fn test_register_twice_fails() {
        let mut table = SyscallTable::new();
        register_syscalls(&mut table).unwrap();

        assert!(matches!(
            register_syscalls(&mut table),
            Err(VmError::DuplicateSyscall { index: 0, .. })
        ));
    }

    #[test]
    fn test_program_returns_value() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut table = SyscallTable::new();
        register_syscalls(&mut table).unwrap();
        let ret = ReturnData::new();
        register_return_data(&mut table, &ret).unwrap();

        // CONST8 5, SYSCALL log_u8, CONST 99, SYSCALL set_return_u64
        let mut code = vec![Opcode::Const8.byte(), 5, Opcode::Syscall.byte(), syscall_numbers::LOG_U8];
        code.push(Opcode::Const.byte());
        code.extend_from_slice(&99u64.to_le_bytes());
        code.extend_from_slice(&[Opcode::Syscall.byte(), syscall_numbers::SET_RETURN_U64]);

        let config = Config {
            byte_order: flvm_program_runtime::ByteOrder::Little,
            ..Config::default()
        };
        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_syscalls(&table);

        assert_eq!(engine.exec().unwrap(), HaltReason::EndOfCode);
        assert!(engine.stack().is_empty());
        assert_eq!(ret.as_u64(), Some(99));
    }

    #[test]
    fn test_failing_syscall_is_reported() {
        let mut table = SyscallTable::new();
        register_syscalls(&mut table).unwrap();

        let code = [Opcode::Syscall.byte(), syscall_numbers::LOG_U64];
        let mut engine = Engine::new(64).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_syscalls(&table);

        match engine.exec() {
            Err(VmError::SyscallFailure { index, name, .. }) => {
                assert_eq!(index, syscall_numbers::LOG_U64);
                assert_eq!(name, "log_u64");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

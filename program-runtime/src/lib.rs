//! flvm Program Runtime
//!
//! This crate provides the execution engine of flvm, a small stack-based
//! bytecode virtual machine meant to be embedded in a host program. The
//! engine executes a fixed instruction set against an operand stack and a
//! data segment, and traps to host-registered syscalls for every effect on
//! the outside world.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Host                    │
//! │  (builds code + data, registers         │
//! │   syscalls, calls exec)                 │
//! └────────────────┬────────────────────────┘
//!                  │
//!                  │ load_code / load_data
//!                  │ load_syscalls / exec
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │    flvm-program-runtime (this crate)    │
//! │  ┌─────────────────────────────────┐    │
//! │  │    Engine                       │    │
//! │  │  - fetch / decode / execute     │    │
//! │  │  - program counter              │    │
//! │  │  - instruction budget           │    │
//! │  └─────────────────────────────────┘    │
//! │  ┌──────────────┐  ┌───────────────┐    │
//! │  │  Stack       │  │  Data segment │    │
//! │  │  (owned)     │  │  (borrowed)   │    │
//! │  └──────────────┘  └───────────────┘    │
//! │  ┌──────────────┐  ┌───────────────┐    │
//! │  │  Allocator   │  │ SyscallTable  │    │
//! │  │  (Save/Free) │  │  (borrowed)   │    │
//! │  └──────────────┘  └───────────────┘    │
//! └─────────────────────────────────────────┘
//!               │
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │         flvm-syscalls (separate)        │
//! │  - log_u8 .. log_f64, dump_stack, ...   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use flvm_program_runtime::{ByteOrder, Config, Engine, HaltReason, Opcode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // LOAD32 from address 0 of the data segment
//!     let mut code = vec![Opcode::Const.byte()];
//!     code.extend_from_slice(&0u64.to_le_bytes());
//!     code.push(Opcode::Load32.byte());
//!
//!     let mut data = 0.122f32.to_bits().to_le_bytes().to_vec();
//!
//!     let config = Config {
//!         byte_order: ByteOrder::Little,
//!         ..Config::default()
//!     };
//!     let mut engine = Engine::with_config(config)?;
//!     engine.load_code(&code)?;
//!     engine.load_data(Some(&mut data));
//!
//!     assert_eq!(engine.exec()?, HaltReason::EndOfCode);
//!     let value = engine.stack_mut().pop_f32()?;
//!     assert!((value - 0.122).abs() < 1e-6);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(clippy::arithmetic_side_effects)]

pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod heap;
pub mod memory;
pub mod opcode;
pub mod program;
pub mod stack;
pub mod syscall;

// Re-export main types
pub use config::Config;
pub use encoding::{ByteOrder, Scalar, Width};
pub use engine::{Engine, HaltReason};
pub use error::{Result, SyscallError, VmError};
pub use heap::{Allocator, HandleAllocator, NoAllocator};
pub use opcode::{Instruction, Instructions, Opcode};
pub use program::ProgramImage;
pub use stack::Stack;
pub use syscall::{SyscallFn, SyscallResult, SyscallTable};

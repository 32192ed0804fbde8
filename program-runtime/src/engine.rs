//! Execution engine
//!
//! The engine owns an operand stack and a program counter, borrows the code
//! buffer, the data segment and the syscall table from the host, and runs
//! the fetch-decode-execute loop until the code ends, a `Halt` is reached or
//! an instruction fails.
//!
//! # Example
//!
//! ```rust
//! use flvm_program_runtime::{Engine, HaltReason, Opcode, SyscallTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut syscalls = SyscallTable::new();
//! syscalls.register(0, "answer", |stack| {
//!     stack.push_u8(42)?;
//!     Ok(())
//! })?;
//!
//! let code = [Opcode::Syscall.byte(), 0];
//! let mut engine = Engine::new(512)?;
//! engine.load_code(&code)?;
//! engine.load_syscalls(&syscalls);
//!
//! assert_eq!(engine.exec()?, HaltReason::EndOfCode);
//! assert_eq!(engine.stack().as_bytes(), &[42]);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    encoding::Scalar,
    error::{Result, VmError},
    heap::{Allocator, HandleAllocator},
    memory,
    opcode::{Instruction, Opcode},
    stack::Stack,
    syscall::SyscallTable,
};
use std::fmt;

/// Why a successful `exec` stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The program counter reached the end of the code buffer
    EndOfCode,
    /// A `Halt` instruction was executed
    Halted,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::EndOfCode => f.write_str("end of code"),
            HaltReason::Halted => f.write_str("halt instruction"),
        }
    }
}

/// Control flow after a single instruction
enum Flow {
    Continue,
    Halt,
}

/// flvm execution engine
///
/// `'a` is the lifetime of everything the host lends to the engine: the
/// code, the data segment, the syscall table and a custom allocator.
pub struct Engine<'a> {
    /// Engine configuration
    config: Config,

    /// Operand stack, exclusively owned
    stack: Stack,

    /// Offset of the next instruction in `code`
    pc: usize,

    /// Borrowed code buffer
    code: Option<&'a [u8]>,

    /// Borrowed data segment
    data: Option<&'a mut [u8]>,

    /// Borrowed syscall table
    syscalls: Option<&'a SyscallTable>,

    /// Backend for `Save` and `Free`
    allocator: Box<dyn Allocator + 'a>,

    /// Instructions retired by the current or last `exec`
    instructions: u64,
}

impl<'a> Engine<'a> {
    /// Creates an engine with a stack of `stack_capacity` bytes and default settings
    ///
    /// # Errors
    /// [`VmError::AllocationFailure`] if the stack cannot be allocated.
    pub fn new(stack_capacity: usize) -> Result<Self> {
        Self::with_config(Config {
            stack_capacity,
            ..Config::default()
        })
    }

    /// Creates an engine from a full configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let stack = Stack::with_width_checks(config.stack_capacity, config.check_widths)?;
        let allocator = Box::new(HandleAllocator::new(config.heap_limit));
        log::debug!(
            "created engine: stack {} bytes, {}, heap limit {} bytes",
            config.stack_capacity,
            config.byte_order,
            config.heap_limit
        );

        Ok(Self {
            config,
            stack,
            pc: 0,
            code: None,
            data: None,
            syscalls: None,
            allocator,
            instructions: 0,
        })
    }

    /// Loads the code buffer and resets the program counter
    ///
    /// # Errors
    /// [`VmError::InvalidArgument`] if `code` is empty.
    pub fn load_code(&mut self, code: &'a [u8]) -> Result<()> {
        if code.is_empty() {
            return Err(VmError::InvalidArgument("no input bytecode"));
        }
        log::debug!("loaded {} bytes of code", code.len());
        self.code = Some(code);
        self.pc = 0;
        Ok(())
    }

    /// Loads the data segment; `None` clears any previously loaded data
    pub fn load_data(&mut self, data: Option<&'a mut [u8]>) {
        log::debug!(
            "loaded {} bytes of data",
            data.as_ref().map_or(0, |data| data.len())
        );
        self.data = data;
    }

    /// Lends the syscall table consulted by `Syscall`
    pub fn load_syscalls(&mut self, syscalls: &'a SyscallTable) {
        self.syscalls = Some(syscalls);
    }

    /// Replaces the backend of `Save` and `Free`
    ///
    /// Pass `&mut allocator` to keep access to its blocks after the engine
    /// is dropped.
    pub fn set_allocator(&mut self, allocator: impl Allocator + 'a) {
        self.allocator = Box::new(allocator);
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Offset of the next instruction
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// The operand stack
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// The operand stack, mutably (to seed arguments before `exec`)
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    /// Clears the operand stack between runs
    pub fn reset_stack(&mut self) {
        self.stack.clear();
    }

    /// The loaded data segment (empty if none)
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Instructions retired by the current or last `exec`
    pub fn instruction_count(&self) -> u64 {
        self.instructions
    }

    /// Runs the loaded program from the start
    ///
    /// The stack keeps whatever the previous run left on it. On failure the
    /// program counter is left at the faulting instruction; operands popped
    /// before the fault was detected stay consumed, but nothing is pushed
    /// and nothing is written to the data segment.
    ///
    /// # Returns
    /// - `Ok(HaltReason)` on a clean halt
    /// - `Err(VmError)` describing the first failing instruction
    pub fn exec(&mut self) -> Result<HaltReason> {
        let code = self
            .code
            .ok_or(VmError::InvalidArgument("no input bytecode"))?;

        self.pc = 0;
        self.instructions = 0;
        log::debug!("exec: {} bytes of code, {}", code.len(), self.stack);

        let result = self.run(code);

        match &result {
            Ok(reason) => log::debug!(
                "exec finished ({}): {} instructions, {}",
                reason,
                self.instructions,
                self.stack
            ),
            Err(err) => log::debug!(
                "exec failed at pc {} after {} instructions: {}",
                self.pc,
                self.instructions,
                err
            ),
        }
        result
    }

    fn run(&mut self, code: &[u8]) -> Result<HaltReason> {
        while self.pc < code.len() {
            if let Some(limit) = self.config.max_instructions {
                if self.instructions >= limit {
                    return Err(VmError::InstructionLimitExceeded(limit));
                }
            }

            let insn = Instruction::decode(code, self.pc, self.config.byte_order)?;
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("{} | {}", insn, self.stack);
            }

            let flow = self.step(&insn)?;
            self.pc = insn.next_pc();
            self.instructions = self.instructions.saturating_add(1);

            if let Flow::Halt = flow {
                return Ok(HaltReason::Halted);
            }
        }
        Ok(HaltReason::EndOfCode)
    }

    /// Executes one decoded instruction
    fn step(&mut self, insn: &Instruction) -> Result<Flow> {
        match insn.opcode {
            Opcode::Syscall => {
                let index = insn.syscall_index();
                let syscalls = self.syscalls.ok_or(VmError::UnmappedSyscall(index))?;
                syscalls.dispatch(index, &mut self.stack)?;
            }
            Opcode::Save => {
                let size = self.stack.pop_u64()?;
                let handle = self.allocator.save(size)?;
                self.stack.push_u64(handle)?;
            }
            Opcode::Free => {
                let handle = self.stack.pop_u64()?;
                self.allocator.free(handle)?;
            }
            Opcode::Load8 => self.load::<u8>()?,
            Opcode::Load16 => self.load::<u16>()?,
            Opcode::Load32 => self.load::<u32>()?,
            Opcode::Load => self.load::<u64>()?,
            Opcode::Store8 => self.store::<u8>()?,
            Opcode::Store16 => self.store::<u16>()?,
            Opcode::Store32 => self.store::<u32>()?,
            Opcode::Store => self.store::<u64>()?,
            Opcode::Const8 => self.push_immediate::<u8>(insn.immediate)?,
            Opcode::Const16 => self.push_immediate::<u16>(insn.immediate)?,
            Opcode::Const32 => self.push_immediate::<u32>(insn.immediate)?,
            Opcode::Const => self.push_immediate::<u64>(insn.immediate)?,
            Opcode::Halt => return Ok(Flow::Halt),
        }
        Ok(Flow::Continue)
    }

    /// Pops an address and pushes the `T` stored there
    fn load<T: Scalar>(&mut self) -> Result<()> {
        let address = self.pop_address()?;
        let value: T = memory::read(self.data(), address, self.config.byte_order)?;
        self.stack.push(value)
    }

    /// Pops an address, then a `T`, and writes the value at the address
    fn store<T: Scalar>(&mut self) -> Result<()> {
        let address = self.pop_address()?;
        let value: T = self.stack.pop()?;
        let order = self.config.byte_order;
        let data = self.data.as_deref_mut().unwrap_or_default();
        memory::write(data, address, value, order)
    }

    fn push_immediate<T: Scalar>(&mut self, immediate: u64) -> Result<()> {
        self.stack.push(T::from_immediate(immediate))
    }

    /// Addresses are native words
    fn pop_address(&mut self) -> Result<u64> {
        self.stack.pop_u64()
    }
}

impl fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("pc", &self.pc)
            .field("stack", &self.stack)
            .field("code_len", &self.code.map_or(0, <[u8]>::len))
            .field("data_len", &self.data().len())
            .field("instructions", &self.instructions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoding::{ByteOrder, Width},
        heap::NoAllocator,
    };

    fn op(opcode: Opcode) -> u8 {
        opcode.byte()
    }

    fn engine<'a>() -> Engine<'a> {
        Engine::new(512).unwrap()
    }

    #[test]
    fn test_load_code_resets_pc() {
        let code = [op(Opcode::Const8), 1];
        let mut engine = engine();
        engine.load_code(&code).unwrap();
        assert_eq!(engine.pc(), 0);

        engine.exec().unwrap();
        assert_eq!(engine.pc(), 2);

        engine.load_code(&code).unwrap();
        assert_eq!(engine.pc(), 0);
    }

    #[test]
    fn test_load_empty_code_rejected() {
        let mut engine = engine();
        assert!(matches!(engine.load_code(&[]), Err(VmError::InvalidArgument(_))));
    }

    #[test]
    fn test_exec_without_code() {
        let mut engine = engine();
        assert!(matches!(engine.exec(), Err(VmError::InvalidArgument(_))));
    }

    #[test]
    fn test_const32_as_f32() {
        let mut code = vec![op(Opcode::Const32)];
        code.extend_from_slice(&0x3DF9_DB23u32.to_ne_bytes());

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        assert_eq!(engine.exec().unwrap(), HaltReason::EndOfCode);

        let value = engine.stack_mut().pop_f32().unwrap();
        assert!((value - 0.122).abs() < 1e-6);
    }

    #[test]
    fn test_const_widths() {
        let config = Config {
            byte_order: ByteOrder::Big,
            ..Config::default()
        };
        let code = [
            op(Opcode::Const8),
            0xAB,
            op(Opcode::Const16),
            0x12,
            0x34,
            op(Opcode::Const),
            0,
            0,
            0,
            0,
            0,
            0,
            0x01,
            0x00,
        ];
        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();
        engine.exec().unwrap();

        let stack = engine.stack_mut();
        assert_eq!(stack.pop_u64().unwrap(), 0x100);
        assert_eq!(stack.pop_u16().unwrap(), 0x1234);
        assert_eq!(stack.pop_u8().unwrap(), 0xAB);
        assert!(stack.is_empty());
        assert_eq!(engine.instruction_count(), 3);
    }

    #[test]
    fn test_syscall_pushes_result() {
        let mut syscalls = SyscallTable::new();
        syscalls
            .register(0, "push_42", |stack| Ok(stack.push_u8(42)?))
            .unwrap();

        let code = [op(Opcode::Syscall), 0];
        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.load_syscalls(&syscalls);

        assert_eq!(engine.exec().unwrap(), HaltReason::EndOfCode);
        assert_eq!(engine.stack().as_bytes(), &[42]);
    }

    #[test]
    fn test_unmapped_syscall_leaves_stack() {
        let syscalls = SyscallTable::new();
        let code = [op(Opcode::Syscall), 7];
        let mut engine = engine();
        engine.stack_mut().push_u32(5).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_syscalls(&syscalls);

        assert!(matches!(engine.exec(), Err(VmError::UnmappedSyscall(7))));
        assert_eq!(engine.stack().len(), 4);
        assert_eq!(engine.pc(), 0);
    }

    #[test]
    fn test_syscall_without_table_is_unmapped() {
        let code = [op(Opcode::Syscall), 0];
        let mut engine = engine();
        engine.load_code(&code).unwrap();
        assert!(matches!(engine.exec(), Err(VmError::UnmappedSyscall(0))));
    }

    #[test]
    fn test_syscall_failure_is_surfaced() {
        let mut syscalls = SyscallTable::new();
        syscalls
            .register(2, "always_fails", |_| Err("device unavailable".into()))
            .unwrap();

        let code = [op(Opcode::Syscall), 2];
        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.load_syscalls(&syscalls);

        let err = engine.exec().unwrap_err();
        assert!(matches!(err, VmError::SyscallFailure { index: 2, name: "always_fails", .. }));
        assert!(err.to_string().contains("device unavailable"));
    }

    #[test]
    fn test_load_widths_from_data() {
        let mut data = vec![0u8; 16];
        memory::write(&mut data, 0, 0x11u8, ByteOrder::Little).unwrap();
        memory::write(&mut data, 1, 0x2233u16, ByteOrder::Little).unwrap();
        memory::write(&mut data, 3, 0x4455_6677u32, ByteOrder::Little).unwrap();
        memory::write(&mut data, 8, 0x0102_0304_0506_0708u64, ByteOrder::Little).unwrap();

        let mut code = Vec::new();
        for (address, opcode) in [
            (0u8, Opcode::Load8),
            (1, Opcode::Load16),
            (3, Opcode::Load32),
            (8, Opcode::Load),
        ] {
            code.push(op(Opcode::Const));
            code.extend_from_slice(&u64::from(address).to_le_bytes());
            code.push(op(opcode));
        }

        let config = Config {
            byte_order: ByteOrder::Little,
            ..Config::default()
        };
        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));
        engine.exec().unwrap();

        let stack = engine.stack_mut();
        assert_eq!(stack.pop_u64().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(stack.pop_u32().unwrap(), 0x4455_6677);
        assert_eq!(stack.pop_u16().unwrap(), 0x2233);
        assert_eq!(stack.pop_u8().unwrap(), 0x11);
    }

    #[test]
    fn test_load8_out_of_bounds_consumes_address() {
        let mut data = vec![1u8, 2, 3, 4];
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&4u64.to_ne_bytes());
        code.push(op(Opcode::Load8));

        let mut engine = engine();
        engine.stack_mut().push_u8(9).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));

        let err = engine.exec().unwrap_err();
        assert!(matches!(
            err,
            VmError::OutOfBounds { address: 4, width: Width::W8, len: 4 }
        ));
        // address popped, nothing pushed
        assert_eq!(engine.stack().as_bytes(), &[9]);
        assert_eq!(engine.pc(), 9);
    }

    #[test]
    fn test_load_without_data_is_out_of_bounds() {
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&0u64.to_ne_bytes());
        code.push(op(Opcode::Load8));

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        assert!(matches!(engine.exec(), Err(VmError::OutOfBounds { len: 0, .. })));
    }

    #[test]
    fn test_store_writes_data_segment() {
        let mut data = vec![0u8; 8];
        let mut code = vec![op(Opcode::Const32)];
        code.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        code.push(op(Opcode::Const));
        code.extend_from_slice(&2u64.to_be_bytes());
        code.push(op(Opcode::Store32));

        let config = Config {
            byte_order: ByteOrder::Big,
            ..Config::default()
        };
        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));
        engine.exec().unwrap();
        assert!(engine.stack().is_empty());
        assert_eq!(&engine.data()[2..6], &[0xDE, 0xAD, 0xBE, 0xEF]);

        drop(engine);
        assert_eq!(data, vec![0, 0, 0xDE, 0xAD, 0xBE, 0xEF, 0, 0]);
    }

    #[test]
    fn test_store_out_of_bounds_writes_nothing() {
        let mut data = vec![0u8; 4];
        let mut code = vec![op(Opcode::Const16)];
        code.extend_from_slice(&0xFFFFu16.to_ne_bytes());
        code.push(op(Opcode::Const));
        code.extend_from_slice(&3u64.to_ne_bytes());
        code.push(op(Opcode::Store16));

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));
        assert!(matches!(engine.exec(), Err(VmError::OutOfBounds { address: 3, .. })));
        assert_eq!(engine.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_store_width_mismatch() {
        let mut data = vec![0u8; 8];
        // value pushed as 16-bit, stored as 8-bit
        let mut code = vec![op(Opcode::Const16)];
        code.extend_from_slice(&0x0102u16.to_ne_bytes());
        code.push(op(Opcode::Const));
        code.extend_from_slice(&0u64.to_ne_bytes());
        code.push(op(Opcode::Store8));

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));
        assert!(matches!(
            engine.exec(),
            Err(VmError::WidthMismatch {
                requested: Width::W8,
                found: Width::W16
            })
        ));
        assert_eq!(engine.pc(), 12);
        // address consumed, value left in place
        assert_eq!(engine.stack().len(), 2);
        assert_eq!(engine.data(), &[0u8; 8]);
    }

    #[test]
    fn test_address_must_be_a_word() {
        let mut data = vec![0u8; 8];
        let code = [op(Opcode::Const8), 0, op(Opcode::Const8), 0, op(Opcode::Load8)];

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.load_data(Some(&mut data));
        // two bytes on the stack are not enough for a 64-bit address
        assert!(matches!(engine.exec(), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn test_save_and_free() {
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&32u64.to_ne_bytes());
        code.push(op(Opcode::Save));
        let free = [op(Opcode::Free)];

        let mut engine = engine();
        engine.load_code(&code).unwrap();
        engine.exec().unwrap();
        let handle = engine.stack().peek::<u64>().unwrap();
        assert_ne!(handle, 0);

        // free the handle left on the stack
        engine.load_code(&free).unwrap();
        engine.exec().unwrap();
        assert!(engine.stack().is_empty());

        // and again: double free
        engine.stack_mut().push_u64(handle).unwrap();
        assert!(matches!(engine.exec(), Err(VmError::InvalidFree(h)) if h == handle));
    }

    #[test]
    fn test_save_over_heap_limit() {
        let config = Config {
            heap_limit: 16,
            ..Config::default()
        };
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&17u64.to_ne_bytes());
        code.push(op(Opcode::Save));

        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();
        assert!(matches!(
            engine.exec(),
            Err(VmError::AllocationFailure { requested: 17 })
        ));
        assert!(engine.stack().is_empty());
    }

    #[test]
    fn test_custom_allocator() {
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&1u64.to_ne_bytes());
        code.push(op(Opcode::Save));

        let mut engine = engine();
        engine.set_allocator(NoAllocator);
        engine.load_code(&code).unwrap();
        assert!(matches!(engine.exec(), Err(VmError::AllocationFailure { .. })));
    }

    #[test]
    fn test_lent_allocator_exposes_blocks() {
        let mut heap = HandleAllocator::new(1024);
        let mut code = vec![op(Opcode::Const)];
        code.extend_from_slice(&24u64.to_ne_bytes());
        code.push(op(Opcode::Save));

        let handle = {
            let mut engine = engine();
            engine.set_allocator(&mut heap);
            engine.load_code(&code).unwrap();
            engine.exec().unwrap();
            engine.stack_mut().pop_u64().unwrap()
        };

        assert_eq!(heap.live_blocks(), 1);
        assert_eq!(heap.live_bytes(), 24);
        assert_eq!(heap.block(handle).unwrap(), &[0u8; 24]);
        heap.block_mut(handle).unwrap()[0] = 0xAA;
        assert_eq!(heap.block(handle).unwrap()[0], 0xAA);
    }

    #[test]
    fn test_halt_stops_execution() {
        let code = [op(Opcode::Const8), 1, op(Opcode::Halt), op(Opcode::Const8), 2];
        let mut engine = engine();
        engine.load_code(&code).unwrap();

        assert_eq!(engine.exec().unwrap(), HaltReason::Halted);
        assert_eq!(engine.stack().as_bytes(), &[1]);
        assert_eq!(engine.pc(), 3);
        assert_eq!(engine.instruction_count(), 2);
    }

    #[test]
    fn test_invalid_opcode() {
        let code = [op(Opcode::Const8), 1, 0x7F];
        let mut engine = engine();
        engine.load_code(&code).unwrap();

        assert!(matches!(
            engine.exec(),
            Err(VmError::InvalidOpcode { opcode: 0x7F, pc: 2 })
        ));
        assert_eq!(engine.stack().as_bytes(), &[1]);
    }

    #[test]
    fn test_truncated_immediate() {
        let code = [op(Opcode::Const32), 1, 2];
        let mut engine = engine();
        engine.load_code(&code).unwrap();
        assert!(matches!(engine.exec(), Err(VmError::TruncatedImmediate { .. })));
        assert!(engine.stack().is_empty());
    }

    #[test]
    fn test_stack_overflow_is_recoverable() {
        let code = [op(Opcode::Const8), 1, op(Opcode::Const8), 2, op(Opcode::Const8), 3];
        let mut engine = Engine::new(2).unwrap();
        engine.load_code(&code).unwrap();

        assert!(matches!(engine.exec(), Err(VmError::StackOverflow { .. })));
        assert_eq!(engine.stack().as_bytes(), &[1, 2]);
        assert_eq!(engine.pc(), 4);
    }

    #[test]
    fn test_instruction_limit() {
        let config = Config {
            max_instructions: Some(2),
            ..Config::default()
        };
        let code = [op(Opcode::Const8), 1, op(Opcode::Const8), 2, op(Opcode::Const8), 3];
        let mut engine = Engine::with_config(config).unwrap();
        engine.load_code(&code).unwrap();

        assert!(matches!(
            engine.exec(),
            Err(VmError::InstructionLimitExceeded(2))
        ));
        assert_eq!(engine.instruction_count(), 2);
        assert_eq!(engine.stack().len(), 2);
    }

    #[test]
    fn test_rerun_keeps_stack_residue() {
        let code = [op(Opcode::Const8), 7];
        let mut engine = engine();
        engine.load_code(&code).unwrap();

        engine.exec().unwrap();
        engine.exec().unwrap();
        assert_eq!(engine.stack().as_bytes(), &[7, 7]);

        engine.reset_stack();
        engine.exec().unwrap();
        assert_eq!(engine.stack().as_bytes(), &[7]);
    }

    #[test]
    fn test_load_data_none_clears_segment() {
        let mut data = vec![1u8, 2, 3];
        let mut engine = engine();
        engine.load_data(Some(&mut data));
        assert_eq!(engine.data().len(), 3);

        engine.load_data(None);
        assert!(engine.data().is_empty());
    }
}

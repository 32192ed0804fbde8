//! Instruction set
//!
//! Opcodes are single bytes. The width suffix of an opcode fixes both the
//! length of its immediate operand and the width it pushes or pops, so a
//! decoded instruction always knows statically which stack width it uses.
//!
//! # Bytecode format
//!
//! - Opcode: 1 byte
//! - `Syscall` index: 1 byte
//! - `Const8/16/32/Const` immediate: 1/2/4/8 bytes in the configured byte order
//! - Every other opcode takes no immediate

use crate::{
    encoding::{ByteOrder, Scalar, Width},
    error::{Result, VmError},
};
use std::fmt;

/// An instruction identifier
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `SYSCALL n8` ; trap to the host handler at index n8
    Syscall = 0x00,
    /// `SAVE` ; pop size, push handle of a fresh block
    Save = 0x01,
    /// `FREE` ; pop handle, release its block
    Free = 0x02,
    /// `LOAD8` ; pop address, push data[address] (1 byte)
    Load8 = 0x03,
    /// `LOAD16` ; pop address, push data[address..+2]
    Load16 = 0x04,
    /// `LOAD32` ; pop address, push data[address..+4]
    Load32 = 0x05,
    /// `LOAD` ; pop address, push data[address..+8]
    Load = 0x06,
    /// `STORE8` ; pop address, pop value, data[address] = value
    Store8 = 0x07,
    /// `STORE16` ; pop address, pop value, data[address..+2] = value
    Store16 = 0x08,
    /// `STORE32` ; pop address, pop value, data[address..+4] = value
    Store32 = 0x09,
    /// `STORE` ; pop address, pop value, data[address..+8] = value
    Store = 0x0A,
    /// `CONST8 n8` ; push n8
    Const8 = 0x0B,
    /// `CONST16 n16` ; push n16
    Const16 = 0x0C,
    /// `CONST32 n32` ; push n32
    Const32 = 0x0D,
    /// `CONST n64` ; push n64
    Const = 0x0E,
    /// `HALT` ; stop execution
    Halt = 0x0F,
}

impl Opcode {
    /// Every opcode, in byte order
    pub const ALL: [Opcode; 16] = [
        Opcode::Syscall,
        Opcode::Save,
        Opcode::Free,
        Opcode::Load8,
        Opcode::Load16,
        Opcode::Load32,
        Opcode::Load,
        Opcode::Store8,
        Opcode::Store16,
        Opcode::Store32,
        Opcode::Store,
        Opcode::Const8,
        Opcode::Const16,
        Opcode::Const32,
        Opcode::Const,
        Opcode::Halt,
    ];

    /// Decodes an opcode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// The encoded byte
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Syscall => "SYSCALL",
            Opcode::Save => "SAVE",
            Opcode::Free => "FREE",
            Opcode::Load8 => "LOAD8",
            Opcode::Load16 => "LOAD16",
            Opcode::Load32 => "LOAD32",
            Opcode::Load => "LOAD",
            Opcode::Store8 => "STORE8",
            Opcode::Store16 => "STORE16",
            Opcode::Store32 => "STORE32",
            Opcode::Store => "STORE",
            Opcode::Const8 => "CONST8",
            Opcode::Const16 => "CONST16",
            Opcode::Const32 => "CONST32",
            Opcode::Const => "CONST",
            Opcode::Halt => "HALT",
        }
    }

    /// Width of the value loaded, stored or pushed, for width-suffixed opcodes
    pub const fn width(self) -> Option<Width> {
        match self {
            Opcode::Load8 | Opcode::Store8 | Opcode::Const8 => Some(Width::W8),
            Opcode::Load16 | Opcode::Store16 | Opcode::Const16 => Some(Width::W16),
            Opcode::Load32 | Opcode::Store32 | Opcode::Const32 => Some(Width::W32),
            Opcode::Load | Opcode::Store | Opcode::Const => Some(Width::W64),
            Opcode::Syscall | Opcode::Save | Opcode::Free | Opcode::Halt => None,
        }
    }

    /// Number of immediate bytes following the opcode byte
    pub const fn immediate_len(self) -> usize {
        match self {
            Opcode::Syscall => 1,
            Opcode::Const8 => 1,
            Opcode::Const16 => 2,
            Opcode::Const32 => 4,
            Opcode::Const => 8,
            _ => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of the opcode byte in the code buffer
    pub pc: usize,
    /// The opcode
    pub opcode: Opcode,
    /// Immediate operand zero-extended to 64 bits (0 when the opcode has none)
    pub immediate: u64,
}

impl Instruction {
    /// Decodes the instruction starting at `pc`
    ///
    /// Fails with [`VmError::InvalidOpcode`] for an unknown byte and
    /// [`VmError::TruncatedImmediate`] when the code ends inside the
    /// immediate operand.
    pub fn decode(code: &[u8], pc: usize, order: ByteOrder) -> Result<Self> {
        let byte = *code
            .get(pc)
            .ok_or(VmError::InvalidArgument("pc past end of code"))?;
        let opcode = Opcode::from_byte(byte).ok_or(VmError::InvalidOpcode { opcode: byte, pc })?;

        let needed = opcode.immediate_len();
        let operand_start = pc.saturating_add(1);
        let available = code.len().saturating_sub(operand_start);
        let operand = code
            .get(operand_start..operand_start.saturating_add(needed))
            .filter(|operand| operand.len() == needed)
            .ok_or(VmError::TruncatedImmediate {
                opcode,
                pc,
                needed,
                available,
            })?;

        let immediate = match needed {
            0 => 0,
            1 => u64::from(operand[0]),
            2 => u64::from(u16::decode(order, operand)),
            4 => u64::from(u32::decode(order, operand)),
            _ => u64::decode(order, operand),
        };

        Ok(Self {
            pc,
            opcode,
            immediate,
        })
    }

    /// Encoded length in bytes, opcode included
    pub fn encoded_len(&self) -> usize {
        self.opcode.immediate_len().saturating_add(1)
    }

    /// Offset of the following instruction
    pub fn next_pc(&self) -> usize {
        self.pc.saturating_add(self.encoded_len())
    }

    /// The syscall index of a `Syscall` instruction
    pub fn syscall_index(&self) -> u8 {
        u8::from_immediate(self.immediate)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}: {}", self.pc, self.opcode)?;
        match self.opcode.immediate_len() {
            0 => Ok(()),
            1 if self.opcode == Opcode::Syscall => write!(f, " {}", self.immediate),
            _ => write!(f, " {:#x}", self.immediate),
        }
    }
}

/// Iterator over the instructions of a code buffer
///
/// Yields decode errors in place of instructions and stops after the first one.
pub struct Instructions<'a> {
    code: &'a [u8],
    pc: usize,
    order: ByteOrder,
    failed: bool,
}

impl<'a> Instructions<'a> {
    /// Iterates over `code`, decoding immediates in `order`
    pub fn new(code: &'a [u8], order: ByteOrder) -> Self {
        Self {
            code,
            pc: 0,
            order,
            failed: false,
        }
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.code.len() {
            return None;
        }
        match Instruction::decode(self.code, self.pc, self.order) {
            Ok(instruction) => {
                self.pc = instruction.next_pc();
                Some(Ok(instruction))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

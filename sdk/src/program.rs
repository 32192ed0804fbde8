//! Code segment builder

use crate::data::DataBuilder;
use flvm_program_runtime::{ByteOrder, Opcode, ProgramImage, Scalar};

/// Emits instructions into a code buffer
///
/// Immediates are encoded in the builder's byte order. Methods chain, so a
/// straight-line program reads top to bottom:
///
/// ```rust
/// use flvm_program_runtime::{ByteOrder, Opcode};
/// use flvm_sdk::ProgramBuilder;
///
/// let mut program = ProgramBuilder::new(ByteOrder::Little);
/// program.const8(0).load32().syscall(4);
/// assert_eq!(
///     program.finish(),
///     vec![Opcode::Const8.byte(), 0, Opcode::Load32.byte(), Opcode::Syscall.byte(), 4]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    order: ByteOrder,
    code: Vec<u8>,
}

impl ProgramBuilder {
    /// Create an empty builder
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            code: Vec::new(),
        }
    }

    /// Byte order immediates are encoded in
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Offset the next instruction will be emitted at
    pub fn pc(&self) -> usize {
        self.code.len()
    }

    /// Number of bytes emitted so far
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Emit an opcode that takes no immediate
    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        debug_assert_eq!(opcode.immediate_len(), 0);
        self.code.push(opcode.byte());
        self
    }

    fn op_with<T: Scalar>(&mut self, opcode: Opcode, immediate: T) -> &mut Self {
        self.code.push(opcode.byte());
        let start = self.code.len();
        self.code.resize(start.saturating_add(T::WIDTH.bytes()), 0);
        immediate.encode(self.order, &mut self.code[start..]);
        self
    }

    /// `SYSCALL index`
    pub fn syscall(&mut self, index: u8) -> &mut Self {
        self.code.push(Opcode::Syscall.byte());
        self.code.push(index);
        self
    }

    /// `SAVE`: pops a size, pushes a handle
    pub fn save(&mut self) -> &mut Self {
        self.op(Opcode::Save)
    }

    /// `FREE`: pops a handle
    pub fn free(&mut self) -> &mut Self {
        self.op(Opcode::Free)
    }

    /// `LOAD8`
    pub fn load8(&mut self) -> &mut Self {
        self.op(Opcode::Load8)
    }

    /// `LOAD16`
    pub fn load16(&mut self) -> &mut Self {
        self.op(Opcode::Load16)
    }

    /// `LOAD32`
    pub fn load32(&mut self) -> &mut Self {
        self.op(Opcode::Load32)
    }

    /// `LOAD` (64-bit)
    pub fn load64(&mut self) -> &mut Self {
        self.op(Opcode::Load)
    }

    /// `STORE8`
    pub fn store8(&mut self) -> &mut Self {
        self.op(Opcode::Store8)
    }

    /// `STORE16`
    pub fn store16(&mut self) -> &mut Self {
        self.op(Opcode::Store16)
    }

    /// `STORE32`
    pub fn store32(&mut self) -> &mut Self {
        self.op(Opcode::Store32)
    }

    /// `STORE` (64-bit)
    pub fn store64(&mut self) -> &mut Self {
        self.op(Opcode::Store)
    }

    /// `CONST8 value`
    pub fn const8(&mut self, value: u8) -> &mut Self {
        self.op_with(Opcode::Const8, value)
    }

    /// `CONST16 value`
    pub fn const16(&mut self, value: u16) -> &mut Self {
        self.op_with(Opcode::Const16, value)
    }

    /// `CONST32 value`
    pub fn const32(&mut self, value: u32) -> &mut Self {
        self.op_with(Opcode::Const32, value)
    }

    /// `CONST value` (64-bit)
    pub fn const64(&mut self, value: u64) -> &mut Self {
        self.op_with(Opcode::Const, value)
    }

    /// `CONST32` carrying the bits of an `f32`
    pub fn const_f32(&mut self, value: f32) -> &mut Self {
        self.op_with(Opcode::Const32, value)
    }

    /// `CONST` carrying the bits of an `f64`
    pub fn const_f64(&mut self, value: f64) -> &mut Self {
        self.op_with(Opcode::Const, value)
    }

    /// Push a data segment address (a 64-bit word)
    pub fn address(&mut self, address: u64) -> &mut Self {
        self.const64(address)
    }

    /// `HALT`
    pub fn halt(&mut self) -> &mut Self {
        self.op(Opcode::Halt)
    }

    /// Take the encoded code buffer
    pub fn finish(self) -> Vec<u8> {
        self.code
    }

    /// Bundle the code with `data` into a [`ProgramImage`]
    ///
    /// The data builder should use the same byte order; the image records
    /// the code's.
    pub fn into_image(self, data: DataBuilder) -> ProgramImage {
        if data.byte_order() != self.order {
            log::warn!(
                "data encoded {} but code encoded {}",
                data.byte_order(),
                self.order
            );
        }
        let image = ProgramImage::new(self.order, self.code, data.finish());
        log::debug!(
            "built image: {} code bytes, {} data bytes",
            image.code.len(),
            image.data.len()
        );
        image
    }
}

//! Data segment builder

use flvm_program_runtime::{ByteOrder, Scalar};

/// Encodes constants into a data segment
///
/// Every value is written in the builder's byte order, which must match the
/// order the engine is configured with. Record [`DataBuilder::offset`]
/// before appending a value to get the address a program loads it from.
///
/// ```rust
/// use flvm_program_runtime::ByteOrder;
/// use flvm_sdk::DataBuilder;
///
/// let mut data = DataBuilder::new(ByteOrder::Big);
/// let addr = data.offset();
/// data.u16(0x1234).f32(0.5);
/// assert_eq!(addr, 0);
/// assert_eq!(&data.finish()[..2], &[0x12, 0x34]);
/// ```
#[derive(Debug, Clone)]
pub struct DataBuilder {
    order: ByteOrder,
    bytes: Vec<u8>,
}

impl DataBuilder {
    /// Create an empty builder
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            bytes: Vec::new(),
        }
    }

    /// Byte order values are encoded in
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Address the next value will be written at
    pub fn offset(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Append any scalar
    pub fn value<T: Scalar>(&mut self, value: T) -> &mut Self {
        let start = self.bytes.len();
        self.bytes.resize(start.saturating_add(T::WIDTH.bytes()), 0);
        value.encode(self.order, &mut self.bytes[start..]);
        self
    }

    /// Append a `u8`
    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.value(value)
    }

    /// Append a `u16`
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.value(value)
    }

    /// Append a `u32`
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.value(value)
    }

    /// Append a `u64`
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.value(value)
    }

    /// Append an `i8` as its two's complement bits
    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.value(value as u8)
    }

    /// Append an `i16` as its two's complement bits
    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.value(value as u16)
    }

    /// Append an `i32` as its two's complement bits
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.value(value as u32)
    }

    /// Append an `i64` as its two's complement bits
    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.value(value as u64)
    }

    /// Append an `f32` as its IEEE 754 bits
    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.value(value)
    }

    /// Append an `f64` as its IEEE 754 bits
    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.value(value)
    }

    /// Append raw bytes unchanged
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append `len` zero bytes, e.g. scratch space for stores
    pub fn zeroed(&mut self, len: usize) -> &mut Self {
        self.bytes.resize(self.bytes.len().saturating_add(len), 0);
        self
    }

    /// Take the encoded segment
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

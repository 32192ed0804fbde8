//! Operand stack
//!
//! A fixed-capacity byte buffer accessed through width-typed push and pop
//! operations. Values are stored in host byte order; the length of the
//! buffer is the stack cursor. Next to the bytes the stack records the width
//! of every pushed value so that a pop with the wrong width is reported as
//! [`VmError::WidthMismatch`] instead of silently reinterpreting bytes.

use crate::{
    encoding::{ByteOrder, Scalar, Width},
    error::{Result, VmError},
};
use std::fmt;

/// Number of bytes shown by the [`Display`](fmt::Display) implementation
const DUMP_BYTES: usize = 8;

/// Operand stack of the engine
#[derive(Debug, Clone)]
pub struct Stack {
    /// Occupied bytes; `buffer.len()` is the cursor
    buffer: Vec<u8>,
    /// Maximum number of bytes, fixed at creation
    capacity: usize,
    /// Width of every value currently on the stack, bottom first
    widths: Vec<Width>,
    /// Reject pops whose width differs from the top value's width
    check_widths: bool,
}

impl Stack {
    /// Creates an empty stack able to hold `capacity` bytes, with width checking enabled
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_width_checks(capacity, true)
    }

    /// Creates an empty stack, choosing whether pops are checked against push widths
    pub fn with_width_checks(capacity: usize, check_widths: bool) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| VmError::AllocationFailure {
                requested: capacity as u64,
            })?;

        // one tag per byte at most
        let mut widths = Vec::new();
        widths
            .try_reserve_exact(capacity)
            .map_err(|_| VmError::AllocationFailure {
                requested: capacity as u64,
            })?;

        Ok(Self {
            buffer,
            capacity,
            widths,
            check_widths,
        })
    }

    /// Capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes in use
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing is on the stack
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of values on the stack
    pub fn depth(&self) -> usize {
        self.widths.len()
    }

    /// Width of the value on top of the stack
    pub fn top_width(&self) -> Option<Width> {
        self.widths.last().copied()
    }

    /// Whether pops are checked against push widths
    pub fn checks_widths(&self) -> bool {
        self.check_widths
    }

    /// Occupied bytes, bottom of the stack first
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The last `n` occupied bytes (fewer if the stack holds less)
    pub fn top_bytes(&self, n: usize) -> &[u8] {
        let start = self.buffer.len().saturating_sub(n);
        &self.buffer[start..]
    }

    /// Drops every value, keeping the capacity
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.widths.clear();
    }

    /// Pushes a value of any supported width
    ///
    /// Fails with [`VmError::StackOverflow`] without writing anything if the
    /// value does not fit in the remaining capacity.
    pub fn push<T: Scalar>(&mut self, value: T) -> Result<()> {
        let width = T::WIDTH;
        let start = self.buffer.len();
        let end = start
            .checked_add(width.bytes())
            .filter(|end| *end <= self.capacity)
            .ok_or(VmError::StackOverflow {
                width,
                size: start,
                capacity: self.capacity,
            })?;

        self.buffer.resize(end, 0);
        value.encode(ByteOrder::native(), &mut self.buffer[start..end]);
        self.widths.push(width);
        Ok(())
    }

    /// Pops a value of any supported width
    ///
    /// Fails with [`VmError::StackUnderflow`] if fewer than `T::WIDTH` bytes
    /// are in use, or [`VmError::WidthMismatch`] if width checking is enabled
    /// and the top value was pushed with another width. The stack is left
    /// untouched on failure.
    ///
    /// Without width checking a pop may span several values or only part of
    /// one. The bytes left behind by a split value are retagged as the
    /// fewest widths that cover them, so tags always cover the buffer.
    pub fn pop<T: Scalar>(&mut self) -> Result<T> {
        let value = self.peek::<T>()?;
        let popped = T::WIDTH.bytes();
        let start = self.buffer.len().saturating_sub(popped);
        self.buffer.truncate(start);
        self.pop_widths(popped);
        Ok(value)
    }

    /// Drops the tags covering the top `bytes` bytes
    fn pop_widths(&mut self, bytes: usize) {
        let mut remaining = bytes;
        while remaining > 0 {
            let Some(top) = self.widths.pop() else {
                break;
            };
            match remaining.checked_sub(top.bytes()) {
                Some(rest) => remaining = rest,
                None => {
                    let mut leftover = top.bytes().saturating_sub(remaining);
                    for width in [Width::W64, Width::W32, Width::W16, Width::W8] {
                        if leftover >= width.bytes() {
                            self.widths.push(width);
                            leftover = leftover.saturating_sub(width.bytes());
                        }
                    }
                    remaining = 0;
                }
            }
        }
    }

    /// Reads the top value without removing it
    pub fn peek<T: Scalar>(&self) -> Result<T> {
        let width = T::WIDTH;
        let size = self.buffer.len();
        let start = size
            .checked_sub(width.bytes())
            .ok_or(VmError::StackUnderflow { width, size })?;

        if self.check_widths {
            if let Some(found) = self.top_width() {
                if found != width {
                    return Err(VmError::WidthMismatch {
                        requested: width,
                        found,
                    });
                }
            }
        }

        Ok(T::decode(ByteOrder::native(), &self.buffer[start..]))
    }

    /// Pushes a byte
    pub fn push_u8(&mut self, value: u8) -> Result<()> {
        self.push(value)
    }

    /// Pushes a 16-bit value
    pub fn push_u16(&mut self, value: u16) -> Result<()> {
        self.push(value)
    }

    /// Pushes a 32-bit value
    pub fn push_u32(&mut self, value: u32) -> Result<()> {
        self.push(value)
    }

    /// Pushes a 64-bit value
    pub fn push_u64(&mut self, value: u64) -> Result<()> {
        self.push(value)
    }

    /// Pushes the bit pattern of an `f32`
    pub fn push_f32(&mut self, value: f32) -> Result<()> {
        self.push(value)
    }

    /// Pushes the bit pattern of an `f64`
    pub fn push_f64(&mut self, value: f64) -> Result<()> {
        self.push(value)
    }

    /// Pops a byte
    pub fn pop_u8(&mut self) -> Result<u8> {
        self.pop()
    }

    /// Pops a 16-bit value
    pub fn pop_u16(&mut self) -> Result<u16> {
        self.pop()
    }

    /// Pops a 32-bit value
    pub fn pop_u32(&mut self) -> Result<u32> {
        self.pop()
    }

    /// Pops a 64-bit value
    pub fn pop_u64(&mut self) -> Result<u64> {
        self.pop()
    }

    /// Pops 32 bits and reinterprets them as an `f32`
    pub fn pop_f32(&mut self) -> Result<f32> {
        self.pop()
    }

    /// Pops 64 bits and reinterprets them as an `f64`
    pub fn pop_f64(&mut self) -> Result<f64> {
        self.pop()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stack cap={} len={} depth={} top=[",
            self.capacity,
            self.buffer.len(),
            self.widths.len()
        )?;
        for (i, byte) in self.top_bytes(DUMP_BYTES).iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_integers() {
        let mut stack = Stack::new(64).unwrap();

        for value in [0u8, 1, 0x7F, u8::MAX] {
            stack.push_u8(value).unwrap();
            assert_eq!(stack.pop_u8().unwrap(), value);
        }
        for value in [0u16, 0x1234, u16::MAX] {
            stack.push_u16(value).unwrap();
            assert_eq!(stack.pop_u16().unwrap(), value);
        }
        for value in [0u32, 0xDEAD_BEEF, u32::MAX] {
            stack.push_u32(value).unwrap();
            assert_eq!(stack.pop_u32().unwrap(), value);
        }
        for value in [0u64, 0x0123_4567_89AB_CDEF, u64::MAX] {
            stack.push_u64(value).unwrap();
            assert_eq!(stack.pop_u64().unwrap(), value);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_round_trip_float_bit_patterns() {
        let mut stack = Stack::new(64).unwrap();

        let f32_patterns = [
            0u32,
            u32::MAX,
            f32::INFINITY.to_bits(),
            f32::NEG_INFINITY.to_bits(),
            0x7FC0_0001, // quiet NaN with payload
            0x0000_0001, // smallest subnormal
        ];
        for bits in f32_patterns {
            stack.push_f32(f32::from_bits(bits)).unwrap();
            assert_eq!(stack.pop_f32().unwrap().to_bits(), bits);
        }

        let f64_patterns = [
            0u64,
            u64::MAX,
            f64::INFINITY.to_bits(),
            0x7FF4_0000_0000_0001, // signalling NaN
            0x0000_0000_0000_0001,
        ];
        for bits in f64_patterns {
            stack.push_f64(f64::from_bits(bits)).unwrap();
            assert_eq!(stack.pop_f64().unwrap().to_bits(), bits);
        }
    }

    #[test]
    fn test_lifo_order_across_widths() {
        let mut stack = Stack::new(32).unwrap();
        stack.push_u8(1).unwrap();
        stack.push_u32(2).unwrap();
        stack.push_u16(3).unwrap();
        stack.push_u64(4).unwrap();
        assert_eq!(stack.len(), 15);
        assert_eq!(stack.depth(), 4);

        assert_eq!(stack.pop_u64().unwrap(), 4);
        assert_eq!(stack.pop_u16().unwrap(), 3);
        assert_eq!(stack.pop_u32().unwrap(), 2);
        assert_eq!(stack.pop_u8().unwrap(), 1);
    }

    #[test]
    fn test_fill_to_capacity_then_overflow() {
        let mut stack = Stack::new(16).unwrap();
        for i in 0..16u8 {
            stack.push_u8(i).unwrap();
        }
        assert_eq!(stack.len(), 16);

        let err = stack.push_u8(0xFF).unwrap_err();
        assert!(matches!(
            err,
            VmError::StackOverflow {
                width: Width::W8,
                size: 16,
                capacity: 16
            }
        ));
        assert_eq!(stack.len(), 16);
        assert_eq!(stack.depth(), 16);
    }

    #[test]
    fn test_wide_push_does_not_partially_write() {
        let mut stack = Stack::new(6).unwrap();
        stack.push_u32(0xAABB_CCDD).unwrap();

        assert!(matches!(stack.push_u32(1), Err(VmError::StackOverflow { .. })));
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.pop_u32().unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn test_pop_empty_underflows() {
        let mut stack = Stack::new(8).unwrap();

        assert!(matches!(
            stack.pop_u8(),
            Err(VmError::StackUnderflow { width: Width::W8, size: 0 })
        ));
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_pop_wider_than_contents_underflows() {
        let mut stack = Stack::new(8).unwrap();
        stack.push_u16(7).unwrap();

        assert!(matches!(stack.pop_u32(), Err(VmError::StackUnderflow { .. })));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_width_mismatch_is_reported() {
        let mut stack = Stack::new(16).unwrap();
        stack.push_u8(1).unwrap();
        stack.push_u8(2).unwrap();

        let err = stack.pop_u16().unwrap_err();
        assert!(matches!(
            err,
            VmError::WidthMismatch {
                requested: Width::W16,
                found: Width::W8
            }
        ));
        assert!(err.is_stack_error());
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop_u8().unwrap(), 2);
    }

    #[test]
    fn test_unchecked_stack_reinterprets_bytes() {
        let mut stack = Stack::with_width_checks(16, false).unwrap();
        stack.push_u8(0x34).unwrap();
        stack.push_u8(0x12).unwrap();

        let expected = u16::from_ne_bytes([0x34, 0x12]);
        assert_eq!(stack.pop_u16().unwrap(), expected);
        assert!(stack.is_empty());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.top_width(), None);
    }

    #[test]
    fn test_unchecked_wide_pop_spans_values() {
        let mut stack = Stack::with_width_checks(16, false).unwrap();
        stack.push_u16(0x0505).unwrap();
        stack.push_u8(1).unwrap();
        stack.push_u8(2).unwrap();

        stack.pop_u16().unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top_width(), Some(Width::W16));
        assert_eq!(stack.to_string(), "stack cap=16 len=2 depth=1 top=[05 05]");
    }

    #[test]
    fn test_unchecked_narrow_pop_splits_value() {
        let mut stack = Stack::with_width_checks(16, false).unwrap();
        stack.push_u8(9).unwrap();
        stack.push_u64(7).unwrap();

        stack.pop_u8().unwrap();
        assert_eq!(stack.len(), 8);
        // 1 byte of the first value + 7 bytes left of the second as 4 + 2 + 1
        assert_eq!(stack.depth(), 4);
        assert_eq!(stack.top_width(), Some(Width::W8));

        stack.pop_u32().unwrap();
        stack.pop_u16().unwrap();
        stack.pop_u8().unwrap();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop_u8().unwrap(), 9);
        assert_eq!(stack.depth(), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_float_and_int_of_same_width_share_bits() {
        let mut stack = Stack::new(8).unwrap();
        stack.push_u32(0x3DF9_DB23).unwrap();

        let value = stack.pop_f32().unwrap();
        assert!((value - 0.122).abs() < 1e-6);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let mut stack = Stack::new(8).unwrap();
        stack.push_u16(0xBEEF).unwrap();

        assert_eq!(stack.peek::<u16>().unwrap(), 0xBEEF);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top_width(), Some(Width::W16));
    }

    #[test]
    fn test_display_dump() {
        let mut stack = Stack::new(512).unwrap();
        stack.push_u8(42).unwrap();

        assert_eq!(stack.to_string(), "stack cap=512 len=1 depth=1 top=[2a]");
        assert_eq!(stack.top_bytes(4), &[42]);
        assert_eq!(stack.capacity(), 512);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut stack = Stack::new(4).unwrap();
        stack.push_u32(9).unwrap();
        stack.clear();

        assert!(stack.is_empty());
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.capacity(), 4);
        stack.push_u32(10).unwrap();
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut stack = Stack::new(0).unwrap();
        assert!(matches!(stack.push_u8(1), Err(VmError::StackOverflow { .. })));
        assert!(matches!(stack.pop_u8(), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn test_huge_capacity_fails_to_allocate() {
        let result = Stack::new(usize::MAX);
        assert!(matches!(result, Err(VmError::AllocationFailure { .. })));
    }
}

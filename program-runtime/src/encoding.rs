//! Operand widths, byte order and scalar encoding
//!
//! Every value that crosses the code stream, the data segment or the operand
//! stack is one of six scalar types. [`Scalar`] ties each of them to a
//! [`Width`] and converts it to and from raw bytes in a given [`ByteOrder`].
//! Floats are always handled through their IEEE-754 bit pattern.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of an operand in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 1 byte
    W8,
    /// 2 bytes
    W16,
    /// 4 bytes
    W32,
    /// 8 bytes, the native word
    W64,
}

impl Width {
    /// Number of bytes occupied by an operand of this width
    pub const fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
            Width::W64 => 8,
        }
    }

    /// Width of the native word (`Load`, `Store`, `Const`, addresses and handles)
    pub const fn word() -> Self {
        Width::W64
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self {
            Width::W8 => "8",
            Width::W16 => "16",
            Width::W32 => "32",
            Width::W64 => "64",
        };
        write!(f, "{bits}-bit")
    }
}

/// Byte order used for immediates in the code stream and values in the data segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the host platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => f.write_str("little-endian"),
            ByteOrder::Big => f.write_str("big-endian"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width value that can live on the operand stack or in the data segment
///
/// The set of implementors is closed: `u8`, `u16`, `u32`, `u64`, `f32` and `f64`.
pub trait Scalar: Copy + sealed::Sealed {
    /// Width of the encoded value
    const WIDTH: Width;

    /// Writes the value into `out`, which must be exactly `WIDTH` bytes long
    fn encode(self, order: ByteOrder, out: &mut [u8]);

    /// Reads a value from `bytes`, which must be exactly `WIDTH` bytes long
    fn decode(order: ByteOrder, bytes: &[u8]) -> Self;

    /// Truncates a raw 64-bit immediate to this width
    fn from_immediate(raw: u64) -> Self;
}

macro_rules! impl_scalar_int {
    ($($ty:ty => $width:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                const WIDTH: Width = $width;

                fn encode(self, order: ByteOrder, out: &mut [u8]) {
                    let bytes = match order {
                        ByteOrder::Little => self.to_le_bytes(),
                        ByteOrder::Big => self.to_be_bytes(),
                    };
                    out.copy_from_slice(&bytes);
                }

                fn decode(order: ByteOrder, bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    match order {
                        ByteOrder::Little => <$ty>::from_le_bytes(buf),
                        ByteOrder::Big => <$ty>::from_be_bytes(buf),
                    }
                }

                #[allow(clippy::cast_possible_truncation)]
                fn from_immediate(raw: u64) -> Self {
                    raw as $ty
                }
            }
        )*
    };
}

impl_scalar_int! {
    u8 => Width::W8,
    u16 => Width::W16,
    u32 => Width::W32,
    u64 => Width::W64,
}

macro_rules! impl_scalar_float {
    ($($ty:ty => $bits:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                const WIDTH: Width = <$bits as Scalar>::WIDTH;

                fn encode(self, order: ByteOrder, out: &mut [u8]) {
                    self.to_bits().encode(order, out)
                }

                fn decode(order: ByteOrder, bytes: &[u8]) -> Self {
                    <$ty>::from_bits(<$bits>::decode(order, bytes))
                }

                fn from_immediate(raw: u64) -> Self {
                    <$ty>::from_bits(<$bits>::from_immediate(raw))
                }
            }
        )*
    };
}

impl_scalar_float! {
    f32 => u32,
    f64 => u64,
}

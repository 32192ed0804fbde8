//! Data segment access
//!
//! Translates a VM address popped from the stack into a host slice of the
//! data segment. Addresses are plain byte offsets; no alignment is enforced.
//! Every access is bounds checked against its full width before any byte is
//! read or written.

use crate::{
    encoding::{ByteOrder, Scalar, Width},
    error::{Result, VmError},
};

/// Resolves `address..address + width` to an offset range inside a segment of `len` bytes
fn translate_range(len: usize, address: u64, width: Width) -> Result<std::ops::Range<usize>> {
    let out_of_bounds = || VmError::OutOfBounds {
        address,
        width,
        len,
    };

    let start = usize::try_from(address).map_err(|_| out_of_bounds())?;
    let end = start
        .checked_add(width.bytes())
        .filter(|end| *end <= len)
        .ok_or_else(out_of_bounds)?;
    Ok(start..end)
}

/// Translate a VM address to a host slice of `width` bytes (immutable)
///
/// # Errors
/// Returns [`VmError::OutOfBounds`] if any byte of the access lies outside `data`.
pub fn translate_slice(data: &[u8], address: u64, width: Width) -> Result<&[u8]> {
    let range = translate_range(data.len(), address, width)?;
    Ok(&data[range])
}

/// Translate a VM address to a host slice of `width` bytes (mutable)
///
/// # Errors
/// Returns [`VmError::OutOfBounds`] if any byte of the access lies outside `data`.
pub fn translate_slice_mut(data: &mut [u8], address: u64, width: Width) -> Result<&mut [u8]> {
    let range = translate_range(data.len(), address, width)?;
    Ok(&mut data[range])
}

/// Reads a scalar stored at `address` in `order`
pub fn read<T: Scalar>(data: &[u8], address: u64, order: ByteOrder) -> Result<T> {
    let bytes = translate_slice(data, address, T::WIDTH)?;
    Ok(T::decode(order, bytes))
}

/// Writes a scalar at `address` in `order`
pub fn write<T: Scalar>(data: &mut [u8], address: u64, value: T, order: ByteOrder) -> Result<()> {
    let bytes = translate_slice_mut(data, address, T::WIDTH)?;
    value.encode(order, bytes);
    Ok(())
}

//! flvm SDK for building programs on the host
//!
//! Programs have no text format; hosts emit code and data directly. This
//! crate provides the two encoders for that: [`ProgramBuilder`] for the
//! code segment and [`DataBuilder`] for constant data.
//!
//! # Example
//!
//! ```rust
//! use flvm_program_runtime::ByteOrder;
//! use flvm_sdk::{DataBuilder, ProgramBuilder};
//!
//! let order = ByteOrder::Little;
//!
//! let mut data = DataBuilder::new(order);
//! let value = data.offset();
//! data.f32(0.122);
//!
//! let mut program = ProgramBuilder::new(order);
//! program.address(value).load32().syscall(4);
//!
//! let image = program.into_image(data);
//! assert!(image.validate().is_ok());
//! ```

#![warn(missing_docs)]

pub mod data;
pub mod program;

// Re-export commonly used items
pub use data::DataBuilder;
pub use program::ProgramBuilder;

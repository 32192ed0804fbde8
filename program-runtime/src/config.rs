//! Engine configuration

use crate::encoding::ByteOrder;
use serde::{Deserialize, Serialize};

/// Engine configuration
///
/// Construct with struct update syntax to override individual fields:
///
/// ```rust
/// use flvm_program_runtime::{ByteOrder, Config};
///
/// let config = Config {
///     stack_capacity: 4096,
///     byte_order: ByteOrder::Big,
///     ..Config::default()
/// };
/// assert_eq!(config.max_instructions, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Operand stack capacity in bytes
    pub stack_capacity: usize,

    /// Byte order of immediates in the code stream and values in the data segment
    pub byte_order: ByteOrder,

    /// Maximum number of instructions a single `exec` may retire (`None` = unbounded)
    pub max_instructions: Option<u64>,

    /// Maximum number of live bytes handed out by the default `Save` allocator
    pub heap_limit: u64,

    /// Reject pops whose width differs from the width of the top value
    pub check_widths: bool,
}

impl Config {
    /// Default operand stack capacity in bytes
    pub const DEFAULT_STACK_CAPACITY: usize = 512;

    /// Default heap limit (64 KiB)
    pub const DEFAULT_HEAP_LIMIT: u64 = 65_536;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack_capacity: Self::DEFAULT_STACK_CAPACITY,
            byte_order: ByteOrder::native(),
            max_instructions: None,
            heap_limit: Self::DEFAULT_HEAP_LIMIT,
            check_widths: true,
        }
    }
}

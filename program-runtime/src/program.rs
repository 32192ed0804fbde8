//! Program images
//!
//! The engine itself only borrows a code buffer and a data buffer. A
//! [`ProgramImage`] is the owned form tooling uses to keep both together
//! with the byte order they were encoded in, and to persist them with
//! bincode.

use crate::{
    encoding::ByteOrder,
    error::{Result, VmError},
    opcode::{Instruction, Instructions},
};
use serde::{Deserialize, Serialize};

/// Magic prefix of a serialized image
pub const IMAGE_MAGIC: [u8; 4] = *b"FLVM";

/// Version of the serialized image layout
pub const IMAGE_VERSION: u16 = 1;

/// Owned code and data buffers of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramImage {
    /// Byte order of immediates and data
    pub byte_order: ByteOrder,
    /// Encoded instructions
    pub code: Vec<u8>,
    /// Initial contents of the data segment
    pub data: Vec<u8>,
}

/// Serialized form: magic and version ahead of the image
#[derive(Serialize, Deserialize)]
struct ImageFile {
    magic: [u8; 4],
    version: u16,
    image: ProgramImage,
}

impl ProgramImage {
    /// Creates an image from its parts
    pub fn new(byte_order: ByteOrder, code: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            byte_order,
            code,
            data,
        }
    }

    /// Serializes the image with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let file = ImageFile {
            magic: IMAGE_MAGIC,
            version: IMAGE_VERSION,
            image: self.clone(),
        };
        Ok(bincode::serialize(&file)?)
    }

    /// Deserializes an image produced by [`ProgramImage::to_bytes`]
    ///
    /// # Errors
    /// [`VmError::InvalidImage`] if the bytes are malformed, carry the wrong
    /// magic or an unsupported version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: ImageFile = bincode::deserialize(bytes)?;
        if file.magic != IMAGE_MAGIC {
            return Err(VmError::InvalidImage(format!(
                "bad magic {:02x?}",
                file.magic
            )));
        }
        if file.version != IMAGE_VERSION {
            return Err(VmError::InvalidImage(format!(
                "unsupported version {} (expected {})",
                file.version, IMAGE_VERSION
            )));
        }
        Ok(file.image)
    }

    /// Decodes every instruction of the code buffer
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.code, self.byte_order)
    }

    /// Checks that the code is non-empty and decodes cleanly
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(VmError::InvalidArgument("program has no code"));
        }
        self.instructions()
            .try_for_each(|insn| insn.map(|_: Instruction| ()))
    }

    /// Human-readable listing of the code, one instruction per line
    ///
    /// Decoding stops at the first invalid instruction, which is reported
    /// on the last line.
    pub fn disassemble(&self) -> String {
        let mut listing = String::new();
        for insn in self.instructions() {
            match insn {
                Ok(insn) => listing.push_str(&format!("{insn}\n")),
                Err(err) => listing.push_str(&format!("error: {err}\n")),
            }
        }
        listing
    }
}

//! Assembler, disassembler and program images.
//!
//! This module provides:
//! - A two-pass assembler (text → program words)
//! - A disassembler (program words → readable text)
//! - A plain-text hex image format for storing assembled programs

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_word};
pub use image::{ImageFile, ImageError, load_image, save_image};

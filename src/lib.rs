//! # gate16
//!
//! A gate-level emulator of a small 16-bit register machine.
//!
//! The machine pairs a Hack-style ALU (zero/negate inputs, add-or-AND,
//! negate output) built from ripple-carry adders with a fetch-decode-execute
//! engine, 400 words of memory with one character output port, and a
//! hardware call/return stack.

pub mod alu;
pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use alu::{AluControl, AluFunction, AluStatus, Word};
pub use cpu::{Cpu, CpuState, CpuError, HaltReason, Memory, Registers, Instruction, Opcode, Snapshot};
pub use cpu::decode::{decode, decode_fields, encode};
pub use asm::{assemble, disassemble, AssemblerError, ImageFile, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;

//! CPU emulation.
//!
//! This module implements the complete machine:
//! - 400 sixteen-bit memory words, address 32 doubling as an output port
//! - 8 general registers, a downward-growing stack pointer, IP and flags
//! - 15-instruction set in a fixed `[opcode:4][reg1:3][reg2:3][imm:6]` word

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod dump;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState, HaltReason};
pub use dump::Snapshot;

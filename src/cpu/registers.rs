//! Register file.
//!
//! - R0-R7: general-purpose 16-bit registers
//! - SP: stack pointer, starts at 399 and grows downward
//! - IP: instruction pointer, advanced on every fetch
//! - IR: the last fetched instruction word
//! - flags: the last observed status (zr, ng, ov, cy)

use crate::alu::{AluStatus, Word};
use serde::{Serialize, Deserialize};

/// Number of general-purpose registers.
pub const GPR_COUNT: usize = 8;

/// Initial stack pointer; the stack is empty when SP is here.
pub const STACK_TOP: Word = 399;

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// General-purpose registers R0-R7
    pub gpr: [Word; GPR_COUNT],

    /// Stack pointer
    pub sp: Word,

    /// Instruction pointer
    pub ip: Word,

    /// Instruction register
    pub ir: Word,

    /// Status flags
    pub flags: AluStatus,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            gpr: [0; GPR_COUNT],
            sp: 0,
            ip: 0,
            ir: 0,
            flags: AluStatus::default(),
        }
    }

    /// Reset to the post-load state: zeroed, SP at the top of the stack.
    pub fn reset(&mut self) {
        *self = Self::new();
        self.sp = STACK_TOP;
    }

    /// Read a general-purpose register. The index is masked to 3 bits.
    #[inline]
    pub fn get(&self, index: u8) -> Word {
        self.gpr[(index & 0x7) as usize]
    }

    /// Write a general-purpose register. The index is masked to 3 bits.
    #[inline]
    pub fn set(&mut self, index: u8, value: Word) {
        self.gpr[(index & 0x7) as usize] = value;
    }

    /// Increment the instruction pointer by 1.
    /// Returns the old value.
    pub fn advance_ip(&mut self) -> Word {
        let old = self.ip;
        self.ip = self.ip.wrapping_add(1);
        old
    }

    /// Set the instruction pointer to an absolute address.
    pub fn jump(&mut self, addr: Word) {
        self.ip = addr;
    }

    /// Whether the stack holds no return addresses.
    pub fn stack_empty(&self) -> bool {
        self.sp >= STACK_TOP
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

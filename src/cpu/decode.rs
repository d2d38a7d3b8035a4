//! Instruction decoder and encoder.
//!
//! Every instruction is one 16-bit word with fixed fields:
//!
//! ```text
//!  15    12 11   9 8    6 5        0
//! [ opcode ][ reg1 ][ reg2 ][   imm   ]
//! ```
//!
//! The immediate is an unsigned 6-bit value with no sign extension.

use crate::alu::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Instruction opcodes. Value 15 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    Mov = 1,
    Add = 2,
    Sub = 3,
    And = 4,
    Or = 5,
    Mul = 6,
    Div = 7,
    Jmp = 8,
    Jz = 9,
    Call = 10,
    Ret = 11,
    Halt = 12,
    Load = 13,
    Store = 14,
}

impl Opcode {
    /// All defined opcodes, in numeric order.
    pub const ALL: [Opcode; 15] = [
        Opcode::Nop,
        Opcode::Mov,
        Opcode::Add,
        Opcode::Sub,
        Opcode::And,
        Opcode::Or,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Jmp,
        Opcode::Jz,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Halt,
        Opcode::Load,
        Opcode::Store,
    ];

    /// Look up an opcode by its 4-bit value.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Halt => "HALT",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

/// The raw bit fields of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fields {
    pub opcode: u8,
    pub reg1: u8,
    pub reg2: u8,
    pub imm: u8,
}

/// Split a word into its bit fields.
#[inline]
pub const fn decode_fields(word: Word) -> Fields {
    Fields {
        opcode: ((word >> 12) & 0xF) as u8,
        reg1: ((word >> 9) & 0x7) as u8,
        reg2: ((word >> 6) & 0x7) as u8,
        imm: (word & 0x3F) as u8,
    }
}

/// Pack fields into a word, masking each to its width first.
#[inline]
pub const fn encode(opcode: u8, reg1: u8, reg2: u8, imm: u8) -> Word {
    ((opcode as Word & 0xF) << 12)
        | ((reg1 as Word & 0x7) << 9)
        | ((reg2 as Word & 0x7) << 6)
        | (imm as Word & 0x3F)
}

/// A decoded instruction.
///
/// Register operands are indices 0-7; `imm`/`target` are 0-63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// No operation
    Nop,

    /// `rd := imm`
    Mov { rd: u8, imm: u8 },

    /// `rd := rd + imm` through the ALU
    Add { rd: u8, imm: u8 },

    /// `rd := rd - imm`, plain wraparound subtraction
    Sub { rd: u8, imm: u8 },

    /// `rd := rd & rs`
    And { rd: u8, rs: u8 },

    /// `rd := rd | rs`
    Or { rd: u8, rs: u8 },

    /// `rd := rd * rs` through the ALU
    Mul { rd: u8, rs: u8 },

    /// `rd := rd / rs`, halts on a zero divisor
    Div { rd: u8, rs: u8 },

    /// `IP := target`
    Jmp { target: u8 },

    /// `if zr then IP := target`
    Jz { target: u8 },

    /// Push IP, `IP := target`
    Call { target: u8 },

    /// Pop IP
    Ret,

    /// Stop the machine
    Halt,

    /// `rd := mem[rs]`
    Load { rd: u8, rs: u8 },

    /// `mem[rs] := rd`
    Store { rd: u8, rs: u8 },
}

impl Instruction {
    /// The opcode of this instruction.
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Mov { .. } => Opcode::Mov,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::And { .. } => Opcode::And,
            Instruction::Or { .. } => Opcode::Or,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Div { .. } => Opcode::Div,
            Instruction::Jmp { .. } => Opcode::Jmp,
            Instruction::Jz { .. } => Opcode::Jz,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Ret => Opcode::Ret,
            Instruction::Halt => Opcode::Halt,
            Instruction::Load { .. } => Opcode::Load,
            Instruction::Store { .. } => Opcode::Store,
        }
    }

    /// The bit fields of this instruction. Unused fields are zero.
    pub const fn fields(&self) -> Fields {
        let (reg1, reg2, imm) = match *self {
            Instruction::Nop | Instruction::Ret | Instruction::Halt => (0, 0, 0),
            Instruction::Mov { rd, imm }
            | Instruction::Add { rd, imm }
            | Instruction::Sub { rd, imm } => (rd, 0, imm),
            Instruction::And { rd, rs }
            | Instruction::Or { rd, rs }
            | Instruction::Mul { rd, rs }
            | Instruction::Div { rd, rs }
            | Instruction::Load { rd, rs }
            | Instruction::Store { rd, rs } => (rd, rs, 0),
            Instruction::Jmp { target }
            | Instruction::Jz { target }
            | Instruction::Call { target } => (0, 0, target),
        };
        Fields {
            opcode: self.opcode() as u8,
            reg1,
            reg2,
            imm,
        }
    }

    /// Encode to an instruction word.
    pub const fn encode(&self) -> Word {
        let f = self.fields();
        encode(f.opcode, f.reg1, f.reg2, f.imm)
    }
}

/// Decode an instruction word.
///
/// Operand fields an instruction does not use are ignored.
pub fn decode(word: Word) -> Result<Instruction, DecodeError> {
    let Fields { opcode, reg1, reg2, imm } = decode_fields(word);
    let op = Opcode::from_u8(opcode).ok_or(DecodeError::UnimplementedOpcode(opcode))?;

    let instruction = match op {
        Opcode::Nop => Instruction::Nop,
        Opcode::Mov => Instruction::Mov { rd: reg1, imm },
        Opcode::Add => Instruction::Add { rd: reg1, imm },
        Opcode::Sub => Instruction::Sub { rd: reg1, imm },
        Opcode::And => Instruction::And { rd: reg1, rs: reg2 },
        Opcode::Or => Instruction::Or { rd: reg1, rs: reg2 },
        Opcode::Mul => Instruction::Mul { rd: reg1, rs: reg2 },
        Opcode::Div => Instruction::Div { rd: reg1, rs: reg2 },
        Opcode::Jmp => Instruction::Jmp { target: imm },
        Opcode::Jz => Instruction::Jz { target: imm },
        Opcode::Call => Instruction::Call { target: imm },
        Opcode::Ret => Instruction::Ret,
        Opcode::Halt => Instruction::Halt,
        Opcode::Load => Instruction::Load { rd: reg1, rs: reg2 },
        Opcode::Store => Instruction::Store { rd: reg1, rs: reg2 },
    };

    Ok(instruction)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unimplemented instruction: opcode {0}")]
    UnimplementedOpcode(u8),
}

//! ALU control bits and the functions they select.

use serde::{Deserialize, Serialize};

use super::Word;

/// The six ALU control inputs.
///
/// Preprocessing order is fixed: zero first, then complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AluControl {
    /// Zero the x input.
    pub zx: bool,
    /// Complement the x input (after zeroing).
    pub nx: bool,
    /// Zero the y input.
    pub zy: bool,
    /// Complement the y input (after zeroing).
    pub ny: bool,
    /// Function: add when set, AND when clear.
    pub f: bool,
    /// Complement the output.
    pub no: bool,
}

impl AluControl {
    /// Split a 6-bit control code `zx nx zy ny f no` (bit 5 down to bit 0).
    pub const fn from_code(code: u8) -> Self {
        Self {
            zx: code & 0b100000 != 0,
            nx: code & 0b010000 != 0,
            zy: code & 0b001000 != 0,
            ny: code & 0b000100 != 0,
            f: code & 0b000010 != 0,
            no: code & 0b000001 != 0,
        }
    }

    /// Concatenate the control bits into a 6-bit code.
    pub const fn code(self) -> u8 {
        (self.zx as u8) << 5
            | (self.nx as u8) << 4
            | (self.zy as u8) << 3
            | (self.ny as u8) << 2
            | (self.f as u8) << 1
            | self.no as u8
    }

    /// Apply the zero/complement stage to both operands.
    pub fn preprocess(self, x: Word, y: Word) -> (Word, Word) {
        let mut x = if self.zx { 0 } else { x };
        let mut y = if self.zy { 0 } else { y };
        if self.nx {
            x = !x;
        }
        if self.ny {
            y = !y;
        }
        (x, y)
    }

    /// Look up the function this control code selects.
    pub fn function(self) -> Option<AluFunction> {
        AluFunction::from_code(self.code())
    }
}

/// Every function the ALU implements, keyed by its control code.
///
/// The first eighteen are the classic Hack ALU table. `Mul` and `Div`
/// are extensions and bypass the zero/complement datapath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AluFunction {
    Zero = 0b101010,
    One = 0b111111,
    MinusOne = 0b111010,
    X = 0b001100,
    Y = 0b110000,
    NotX = 0b001101,
    NotY = 0b110001,
    NegX = 0b001111,
    NegY = 0b110011,
    IncX = 0b011111,
    IncY = 0b110111,
    DecX = 0b001110,
    DecY = 0b110010,
    Add = 0b000010,
    SubXY = 0b010011,
    SubYX = 0b000111,
    And = 0b000000,
    Or = 0b010101,
    Mul = 0b111100,
    Div = 0b111101,
}

impl AluFunction {
    /// All defined functions.
    pub const ALL: [AluFunction; 20] = [
        AluFunction::Zero,
        AluFunction::One,
        AluFunction::MinusOne,
        AluFunction::X,
        AluFunction::Y,
        AluFunction::NotX,
        AluFunction::NotY,
        AluFunction::NegX,
        AluFunction::NegY,
        AluFunction::IncX,
        AluFunction::IncY,
        AluFunction::DecX,
        AluFunction::DecY,
        AluFunction::Add,
        AluFunction::SubXY,
        AluFunction::SubYX,
        AluFunction::And,
        AluFunction::Or,
        AluFunction::Mul,
        AluFunction::Div,
    ];

    /// Find the function for an exact control code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|function| function.code() == code)
    }

    /// The 6-bit control code selecting this function.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The control bits selecting this function.
    pub const fn control(self) -> AluControl {
        AluControl::from_code(self.code())
    }

    /// Short symbolic form, e.g. `x+y`.
    pub const fn symbol(self) -> &'static str {
        match self {
            AluFunction::Zero => "0",
            AluFunction::One => "1",
            AluFunction::MinusOne => "-1",
            AluFunction::X => "x",
            AluFunction::Y => "y",
            AluFunction::NotX => "!x",
            AluFunction::NotY => "!y",
            AluFunction::NegX => "-x",
            AluFunction::NegY => "-y",
            AluFunction::IncX => "x+1",
            AluFunction::IncY => "y+1",
            AluFunction::DecX => "x-1",
            AluFunction::DecY => "y-1",
            AluFunction::Add => "x+y",
            AluFunction::SubXY => "x-y",
            AluFunction::SubYX => "y-x",
            AluFunction::And => "x&y",
            AluFunction::Or => "x|y",
            AluFunction::Mul => "x*y",
            AluFunction::Div => "x/y",
        }
    }
}

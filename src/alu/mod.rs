//! The 16-bit arithmetic-logic unit.
//!
//! The ALU is purely combinational. It is built from:
//! - [`gates`] - one-bit full adders chained into a ripple-carry adder,
//!   plus word-wide AND/NOT gates
//! - [`control`] - the six control bits (zx, nx, zy, ny, f, no) and the
//!   table of functions they select
//! - [`compute`] - the unit itself, producing a result word and status flags

pub mod gates;
mod control;
mod compute;

pub use control::{AluControl, AluFunction};
pub use compute::{compute, AluDiagnostic, AluError, AluOutput, AluStatus};

/// A machine word: 16 bits, arithmetic modulo 2^16.
pub type Word = u16;

/// Number of bits in a [`Word`].
pub const WORD_BITS: u32 = 16;

/// Mask for the sign bit of a [`Word`].
pub const SIGN_BIT: Word = 1 << (WORD_BITS - 1);

//! Bit-serial gate models used by the ALU datapath.
//!
//! Words are processed one bit position at a time, the way a hardware
//! adder or gate array would see them, rather than with native wide
//! arithmetic.

use super::{Word, WORD_BITS};

/// Read bit `index` of a word.
#[inline]
pub const fn bit(word: Word, index: u32) -> bool {
    (word >> index) & 1 == 1
}

/// A one-bit full adder, returning `(sum, carry_out)`.
#[inline]
pub const fn full_add(a: bool, b: bool, carry_in: bool) -> (bool, bool) {
    let sum = a ^ b ^ carry_in;
    let carry = (a & b) | (a & carry_in) | (b & carry_in);
    (sum, carry)
}

/// Add two words with a 16-stage ripple-carry adder.
///
/// Returns `(sum, carry_out)`, where `carry_out` is the carry leaving
/// bit 15.
pub fn ripple_add(a: Word, b: Word) -> (Word, bool) {
    let mut sum: Word = 0;
    let mut carry = false;

    for i in 0..WORD_BITS {
        let (sum_bit, carry_out) = full_add(bit(a, i), bit(b, i), carry);
        sum |= (sum_bit as Word) << i;
        carry = carry_out;
    }

    (sum, carry)
}

/// Bitwise AND, one gate per bit position.
pub fn and_word(a: Word, b: Word) -> Word {
    let mut result: Word = 0;
    for i in 0..WORD_BITS {
        result |= ((bit(a, i) & bit(b, i)) as Word) << i;
    }
    result
}

/// Bitwise NOT, one inverter per bit position.
pub fn not_word(a: Word) -> Word {
    let mut result: Word = 0;
    for i in 0..WORD_BITS {
        result |= ((!bit(a, i)) as Word) << i;
    }
    result
}

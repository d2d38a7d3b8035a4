//! The ALU proper: control decoding, function evaluation and flags.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gates::{and_word, not_word, ripple_add};
use super::{AluControl, AluFunction, Word, SIGN_BIT};

/// Status flags describing the last result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AluStatus {
    /// Result was zero.
    pub zr: bool,
    /// Bit 15 of the result was set.
    pub ng: bool,
    /// Signed overflow (formula depends on the function).
    pub ov: bool,
    /// Carry out for additions, borrow for subtractions.
    pub cy: bool,
}

impl AluStatus {
    /// Recompute `zr` and `ng` from a result, leaving `ov` and `cy` alone.
    #[inline]
    pub fn set_result(&mut self, result: Word) {
        self.zr = result == 0;
        self.ng = result & SIGN_BIT != 0;
    }
}

/// Non-fatal conditions the ALU reports alongside a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum AluDiagnostic {
    /// Divide function with a zero divisor; the quotient is undefined.
    #[error("division by zero, quotient undefined")]
    DivisionByZero,
}

/// One evaluation of the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub result: Word,
    pub status: AluStatus,
    pub diagnostic: Option<AluDiagnostic>,
}

/// Errors the ALU can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("unimplemented ALU control code 0b{0:06b}")]
    UnimplementedCode(u8),
}

/// Evaluate the ALU for operands `x`, `y` under the given control bits.
///
/// Datapath functions run through zero/complement preprocessing, an
/// add-or-AND stage and optional output complement; this yields the
/// function named by the code. Carry and overflow are then derived per
/// function from the unmodified operands:
/// - `x+1`, `y+1`, `x+y`: carry out of the ripple-carry adder
/// - `x+y`: overflow is true signed overflow (equal operand signs, result
///   sign differs). The strict `> 0`/`< 0` sign formula used for the
///   subtractions would miss `0x8000 + 0x8000`, which wraps to zero; here
///   that input reports overflow.
/// - `x-y`, `y-x`: carry means a signed borrow (`minuend < subtrahend`)
/// - `x*y`: carry and overflow set when the 32-bit product exceeds 0xFFFF
/// - `x/y`: unsigned quotient; a zero divisor gives 0 with overflow set
///   and an [`AluDiagnostic::DivisionByZero`]
pub fn compute(x: Word, y: Word, control: AluControl) -> Result<AluOutput, AluError> {
    let function = control
        .function()
        .ok_or(AluError::UnimplementedCode(control.code()))?;

    let mut status = AluStatus::default();
    let mut diagnostic = None;

    let result = match function {
        AluFunction::Mul => {
            let product = u32::from(x) * u32::from(y);
            status.cy = product > 0xFFFF;
            status.ov = status.cy;
            product as Word
        }
        AluFunction::Div => {
            if y == 0 {
                log::warn!("ALU divide by zero: {:#06x} / 0", x);
                status.ov = true;
                diagnostic = Some(AluDiagnostic::DivisionByZero);
                0
            } else {
                x / y
            }
        }
        _ => {
            let result = datapath(x, y, control);
            match function {
                AluFunction::IncX => status.cy = ripple_add(x, 1).1,
                AluFunction::IncY => status.cy = ripple_add(y, 1).1,
                AluFunction::Add => {
                    status.cy = ripple_add(x, y).1;
                    status.ov = add_overflow(x, y, result);
                }
                AluFunction::SubXY => {
                    status.cy = (x as i16) < (y as i16);
                    status.ov = sub_overflow(x, y, result);
                }
                AluFunction::SubYX => {
                    status.cy = (y as i16) < (x as i16);
                    status.ov = sub_overflow(y, x, result);
                }
                _ => {}
            }
            result
        }
    };

    status.set_result(result);

    Ok(AluOutput {
        result,
        status,
        diagnostic,
    })
}

/// zx/nx/zy/ny preprocessing, then add (f=1) or AND (f=0), then `no`.
fn datapath(x: Word, y: Word, control: AluControl) -> Word {
    let (x, y) = control.preprocess(x, y);
    let out = if control.f {
        ripple_add(x, y).0
    } else {
        and_word(x, y)
    };
    if control.no {
        not_word(out)
    } else {
        out
    }
}

/// Operands of equal sign producing a result of the other sign.
fn add_overflow(x: Word, y: Word, result: Word) -> bool {
    let (sx, sy, sr) = (x as i16, y as i16, result as i16);
    (sx < 0) == (sy < 0) && (sr < 0) != (sx < 0)
}

/// `a - b` overflow: `(a>0, b<0, r<0)` or `(a<0, b>0, r>0)`.
fn sub_overflow(a: Word, b: Word, result: Word) -> bool {
    let (sa, sb, sr) = (a as i16, b as i16, result as i16);
    (sa > 0 && sb < 0 && sr < 0) || (sa < 0 && sb > 0 && sr > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(function: AluFunction, x: Word, y: Word) -> AluOutput {
        compute(x, y, function.control()).unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(run(AluFunction::Zero, 123, 456).result, 0);
        assert_eq!(run(AluFunction::One, 123, 456).result, 1);
        assert_eq!(run(AluFunction::MinusOne, 123, 456).result, 0xFFFF);
    }

    #[test]
    fn test_datapath_functions() {
        let (x, y) = (1000, 37);
        assert_eq!(run(AluFunction::X, x, y).result, x);
        assert_eq!(run(AluFunction::Y, x, y).result, y);
        assert_eq!(run(AluFunction::NotX, x, y).result, !x);
        assert_eq!(run(AluFunction::NotY, x, y).result, !y);
        assert_eq!(run(AluFunction::NegX, x, y).result, x.wrapping_neg());
        assert_eq!(run(AluFunction::NegY, x, y).result, y.wrapping_neg());
        assert_eq!(run(AluFunction::IncX, x, y).result, x + 1);
        assert_eq!(run(AluFunction::IncY, x, y).result, y + 1);
        assert_eq!(run(AluFunction::DecX, x, y).result, x - 1);
        assert_eq!(run(AluFunction::DecY, x, y).result, y - 1);
        assert_eq!(run(AluFunction::Add, x, y).result, x + y);
        assert_eq!(run(AluFunction::SubXY, x, y).result, x - y);
        assert_eq!(run(AluFunction::SubYX, x, y).result, y.wrapping_sub(x));
        assert_eq!(run(AluFunction::And, x, y).result, x & y);
        assert_eq!(run(AluFunction::Or, x, y).result, x | y);
    }

    #[test]
    fn test_add_flags() {
        let out = run(AluFunction::Add, 0xFFFF, 1);
        assert_eq!(out.result, 0);
        assert!(out.status.zr);
        assert!(out.status.cy);
        assert!(!out.status.ov);

        let out = run(AluFunction::Add, 0x7FFF, 1);
        assert_eq!(out.result, 0x8000);
        assert!(out.status.ng);
        assert!(out.status.ov);
        assert!(!out.status.cy);

        let out = run(AluFunction::Add, 0x8000, 0x8000);
        assert!(out.status.ov);
        assert!(out.status.cy);
        assert!(out.status.zr);
    }

    #[test]
    fn test_increment_carry() {
        assert!(run(AluFunction::IncX, 0xFFFF, 0).status.cy);
        assert!(!run(AluFunction::IncX, 5, 0).status.cy);
        assert!(run(AluFunction::IncY, 0, 0xFFFF).status.cy);
    }

    #[test]
    fn test_subtract_borrow_is_signed_comparison() {
        let out = run(AluFunction::SubXY, 3, 5);
        assert_eq!(out.result, 0xFFFE);
        assert!(out.status.cy);
        assert!(out.status.ng);

        // -1 - 1: signed borrow even though 0xFFFF > 1 unsigned
        let out = run(AluFunction::SubXY, 0xFFFF, 1);
        assert!(out.status.cy);

        // 1 - (-1): no signed borrow even though 1 < 0xFFFF unsigned
        let out = run(AluFunction::SubXY, 1, 0xFFFF);
        assert_eq!(out.result, 2);
        assert!(!out.status.cy);

        let out = run(AluFunction::SubYX, 3, 5);
        assert_eq!(out.result, 2);
        assert!(!out.status.cy);
    }

    #[test]
    fn test_subtract_overflow() {
        // 32767 - (-1) wraps negative
        let out = run(AluFunction::SubXY, 0x7FFF, 0xFFFF);
        assert!(out.status.ov);

        // (-32768) - 1 wraps positive
        let out = run(AluFunction::SubXY, 0x8000, 1);
        assert!(out.status.ov);

        let out = run(AluFunction::SubYX, 1, 0x8000);
        assert!(out.status.ov);

        assert!(!run(AluFunction::SubXY, 10, 3).status.ov);
    }

    #[test]
    fn test_multiply() {
        let out = run(AluFunction::Mul, 300, 200);
        assert_eq!(out.result, 60000);
        assert!(!out.status.cy);
        assert!(!out.status.ov);

        let out = run(AluFunction::Mul, 0x100, 0x100);
        assert_eq!(out.result, 0);
        assert!(out.status.cy);
        assert!(out.status.ov);
        assert!(out.status.zr);
    }

    #[test]
    fn test_divide() {
        let out = run(AluFunction::Div, 100, 7);
        assert_eq!(out.result, 14);
        assert_eq!(out.diagnostic, None);
        assert!(!out.status.ov);
    }

    #[test]
    fn test_divide_by_zero_is_not_fatal() {
        let out = run(AluFunction::Div, 100, 0);
        assert_eq!(out.result, 0);
        assert!(out.status.ov);
        assert!(!out.status.cy);
        assert!(out.status.zr);
        assert_eq!(out.diagnostic, Some(AluDiagnostic::DivisionByZero));
    }

    #[test]
    fn test_unimplemented_code() {
        let err = compute(1, 2, AluControl::from_code(0b000001)).unwrap_err();
        assert_eq!(err, AluError::UnimplementedCode(0b000001));
    }

    #[test]
    fn test_logic_clears_carry_and_overflow() {
        let out = run(AluFunction::Or, 0x8000, 0x0001);
        assert_eq!(out.result, 0x8001);
        assert!(out.status.ng);
        assert!(!out.status.cy);
        assert!(!out.status.ov);
    }
}

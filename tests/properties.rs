//! Randomized checks of the ALU, the instruction encoding and memory bounds.

use gate16::alu::{compute, AluControl, AluDiagnostic, AluError};
use gate16::cpu::decode::Fields;
use gate16::cpu::memory::MEMORY_SIZE;
use gate16::{decode_fields, encode, AluFunction, Memory, Word};
use proptest::prelude::*;

fn expected(function: AluFunction, x: Word, y: Word) -> Word {
    match function {
        AluFunction::Zero => 0,
        AluFunction::One => 1,
        AluFunction::MinusOne => 0xFFFF,
        AluFunction::X => x,
        AluFunction::Y => y,
        AluFunction::NotX => !x,
        AluFunction::NotY => !y,
        AluFunction::NegX => x.wrapping_neg(),
        AluFunction::NegY => y.wrapping_neg(),
        AluFunction::IncX => x.wrapping_add(1),
        AluFunction::IncY => y.wrapping_add(1),
        AluFunction::DecX => x.wrapping_sub(1),
        AluFunction::DecY => y.wrapping_sub(1),
        AluFunction::Add => x.wrapping_add(y),
        AluFunction::SubXY => x.wrapping_sub(y),
        AluFunction::SubYX => y.wrapping_sub(x),
        AluFunction::And => x & y,
        AluFunction::Or => x | y,
        AluFunction::Mul => x.wrapping_mul(y),
        AluFunction::Div => x.checked_div(y).unwrap_or(0),
    }
}

fn any_function() -> impl Strategy<Value = AluFunction> {
    prop::sample::select(AluFunction::ALL.to_vec())
}

proptest! {
    #[test]
    fn add_matches_native(x in any::<u16>(), y in any::<u16>()) {
        let out = compute(x, y, AluFunction::Add.control()).unwrap();
        let (sum, carry) = x.overflowing_add(y);

        prop_assert_eq!(out.result, sum);
        prop_assert_eq!(out.status.cy, carry);
        prop_assert_eq!(out.status.ov, (x as i16).overflowing_add(y as i16).1);
        prop_assert_eq!(out.status.zr, sum == 0);
        prop_assert_eq!(out.status.ng, (sum as i16) < 0);
        prop_assert_eq!(out.diagnostic, None);
    }

    #[test]
    fn every_function_matches_its_name(
        function in any_function(),
        x in any::<u16>(),
        y in any::<u16>(),
    ) {
        let out = compute(x, y, function.control()).unwrap();
        prop_assert_eq!(out.result, expected(function, x, y), "{}", function.symbol());
        prop_assert_eq!(out.status.zr, out.result == 0);
        prop_assert_eq!(out.status.ng, out.result & 0x8000 != 0);
    }

    #[test]
    fn subtract_borrow_and_overflow(x in any::<u16>(), y in any::<u16>()) {
        // Only 0 - (-32768) overflows without the strict sign test noticing.
        let overflows = |a: u16, b: u16| {
            (a as i16).overflowing_sub(b as i16).1 && !(a == 0 && b == 0x8000)
        };

        let out = compute(x, y, AluFunction::SubXY.control()).unwrap();
        prop_assert_eq!(out.result, x.wrapping_sub(y));
        prop_assert_eq!(out.status.cy, (x as i16) < (y as i16));
        prop_assert_eq!(out.status.ov, overflows(x, y));

        let out = compute(x, y, AluFunction::SubYX.control()).unwrap();
        prop_assert_eq!(out.result, y.wrapping_sub(x));
        prop_assert_eq!(out.status.cy, (y as i16) < (x as i16));
        prop_assert_eq!(out.status.ov, overflows(y, x));
    }

    #[test]
    fn undefined_codes_are_reported(code in 0u8..64) {
        let result = compute(1, 2, AluControl::from_code(code));
        match AluFunction::from_code(code) {
            Some(_) => prop_assert!(result.is_ok()),
            None => prop_assert_eq!(result, Err(AluError::UnimplementedCode(code))),
        }
    }

    #[test]
    fn divide_by_zero_is_not_fatal(x in any::<u16>()) {
        let out = compute(x, 0, AluFunction::Div.control()).unwrap();
        prop_assert_eq!(out.result, 0);
        prop_assert!(out.status.ov);
        prop_assert!(!out.status.cy);
        prop_assert_eq!(out.diagnostic, Some(AluDiagnostic::DivisionByZero));
    }

    #[test]
    fn encode_decode_law(op in any::<u8>(), r1 in any::<u8>(), r2 in any::<u8>(), imm in any::<u8>()) {
        let fields = decode_fields(encode(op, r1, r2, imm));
        prop_assert_eq!(fields, Fields {
            opcode: op & 0xF,
            reg1: r1 & 0x7,
            reg2: r2 & 0x7,
            imm: imm & 0x3F,
        });
    }

    #[test]
    fn word_survives_decode_encode(word in any::<u16>()) {
        let f = decode_fields(word);
        prop_assert_eq!(encode(f.opcode, f.reg1, f.reg2, f.imm), word);
    }

    #[test]
    fn out_of_range_memory(addr in (MEMORY_SIZE as u16)..=u16::MAX, value in any::<u16>()) {
        let mut mem = Memory::new();
        let mut port: Vec<u8> = Vec::new();

        mem.write(addr, value, &mut port).unwrap();
        mem.store(addr, value);

        prop_assert_eq!(mem.read(addr), 0);
        prop_assert!(mem.cells().iter().all(|&w| w == 0));
        prop_assert!(port.is_empty());
    }
}

//! Disassembler.
//!
//! Converts instruction words back to assembly text the assembler accepts.

use crate::alu::Word;
use crate::cpu::decode::{decode, Instruction};

/// Disassemble a single word to text.
pub fn disassemble_word(word: Word) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("DW {:#06x}", word),
    }
}

/// Disassemble a slice of words as a listing.
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();
    output.push_str("; Disassembly\n");
    output.push_str("; -----------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_word(*word);
        output.push_str(&format!("{:<16} ; {:03}: {:04X}\n", line, addr, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let mnemonic = instr.opcode().mnemonic();
    match *instr {
        Instruction::Nop | Instruction::Ret | Instruction::Halt => mnemonic.to_string(),

        Instruction::Mov { rd, imm }
        | Instruction::Add { rd, imm }
        | Instruction::Sub { rd, imm } => format!("{} r{}, {}", mnemonic, rd, imm),

        Instruction::And { rd, rs }
        | Instruction::Or { rd, rs }
        | Instruction::Mul { rd, rs }
        | Instruction::Div { rd, rs }
        | Instruction::Load { rd, rs }
        | Instruction::Store { rd, rs } => format!("{} r{}, r{}", mnemonic, rd, rs),

        Instruction::Jmp { target }
        | Instruction::Jz { target }
        | Instruction::Call { target } => format!("{} {}", mnemonic, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_disassemble_halt() {
        assert_eq!(disassemble_word(Instruction::Halt.encode()), "HALT");
    }

    #[test]
    fn test_disassemble_operands() {
        assert_eq!(
            disassemble_word(Instruction::Mov { rd: 2, imm: 41 }.encode()),
            "MOV r2, 41"
        );
        assert_eq!(
            disassemble_word(Instruction::Load { rd: 1, rs: 6 }.encode()),
            "LOAD r1, r6"
        );
        assert_eq!(
            disassemble_word(Instruction::Call { target: 9 }.encode()),
            "CALL 9"
        );
    }

    #[test]
    fn test_disassemble_unassigned() {
        assert_eq!(disassemble_word(0xF00D), "DW 0xf00d");
    }

    #[test]
    fn test_listing_reassembles() {
        let program = assemble("MOV r0, 5\nCALL 3\nHALT\nMUL r0, r1\nRET\nDW 0xFFFF").unwrap();
        let listing = disassemble(&program);
        assert_eq!(assemble(&listing).unwrap(), program);
    }
}

//! Two-pass assembler.
//!
//! Syntax:
//! ```text
//! ; Comment
//! start:              ; Define a label
//!     MOV r0, '0'     ; Register, immediate (0-63)
//!     ADD r0, 0x01
//!     MOV r1, 32
//!     STORE r0, r1    ; mem[r1] := r0
//!     CALL func       ; Labels resolve into the 6-bit immediate
//!     HALT
//! func:
//!     RET
//!     ORG 40          ; Pad with zeros up to address 40
//!     DW 0xBEEF       ; Raw 16-bit word
//! ```

use crate::alu::Word;
use crate::cpu::decode::{Instruction, Opcode};
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Largest value the 6-bit immediate field holds.
pub const IMM_MAX: i32 = 0x3F;

/// Assemble source code to a list of words.
pub fn assemble(source: &str) -> Result<Vec<Word>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Which part of an emitted word a label reference patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Patch {
    /// The 6-bit immediate field.
    Imm,
    /// The whole word.
    Word,
}

#[derive(Debug, Clone)]
struct Pending {
    index: usize,
    label: String,
    line: usize,
    patch: Patch,
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, Word>,
    /// Unresolved label references.
    pending: Vec<Pending>,
    /// Output words. Its length is the current address.
    output: Vec<Word>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<Word>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(());
        }

        let label = line
            .split_once(':')
            .filter(|(label, _)| is_identifier(label.trim()));
        if let Some((label, rest)) = label {
            let label = label.trim();
            let address = self.output.len() as Word;
            if self.symbols.insert(label.to_uppercase(), address).is_some() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("duplicate label '{}'", label),
                });
            }

            let rest = rest.trim();
            if rest.is_empty() {
                return Ok(());
            }
            return self.process_statement(rest, line_num);
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, text: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (text, ""),
        };
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };
        let mnemonic = mnemonic.to_uppercase();

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let [addr] = expect_operands::<1>(&mnemonic, &operands, line_num)?;
                let addr = parse_number(addr).ok_or_else(|| AssemblerError::SyntaxError {
                    line: line_num,
                    message: "ORG requires a numeric address".into(),
                })?;
                if addr < self.output.len() as i32 || addr > MEMORY_SIZE as i32 {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
                }
                self.output.resize(addr as usize, 0);
            }

            "DW" | "DATA" => {
                let [value] = expect_operands::<1>(&mnemonic, &operands, line_num)?;
                let word = self.parse_value(value, Patch::Word, line_num)?;
                self.output.push(word);
            }

            // Instructions
            _ => {
                let op = Opcode::from_mnemonic(&mnemonic).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic {
                        line: line_num,
                        mnemonic: mnemonic.clone(),
                    }
                })?;
                let instr = self.parse_instruction(op, &operands, line_num)?;
                self.output.push(instr.encode());
            }
        }

        Ok(())
    }

    fn parse_instruction(&mut self, op: Opcode, operands: &[&str], line_num: usize)
        -> Result<Instruction, AssemblerError>
    {
        let mnemonic = op.mnemonic();

        let instr = match op {
            Opcode::Nop | Opcode::Ret | Opcode::Halt => {
                let [] = expect_operands::<0>(mnemonic, operands, line_num)?;
                match op {
                    Opcode::Nop => Instruction::Nop,
                    Opcode::Ret => Instruction::Ret,
                    _ => Instruction::Halt,
                }
            }

            Opcode::Mov | Opcode::Add | Opcode::Sub => {
                let [rd, imm] = expect_operands::<2>(mnemonic, operands, line_num)?;
                let rd = parse_register(rd, line_num)?;
                let imm = self.parse_value(imm, Patch::Imm, line_num)? as u8;
                match op {
                    Opcode::Mov => Instruction::Mov { rd, imm },
                    Opcode::Add => Instruction::Add { rd, imm },
                    _ => Instruction::Sub { rd, imm },
                }
            }

            Opcode::And | Opcode::Or | Opcode::Mul | Opcode::Div | Opcode::Load | Opcode::Store => {
                let [rd, rs] = expect_operands::<2>(mnemonic, operands, line_num)?;
                let rd = parse_register(rd, line_num)?;
                let rs = parse_register(rs, line_num)?;
                match op {
                    Opcode::And => Instruction::And { rd, rs },
                    Opcode::Or => Instruction::Or { rd, rs },
                    Opcode::Mul => Instruction::Mul { rd, rs },
                    Opcode::Div => Instruction::Div { rd, rs },
                    Opcode::Load => Instruction::Load { rd, rs },
                    _ => Instruction::Store { rd, rs },
                }
            }

            Opcode::Jmp | Opcode::Jz | Opcode::Call => {
                let [target] = expect_operands::<1>(mnemonic, operands, line_num)?;
                let target = self.parse_value(target, Patch::Imm, line_num)? as u8;
                match op {
                    Opcode::Jmp => Instruction::Jmp { target },
                    Opcode::Jz => Instruction::Jz { target },
                    _ => Instruction::Call { target },
                }
            }
        };

        Ok(instr)
    }

    /// Parse a literal or label operand for the word about to be emitted.
    fn parse_value(&mut self, operand: &str, patch: Patch, line_num: usize) -> Result<Word, AssemblerError> {
        if let Some(value) = parse_number(operand) {
            return check_range(value, patch, line_num);
        }

        if !is_identifier(operand) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid operand '{}'", operand),
            });
        }

        // Label reference, patched in pass 2
        self.pending.push(Pending {
            index: self.output.len(),
            label: operand.to_uppercase(),
            line: line_num,
            patch,
        });
        Ok(0)
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for pending in &self.pending {
            let addr = *self.symbols.get(&pending.label).ok_or_else(|| {
                AssemblerError::UndefinedLabel {
                    line: pending.line,
                    label: pending.label.clone(),
                }
            })?;
            let value = check_range(i32::from(addr), pending.patch, pending.line)?;

            let word = &mut self.output[pending.index];
            *word = match pending.patch {
                Patch::Imm => (*word & !0x3F) | value,
                Patch::Word => value,
            };
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    // A ';' inside a character literal is not a comment.
    let mut in_char = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => in_char = !in_char,
            ';' if !in_char => return &line[..i],
            _ => {}
        }
    }
    line
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn expect_operands<'a, const N: usize>(mnemonic: &str, operands: &[&'a str], line_num: usize)
    -> Result<[&'a str; N], AssemblerError>
{
    <[&str; N]>::try_from(operands).map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("{} expects {} operand(s), found {}", mnemonic, N, operands.len()),
    })
}

fn parse_register(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    let bad = || AssemblerError::BadRegister {
        line: line_num,
        operand: operand.to_string(),
    };
    let digits = operand.strip_prefix(|c: char| c == 'r' || c == 'R').ok_or_else(bad)?;
    match digits.parse::<u8>() {
        Ok(index) if index < 8 => Ok(index),
        _ => Err(bad()),
    }
}

/// Parse a decimal, `0x` hex, `0b` binary or `'c'` character literal.
fn parse_number(operand: &str) -> Option<i32> {
    if let Some(inner) = operand.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        let mut chars = inner.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Some(c as i32),
            _ => None,
        };
    }

    let (negative, digits) = match operand.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, operand),
    };

    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i32::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i32::from_str_radix(bin, 2).ok()?
    } else if digits.starts_with(|c: char| c.is_ascii_digit()) {
        digits.parse::<i32>().ok()?
    } else {
        return None;
    };

    Some(if negative { -value } else { value })
}

fn check_range(value: i32, patch: Patch, line_num: usize) -> Result<Word, AssemblerError> {
    let in_range = match patch {
        Patch::Imm => (0..=IMM_MAX).contains(&value),
        Patch::Word => (i32::from(i16::MIN)..=i32::from(u16::MAX)).contains(&value),
    };
    if !in_range {
        return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
    }
    Ok(value as Word)
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i32 },

    #[error("bad register on line {line}: {operand}")]
    BadRegister { line: usize, operand: String },
}

//! WebAssembly bindings for the gate16 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! Port output is captured in a buffer and read back with [`WasmCpu::output`].

use wasm_bindgen::prelude::*;
use crate::{Cpu, Word, Snapshot};
use crate::asm::assembler::assemble;
use crate::asm::disasm::{disassemble_word, format_instruction};
use crate::cpu::memory::MEMORY_SIZE;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu<Vec<u8>>,
    program: Vec<Word>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::with_output(Vec::new()),
            program: Vec::new(),
        }
    }

    /// Load a program from assembly source code. Returns the word count.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let words = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.load_words(words)
    }

    /// Load a program from raw instruction words.
    #[wasm_bindgen]
    pub fn load_words(&mut self, words: Vec<Word>) -> Result<usize, JsError> {
        let len = words.len();
        self.cpu = Cpu::with_output(Vec::new());
        self.cpu.load_program(&words)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.program = words;
        Ok(len)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if !self.cpu.is_running() {
            return Err(JsError::new("CPU is halted"));
        }

        let instr = self.cpu.step()
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(format_instruction(&instr))
    }

    /// Run until halt or max steps. Returns the instruction count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(max_steps as u64)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.cycles)
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.output_mut().clear();
        if !self.program.is_empty() {
            let _ = self.cpu.load_program(&self.program);
        }
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Why the CPU halted, if it has.
    #[wasm_bindgen]
    pub fn halt_reason(&self) -> Option<String> {
        self.cpu.halt_reason().map(|r| r.to_string())
    }

    /// Disassembly of the last executed instruction, if any.
    #[wasm_bindgen]
    pub fn last_instruction(&self) -> Option<String> {
        self.cpu.last_instruction().map(|instr| format_instruction(&instr))
    }

    /// Get instruction count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get the number of CALLs executed.
    #[wasm_bindgen]
    pub fn depth(&self) -> u64 {
        self.cpu.depth
    }

    /// Get the instruction pointer.
    #[wasm_bindgen]
    pub fn ip(&self) -> u16 {
        self.cpu.regs.ip
    }

    /// Get the stack pointer.
    #[wasm_bindgen]
    pub fn sp(&self) -> u16 {
        self.cpu.regs.sp
    }

    /// Get a general register (index taken modulo 8).
    #[wasm_bindgen]
    pub fn register(&self, index: u8) -> u16 {
        self.cpu.regs.get(index)
    }

    /// Get all general registers.
    #[wasm_bindgen]
    pub fn registers(&self) -> Vec<u16> {
        self.cpu.regs.gpr.to_vec()
    }

    /// Get flags as a string such as `"ZR NG"`.
    #[wasm_bindgen]
    pub fn flags(&self) -> String {
        let f = self.cpu.regs.flags;
        [("ZR", f.zr), ("NG", f.ng), ("OV", f.ov), ("CY", f.cy)]
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get memory word at an address (0 beyond the end of memory).
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: u16) -> u16 {
        self.cpu.mem.read(addr)
    }

    /// Disassemble the memory word at an address.
    #[wasm_bindgen]
    pub fn disassemble_at(&self, addr: u16) -> String {
        disassemble_word(self.cpu.mem.read(addr))
    }

    /// Get all memory words.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u16> {
        self.cpu.mem.cells().to_vec()
    }

    /// Number of memory words.
    #[wasm_bindgen]
    pub fn memory_size(&self) -> usize {
        MEMORY_SIZE
    }

    /// Text written to the output port so far.
    #[wasm_bindgen]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(self.cpu.output()).into_owned()
    }

    /// Get the whole machine state as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        Snapshot::capture(&self.cpu)
            .to_json()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the program words.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u16>, JsError> {
    assemble(source).map_err(|e| JsError::new(&format!("{}", e)))
}

/// Disassemble a single instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_word(word)
}

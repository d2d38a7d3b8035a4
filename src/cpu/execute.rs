//! CPU execution engine.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::alu::{self, AluFunction, Word};
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::STACK_TOP;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

/// Why the CPU stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HaltReason {
    /// A HALT instruction.
    Halt,
    /// DIV with a zero divisor.
    DivisionByZero,
    /// CALL with SP at 0.
    StackOverflow,
    /// RET with an empty stack.
    StackUnderflow,
}

impl HaltReason {
    /// Whether the machine stopped because of a fault rather than HALT.
    pub fn is_fault(self) -> bool {
        self != HaltReason::Halt
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HaltReason::Halt => "halted",
            HaltReason::DivisionByZero => "division by zero",
            HaltReason::StackOverflow => "stack overflow",
            HaltReason::StackUnderflow => "stack underflow",
        })
    }
}

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has stopped.
    Halted(HaltReason),
    /// CPU hit an unimplemented instruction or ALU code.
    Error,
}

/// The CPU.
///
/// `W` receives bytes written to the output port.
pub struct Cpu<W: Write = io::Stdout> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed since load.
    pub cycles: u64,
    /// Number of CALLs executed since load. Diagnostic only.
    pub depth: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
    output: W,
}

impl Cpu<io::Stdout> {
    /// Create a new CPU with zeroed state, writing port output to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<W: Write> Cpu<W> {
    /// Create a new CPU with zeroed state and the given port output.
    pub fn with_output(output: W) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            depth: 0,
            last_instr: None,
            output,
        }
    }

    /// Reset the CPU to an empty machine: memory cleared, IP 0, SP at the
    /// top of the stack. The output sink is left as is.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.depth = 0;
        self.last_instr = None;
    }

    /// Load a program at address 0 and prepare to run it.
    ///
    /// IP is set to 0 and SP to the top of the stack.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_program(program)?;
        self.regs.reset();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.depth = 0;
        self.last_instr = None;
        log::debug!("loaded {} words", program.len());
        Ok(())
    }

    /// Execute one step.
    ///
    /// A CALL or RET hands control straight to the instruction at its
    /// destination, so a step that executes one keeps going until some
    /// other instruction has run or the CPU stops. Returns the last
    /// instruction executed.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let mut instr = self.execute_next()?;
        while matches!(instr, Instruction::Call { .. } | Instruction::Ret) && self.is_running() {
            instr = self.execute_next()?;
        }

        Ok(instr)
    }

    /// Run until the CPU stops.
    pub fn run(&mut self) -> Result<HaltReason, CpuError> {
        while self.state == CpuState::Running {
            self.step()?;
        }

        self.halt_reason().ok_or(CpuError::NotRunning(self.state))
    }

    /// Run for at most `max_steps` steps.
    ///
    /// Returns `None` if the budget ran out first.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<Option<HaltReason>, CpuError> {
        let mut steps = 0;

        while self.state == CpuState::Running && steps < max_steps {
            self.step()?;
            steps += 1;
        }

        Ok(self.halt_reason())
    }

    /// Fetch, decode and execute exactly one instruction.
    fn execute_next(&mut self) -> Result<Instruction, CpuError> {
        // Fetch
        let ip = self.regs.advance_ip();
        let word = self.mem.read(ip);
        self.regs.ir = word;

        // Decode
        let instr = decode::decode(word).map_err(|e| self.fault(e.into()))?;
        log::trace!("{:03}: {:?}", ip, instr);

        // Execute
        self.execute(instr).map_err(|e| self.fault(e))?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<(), CpuError> {
        match instr {
            Instruction::Nop => {}

            Instruction::Mov { rd, imm } => {
                self.regs.set(rd, Word::from(imm));
            }

            // ==================== Arithmetic ====================

            Instruction::Add { rd, imm } => {
                let out = alu::compute(self.regs.get(rd), Word::from(imm), AluFunction::Add.control())?;
                self.regs.set(rd, out.result);
                self.regs.flags = out.status;
            }

            Instruction::Sub { rd, imm } => {
                // Bypasses the ALU; overflow uses -imm as the second operand.
                let before = self.regs.get(rd);
                let imm = Word::from(imm);
                let result = before.wrapping_sub(imm);
                self.regs.set(rd, result);

                let flags = &mut self.regs.flags;
                flags.set_result(result);
                flags.cy = before < imm;
                let (s_before, neg_imm, s_result) = (before as i16, -(imm as i16), result as i16);
                flags.ov = (s_before > 0 && neg_imm > 0 && s_result < 0)
                    || (s_before < 0 && neg_imm < 0 && s_result > 0);
            }

            Instruction::Mul { rd, rs } => {
                let out = alu::compute(self.regs.get(rd), self.regs.get(rs), AluFunction::Mul.control())?;
                self.regs.set(rd, out.result);
                self.regs.flags = out.status;
            }

            Instruction::Div { rd, rs } => {
                // Bypasses the ALU; a zero divisor is fatal here.
                let divisor = self.regs.get(rs);
                if divisor == 0 {
                    self.halt(HaltReason::DivisionByZero);
                    return Ok(());
                }
                let result = self.regs.get(rd) / divisor;
                self.regs.set(rd, result);
                self.regs.flags.set_result(result);
            }

            // ==================== Logic ====================

            Instruction::And { rd, rs } => {
                let result = self.regs.get(rd) & self.regs.get(rs);
                self.regs.set(rd, result);
                self.regs.flags.set_result(result);
            }

            Instruction::Or { rd, rs } => {
                let result = self.regs.get(rd) | self.regs.get(rs);
                self.regs.set(rd, result);
                self.regs.flags.set_result(result);
            }

            // ==================== Control Flow ====================

            Instruction::Jmp { target } => {
                self.regs.jump(Word::from(target));
            }

            Instruction::Jz { target } => {
                if self.regs.flags.zr {
                    self.regs.jump(Word::from(target));
                }
            }

            Instruction::Call { target } => {
                if self.regs.sp == 0 {
                    self.halt(HaltReason::StackOverflow);
                    return Ok(());
                }
                self.mem.store(self.regs.sp, self.regs.ip);
                self.regs.sp -= 1;
                self.regs.jump(Word::from(target));
                self.depth += 1;
            }

            Instruction::Ret => {
                if self.regs.stack_empty() {
                    self.halt(HaltReason::StackUnderflow);
                    return Ok(());
                }
                self.regs.sp += 1;
                let addr = self.mem.read(self.regs.sp);
                self.regs.jump(addr);
            }

            Instruction::Halt => {
                self.halt(HaltReason::Halt);
            }

            // ==================== Memory ====================

            Instruction::Load { rd, rs } => {
                let value = self.mem.read(self.regs.get(rs));
                self.regs.set(rd, value);
            }

            Instruction::Store { rd, rs } => {
                let addr = self.regs.get(rs);
                let value = self.regs.get(rd);
                self.mem
                    .write(addr, value, &mut self.output)
                    .map_err(|e| CpuError::Output(e.to_string()))?;
            }
        }

        Ok(())
    }

    fn halt(&mut self, reason: HaltReason) {
        if reason.is_fault() {
            log::warn!("CPU stopped at IP={}: {}", self.regs.ip, reason);
        } else {
            log::info!("program halted after {} instructions", self.cycles + 1);
        }
        self.state = CpuState::Halted(reason);
    }

    fn fault(&mut self, error: CpuError) -> CpuError {
        log::error!("CPU fault at IP={}: {}", self.regs.ip, error);
        self.state = CpuState::Error;
        error
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Why the CPU stopped, if it has.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.state {
            CpuState::Halted(reason) => Some(reason),
            _ => None,
        }
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted(_))
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// The port output sink.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Mutable access to the port output sink.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consume the CPU, returning the port output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl Default for Cpu<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> fmt::Debug for Cpu<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("depth", &self.depth)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Alu(#[from] alu::AluError),

    #[error("output port error: {0}")]
    Output(String),
}

//! End-of-run diagnostics: memory and register dumps, and a serializable
//! snapshot of the whole machine.

use crate::alu::Word;
use crate::cpu::{Cpu, CpuState, Registers};
use serde::{Serialize, Deserialize};
use std::fmt::Write as _;
use std::io::Write;

/// Number of words shown by a default memory dump.
pub const DEFAULT_DUMP_WORDS: usize = 32;

/// The first `count` memory words, one `AA: WWWW` line each, followed by
/// the recursion depth.
pub fn dump_memory<W: Write>(cpu: &Cpu<W>, count: usize) -> String {
    let mut out = String::from("Memory Dump:\n");
    for (addr, word) in cpu.mem.dump(0, count) {
        let _ = writeln!(out, "{:02X}: {:04X}", addr, word);
    }
    let _ = writeln!(out, "Recursion depth: {}", cpu.depth);
    out
}

/// General registers, SP, IP and the flags.
pub fn dump_registers(regs: &Registers) -> String {
    let mut out = String::new();
    for (i, value) in regs.gpr.iter().enumerate() {
        let _ = write!(out, "R{}={} ", i, value);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "SP={} IP={}", regs.sp, regs.ip);
    let _ = writeln!(
        out,
        "Flags: ZR={} NG={} OV={} CY={}",
        regs.flags.zr as u8, regs.flags.ng as u8, regs.flags.ov as u8, regs.flags.cy as u8
    );
    out
}

/// A complete copy of machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: CpuState,
    pub registers: Registers,
    pub cycles: u64,
    pub recursion_depth: u64,
    pub memory: Vec<Word>,
}

impl Snapshot {
    /// Capture the current state of a CPU.
    pub fn capture<W: Write>(cpu: &Cpu<W>) -> Self {
        Self {
            state: cpu.state,
            registers: cpu.regs.clone(),
            cycles: cpu.cycles,
            recursion_depth: cpu.depth,
            memory: cpu.mem.cells().to_vec(),
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Instruction;
    use crate::cpu::HaltReason;

    fn halted_cpu() -> Cpu<Vec<u8>> {
        let mut cpu = Cpu::with_output(Vec::new());
        let program = [
            Instruction::Mov { rd: 0, imm: 5 }.encode(),
            Instruction::Call { target: 3 }.encode(),
            Instruction::Halt.encode(),
            Instruction::Ret.encode(),
        ];
        cpu.load_program(&program).unwrap();
        cpu.run().unwrap();
        cpu
    }

    #[test]
    fn test_dump_memory() {
        let cpu = halted_cpu();
        let dump = dump_memory(&cpu, 4);

        assert!(dump.starts_with("Memory Dump:\n00: 1005\n"));
        assert!(dump.contains("03: B000\n"));
        assert!(dump.ends_with("Recursion depth: 1\n"));
        assert_eq!(dump.lines().count(), 6);
    }

    #[test]
    fn test_dump_registers() {
        let cpu = halted_cpu();
        let dump = dump_registers(&cpu.regs);

        assert!(dump.starts_with("R0=5 R1=0 "));
        assert!(dump.contains("SP=399 IP=3"));
        assert!(dump.contains("Flags: ZR=0 NG=0 OV=0 CY=0"));
    }

    #[test]
    fn test_snapshot_json() {
        let cpu = halted_cpu();
        let snapshot = Snapshot::capture(&cpu);

        assert_eq!(snapshot.state, CpuState::Halted(HaltReason::Halt));
        assert_eq!(snapshot.memory.len(), 400);

        let json = snapshot.to_json().unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}

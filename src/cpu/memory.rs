//! Word-addressed main memory with one memory-mapped output port.
//!
//! Memory holds 400 words. Address 32 is also the character output port:
//! a write there emits the low byte of the value and is stored as usual.
//! Out-of-range accesses are never errors; reads return 0 and writes are
//! dropped.

use crate::alu::Word;
use serde::{Serialize, Deserialize};
use std::io::{self, Write};
use thiserror::Error;

/// The number of words in memory.
pub const MEMORY_SIZE: usize = 400;

/// Address of the character output port.
pub const IO_PORT: Word = 32;

/// Main memory: 400 sixteen-bit words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    /// Create a new memory with all words zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Bus read. Addresses past the end read as 0.
    #[inline]
    pub fn read(&self, addr: Word) -> Word {
        self.cells.get(addr as usize).copied().unwrap_or(0)
    }

    /// Bus write.
    ///
    /// The value is always stored. A write to [`IO_PORT`] also sends the
    /// low byte of `value` to `port` and flushes it; a failing sink is
    /// reported after the store. Writes past the end are dropped.
    pub fn write<W: Write + ?Sized>(&mut self, addr: Word, value: Word, port: &mut W) -> io::Result<()> {
        self.store(addr, value);

        if addr == IO_PORT {
            port.write_all(&[(value & 0xFF) as u8])?;
            port.flush()?;
        }
        Ok(())
    }

    /// Store a word without touching the output port. Used by the stack.
    #[inline]
    pub fn store(&mut self, addr: Word, value: Word) {
        if let Some(cell) = self.cells.get_mut(addr as usize) {
            *cell = value;
        }
    }

    /// All memory words.
    pub fn cells(&self) -> &[Word] {
        &self.cells
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copy a program into memory starting at address 0.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        if program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE,
            });
        }

        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, Word)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        let mut port: Vec<u8> = Vec::new();

        mem.write(10, 0xBEEF, &mut port).unwrap();
        assert_eq!(mem.read(10), 0xBEEF);
        assert!(port.is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let mut mem = Memory::new();
        let mut port: Vec<u8> = Vec::new();
        let before = mem.clone();

        assert_eq!(mem.read(400), 0);
        assert_eq!(mem.read(500), 0);
        assert_eq!(mem.read(0xFFFF), 0);

        mem.write(500, 7, &mut port).unwrap();
        mem.store(400, 7);
        assert_eq!(mem, before);
    }

    #[test]
    fn test_port_write_prints_and_persists() {
        let mut mem = Memory::new();
        let mut port: Vec<u8> = Vec::new();

        mem.write(IO_PORT, 0x0041, &mut port).unwrap();
        mem.write(IO_PORT, 0x1242, &mut port).unwrap();

        assert_eq!(port, b"AB");
        assert_eq!(mem.read(IO_PORT), 0x1242);
    }

    #[test]
    fn test_store_skips_port() {
        let mut mem = Memory::new();
        mem.store(IO_PORT, 0x41);
        assert_eq!(mem.read(IO_PORT), 0x41);
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.load_program(&[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0), 1);
        assert_eq!(mem.read(1), 2);
        assert_eq!(mem.read(2), 3);
        assert_eq!(mem.read(3), 0);
    }

    struct BrokenPort;

    impl Write for BrokenPort {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_port_write_persists_when_sink_fails() {
        let mut mem = Memory::new();

        assert!(mem.write(IO_PORT, 0x0041, &mut BrokenPort).is_err());
        assert_eq!(mem.read(IO_PORT), 0x0041);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let program = vec![0; MEMORY_SIZE + 1];
        assert_eq!(
            mem.load_program(&program),
            Err(MemoryError::ProgramTooLarge { size: 401, available: 400 })
        );
    }

    #[test]
    fn test_dump_clamps() {
        let mem = Memory::new();
        assert_eq!(mem.dump(395, 10).len(), 5);
        assert!(mem.dump(500, 10).is_empty());
    }
}

//! Debugger application state and logic.

use crate::{Cpu, Word};
use crate::asm::disasm::{disassemble_word, format_instruction};
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged. Port output is captured rather than printed.
    pub cpu: Cpu<Vec<u8>>,
    /// Original program for reference.
    pub program: Vec<Word>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<Word>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<Word>) -> Self {
        let mut cpu = Cpu::with_output(Vec::new());
        let status = match cpu.load_program(&program) {
            Ok(()) => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".to_string(),
            Err(e) => format!("Load failed: {}", e),
        };

        Self {
            cpu,
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state);
            self.running = false;
            return;
        }

        let ip = self.cpu.regs.ip;
        match self.cpu.step() {
            Ok(instr) => {
                self.status = format!("IP={:03}: {}", ip, format_instruction(&instr));
                if let Some(reason) = self.cpu.halt_reason() {
                    self.status.push_str(&format!(" ({})", reason));
                }
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("Stopped after {} instructions: {:?}", self.cpu.cycles, self.cpu.state);
            if let Some(instr) = self.cpu.last_instruction() {
                self.status.push_str(&format!(" at {}", format_instruction(&instr)));
            }
            return;
        }

        let ip = self.cpu.regs.ip;
        if self.breakpoints.contains(&ip) {
            self.running = false;
            self.status = format!("Breakpoint at IP={}", ip);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at the current IP.
    pub fn toggle_breakpoint(&mut self) {
        let ip = self.cpu.regs.ip;
        if self.breakpoints.remove(&ip) {
            self.status = format!("Removed breakpoint at IP={}", ip);
        } else {
            self.breakpoints.insert(ip);
            self.status = format!("Set breakpoint at IP={}", ip);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.output_mut().clear();
        self.status = match self.cpu.load_program(&self.program) {
            Ok(()) => "Reset. Ready.".into(),
            Err(e) => format!("Load failed: {}", e),
        };
        self.running = false;
    }

    /// Scroll the memory view.
    pub fn scroll_memory(&mut self, delta: isize) {
        let max = MEMORY_SIZE - 1;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Get disassembly around current IP.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(Word, String, bool)> {
        let ip = self.cpu.regs.ip as usize;
        let start = ip.saturating_sub(lines / 2);

        (start..start + lines)
            .filter(|&addr| addr < MEMORY_SIZE)
            .map(|addr| {
                let addr = addr as Word;
                let text = disassemble_word(self.cpu.mem.read(addr));
                (addr, text, addr as usize == ip)
            })
            .collect()
    }

    /// Port output captured so far, as text.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(self.cpu.output()).into_owned()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<Word>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        KeyCode::PageUp => app.scroll_memory(-16),
                        KeyCode::PageDown => app.scroll_memory(16),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

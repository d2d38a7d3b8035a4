//! TUI debugger for the gate16 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag view, including call depth
//! - Memory view with the output port highlighted
//! - Step/run/breakpoint controls
//! - Disassembly view and captured port output

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};

//! A Brainfuck bytecode compiler and virtual machine.
//!
//! Source is compiled once into a flat [`Program`] whose loop instructions
//! already know the address of their partner bracket, then executed by a
//! small VM over a fixed-size tape.
//!
//! Features and behaviors:
//! - Any byte outside `><+-.,[]` is a comment and is skipped by the compiler.
//! - Unbalanced brackets are rejected at compile time with the source index.
//! - Tape of 4096 `u8` cells by default; cells and the head both wrap.
//! - Input `,` reads a single byte; on EOF the current cell is left unchanged.
//! - Output `.` writes the byte at the current cell.
//! - An optional tracer shows the registers and a window of the tape before
//!   every instruction.
//!
//! Quick start:
//!
//! ```
//! use bfvm::{compile, run_to_vec, VmConfig};
//!
//! let program = compile(b"+++[-.]").expect("brackets are balanced");
//! let output = run_to_vec(&program, b"", &VmConfig::default()).expect("program should run");
//! assert_eq!(output, vec![2, 1, 0]);
//! ```

pub mod cli_util;
pub mod commands;
pub mod compiler;
pub mod config;
pub mod error;
pub mod machine;
pub mod theme;
pub mod trace;

pub use compiler::{CompileError, Instruction, Program, compile};
pub use error::Error;
pub use machine::{DEFAULT_TAPE_SIZE, Machine, Tape, VmConfig, VmError, run, run_to_vec};
pub use trace::{NoTrace, Snapshot, TerminalTracer, Tracer};

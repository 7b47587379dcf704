//! Bytecode virtual machine.
//!
//! The machine executes a compiled [`Program`] against a fixed-size tape of
//! zero-initialized `u8` cells. Both cell arithmetic and head movement wrap:
//! `-` on a zero cell gives 255, and `<` at cell 0 moves the head to the last
//! cell.
//!
//! Jump operands address the paired bracket instruction itself. After every
//! instruction, taken jump or not, the program counter advances by one. A taken
//! `[` therefore resumes just past its `]`, and a taken `]` resumes at the first
//! instruction of the loop body.
//!
//! Input for `,` and output for `.` go through any `Read`/`Write` pair. When the
//! input is exhausted, `,` leaves the current cell unchanged.

use std::io::{self, Read, Write};

use crate::compiler::{Instruction, Program};
use crate::trace::{NoTrace, Snapshot, TerminalTracer, Tracer};

/// Tape size used when nothing else is configured.
pub const DEFAULT_TAPE_SIZE: usize = 4096;

/// Errors that can occur while executing a program.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Reading input or writing output failed.
    #[error("I/O error at instruction {pc}: {source}")]
    Io {
        pc: usize,
        #[source]
        source: io::Error,
    },

    /// The debug tracer failed or was aborted by the user.
    #[error("trace aborted at instruction {pc}: {source}")]
    Trace {
        pc: usize,
        #[source]
        source: io::Error,
    },
}

/// Runtime configuration handed to [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub tape_size: usize,
    /// Enable the interactive tracer on stderr.
    pub debug: bool,
    /// Wait for a keypress after each traced step (only when attached to a terminal).
    pub pause: bool,
    /// Colour the trace output.
    pub color: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            debug: false,
            pause: true,
            color: false,
        }
    }
}

/// Fixed-size, wrapping byte tape with a single head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    head: usize,
}

impl Tape {
    /// A zeroed tape of `size` cells. Sizes below one are raised to one.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size.max(1)],
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Value under the head.
    pub fn current(&self) -> u8 {
        self.cells[self.head]
    }

    pub fn set_current(&mut self, value: u8) {
        self.cells[self.head] = value;
    }

    pub fn move_right(&mut self) {
        self.head = (self.head + 1) % self.cells.len();
    }

    pub fn move_left(&mut self) {
        self.head = self.head.checked_sub(1).unwrap_or(self.cells.len() - 1);
    }

    pub fn increment(&mut self) {
        self.cells[self.head] = self.cells[self.head].wrapping_add(1);
    }

    pub fn decrement(&mut self) {
        self.cells[self.head] = self.cells[self.head].wrapping_sub(1);
    }

    /// `(index, value)` pairs for the cells within `radius` of the head,
    /// wrapping around the tape ends. A tape no wider than the window is
    /// returned whole, in index order.
    pub fn window(&self, radius: usize) -> Vec<(usize, u8)> {
        let len = self.cells.len();
        let width = radius.saturating_mul(2).saturating_add(1);
        if width >= len {
            return self.cells.iter().copied().enumerate().collect();
        }
        let start = (self.head + len - radius) % len;
        (0..width)
            .map(|k| {
                let i = (start + k) % len;
                (i, self.cells[i])
            })
            .collect()
    }
}

/// VM registers and memory for a single run.
pub struct Machine {
    tape: Tape,
    pc: usize,
    steps: u64,
}

impl Machine {
    pub fn new(tape_size: usize) -> Self {
        Self {
            tape: Tape::new(tape_size),
            pc: 0,
            steps: 0,
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Execute `program` to completion.
    ///
    /// `tracer` sees a snapshot before each instruction. Output is flushed
    /// before every read, before every traced step and once more at the end.
    pub fn execute<R, W, T>(
        &mut self,
        program: &Program,
        input: &mut R,
        output: &mut W,
        tracer: &mut T,
    ) -> Result<(), VmError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        T: Tracer + ?Sized,
    {
        let code = program.as_slice();

        while self.pc < code.len() {
            let instr = code[self.pc];

            if tracer.is_active() {
                output.flush().map_err(|source| VmError::Io { pc: self.pc, source })?;
                let snapshot = Snapshot::new(self.pc, instr, &self.tape);
                tracer
                    .before_step(&snapshot)
                    .map_err(|source| VmError::Trace { pc: self.pc, source })?;
            }

            match instr {
                Instruction::MoveRight => self.tape.move_right(),
                Instruction::MoveLeft => self.tape.move_left(),
                Instruction::Increment => self.tape.increment(),
                Instruction::Decrement => self.tape.decrement(),
                Instruction::Write => {
                    output
                        .write_all(&[self.tape.current()])
                        .map_err(|source| VmError::Io { pc: self.pc, source })?;
                }
                Instruction::Read => {
                    output.flush().map_err(|source| VmError::Io { pc: self.pc, source })?;
                    let byte = read_byte(input).map_err(|source| VmError::Io { pc: self.pc, source })?;
                    if let Some(byte) = byte {
                        self.tape.set_current(byte);
                    }
                }
                Instruction::JumpIfZero(target) => {
                    if self.tape.current() == 0 {
                        self.pc = target;
                    }
                }
                Instruction::JumpUnlessZero(target) => {
                    if self.tape.current() != 0 {
                        self.pc = target;
                    }
                }
            }

            self.steps += 1;
            self.pc += 1;
        }

        output.flush().map_err(|source| VmError::Io { pc: self.pc, source })?;
        Ok(())
    }
}

/// Read exactly one byte; `None` at end of input.
fn read_byte<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Run `program` on a fresh machine, tracing to stderr when `config.debug` is set.
pub fn run<R, W>(program: &Program, mut input: R, mut output: W, config: &VmConfig) -> Result<(), VmError>
where
    R: Read,
    W: Write,
{
    let mut machine = Machine::new(config.tape_size);
    tracing::debug!(
        instructions = program.len(),
        tape_size = machine.tape().len(),
        debug = config.debug,
        "starting run"
    );

    let result = if config.debug {
        let mut tracer = TerminalTracer::stderr(config.pause, config.color);
        machine.execute(program, &mut input, &mut output, &mut tracer)
    } else {
        machine.execute(program, &mut input, &mut output, &mut NoTrace)
    };

    tracing::debug!(steps = machine.steps(), ok = result.is_ok(), "run finished");
    result
}

/// Run `program` against an in-memory input and collect everything it writes.
pub fn run_to_vec(program: &Program, input: &[u8], config: &VmConfig) -> Result<Vec<u8>, VmError> {
    let mut out = Vec::new();
    run(program, input, &mut out, config)?;
    Ok(out)
}

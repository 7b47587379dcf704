//! Step tracing for debug runs.
//!
//! A [`Tracer`] is handed a [`Snapshot`] of the machine before each instruction
//! executes. Tracers observe only; they cannot change registers or memory.

use std::io::{self, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use nu_ansi_term::Style;

use crate::compiler::Instruction;
use crate::machine::Tape;
use crate::theme::catppuccin::Mocha;

/// Cells shown on either side of the head.
pub const WINDOW_RADIUS: usize = 7;

/// Machine state just before an instruction executes.
pub struct Snapshot<'a> {
    pc: usize,
    instruction: Instruction,
    tape: &'a Tape,
}

impl<'a> Snapshot<'a> {
    pub fn new(pc: usize, instruction: Instruction, tape: &'a Tape) -> Self {
        Self { pc, instruction, tape }
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn head(&self) -> usize {
        self.tape.head()
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    /// Cells around the head, see [`Tape::window`].
    pub fn window(&self) -> Vec<(usize, u8)> {
        self.tape.window(WINDOW_RADIUS)
    }

    /// Render as three lines: registers, tape window, instruction name.
    pub fn render(&self, color: bool) -> String {
        let head = self.head();
        let mut out = format!("Head: {}\tPC: {}\n", head, self.pc);

        let cells: Vec<String> = self
            .window()
            .into_iter()
            .map(|(i, v)| {
                if i == head {
                    let cell = format!("[ >{v} ]");
                    if color { Style::new().bold().fg(Mocha::YELLOW).paint(cell).to_string() } else { cell }
                } else if color && v == 0 {
                    Mocha::SURFACE2.paint(format!("[ {v} ]")).to_string()
                } else {
                    format!("[ {v} ]")
                }
            })
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');

        let name = self.instruction.name();
        if color {
            let painted = instruction_color(self.instruction).paint(name);
            out.push_str(&format!("Current Instruction: {painted}\n"));
        } else {
            out.push_str(&format!("Current Instruction: {name}\n"));
        }
        out
    }
}

fn instruction_color(instr: Instruction) -> nu_ansi_term::Color {
    match instr {
        Instruction::MoveRight | Instruction::MoveLeft => Mocha::SKY,
        Instruction::Increment => Mocha::GREEN,
        Instruction::Decrement => Mocha::RED,
        Instruction::Write => Mocha::PEACH,
        Instruction::Read => Mocha::MAUVE,
        Instruction::JumpIfZero(_) | Instruction::JumpUnlessZero(_) => Mocha::BLUE,
    }
}

/// Observer called before every executed instruction.
pub trait Tracer {
    /// Inspect the machine. An error aborts the run.
    fn before_step(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()>;

    /// Whether the machine should build snapshots at all.
    fn is_active(&self) -> bool {
        true
    }
}

/// Tracer for silent runs.
pub struct NoTrace;

impl Tracer for NoTrace {
    fn before_step(&mut self, _: &Snapshot<'_>) -> io::Result<()> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Prints each snapshot and optionally waits for a keypress before continuing.
pub struct TerminalTracer<W: Write> {
    out: W,
    pause: bool,
    color: bool,
}

impl<W: Write> TerminalTracer<W> {
    /// Trace into `out`. `pause` waits for a key on the controlling terminal.
    pub fn new(out: W, pause: bool, color: bool) -> Self {
        Self { out, pause, color }
    }
}

impl TerminalTracer<io::Stderr> {
    /// Trace to stderr. Pausing and colour only apply when both stdin and
    /// stderr are terminals.
    pub fn stderr(pause: bool, color: bool) -> Self {
        let tty = io::stdin().is_terminal() && io::stderr().is_terminal();
        if pause && !tty {
            tracing::debug!("stdin or stderr is not a terminal; tracing without pauses");
        }
        Self::new(io::stderr(), pause && tty, color && tty)
    }
}

impl<W: Write> Tracer for TerminalTracer<W> {
    fn before_step(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
        // Raw mode needs explicit carriage returns.
        let text = snapshot.render(self.color);
        if self.pause {
            write!(self.out, "\r\n{}", text.replace('\n', "\r\n"))?;
        } else {
            write!(self.out, "\n{text}")?;
        }
        self.out.flush()?;

        if self.pause {
            wait_for_key()?;
        }
        Ok(())
    }
}

/// Block until a key is pressed. Ctrl+C or `q` aborts.
fn wait_for_key() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || key.code == KeyCode::Char('q') {
                    break Err(io::Error::new(io::ErrorKind::Interrupted, "stopped by user"));
                }
                break Ok(());
            }
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };
    terminal::disable_raw_mode()?;
    result
}

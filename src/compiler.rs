//! Source-to-bytecode compiler.
//!
//! A single left-to-right pass turns raw source bytes into a flat [`Program`].
//! Every recognized operator becomes one [`Instruction`] whose position in the
//! program is its address. Any other byte is a comment: it is skipped and does
//! not consume an address.
//!
//! Loops are resolved while compiling. Each `[` pushes its address onto a
//! bracket stack; each `]` pops it, records the popped address as its own
//! operand and patches the earlier `[` to point back at the `]`. Both jump
//! instructions therefore address their partner directly and the VM never has
//! to scan for a matching bracket at run time.

use std::fmt;

/// One compiled operation.
///
/// The jump variants carry the address of their paired bracket instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    MoveRight,
    MoveLeft,
    Increment,
    Decrement,
    Write,
    Read,
    /// `[`: jump to the matching `]` when the current cell is zero.
    JumpIfZero(usize),
    /// `]`: jump back to the matching `[` when the current cell is non-zero.
    JumpUnlessZero(usize),
}

impl Instruction {
    /// Human-readable operator name, as shown by the tracer and the disassembler.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::MoveRight => "MOVE_RIGHT",
            Instruction::MoveLeft => "MOVE_LEFT",
            Instruction::Increment => "INCREMENT",
            Instruction::Decrement => "DECREMENT",
            Instruction::Write => "WRITE",
            Instruction::Read => "READ",
            Instruction::JumpIfZero(_) => "JUMP_IF_ZERO",
            Instruction::JumpUnlessZero(_) => "JUMP_UNLESS_ZERO",
        }
    }

    /// The source character this instruction was compiled from.
    pub fn symbol(&self) -> char {
        match self {
            Instruction::MoveRight => '>',
            Instruction::MoveLeft => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Write => '.',
            Instruction::Read => ',',
            Instruction::JumpIfZero(_) => '[',
            Instruction::JumpUnlessZero(_) => ']',
        }
    }

    /// Jump target, if this is one of the two jump instructions.
    pub fn target(&self) -> Option<usize> {
        match self {
            Instruction::JumpIfZero(t) | Instruction::JumpUnlessZero(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(t) => write!(f, "{} -> {:04}", self.name(), t),
            None => f.write_str(self.name()),
        }
    }
}

/// Errors that can occur while compiling source into a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// A `]` appeared with no pending `[`.
    #[error("unmatched ']' at source index {index}")]
    UnmatchedCloseBracket { index: usize },

    /// One or more `[` were still open at the end of the source.
    /// `index` is the source position of the earliest unclosed one.
    #[error("{count} unmatched '[' (first at source index {index})")]
    UnmatchedOpenBracket { count: usize, index: usize },
}

impl CompileError {
    /// Source byte index of the offending bracket.
    pub fn index(&self) -> usize {
        match self {
            CompileError::UnmatchedCloseBracket { index }
            | CompileError::UnmatchedOpenBracket { index, .. } => *index,
        }
    }

    /// The offending bracket character.
    pub fn bracket(&self) -> char {
        match self {
            CompileError::UnmatchedCloseBracket { .. } => ']',
            CompileError::UnmatchedOpenBracket { .. } => '[',
        }
    }
}

/// A compiled, bracket-validated instruction sequence.
///
/// Only [`compile`] builds a `Program`, so every jump pair in it is symmetric:
/// if address `i` holds `JumpIfZero(j)` then address `j` holds `JumpUnlessZero(i)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `address`, if in range.
    pub fn get(&self, address: usize) -> Option<Instruction> {
        self.instructions.get(address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Disassembly listing: one `address  NAME [-> target]` line per instruction.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, instr) in self.instructions.iter().enumerate() {
            writeln!(f, "{address:04}  {instr}")?;
        }
        Ok(())
    }
}

/// Compile raw source bytes into a [`Program`].
///
/// Returns the first bracket error found; no partial program is produced.
pub fn compile(source: &[u8]) -> Result<Program, CompileError> {
    let mut instructions: Vec<Instruction> = Vec::with_capacity(source.len());
    // Pending `[`: (instruction address, source index)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (index, &byte) in source.iter().enumerate() {
        let address = instructions.len();
        let instr = match byte {
            b'>' => Instruction::MoveRight,
            b'<' => Instruction::MoveLeft,
            b'+' => Instruction::Increment,
            b'-' => Instruction::Decrement,
            b'.' => Instruction::Write,
            b',' => Instruction::Read,
            b'[' => {
                stack.push((address, index));
                // Patched once the matching `]` is seen.
                Instruction::JumpIfZero(0)
            }
            b']' => {
                let Some((open, _)) = stack.pop() else {
                    return Err(CompileError::UnmatchedCloseBracket { index });
                };
                instructions[open] = Instruction::JumpIfZero(address);
                Instruction::JumpUnlessZero(open)
            }
            _ => continue,
        };
        instructions.push(instr);
    }

    if let Some(&(_, index)) = stack.first() {
        return Err(CompileError::UnmatchedOpenBracket {
            count: stack.len(),
            index,
        });
    }

    tracing::debug!(
        source_len = source.len(),
        instructions = instructions.len(),
        "compiled program"
    );

    Ok(Program { instructions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_jumps_symmetric(program: &Program) {
        for (i, instr) in program.iter().enumerate() {
            match *instr {
                Instruction::JumpIfZero(j) => {
                    assert_eq!(program.get(j), Some(Instruction::JumpUnlessZero(i)));
                }
                Instruction::JumpUnlessZero(j) => {
                    assert_eq!(program.get(j), Some(Instruction::JumpIfZero(i)));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn each_operator_maps_to_one_instruction() {
        let program = compile(b"><+-.,[]").unwrap();
        assert_eq!(
            program.as_slice(),
            &[
                Instruction::MoveRight,
                Instruction::MoveLeft,
                Instruction::Increment,
                Instruction::Decrement,
                Instruction::Write,
                Instruction::Read,
                Instruction::JumpIfZero(7),
                Instruction::JumpUnlessZero(6),
            ]
        );
    }

    #[test]
    fn comments_do_not_take_addresses() {
        let program = compile(b"add three: +++ then [loop -]").unwrap();
        // `.` and `,` never appear, so only `+++[-]` survives
        assert_eq!(program.len(), 6);
        assert_eq!(program.get(3), Some(Instruction::JumpIfZero(5)));
        assert_eq!(program.get(5), Some(Instruction::JumpUnlessZero(3)));
    }

    #[test]
    fn nested_loops_pair_innermost_first() {
        let program = compile(b"+[>[-]<-]").unwrap();
        assert_eq!(program.get(1), Some(Instruction::JumpIfZero(8)));
        assert_eq!(program.get(3), Some(Instruction::JumpIfZero(5)));
        assert_eq!(program.get(5), Some(Instruction::JumpUnlessZero(3)));
        assert_eq!(program.get(8), Some(Instruction::JumpUnlessZero(1)));
        assert_jumps_symmetric(&program);
    }

    #[test]
    fn stray_close_reports_source_index() {
        let err = compile(b"+ x ]").unwrap_err();
        assert_eq!(err, CompileError::UnmatchedCloseBracket { index: 4 });
        assert_eq!(err.bracket(), ']');
    }

    #[test]
    fn close_after_balanced_pair_is_still_stray() {
        let err = compile(b"[]]").unwrap_err();
        assert_eq!(err, CompileError::UnmatchedCloseBracket { index: 2 });
    }

    #[test]
    fn unclosed_open_reports_count_and_earliest() {
        let err = compile(b"+[[ [-]").unwrap_err();
        assert_eq!(err, CompileError::UnmatchedOpenBracket { count: 2, index: 1 });
        assert_eq!(err.index(), 1);
    }

    #[test]
    fn empty_source_is_empty_program() {
        let program = compile(b"").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn disassembly_lists_targets() {
        let program = compile(b"[-]").unwrap();
        let listing = program.to_string();
        assert_eq!(
            listing,
            "0000  JUMP_IF_ZERO -> 0002\n0001  DECREMENT\n0002  JUMP_UNLESS_ZERO -> 0000\n"
        );
    }

    /// Balanced bracket source interleaved with other operators and comment bytes.
    fn balanced_source() -> impl Strategy<Value = String> {
        let leaf = prop::sample::select(vec![">", "<", "+", "-", ".", ",", "a", " ", "\n"])
            .prop_map(str::to_string);
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(|v| v.concat()),
                inner.prop_map(|body| format!("[{body}]")),
            ]
        })
    }

    proptest! {
        #[test]
        fn balanced_sources_compile_with_symmetric_jumps(src in balanced_source()) {
            let program = compile(src.as_bytes()).unwrap();
            assert_jumps_symmetric(&program);
        }

        #[test]
        fn comment_bytes_never_shift_addresses(src in balanced_source()) {
            let stripped: String = src
                .chars()
                .filter(|c| matches!(c, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']'))
                .collect();
            prop_assert_eq!(compile(src.as_bytes()).unwrap(), compile(stripped.as_bytes()).unwrap());
        }

        #[test]
        fn leading_close_fails_at_its_index(prefix in "[+\\-<>. a-z]{0,16}", src in balanced_source()) {
            let source = format!("{prefix}]{src}");
            prop_assert_eq!(
                compile(source.as_bytes()),
                Err(CompileError::UnmatchedCloseBracket { index: prefix.len() })
            );
        }

        #[test]
        fn trailing_open_fails(src in balanced_source()) {
            let source = format!("{src}[");
            prop_assert_eq!(
                compile(source.as_bytes()),
                Err(CompileError::UnmatchedOpenBracket { count: 1, index: src.len() })
            );
        }
    }
}

use std::io::{self, Write};

use crate::Error;

/// Print `err` to stderr, prefixed with `program`. Compile errors also get a
/// caret under the offending bracket in `source`.
pub fn print_error(program: &str, source: &[u8], err: &Error) {
    match err {
        Error::Compile(e) => {
            let msg = format!("{program}: Parse error: unmatched bracket '{}'", e.bracket());
            print_error_with_context(&msg, source, e.index());
            if let crate::CompileError::UnmatchedOpenBracket { count, .. } = e {
                if *count > 1 {
                    eprintln!("  ({count} brackets left open)");
                }
            }
        }
        Error::Vm(e) => eprintln!("{program}: Runtime error: {e}"),
        Error::SourceRead { .. } | Error::Config(_) | Error::Output(_) => eprintln!("{program}: {err}"),
    }
    let _ = io::stderr().flush();
}

/// Print a concise error with the source index and a caret context window.
/// Source bytes that are not UTF-8 are shown lossily.
pub fn print_error_with_context(prefix: &str, source: &[u8], pos: usize) {
    eprintln!("{prefix} at source index {pos}");

    // Show a short window around the position for context
    const WINDOW_BYTES: usize = 32;

    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = (pos + WINDOW_BYTES + 1).min(source.len());
    let before = render_line(&source[start..pos.min(end)]);
    let rest = render_line(&source[pos.min(end)..end]);

    eprintln!("  {before}{rest}");
    eprintln!("  {}^", " ".repeat(before.chars().count()));
}

/// Lossy text with line breaks and tabs flattened so the caret stays aligned.
fn render_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

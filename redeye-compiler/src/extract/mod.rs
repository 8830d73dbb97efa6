//! Body extraction
//!
//! Two ways of finding where a worker body ends:
//! - [`extract_exact_line`]: the first later line that is exactly `}`. No
//!   depth counting, so a nested block closed by a `}` in column one ends the
//!   body early.
//! - [`extract_brace_depth`]: counts braces with the lexer, so nested blocks
//!   and one-line bodies work.
//!
//! Both cut the declaration-through-closing-brace span out of the buffer.

use crate::lexer::{Lexer, TokenType};
use crate::source::{SourceFile, SourceLine};
use log::trace;
use redeye_common::{CompilerError, SourceLocation, SourceSpan};

/// Lines of a worker from its declaration to its closing brace
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub lines: Vec<SourceLine>,
}

impl FunctionBody {
    pub fn declaration(&self) -> &SourceLine {
        &self.lines[0]
    }

    /// Everything between the declaration and the closing brace
    pub fn inner(&self) -> &[SourceLine] {
        if self.lines.len() < 2 {
            return &[];
        }
        &self.lines[1..self.lines.len() - 1]
    }

    /// Input lines covered, declaration through closing brace
    pub fn span(&self, filename: &str) -> SourceSpan {
        let first = self.lines.first().map(|l| l.number).unwrap_or(0);
        let last = self.lines.last().map(|l| l.number).unwrap_or(first);
        SourceSpan::new(
            SourceLocation::line_start(filename, first),
            SourceLocation::line_start(filename, last),
        )
    }
}

pub fn extract_exact_line(
    source: &mut SourceFile,
    start: usize,
    function: &str,
) -> Result<FunctionBody, CompilerError> {
    let end = source.lines()[start + 1..]
        .iter()
        .position(|line| line.text.trim_end() == "}")
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| CompilerError::unterminated_body(function, source.location(start)))?;

    trace!("`{}` spans buffer lines {}..={}", function, start, end);
    Ok(FunctionBody {
        lines: source.take_span(start, end),
    })
}

pub fn extract_brace_depth(
    source: &mut SourceFile,
    start: usize,
    function: &str,
    open_brace: usize,
) -> Result<FunctionBody, CompilerError> {
    let (end, close) = find_closing_brace(source, start, open_brace)
        .ok_or_else(|| CompilerError::unterminated_body(function, source.location(start)))?;

    trace!("`{}` spans buffer lines {}..={}", function, start, end);
    let span = source.take_span(start, end);
    let declaration = &span[0];
    let closing = &span[span.len() - 1];

    let mut lines = vec![declaration.clone()];

    let first_end = if end == start { close } else { declaration.text.len() };
    let opening_rest = declaration.text[open_brace + 1..first_end].trim();
    if !opening_rest.is_empty() {
        lines.push(SourceLine {
            text: format!("\t{}", opening_rest),
            number: declaration.number,
        });
    }

    if end > start {
        lines.extend(span[1..span.len() - 1].iter().cloned());
        let before_close = closing.text[..close].trim_end();
        if !before_close.trim().is_empty() {
            lines.push(SourceLine {
                text: before_close.to_string(),
                number: closing.number,
            });
        }
    }

    lines.push(SourceLine {
        text: "}".to_string(),
        number: closing.number,
    });

    // code after the closing brace stays in the file
    let after_close = closing.text[close + 1..].trim();
    if !after_close.is_empty() {
        source.insert(
            start,
            SourceLine {
                text: after_close.to_string(),
                number: closing.number,
            },
        );
    }

    Ok(FunctionBody { lines })
}

/// Buffer index and byte offset of the brace matching the one at `open_brace`
fn find_closing_brace(source: &SourceFile, start: usize, open_brace: usize) -> Option<(usize, usize)> {
    let mut lexer = Lexer::new();
    let mut depth = 0usize;

    for (index, line) in source.lines().iter().enumerate().skip(start) {
        for token in lexer.tokenize_line(&line.text) {
            if index == start && token.start < open_brace {
                continue;
            }
            match token.token_type {
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some((index, token.start));
                    }
                }
                _ => {}
            }
        }
    }

    None
}

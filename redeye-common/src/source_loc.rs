//! Source location tracking for error reporting
//!
//! Worker files are processed line by line and declarations are cut out of
//! the working buffer as they are found, so every location here refers to the
//! line numbering of the file as it was read from disk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location of the first column of a line
    pub fn line_start(filename: &str, line: u32) -> Self {
        Self::new(filename, line, 1)
    }

    /// Create a dummy location for testing
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A span in a source file (from start to end location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Number of source lines covered by the span
    pub fn line_count(&self) -> u32 {
        self.end.line.saturating_sub(self.start.line) + 1
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.filename != self.end.filename {
            write!(f, "{} to {}", self.start, self.end)
        } else if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}:{}", self.start.filename, self.start.line)
            } else {
                write!(
                    f,
                    "{}:{}:{}-{}",
                    self.start.filename, self.start.line, self.start.column, self.end.column
                )
            }
        } else {
            write!(
                f,
                "{}:{}:{}-{}:{}",
                self.start.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new("fib.go", 42, 10);
        assert_eq!(loc.filename, "fib.go");
        assert_eq!(loc.line, 42);
        assert_eq!(loc.column, 10);
        assert_eq!(format!("{}", loc), "fib.go:42:10");
    }

    #[test]
    fn test_line_start() {
        let loc = SourceLocation::line_start("fib.go", 3);
        assert_eq!(format!("{}", loc), "fib.go:3:1");
    }

    #[test]
    fn test_source_span_different_lines() {
        let span = SourceSpan::new(
            SourceLocation::line_start("fib.go", 3),
            SourceLocation::line_start("fib.go", 10),
        );

        assert_eq!(format!("{}", span), "fib.go:3:1-10:1");
        assert_eq!(span.line_count(), 8);
    }

    #[test]
    fn test_single_line_span() {
        let span = SourceSpan::new(
            SourceLocation::line_start("fib.go", 7),
            SourceLocation::line_start("fib.go", 7),
        );
        assert_eq!(format!("{}", span), "fib.go:7");
        assert_eq!(span.line_count(), 1);
    }
}

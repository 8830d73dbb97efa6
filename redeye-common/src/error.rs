//! Error handling for the Redeye worker compiler
//!
//! Fatal problems abort the whole file and are reported through
//! [`CompilerError`]. Everything else (skipped declarations, calls left
//! untouched) is collected as a [`Diagnostic`] in an [`ErrorReporter`].

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("{location}: no closing brace found for function `{function}` before end of file")]
    UnterminatedBody {
        function: String,
        location: SourceLocation,
    },

    #[error("{location}: malformed parameter list for function `{function}`: {message}")]
    MalformedParameters {
        function: String,
        location: SourceLocation,
        message: String,
    },

    #[error("{location}: function `{name}` is already declared at {first}")]
    DuplicateFunction {
        name: String,
        location: SourceLocation,
        first: SourceLocation,
    },

    #[error("{location}: parameter `{parameter}` of `{function}` has type `{param_type}`, which cannot be string-encoded")]
    UnsupportedPayloadType {
        function: String,
        parameter: String,
        param_type: String,
        location: SourceLocation,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create an unterminated body error
    pub fn unterminated_body(function: &str, location: SourceLocation) -> Self {
        CompilerError::UnterminatedBody {
            function: function.to_string(),
            location,
        }
    }

    /// Create a malformed parameter list error
    pub fn malformed_parameters(function: &str, message: String, location: SourceLocation) -> Self {
        CompilerError::MalformedParameters {
            function: function.to_string(),
            location,
            message,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Severity of a non-fatal diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn warning(message: String, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            location,
            notes: Vec::new(),
        }
    }

    pub fn note(message: String, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Note,
            message,
            location,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }

        Ok(())
    }
}

/// Collects the non-fatal diagnostics of one compilation
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic built elsewhere
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Warning {
            self.warning_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Report a warning diagnostic
    pub fn warning(&mut self, message: String, location: SourceLocation) {
        self.report(Diagnostic::warning(message, location));
    }

    /// Report a note diagnostic
    pub fn note(&mut self, message: String, location: SourceLocation) {
        self.report(Diagnostic::note(message, location));
    }

    /// Get the number of warnings
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move all diagnostics out, leaving the reporter empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        let notes = self.diagnostics.len() - self.warning_count;
        match (self.warning_count, notes) {
            (0, 0) => "No warnings".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, n) => format!("{} note{}", n, if n == 1 { "" } else { "s" }),
            (w, n) => format!(
                "{} warning{} and {} note{}",
                w,
                if w == 1 { "" } else { "s" },
                n,
                if n == 1 { "" } else { "s" }
            ),
        }
    }
}

//! Redeye worker compiler - Common Types and Utilities
//!
//! This crate contains the error, diagnostic and source location types
//! shared by the compiler library and its command line driver.

pub mod error;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use source_loc::{SourceLocation, SourceSpan};

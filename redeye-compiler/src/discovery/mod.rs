//! Worker function discovery and parameter parsing
//!
//! A worker is a top-level declaration of the shape
//! `func name(params) (T, error) {`. Anything else in the file is left alone.

use crate::lexer::split_top_level;
use once_cell::sync::Lazy;
use redeye_common::{CompilerError, SourceLocation};
use regex::Regex;

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:func)\s+([a-z][A-Za-z0-9_]*)\s*\((.*?)\)\s*\((.*?),\s*error\)\s*\{(.*)$")
        .expect("declaration pattern is valid")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// The raw pieces of a matched declaration line
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationHead {
    pub name: String,
    pub params: String,
    pub return_type: String,
    /// Byte offset of the brace that opens the body
    pub open_brace: usize,
    /// Whatever follows the opening brace on the declaration line
    pub trailing: String,
}

impl DeclarationHead {
    /// `(T, error)` is the only supported result shape; `(A, B, error)` is not
    pub fn has_single_result(&self) -> bool {
        split_top_level(&self.return_type).len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub param_type: String,
}

impl Parameter {
    pub fn new(name: &str, param_type: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: param_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: String,
    pub declaration: String,
    pub location: SourceLocation,
}

impl FunctionSignature {
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Match a line against the supported declaration shape
pub fn match_declaration(line: &str) -> Option<DeclarationHead> {
    let caps = DECLARATION.captures(line)?;
    let trailing = caps.get(4)?;

    Some(DeclarationHead {
        name: caps[1].to_string(),
        params: caps[2].to_string(),
        return_type: caps[3].trim().to_string(),
        open_brace: trailing.start() - 1,
        trailing: trailing.as_str().to_string(),
    })
}

/// Parse a parameter list, resolving `a, b int` right to left
pub fn parse_params(
    text: &str,
    function: &str,
    location: &SourceLocation,
) -> Result<Vec<Parameter>, CompilerError> {
    let malformed =
        |message: String| CompilerError::malformed_parameters(function, message, location.clone());

    let mut params = Vec::new();
    let mut current_type: Option<String> = None;

    for part in split_top_level(text).iter().rev() {
        if part.is_empty() {
            return Err(malformed("empty parameter".to_string()));
        }

        let (name, declared) = match part.split_once(char::is_whitespace) {
            Some((name, ty)) => (name, Some(ty.trim().to_string())),
            None => (part.as_str(), None),
        };

        if !IDENTIFIER.is_match(name) {
            return Err(malformed(format!("`{}` is not a parameter name", name)));
        }

        if let Some(ty) = declared {
            if ty.starts_with("...") {
                return Err(malformed(format!("variadic parameter `{}` is not supported", name)));
            }
            current_type = Some(ty);
        }

        let param_type = current_type
            .clone()
            .ok_or_else(|| malformed(format!("parameter `{}` has no type", name)))?;
        params.push(Parameter::new(name, &param_type));
    }

    params.reverse();
    Ok(params)
}

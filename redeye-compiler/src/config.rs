//! Compiler configuration, loaded from JSON and overridable from the command line

use redeye_common::CompilerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How arguments cross the router boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marshaling {
    /// Fixed-size `[N]interface{}` bundle
    #[default]
    Bundle,
    /// One delimited string built with `fmt.Sprintf`
    StringEncoded,
}

/// What a handler does when an argument cannot be converted back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coercion {
    /// Fall back to the zero value
    #[default]
    Permissive,
    /// Return an error from the handler
    Strict,
}

/// How the end of a worker body is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryMode {
    /// First later line that is exactly `}`
    ExactLine,
    /// Matching brace, found by counting depth
    #[default]
    BraceDepth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub marshaling: Marshaling,
    pub coercion: Coercion,
    pub boundary: BoundaryMode,
    /// Turn `v := routed(...)` into a two-result assignment with an error check
    pub propagate_errors: bool,
    /// Leave calls alone when the callee name is shadowed by a local binding
    pub scope_aware: bool,
    /// Type of the router handle in generated signatures
    pub router_type: String,
    /// Separator between values of a string-encoded payload
    pub delimiter: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            marshaling: Marshaling::default(),
            coercion: Coercion::default(),
            boundary: BoundaryMode::default(),
            propagate_errors: true,
            scope_aware: true,
            router_type: "*Router".to_string(),
            delimiter: ":".to_string(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json(text: &str) -> Result<Self, CompilerError> {
        let config: CompilerConfig = serde_json::from_str(text).map_err(|e| CompilerError::ConfigError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        if self.router_type.trim().is_empty() {
            return Err(CompilerError::ConfigError {
                message: "router_type must not be empty".to_string(),
            });
        }
        if self.delimiter.is_empty() || self.delimiter.chars().any(merges_with_values) {
            return Err(CompilerError::ConfigError {
                message: format!(
                    "delimiter {:?} must be non-empty and must not contain letters, digits, whitespace or any of \"%.+-_\"",
                    self.delimiter
                ),
            });
        }
        Ok(())
    }
}

/// Characters a scanned number or verb could swallow
fn merges_with_values(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || matches!(c, '%' | '.' | '+' | '-' | '_')
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<CompilerConfig, CompilerError> {
    let content = std::fs::read_to_string(path)?;
    CompilerConfig::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.marshaling, Marshaling::Bundle);
        assert_eq!(config.coercion, Coercion::Permissive);
        assert_eq!(config.boundary, BoundaryMode::BraceDepth);
        assert!(config.propagate_errors);
        assert!(config.scope_aware);
        assert_eq!(config.router_type, "*Router");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CompilerConfig::from_json(r#"{"marshaling": "string-encoded", "boundary": "exact-line"}"#).unwrap();
        assert_eq!(config.marshaling, Marshaling::StringEncoded);
        assert_eq!(config.boundary, BoundaryMode::ExactLine);
        assert_eq!(config.delimiter, ":");
        assert!(config.propagate_errors);
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let err = CompilerConfig::from_json(r#"{"marshaling": "xml"}"#).unwrap_err();
        assert!(matches!(err, CompilerError::ConfigError { .. }));
    }

    #[test]
    fn test_bad_delimiter_is_rejected() {
        for delimiter in ["", "%", "1", "x", ".", "-", "+", "_", " ", "a|"] {
            let config = CompilerConfig {
                delimiter: delimiter.to_string(),
                ..CompilerConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("delimiter"), "{:?}", delimiter);
        }

        let err = CompilerConfig::from_json(r#"{"delimiter": "%"}"#).unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn test_punctuation_delimiters_are_accepted() {
        for delimiter in [":", "|", ";", "::", "/", "#"] {
            let config = CompilerConfig {
                delimiter: delimiter.to_string(),
                ..CompilerConfig::default()
            };
            assert!(config.validate().is_ok(), "{:?}", delimiter);
        }
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"coercion": "strict", "router_type": "*redeye.Router"}}"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.coercion, Coercion::Strict);
        assert_eq!(config.router_type, "*redeye.Router");
    }
}

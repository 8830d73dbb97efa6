//! Ordered registry of discovered workers
//!
//! Built once during discovery and only read afterwards. Iteration follows
//! declaration order, which is also the order of the generated code.

use crate::discovery::FunctionSignature;
use crate::extract::FunctionBody;
use indexmap::IndexMap;
use redeye_common::CompilerError;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub signature: FunctionSignature,
    pub body: FunctionBody,
}

impl FunctionEntry {
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    entries: IndexMap<String, FunctionEntry>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: FunctionEntry) -> Result<(), CompilerError> {
        if let Some(existing) = self.entries.get(entry.name()) {
            return Err(CompilerError::DuplicateFunction {
                name: entry.signature.name.clone(),
                location: entry.signature.location.clone(),
                first: existing.signature.location.clone(),
            });
        }
        self.entries.insert(entry.signature.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionEntry> {
        self.entries.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceLine;
    use redeye_common::SourceLocation;

    fn entry(name: &str, line: u32) -> FunctionEntry {
        let declaration = format!("func {}() (int, error) {{", name);
        FunctionEntry {
            signature: FunctionSignature {
                name: name.to_string(),
                params: Vec::new(),
                return_type: "int".to_string(),
                declaration: declaration.clone(),
                location: SourceLocation::line_start("w.go", line),
            },
            body: FunctionBody {
                lines: vec![
                    SourceLine { text: declaration, number: line },
                    SourceLine { text: "}".to_string(), number: line + 1 },
                ],
            },
        }
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let mut registry = FunctionRegistry::new();
        for (i, name) in ["zeta", "alpha", "mid"].iter().enumerate() {
            registry.insert(entry(name, i as u32 * 3 + 1)).unwrap();
        }
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.iter().map(|e| e.name()).collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert!(registry.contains("alpha"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = FunctionRegistry::new();
        registry.insert(entry("work", 1)).unwrap();
        let err = registry.insert(entry("work", 9)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "w.go:9:1: function `work` is already declared at w.go:1:1"
        );
        assert_eq!(registry.len(), 1);
    }
}

//! Redeye worker compiler
//!
//! Turns the `func name(params) (T, error)` workers of a Go source file into
//! routed units: the original bodies are registered with a router as named
//! handlers, and every worker is replaced by a wrapper that dispatches through
//! the router. Calls between workers are rewritten to carry the routing
//! context of their caller.
//!
//! The passes run in order over one mutable buffer:
//! discovery and extraction, call-site rewriting, code generation, import
//! insertion and rendering.

pub mod codegen;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod imports;
pub mod lexer;
pub mod registry;
pub mod rewrite;
pub mod source;


use config::BoundaryMode;
use log::{debug, warn};
use redeye_common::{CompilerError, Diagnostic, ErrorReporter};
use std::path::Path;

pub use codegen::{CodeGenerator, GeneratedDeclaration};
pub use config::{load_config, Coercion, CompilerConfig, Marshaling};
pub use discovery::{FunctionSignature, Parameter};
pub use registry::FunctionRegistry;
pub use source::SourceFile;

/// Result of compiling one file
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub output: String,
    /// Workers found, in declaration order
    pub functions: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct WorkerCompiler {
    config: CompilerConfig,
    reporter: ErrorReporter,
}

impl WorkerCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile the contents of `path`. Any error aborts the whole file.
    pub fn compile(&mut self, input: &str, path: &Path) -> Result<CompiledUnit, CompilerError> {
        self.config.validate()?;

        let filename = path.display().to_string();
        let mut source = SourceFile::parse(input, &filename);

        let registry = self.collect_workers(&mut source)?;
        debug!("{}: {} worker(s) found", filename, registry.len());

        let bodies = rewrite::rewrite_bodies(&registry, &self.config, &filename, &mut self.reporter);

        let generator = CodeGenerator::new(&self.config);
        let generated = generator.generate(&registry, &bodies)?;
        if !generated.is_empty() {
            for package in generator.required_imports(&registry) {
                imports::ensure_import(&mut source, package);
            }
        }

        let texts: Vec<String> = generated.into_iter().map(|d| d.text).collect();
        let output = source.render(&texts);

        if self.reporter.warning_count() > 0 {
            debug!("{}: {}", filename, self.reporter.summary());
        }

        Ok(CompiledUnit {
            output,
            functions: registry.names(),
            diagnostics: self.reporter.take(),
        })
    }

    /// Discovery and extraction: every worker is cut out of `source` and registered
    fn collect_workers(&mut self, source: &mut SourceFile) -> Result<FunctionRegistry, CompilerError> {
        let mut registry = FunctionRegistry::new();
        let mut index = 0;

        while index < source.len() {
            let Some(head) = discovery::match_declaration(&source.lines()[index].text) else {
                index += 1;
                continue;
            };
            let location = source.location(index);

            if !head.has_single_result() {
                warn!("{}: skipping `{}`, it returns more than one value", location, head.name);
                self.reporter.warning(
                    format!("`{}` returns ({}, error); only (T, error) workers are compiled", head.name, head.return_type),
                    location,
                );
                index += 1;
                continue;
            }

            let params = discovery::parse_params(&head.params, &head.name, &location)?;

            let body = match self.config.boundary {
                BoundaryMode::ExactLine => {
                    let trailing = head.trailing.trim();
                    if !trailing.is_empty() && !trailing.starts_with("//") {
                        warn!("{}: skipping `{}`, code follows the opening brace", location, head.name);
                        self.reporter.warning(
                            format!("`{}` has code after its opening brace and cannot be delimited by line", head.name),
                            location,
                        );
                        index += 1;
                        continue;
                    }
                    extract::extract_exact_line(source, index, &head.name)?
                }
                BoundaryMode::BraceDepth => extract::extract_brace_depth(source, index, &head.name, head.open_brace)?,
            };

            debug!(
                "registered worker `{}` with {} parameter(s) at {}",
                head.name,
                params.len(),
                body.span(source.filename())
            );
            registry.insert(registry::FunctionEntry {
                signature: FunctionSignature {
                    name: head.name,
                    params,
                    return_type: head.return_type,
                    declaration: body.declaration().text.clone(),
                    location,
                },
                body,
            })?;
        }

        Ok(registry)
    }
}

/// Compile with a fresh compiler
pub fn compile(input: &str, path: &Path, config: CompilerConfig) -> Result<CompiledUnit, CompilerError> {
    WorkerCompiler::new(config).compile(input, path)
}

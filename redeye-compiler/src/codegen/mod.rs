//! Generation of the routed declarations
//!
//! Every worker becomes two declarations, emitted in registry order:
//! `defineX`, which registers the original body with the router as a named
//! handler, and a wrapper with the worker's own name that sends its arguments
//! through `Get`. How arguments travel between the two is up to the
//! [`Marshaler`] chosen from the configuration.

pub mod bundle;
pub mod encoded;

use crate::config::{Coercion, CompilerConfig, Marshaling};
use crate::discovery::FunctionSignature;
use crate::registry::FunctionRegistry;
use crate::rewrite::{RewrittenBody, CONTEXT_HANDLE, ROUTER_HANDLE, ZERO_VALUE};
use log::debug;
use redeye_common::CompilerError;

pub use bundle::BundleMarshaler;
pub use encoded::{payload_template, StringMarshaler};

/// Names used by generated code; all `__` prefixed to stay clear of user identifiers
pub const CALLER: &str = "__caller";
pub const CONTEXT: &str = "__context";
pub const PAYLOAD: &str = "__payload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDeclaration {
    pub name: String,
    pub text: String,
}

/// One way of moving arguments across the router boundary
pub trait Marshaler {
    /// Type of the caller context in wrapper signatures and of the handler input
    fn context_type(&self) -> &'static str;

    /// Reject signatures this strategy cannot carry
    fn check(&self, _signature: &FunctionSignature) -> Result<(), CompilerError> {
        Ok(())
    }

    /// Handler prologue: bind every parameter from the handler input
    fn write_unpack(&self, out: &mut GoWriter, signature: &FunctionSignature, body: &RewrittenBody);

    /// Wrapper prologue: build `__payload` from the parameters
    fn write_pack(&self, out: &mut GoWriter, signature: &FunctionSignature);

    /// Packages the generated code refers to
    fn imports(&self) -> Vec<&'static str>;
}

/// Indented Go text, one line at a time
#[derive(Debug, Default)]
pub struct GoWriter {
    text: String,
    depth: usize,
}

impl GoWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.text.push('\t');
            }
            self.text.push_str(line);
        }
        self.text.push('\n');
    }

    /// A line taken verbatim from the input, already carrying one level of indentation
    pub fn body_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            self.text.push('\n');
            return;
        }
        for _ in 1..self.depth {
            self.text.push('\t');
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.text
    }
}

pub struct CodeGenerator {
    marshaler: Box<dyn Marshaler>,
    coercion: Coercion,
    router_type: String,
}

impl CodeGenerator {
    pub fn new(config: &CompilerConfig) -> Self {
        let marshaler: Box<dyn Marshaler> = match config.marshaling {
            Marshaling::Bundle => Box::new(BundleMarshaler::new(config.coercion)),
            Marshaling::StringEncoded => Box::new(StringMarshaler::new(config.coercion, &config.delimiter)),
        };

        Self {
            marshaler,
            coercion: config.coercion,
            router_type: config.router_type.clone(),
        }
    }

    /// `defineX` and `x` for every worker; `bodies` is parallel to the registry
    pub fn generate(
        &self,
        registry: &FunctionRegistry,
        bodies: &[RewrittenBody],
    ) -> Result<Vec<GeneratedDeclaration>, CompilerError> {
        if registry.len() != bodies.len() {
            return Err(CompilerError::InternalError {
                message: format!("{} workers but {} rewritten bodies", registry.len(), bodies.len()),
            });
        }

        let mut declarations = Vec::with_capacity(registry.len() * 2);
        for (entry, body) in registry.iter().zip(bodies) {
            let signature = &entry.signature;
            self.marshaler.check(signature)?;

            debug!("generating {} and {}", define_name(&signature.name), signature.name);
            declarations.push(GeneratedDeclaration {
                name: define_name(&signature.name),
                text: self.handler(signature, body),
            });
            declarations.push(GeneratedDeclaration {
                name: signature.name.clone(),
                text: self.wrapper(signature),
            });
        }

        Ok(declarations)
    }

    /// Packages the generated code for `registry` needs imported.
    /// Workers without parameters pack and unpack nothing, so they need none.
    pub fn required_imports(&self, registry: &FunctionRegistry) -> Vec<&'static str> {
        if registry.iter().all(|entry| entry.signature.params.is_empty()) {
            return Vec::new();
        }

        let mut imports = self.marshaler.imports();
        if self.coercion == Coercion::Strict && !imports.contains(&"fmt") {
            imports.push("fmt");
        }
        imports
    }

    fn handler(&self, signature: &FunctionSignature, body: &RewrittenBody) -> String {
        let mut out = GoWriter::new();
        out.line(format!(
            "func {}({} {}) {{",
            define_name(&signature.name),
            ROUTER_HANDLE,
            self.router_type
        ));
        out.indent();
        out.line(format!(
            "{}.Define(\"{}\", func({} {}) (interface{{}}, error) {{",
            ROUTER_HANDLE,
            signature.name,
            CONTEXT_HANDLE,
            self.marshaler.context_type()
        ));
        out.indent();

        self.marshaler.write_unpack(&mut out, signature, body);
        if body.propagates_errors {
            out.line(format!("var {} {}", ZERO_VALUE, signature.return_type));
        }

        out.line(format!("return func() ({}, error) {{", signature.return_type));
        out.indent();
        for line in body.inner() {
            out.body_line(line);
        }
        out.dedent();
        out.line("}()");

        out.dedent();
        out.line("})");
        out.dedent();
        out.line("}");
        out.finish()
    }

    fn wrapper(&self, signature: &FunctionSignature) -> String {
        let mut params = vec![
            format!("{} {}", ROUTER_HANDLE, self.router_type),
            format!("{} string", CALLER),
            format!("{} {}", CONTEXT, self.marshaler.context_type()),
        ];
        params.extend(signature.params.iter().map(|p| format!("{} {}", p.name, p.param_type)));

        let mut out = GoWriter::new();
        out.line(format!(
            "func {}({}) ({}, error) {{",
            signature.name,
            params.join(", "),
            signature.return_type
        ));
        out.indent();
        self.marshaler.write_pack(&mut out, signature);
        out.line(format!(
            "__value, __err := {}.Get(\"{}\", {}, {}, {})",
            ROUTER_HANDLE, signature.name, PAYLOAD, CALLER, CONTEXT
        ));
        out.line("if __err != nil {");
        out.indent();
        out.line(format!("var __zero {}", signature.return_type));
        out.line("return __zero, __err");
        out.dedent();
        out.line("}");
        out.line(format!("return __value.({}), nil", signature.return_type));
        out.dedent();
        out.line("}");
        out.finish()
    }
}

/// `double` -> `defineDouble`
pub fn define_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("define{}{}", first.to_uppercase(), chars.as_str()),
        None => "define".to_string(),
    }
}

/// Go interpreted string literal for `text`
pub fn go_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

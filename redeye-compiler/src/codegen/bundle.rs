//! Arguments as a fixed-size `[N]interface{}` bundle

use super::{GoWriter, Marshaler, PAYLOAD};
use crate::config::Coercion;
use crate::discovery::FunctionSignature;
use crate::lexer::Lexer;
use crate::rewrite::{RewrittenBody, CONTEXT_HANDLE};

const BUNDLE: &str = "__bundle";

pub struct BundleMarshaler {
    coercion: Coercion,
}

impl BundleMarshaler {
    pub fn new(coercion: Coercion) -> Self {
        Self { coercion }
    }
}

impl Marshaler for BundleMarshaler {
    fn context_type(&self) -> &'static str {
        "interface{}"
    }

    fn write_unpack(&self, out: &mut GoWriter, signature: &FunctionSignature, body: &RewrittenBody) {
        let arity = signature.params.len();
        if arity == 0 {
            return;
        }

        match self.coercion {
            Coercion::Permissive => {
                out.line(format!(
                    "{}, _ := {}.([{}]interface{{}})",
                    BUNDLE, CONTEXT_HANDLE, arity
                ));
                for (slot, param) in signature.params.iter().enumerate() {
                    out.line(format!("{}, _ := {}[{}].({})", param.name, BUNDLE, slot, param.param_type));
                }
            }
            Coercion::Strict => {
                out.line(format!(
                    "{}, __ok := {}.([{}]interface{{}})",
                    BUNDLE, CONTEXT_HANDLE, arity
                ));
                out.line("if !__ok {");
                out.indent();
                out.line(format!(
                    "return nil, fmt.Errorf(\"{}: expected [{}]interface{{}} arguments, got %T\", {})",
                    signature.name, arity, CONTEXT_HANDLE
                ));
                out.dedent();
                out.line("}");
                for (slot, param) in signature.params.iter().enumerate() {
                    out.line(format!("{}, __ok := {}[{}].({})", param.name, BUNDLE, slot, param.param_type));
                    out.line("if !__ok {");
                    out.indent();
                    out.line(format!(
                        "return nil, fmt.Errorf(\"{}: argument {} ({}) is not {}: %T\", {}[{}])",
                        signature.name,
                        slot,
                        param.name,
                        param.param_type.replace('"', "\\\""),
                        BUNDLE,
                        slot
                    ));
                    out.dedent();
                    out.line("}");
                }
            }
        }

        // Go rejects locals that are never read
        for param in &signature.params {
            if !mentions(body, &param.name) {
                out.line(format!("_ = {}", param.name));
            }
        }
    }

    fn write_pack(&self, out: &mut GoWriter, signature: &FunctionSignature) {
        let names: Vec<&str> = signature.param_names();
        out.line(format!(
            "{} := [{}]interface{{}}{{{}}}",
            PAYLOAD,
            names.len(),
            names.join(", ")
        ));
    }

    fn imports(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Whether `name` appears as an identifier anywhere in the body
fn mentions(body: &RewrittenBody, name: &str) -> bool {
    let mut lexer = Lexer::new();
    body.inner()
        .iter()
        .any(|line| lexer.tokenize_line(line).iter().any(|t| t.identifier() == Some(name)))
}

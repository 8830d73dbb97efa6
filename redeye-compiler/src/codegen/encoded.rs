//! Arguments as one delimited string
//!
//! The wrapper formats every parameter into a single payload with
//! `fmt.Sprintf`, the handler scans it back with `fmt.Sscanf` using the same
//! template. Strings use `%q` so that a delimiter inside a value survives the
//! round trip; every other scalar uses `%v`.

use super::{go_quote, GoWriter, Marshaler, PAYLOAD};
use crate::config::Coercion;
use crate::discovery::{FunctionSignature, Parameter};
use crate::rewrite::{RewrittenBody, CONTEXT_HANDLE};
use redeye_common::CompilerError;

const SCALAR_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "byte", "rune", "float32", "float64", "complex64", "complex128",
];

pub struct StringMarshaler {
    coercion: Coercion,
    delimiter: String,
}

impl StringMarshaler {
    pub fn new(coercion: Coercion, delimiter: &str) -> Self {
        Self {
            coercion,
            delimiter: delimiter.to_string(),
        }
    }
}

/// Whether values of `param_type` survive a `Sprintf`/`Sscanf` round trip
pub fn is_scalar(param_type: &str) -> bool {
    SCALAR_TYPES.contains(&param_type.trim())
}

/// `%v:%q:%v` for `(a int, s string, b bool)` with delimiter `:`
pub fn payload_template(params: &[Parameter], delimiter: &str) -> String {
    params
        .iter()
        .map(|p| if p.param_type.trim() == "string" { "%q" } else { "%v" })
        .collect::<Vec<_>>()
        .join(delimiter)
}

impl Marshaler for StringMarshaler {
    fn context_type(&self) -> &'static str {
        "string"
    }

    fn check(&self, signature: &FunctionSignature) -> Result<(), CompilerError> {
        match signature.params.iter().find(|p| !is_scalar(&p.param_type)) {
            Some(param) => Err(CompilerError::UnsupportedPayloadType {
                function: signature.name.clone(),
                parameter: param.name.clone(),
                param_type: param.param_type.clone(),
                location: signature.location.clone(),
            }),
            None => Ok(()),
        }
    }

    fn write_unpack(&self, out: &mut GoWriter, signature: &FunctionSignature, _body: &RewrittenBody) {
        if signature.params.is_empty() {
            return;
        }

        for param in &signature.params {
            out.line(format!("var {} {}", param.name, param.param_type));
        }

        let template = go_quote(&payload_template(&signature.params, &self.delimiter));
        let targets = signature
            .params
            .iter()
            .map(|p| format!("&{}", p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let scan = format!("fmt.Sscanf({}, {}, {})", CONTEXT_HANDLE, template, targets);

        match self.coercion {
            Coercion::Permissive => out.line(scan),
            Coercion::Strict => {
                out.line(format!("if _, __err := {}; __err != nil {{", scan));
                out.indent();
                out.line(format!(
                    "return nil, fmt.Errorf(\"{}: cannot decode payload %q: %v\", {}, __err)",
                    signature.name, CONTEXT_HANDLE
                ));
                out.dedent();
                out.line("}");
            }
        }
    }

    fn write_pack(&self, out: &mut GoWriter, signature: &FunctionSignature) {
        if signature.params.is_empty() {
            out.line(format!("{} := \"\"", PAYLOAD));
            return;
        }

        let template = go_quote(&payload_template(&signature.params, &self.delimiter));
        out.line(format!(
            "{} := fmt.Sprintf({}, {})",
            PAYLOAD,
            template,
            signature.param_names().join(", ")
        ));
    }

    fn imports(&self) -> Vec<&'static str> {
        vec!["fmt"]
    }
}

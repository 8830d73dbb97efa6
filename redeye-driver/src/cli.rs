use clap::{Parser, ValueEnum};
use redeye_compiler::config::BoundaryMode;
use redeye_compiler::{Coercion, CompilerConfig, Marshaling};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "redeye",
    about = "Compile worker functions into routed handlers",
    long_about = "redeye - worker compiler\n\nRewrites every `func name(params) (T, error)` worker of a Go file into a router registration and a routed wrapper, and writes the result under the same file name into TARGET_DIR.",
    version
)]
pub struct Cli {
    /// Go source file containing the workers
    pub input: PathBuf,

    /// Directory the compiled file is written to
    pub target_dir: PathBuf,

    /// JSON configuration file; flags below override it
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How arguments are passed to handlers
    #[arg(long, value_enum)]
    pub marshaling: Option<MarshalingArg>,

    /// What handlers do with arguments of the wrong type
    #[arg(long, value_enum)]
    pub coercion: Option<CoercionArg>,

    /// How the end of a worker body is found
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryArg>,

    /// Keep `v := worker(...)` as a single-value assignment
    #[arg(long)]
    pub no_propagate: bool,

    /// Rewrite calls even when the worker name is shadowed locally
    #[arg(long)]
    pub no_scope_check: bool,

    /// Type of the router handle in generated signatures
    #[arg(long, value_name = "TYPE")]
    pub router_type: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command line overrides on top of `config`
    pub fn apply(&self, config: &mut CompilerConfig) {
        if let Some(marshaling) = self.marshaling {
            config.marshaling = marshaling.to_marshaling();
        }
        if let Some(coercion) = self.coercion {
            config.coercion = coercion.to_coercion();
        }
        if let Some(boundary) = self.boundary {
            config.boundary = boundary.to_boundary();
        }
        if self.no_propagate {
            config.propagate_errors = false;
        }
        if self.no_scope_check {
            config.scope_aware = false;
        }
        if let Some(router_type) = &self.router_type {
            config.router_type = router_type.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MarshalingArg {
    Bundle,
    StringEncoded,
}

impl MarshalingArg {
    pub fn to_marshaling(&self) -> Marshaling {
        match self {
            MarshalingArg::Bundle => Marshaling::Bundle,
            MarshalingArg::StringEncoded => Marshaling::StringEncoded,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CoercionArg {
    Permissive,
    Strict,
}

impl CoercionArg {
    pub fn to_coercion(&self) -> Coercion {
        match self {
            CoercionArg::Permissive => Coercion::Permissive,
            CoercionArg::Strict => Coercion::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BoundaryArg {
    BraceDepth,
    ExactLine,
}

impl BoundaryArg {
    pub fn to_boundary(&self) -> BoundaryMode {
        match self {
            BoundaryArg::BraceDepth => BoundaryMode::BraceDepth,
            BoundaryArg::ExactLine => BoundaryMode::ExactLine,
        }
    }
}

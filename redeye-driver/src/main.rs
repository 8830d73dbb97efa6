//! Redeye command line driver
//!
//! Reads one worker file, compiles it and writes the result to
//! `<TARGET_DIR>/<file name>`. Nothing is written when compilation fails.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use log::{debug, info};
use redeye_common::{Diagnostic, Severity};
use redeye_compiler::{load_config, CompilerConfig, WorkerCompiler};
use std::fs;
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn build_config(cli: &Cli) -> Result<CompilerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    cli.apply(&mut config);
    Ok(config)
}

fn colorize(diagnostic: &Diagnostic) -> colored::ColoredString {
    let text = diagnostic.to_string();
    match diagnostic.severity {
        Severity::Warning => text.yellow(),
        Severity::Note => text.cyan(),
    }
}

/// Compile `cli.input` and return the path of the written file
fn run(cli: &Cli) -> Result<PathBuf> {
    let config = build_config(cli)?;
    debug!("configuration: {:?}", config);

    let input = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let Some(file_name) = cli.input.file_name() else {
        bail!("{} does not name a file", cli.input.display());
    };
    if !cli.target_dir.is_dir() {
        bail!("target directory {} does not exist", cli.target_dir.display());
    }
    let output_path = cli.target_dir.join(file_name);

    let mut compiler = WorkerCompiler::new(config);
    let unit = compiler.compile(&input, &cli.input)?;

    for diagnostic in &unit.diagnostics {
        eprintln!("{}", colorize(diagnostic));
    }

    fs::write(&output_path, &unit.output)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!(
        "compiled {} worker(s) from {} into {}",
        unit.functions.len(),
        cli.input.display(),
        output_path.display()
    );
    Ok(output_path)
}

//! Import insertion for packages the generated code uses

use crate::source::{SourceFile, SourceLine};
use log::debug;

/// Whether `line` already imports `package` under its own name, alone or
/// inside a one-line group. Renamed and blank imports do not count.
fn imports_package(line: &str, package: &str) -> bool {
    let line = line.split_once("//").map_or(line, |(code, _)| code).trim();

    if let Some(group) = line.strip_prefix("import (") {
        let group = group.rsplit_once(')').map_or(group, |(entries, _)| entries);
        return group.split(';').any(|entry| names_package(entry, package));
    }

    let entry = line.strip_prefix("import ").unwrap_or(line);
    names_package(entry, package)
}

/// `"fmt"` or `fmt "fmt"`
fn names_package(entry: &str, package: &str) -> bool {
    let quoted = format!("\"{}\"", package);
    match entry.split_whitespace().collect::<Vec<_>>()[..] {
        [path] => path == quoted,
        [alias, path] => alias == package && path == quoted,
        _ => false,
    }
}

/// Add `import "package"` after the package clause unless the file already has it.
/// Returns whether a line was inserted.
pub fn ensure_import(source: &mut SourceFile, package: &str) -> bool {
    if source.lines().iter().any(|line| imports_package(&line.text, package)) {
        return false;
    }

    let clause = source
        .lines()
        .iter()
        .position(|line| line.text.trim_start().starts_with("package "));
    let import = format!("import \"{}\"", package);

    match clause {
        Some(index) => {
            let number = source.lines()[index].number;
            source.insert(index + 1, SourceLine { text: import, number });
            source.insert(index + 1, SourceLine { text: String::new(), number });
        }
        None => source.insert(0, SourceLine { text: import, number: 0 }),
    }

    debug!("inserted import of {:?} into {}", package, source.filename());
    true
}

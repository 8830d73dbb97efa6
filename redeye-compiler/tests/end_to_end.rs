use pretty_assertions::assert_eq;
use redeye_compiler::{compile, load_config, CompilerConfig, Marshaling, WorkerCompiler};
use std::path::{Path, PathBuf};

fn demo(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("demos").join(path)
}

fn read_demo(path: &str) -> String {
    std::fs::read_to_string(demo(path)).unwrap()
}

#[test]
fn fib_demo_compiles_with_demo_config() {
    let config = load_config(&demo("redeye.json")).unwrap();
    assert_eq!(config, CompilerConfig::default());

    let unit = compile(&read_demo("workers/fib.go"), Path::new("fib.go"), config).unwrap();
    assert_eq!(unit.functions, vec!["fib", "label"]);
    assert!(unit.diagnostics.is_empty());

    let generated: Vec<&str> = unit
        .output
        .lines()
        .filter_map(|line| line.strip_prefix("func "))
        .map(|rest| rest.split('(').next().unwrap())
        .collect();
    assert_eq!(generated, vec!["defineFib", "fib", "defineLabel", "label"]);

    assert!(unit
        .output
        .contains("f1, err := fib(__router, \"fib\", __args, n - 1); if err != nil { return __zv, err }"));
    assert!(unit
        .output
        .contains("v, err := fib(__router, \"label\", __args, n); if err != nil { return __zv, err }"));
    assert!(unit.output.contains("\t\tvar __zv string\n"));
}

#[test]
fn fib_demo_string_encoded_keeps_single_fmt_import() {
    let config = CompilerConfig {
        marshaling: Marshaling::StringEncoded,
        ..CompilerConfig::default()
    };
    let mut compiler = WorkerCompiler::new(config);
    let unit = compiler.compile(&read_demo("workers/fib.go"), Path::new("fib.go")).unwrap();

    assert_eq!(unit.output.matches("\"fmt\"").count(), 1);
    assert!(unit.output.contains("__payload := fmt.Sprintf(\"%v:%q\", n, name)"));
    assert!(unit.output.contains("fmt.Sscanf(__args, \"%v:%q\", &n, &name)"));
}

#[test]
fn output_is_stable_across_runs() {
    let input = read_demo("workers/fib.go");
    let first = compile(&input, Path::new("fib.go"), CompilerConfig::default()).unwrap();
    let second = compile(&input, Path::new("fib.go"), CompilerConfig::default()).unwrap();
    assert_eq!(first.output, second.output);
}

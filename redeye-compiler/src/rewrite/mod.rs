//! Call-site rewriting inside worker bodies
//!
//! Every call to another registered worker gets the routing arguments
//! `__router, "<caller>", __args` spliced in front of its own arguments, so
//! the router sees who asked for what. Each line is tokenized once and rebuilt
//! left to right; emitted text is never scanned again.

pub mod scope;

use crate::config::CompilerConfig;
use crate::discovery::FunctionSignature;
use crate::lexer::{matching_paren, split_top_level, tokenize, Lexer, Token, TokenType};
use crate::registry::{FunctionEntry, FunctionRegistry};
use log::{debug, trace};
use once_cell::sync::Lazy;
use redeye_common::{Diagnostic, ErrorReporter, SourceLocation};
use regex::Regex;
use scope::ScopeStack;

pub const ROUTER_HANDLE: &str = "__router";
pub const CONTEXT_HANDLE: &str = "__args";
pub const ZERO_VALUE: &str = "__zv";

/// `v := ` at the start of a statement or after a case label, right before a call
static ASSIGNMENT_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[;{:])\s*([A-Za-z_][A-Za-z0-9_]*)\s*:=\s*$").expect("assignment pattern is valid")
});

/// A body after rewriting, ready for code generation
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenBody {
    pub lines: Vec<String>,
    /// Some line returns `__zv` on error, so the handler has to declare it
    pub propagates_errors: bool,
}

impl RewrittenBody {
    /// Lines between the declaration and the closing brace
    pub fn inner(&self) -> &[String] {
        if self.lines.len() < 2 {
            return &[];
        }
        &self.lines[1..self.lines.len() - 1]
    }
}

/// A call to a registered worker found in a token list
#[derive(Debug, Clone)]
pub struct CallSite<'r> {
    pub callee: &'r FunctionEntry,
    /// Token index of the callee name
    pub name: usize,
    /// Token indices of the argument parentheses
    pub open: usize,
    pub close: usize,
}

struct LineContext<'c> {
    caller: &'c FunctionSignature,
    scopes: &'c ScopeStack,
    reporter: &'c mut ErrorReporter,
    filename: &'c str,
    line: u32,
    propagates: bool,
}

impl LineContext<'_> {
    fn location(&self, offset: usize) -> SourceLocation {
        SourceLocation::new(self.filename, self.line, offset as u32 + 1)
    }
}

pub struct CallRewriter<'a> {
    registry: &'a FunctionRegistry,
    propagate_errors: bool,
    scope_aware: bool,
    filename: &'a str,
}

impl<'a> CallRewriter<'a> {
    pub fn new(registry: &'a FunctionRegistry, config: &CompilerConfig, filename: &'a str) -> Self {
        Self {
            registry,
            propagate_errors: config.propagate_errors,
            scope_aware: config.scope_aware,
            filename,
        }
    }

    pub fn rewrite_body(&self, entry: &FunctionEntry, reporter: &mut ErrorReporter) -> RewrittenBody {
        let caller = &entry.signature;
        let mut scopes = ScopeStack::for_body(&caller.param_names());
        let mut lexer = Lexer::new();
        let mut propagates_errors = false;

        let mut lines = vec![entry.body.declaration().text.clone()];
        for line in entry.body.inner() {
            let tokens = lexer.tokenize_line(&line.text);
            let mut ctx = LineContext {
                caller,
                scopes: &scopes,
                reporter: &mut *reporter,
                filename: self.filename,
                line: line.number,
                propagates: false,
            };
            let rewritten = self.rewrite_segment(&line.text, &tokens, &mut ctx, true);
            propagates_errors |= ctx.propagates;

            if rewritten != line.text {
                trace!("{}:{}: {}", self.filename, line.number, rewritten.trim());
            }
            scopes.observe(&tokens);
            lines.push(rewritten);
        }
        if let Some(closing) = entry.body.lines.last().filter(|_| entry.body.lines.len() > 1) {
            lines.push(closing.text.clone());
        }

        RewrittenBody {
            lines,
            propagates_errors,
        }
    }

    /// Find a routable call whose name is the token at `index`
    fn call_site(&self, tokens: &[Token], index: usize, ctx: &mut LineContext<'_>) -> Option<CallSite<'a>> {
        let token = &tokens[index];
        let name = token.identifier()?;
        let callee = self.registry.get(name)?;

        let open = index + 1;
        let adjacent_paren = tokens
            .get(open)
            .map(|t| t.token_type == TokenType::LeftParen && t.start == token.end)
            .unwrap_or(false);
        if !adjacent_paren {
            return None;
        }

        let location = ctx.location(token.start);
        let Some(close) = matching_paren(tokens, open) else {
            ctx.reporter.report(
                Diagnostic::warning(
                    format!("call to `{}` spans multiple lines and was left unchanged", name),
                    location.clone(),
                )
                .with_note("join its arguments onto one line to route it".to_string()),
            );
            return None;
        };

        if self.scope_aware {
            if is_selector(tokens, index) {
                ctx.reporter.note(
                    format!("`{}` is called through a selector and was not routed", name),
                    location.clone(),
                );
                return None;
            }
            if ctx.scopes.is_bound(name) {
                ctx.reporter.note(
                    format!("`{}` is shadowed by a local binding; call was not routed", name),
                    location.clone(),
                );
                return None;
            }
        }

        Some(CallSite {
            callee,
            name: index,
            open,
            close,
        })
    }

    fn rewrite_segment(&self, text: &str, tokens: &[Token], ctx: &mut LineContext<'_>, top_level: bool) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut index = 0;

        while index < tokens.len() {
            let Some(site) = self.call_site(tokens, index, ctx) else {
                index += 1;
                continue;
            };

            let inner = &text[tokens[site.open].end..tokens[site.close].start];
            let args = split_top_level(inner);
            let call_end = tokens[site.close].end;

            if args.first().map(String::as_str) == Some(ROUTER_HANDLE) {
                // already routed
                index = site.close + 1;
                continue;
            }

            out.push_str(&text[last..tokens[site.name].start]);
            let call = self.routed_call(&site, &args, ctx);

            let binding_end = if top_level && self.propagate_errors && ends_statement(&text[call_end..]) {
                ASSIGNMENT_TAIL
                    .captures(&out)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.end())
            } else {
                None
            };

            match binding_end {
                Some(end) => {
                    out.truncate(end);
                    out.push_str(", err := ");
                    out.push_str(&call);
                    out.push_str(&format!("; if err != nil {{ return {}, err }}", ZERO_VALUE));
                    ctx.propagates = true;
                }
                None => out.push_str(&call),
            }

            last = call_end;
            index = site.close + 1;
        }

        out.push_str(&text[last..]);
        out
    }

    fn routed_call(&self, site: &CallSite<'_>, args: &[String], ctx: &mut LineContext<'_>) -> String {
        let callee = &site.callee.signature;
        let callee_params = callee.param_names();
        let caller_params = ctx.caller.param_names();

        let pass_through = !args.is_empty()
            && args.len() == callee_params.len()
            && args
                .iter()
                .all(|arg| callee_params.contains(&arg.as_str()) || caller_params.contains(&arg.as_str()));

        let forwarded: Vec<String> = if pass_through {
            callee_params.iter().map(|p| p.to_string()).collect()
        } else {
            args.iter().map(|arg| self.rewrite_nested(arg, ctx)).collect()
        };

        let mut routed = vec![
            ROUTER_HANDLE.to_string(),
            format!("\"{}\"", ctx.caller.name),
            CONTEXT_HANDLE.to_string(),
        ];
        routed.extend(forwarded);

        debug!(
            "routing call {} -> {}{}",
            ctx.caller.name,
            callee.name,
            if pass_through { " (pass-through)" } else { "" }
        );
        format!("{}({})", callee.name, routed.join(", "))
    }

    fn rewrite_nested(&self, arg: &str, ctx: &mut LineContext<'_>) -> String {
        let tokens = tokenize(arg);
        self.rewrite_segment(arg, &tokens, ctx, false)
    }
}

/// Rewrite every body in the registry, in registry order
pub fn rewrite_bodies(
    registry: &FunctionRegistry,
    config: &CompilerConfig,
    filename: &str,
    reporter: &mut ErrorReporter,
) -> Vec<RewrittenBody> {
    let rewriter = CallRewriter::new(registry, config, filename);
    registry
        .iter()
        .map(|entry| rewriter.rewrite_body(entry, reporter))
        .collect()
}

/// `recv.name(` or `pkg.name(`
fn is_selector(tokens: &[Token], index: usize) -> bool {
    tokens[..index]
        .iter()
        .rev()
        .find(|t| t.token_type != TokenType::Whitespace)
        .map(|t| t.token_type == TokenType::Dot)
        .unwrap_or(false)
}

/// Nothing but the end of the statement follows the call
fn ends_statement(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with(';') || rest.starts_with('}') || rest.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Parameter;
    use crate::extract::FunctionBody;
    use crate::source::SourceLine;
    use pretty_assertions::assert_eq;

    fn worker(name: &str, params: &[(&str, &str)], body: &[&str]) -> FunctionEntry {
        let declaration = format!("func {}(...) (int, error) {{", name);
        let mut lines = vec![SourceLine {
            text: declaration.clone(),
            number: 1,
        }];
        for (i, text) in body.iter().enumerate() {
            lines.push(SourceLine {
                text: text.to_string(),
                number: i as u32 + 2,
            });
        }
        lines.push(SourceLine {
            text: "}".to_string(),
            number: body.len() as u32 + 2,
        });

        FunctionEntry {
            signature: FunctionSignature {
                name: name.to_string(),
                params: params.iter().map(|(n, t)| Parameter::new(n, t)).collect(),
                return_type: "int".to_string(),
                declaration,
                location: SourceLocation::line_start("w.go", 1),
            },
            body: FunctionBody { lines },
        }
    }

    fn rewrite_with(config: &CompilerConfig, entries: Vec<FunctionEntry>) -> (Vec<RewrittenBody>, ErrorReporter) {
        let mut registry = FunctionRegistry::new();
        for entry in entries {
            registry.insert(entry).unwrap();
        }
        let mut reporter = ErrorReporter::new();
        let bodies = rewrite_bodies(&registry, config, "w.go", &mut reporter);
        (bodies, reporter)
    }

    fn rewrite(entries: Vec<FunctionEntry>) -> Vec<RewrittenBody> {
        rewrite_with(&CompilerConfig::default(), entries).0
    }

    #[test]
    fn test_pass_through_uses_callee_parameter_names() {
        let bodies = rewrite(vec![
            worker("g", &[("x", "int"), ("y", "int")], &["\treturn x + y, nil"]),
            worker("f", &[("a", "int"), ("b", "int")], &["\treturn g(a, b)"]),
        ]);
        assert_eq!(bodies[1].inner(), &["\treturn g(__router, \"f\", __args, x, y)".to_string()]);
    }

    #[test]
    fn test_pass_through_canonicalizes_order() {
        let bodies = rewrite(vec![
            worker("g", &[("x", "int"), ("y", "int")], &["\treturn x, nil"]),
            worker("f", &[("n", "int")], &["\treturn g(y,x)"]),
        ]);
        assert_eq!(bodies[1].inner()[0], "\treturn g(__router, \"f\", __args, x, y)");
    }

    #[test]
    fn test_expressions_are_forwarded() {
        let bodies = rewrite(vec![worker(
            "fib",
            &[("n", "int")],
            &["\tif n < 2 {", "\t\treturn 1, nil", "\t}", "\treturn fib(n - 1)"],
        )]);
        assert_eq!(bodies[0].inner()[3], "\treturn fib(__router, \"fib\", __args, n - 1)");
        assert!(!bodies[0].propagates_errors);
    }

    #[test]
    fn test_assignment_propagates_errors() {
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("n", "int")], &["\tv := double(n)", "\treturn v * 2, nil"]),
        ]);
        assert_eq!(
            bodies[1].inner()[0],
            "\tv, err := double(__router, \"quad\", __args, n); if err != nil { return __zv, err }"
        );
        assert!(bodies[1].propagates_errors);
        assert!(!bodies[0].propagates_errors);
    }

    #[test]
    fn test_propagation_inside_one_line_body() {
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("n", "int")], &["\tv := double(n); return v * 2, nil"]),
        ]);
        assert_eq!(
            bodies[1].inner()[0],
            "\tv, err := double(__router, \"quad\", __args, n); if err != nil { return __zv, err }; return v * 2, nil"
        );
    }

    #[test]
    fn test_propagation_after_case_label() {
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker(
                "pick",
                &[("n", "int")],
                &["\tswitch n {", "\tcase 1: v := double(n); return v, nil", "\t}", "\treturn 0, nil"],
            ),
        ]);
        assert_eq!(
            bodies[1].inner()[1],
            "\tcase 1: v, err := double(__router, \"pick\", __args, n); if err != nil { return __zv, err }; return v, nil"
        );
        assert!(bodies[1].propagates_errors);
    }

    #[test]
    fn test_unrelated_assignments_are_untouched() {
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker(
                "quad",
                &[("n", "int")],
                &["\tx := other(n)", "\ty := double(n) + 1", "\treturn x + y, nil"],
            ),
        ]);
        assert_eq!(bodies[1].inner()[0], "\tx := other(n)");
        assert_eq!(bodies[1].inner()[1], "\ty := double(__router, \"quad\", __args, n) + 1");
        assert!(!bodies[1].propagates_errors);
    }

    #[test]
    fn test_propagation_can_be_disabled() {
        let config = CompilerConfig {
            propagate_errors: false,
            ..CompilerConfig::default()
        };
        let (bodies, _) = rewrite_with(
            &config,
            vec![
                worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
                worker("quad", &[("n", "int")], &["\tv := double(n)"]),
            ],
        );
        assert_eq!(bodies[1].inner()[0], "\tv := double(__router, \"quad\", __args, n)");
        assert!(!bodies[1].propagates_errors);
    }

    #[test]
    fn test_nested_calls_are_rewritten() {
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("m", "int")], &["\treturn double(double(m + 1))"]),
        ]);
        assert_eq!(
            bodies[1].inner()[0],
            "\treturn double(__router, \"quad\", __args, double(__router, \"quad\", __args, m + 1))"
        );
    }

    #[test]
    fn test_zero_argument_call() {
        let bodies = rewrite(vec![
            worker("seed", &[], &["\treturn 7, nil"]),
            worker("grow", &[], &["\ts := seed()"]),
        ]);
        assert_eq!(
            bodies[1].inner()[0],
            "\ts, err := seed(__router, \"grow\", __args); if err != nil { return __zv, err }"
        );
    }

    #[test]
    fn test_already_routed_call_is_left_alone() {
        let line = "\treturn double(__router, \"quad\", __args, n)";
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("n", "int")], &[line]),
        ]);
        assert_eq!(bodies[1].inner()[0], line);
    }

    #[test]
    fn test_names_in_strings_and_comments_are_ignored() {
        let line = "\tlog(\"double(n)\") // double(n)";
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("n", "int")], &[line]),
        ]);
        assert_eq!(bodies[1].inner()[0], line);
    }

    #[test]
    fn test_longer_identifiers_do_not_match() {
        let line = "\treturn redouble(n), doubled(n)";
        let bodies = rewrite(vec![
            worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
            worker("quad", &[("n", "int")], &[line]),
        ]);
        assert_eq!(bodies[1].inner()[0], line);
    }

    #[test]
    fn test_shadowed_and_selector_calls_are_skipped() {
        let (bodies, reporter) = rewrite_with(
            &CompilerConfig::default(),
            vec![
                worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
                worker(
                    "quad",
                    &[("n", "int")],
                    &[
                        "\tx := m.double(n)",
                        "\tif n > 0 {",
                        "\t\tdouble := pick()",
                        "\t\tx = double(n)",
                        "\t}",
                        "\treturn double(x)",
                    ],
                ),
            ],
        );
        let inner = bodies[1].inner();
        assert_eq!(inner[0], "\tx := m.double(n)");
        assert_eq!(inner[3], "\t\tx = double(n)");
        assert_eq!(inner[5], "\treturn double(__router, \"quad\", __args, x)");
        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(reporter.warning_count(), 0);
    }

    #[test]
    fn test_header_bindings_do_not_shadow_after_the_block() {
        for header in ["\tif double := n > 0; double {", "\tfor _, double := range fs {"] {
            let (bodies, reporter) = rewrite_with(
                &CompilerConfig::default(),
                vec![
                    worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
                    worker(
                        "apply",
                        &[("n", "int"), ("fs", "[]bool")],
                        &[header, "\t\tn++", "\t}", "\treturn double(n)"],
                    ),
                ],
            );
            assert_eq!(bodies[1].inner()[3], "\treturn double(__router, \"apply\", __args, n)", "{}", header);
            assert!(reporter.diagnostics().is_empty(), "{}", header);
        }
    }

    #[test]
    fn test_scope_awareness_can_be_disabled() {
        let config = CompilerConfig {
            scope_aware: false,
            ..CompilerConfig::default()
        };
        let (bodies, reporter) = rewrite_with(
            &config,
            vec![
                worker("double", &[("n", "int")], &["\treturn n * 2, nil"]),
                worker("quad", &[("double", "func(int) int")], &["\treturn double(3), nil"]),
            ],
        );
        assert_eq!(bodies[1].inner()[0], "\treturn double(__router, \"quad\", __args, 3), nil");
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_multiline_call_is_reported() {
        let (bodies, reporter) = rewrite_with(
            &CompilerConfig::default(),
            vec![
                worker("add", &[("a", "int"), ("b", "int")], &["\treturn a + b, nil"]),
                worker("sum", &[("n", "int")], &["\treturn add(n,", "\t\tn)"]),
            ],
        );
        assert_eq!(bodies[1].inner()[0], "\treturn add(n,");
        assert_eq!(reporter.warning_count(), 1);
        assert_eq!(reporter.diagnostics()[0].location.line, 2);
        assert_eq!(
            reporter.diagnostics()[0].to_string(),
            "w.go:2:9: warning: call to `add` spans multiple lines and was left unchanged\n  note: join its arguments onto one line to route it"
        );
    }

    #[test]
    fn test_declaration_and_closing_lines_are_kept() {
        let bodies = rewrite(vec![worker("fib", &[("n", "int")], &["\treturn fib(n)"])]);
        assert_eq!(bodies[0].lines.first().map(String::as_str), Some("func fib(...) (int, error) {"));
        assert_eq!(bodies[0].lines.last().map(String::as_str), Some("}"));
        assert_eq!(bodies[0].inner()[0], "\treturn fib(__router, \"fib\", __args, n)");
    }
}

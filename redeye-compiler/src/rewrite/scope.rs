//! Local bindings of one worker body, scoped by brace depth

use crate::lexer::{Token, TokenType};

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    bindings: Vec<(String, usize)>,
    depth: usize,
}

impl ScopeStack {
    /// Scope of a body whose parameters are `params`
    pub fn for_body(params: &[&str]) -> Self {
        let mut scopes = Self {
            bindings: Vec::new(),
            depth: 1,
        };
        for param in params {
            scopes.bind(param);
        }
        scopes
    }

    pub fn bind(&mut self, name: &str) {
        self.bind_at(name, self.depth);
    }

    fn bind_at(&mut self, name: &str, depth: usize) {
        if name != "_" {
            self.bindings.push((name.to_string(), depth));
        }
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.iter().any(|(bound, _)| bound == name)
    }

    /// Update bindings and depth with the tokens of one line.
    ///
    /// Names declared in the header of an `if`, `for`, `switch` or `select`
    /// belong to the block the header opens, not to the enclosing one.
    pub fn observe(&mut self, tokens: &[Token]) {
        let mut in_header = opens_block_header(tokens);

        for (index, token) in tokens.iter().enumerate() {
            match &token.token_type {
                TokenType::LeftBrace => {
                    in_header = false;
                    self.depth += 1;
                }
                TokenType::RightBrace => {
                    let closing = self.depth;
                    self.bindings.retain(|(_, depth)| *depth < closing);
                    self.depth = self.depth.saturating_sub(1);
                }
                TokenType::Define => {
                    let depth = if in_header { self.depth + 1 } else { self.depth };
                    for name in names_before(tokens, index) {
                        self.bind_at(&name, depth);
                    }
                }
                TokenType::Identifier(keyword) if keyword == "var" => {
                    for name in names_after(tokens, index) {
                        self.bind(&name);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Whether the line starts a statement header, possibly after `} else`
fn opens_block_header(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .filter(|t| !t.is_trivia() && t.token_type != TokenType::RightBrace)
        .filter_map(|t| t.identifier())
        .find(|name| *name != "else")
        .is_some_and(|keyword| matches!(keyword, "if" | "for" | "switch" | "select"))
}

/// `a, b` in `a, b := ...`
fn names_before(tokens: &[Token], define: usize) -> Vec<String> {
    let mut names = Vec::new();
    let mut significant = tokens[..define].iter().rev().filter(|t| !t.is_trivia());

    while let Some(token) = significant.next() {
        match token.identifier() {
            Some(name) => names.push(name.to_string()),
            None => break,
        }
        match significant.next() {
            Some(t) if t.token_type == TokenType::Comma => continue,
            _ => break,
        }
    }

    names
}

/// `a, b` in `var a, b int`
fn names_after(tokens: &[Token], keyword: usize) -> Vec<String> {
    let mut names = Vec::new();
    let mut significant = tokens[keyword + 1..].iter().filter(|t| !t.is_trivia());

    while let Some(token) = significant.next() {
        match token.identifier() {
            Some(name) => names.push(name.to_string()),
            None => break,
        }
        match significant.next() {
            Some(t) if t.token_type == TokenType::Comma => continue,
            _ => break,
        }
    }

    names
}

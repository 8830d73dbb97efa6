//! Minimal line-oriented tokenizer for worker source files
//!
//! Only what the later passes need is recognised: identifiers, brackets,
//! commas, selectors and short variable declarations. String, raw string and
//! rune literals and comments are kept as opaque tokens so that braces and
//! names inside them are never mistaken for code. Raw strings and block
//! comments may span lines; the [`Lexer`] carries that state from one call
//! of [`Lexer::tokenize_line`] to the next.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Identifier(String),
    Number,
    StringLiteral,
    RuneLiteral,
    Comment,

    LeftParen,      // (
    RightParen,     // )
    LeftBrace,      // {
    RightBrace,     // }
    LeftBracket,    // [
    RightBracket,   // ]
    Comma,          // ,
    Dot,            // .
    Semicolon,      // ;
    Define,         // :=

    Whitespace,
    Other,
}

/// A token of one line; `start` and `end` are byte offsets into that line
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn identifier(&self) -> Option<&str> {
        match &self.token_type {
            TokenType::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.token_type, TokenType::Whitespace | TokenType::Comment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    BlockComment,
    RawString,
}

/// Tokenizer state that survives line boundaries
#[derive(Debug, Clone)]
pub struct Lexer {
    mode: Mode,
}

impl Lexer {
    pub fn new() -> Self {
        Self { mode: Mode::Code }
    }

    pub fn tokenize_line(&mut self, line: &str) -> Vec<Token> {
        let mut scanner = LineScanner::new(line);
        let mut tokens = Vec::new();

        match self.mode {
            Mode::BlockComment => {
                if scanner.skip_past("*/") {
                    self.mode = Mode::Code;
                }
                tokens.push(scanner.make_token(TokenType::Comment, 0));
            }
            Mode::RawString => {
                if scanner.skip_past("`") {
                    self.mode = Mode::Code;
                }
                tokens.push(scanner.make_token(TokenType::StringLiteral, 0));
            }
            Mode::Code => {}
        }

        while !scanner.is_at_end() {
            let token = self.scan_token(&mut scanner);
            tokens.push(token);
        }

        tokens
    }

    fn scan_token(&mut self, scanner: &mut LineScanner<'_>) -> Token {
        let start = scanner.offset();
        let ch = scanner.advance();

        let token_type = match ch {
            c if c.is_whitespace() => {
                scanner.advance_while(|c| c.is_whitespace());
                TokenType::Whitespace
            }
            c if c.is_alphabetic() || c == '_' => {
                scanner.advance_while(|c| c.is_alphanumeric() || c == '_');
                TokenType::Identifier(scanner.text_from(start).to_string())
            }
            c if c.is_ascii_digit() => {
                scanner.advance_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                TokenType::Number
            }
            '"' => {
                scanner.skip_quoted('"');
                TokenType::StringLiteral
            }
            '\'' => {
                scanner.skip_quoted('\'');
                TokenType::RuneLiteral
            }
            '`' => {
                if !scanner.skip_past("`") {
                    self.mode = Mode::RawString;
                }
                TokenType::StringLiteral
            }
            '/' if scanner.peek() == Some('/') => {
                scanner.advance_while(|_| true);
                TokenType::Comment
            }
            '/' if scanner.peek() == Some('*') => {
                scanner.advance();
                if !scanner.skip_past("*/") {
                    self.mode = Mode::BlockComment;
                }
                TokenType::Comment
            }
            ':' if scanner.peek() == Some('=') => {
                scanner.advance();
                TokenType::Define
            }
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            ';' => TokenType::Semicolon,
            _ => TokenType::Other,
        };

        scanner.make_token(token_type, start)
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

struct LineScanner<'a> {
    line: &'a str,
    input: Vec<(usize, char)>,
    current: usize,
}

impl<'a> LineScanner<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            input: line.char_indices().collect(),
            current: 0,
        }
    }

    fn offset(&self) -> usize {
        self.input
            .get(self.current)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.line.len())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.input.len()
    }

    fn advance(&mut self) -> char {
        let ch = self.input.get(self.current).map(|(_, c)| *c).unwrap_or('\0');
        self.current += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.current).map(|(_, c)| *c)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.current += 1;
        }
    }

    /// Skip the rest of a quoted literal, honouring backslash escapes
    fn skip_quoted(&mut self, quote: char) {
        while let Some(ch) = self.peek() {
            self.current += 1;
            if ch == '\\' {
                self.current += 1;
            } else if ch == quote {
                return;
            }
        }
    }

    /// Move just past the next occurrence of `pattern`, or to the end of the line
    fn skip_past(&mut self, pattern: &str) -> bool {
        let from = self.offset();
        match self.line[from..].find(pattern) {
            Some(found) => {
                let target = from + found + pattern.len();
                while self.offset() < target {
                    self.current += 1;
                }
                true
            }
            None => {
                self.current = self.input.len();
                false
            }
        }
    }

    fn text_from(&self, start: usize) -> &'a str {
        &self.line[start..self.offset()]
    }

    fn make_token(&self, token_type: TokenType, start: usize) -> Token {
        Token {
            token_type,
            start,
            end: self.offset(),
        }
    }
}

/// Tokenize a single self-contained line
pub fn tokenize(line: &str) -> Vec<Token> {
    Lexer::new().tokenize_line(line)
}

/// Index of the parenthesis closing the one at `open`, within the same token list
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.token_type {
            TokenType::LeftParen => depth += 1,
            TokenType::RightParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a comma separated list at its top-level commas; pieces are trimmed
pub fn split_top_level(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut piece_start = 0;

    for token in tokenize(text) {
        match token.token_type {
            TokenType::LeftParen | TokenType::LeftBracket | TokenType::LeftBrace => depth += 1,
            TokenType::RightParen | TokenType::RightBracket | TokenType::RightBrace => {
                depth = depth.saturating_sub(1)
            }
            TokenType::Comma if depth == 0 => {
                pieces.push(text[piece_start..token.start].trim().to_string());
                piece_start = token.end;
            }
            _ => {}
        }
    }
    pieces.push(text[piece_start..].trim().to_string());

    pieces
}

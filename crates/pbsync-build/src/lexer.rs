//! Tokenizer for BUILD files.
//!
//! Newlines are significant only outside brackets; inside `()`, `[]` and
//! `{}` they are skipped so that multi-line rule calls read as one statement.
//! Indentation is not tracked because BUILD files have no block statements.

use crate::syntax::{AssignOp, Position};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Number(String),
    Newline,
    Eof,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Assign,
    AugAssign(AssignOp),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Pipe,
    Caret,
    Amp,
    Tilde,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl TokenKind {
    /// Short human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("`{}`", punct_text(other)),
        }
    }
}

fn punct_text(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Semicolon => ";",
        TokenKind::Dot => ".",
        TokenKind::Assign => "=",
        TokenKind::AugAssign(op) => match op {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::FloorDiv => "//=",
            AssignOp::Mod => "%=",
            AssignOp::BitOr => "|=",
        },
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::StarStar => "**",
        TokenKind::Slash => "/",
        TokenKind::SlashSlash => "//",
        TokenKind::Percent => "%",
        TokenKind::Pipe => "|",
        TokenKind::Caret => "^",
        TokenKind::Amp => "&",
        TokenKind::Tilde => "~",
        TokenKind::EqEq => "==",
        TokenKind::NotEq => "!=",
        TokenKind::Lt => "<",
        TokenKind::LtEq => "<=",
        TokenKind::Gt => ">",
        TokenKind::GtEq => ">=",
        TokenKind::Ident(_)
        | TokenKind::Str(_)
        | TokenKind::Number(_)
        | TokenKind::Newline
        | TokenKind::Eof => "",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

/// Punctuation table, longest spellings first.
static PUNCT: &[(&str, TokenKind)] = &[
    ("//=", TokenKind::AugAssign(AssignOp::FloorDiv)),
    ("**", TokenKind::StarStar),
    ("//", TokenKind::SlashSlash),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("+=", TokenKind::AugAssign(AssignOp::Add)),
    ("-=", TokenKind::AugAssign(AssignOp::Sub)),
    ("*=", TokenKind::AugAssign(AssignOp::Mul)),
    ("/=", TokenKind::AugAssign(AssignOp::Div)),
    ("%=", TokenKind::AugAssign(AssignOp::Mod)),
    ("|=", TokenKind::AugAssign(AssignOp::BitOr)),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (".", TokenKind::Dot),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("&", TokenKind::Amp),
    ("~", TokenKind::Tilde),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
];

/// Split `src` into tokens, always ending with `Newline`, `Eof`.
///
/// A leading UTF-8 byte order mark is skipped.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    Lexer::new(src).run()
}

struct Lexer {
    chars: Vec<char>,
    i: usize,
    line: usize,
    column: usize,
    depth: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            i: 0,
            line: 1,
            column: 1,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.i + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.i += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, pos: Position) {
        self.tokens.push(Token { kind, pos });
    }

    fn at_statement_start(&self) -> bool {
        matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline)
        )
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(c) = self.peek(0) {
            let pos = self.pos();
            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.bump();
                }
                '\\' if self.peek(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                '\\' if self.peek(1) == Some('\r') && self.peek(2) == Some('\n') => {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                '#' => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                '\n' => {
                    self.bump();
                    if self.depth == 0 && !self.at_statement_start() {
                        self.push(TokenKind::Newline, pos);
                    }
                }
                '"' | '\'' => {
                    let s = self.string(false)?;
                    self.push(TokenKind::Str(s), pos);
                }
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    let n = self.number();
                    self.push(TokenKind::Number(n), pos);
                }
                c if c.is_alphabetic() || c == '_' => {
                    if let Some(prefix_len) = self.string_prefix() {
                        let raw = self.chars[self.i..self.i + prefix_len]
                            .iter()
                            .any(|c| matches!(c, 'r' | 'R'));
                        for _ in 0..prefix_len {
                            self.bump();
                        }
                        let s = self.string(raw)?;
                        self.push(TokenKind::Str(s), pos);
                    } else {
                        let ident = self.ident();
                        self.push(TokenKind::Ident(ident), pos);
                    }
                }
                _ => self.punct(pos)?,
            }
        }

        if !self.at_statement_start() {
            let pos = self.pos();
            self.push(TokenKind::Newline, pos);
        }
        let pos = self.pos();
        self.push(TokenKind::Eof, pos);
        Ok(self.tokens)
    }

    /// Length of a `r`, `b`, `rb` or `br` prefix directly followed by a quote.
    fn string_prefix(&self) -> Option<usize> {
        let is_prefix = |c: Option<char>| matches!(c, Some('r' | 'R' | 'b' | 'B'));
        let is_quote = |c: Option<char>| matches!(c, Some('"' | '\''));

        if is_prefix(self.peek(0)) && is_quote(self.peek(1)) {
            return Some(1);
        }
        if is_prefix(self.peek(0))
            && is_prefix(self.peek(1))
            && self.peek(0).map(|c| c.to_ascii_lowercase())
                != self.peek(1).map(|c| c.to_ascii_lowercase())
            && is_quote(self.peek(2))
        {
            return Some(2);
        }
        None
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    fn number(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                out.push(c);
                self.bump();
            } else if matches!(c, '+' | '-')
                && matches!(out.chars().last(), Some('e' | 'E'))
                && !out.starts_with("0x")
                && !out.starts_with("0X")
            {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    fn punct(&mut self, pos: Position) -> Result<()> {
        for (text, kind) in PUNCT {
            let matches = text
                .chars()
                .enumerate()
                .all(|(offset, expected)| self.peek(offset) == Some(expected));
            if matches {
                for _ in 0..text.chars().count() {
                    self.bump();
                }
                match kind {
                    TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                        self.depth += 1;
                    }
                    TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                        self.depth = self.depth.saturating_sub(1);
                    }
                    _ => {}
                }
                self.push(kind.clone(), pos);
                return Ok(());
            }
        }

        let c = self.peek(0).unwrap_or_default();
        Err(Error::syntax(pos, format!("unexpected character {c:?}")))
    }

    /// Lex a quoted string starting at the opening quote.
    fn string(&mut self, raw: bool) -> Result<String> {
        let start = self.pos();
        let quote = self.bump().unwrap_or('"');
        let triple = self.peek(0) == Some(quote) && self.peek(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(Error::syntax(start, "unterminated string literal"));
            };

            if c == quote {
                if !triple {
                    self.bump();
                    return Ok(out);
                }
                if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                    self.bump();
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                out.push(c);
                self.bump();
                continue;
            }

            if c == '\n' && !triple {
                return Err(Error::syntax(start, "unterminated string literal"));
            }

            if c == '\\' {
                self.bump();
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out)?;
                }
                continue;
            }

            out.push(c);
            self.bump();
        }
    }

    /// Decode the escape sequence following a backslash.
    fn escape(&mut self, out: &mut String) -> Result<()> {
        let pos = self.pos();
        let Some(c) = self.bump() else {
            return Err(Error::syntax(pos, "unterminated string literal"));
        };

        match c {
            '\n' => {}
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' | '\'' | '"' => out.push(c),
            '0'..='7' => {
                let mut digits = c.to_string();
                while digits.len() < 3 && self.peek(0).is_some_and(|d| ('0'..='7').contains(&d)) {
                    digits.push(self.bump().unwrap_or('0'));
                }
                out.push(self.code_point(&digits, 8, pos)?);
            }
            'x' => {
                let digits = self.hex_digits(2, pos)?;
                out.push(self.code_point(&digits, 16, pos)?);
            }
            'u' => {
                let digits = self.hex_digits(4, pos)?;
                out.push(self.code_point(&digits, 16, pos)?);
            }
            'U' => {
                let digits = self.hex_digits(8, pos)?;
                out.push(self.code_point(&digits, 16, pos)?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize, pos: Position) -> Result<String> {
        let mut digits = String::with_capacity(count);
        for _ in 0..count {
            match self.peek(0) {
                Some(d) if d.is_ascii_hexdigit() => {
                    digits.push(d);
                    self.bump();
                }
                _ => return Err(Error::syntax(pos, "truncated escape sequence")),
            }
        }
        Ok(digits)
    }

    fn code_point(&self, digits: &str, radix: u32, pos: Position) -> Result<char> {
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Error::syntax(pos, format!("invalid escape value {digits:?}")))
    }
}

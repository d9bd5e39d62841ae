//! Tokenizer for the SELECT subset.

use crate::error::{QueryError, Result};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Reserved words. Matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Select,
    As,
    From,
    Where,
    On,
    Group,
    By,
    Count,
    Sum,
    Max,
    Min,
    Avg,
    Not,
    And,
    Or,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, Keyword); 15] = [
            ("SELECT", Keyword::Select),
            ("AS", Keyword::As),
            ("FROM", Keyword::From),
            ("WHERE", Keyword::Where),
            ("ON", Keyword::On),
            ("GROUP", Keyword::Group),
            ("BY", Keyword::By),
            ("COUNT", Keyword::Count),
            ("SUM", Keyword::Sum),
            ("MAX", Keyword::Max),
            ("MIN", Keyword::Min),
            ("AVG", Keyword::Avg),
            ("NOT", Keyword::Not),
            ("AND", Keyword::And),
            ("OR", Keyword::Or),
        ];
        KEYWORDS
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }

    /// Returns the canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::As => "AS",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::On => "ON",
            Keyword::Group => "GROUP",
            Keyword::By => "BY",
            Keyword::Count => "COUNT",
            Keyword::Sum => "SUM",
            Keyword::Max => "MAX",
            Keyword::Min => "MIN",
            Keyword::Avg => "AVG",
            Keyword::Not => "NOT",
            Keyword::And => "AND",
            Keyword::Or => "OR",
        }
    }
}

/// Token kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    /// Single- or double-quoted text.
    Quoted(String),
    /// Unsigned integer, including decimals whose fraction is all zeros.
    Integer(u64),
    /// Unsigned decimal with a non-zero fraction.
    Float(f64),
    Dot,
    Comma,
    LParen,
    RParen,
    Star,
    Plus,
    Minus,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(kw) => f.write_str(kw.as_str()),
            TokenKind::Identifier(name) => write!(f, "identifier {}", name),
            TokenKind::Quoted(text) => write!(f, "string {:?}", text),
            TokenKind::Integer(v) => write!(f, "number {}", v),
            TokenKind::Float(v) => write!(f, "number {}", v),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Eq => f.write_str("'='"),
            TokenKind::Ne => f.write_str("'<>'"),
            TokenKind::Lt => f.write_str("'<'"),
            TokenKind::Le => f.write_str("'<='"),
            TokenKind::Gt => f.write_str("'>'"),
            TokenKind::Ge => f.write_str("'>='"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token and its byte offset in the query text.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance();
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let position = self.pos;
        let c = match self.peek() {
            Some(c) => c,
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    position,
                })
            }
        };

        let kind = if c.is_ascii_alphabetic() {
            let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            match Keyword::lookup(word) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(word.to_string()),
            }
        } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|c| c.is_ascii_digit())) {
            self.lex_number(position)?
        } else if c == '\'' || c == '"' {
            self.lex_quoted(c, position)?
        } else {
            self.advance();
            match c {
                '.' => TokenKind::Dot,
                ',' => TokenKind::Comma,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '*' => TokenKind::Star,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '=' => TokenKind::Eq,
                '<' => match self.peek() {
                    Some('=') => {
                        self.advance();
                        TokenKind::Le
                    }
                    Some('>') => {
                        self.advance();
                        TokenKind::Ne
                    }
                    _ => TokenKind::Lt,
                },
                '>' => match self.peek() {
                    Some('=') => {
                        self.advance();
                        TokenKind::Ge
                    }
                    _ => TokenKind::Gt,
                },
                '!' if self.peek() == Some('=') => {
                    self.advance();
                    TokenKind::Ne
                }
                other => {
                    return Err(QueryError::syntax(
                        position,
                        format!("character {:?}", other),
                        "a token",
                    ))
                }
            }
        };
        Ok(Token { kind, position })
    }

    fn lex_number(&mut self, position: usize) -> Result<TokenKind> {
        let start = self.pos;
        let integral = self.take_while(|c| c.is_ascii_digit());
        let mut fraction = "";
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            fraction = self.take_while(|c| c.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];

        if fraction.bytes().all(|b| b == b'0') {
            let integral = if integral.is_empty() { "0" } else { integral };
            integral
                .parse::<u64>()
                .map(TokenKind::Integer)
                .map_err(|_| QueryError::syntax(position, text, "an integer in range"))
        } else {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| QueryError::syntax(position, text, "a number"))
        }
    }

    fn lex_quoted(&mut self, quote: char, position: usize) -> Result<TokenKind> {
        self.advance();
        let body = self.take_while(|c| c != quote);
        if self.peek() != Some(quote) {
            return Err(QueryError::syntax(
                position,
                "unterminated string",
                format!("closing {}", quote),
            ));
        }
        self.advance();
        Ok(TokenKind::Quoted(body.to_string()))
    }
}

/// Splits query text into tokens, ending with `TokenKind::Eof`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

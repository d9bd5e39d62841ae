//! Grammar for the supported SELECT subset: tokenizer and parser.

mod lexer;
mod parser;

pub use lexer::{tokenize, Keyword, Token, TokenKind};
pub use parser::parse;

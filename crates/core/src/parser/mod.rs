//! Tokenizer and object parser.
//!
//! - `lexer`: byte source to tokens
//! - `object`: tokens to [`Value`](crate::model::Value)s, including indirect
//!   objects and deferred streams

pub mod lexer;
pub mod object;

pub use lexer::{Lexer, Token, TokenKind};
pub use object::{ObjectParser, StreamMode};

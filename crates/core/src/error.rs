//! Error types for the pdfgraft object loader and interpreter.

use thiserror::Error;

/// Primary error type for parsing and loading operations.
///
/// Lexical problems surface as [`PdfError::TokenError`], grammar violations as
/// [`PdfError::SyntaxError`]. Both mean the object being built is unusable.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("no valid xref table found")]
    NoValidXRef,

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("stream length of object {0} cannot be resolved")]
    UnresolvedLength(u32),

    #[error("page tree error: {0}")]
    PageTree(String),

    #[error("decode error: {0}")]
    DecodeError(String),
}

impl PdfError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::SyntaxError(msg.into())
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;

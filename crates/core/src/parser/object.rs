//! Recursive-descent object parser.
//!
//! Builds [`Value`]s from the token stream with one token of lookahead. The
//! `num num R` reference form is recognized inside arrays and dictionaries
//! only; a bare number at top level is always a number, which is what content
//! streams need.
//!
//! Streams whose `Length` is an indirect reference cannot be read on first
//! sight. With [`StreamMode::Defer`] the dictionary comes back with
//! [`StreamState::Deferred`] and the payload offset, and
//! [`ObjectParser::complete_stream`] reads it later once the length is known.

use super::lexer::{Lexer, Token, TokenKind, is_whitespace};
use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, PdfString, StreamState, Value};
use crate::source::DataSource;
use bytes::Bytes;

/// What to do with a `stream` keyword after a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Leave the keyword alone (object-stream bodies, content streams)
    Ignore,
    /// Read the payload; an indirect `Length` is an error
    Inline,
    /// Read the payload, or record its offset when `Length` is indirect
    Defer,
}

/// Parser over a byte source.
pub struct ObjectParser<S: DataSource> {
    lexer: Lexer<S>,
    tok: Token,
}

impl<S: DataSource> ObjectParser<S> {
    /// Start at the source's current position.
    pub fn new(source: S) -> Self {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token();
        Self { lexer, tok }
    }

    /// The lookahead token.
    pub fn token(&self) -> &Token {
        &self.tok
    }

    /// Move to the next token.
    pub fn advance(&mut self) {
        self.tok = self.lexer.next_token();
    }

    /// Whether the source is exhausted.
    pub fn eos(&self) -> bool {
        self.tok.kind == TokenKind::Err && self.lexer.eos()
    }

    /// Reposition and read the token at `pos`.
    pub fn seek(&mut self, pos: usize) {
        self.lexer.seek(pos);
        self.advance();
    }

    pub fn source_len(&self) -> usize {
        self.lexer.source().len()
    }

    pub fn into_source(self) -> S {
        self.lexer.into_source()
    }

    /// Fail unless the lookahead is operator `op`, then consume it.
    pub fn expect_op(&mut self, op: &str) -> Result<()> {
        if !self.tok.is_op(op) {
            return Err(PdfError::syntax(format!(
                "expected '{op}' at {}, found '{}'",
                self.tok.pos,
                self.tok.text_str()
            )));
        }
        self.advance();
        Ok(())
    }

    /// Parse the number at the lookahead as a non-negative integer.
    pub fn take_integer(&mut self) -> Result<u64> {
        let n = self.take_number()?;
        if n < 0.0 || n.fract() != 0.0 || n > u64::MAX as f64 {
            return Err(PdfError::syntax(format!("expected integer, found {n}")));
        }
        Ok(n as u64)
    }

    /// Consume the lookahead number.
    fn take_number(&mut self) -> Result<f64> {
        if self.tok.kind != TokenKind::Number {
            return Err(self.unexpected("number"));
        }
        let n = parse_number(&self.tok)?;
        self.advance();
        Ok(n)
    }

    fn unexpected(&self, what: &str) -> PdfError {
        match self.tok.kind {
            TokenKind::Err if self.lexer.eos() => PdfError::UnexpectedEof,
            TokenKind::Err => PdfError::TokenError {
                pos: self.tok.pos,
                msg: "malformed token".into(),
            },
            _ => PdfError::syntax(format!(
                "expected {what} at {}, found '{}'",
                self.tok.pos,
                self.tok.text_str()
            )),
        }
    }

    /// Parse one value at top level. Streams after dictionaries are read
    /// inline.
    pub fn parse_value(&mut self) -> Result<Value> {
        self.parse_inner(StreamMode::Inline)
    }

    /// Parse one value with the given stream handling.
    pub fn parse_value_with(&mut self, streams: StreamMode) -> Result<Value> {
        self.parse_inner(streams)
    }

    /// Parse `num 0 obj value endobj`.
    ///
    /// A dictionary whose stream was deferred is returned right after the
    /// offset is recorded; `endobj` is then checked by whoever completes it.
    pub fn parse_object_def(&mut self, streams: StreamMode) -> Result<(ObjNum, Value)> {
        let num = self.take_integer()?;
        let num = ObjNum::try_from(num)
            .map_err(|_| PdfError::syntax(format!("object number {num} out of range")))?;
        let generation = self.take_integer()?;
        if generation != 0 {
            return Err(PdfError::syntax(format!(
                "object {num} has generation {generation}, only 0 is supported"
            )));
        }
        self.expect_op("obj")?;
        let value = self.parse_inner(streams)?;
        if let Value::Dict(d) = &value
            && d.is_deferred()
        {
            return Ok((num, value));
        }
        self.expect_op("endobj")?;
        Ok((num, value))
    }

    /// Read a deferred stream now that its length is known.
    ///
    /// Seeks back to the recorded offset, reads `length` bytes and expects
    /// `endstream`. The lookahead is left on the token after it.
    pub fn complete_stream(&mut self, dict: &mut Dict, length: usize) -> Result<()> {
        let StreamState::Deferred(pos) = *dict.stream_state() else {
            return Ok(());
        };
        self.lexer.seek(pos);
        let data = self.lexer.take_raw(length).ok_or(PdfError::UnexpectedEof)?;
        self.advance();
        self.expect_op("endstream")?;
        dict.set_stream(StreamState::Inline(Bytes::from(data)));
        Ok(())
    }

    /// Read inline image data. The lookahead is the `ID` operator.
    ///
    /// Data runs up to whitespace followed by `EI` and whitespace (or the
    /// end of the source). The lookahead is left on the token after `EI`.
    pub fn take_inline_data(&mut self) -> Vec<u8> {
        // Single whitespace byte after ID
        self.lexer.skip_byte();
        let mut data = Vec::new();
        while let Some(c) = self.lexer.current() {
            data.push(c);
            self.lexer.skip_byte();
            let n = data.len();
            if n >= 3
                && data.ends_with(b"EI")
                && is_whitespace(data[n - 3])
                && self.lexer.current().is_none_or(is_whitespace)
            {
                data.truncate(n - 3);
                break;
            }
        }
        self.advance();
        data
    }

    fn parse_inner(&mut self, streams: StreamMode) -> Result<Value> {
        let value = match self.tok.kind {
            TokenKind::Null => Value::Null,
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Number => Value::Number(parse_number(&self.tok)?),
            TokenKind::String => Value::String(PdfString::literal(std::mem::take(&mut self.tok.text))),
            TokenKind::StringBinary => {
                Value::String(PdfString::hex(std::mem::take(&mut self.tok.text)))
            }
            TokenKind::Name => Value::Name(String::from_utf8_lossy(&self.tok.text).into_owned()),
            TokenKind::ArrayBg => {
                self.advance();
                return self.parse_array(streams);
            }
            TokenKind::DictBg => {
                self.advance();
                return self.parse_dict(streams);
            }
            _ => return Err(self.unexpected("value")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_array(&mut self, streams: StreamMode) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            match self.tok.kind {
                TokenKind::ArrayEnd => {
                    self.advance();
                    return Ok(Value::Array(items));
                }
                TokenKind::Number => self.parse_numbers_or_refs(&mut items)?,
                _ => items.push(self.parse_inner(streams)?),
            }
        }
    }

    /// Numbers inside an array. Each pair followed by `R` is a reference;
    /// otherwise the first number is emitted and the second becomes the
    /// candidate for the next pair.
    fn parse_numbers_or_refs(&mut self, items: &mut Vec<Value>) -> Result<()> {
        let mut first = self.take_number()?;
        loop {
            if self.tok.kind != TokenKind::Number {
                items.push(Value::Number(first));
                return Ok(());
            }
            let second = self.take_number()?;
            if self.tok.is_op("R") {
                self.advance();
                items.push(Value::Ref(objnum_from(first)?));
                return Ok(());
            }
            items.push(Value::Number(first));
            first = second;
        }
    }

    fn parse_dict(&mut self, streams: StreamMode) -> Result<Value> {
        let mut dict = Dict::new();
        loop {
            match self.tok.kind {
                TokenKind::DictEnd => {
                    self.advance();
                    break;
                }
                TokenKind::Name => {
                    let key = String::from_utf8_lossy(&self.tok.text).into_owned();
                    self.advance();
                    let value = self.parse_dict_value(streams)?;
                    dict.insert(key, value);
                }
                _ => return Err(self.unexpected("name or '>>'")),
            }
        }

        if streams != StreamMode::Ignore && self.tok.is_op("stream") {
            self.read_stream(&mut dict, streams)?;
        }
        Ok(Value::Dict(dict))
    }

    /// A dictionary value. `num num` must be followed by `R`.
    fn parse_dict_value(&mut self, streams: StreamMode) -> Result<Value> {
        if self.tok.kind != TokenKind::Number {
            return self.parse_inner(streams);
        }
        let first = self.take_number()?;
        if self.tok.kind != TokenKind::Number {
            return Ok(Value::Number(first));
        }
        self.take_number()?;
        if !self.tok.is_op("R") {
            return Err(self.unexpected("'R'"));
        }
        self.advance();
        Ok(Value::Ref(objnum_from(first)?))
    }

    /// Lookahead is the `stream` keyword and the lexer sits right after it.
    fn read_stream(&mut self, dict: &mut Dict, streams: StreamMode) -> Result<()> {
        self.lexer.skip_to_newline();
        self.lexer.skip_byte();
        let pos = self.lexer.tell();

        match dict.get("Length") {
            Some(Value::Ref(num)) => {
                if streams != StreamMode::Defer {
                    return Err(PdfError::UnresolvedLength(*num));
                }
                dict.set_stream(StreamState::Deferred(pos));
                Ok(())
            }
            Some(Value::Number(n)) if *n >= 0.0 => {
                let data = self
                    .lexer
                    .take_raw(*n as usize)
                    .ok_or(PdfError::UnexpectedEof)?;
                self.advance();
                self.expect_op("endstream")?;
                dict.set_stream(StreamState::Inline(Bytes::from(data)));
                Ok(())
            }
            _ => Err(PdfError::syntax(format!("stream at {pos} without usable Length"))),
        }
    }
}

/// Numeric value of a number token.
fn parse_number(tok: &Token) -> Result<f64> {
    let bad = || PdfError::TokenError {
        pos: tok.pos,
        msg: format!("invalid number '{}'", tok.text_str()),
    };
    if !tok
        .text
        .iter()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
    {
        return Err(bad());
    }
    std::str::from_utf8(&tok.text)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(bad)
}

fn objnum_from(n: f64) -> Result<ObjNum> {
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(ObjNum::MAX) {
        return Err(PdfError::syntax(format!("invalid object number {n}")));
    }
    Ok(n as ObjNum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    fn parser(data: &[u8]) -> ObjectParser<BufferSource> {
        ObjectParser::new(BufferSource::from_slice(data))
    }

    #[test]
    fn scalars() {
        let mut p = parser(b"null true -1.5 (s) <61> /N");
        assert_eq!(p.parse_value().unwrap(), Value::Null);
        assert_eq!(p.parse_value().unwrap(), Value::Bool(true));
        assert_eq!(p.parse_value().unwrap(), Value::Number(-1.5));
        assert_eq!(p.parse_value().unwrap(), Value::string(b"s".to_vec()));
        assert_eq!(
            p.parse_value().unwrap(),
            Value::String(PdfString::hex(b"61".to_vec()))
        );
        assert_eq!(p.parse_value().unwrap(), Value::name("N"));
        assert!(p.eos());
    }

    #[test]
    fn top_level_numbers_are_not_refs() {
        let mut p = parser(b"1 0 R");
        assert_eq!(p.parse_value().unwrap(), Value::Number(1.0));
        assert_eq!(p.parse_value().unwrap(), Value::Number(0.0));
        assert!(p.token().is_op("R"));
    }

    #[test]
    fn array_reference_disambiguation() {
        let mut p = parser(b"[1 2 3 0 R 4 5 R 6]");
        assert_eq!(
            p.parse_value().unwrap(),
            Value::Array(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Ref(3),
                Value::Ref(4),
                Value::Number(6.0),
            ])
        );
    }

    #[test]
    fn array_number_before_reference() {
        let mut p = parser(b"[1 3 0 R]");
        assert_eq!(
            p.parse_value().unwrap(),
            Value::Array(vec![Value::Number(1.0), Value::Ref(3)])
        );
    }

    #[test]
    fn dict_value_pair_requires_r() {
        let mut p = parser(b"<</A 1 0 R /B 2>>");
        let v = p.parse_value().unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.get("A"), Some(&Value::Ref(1)));
        assert_eq!(d.get("B"), Some(&Value::Number(2.0)));

        let mut p = parser(b"<</A 1 2 /B 3>>");
        assert!(p.parse_value().is_err());
    }

    #[test]
    fn truncated_array_fails() {
        let mut p = parser(b"[1 2");
        assert!(matches!(p.parse_value(), Err(PdfError::UnexpectedEof)));
    }

    #[test]
    fn inline_stream() {
        let mut p = parser(b"<</Length 5>>stream\r\nhello\nendstream 42");
        let v = p.parse_value().unwrap();
        let d = v.as_dict().unwrap();
        assert_eq!(d.stream().map(|b| b.as_ref()), Some(&b"hello"[..]));
        assert_eq!(p.parse_value().unwrap(), Value::Number(42.0));
    }

    #[test]
    fn missing_endstream_fails() {
        let mut p = parser(b"<</Length 3>>stream\nhello\nendstream");
        assert!(p.parse_value().is_err());
    }

    #[test]
    fn indirect_length_needs_defer_mode() {
        let data = b"1 0 obj <</Length 2 0 R>>stream\nabc\nendstream\nendobj";
        let mut p = parser(data);
        assert!(matches!(
            p.parse_object_def(StreamMode::Inline),
            Err(PdfError::UnresolvedLength(2))
        ));

        let mut p = parser(data);
        let (num, mut v) = p.parse_object_def(StreamMode::Defer).unwrap();
        assert_eq!(num, 1);
        let d = v.as_dict_mut().unwrap();
        assert_eq!(d.stream_state(), &StreamState::Deferred(32));

        p.complete_stream(d, 3).unwrap();
        assert_eq!(d.stream().map(|b| b.as_ref()), Some(&b"abc"[..]));
        p.expect_op("endobj").unwrap();
    }

    #[test]
    fn object_def_rejects_nonzero_generation() {
        let mut p = parser(b"3 1 obj null endobj");
        assert!(matches!(
            p.parse_object_def(StreamMode::Defer),
            Err(PdfError::SyntaxError(_))
        ));
    }

    #[test]
    fn object_def_requires_endobj() {
        let mut p = parser(b"3 0 obj 5 6 0 obj");
        assert!(p.parse_object_def(StreamMode::Defer).is_err());
    }

    #[test]
    fn ignore_mode_leaves_stream_keyword() {
        let mut p = parser(b"<</Length 1>> stream");
        p.parse_value_with(StreamMode::Ignore).unwrap();
        assert!(p.token().is_op("stream"));
    }

    #[test]
    fn inline_image_data_stops_at_ei() {
        let mut p = parser(b"ID \x01EI\xffx\nEI Q");
        assert!(p.token().is_op("ID"));
        assert_eq!(p.take_inline_data(), b"\x01EI\xffx".to_vec());
        assert!(p.token().is_op("Q"));
    }

    #[test]
    fn bad_number_is_token_error() {
        let mut p = parser(b"1.2.3");
        assert!(matches!(p.parse_value(), Err(PdfError::TokenError { .. })));
    }
}

//! Tokenizer for PDF object and content-stream syntax.
//!
//! Pulls one byte at a time from a [`DataSource`] and keeps exactly one byte
//! of lookahead. Errors never escape as `Err`: a malformed or truncated token
//! comes back as [`TokenKind::Err`] and the caller decides what that means.

use crate::source::DataSource;

const REGULAR: u8 = 0;
const WHITESPACE: u8 = 1;
const DELIMITER: u8 = 2;

const fn build_char_class() -> [u8; 256] {
    let mut table = [REGULAR; 256];
    table[0x00] = WHITESPACE;
    table[b'\t' as usize] = WHITESPACE;
    table[b'\n' as usize] = WHITESPACE;
    table[0x0c] = WHITESPACE;
    table[b'\r' as usize] = WHITESPACE;
    table[b' ' as usize] = WHITESPACE;
    table[b'%' as usize] = DELIMITER;
    table[b'(' as usize] = DELIMITER;
    table[b')' as usize] = DELIMITER;
    table[b'/' as usize] = DELIMITER;
    table[b'<' as usize] = DELIMITER;
    table[b'>' as usize] = DELIMITER;
    table[b'[' as usize] = DELIMITER;
    table[b']' as usize] = DELIMITER;
    table[b'{' as usize] = DELIMITER;
    table[b'}' as usize] = DELIMITER;
    table
}

/// Byte classification: whitespace, delimiter or regular.
static CHAR_CLASS: [u8; 256] = build_char_class();

#[inline]
pub const fn is_whitespace(b: u8) -> bool {
    CHAR_CLASS[b as usize] == WHITESPACE
}

#[inline]
pub const fn is_delimiter(b: u8) -> bool {
    CHAR_CLASS[b as usize] == DELIMITER
}

#[inline]
pub const fn is_regular(b: u8) -> bool {
    CHAR_CLASS[b as usize] == REGULAR
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Malformed token or end of source
    Err,
    /// Operator or keyword (e.g. `obj`, `R`, `re`)
    Op,
    /// Name (payload without the leading slash, `#xx` escapes decoded)
    Name,
    Number,
    /// Literal string, escapes decoded
    String,
    /// Hex string, payload is the hex digits as written
    StringBinary,
    True,
    False,
    Null,
    ArrayBg,
    ArrayEnd,
    DictBg,
    DictEnd,
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Vec<u8>,
    /// Offset of the token's first byte in the source
    pub pos: usize,
}

impl Token {
    fn new(kind: TokenKind, text: Vec<u8>, pos: usize) -> Self {
        Self { kind, text, pos }
    }

    fn err(pos: usize) -> Self {
        Self::new(TokenKind::Err, Vec::new(), pos)
    }

    /// Whether this is the operator `name`.
    pub fn is_op(&self, name: &str) -> bool {
        self.kind == TokenKind::Op && self.text == name.as_bytes()
    }

    /// Payload as text (lossy for non-UTF-8 bytes).
    pub fn text_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}

/// Pull tokenizer with one byte of lookahead.
pub struct Lexer<S: DataSource> {
    source: S,
    /// Current lookahead byte
    ch: Option<u8>,
    /// Offset of `ch` in the source
    ch_pos: usize,
}

impl<S: DataSource> Lexer<S> {
    /// Start tokenizing at the source's current position.
    pub fn new(source: S) -> Self {
        let mut lexer = Self {
            source,
            ch: None,
            ch_pos: 0,
        };
        lexer.bump();
        lexer
    }

    fn bump(&mut self) {
        self.ch_pos = self.source.position();
        self.ch = self.source.next_byte();
    }

    /// Offset of the lookahead byte.
    pub fn tell(&self) -> usize {
        self.ch_pos
    }

    /// The lookahead byte.
    pub fn current(&self) -> Option<u8> {
        self.ch
    }

    pub fn eos(&self) -> bool {
        self.ch.is_none()
    }

    /// Reposition and reload the lookahead byte.
    pub fn seek(&mut self, pos: usize) {
        self.source.seek(pos);
        self.bump();
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Advance until the lookahead is `\n` or the source ends.
    pub fn skip_to_newline(&mut self) {
        while let Some(c) = self.ch {
            if c == b'\n' {
                break;
            }
            self.bump();
        }
    }

    /// Consume the lookahead byte.
    pub fn skip_byte(&mut self) {
        self.bump();
    }

    /// Take `count` raw bytes starting at the lookahead byte.
    ///
    /// Returns `None` if the source ends first. A count larger than what is
    /// left is rejected before anything is read.
    pub fn take_raw(&mut self, count: usize) -> Option<Vec<u8>> {
        if count == 0 {
            return Some(Vec::new());
        }
        if count > self.source.len().saturating_sub(self.ch_pos) {
            return None;
        }
        let first = self.ch?;
        let mut out = Vec::with_capacity(count);
        out.push(first);
        out.extend(self.source.read_bytes(count - 1));
        self.bump();
        (out.len() == count).then_some(out)
    }

    /// Skip whitespace and `%` comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(c) = self.ch {
            if is_whitespace(c) {
                self.bump();
            } else if c == b'%' {
                // Comment runs to end of line
                while let Some(c) = self.ch {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let pos = self.ch_pos;
        let Some(c) = self.ch else {
            return Token::err(pos);
        };

        match c {
            b'(' => self.read_string(pos),
            b'<' => {
                self.bump();
                if self.ch == Some(b'<') {
                    self.bump();
                    Token::new(TokenKind::DictBg, b"<<".to_vec(), pos)
                } else {
                    self.read_hex_string(pos)
                }
            }
            b'>' => {
                self.bump();
                if self.ch == Some(b'>') {
                    self.bump();
                    Token::new(TokenKind::DictEnd, b">>".to_vec(), pos)
                } else {
                    Token::err(pos)
                }
            }
            b'[' => {
                self.bump();
                Token::new(TokenKind::ArrayBg, b"[".to_vec(), pos)
            }
            b']' => {
                self.bump();
                Token::new(TokenKind::ArrayEnd, b"]".to_vec(), pos)
            }
            b'{' | b'}' => {
                self.bump();
                Token::new(TokenKind::Op, vec![c], pos)
            }
            b')' => {
                self.bump();
                Token::err(pos)
            }
            b'/' => self.read_name(pos),
            _ => self.read_regular(pos),
        }
    }

    /// Literal string `(...)` with nested parentheses and escapes.
    fn read_string(&mut self, pos: usize) -> Token {
        self.bump(); // Skip '('
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(c) = self.ch else {
                return Token::err(pos);
            };
            self.bump();
            match c {
                b'(' => {
                    depth += 1;
                    out.push(c);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(c);
                }
                b'\\' => {
                    let Some(e) = self.ch else {
                        return Token::err(pos);
                    };
                    self.bump();
                    match e {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'\r' => {
                            // Line continuation
                            if self.ch == Some(b'\n') {
                                self.bump();
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut code = u32::from(e - b'0');
                            for _ in 0..2 {
                                match self.ch {
                                    Some(d @ b'0'..=b'7') => {
                                        code = code * 8 + u32::from(d - b'0');
                                        self.bump();
                                    }
                                    _ => break,
                                }
                            }
                            out.push((code & 0xff) as u8);
                        }
                        other => out.push(other),
                    }
                }
                _ => out.push(c),
            }
        }
        Token::new(TokenKind::String, out, pos)
    }

    /// Hex string `<...>`; '<' already consumed. Digits are kept as written.
    fn read_hex_string(&mut self, pos: usize) -> Token {
        let mut out = Vec::new();
        loop {
            match self.ch {
                None => return Token::err(pos),
                Some(b'>') => {
                    self.bump();
                    break;
                }
                Some(c) if c.is_ascii_hexdigit() => {
                    out.push(c);
                    self.bump();
                }
                Some(c) if is_whitespace(c) => self.bump(),
                Some(_) => return Token::err(pos),
            }
        }
        Token::new(TokenKind::StringBinary, out, pos)
    }

    /// Name `/Name` with `#xx` escapes.
    fn read_name(&mut self, pos: usize) -> Token {
        self.bump(); // Skip '/'
        let mut out = Vec::new();
        while let Some(c) = self.ch {
            if !is_regular(c) {
                break;
            }
            self.bump();
            if c == b'#' {
                let hi = self.ch.and_then(hex_value);
                if let Some(hi) = hi {
                    self.bump();
                    if let Some(lo) = self.ch.and_then(hex_value) {
                        self.bump();
                        out.push(hi << 4 | lo);
                    } else {
                        out.push(b'#');
                        out.push(hex_char(hi));
                    }
                    continue;
                }
            }
            out.push(c);
        }
        Token::new(TokenKind::Name, out, pos)
    }

    /// Numbers, keywords and operators.
    fn read_regular(&mut self, pos: usize) -> Token {
        let mut out = Vec::new();
        while let Some(c) = self.ch {
            if !is_regular(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        let kind = match out.as_slice() {
            b"true" => TokenKind::True,
            b"false" => TokenKind::False,
            b"null" => TokenKind::Null,
            [first, ..] if first.is_ascii_digit() || matches!(first, b'+' | b'-' | b'.') => {
                TokenKind::Number
            }
            _ => TokenKind::Op,
        };
        Token::new(kind, out, pos)
    }
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

const fn hex_char(v: u8) -> u8 {
    b"0123456789ABCDEF"[(v & 0x0f) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    fn tokens(data: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(BufferSource::from_slice(data));
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            if tok.kind == TokenKind::Err && lexer.eos() {
                break;
            }
            out.push(tok);
        }
        out
    }

    fn kinds(data: &[u8]) -> Vec<TokenKind> {
        tokens(data).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn classifies_scalars_and_keywords() {
        assert_eq!(
            kinds(b"12 -3.5 .5 true false null obj R"),
            vec![
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Op,
                TokenKind::Op,
            ]
        );
    }

    #[test]
    fn structural_tokens() {
        assert_eq!(
            kinds(b"<< /A [1] >>"),
            vec![
                TokenKind::DictBg,
                TokenKind::Name,
                TokenKind::ArrayBg,
                TokenKind::Number,
                TokenKind::ArrayEnd,
                TokenKind::DictEnd,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let toks = tokens(b"% a comment\n42 % trailing\r\n/Name");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].text, b"42");
        assert_eq!(toks[1].text, b"Name");
    }

    #[test]
    fn string_nesting_and_escapes() {
        let toks = tokens(b"(a(b)c\\)d\\n\\101\\7x)");
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].text, b"a(b)c)d\nA\x07x");
    }

    #[test]
    fn octal_escape_stops_after_three_digits() {
        let toks = tokens(b"(\\1012)");
        assert_eq!(toks[0].text, b"A2");
    }

    #[test]
    fn line_continuation_in_string() {
        let toks = tokens(b"(ab\\\r\ncd)");
        assert_eq!(toks[0].text, b"abcd");
    }

    #[test]
    fn hex_string_kept_as_text() {
        let toks = tokens(b"<48 65 6c>");
        assert_eq!(toks[0].kind, TokenKind::StringBinary);
        assert_eq!(toks[0].text, b"48656c");
    }

    #[test]
    fn name_hex_escape() {
        let toks = tokens(b"/A#20B /C#");
        assert_eq!(toks[0].text, b"A B");
        assert_eq!(toks[1].text, b"C#");
    }

    #[test]
    fn unterminated_string_is_error() {
        let mut lexer = Lexer::new(BufferSource::from_slice(b"(abc"));
        assert_eq!(lexer.next_token().kind, TokenKind::Err);
    }

    #[test]
    fn unmatched_angle_is_error() {
        let mut lexer = Lexer::new(BufferSource::from_slice(b"> 1"));
        assert_eq!(lexer.next_token().kind, TokenKind::Err);
    }

    #[test]
    fn token_positions() {
        let toks = tokens(b"  1 0 obj");
        assert_eq!(toks[0].pos, 2);
        assert_eq!(toks[2].pos, 6);
        assert!(toks[2].is_op("obj"));
    }

    #[test]
    fn take_raw_reads_from_lookahead() {
        let mut lexer = Lexer::new(BufferSource::from_slice(b"stream\nABCDE"));
        assert!(lexer.next_token().is_op("stream"));
        lexer.skip_to_newline();
        lexer.skip_byte();
        assert_eq!(lexer.tell(), 7);
        assert_eq!(lexer.take_raw(3), Some(b"ABC".to_vec()));
        assert_eq!(lexer.current(), Some(b'D'));
        assert_eq!(lexer.take_raw(5), None);
        assert_eq!(lexer.take_raw(usize::MAX), None);
        // Nothing was consumed by the rejected reads
        assert_eq!(lexer.take_raw(2), Some(b"DE".to_vec()));
    }
}

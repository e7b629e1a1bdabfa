//! Tests for the tokenizer and ObjectParser working together.

use pdfgraft_core::model::Dict;
use pdfgraft_core::parser::{Lexer, ObjectParser, StreamMode, TokenKind};
use pdfgraft_core::{BufferSource, PdfError, PdfString, StreamState, Value};

fn parser(data: &[u8]) -> ObjectParser<BufferSource> {
    ObjectParser::new(BufferSource::from_slice(data))
}

fn reparse(value: &Value) -> Value {
    parser(value.repr().as_bytes()).parse_value().unwrap()
}

// ============================================================================
// Tokenizer
// ============================================================================

#[test]
fn test_lexer_reports_error_token_at_end() {
    let mut lexer = Lexer::new(BufferSource::from_slice(b"/Name 1"));
    assert_eq!(lexer.next_token().kind, TokenKind::Name);
    assert_eq!(lexer.next_token().kind, TokenKind::Number);
    let end = lexer.next_token();
    assert_eq!(end.kind, TokenKind::Err);
    assert!(lexer.eos());
}

#[test]
fn test_lexer_binary_string_bytes() {
    let mut lexer = Lexer::new(BufferSource::from_slice(b"<FE FF 00 41>"));
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::StringBinary);
    let s = PdfString::hex(tok.text);
    assert_eq!(s.raw_bytes(), hex::decode("FEFF0041").unwrap());
    assert_eq!(s.decode(), "A");
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_round_trip_every_variant() {
    let mut inner = Dict::new();
    inner.insert("Type", Value::name("Font"));
    inner.insert("Odd Name", Value::name("with/slash"));
    inner.insert("Kids", Value::Array(vec![Value::Ref(4), Value::Ref(5)]));
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Number(42.0),
        Value::Number(-0.25),
        Value::string(b"plain (nested) back\\slash \x01\x7f".to_vec()),
        Value::String(PdfString::hex(b"feff0041".to_vec())),
        Value::name("A B#C"),
        Value::Array(vec![
            Value::Ref(12),
            1i64.into(),
            2i64.into(),
            Value::Array(vec![]),
        ]),
        Value::Dict(inner),
        Value::Dict(Dict::new()),
    ];
    for value in &values {
        assert_eq!(&reparse(value), value, "{}", value.repr());
    }
    // A reference only exists inside a container
    let wrapped = Value::Array(vec![Value::Ref(7)]);
    assert_eq!(reparse(&wrapped), wrapped);
}

#[test]
fn test_round_trip_stream_payload() {
    let mut dict = Dict::new();
    dict.insert("Length", 999i64.into());
    dict.set_stream(StreamState::Inline(bytes::Bytes::from_static(b"q 1 0 0 1 0 0 cm Q")));
    let value = Value::Dict(dict);
    let back = reparse(&value);
    let back = back.as_dict().unwrap();
    assert_eq!(back.stream().unwrap().as_ref(), b"q 1 0 0 1 0 0 cm Q");
    // Length follows the payload, not the stale entry
    assert_eq!(back.get_integer("Length"), Some(18));
}

#[test]
fn test_number_pairs_in_arrays() {
    let v = parser(b"[1 2 3 0 R 4 5]").parse_value().unwrap();
    assert_eq!(
        v,
        Value::Array(vec![
            1i64.into(),
            2i64.into(),
            Value::Ref(3),
            4i64.into(),
            5i64.into()
        ])
    );
}

#[test]
fn test_reference_in_nested_dict_value() {
    let v = parser(b"<</A <</B 10 0 R /C [11 0 R]>>>>").parse_value().unwrap();
    let a = v.as_dict().unwrap().get_dict("A").unwrap();
    assert_eq!(a.get("B"), Some(&Value::Ref(10)));
    assert_eq!(a.get_array("C"), Some(&[Value::Ref(11)][..]));
}

#[test]
fn test_truncated_array_fails() {
    let mut p = parser(b"[1 2");
    assert!(p.parse_value().is_err());
    let mut p = parser(b"<</Kids [1 0 R 2 0 R");
    assert!(p.parse_value().is_err());
}

#[test]
fn test_dict_key_must_be_name() {
    let mut p = parser(b"<<1 2>>");
    assert!(matches!(p.parse_value(), Err(PdfError::SyntaxError(_))));
}

// ============================================================================
// Deferred streams
// ============================================================================

#[test]
fn test_deferred_then_completed() {
    let data = b"5 0 obj\n<</Length 6 0 R>>\nstream\n0123456789\nendstream\nendobj\n";
    let mut p = parser(data);
    let (num, mut value) = p.parse_object_def(StreamMode::Defer).unwrap();
    assert_eq!(num, 5);
    let dict = value.as_dict_mut().unwrap();
    let StreamState::Deferred(pos) = *dict.stream_state() else {
        panic!("expected deferred stream, got {:?}", dict.stream_state());
    };
    assert_eq!(&data[pos..pos + 10], b"0123456789");
    assert!(dict.stream().is_none());

    p.complete_stream(dict, 10).unwrap();
    assert!(matches!(dict.stream_state(), StreamState::Inline(b) if b.len() == 10));
    p.expect_op("endobj").unwrap();
}

#[test]
fn test_wrong_deferred_length_fails() {
    let data = b"5 0 obj\n<</Length 6 0 R>>\nstream\n0123456789\nendstream\nendobj\n";
    let mut p = parser(data);
    let (_, mut value) = p.parse_object_def(StreamMode::Defer).unwrap();
    let dict = value.as_dict_mut().unwrap();
    assert!(p.complete_stream(dict, 4).is_err());
}

#[test]
fn test_oversized_length_is_an_error() {
    let mut p = parser(b"<</Length 99999999999999999999>>\nstream\nabc\nendstream");
    assert!(matches!(p.parse_value(), Err(PdfError::UnexpectedEof)));

    let data = b"5 0 obj\n<</Length 6 0 R>>\nstream\n0123456789\nendstream\nendobj\n";
    let mut p = parser(data);
    let (_, mut value) = p.parse_object_def(StreamMode::Defer).unwrap();
    let dict = value.as_dict_mut().unwrap();
    assert!(matches!(
        p.complete_stream(dict, usize::MAX),
        Err(PdfError::UnexpectedEof)
    ));
    assert!(dict.is_deferred());
}

#[test]
fn test_content_stream_ignores_stream_keyword() {
    let mut p = parser(b"<</A 1>> stream");
    let v = p.parse_value_with(StreamMode::Ignore).unwrap();
    assert!(!v.as_dict().unwrap().has_stream());
    assert!(p.token().is_op("stream"));
}

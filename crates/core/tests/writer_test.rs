//! Tests for writing loaded objects back out.

mod common;

use pdfgraft_core::model::{Renumber, write_indirect};
use pdfgraft_core::{BufferSource, Dict, PdfFile, StreamState, Value};

#[test]
fn test_inflate_drops_filter() {
    let mut dict = Dict::new();
    dict.insert("Filter", Value::name("FlateDecode"));
    dict.insert("Length", 0i64.into());
    dict.set_stream(StreamState::Inline(common::deflate(b"BT ET").into()));
    let value = Value::Dict(dict);

    let mut inflated = Vec::new();
    value.write(&mut inflated, None, true);
    insta::assert_snapshot!(String::from_utf8_lossy(&inflated), @r"
    <</Length 5>>
    stream
    BT ET
    endstream
    ");

    // Without inflate the compressed payload is kept
    let mut out = Vec::new();
    value.write(&mut out, None, false);
    assert!(out.starts_with(b"<</Filter /FlateDecode /Length "));
}

#[test]
fn test_page_written_with_renumbering() {
    let file = PdfFile::load(BufferSource::new(common::classic_table(&common::graph()))).unwrap();
    let page = file.object(3).unwrap();
    let mut map = Renumber::default();
    map.insert(3, 1);
    map.insert(2, 7);
    map.insert(5, 8);
    let mut out = Vec::new();
    write_indirect(&mut out, 3, page, Some(&map), false);
    insta::assert_snapshot!(String::from_utf8_lossy(&out), @r"
    1 0 obj
    <</Type /Page /Parent 7 0 R /Contents 8 0 R>>
    endobj
    ");
}

#[test]
fn test_loaded_stream_round_trips() {
    let file = PdfFile::load(BufferSource::new(common::xref_stream())).unwrap();
    let form = file.object(9).unwrap();
    let mut out = Vec::new();
    form.write(&mut out, None, false);
    let again = PdfFile::load(BufferSource::new(common::classic_table(&[
        (1, b"<</Type /Catalog /Pages 2 0 R>>".to_vec()),
        (2, b"<</Type /Pages /Kids [] /Count 0>>".to_vec()),
        (3, out),
    ])))
    .unwrap();
    assert_eq!(again.object(3), Some(form));
    assert_eq!(
        hex::encode(again.object(3).unwrap().as_dict().unwrap().stream().unwrap()),
        hex::encode(common::FORM_CONTENT)
    );
}

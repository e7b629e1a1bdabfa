//! Serialization of values back to PDF syntax.
//!
//! Output re-parses to an equal value. Streams are written with their
//! `Length` rewritten to the payload actually emitted.

use super::objects::{Dict, ObjNum, PdfString, StreamState, Value};
use crate::codec;
use crate::parser::lexer::is_regular;
use rustc_hash::FxHashMap;

/// Object-number mapping applied to references while writing.
pub type Renumber = FxHashMap<ObjNum, ObjNum>;

impl Value {
    /// Append the PDF syntax of this value to `out`.
    ///
    /// References are mapped through `renumber` when given. With `inflate`,
    /// Flate-compressed stream payloads are written decompressed.
    pub fn write(&self, out: &mut Vec<u8>, renumber: Option<&Renumber>, inflate: bool) {
        match self {
            Self::Null => out.extend_from_slice(b"null"),
            Self::Bool(true) => out.extend_from_slice(b"true"),
            Self::Bool(false) => out.extend_from_slice(b"false"),
            Self::Number(n) => write_number(out, *n),
            Self::String(s) => write_string(out, s),
            Self::Name(name) => write_name(out, name),
            Self::Ref(num) => {
                let num = renumber.and_then(|m| m.get(num)).copied().unwrap_or(*num);
                out.extend_from_slice(format!("{num} 0 R").as_bytes());
            }
            Self::Array(arr) => {
                out.push(b'[');
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write(out, renumber, inflate);
                }
                out.push(b']');
            }
            Self::Dict(dict) => write_dict(out, dict, renumber, inflate),
        }
    }

    /// PDF syntax as a string, for logging and tests.
    pub fn repr(&self) -> String {
        let mut out = Vec::new();
        self.write(&mut out, None, false);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Write `num 0 obj ... endobj`.
pub fn write_indirect(
    out: &mut Vec<u8>,
    num: ObjNum,
    value: &Value,
    renumber: Option<&Renumber>,
    inflate: bool,
) {
    let num = renumber.and_then(|m| m.get(&num)).copied().unwrap_or(num);
    out.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
    value.write(out, renumber, inflate);
    out.extend_from_slice(b"\nendobj\n");
}

fn write_number(out: &mut Vec<u8>, n: f64) {
    if !n.is_finite() {
        out.push(b'0');
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        out.extend_from_slice(format!("{}", n as i64).as_bytes());
    } else {
        out.extend_from_slice(format!("{n}").as_bytes());
    }
}

fn write_string(out: &mut Vec<u8>, s: &PdfString) {
    if s.binary {
        out.push(b'<');
        out.extend_from_slice(&s.bytes);
        out.push(b'>');
        return;
    }
    out.push(b'(');
    for &b in &s.bytes {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            0x00..=0x1f | 0x7f => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for &b in name.as_bytes() {
        if b == b'#' || !(0x21..=0x7e).contains(&b) || !is_regular(b) {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        } else {
            out.push(b);
        }
    }
}

fn write_dict(out: &mut Vec<u8>, dict: &Dict, renumber: Option<&Renumber>, inflate: bool) {
    let payload = match dict.stream_state() {
        StreamState::Inline(data) => Some(stream_payload(dict, data, inflate)),
        _ => None,
    };
    let dropped_filter = matches!(payload, Some((_, true)));

    out.extend_from_slice(b"<<");
    let mut first = true;
    let mut wrote_length = false;
    for (key, value) in dict {
        if dropped_filter && (key == "Filter" || key == "DecodeParms") {
            continue;
        }
        if !first {
            out.push(b' ');
        }
        first = false;
        write_name(out, key);
        out.push(b' ');
        match (&payload, key.as_str()) {
            (Some((data, _)), "Length") => {
                write_number(out, data.len() as f64);
                wrote_length = true;
            }
            _ => value.write(out, renumber, inflate),
        }
    }
    if let Some((data, _)) = &payload
        && !wrote_length
    {
        if !first {
            out.push(b' ');
        }
        out.extend_from_slice(b"/Length ");
        write_number(out, data.len() as f64);
    }
    out.extend_from_slice(b">>");

    if let Some((data, _)) = payload {
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(&data);
        out.extend_from_slice(b"\nendstream");
    }
}

/// Payload to emit and whether the Flate filter was removed.
fn stream_payload(dict: &Dict, data: &[u8], inflate: bool) -> (Vec<u8>, bool) {
    if inflate && codec::filter_names(dict) == ["FlateDecode"] {
        match dict.decoded_stream() {
            Ok(decoded) => return (decoded, true),
            Err(e) => tracing::warn!(error = %e, "keeping compressed stream"),
        }
    }
    (data.to_vec(), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn numbers() {
        insta::assert_snapshot!(Value::Number(3.0).repr(), @"3");
        insta::assert_snapshot!(Value::Number(-0.5).repr(), @"-0.5");
        insta::assert_snapshot!(Value::Number(0.1).repr(), @"0.1");
    }

    #[test]
    fn strings_and_names() {
        insta::assert_snapshot!(Value::string(b"a(b)\\\n".to_vec()).repr(), @r"(a\(b\)\\\012)");
        insta::assert_snapshot!(Value::String(PdfString::hex(b"0aFF".to_vec())).repr(), @"<0aFF>");
        insta::assert_snapshot!(Value::name("A B#").repr(), @"/A#20B#23");
    }

    #[test]
    fn renumbers_references() {
        let mut map = Renumber::default();
        map.insert(5, 1);
        let v = Value::Array(vec![Value::Ref(5), Value::Ref(6)]);
        let mut out = Vec::new();
        v.write(&mut out, Some(&map), false);
        assert_eq!(out, b"[1 0 R 6 0 R]");
    }

    #[test]
    fn stream_length_rewritten() {
        let mut d = Dict::new();
        d.insert("Length", Value::Ref(9));
        d.insert("Type", Value::name("XObject"));
        d.set_stream(StreamState::Inline(Bytes::from_static(b"0 0 m")));
        insta::assert_snapshot!(Value::Dict(d).repr(), @r"
        <</Length 5 /Type /XObject>>
        stream
        0 0 m
        endstream
        ");
    }

    #[test]
    fn indirect_wrapper() {
        let mut out = Vec::new();
        write_indirect(&mut out, 4, &Value::Bool(true), None, false);
        assert_eq!(out, b"4 0 obj\ntrue\nendobj\n");
    }
}

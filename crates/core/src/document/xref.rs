//! Cross-reference index parsing.
//!
//! Two encodings of the same index: the classic `xref` table and the
//! compressed cross-reference stream. Both produce [`XRefEntry`] lists; the
//! loader decides what to do with them.

use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, Value};
use crate::parser::ObjectParser;
use crate::source::DataSource;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

static STARTXREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"startxref\s+(\d+)").expect("startxref pattern"));

/// One entry of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Object stored directly at a byte offset
    InFile { num: ObjNum, offset: usize },
    /// Object stored inside the object stream `container`
    Compressed {
        num: ObjNum,
        container: ObjNum,
        index: usize,
    },
}

/// Offset named by the last `startxref` marker in `tail`.
pub fn find_startxref(tail: &[u8]) -> Option<usize> {
    let caps = STARTXREF_RE.captures_iter(tail).last()?;
    let digits = std::str::from_utf8(caps.get(1)?.as_bytes()).ok()?;
    digits.parse().ok()
}

/// Read a classic table. The `xref` keyword has been consumed; the lookahead
/// is left on `trailer`.
///
/// Every subsection (`first count` followed by `count` rows) is read. Free
/// rows and rows at offset 0 are skipped.
pub fn read_xref_table<S: DataSource>(parser: &mut ObjectParser<S>) -> Result<Vec<XRefEntry>> {
    let mut entries = Vec::new();
    while !parser.token().is_op("trailer") {
        let first = parser.take_integer()?;
        let count = parser.take_integer()?;
        for i in 0..count {
            let offset = parser.take_integer()?;
            let _generation = parser.take_integer()?;
            let in_use = match parser.token() {
                t if t.is_op("n") => true,
                t if t.is_op("f") => false,
                _ => return Err(PdfError::syntax("xref row without n/f marker")),
            };
            parser.advance();
            if in_use && offset > 0 {
                let num = first
                    .checked_add(i)
                    .and_then(|n| ObjNum::try_from(n).ok())
                    .ok_or_else(|| PdfError::syntax("xref object number out of range"))?;
                entries.push(XRefEntry::InFile {
                    num,
                    offset: offset as usize,
                });
            }
        }
    }
    Ok(entries)
}

/// Layout of a cross-reference stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRefStreamLayout {
    pub size: usize,
    pub widths: [usize; 3],
}

impl XRefStreamLayout {
    /// Check `/Type /XRef`, `/Size`, the optional `/Index` window and `/W`.
    ///
    /// Only a single window starting at object 0 and covering the whole
    /// `Size` is accepted.
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        if !dict.is_type("XRef") {
            return Err(PdfError::syntax("not a cross-reference stream"));
        }
        let size = dict
            .get_integer("Size")
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| PdfError::syntax("xref stream without valid Size"))?;

        if let Some(index) = dict.get("Index") {
            let window: Vec<i64> = index
                .as_array()?
                .iter()
                .filter_map(|v| v.as_integer().ok())
                .collect();
            if window != [0, size as i64] {
                return Err(PdfError::syntax(format!(
                    "unsupported xref stream Index {}",
                    index.repr()
                )));
            }
        }

        let w = dict
            .get_array("W")
            .ok_or_else(|| PdfError::syntax("xref stream without W"))?;
        let widths: Vec<usize> = w
            .iter()
            .filter_map(|v| v.as_integer().ok())
            .filter_map(|n| usize::try_from(n).ok())
            .collect();
        let [w0, w1, w2] = widths[..] else {
            return Err(PdfError::syntax("W must have 3 elements"));
        };
        if w.len() != 3 || w0 > 8 || w1 > 8 || w2 > 8 {
            return Err(PdfError::syntax("invalid W field widths"));
        }
        Ok(Self {
            size,
            widths: [w0, w1, w2],
        })
    }

    fn record_len(&self) -> usize {
        self.widths.iter().sum()
    }

    /// Decode fixed-width big-endian records. A zero-width type field means
    /// type 1.
    pub fn entries(&self, data: &[u8]) -> Vec<XRefEntry> {
        let [w0, w1, w2] = self.widths;
        let record_len = self.record_len();
        if record_len == 0 {
            return Vec::new();
        }
        let mut entries = Vec::new();
        for (i, record) in data.chunks_exact(record_len).take(self.size).enumerate() {
            let kind = if w0 > 0 { read_be(&record[..w0]) } else { 1 };
            let field1 = read_be(&record[w0..w0 + w1]);
            let field2 = read_be(&record[w0 + w1..w0 + w1 + w2]);
            let Ok(num) = ObjNum::try_from(i) else { break };
            match kind {
                1 if field1 > 0 => entries.push(XRefEntry::InFile {
                    num,
                    offset: field1 as usize,
                }),
                2 => match ObjNum::try_from(field1) {
                    Ok(container) => entries.push(XRefEntry::Compressed {
                        num,
                        container,
                        index: field2 as usize,
                    }),
                    Err(_) => tracing::debug!(num, field1, "object stream number out of range"),
                },
                _ => {}
            }
        }
        entries
    }
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| acc << 8 | u64::from(b))
}

/// Trailer from a cross-reference stream dictionary: everything but the
/// stream-layout keys.
pub fn trailer_from_xref_dict(dict: &Dict) -> Dict {
    dict.iter()
        .filter(|(k, _)| !matches!(k.as_str(), "Length" | "Filter" | "DecodeParms" | "W" | "Index"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Whether `value` is a cross-reference stream dictionary.
pub fn is_xref_dict(value: &Value) -> bool {
    matches!(value, Value::Dict(d) if d.is_type("XRef"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    #[test]
    fn startxref_takes_last_marker() {
        let tail = b"startxref\n10\n%%EOF\n... startxref\r\n  1234\n%%EOF";
        assert_eq!(find_startxref(tail), Some(1234));
        assert_eq!(find_startxref(b"no marker"), None);
    }

    #[test]
    fn table_with_subsections() {
        let data = b"0 2\n0000000000 65535 f \n0000000017 00000 n \n5 2\n0000000100 00000 n \n0000000000 00000 f \ntrailer";
        let mut parser = ObjectParser::new(BufferSource::from_slice(data));
        let entries = read_xref_table(&mut parser).unwrap();
        assert_eq!(
            entries,
            vec![
                XRefEntry::InFile { num: 1, offset: 17 },
                XRefEntry::InFile { num: 5, offset: 100 },
            ]
        );
        assert!(parser.token().is_op("trailer"));
    }

    #[test]
    fn table_row_without_marker_fails() {
        let data = b"0 1\n0000000017 00000 x \ntrailer";
        let mut parser = ObjectParser::new(BufferSource::from_slice(data));
        assert!(read_xref_table(&mut parser).is_err());
    }

    fn xref_dict(entries: &[(&str, Value)]) -> Dict {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn layout_validation() {
        let w = Value::Array(vec![1i64.into(), 2i64.into(), 1i64.into()]);
        let ok = xref_dict(&[
            ("Type", Value::name("XRef")),
            ("Size", 3i64.into()),
            ("W", w.clone()),
        ]);
        assert_eq!(
            XRefStreamLayout::from_dict(&ok).unwrap(),
            XRefStreamLayout {
                size: 3,
                widths: [1, 2, 1]
            }
        );

        let windowed = xref_dict(&[
            ("Type", Value::name("XRef")),
            ("Size", 3i64.into()),
            ("Index", Value::Array(vec![2i64.into(), 1i64.into()])),
            ("W", w.clone()),
        ]);
        assert!(XRefStreamLayout::from_dict(&windowed).is_err());

        let short_w = xref_dict(&[
            ("Type", Value::name("XRef")),
            ("Size", 3i64.into()),
            ("W", Value::Array(vec![1i64.into(), 2i64.into()])),
        ]);
        assert!(XRefStreamLayout::from_dict(&short_w).is_err());
    }

    #[test]
    fn record_decoding() {
        let layout = XRefStreamLayout {
            size: 4,
            widths: [1, 2, 1],
        };
        let data = [0, 0, 0, 0xff, 1, 0x01, 0x00, 0, 2, 0, 7, 3, 1, 0, 0x20, 0];
        assert_eq!(
            layout.entries(&data),
            vec![
                XRefEntry::InFile { num: 1, offset: 256 },
                XRefEntry::Compressed {
                    num: 2,
                    container: 7,
                    index: 3
                },
                XRefEntry::InFile { num: 3, offset: 32 },
            ]
        );
    }

    #[test]
    fn trailer_drops_layout_keys() {
        let d = xref_dict(&[
            ("Type", Value::name("XRef")),
            ("Root", Value::Ref(1)),
            ("W", Value::Array(vec![])),
            ("Length", 10i64.into()),
        ]);
        let t = trailer_from_xref_dict(&d);
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["Type", "Root"]);
    }
}

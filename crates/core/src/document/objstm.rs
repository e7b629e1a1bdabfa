//! Object streams (`/Type /ObjStm`).
//!
//! The decoded payload starts with `N` pairs of object number and relative
//! offset; each object body sits at `First + offset` and is an ordinary value
//! without an `obj`/`endobj` wrapper.

use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, Value};
use crate::parser::{ObjectParser, StreamMode};
use crate::source::BufferSource;

/// Decode every object held by an object-stream dictionary.
///
/// Entries come back in directory order.
pub fn decode_object_stream(container: &Dict) -> Result<Vec<(ObjNum, Value)>> {
    if !container.is_type("ObjStm") {
        return Err(PdfError::syntax("not an object stream"));
    }
    let count = container
        .get_integer("N")
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| PdfError::syntax("object stream without valid N"))?;
    let first = container
        .get_integer("First")
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| PdfError::syntax("object stream without valid First"))?;

    let data = container.decoded_stream()?;
    let data_len = data.len();
    let mut parser = ObjectParser::new(BufferSource::new(data));

    // Each directory entry takes at least two bytes
    let mut directory = Vec::with_capacity(count.min(data_len / 2));
    for _ in 0..count {
        let num = parser.take_integer()?;
        let offset = parser.take_integer()?;
        let num = ObjNum::try_from(num)
            .map_err(|_| PdfError::syntax(format!("object number {num} out of range")))?;
        let pos = usize::try_from(offset)
            .ok()
            .and_then(|offset| first.checked_add(offset))
            .ok_or_else(|| PdfError::syntax(format!("object {num} at bad offset {offset}")))?;
        directory.push((num, pos));
    }

    directory
        .into_iter()
        .map(|(num, pos)| {
            parser.seek(pos);
            let value = parser.parse_value_with(StreamMode::Ignore)?;
            Ok((num, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::StreamState;
    use bytes::Bytes;

    fn container(payload: &[u8], n: i64, first: i64) -> Dict {
        let mut d = Dict::new();
        d.insert("Type", Value::name("ObjStm"));
        d.insert("N", n.into());
        d.insert("First", first.into());
        d.set_stream(StreamState::Inline(Bytes::copy_from_slice(payload)));
        d
    }

    #[test]
    fn decodes_directory_and_bodies() {
        let body = b"<</A 1 0 R>> [1 2]";
        let header = b"4 0 5 13 ";
        let payload = [&header[..], &body[..]].concat();
        let objects = decode_object_stream(&container(&payload, 2, header.len() as i64)).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].0, 4);
        assert_eq!(
            objects[0].1.as_dict().unwrap().get("A"),
            Some(&Value::Ref(1))
        );
        assert_eq!(
            objects[1],
            (5, Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
    }

    #[test]
    fn short_directory_fails() {
        assert!(decode_object_stream(&container(b"4 0", 2, 3)).is_err());
    }

    #[test]
    fn oversized_count_fails_without_allocating() {
        assert!(decode_object_stream(&container(b"4 0 ", 999_999_999_999_999, 4)).is_err());
    }

    #[test]
    fn offset_overflow_fails() {
        assert!(decode_object_stream(&container(b"4 -1 null", 1, 6)).is_err());
        assert!(decode_object_stream(&container(b"4 18000000000000000000 null", 1, i64::MAX)).is_err());
    }

    #[test]
    fn requires_objstm_type() {
        let mut d = container(b"", 0, 0);
        d.insert("Type", Value::name("XObject"));
        assert!(decode_object_stream(&d).is_err());
    }
}

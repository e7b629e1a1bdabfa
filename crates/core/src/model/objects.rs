//! PDF object model.
//!
//! A closed set of value variants. Arrays and dictionaries own their children;
//! a [`Value::Ref`] is only an object number and is resolved through an
//! [`ObjectTable`].

use crate::codec;
use crate::error::{PdfError, Result};
use bytes::Bytes;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Object number of an indirect object.
pub type ObjNum = u32;

/// Anything that maps object numbers to values.
pub trait ObjectTable {
    fn object(&self, num: ObjNum) -> Option<&Value>;
}

impl ObjectTable for FxHashMap<ObjNum, Value> {
    fn object(&self, num: ObjNum) -> Option<&Value> {
        self.get(&num)
    }
}

/// Upper bound on `Ref -> Ref` chains followed by [`Value::resolve`].
const MAX_REF_CHAIN: usize = 32;

/// A string object. Literal strings hold decoded bytes; binary (hex) strings
/// hold the hex digits exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfString {
    pub bytes: Vec<u8>,
    pub binary: bool,
}

impl PdfString {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            binary: false,
        }
    }

    /// Hex string from its hex digits.
    pub fn hex(digits: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: digits.into(),
            binary: true,
        }
    }

    /// The string's byte content, hex-decoded for binary strings.
    pub fn raw_bytes(&self) -> Vec<u8> {
        if self.binary {
            codec::asciihexdecode(&self.bytes).unwrap_or_default()
        } else {
            self.bytes.clone()
        }
    }

    /// Text content. A `FE FF` prefix selects UTF-16BE, anything else is
    /// read as Latin-1.
    pub fn decode(&self) -> String {
        let raw = self.raw_bytes();
        match raw.strip_prefix(&[0xfe, 0xff]) {
            Some(rest) => {
                let units: Vec<u16> = rest
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            None => raw.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Stream attachment of a dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StreamState {
    #[default]
    Absent,
    /// Payload read, still encoded
    Inline(Bytes),
    /// Byte offset of the payload in the source, waiting for its `Length`
    Deferred(usize),
}

/// Dictionary with an optional stream. Keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: IndexMap<String, Value>,
    stream: StreamState,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; replacing keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Entry with references followed through `table`.
    pub fn get_resolved<'a, T: ObjectTable + ?Sized>(
        &'a self,
        key: &str,
        table: &'a T,
    ) -> Option<&'a Value> {
        self.get(key)?.resolve(table)
    }

    /// Direct numeric entry.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number().ok()
    }

    /// Direct numeric entry truncated to an integer.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_integer().ok()
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_name().ok()
    }

    pub fn get_array(&self, key: &str) -> Option<&[Value]> {
        self.get(key)?.as_array().ok()
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key)?.as_dict().ok()
    }

    /// Array of numbers, resolving the array and each element.
    /// `None` if anything is not a number.
    pub fn get_number_array<T: ObjectTable + ?Sized>(
        &self,
        key: &str,
        table: &T,
    ) -> Option<Vec<f64>> {
        let arr = self.get_resolved(key, table)?.as_array().ok()?;
        arr.iter()
            .map(|v| v.resolve(table).and_then(|v| v.as_number().ok()))
            .collect()
    }

    /// Whether `/Type` is `name`.
    pub fn is_type(&self, name: &str) -> bool {
        self.get_name("Type") == Some(name)
    }

    pub fn stream_state(&self) -> &StreamState {
        &self.stream
    }

    pub fn set_stream(&mut self, stream: StreamState) {
        self.stream = stream;
    }

    /// Whether a stream is attached, loaded or not.
    pub fn has_stream(&self) -> bool {
        !matches!(self.stream, StreamState::Absent)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.stream, StreamState::Deferred(_))
    }

    /// The encoded payload, if loaded.
    pub fn stream(&self) -> Option<&Bytes> {
        match &self.stream {
            StreamState::Inline(data) => Some(data),
            _ => None,
        }
    }

    /// The payload with every filter applied.
    pub fn decoded_stream(&self) -> Result<Vec<u8>> {
        let data = self
            .stream()
            .ok_or_else(|| PdfError::DecodeError("stream not loaded".into()))?;
        codec::decode_stream(self, data)
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            stream: StreamState::Absent,
        }
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(PdfString),
    /// Name without the leading slash
    Name(String),
    /// Indirect reference by object number
    Ref(ObjNum),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::String(PdfString::literal(bytes))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_number(&self) -> Result<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Number truncated toward zero.
    pub fn as_integer(&self) -> Result<i64> {
        let n = self.as_number()?;
        if n.is_finite() {
            Ok(n.trunc() as i64)
        } else {
            Err(PdfError::TypeError {
                expected: "integer",
                got: "number",
            })
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_string(&self) -> Result<&PdfString> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_dict(&self) -> Result<&Dict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_ref(&self) -> Result<ObjNum> {
        match self {
            Self::Ref(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Follow references through `table`. Non-references resolve to
    /// themselves; a dangling or cyclic chain resolves to `None`.
    pub fn resolve<'a, T: ObjectTable + ?Sized>(&'a self, table: &'a T) -> Option<&'a Value> {
        let mut current = self;
        for _ in 0..MAX_REF_CHAIN {
            match current {
                Self::Ref(num) => current = table.object(*num)?,
                other => return Some(other),
            }
        }
        None
    }

    /// Type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Name(_) => "name",
            Self::Ref(_) => "ref",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Self::Dict(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Self::Array(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_report_type_errors() {
        let v = Value::Number(3.7);
        assert_eq!(v.as_number().unwrap(), 3.7);
        assert_eq!(v.as_integer().unwrap(), 3);
        match v.as_name() {
            Err(PdfError::TypeError { expected, got }) => {
                assert_eq!(expected, "name");
                assert_eq!(got, "number");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolve_follows_chains_and_stops_on_cycles() {
        let mut table: FxHashMap<ObjNum, Value> = FxHashMap::default();
        table.insert(1, Value::Ref(2));
        table.insert(2, Value::Number(5.0));
        table.insert(3, Value::Ref(4));
        table.insert(4, Value::Ref(3));
        assert_eq!(Value::Ref(1).resolve(&table), Some(&Value::Number(5.0)));
        assert_eq!(Value::Ref(3).resolve(&table), None);
        assert_eq!(Value::Ref(9).resolve(&table), None);
        assert_eq!(Value::Null.resolve(&table), Some(&Value::Null));
    }

    #[test]
    fn dict_keeps_order_and_equality_ignores_it() {
        let mut a = Dict::new();
        a.insert("B", Value::Number(1.0));
        a.insert("A", Value::Number(2.0));
        assert_eq!(a.keys().collect::<Vec<_>>(), vec!["B", "A"]);

        let mut b = Dict::new();
        b.insert("A", Value::Number(2.0));
        b.insert("B", Value::Number(1.0));
        assert_eq!(a, b);

        b.set_stream(StreamState::Inline(Bytes::from_static(b"x")));
        assert_ne!(a, b);
    }

    #[test]
    fn number_array_resolves_elements() {
        let mut table: FxHashMap<ObjNum, Value> = FxHashMap::default();
        table.insert(7, Value::Number(612.0));
        let mut d = Dict::new();
        d.insert(
            "MediaBox",
            Value::Array(vec![0i64.into(), 0i64.into(), Value::Ref(7), 792i64.into()]),
        );
        assert_eq!(
            d.get_number_array("MediaBox", &table),
            Some(vec![0.0, 0.0, 612.0, 792.0])
        );
        d.insert("Bad", Value::Array(vec![Value::name("x")]));
        assert_eq!(d.get_number_array("Bad", &table), None);
    }

    #[test]
    fn string_decoding() {
        assert_eq!(PdfString::literal(b"caf\xe9".to_vec()).decode(), "café");
        assert_eq!(
            PdfString::literal(vec![0xfe, 0xff, 0x00, 0x41, 0x26, 0x3a]).decode(),
            "A\u{263a}"
        );
        assert_eq!(PdfString::hex(b"48 69".to_vec()).raw_bytes(), b"Hi");
        assert_eq!(PdfString::hex(b"FEFF00410042".to_vec()).decode(), "AB");
    }

    #[test]
    fn decoded_stream_requires_inline_payload() {
        let mut d = Dict::new();
        d.set_stream(StreamState::Deferred(10));
        assert!(d.is_deferred());
        assert!(d.decoded_stream().is_err());
        d.set_stream(StreamState::Inline(Bytes::from_static(b"q Q")));
        assert_eq!(d.decoded_stream().unwrap(), b"q Q");
    }
}

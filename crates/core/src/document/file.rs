//! Whole-file loading with structural-index recovery.
//!
//! Three strategies, tried in order:
//!
//! 1. classic `xref` table named by `startxref`
//! 2. cross-reference stream named by `startxref`, with object streams
//! 3. sequential scan of the whole source
//!
//! Strategies 1 and 2 each start from an empty table. If either fails at any
//! point, page-tree resolution included, the scan runs on a fresh table.

use super::objstm::decode_object_stream;
use super::page::{collect_pages, media_box};
use super::xref::{
    XRefEntry, XRefStreamLayout, find_startxref, is_xref_dict, read_xref_table,
    trailer_from_xref_dict,
};
use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, ObjectTable, Value};
use crate::parser::{ObjectParser, StreamMode, TokenKind};
use crate::source::DataSource;
use crate::utils::Rect;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::fmt;

/// Which strategy produced the object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    XRefTable,
    XRefStream,
    Sequential,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::XRefTable => "xref table",
            Self::XRefStream => "xref stream",
            Self::Sequential => "sequential scan",
        })
    }
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Trailing bytes searched for `startxref`
    pub tail_window: usize,
    /// Try the structural index before scanning
    pub use_structural_index: bool,
    /// Sources shorter than this are rejected
    pub min_source_len: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            tail_window: 1024,
            use_structural_index: true,
            min_source_len: 16,
        }
    }
}

/// A loaded file: object table, trailer and resolved page list.
#[derive(Debug, Clone)]
pub struct PdfFile {
    objects: FxHashMap<ObjNum, Value>,
    trailer: Dict,
    pages: Vec<ObjNum>,
    strategy: Strategy,
}

impl PdfFile {
    /// Load with default options.
    pub fn load<S: DataSource>(source: S) -> Result<Self> {
        Self::load_with(source, &LoadOptions::default())
    }

    pub fn load_with<S: DataSource>(mut source: S, options: &LoadOptions) -> Result<Self> {
        let len = source.len();
        if len < options.min_source_len {
            return Err(PdfError::syntax(format!("source too short ({len} bytes)")));
        }

        if options.use_structural_index {
            let attempt = read_startxref(&mut source, options.tail_window)
                .and_then(|offset| Loader::new(&mut source).load_indexed(offset));
            match attempt {
                Ok(file) => return Ok(file),
                Err(e) => tracing::warn!(error = %e, "structural index unusable, scanning"),
            }
        }
        Loader::new(&mut source).load_sequential()
    }

    pub fn object(&self, num: ObjNum) -> Option<&Value> {
        self.objects.get(&num)
    }

    /// Remove an object from the table, handing over ownership.
    pub fn take(&mut self, num: ObjNum) -> Option<Value> {
        self.objects.remove(&num)
    }

    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// The document catalog (`trailer.Root`).
    pub fn catalog(&self) -> Option<&Dict> {
        self.trailer.get_resolved("Root", self)?.as_dict().ok()
    }

    pub fn count_pages(&self) -> usize {
        self.pages.len()
    }

    /// Page dictionary by zero-based index.
    pub fn page(&self, index: usize) -> Option<&Dict> {
        let num = self.page_object_number(index)?;
        self.object(num)?.as_dict().ok()
    }

    pub fn page_object_number(&self, index: usize) -> Option<ObjNum> {
        self.pages.get(index).copied()
    }

    /// Index of the page whose object number is `num`.
    pub fn find_page_from_object_number(&self, num: ObjNum) -> Option<usize> {
        self.pages.iter().position(|&p| p == num)
    }

    /// Media box of a page, inherited through `Parent`.
    pub fn media_box(&self, index: usize) -> Option<Rect> {
        media_box(self, self.page(index)?)
    }

    /// All object numbers, ascending.
    pub fn object_numbers(&self) -> Vec<ObjNum> {
        self.objects.keys().copied().sorted_unstable().collect()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectTable for PdfFile {
    fn object(&self, num: ObjNum) -> Option<&Value> {
        self.objects.get(&num)
    }
}

/// State of one loading attempt.
struct Loader<S: DataSource> {
    parser: ObjectParser<S>,
    objects: FxHashMap<ObjNum, Value>,
    trailer: Option<Dict>,
}

impl<S: DataSource> Loader<S> {
    fn new(source: S) -> Self {
        Self {
            parser: ObjectParser::new(source),
            objects: FxHashMap::default(),
            trailer: None,
        }
    }

    fn finish(self, strategy: Strategy) -> Result<PdfFile> {
        let trailer = self.trailer.ok_or(PdfError::NoValidXRef)?;
        let pages = collect_pages(&self.objects, &trailer)?;
        tracing::debug!(%strategy, objects = self.objects.len(), pages = pages.len(), "loaded");
        Ok(PdfFile {
            objects: self.objects,
            trailer,
            pages,
            strategy,
        })
    }

    /// Strategies 1 and 2, starting at the `startxref` offset.
    fn load_indexed(mut self, offset: usize) -> Result<PdfFile> {
        self.parser.seek(offset);
        match self.parser.token().kind {
            TokenKind::Number => self.load_xref_stream(),
            _ if self.parser.token().is_op("xref") => self.load_xref_table(),
            _ => Err(PdfError::syntax(format!("no index at startxref {offset}"))),
        }
    }

    fn load_xref_table(mut self) -> Result<PdfFile> {
        self.parser.advance();
        let entries = read_xref_table(&mut self.parser)?;
        self.parser.expect_op("trailer")?;
        let Value::Dict(trailer) = self.parser.parse_value()? else {
            return Err(PdfError::syntax("trailer is not a dictionary"));
        };
        self.trailer = Some(trailer);
        tracing::debug!(entries = entries.len(), "xref table");

        self.load_entries(&entries)?;
        self.complete_deferred()?;
        self.expand_object_streams(Vec::new())?;
        self.finish(Strategy::XRefTable)
    }

    fn load_xref_stream(mut self) -> Result<PdfFile> {
        let (_, value) = self.parser.parse_object_def(StreamMode::Inline)?;
        let Value::Dict(dict) = value else {
            return Err(PdfError::syntax("xref stream is not a dictionary"));
        };
        let layout = XRefStreamLayout::from_dict(&dict)?;
        let entries = layout.entries(&dict.decoded_stream()?);
        self.trailer = Some(trailer_from_xref_dict(&dict));
        tracing::debug!(entries = entries.len(), ?layout, "xref stream");

        let containers = entries
            .iter()
            .filter_map(|e| match e {
                XRefEntry::Compressed { container, .. } => Some(*container),
                XRefEntry::InFile { .. } => None,
            })
            .collect();
        self.load_entries(&entries)?;
        self.complete_deferred()?;
        self.expand_object_streams(containers)?;
        self.finish(Strategy::XRefStream)
    }

    /// Parse every in-file entry at its offset, deferring indirect lengths.
    fn load_entries(&mut self, entries: &[XRefEntry]) -> Result<()> {
        for entry in entries {
            let XRefEntry::InFile { num, offset } = *entry else {
                continue;
            };
            self.parser.seek(offset);
            let (found, value) = self.parser.parse_object_def(StreamMode::Defer)?;
            if found != num {
                return Err(PdfError::syntax(format!(
                    "index names object {num} at {offset}, found {found}"
                )));
            }
            if is_xref_dict(&value) {
                continue;
            }
            self.objects.insert(num, value);
        }
        Ok(())
    }

    /// Read every deferred stream now that all lengths are resolvable.
    fn complete_deferred(&mut self) -> Result<()> {
        let pending: Vec<ObjNum> = self
            .objects
            .iter()
            .filter(|(_, v)| matches!(v, Value::Dict(d) if d.is_deferred()))
            .map(|(n, _)| *n)
            .sorted_unstable()
            .collect();
        for num in pending {
            let length = self.deferred_length(num)?;
            if let Some(Value::Dict(dict)) = self.objects.get_mut(&num) {
                self.parser.complete_stream(dict, length)?;
            }
        }
        Ok(())
    }

    fn deferred_length(&self, num: ObjNum) -> Result<usize> {
        let dict = self
            .objects
            .get(&num)
            .and_then(|v| v.as_dict().ok())
            .ok_or(PdfError::ObjectNotFound(num))?;
        stream_length(dict, &self.objects).ok_or(PdfError::UnresolvedLength(num))
    }

    /// Decode every object stream once. `extra` adds containers named by
    /// the index; any `/Type /ObjStm` object in the table is included too.
    /// Later directory entries overwrite earlier values.
    fn expand_object_streams(&mut self, extra: Vec<ObjNum>) -> Result<()> {
        let containers: Vec<ObjNum> = self
            .objects
            .iter()
            .filter(|(_, v)| matches!(v, Value::Dict(d) if d.is_type("ObjStm")))
            .map(|(n, _)| *n)
            .chain(extra)
            .sorted_unstable()
            .dedup()
            .collect();
        for container in containers {
            let decoded = {
                let dict = self
                    .objects
                    .get(&container)
                    .ok_or(PdfError::ObjectNotFound(container))?
                    .as_dict()?;
                decode_object_stream(dict)?
            };
            self.insert_all(decoded);
        }
        Ok(())
    }

    fn insert_all(&mut self, objects: Vec<(ObjNum, Value)>) {
        for (num, value) in objects {
            if self.objects.insert(num, value).is_some() {
                tracing::debug!(num, "object stream entry replaces earlier value");
            }
        }
    }

    /// Strategy 3: scan from the start.
    fn load_sequential(mut self) -> Result<PdfFile> {
        self.parser.seek(0);
        loop {
            let tok = self.parser.token();
            match tok.kind {
                TokenKind::Number => self.scan_object()?,
                TokenKind::Err if self.parser.eos() => break,
                TokenKind::Op if tok.is_op("trailer") => {
                    self.parser.advance();
                    let Value::Dict(trailer) = self.parser.parse_value()? else {
                        return Err(PdfError::syntax("trailer is not a dictionary"));
                    };
                    self.trailer = Some(trailer);
                    break;
                }
                TokenKind::Op if tok.is_op("xref") => {
                    self.parser.advance();
                    read_xref_table(&mut self.parser)?;
                }
                TokenKind::Op if tok.is_op("startxref") => {
                    if self.trailer.is_some() {
                        break;
                    }
                    return Err(PdfError::NoValidXRef);
                }
                _ => {
                    return Err(PdfError::syntax(format!(
                        "unexpected '{}' at {} during scan",
                        tok.text_str(),
                        tok.pos
                    )));
                }
            }
        }
        self.finish(Strategy::Sequential)
    }

    /// One `num 0 obj ... endobj` during the scan.
    fn scan_object(&mut self) -> Result<()> {
        let (num, mut value) = self.parser.parse_object_def(StreamMode::Defer)?;
        if let Value::Dict(dict) = &mut value
            && dict.is_deferred()
        {
            // Only objects already seen can supply the length
            let length = stream_length(dict, &self.objects).ok_or(PdfError::UnresolvedLength(num))?;
            self.parser.complete_stream(dict, length)?;
            self.parser.expect_op("endobj")?;
        }

        if let Value::Dict(dict) = &value {
            if dict.is_type("XRef") {
                self.trailer = Some(trailer_from_xref_dict(dict));
                return Ok(());
            }
            if dict.is_type("ObjStm") {
                let decoded = decode_object_stream(dict)?;
                self.objects.insert(num, value);
                self.insert_all(decoded);
                return Ok(());
            }
        }
        self.objects.insert(num, value);
        Ok(())
    }
}

/// Offset named by the last `startxref` in the final `window` bytes.
fn read_startxref<S: DataSource>(source: &mut S, window: usize) -> Result<usize> {
    let len = source.len();
    let tail_start = len.saturating_sub(window);
    source.seek(tail_start);
    let tail = source.read_bytes(len - tail_start);
    let offset = find_startxref(&tail).ok_or(PdfError::NoValidXRef)?;
    if offset >= len {
        return Err(PdfError::syntax(format!("startxref {offset} past end of source")));
    }
    Ok(offset)
}

/// `Length` of a stream dictionary, resolved through `table`.
fn stream_length<T: ObjectTable + ?Sized>(dict: &Dict, table: &T) -> Option<usize> {
    let n = dict.get_resolved("Length", table)?.as_number().ok()?;
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

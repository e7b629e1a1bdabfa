//! Font metrics needed to place glyphs.
//!
//! The interpreter only needs to split encoded strings into character codes
//! and know each code's advance width. [`DictFonts`] gets both from the font
//! dictionary itself; a rendering backend with real font programs can supply
//! its own [`FontSource`].

use crate::model::objects::{Dict, Value};
use crate::resources::ResourceLookup;
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// A loaded font as seen by the text operators.
pub trait FontFace: fmt::Debug {
    /// Two bytes per character code (CID-keyed fonts).
    fn is_multibyte(&self) -> bool;

    /// Advance of `code` in thousandths of text-space units.
    fn char_width(&self, code: u32) -> f64;

    /// Glyph index handed to the sink. Identity unless overridden.
    fn glyph_index(&self, code: u32) -> u32 {
        code
    }

    /// Split an encoded string into character codes.
    fn decode(&self, data: &[u8]) -> Vec<u32> {
        if self.is_multibyte() {
            data.chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b)))
                .collect()
        } else {
            data.iter().map(|&b| u32::from(b)).collect()
        }
    }
}

/// Turns font resources into [`FontFace`]s.
pub trait FontSource {
    fn load(&self, name: &str, font: &Dict, lookup: &dyn ResourceLookup) -> Option<Rc<dyn FontFace>>;
}

/// Metrics read straight from font dictionaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct DictFonts;

impl FontSource for DictFonts {
    fn load(&self, name: &str, font: &Dict, lookup: &dyn ResourceLookup) -> Option<Rc<dyn FontFace>> {
        if font.get_name("Subtype") == Some("Type0") {
            let descendant = font
                .get_resolved("DescendantFonts", lookup)?
                .as_array()
                .ok()?
                .first()?
                .resolve(lookup)?
                .as_dict()
                .ok()?;
            let face = CidFont::from_dict(descendant, lookup);
            tracing::trace!(name, widths = face.widths.len(), "loaded CID font");
            return Some(Rc::new(face));
        }
        Some(Rc::new(SimpleFont::from_dict(font, lookup)))
    }
}

/// Single-byte font with a `Widths` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFont {
    pub first_char: u32,
    pub widths: Vec<f64>,
    pub missing_width: f64,
}

impl SimpleFont {
    pub fn from_dict(font: &Dict, lookup: &dyn ResourceLookup) -> Self {
        let first_char = font
            .get_resolved("FirstChar", lookup)
            .and_then(|v| v.as_integer().ok())
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);
        let widths = font.get_number_array("Widths", lookup).unwrap_or_default();
        let missing_width = font
            .get_resolved("FontDescriptor", lookup)
            .and_then(|v| v.as_dict().ok())
            .and_then(|d| d.get_resolved("MissingWidth", lookup))
            .and_then(|v| v.as_number().ok())
            .unwrap_or(0.0);
        Self {
            first_char,
            widths,
            missing_width,
        }
    }
}

impl FontFace for SimpleFont {
    fn is_multibyte(&self) -> bool {
        false
    }

    fn char_width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width)
    }
}

/// Two-byte font described by a descendant CIDFont's `DW` and `W`.
#[derive(Debug, Clone, PartialEq)]
pub struct CidFont {
    pub default_width: f64,
    pub widths: FxHashMap<u32, f64>,
}

impl CidFont {
    pub fn from_dict(descendant: &Dict, lookup: &dyn ResourceLookup) -> Self {
        let default_width = descendant
            .get_resolved("DW", lookup)
            .and_then(|v| v.as_number().ok())
            .unwrap_or(1000.0);
        let mut widths = FxHashMap::default();
        if let Some(Ok(w)) = descendant.get_resolved("W", lookup).map(Value::as_array) {
            parse_cid_widths(w, lookup, &mut widths);
        }
        Self {
            default_width,
            widths,
        }
    }
}

impl FontFace for CidFont {
    fn is_multibyte(&self) -> bool {
        true
    }

    fn char_width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}

/// `W` holds runs of `c [w1 w2 ...]` and `c_first c_last w`.
fn parse_cid_widths(w: &[Value], lookup: &dyn ResourceLookup, out: &mut FxHashMap<u32, f64>) {
    let items: Vec<&Value> = w.iter().filter_map(|v| v.resolve(lookup)).collect();
    let cid = |v: &Value| v.as_integer().ok().and_then(|n| u32::try_from(n).ok());
    let mut i = 0;
    while i < items.len() {
        let Some(first) = cid(items[i]) else { break };
        match items.get(i + 1) {
            Some(Value::Array(run)) => {
                for (offset, width) in run.iter().enumerate() {
                    if let Some(Ok(width)) = width.resolve(lookup).map(Value::as_number) {
                        out.insert(first + offset as u32, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(Ok(width))) = (cid(*last), items.get(i + 2).map(|v| v.as_number()))
                else {
                    break;
                };
                for code in first..=last {
                    out.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }
}

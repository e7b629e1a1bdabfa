//! Drawing sink - the output side of the interpreter.
//!
//! The interpreter never rasterizes anything. Geometry, glyph placements,
//! images and shadings are handed to a [`DrawingSink`] together with the
//! graphics frame that was active, and the backend does the rest. Every
//! method has a no-op default so a sink only implements what it cares about.

use crate::interp::shading::Shading;
use crate::interp::state::{GraphicsFrame, LineStyle};
use crate::model::objects::{Dict, ObjNum};
use crate::utils::{Matrix, Rect};

/// Path segment in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

/// One glyph of a text-showing operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    /// Character code as read from the string
    pub code: u32,
    /// Glyph index from the font
    pub glyph: u32,
    /// Pen position in text space before the glyph is drawn
    pub x: f64,
    pub y: f64,
    /// Advance applied after the glyph, in text space
    pub advance: f64,
}

/// Glyphs placed by one `Tj`, `TJ`, `'` or `"`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub font_name: String,
    pub font_size: f64,
    /// Text matrix concatenated with the CTM at the start of the run
    pub transform: Matrix,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Tiling pattern about to be replayed into a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePattern {
    pub name: String,
    /// 1 = colored, 2 = uncolored
    pub paint_type: i64,
    pub bbox: Rect,
    pub x_step: f64,
    pub y_step: f64,
    pub matrix: Matrix,
}

/// Receiver of everything the interpreter draws.
pub trait DrawingSink {
    /// The current transformation matrix changed.
    fn set_ctm(&mut self, _ctm: Matrix) {}

    /// Graphics state pushed (`q`).
    fn save(&mut self) {}

    /// Graphics state popped (`Q`).
    fn restore(&mut self) {}

    /// A line parameter changed.
    fn update_line_style(&mut self, _style: &LineStyle) {}

    /// Paint the current path.
    fn paint_path(
        &mut self,
        _frame: &GraphicsFrame,
        _stroke: bool,
        _fill: bool,
        _evenodd: bool,
        _path: &[PathSegment],
    ) {
    }

    /// Intersect the clip with the current path.
    fn clip_path(&mut self, _frame: &GraphicsFrame, _evenodd: bool, _path: &[PathSegment]) {}

    fn draw_glyphs(&mut self, _frame: &GraphicsFrame, _run: &GlyphRun) {}

    /// Image XObject or inline image. `image` carries the undecoded payload.
    fn draw_image(&mut self, _name: &str, _image: &Dict, _frame: &GraphicsFrame) {}

    fn paint_shading(&mut self, _frame: &GraphicsFrame, _shading: &Shading) {}

    /// Begin a form XObject. `num` is its object number when it was reached
    /// through a reference.
    fn begin_form(&mut self, _name: &str, _num: Option<ObjNum>, _bbox: Option<Rect>, _matrix: Matrix) {}

    fn end_form(&mut self, _name: &str) {}

    /// Begin rendering one cell of a tiling pattern. Returning `false` skips
    /// the replay (the sink already has this tile).
    fn begin_tile(&mut self, _tile: &TilePattern) -> bool {
        true
    }

    fn end_tile(&mut self, _tile: &TilePattern) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DrawingSink for NullSink {}

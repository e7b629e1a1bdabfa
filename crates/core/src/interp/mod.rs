//! PDF content stream interpretation and drawing output.
//!
//! This module contains:
//! - `interpreter`: operand stack, dispatch and resource lookup
//! - `ops`: operator implementations by category
//! - `device`: the [`DrawingSink`] trait the interpreter draws into
//! - `state`: graphics and text state frames
//! - `font`: glyph widths for text placement
//! - `shading`: axial and radial shadings

pub mod device;
pub mod font;
pub mod interpreter;
mod ops;
pub mod shading;
pub mod state;

// Re-export main types for convenience
pub use device::{DrawingSink, GlyphRun, NullSink, PathSegment, PlacedGlyph, TilePattern};
pub use font::{CidFont, DictFonts, FontFace, FontSource, SimpleFont};
pub use interpreter::{ExecContext, InterpOptions, Interpreter};
pub use shading::{Shading, ShadingFunction, ShadingGeometry};
pub use state::{Color, GraphicsFrame, LineStyle, TextState};

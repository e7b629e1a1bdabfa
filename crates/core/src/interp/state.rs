//! Graphics and text state carried on the `q`/`Q` stack.

use crate::interp::font::FontFace;
use crate::utils::{MATRIX_IDENTITY, Matrix};
use std::rc::Rc;

/// Device color, kept as RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(g: f64) -> Self {
        Self::rgb(g, g, g)
    }

    /// Subtractive approximation: `r = (1 - c)(1 - k)` and so on.
    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }

    /// Color from 1, 3 or 4 device components.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [g] => Some(Self::gray(g)),
            [r, g, b] => Some(Self::rgb(r, g, b)),
            [c, m, y, k] => Some(Self::cmyk(c, m, y, k)),
            _ => None,
        }
    }
}

/// Line parameters set by `w`, `J`, `j`, `M`, `d`, `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub cap: i64,
    pub join: i64,
    pub miter_limit: f64,
    pub dash_array: Vec<f64>,
    pub dash_phase: f64,
    pub flatness: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: 0,
            join: 0,
            miter_limit: 10.0,
            dash_array: Vec::new(),
            dash_phase: 0.0,
            flatness: 1.0,
        }
    }
}

/// Text parameters and matrices.
#[derive(Debug, Clone)]
pub struct TextState {
    pub font: Option<Rc<dyn FontFace>>,
    pub font_name: String,
    pub font_size: f64,
    /// Character spacing (`Tc`)
    pub char_space: f64,
    /// Word spacing (`Tw`)
    pub word_space: f64,
    /// Horizontal scaling as a fraction (`Tz` / 100)
    pub scaling: f64,
    /// Stored negated, so `T*` translates by `(0, leading)`
    pub leading: f64,
    pub rise: f64,
    pub render_mode: i64,
    pub matrix: Matrix,
    pub line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_name: String::new(),
            font_size: 0.0,
            char_space: 0.0,
            word_space: 0.0,
            scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
            matrix: MATRIX_IDENTITY,
            line_matrix: MATRIX_IDENTITY,
        }
    }
}

impl TextState {
    /// Reset both matrices (`BT`).
    pub fn reset_matrices(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.line_matrix = MATRIX_IDENTITY;
    }
}

/// One entry of the graphics-state stack.
#[derive(Debug, Clone)]
pub struct GraphicsFrame {
    pub ctm: Matrix,
    pub fill: Color,
    pub stroke: Color,
    /// Name of the active fill pattern, if any
    pub fill_pattern: Option<String>,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub line: LineStyle,
    pub text: TextState,
}

impl GraphicsFrame {
    pub fn new(ctm: Matrix, opacity: f64) -> Self {
        Self {
            ctm,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            fill_pattern: None,
            fill_opacity: opacity,
            stroke_opacity: opacity,
            line: LineStyle::default(),
            text: TextState::default(),
        }
    }
}

impl Default for GraphicsFrame {
    fn default() -> Self {
        Self::new(MATRIX_IDENTITY, 1.0)
    }
}

//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', "
//!
//! Text object:
//! - BT/ET: Begin/end text object
//!
//! Text state:
//! - Tc, Tw: Character and word spacing
//! - Tz: Horizontal scaling
//! - TL: Leading
//! - Tf: Font and size
//! - Tr, Ts: Rendering mode and rise
//!
//! Text positioning:
//! - Td/TD: Move to next line (TD also sets leading)
//! - Tm: Set text matrix directly
//! - T*: Move to next line using current leading
//!
//! Text showing:
//! - Tj, TJ, ', ": Place glyphs and hand them to the sink as one run

use crate::interp::device::{DrawingSink, GlyphRun, PlacedGlyph};
use crate::interp::interpreter::{ExecContext, Interpreter};
use crate::model::objects::Value;
use crate::utils::{Matrix, mult_matrix, translate_matrix};
use std::rc::Rc;

#[allow(non_snake_case)]
impl<'a, S: DrawingSink> Interpreter<'a, S> {
    // ========================================================================
    // Text Object Operators
    // ========================================================================

    /// BT - Begin text object. Both text matrices start at identity.
    pub fn do_BT(&mut self, ctx: &mut ExecContext<'a>) {
        ctx.frame.text.reset_matrices();
    }

    /// ET - End text object.
    pub fn do_ET(&mut self, _ctx: &mut ExecContext<'a>) {}

    // ========================================================================
    // Text State Operators
    // ========================================================================

    /// Tc - Set character spacing.
    pub fn do_Tc(&mut self, ctx: &mut ExecContext<'a>, char_space: f64) {
        ctx.frame.text.char_space = char_space;
    }

    /// Tw - Set word spacing.
    pub fn do_Tw(&mut self, ctx: &mut ExecContext<'a>, word_space: f64) {
        ctx.frame.text.word_space = word_space;
    }

    /// Tz - Set horizontal scaling, given as a percentage.
    pub fn do_Tz(&mut self, ctx: &mut ExecContext<'a>, scaling: f64) {
        ctx.frame.text.scaling = scaling / 100.0;
    }

    /// TL - Set text leading. Stored negated.
    pub fn do_TL(&mut self, ctx: &mut ExecContext<'a>, leading: f64) {
        ctx.frame.text.leading = -leading;
    }

    /// Tf - Select font and size.
    ///
    /// The size is kept even when the font resource is missing; glyphs
    /// shown without a font are dropped.
    pub fn do_Tf(&mut self, ctx: &mut ExecContext<'a>, name: &str, size: f64) {
        ctx.frame.text.font_name = name.to_string();
        ctx.frame.text.font_size = size;
        ctx.frame.text.font = self.lookup_dict(ctx, "Font", name).and_then(|dict| {
            let key: *const _ = dict;
            if let Some(face) = self.font_cache.get(&key) {
                return Some(Rc::clone(face));
            }
            let face = self.fonts.load(name, dict, self.resources)?;
            self.font_cache.insert(key, Rc::clone(&face));
            Some(face)
        });
    }

    /// Tr - Set rendering mode.
    pub fn do_Tr(&mut self, ctx: &mut ExecContext<'a>, mode: i64) {
        ctx.frame.text.render_mode = mode;
    }

    /// Ts - Set rise.
    pub fn do_Ts(&mut self, ctx: &mut ExecContext<'a>, rise: f64) {
        ctx.frame.text.rise = rise;
    }

    // ========================================================================
    // Text Positioning Operators
    // ========================================================================

    /// Td - Move to the start of the next line, offset by (tx, ty).
    pub fn do_Td(&mut self, ctx: &mut ExecContext<'a>, tx: f64, ty: f64) {
        let text = &mut ctx.frame.text;
        text.line_matrix = translate_matrix(text.line_matrix, (tx, ty));
        text.matrix = text.line_matrix;
    }

    /// TD - Like Td, and sets the leading to -ty.
    pub fn do_TD(&mut self, ctx: &mut ExecContext<'a>, tx: f64, ty: f64) {
        ctx.frame.text.leading = ty;
        self.do_Td(ctx, tx, ty);
    }

    /// Tm - Set the text and line matrices.
    pub fn do_Tm(&mut self, ctx: &mut ExecContext<'a>, matrix: Matrix) {
        ctx.frame.text.matrix = matrix;
        ctx.frame.text.line_matrix = matrix;
    }

    /// T* - Move to the start of the next line.
    pub fn do_T_star(&mut self, ctx: &mut ExecContext<'a>) {
        let leading = ctx.frame.text.leading;
        self.do_Td(ctx, 0.0, leading);
    }

    // ========================================================================
    // Text Showing Operators
    // ========================================================================

    /// Tj - Show a string.
    pub fn do_Tj(&mut self, ctx: &mut ExecContext<'a>, seq: &[Value]) {
        self.show_text(ctx, seq);
    }

    /// TJ - Show strings with kerning numbers in between.
    pub fn do_TJ(&mut self, ctx: &mut ExecContext<'a>, seq: &[Value]) {
        self.show_text(ctx, seq);
    }

    /// ' - Next line, then show.
    pub fn do_quote(&mut self, ctx: &mut ExecContext<'a>, s: &Value) {
        self.do_T_star(ctx);
        self.show_text(ctx, std::slice::from_ref(s));
    }

    /// " - Set word and character spacing, next line, then show.
    pub fn do_doublequote(&mut self, ctx: &mut ExecContext<'a>, aw: f64, ac: f64, s: &Value) {
        self.do_Tw(ctx, aw);
        self.do_Tc(ctx, ac);
        self.do_quote(ctx, s);
    }

    /// Place every glyph of `seq` and advance the text matrix.
    ///
    /// Each character advances by `(w * size / 1000 + Tc) * Tz`, plus
    /// `Tw * Tz` for code 32. A number `n` in the sequence moves the pen by
    /// `-n * size / 1000 * Tz`.
    fn show_text(&mut self, ctx: &mut ExecContext<'a>, seq: &[Value]) {
        let text = &ctx.frame.text;
        let Some(font) = text.font.clone() else {
            tracing::debug!(font = text.font_name.as_str(), "text shown without a loaded font");
            return;
        };
        let size = text.font_size;
        let scaling = text.scaling;

        let mut x = 0.0;
        let mut glyphs = Vec::new();
        for item in seq {
            match item {
                Value::Number(n) => x -= 0.001 * size * n * scaling,
                Value::String(s) => {
                    for code in font.decode(&s.raw_bytes()) {
                        let width = font.char_width(code);
                        let mut advance = (0.001 * size * width + text.char_space) * scaling;
                        if code == 32 {
                            advance += text.word_space * scaling;
                        }
                        glyphs.push(PlacedGlyph {
                            code,
                            glyph: font.glyph_index(code),
                            x,
                            y: text.rise,
                            advance,
                        });
                        x += advance;
                    }
                }
                _ => {}
            }
        }

        if !glyphs.is_empty() {
            let run = GlyphRun {
                font_name: text.font_name.clone(),
                font_size: size,
                transform: mult_matrix(text.matrix, ctx.frame.ctm),
                glyphs,
            };
            self.sink.draw_glyphs(&ctx.frame, &run);
        }
        ctx.frame.text.matrix = translate_matrix(ctx.frame.text.matrix, (x, 0.0));
    }
}

//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, i, gs
//!
//! - q/Q: Push/pop the whole frame
//! - cm: Concatenate to the CTM
//! - w, J, j, M, d, i: Line style, forwarded to the sink
//! - gs: Opacity and line style from an ExtGState resource

use crate::interp::device::DrawingSink;
use crate::interp::interpreter::{ExecContext, Interpreter};
use crate::model::objects::Value;
use crate::utils::{Matrix, mult_matrix};

/// ExtGState keys accepted without effect.
const IGNORED_EXTGSTATE_KEYS: &[&str] = &[
    "Type", "RI", "OP", "op", "OPM", "SA", "BM", "SMask", "AIS", "TK", "SM", "Font", "BG",
    "BG2", "UCR", "UCR2", "TR", "TR2", "HT", "FL",
];

#[allow(non_snake_case)]
impl<'a, S: DrawingSink> Interpreter<'a, S> {
    /// Saves the current frame.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self, ctx: &mut ExecContext<'a>) {
        ctx.saved.push(ctx.frame.clone());
        self.sink.save();
    }

    /// Restores the last saved frame. Unbalanced `Q` is ignored.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self, ctx: &mut ExecContext<'a>) {
        if let Some(frame) = ctx.saved.pop() {
            ctx.frame = frame;
            self.sink.restore();
            self.sink.set_ctm(ctx.frame.ctm);
        }
    }

    /// PDF operator: `cm`
    pub fn do_cm(&mut self, ctx: &mut ExecContext<'a>, matrix: Matrix) {
        ctx.frame.ctm = mult_matrix(matrix, ctx.frame.ctm);
        self.sink.set_ctm(ctx.frame.ctm);
    }

    /// PDF operator: `w`
    pub fn do_w(&mut self, ctx: &mut ExecContext<'a>, width: f64) {
        ctx.frame.line.width = width;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// PDF operator: `J`
    pub fn do_J(&mut self, ctx: &mut ExecContext<'a>, cap: i64) {
        ctx.frame.line.cap = cap;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// PDF operator: `j`
    pub fn do_j(&mut self, ctx: &mut ExecContext<'a>, join: i64) {
        ctx.frame.line.join = join;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// PDF operator: `M`
    pub fn do_M(&mut self, ctx: &mut ExecContext<'a>, limit: f64) {
        ctx.frame.line.miter_limit = limit;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// PDF operator: `d`
    pub fn do_d(&mut self, ctx: &mut ExecContext<'a>, dashes: Vec<f64>, phase: f64) {
        ctx.frame.line.dash_array = dashes;
        ctx.frame.line.dash_phase = phase;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// PDF operator: `i`
    pub fn do_i(&mut self, ctx: &mut ExecContext<'a>, flatness: f64) {
        ctx.frame.line.flatness = flatness;
        self.sink.update_line_style(&ctx.frame.line);
    }

    /// Applies an ExtGState resource.
    ///
    /// `ca`/`CA` set fill/stroke opacity and the line keys update the line
    /// style. Other known keys are ignored; unknown keys are logged.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, ctx: &mut ExecContext<'a>, name: &str) {
        let Some(params) = self.lookup_dict(ctx, "ExtGState", name) else {
            return;
        };
        let res = self.resources;
        let mut line_changed = false;
        for (key, value) in params {
            let Some(value) = value.resolve(res) else {
                continue;
            };
            let number = value.as_number().ok();
            match (key.as_str(), number) {
                ("ca", Some(alpha)) => ctx.frame.fill_opacity = alpha,
                ("CA", Some(alpha)) => ctx.frame.stroke_opacity = alpha,
                ("LW", Some(width)) => {
                    ctx.frame.line.width = width;
                    line_changed = true;
                }
                ("LC", Some(cap)) => {
                    ctx.frame.line.cap = cap as i64;
                    line_changed = true;
                }
                ("LJ", Some(join)) => {
                    ctx.frame.line.join = join as i64;
                    line_changed = true;
                }
                ("ML", Some(limit)) => {
                    ctx.frame.line.miter_limit = limit;
                    line_changed = true;
                }
                ("D", _) => {
                    if let Ok([Value::Array(dashes), Value::Number(phase)]) = value.as_array() {
                        ctx.frame.line.dash_array =
                            dashes.iter().filter_map(|v| v.as_number().ok()).collect();
                        ctx.frame.line.dash_phase = *phase;
                        line_changed = true;
                    }
                }
                (key, _) if IGNORED_EXTGSTATE_KEYS.contains(&key) => {}
                (key, _) => tracing::debug!(name, key, "unhandled ExtGState key"),
            }
        }
        if line_changed {
            self.sink.update_line_style(&ctx.frame.line);
        }
    }
}

//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Path construction:
//! - m: Move to
//! - l: Line to
//! - c, v, y: Bezier curves (cubic variants)
//! - h: Close subpath
//! - re: Rectangle shorthand
//!
//! Path painting:
//! - S/s: Stroke (s closes first)
//! - f/F/f*: Fill (f* uses even-odd rule)
//! - B/B*/b/b*: Fill then stroke
//! - n: End path without painting
//!
//! Clipping:
//! - W/W*: Clip with the path when it is ended (non-zero/even-odd)

use crate::interp::device::{DrawingSink, PathSegment};
use crate::interp::interpreter::{ExecContext, Interpreter};

#[allow(non_snake_case)]
impl<'a, S: DrawingSink> Interpreter<'a, S> {
    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// PDF operator: `m`
    pub fn do_m(&mut self, ctx: &mut ExecContext<'a>, x: f64, y: f64) {
        ctx.path.push(PathSegment::MoveTo(x, y));
        ctx.current_point = Some((x, y));
    }

    /// PDF operator: `l`
    pub fn do_l(&mut self, ctx: &mut ExecContext<'a>, x: f64, y: f64) {
        ctx.path.push(PathSegment::LineTo(x, y));
        ctx.current_point = Some((x, y));
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// PDF operator: `c`
    #[allow(clippy::too_many_arguments)]
    pub fn do_c(
        &mut self,
        ctx: &mut ExecContext<'a>,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) {
        ctx.path.push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
        ctx.current_point = Some((x3, y3));
    }

    /// Curve whose first control point is the current point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, ctx: &mut ExecContext<'a>, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (x1, y1) = ctx.current_point.unwrap_or((x2, y2));
        ctx.path.push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
        ctx.current_point = Some((x3, y3));
    }

    /// Curve whose second control point is the end point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, ctx: &mut ExecContext<'a>, x1: f64, y1: f64, x3: f64, y3: f64) {
        ctx.path.push(PathSegment::CurveTo(x1, y1, x3, y3, x3, y3));
        ctx.current_point = Some((x3, y3));
    }

    /// PDF operator: `h`
    pub fn do_h(&mut self, ctx: &mut ExecContext<'a>) {
        ctx.path.push(PathSegment::ClosePath);
    }

    /// PDF operator: `re`
    pub fn do_re(&mut self, ctx: &mut ExecContext<'a>, x: f64, y: f64, w: f64, h: f64) {
        ctx.path.extend([
            PathSegment::MoveTo(x, y),
            PathSegment::LineTo(x + w, y),
            PathSegment::LineTo(x + w, y + h),
            PathSegment::LineTo(x, y + h),
            PathSegment::ClosePath,
        ]);
        ctx.current_point = Some((x, y));
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// PDF operator: `S`
    pub fn do_S(&mut self, ctx: &mut ExecContext<'a>) {
        self.paint(ctx, true, false, false);
    }

    /// PDF operator: `s`
    pub fn do_s(&mut self, ctx: &mut ExecContext<'a>) {
        self.do_h(ctx);
        self.paint(ctx, true, false, false);
    }

    /// PDF operator: `f` / `F`
    pub fn do_f(&mut self, ctx: &mut ExecContext<'a>) {
        self.paint(ctx, false, true, false);
    }

    /// PDF operator: `f*`
    pub fn do_f_star(&mut self, ctx: &mut ExecContext<'a>) {
        self.paint(ctx, false, true, true);
    }

    /// PDF operator: `B`
    pub fn do_B(&mut self, ctx: &mut ExecContext<'a>) {
        self.paint(ctx, true, true, false);
    }

    /// PDF operator: `B*`
    pub fn do_B_star(&mut self, ctx: &mut ExecContext<'a>) {
        self.paint(ctx, true, true, true);
    }

    /// PDF operator: `b`
    pub fn do_b(&mut self, ctx: &mut ExecContext<'a>) {
        self.do_h(ctx);
        self.paint(ctx, true, true, false);
    }

    /// PDF operator: `b*`
    pub fn do_b_star(&mut self, ctx: &mut ExecContext<'a>) {
        self.do_h(ctx);
        self.paint(ctx, true, true, true);
    }

    /// PDF operator: `n`
    pub fn do_n(&mut self, ctx: &mut ExecContext<'a>) {
        self.end_path(ctx);
    }

    // ========================================================================
    // Clipping Path Operators
    // ========================================================================

    /// PDF operator: `W`
    pub fn do_W(&mut self, ctx: &mut ExecContext<'a>) {
        ctx.pending_clip = Some(false);
    }

    /// PDF operator: `W*`
    pub fn do_W_star(&mut self, ctx: &mut ExecContext<'a>) {
        ctx.pending_clip = Some(true);
    }

    /// Hand the path to the sink, replaying a tiling fill pattern first.
    fn paint(&mut self, ctx: &mut ExecContext<'a>, stroke: bool, fill: bool, evenodd: bool) {
        if fill && let Some(pattern) = ctx.frame.fill_pattern.clone() {
            self.render_tile(ctx, &pattern);
        }
        self.sink.paint_path(&ctx.frame, stroke, fill, evenodd, &ctx.path);
        self.end_path(ctx);
    }

    /// Apply a pending clip and start a new path.
    fn end_path(&mut self, ctx: &mut ExecContext<'a>) {
        if let Some(evenodd) = ctx.pending_clip.take() {
            self.sink.clip_path(&ctx.frame, evenodd, &ctx.path);
        }
        ctx.path.clear();
        ctx.current_point = None;
    }
}

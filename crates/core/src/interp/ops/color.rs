//! Color operators.
//!
//! Handles: g, G, rg, RG, k, K, sc, scn, SC, SCN, sh
//!
//! Colors are kept as RGB. Setting a device fill color drops any active
//! fill pattern.

use crate::interp::device::DrawingSink;
use crate::interp::interpreter::{ExecContext, Interpreter};
use crate::interp::shading::Shading;
use crate::interp::state::Color;
use crate::model::objects::Value;

#[allow(non_snake_case)]
impl<'a, S: DrawingSink> Interpreter<'a, S> {
    fn set_fill(ctx: &mut ExecContext<'a>, color: Color) {
        ctx.frame.fill = color;
        ctx.frame.fill_pattern = None;
    }

    /// PDF operator: `g`
    pub fn do_g(&mut self, ctx: &mut ExecContext<'a>, gray: f64) {
        Self::set_fill(ctx, Color::gray(gray));
    }

    /// PDF operator: `G`
    pub fn do_G(&mut self, ctx: &mut ExecContext<'a>, gray: f64) {
        ctx.frame.stroke = Color::gray(gray);
    }

    /// PDF operator: `rg`
    pub fn do_rg(&mut self, ctx: &mut ExecContext<'a>, r: f64, g: f64, b: f64) {
        Self::set_fill(ctx, Color::rgb(r, g, b));
    }

    /// PDF operator: `RG`
    pub fn do_RG(&mut self, ctx: &mut ExecContext<'a>, r: f64, g: f64, b: f64) {
        ctx.frame.stroke = Color::rgb(r, g, b);
    }

    /// PDF operator: `k`
    pub fn do_k(&mut self, ctx: &mut ExecContext<'a>, c: f64, m: f64, y: f64, k: f64) {
        Self::set_fill(ctx, Color::cmyk(c, m, y, k));
    }

    /// PDF operator: `K`
    pub fn do_K(&mut self, ctx: &mut ExecContext<'a>, c: f64, m: f64, y: f64, k: f64) {
        ctx.frame.stroke = Color::cmyk(c, m, y, k);
    }

    /// Sets the fill color or selects a fill pattern.
    ///
    /// A trailing name selects the pattern of that name. Numbers before it
    /// become the fill color an uncolored pattern paints with. With only
    /// numbers the component count picks gray, RGB or CMYK.
    ///
    /// PDF operator: `sc` / `scn`
    pub fn do_scn(&mut self, ctx: &mut ExecContext<'a>, args: &[Value]) {
        if let [tint @ .., Value::Name(pattern)] = args {
            if !tint.is_empty() {
                let Some(color) = components(tint).as_deref().and_then(Color::from_components)
                else {
                    tracing::debug!(operands = args.len(), "unsupported pattern color operands");
                    return;
                };
                ctx.frame.fill = color;
            }
            ctx.frame.fill_pattern = Some(pattern.clone());
            return;
        }
        match components(args).as_deref().and_then(Color::from_components) {
            Some(color) => Self::set_fill(ctx, color),
            None => tracing::debug!(operands = args.len(), "unsupported fill color operands"),
        }
    }

    /// PDF operator: `SC` / `SCN`
    pub fn do_SCN(&mut self, ctx: &mut ExecContext<'a>, args: &[Value]) {
        if let Some(Value::Name(pattern)) = args.last() {
            tracing::debug!(pattern = pattern.as_str(), "stroke patterns not implemented");
            return;
        }
        match components(args).as_deref().and_then(Color::from_components) {
            Some(color) => ctx.frame.stroke = color,
            None => tracing::debug!(operands = args.len(), "unsupported stroke color operands"),
        }
    }

    /// Paints a Shading resource over the current clip.
    ///
    /// PDF operator: `sh`
    pub fn do_sh(&mut self, ctx: &mut ExecContext<'a>, name: &str) {
        let Some(dict) = self.lookup_dict(ctx, "Shading", name) else {
            return;
        };
        let Some(shading) = Shading::from_dict(dict, self.resources) else {
            tracing::debug!(name, "shading skipped");
            return;
        };
        self.sink.paint_shading(&ctx.frame, &shading);
    }
}

/// All operands as numbers.
fn components(args: &[Value]) -> Option<Vec<f64>> {
    args.iter().map(|v| v.as_number().ok()).collect()
}

//! XObject operator and nested content.
//!
//! Handles: Do
//!
//! Form XObjects run in the caller's context with a frame pushed and their
//! own resources shadowing the outer ones. Image XObjects go straight to the
//! sink. Tiling patterns are replayed here too, in a fresh context, when a
//! path is filled with one.

use crate::interp::device::{DrawingSink, TilePattern};
use crate::interp::interpreter::{ExecContext, Interpreter};
use crate::interp::state::GraphicsFrame;
use crate::model::objects::{Dict, ObjNum, Value};
use crate::resources::ResourceLookup;
use crate::utils::{MATRIX_IDENTITY, Rect, matrix_from_slice};

#[allow(non_snake_case)]
impl<'a, S: DrawingSink> Interpreter<'a, S> {
    /// Paints an XObject.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, ctx: &mut ExecContext<'a>, name: &str) {
        let Some(raw) = self.lookup_raw(ctx, "XObject", name) else {
            tracing::debug!(name, "XObject not found");
            return;
        };
        let num = raw.as_ref().ok();
        let Some(Value::Dict(xobj)) = raw.resolve(self.resources) else {
            tracing::debug!(name, "XObject is not a stream");
            return;
        };
        match xobj.get_name("Subtype") {
            Some("Form") => self.execute_form(ctx, name, num, xobj),
            Some("Image") => self.sink.draw_image(name, xobj, &ctx.frame),
            other => tracing::debug!(name, subtype = ?other, "unsupported XObject"),
        }
    }

    /// Run a form XObject inside `ctx`.
    ///
    /// Frames the form leaves on the stack are popped so the caller's state
    /// comes back intact.
    fn execute_form(&mut self, ctx: &mut ExecContext<'a>, name: &str, num: Option<ObjNum>, xobj: &'a Dict) {
        if ctx.depth >= self.options.max_form_depth {
            tracing::warn!(name, depth = ctx.depth, "form XObject nesting too deep, skipping");
            return;
        }
        let data = match xobj.decoded_stream() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(name, error = %e, "form XObject not decoded, treated as empty");
                return;
            }
        };
        let res = self.resources;
        let matrix = xobj
            .get_number_array("Matrix", res)
            .and_then(|m| matrix_from_slice(&m))
            .unwrap_or(MATRIX_IDENTITY);
        let bbox = rect_entry(xobj, "BBox", res);
        let form_resources = xobj.get_resolved("Resources", res).and_then(|v| v.as_dict().ok());

        let saved_depth = ctx.saved.len();
        self.do_q(ctx);
        self.do_cm(ctx, matrix);
        self.sink.begin_form(name, num, bbox, matrix);
        let outer_path = std::mem::take(&mut ctx.path);
        let outer_point = ctx.current_point.take();
        if let Some(resources) = form_resources {
            ctx.resource_stack.push(resources);
        }
        ctx.depth += 1;

        self.run(ctx, &data);

        ctx.depth -= 1;
        if form_resources.is_some() {
            ctx.resource_stack.pop();
        }
        ctx.path = outer_path;
        ctx.current_point = outer_point;
        ctx.pending_clip = None;
        self.sink.end_form(name);
        while ctx.saved.len() > saved_depth {
            self.do_Q(ctx);
        }
    }

    /// Replay tiling pattern `name` into a tile before a fill uses it.
    ///
    /// The pattern content runs in a new context whose CTM is the pattern
    /// matrix. Shading patterns are not replayed.
    pub(crate) fn render_tile(&mut self, ctx: &ExecContext<'a>, name: &str) {
        let Some(pattern) = self.lookup_dict(ctx, "Pattern", name) else {
            return;
        };
        let res = self.resources;
        match pattern.get_resolved("PatternType", res).and_then(|v| v.as_integer().ok()) {
            Some(1) => {}
            Some(2) => {
                tracing::debug!(name, "shading pattern fill painted with the fill color");
                return;
            }
            other => {
                tracing::debug!(name, pattern_type = ?other, "unknown pattern type");
                return;
            }
        }
        if ctx.depth >= self.options.max_form_depth {
            tracing::warn!(name, depth = ctx.depth, "pattern nesting too deep, skipping");
            return;
        }
        let number = |key: &str| {
            pattern
                .get_resolved(key, res)
                .and_then(|v| v.as_number().ok())
                .unwrap_or(0.0)
        };
        let tile = TilePattern {
            name: name.to_string(),
            paint_type: number("PaintType") as i64,
            bbox: rect_entry(pattern, "BBox", res).unwrap_or_default(),
            x_step: number("XStep"),
            y_step: number("YStep"),
            matrix: pattern
                .get_number_array("Matrix", res)
                .and_then(|m| matrix_from_slice(&m))
                .unwrap_or(MATRIX_IDENTITY),
        };
        let data = match pattern.decoded_stream() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(name, error = %e, "pattern content not decoded");
                return;
            }
        };
        if !self.sink.begin_tile(&tile) {
            return;
        }

        let mut frame = GraphicsFrame::new(tile.matrix, self.options.base_opacity);
        if tile.paint_type == 2 {
            // Uncolored patterns paint with the color current at fill time
            frame.fill = ctx.frame.fill;
            frame.stroke = ctx.frame.fill;
        }
        let mut nested = ExecContext::new(frame);
        nested.depth = ctx.depth + 1;
        if let Some(resources) = pattern.get_resolved("Resources", res).and_then(|v| v.as_dict().ok()) {
            nested.resource_stack.push(resources);
        }
        self.sink.set_ctm(tile.matrix);
        self.run(&mut nested, &data);
        self.sink.end_tile(&tile);
        self.sink.set_ctm(ctx.frame.ctm);
    }
}

fn rect_entry(dict: &Dict, key: &str, res: &dyn ResourceLookup) -> Option<Rect> {
    match dict.get_number_array(key, res)?[..] {
        [x0, y0, x1, y1] => Some((x0, y0, x1, y1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceStore;

    #[test]
    fn rect_entry_needs_four_numbers() {
        let store = ResourceStore::new();
        let mut d = Dict::new();
        d.insert(
            "BBox",
            Value::Array(vec![0i64.into(), 0i64.into(), 10i64.into(), 20i64.into()]),
        );
        d.insert("Short", Value::Array(vec![0i64.into()]));
        assert_eq!(rect_entry(&d, "BBox", &store), Some((0.0, 0.0, 10.0, 20.0)));
        assert_eq!(rect_entry(&d, "Short", &store), None);
        assert_eq!(rect_entry(&d, "Missing", &store), None);
    }
}

//! Content-stream interpreter.
//!
//! Operands are parsed with the object parser and pushed until an operator
//! arrives; the operator is dispatched by name and the operand stack is
//! cleared whatever happened. A handler that gets the wrong operands does
//! nothing. Malformed content never turns into an error for the caller.
//!
//! All per-run mutable state lives in an [`ExecContext`]. Form XObjects run
//! in the caller's context with a frame pushed; tiling patterns get a fresh
//! context of their own.

use super::device::{DrawingSink, PathSegment};
use super::font::{DictFonts, FontFace, FontSource};
use super::state::GraphicsFrame;
use crate::error::Result;
use crate::model::objects::{Dict, ObjectTable, StreamState, Value};
use crate::parser::{ObjectParser, StreamMode, TokenKind};
use crate::resources::ResourceLookup;
use crate::source::BufferSource;
use crate::utils::{MATRIX_IDENTITY, Point};
use bytes::Bytes;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// Interpreter limits and defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpOptions {
    /// Nesting bound for form XObjects and tiling patterns
    pub max_form_depth: usize,
    /// Fill and stroke opacity of the first frame
    pub base_opacity: f64,
}

impl Default for InterpOptions {
    fn default() -> Self {
        Self {
            max_form_depth: 16,
            base_opacity: 1.0,
        }
    }
}

/// Mutable state of one execution.
#[derive(Debug)]
pub struct ExecContext<'a> {
    /// Operands waiting for their operator
    pub(crate) operands: SmallVec<[Value; 8]>,
    /// Active graphics state
    pub(crate) frame: GraphicsFrame,
    /// Frames saved by `q`
    pub(crate) saved: Vec<GraphicsFrame>,
    /// Resource dictionaries of enclosing forms, innermost last
    pub(crate) resource_stack: Vec<&'a Dict>,
    pub(crate) path: Vec<PathSegment>,
    pub(crate) current_point: Option<Point>,
    /// Set by `W`/`W*`, applied when the path is ended
    pub(crate) pending_clip: Option<bool>,
    pub(crate) depth: usize,
}

impl<'a> ExecContext<'a> {
    pub fn new(frame: GraphicsFrame) -> Self {
        Self {
            operands: SmallVec::new(),
            frame,
            saved: Vec::new(),
            resource_stack: Vec::new(),
            path: Vec::new(),
            current_point: None,
            pending_clip: None,
            depth: 0,
        }
    }

    pub fn frame(&self) -> &GraphicsFrame {
        &self.frame
    }

    /// Number of frames saved by `q`.
    pub fn saved_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push_resources(&mut self, resources: &'a Dict) {
        self.resource_stack.push(resources);
    }
}

/// Executes content streams against a resource lookup and a drawing sink.
///
/// Note: operator methods like `do_Q`, `do_S`, `do_BT` keep the case of the
/// operator they implement.
pub struct Interpreter<'a, S: DrawingSink> {
    pub(crate) sink: &'a mut S,
    pub(crate) resources: &'a dyn ResourceLookup,
    pub(crate) fonts: &'a dyn FontSource,
    pub(crate) options: InterpOptions,
    /// Loaded fonts keyed by the address of their resource dictionary
    pub(crate) font_cache: FxHashMap<*const Dict, Rc<dyn FontFace>>,
}

impl<'a, S: DrawingSink> Interpreter<'a, S> {
    pub fn new(sink: &'a mut S, resources: &'a dyn ResourceLookup) -> Self {
        Self {
            sink,
            resources,
            fonts: &DictFonts,
            options: InterpOptions::default(),
            font_cache: FxHashMap::default(),
        }
    }

    pub fn with_fonts(mut self, fonts: &'a dyn FontSource) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_options(mut self, options: InterpOptions) -> Self {
        self.options = options;
        self
    }

    /// Fresh context with the identity CTM.
    pub fn new_context(&self) -> ExecContext<'a> {
        ExecContext::new(GraphicsFrame::new(MATRIX_IDENTITY, self.options.base_opacity))
    }

    // ========================================================================
    // Entry Points
    // ========================================================================

    /// Execute one content stream in a fresh context.
    pub fn execute(&mut self, stream: &Dict) {
        let mut ctx = self.new_context();
        self.execute_in(&mut ctx, stream);
    }

    /// Execute one content stream in an existing context.
    ///
    /// A payload that fails to decode is treated as empty.
    pub fn execute_in(&mut self, ctx: &mut ExecContext<'a>, stream: &Dict) {
        match stream.decoded_stream() {
            Ok(data) => self.run(ctx, &data),
            Err(e) => tracing::warn!(error = %e, "content stream not decoded, skipping"),
        }
    }

    /// Execute a page's `Contents`, one stream or an array of them, as a
    /// single concatenated stream.
    pub fn execute_page<T: ObjectTable + ?Sized>(&mut self, table: &T, page: &Dict) {
        let streams: Vec<&Value> = match page.get_resolved("Contents", table) {
            Some(Value::Array(items)) => items.iter().filter_map(|v| v.resolve(table)).collect(),
            Some(value) => vec![value],
            None => Vec::new(),
        };
        let mut data = Vec::new();
        for stream in streams {
            let Ok(dict) = stream.as_dict() else {
                tracing::debug!(kind = stream.type_name(), "page content is not a stream");
                continue;
            };
            match dict.decoded_stream() {
                Ok(decoded) => {
                    data.extend_from_slice(&decoded);
                    data.push(b'\n');
                }
                Err(e) => tracing::warn!(error = %e, "page content stream not decoded"),
            }
        }
        let mut ctx = self.new_context();
        self.run(&mut ctx, &data);
    }

    /// Run decoded content in `ctx`.
    pub fn run(&mut self, ctx: &mut ExecContext<'a>, data: &[u8]) {
        let mut parser = ObjectParser::new(BufferSource::from_slice(data));
        loop {
            let tok = parser.token();
            match tok.kind {
                TokenKind::Op if tok.is_op("BI") => {
                    ctx.operands.clear();
                    if let Err(e) = self.inline_image(ctx, &mut parser) {
                        tracing::warn!(error = %e, "malformed inline image, stopping");
                        break;
                    }
                }
                TokenKind::Op => {
                    let op = tok.text_str().into_owned();
                    parser.advance();
                    let operands = std::mem::take(&mut ctx.operands);
                    self.dispatch_operator(ctx, &op, &operands);
                }
                TokenKind::Err if parser.eos() => break,
                _ => match parser.parse_value_with(StreamMode::Ignore) {
                    Ok(value) => ctx.operands.push(value),
                    Err(e) => {
                        tracing::warn!(error = %e, "content stream parse error, stopping");
                        break;
                    }
                },
            }
        }
        ctx.operands.clear();
    }

    /// `BI <key value>* ID <data> EI`
    fn inline_image(
        &mut self,
        ctx: &mut ExecContext<'a>,
        parser: &mut ObjectParser<BufferSource>,
    ) -> Result<()> {
        parser.advance();
        let mut dict = Dict::new();
        while !parser.token().is_op("ID") {
            let key = parser.parse_value_with(StreamMode::Ignore)?;
            let key = key.as_name()?.to_string();
            let value = parser.parse_value_with(StreamMode::Ignore)?;
            dict.insert(key, value);
        }
        let data = parser.take_inline_data();
        dict.set_stream(StreamState::Inline(Bytes::from(data)));
        self.sink.draw_image("inline", &dict, &ctx.frame);
        Ok(())
    }

    // ========================================================================
    // Resource Lookup
    // ========================================================================

    /// Resource entry as written, searching enclosing forms innermost first
    /// and the page resources last.
    pub(crate) fn lookup_raw(&self, ctx: &ExecContext<'a>, kind: &str, name: &str) -> Option<&'a Value> {
        let res = self.resources;
        ctx.resource_stack
            .iter()
            .rev()
            .copied()
            .chain(res.base_resources())
            .find_map(|dict| res.dict_entry(dict, kind)?.as_dict().ok()?.get(name))
    }

    /// Resource entry with references followed.
    pub(crate) fn lookup(&self, ctx: &ExecContext<'a>, kind: &str, name: &str) -> Option<&'a Value> {
        let res = self.resources;
        self.lookup_raw(ctx, kind, name)?.resolve(res)
    }

    /// Resource dictionary (or stream) `name` of `kind`.
    pub(crate) fn lookup_dict(&self, ctx: &ExecContext<'a>, kind: &str, name: &str) -> Option<&'a Dict> {
        let found = self.lookup(ctx, kind, name).and_then(|v| v.as_dict().ok());
        if found.is_none() {
            tracing::debug!(kind, name, "resource not found");
        }
        found
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn dispatch_operator(&mut self, ctx: &mut ExecContext<'a>, op: &str, args: &[Value]) {
        if !args.is_empty() && NO_OPERANDS.contains(&op) {
            tracing::debug!(op, operands = args.len(), "operator takes no operands, skipped");
            return;
        }
        match op {
            // Graphics state
            "q" => self.do_q(ctx),
            "Q" => self.do_Q(ctx),
            "cm" => {
                if let Some([a, b, c, d, e, f]) = numbers(args) {
                    self.do_cm(ctx, (a, b, c, d, e, f));
                }
            }
            "w" => {
                if let Some([w]) = numbers(args) {
                    self.do_w(ctx, w);
                }
            }
            "J" => {
                if let Some([n]) = numbers(args) {
                    self.do_J(ctx, n as i64);
                }
            }
            "j" => {
                if let Some([n]) = numbers(args) {
                    self.do_j(ctx, n as i64);
                }
            }
            "M" => {
                if let Some([m]) = numbers(args) {
                    self.do_M(ctx, m);
                }
            }
            "d" => {
                if let [Value::Array(arr), Value::Number(phase)] = args {
                    let dashes = arr.iter().filter_map(|v| v.as_number().ok()).collect();
                    self.do_d(ctx, dashes, *phase);
                }
            }
            "i" => {
                if let Some([f]) = numbers(args) {
                    self.do_i(ctx, f);
                }
            }
            "gs" => {
                if let Some(name) = name_arg(args) {
                    self.do_gs(ctx, name);
                }
            }

            // Color
            "g" => {
                if let Some([g]) = numbers(args) {
                    self.do_g(ctx, g);
                }
            }
            "G" => {
                if let Some([g]) = numbers(args) {
                    self.do_G(ctx, g);
                }
            }
            "rg" => {
                if let Some([r, g, b]) = numbers(args) {
                    self.do_rg(ctx, r, g, b);
                }
            }
            "RG" => {
                if let Some([r, g, b]) = numbers(args) {
                    self.do_RG(ctx, r, g, b);
                }
            }
            "k" => {
                if let Some([c, m, y, k]) = numbers(args) {
                    self.do_k(ctx, c, m, y, k);
                }
            }
            "K" => {
                if let Some([c, m, y, k]) = numbers(args) {
                    self.do_K(ctx, c, m, y, k);
                }
            }
            "sc" | "scn" => self.do_scn(ctx, args),
            "SC" | "SCN" => self.do_SCN(ctx, args),
            "sh" => {
                if let Some(name) = name_arg(args) {
                    self.do_sh(ctx, name);
                }
            }

            // Path construction
            "m" => {
                if let Some([x, y]) = numbers(args) {
                    self.do_m(ctx, x, y);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers(args) {
                    self.do_l(ctx, x, y);
                }
            }
            "c" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = numbers(args) {
                    self.do_c(ctx, x1, y1, x2, y2, x3, y3);
                }
            }
            "v" => {
                if let Some([x2, y2, x3, y3]) = numbers(args) {
                    self.do_v(ctx, x2, y2, x3, y3);
                }
            }
            "y" => {
                if let Some([x1, y1, x3, y3]) = numbers(args) {
                    self.do_y(ctx, x1, y1, x3, y3);
                }
            }
            "h" => self.do_h(ctx),
            "re" => {
                if let Some([x, y, w, h]) = numbers(args) {
                    self.do_re(ctx, x, y, w, h);
                }
            }

            // Path painting
            "S" => self.do_S(ctx),
            "s" => self.do_s(ctx),
            "f" | "F" => self.do_f(ctx),
            "f*" => self.do_f_star(ctx),
            "B" => self.do_B(ctx),
            "B*" => self.do_B_star(ctx),
            "b" => self.do_b(ctx),
            "b*" => self.do_b_star(ctx),
            "n" => self.do_n(ctx),
            "W" => self.do_W(ctx),
            "W*" => self.do_W_star(ctx),

            // Text
            "BT" => self.do_BT(ctx),
            "ET" => self.do_ET(ctx),
            "Tc" => {
                if let Some([tc]) = numbers(args) {
                    self.do_Tc(ctx, tc);
                }
            }
            "Tw" => {
                if let Some([tw]) = numbers(args) {
                    self.do_Tw(ctx, tw);
                }
            }
            "Tz" => {
                if let Some([tz]) = numbers(args) {
                    self.do_Tz(ctx, tz);
                }
            }
            "TL" => {
                if let Some([tl]) = numbers(args) {
                    self.do_TL(ctx, tl);
                }
            }
            "Ts" => {
                if let Some([ts]) = numbers(args) {
                    self.do_Ts(ctx, ts);
                }
            }
            "Tr" => {
                if let Some([tr]) = numbers(args) {
                    self.do_Tr(ctx, tr as i64);
                }
            }
            "Tf" => {
                if let [Value::Name(name), Value::Number(size)] = args {
                    self.do_Tf(ctx, name, *size);
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers(args) {
                    self.do_Td(ctx, tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers(args) {
                    self.do_TD(ctx, tx, ty);
                }
            }
            "Tm" => {
                if let Some([a, b, c, d, e, f]) = numbers(args) {
                    self.do_Tm(ctx, (a, b, c, d, e, f));
                }
            }
            "T*" => self.do_T_star(ctx),
            "Tj" => {
                if let [s @ Value::String(_)] = args {
                    self.do_Tj(ctx, std::slice::from_ref(s));
                }
            }
            "TJ" => {
                if let [Value::Array(seq)] = args {
                    self.do_TJ(ctx, seq);
                }
            }
            "'" => {
                if let [s @ Value::String(_)] = args {
                    self.do_quote(ctx, s);
                }
            }
            "\"" => {
                if let [Value::Number(aw), Value::Number(ac), s @ Value::String(_)] = args {
                    self.do_doublequote(ctx, *aw, *ac, s);
                }
            }

            // XObjects
            "Do" => {
                if let Some(name) = name_arg(args) {
                    self.do_Do(ctx, name);
                }
            }

            // Marked content, rendering intent, color space selection
            "MP" | "DP" | "BMC" | "BDC" | "EMC" | "ri" | "cs" => {}
            _ => tracing::trace!(op, "unhandled operator"),
        }
    }
}

/// Path, text and state operators that take no operands.
const NO_OPERANDS: &[&str] = &[
    "q", "Q", "h", "S", "s", "f", "F", "f*", "B", "B*", "b", "b*", "n", "W", "W*", "BT", "ET", "T*",
];

/// Exactly `N` operands, all numbers.
pub(crate) fn numbers<const N: usize>(args: &[Value]) -> Option<[f64; N]> {
    if args.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(args) {
        *slot = value.as_number().ok()?;
    }
    Some(out)
}

/// A single name operand.
pub(crate) fn name_arg(args: &[Value]) -> Option<&str> {
    match args {
        [Value::Name(name)] => Some(name),
        _ => None,
    }
}

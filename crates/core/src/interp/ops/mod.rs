//! Content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack, transforms and line style (q, Q, cm, w, J, j, M, d, i, gs)
//! - `color` - Device colors, patterns and shadings (g, G, rg, RG, k, K, sc, scn, SC, SCN, sh)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n, W, W\*)
//! - `text` - Text state and showing (BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T\*, Tj, TJ, ', ")
//! - `xobject` - Form and image XObjects, tiling pattern replay (Do)

mod color;
mod graphics_state;
mod path;
mod text;
mod xobject;

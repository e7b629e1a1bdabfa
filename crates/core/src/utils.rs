//! Geometry helpers shared by the loader and the interpreter.
//!
//! Matrices are the six-number affine form used in content streams:
//! `(a, b, c, d, e, f)` maps `(x, y)` to `(ax + cy + e, bx + dy + f)`.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1).
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: result = m1 * m0.
/// This applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Translates a matrix by (x, y) inside its own coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a vector (ignoring translation).
pub fn apply_matrix_norm(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, _e, _f) = m;
    let (p, q) = v;
    (a * p + c * q, b * p + d * q)
}

/// Inverse of an affine matrix, or `None` when it is singular.
pub fn invert_matrix(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det.abs() < f64::EPSILON {
        return None;
    }
    let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);
    Some((ia, ib, ic, id, -(e * ia + f * ic), -(e * ib + f * id)))
}

/// Builds a matrix from a six-number slice.
pub fn matrix_from_slice(v: &[f64]) -> Option<Matrix> {
    match *v {
        [a, b, c, d, e, f] => Some((a, b, c, d, e, f)),
        _ => None,
    }
}

/// Normalizes a rectangle so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(r: Rect) -> Rect {
    let (x0, y0, x1, y1) = r;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mult_applies_left_first() {
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = (1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        // scale then shift
        let m = mult_matrix(scale, shift);
        assert_eq!(apply_matrix_pt(m, (1.0, 1.0)), (12.0, 2.0));
    }

    #[test]
    fn translate_in_own_space() {
        let m = translate_matrix((2.0, 0.0, 0.0, 2.0, 5.0, 5.0), (1.0, 1.0));
        assert_eq!(m, (2.0, 0.0, 0.0, 2.0, 7.0, 7.0));
    }

    #[test]
    fn invert_roundtrip() {
        let m = (2.0, 0.0, 0.0, 4.0, 3.0, -1.0);
        let inv = invert_matrix(m).unwrap();
        let p = apply_matrix_pt(inv, apply_matrix_pt(m, (5.0, 7.0)));
        assert!((p.0 - 5.0).abs() < 1e-9 && (p.1 - 7.0).abs() < 1e-9);
        assert!(invert_matrix((0.0, 0.0, 0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn normalize_swaps_corners() {
        assert_eq!(normalize_rect((10.0, 20.0, 0.0, 5.0)), (0.0, 5.0, 10.0, 20.0));
    }
}

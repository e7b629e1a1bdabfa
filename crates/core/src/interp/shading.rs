//! Axial and radial shadings for the `sh` operator.
//!
//! Only the smooth shadings (types 2 and 3) are supported, driven by
//! exponential (type 2) functions or stitching (type 3) functions built from
//! them. Sampled and PostScript functions are rejected.

use crate::interp::state::Color;
use crate::model::objects::{Dict, Value};
use crate::resources::ResourceLookup;
use crate::utils::Rect;

/// Upper bound on stitching-function nesting.
const MAX_FUNCTION_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum ShadingGeometry {
    /// `[x0 y0 x1 y1]`
    Axial { coords: [f64; 4] },
    /// `[x0 y0 r0 x1 y1 r1]`
    Radial { coords: [f64; 6] },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShadingFunction {
    /// `C0 + t^N * (C1 - C0)`
    Exponential {
        domain: (f64, f64),
        c0: Vec<f64>,
        c1: Vec<f64>,
        exponent: f64,
    },
    /// Sub-functions over the intervals split by `bounds`
    Stitching {
        domain: (f64, f64),
        functions: Vec<ShadingFunction>,
        bounds: Vec<f64>,
        encode: Vec<f64>,
    },
    /// One single-output function per color component
    Parallel(Vec<ShadingFunction>),
}

impl ShadingFunction {
    /// Build from a function dictionary or an array of them.
    pub fn from_value(value: &Value, lookup: &dyn ResourceLookup) -> Option<Self> {
        Self::parse(value, lookup, 0)
    }

    fn parse(value: &Value, lookup: &dyn ResourceLookup, depth: usize) -> Option<Self> {
        if depth > MAX_FUNCTION_DEPTH {
            return None;
        }
        let dict = match value.resolve(lookup)? {
            Value::Array(items) => {
                let parts: Option<Vec<_>> = items.iter().map(|v| Self::parse(v, lookup, depth + 1)).collect();
                return Some(Self::Parallel(parts?));
            }
            other => other.as_dict().ok()?,
        };
        let domain = pair(dict, "Domain", lookup).unwrap_or((0.0, 1.0));
        match dict.get_resolved("FunctionType", lookup)?.as_integer().ok()? {
            2 => Some(Self::Exponential {
                domain,
                c0: dict.get_number_array("C0", lookup).unwrap_or_else(|| vec![0.0]),
                c1: dict.get_number_array("C1", lookup).unwrap_or_else(|| vec![1.0]),
                exponent: dict
                    .get_resolved("N", lookup)
                    .and_then(|v| v.as_number().ok())
                    .unwrap_or(1.0),
            }),
            3 => {
                let functions: Option<Vec<_>> = dict
                    .get_resolved("Functions", lookup)?
                    .as_array()
                    .ok()?
                    .iter()
                    .map(|v| Self::parse(v, lookup, depth + 1))
                    .collect();
                let functions = functions?;
                let bounds = dict.get_number_array("Bounds", lookup).unwrap_or_default();
                let encode = dict.get_number_array("Encode", lookup).unwrap_or_default();
                if bounds.len() + 1 != functions.len() || encode.len() != 2 * functions.len() {
                    tracing::debug!("stitching function with mismatched Bounds/Encode");
                    return None;
                }
                Some(Self::Stitching {
                    domain,
                    functions,
                    bounds,
                    encode,
                })
            }
            other => {
                tracing::debug!(function_type = other, "unsupported shading function");
                None
            }
        }
    }

    pub fn evaluate(&self, t: f64) -> Vec<f64> {
        match self {
            Self::Exponential {
                domain,
                c0,
                c1,
                exponent,
            } => {
                let x = clamp(t, *domain).powf(*exponent);
                c0.iter().zip(c1).map(|(a, b)| a + x * (b - a)).collect()
            }
            Self::Stitching {
                domain,
                functions,
                bounds,
                encode,
            } => {
                let t = clamp(t, *domain);
                let k = bounds.iter().take_while(|&&b| t >= b).count();
                let lo = if k == 0 { domain.0 } else { bounds[k - 1] };
                let hi = bounds.get(k).copied().unwrap_or(domain.1);
                let (e0, e1) = (encode[2 * k], encode[2 * k + 1]);
                let x = if hi == lo { e0 } else { e0 + (t - lo) * (e1 - e0) / (hi - lo) };
                functions[k].evaluate(x)
            }
            Self::Parallel(parts) => parts.iter().flat_map(|f| f.evaluate(t)).collect(),
        }
    }
}

/// A smooth shading ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub geometry: ShadingGeometry,
    /// Parametric range mapped onto the geometry
    pub domain: (f64, f64),
    pub extend: (bool, bool),
    pub function: ShadingFunction,
    pub bbox: Option<Rect>,
}

impl Shading {
    /// `None` for unsupported shading types or malformed dictionaries.
    pub fn from_dict(dict: &Dict, lookup: &dyn ResourceLookup) -> Option<Self> {
        let shading_type = dict.get_resolved("ShadingType", lookup)?.as_integer().ok()?;
        let coords = dict.get_number_array("Coords", lookup)?;
        let geometry = match (shading_type, coords.as_slice()) {
            (2, &[x0, y0, x1, y1]) => ShadingGeometry::Axial {
                coords: [x0, y0, x1, y1],
            },
            (3, &[x0, y0, r0, x1, y1, r1]) => ShadingGeometry::Radial {
                coords: [x0, y0, r0, x1, y1, r1],
            },
            _ => {
                tracing::debug!(shading_type, "unsupported shading");
                return None;
            }
        };
        let extend = match dict.get_resolved("Extend", lookup).map(Value::as_array) {
            Some(Ok([a, b])) => (a.as_bool().unwrap_or(false), b.as_bool().unwrap_or(false)),
            _ => (false, false),
        };
        let bbox = dict
            .get_number_array("BBox", lookup)
            .and_then(|v| match v[..] {
                [x0, y0, x1, y1] => Some((x0, y0, x1, y1)),
                _ => None,
            });
        Some(Self {
            geometry,
            domain: pair(dict, "Domain", lookup).unwrap_or((0.0, 1.0)),
            extend,
            function: ShadingFunction::from_value(dict.get("Function")?, lookup)?,
            bbox,
        })
    }

    /// Color at parameter `t` of the domain.
    pub fn color_at(&self, t: f64) -> Color {
        Color::from_components(&self.function.evaluate(t)).unwrap_or_default()
    }
}

fn pair(dict: &Dict, key: &str, lookup: &dyn ResourceLookup) -> Option<(f64, f64)> {
    match dict.get_number_array(key, lookup)?[..] {
        [a, b] => Some((a, b)),
        _ => None,
    }
}

fn clamp(t: f64, (lo, hi): (f64, f64)) -> f64 {
    t.max(lo.min(hi)).min(hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceStore;

    fn dict(entries: Vec<(&str, Value)>) -> Value {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn nums(v: &[f64]) -> Value {
        Value::Array(v.iter().map(|&n| Value::Number(n)).collect())
    }

    fn exponential(c0: &[f64], c1: &[f64]) -> Value {
        dict(vec![
            ("FunctionType", 2i64.into()),
            ("Domain", nums(&[0.0, 1.0])),
            ("C0", nums(c0)),
            ("C1", nums(c1)),
            ("N", 1i64.into()),
        ])
    }

    #[test]
    fn exponential_interpolates() {
        let store = ResourceStore::new();
        let f = ShadingFunction::from_value(&exponential(&[0.0, 0.0, 0.0], &[1.0, 0.5, 0.0]), &store).unwrap();
        assert_eq!(f.evaluate(0.5), vec![0.5, 0.25, 0.0]);
        assert_eq!(f.evaluate(2.0), vec![1.0, 0.5, 0.0]);
    }

    #[test]
    fn stitching_picks_subdomain() {
        let store = ResourceStore::new();
        let f = dict(vec![
            ("FunctionType", 3i64.into()),
            ("Domain", nums(&[0.0, 1.0])),
            (
                "Functions",
                Value::Array(vec![exponential(&[0.0], &[1.0]), exponential(&[1.0], &[0.0])]),
            ),
            ("Bounds", nums(&[0.5])),
            ("Encode", nums(&[0.0, 1.0, 0.0, 1.0])),
        ]);
        let f = ShadingFunction::from_value(&f, &store).unwrap();
        assert_eq!(f.evaluate(0.25), vec![0.5]);
        assert_eq!(f.evaluate(0.75), vec![0.5]);
        assert_eq!(f.evaluate(0.5), vec![1.0]);
    }

    #[test]
    fn axial_shading_from_dict() {
        let store = ResourceStore::new();
        let Value::Dict(d) = dict(vec![
            ("ShadingType", 2i64.into()),
            ("Coords", nums(&[0.0, 0.0, 100.0, 0.0])),
            ("Extend", Value::Array(vec![true.into(), false.into()])),
            ("Function", exponential(&[0.0], &[1.0])),
        ]) else {
            unreachable!()
        };
        let shading = Shading::from_dict(&d, &store).unwrap();
        assert_eq!(
            shading.geometry,
            ShadingGeometry::Axial {
                coords: [0.0, 0.0, 100.0, 0.0]
            }
        );
        assert_eq!(shading.extend, (true, false));
        assert_eq!(shading.color_at(1.0), Color::gray(1.0));
    }

    #[test]
    fn radial_needs_six_coords() {
        let store = ResourceStore::new();
        let radial = |coords: &[f64]| {
            let Value::Dict(d) = dict(vec![
                ("ShadingType", 3i64.into()),
                ("Coords", nums(coords)),
                ("Function", exponential(&[0.0], &[1.0])),
            ]) else {
                unreachable!()
            };
            Shading::from_dict(&d, &store)
        };
        assert_eq!(
            radial(&[0.0, 0.0, 1.0, 0.0, 0.0, 10.0]).unwrap().geometry,
            ShadingGeometry::Radial {
                coords: [0.0, 0.0, 1.0, 0.0, 0.0, 10.0]
            }
        );
        assert_eq!(radial(&[0.0, 0.0, 100.0, 0.0]), None);
    }

    #[test]
    fn sampled_function_is_rejected() {
        let store = ResourceStore::new();
        let f = dict(vec![("FunctionType", 0i64.into())]);
        assert_eq!(ShadingFunction::from_value(&f, &store), None);
    }
}

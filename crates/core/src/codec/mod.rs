//! Stream filters.
//!
//! This module contains:
//! - `ascii85`: ASCII85 and ASCIIHex decoding
//! - `flate`: zlib inflation and row predictors
//!
//! [`decode_stream`] applies the filter chain named by a stream dictionary.
//! Image codecs (DCT, JPX, CCITT, JBIG2) are not handled here; image data is
//! passed to the drawing sink undecoded.

pub mod ascii85;
pub mod flate;

pub use ascii85::{ascii85decode, asciihexdecode};
pub use flate::{Predictor, flatedecode};

use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, Value};

/// Whether the stream dictionary names any filter.
pub fn has_filters(dict: &Dict) -> bool {
    !filter_names(dict).is_empty()
}

/// Filter names in application order.
pub fn filter_names(dict: &Dict) -> Vec<&str> {
    match dict.get("Filter") {
        Some(Value::Name(name)) => vec![name.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

/// `DecodeParms` entry for the filter at `index`.
fn decode_parms(dict: &Dict, index: usize) -> Option<&Dict> {
    match dict.get("DecodeParms") {
        Some(Value::Dict(d)) if index == 0 => Some(d),
        Some(Value::Array(arr)) => arr.get(index).and_then(|v| v.as_dict().ok()),
        _ => None,
    }
}

fn predictor_from(parms: Option<&Dict>) -> Predictor {
    let mut pred = Predictor::default();
    if let Some(parms) = parms {
        let int = |key: &str, default: usize| {
            parms
                .get_integer(key)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(default)
        };
        pred.predictor = int("Predictor", 1);
        pred.colors = int("Colors", 1);
        pred.bits_per_component = int("BitsPerComponent", 8);
        pred.columns = int("Columns", 1);
    }
    pred
}

/// Apply every filter of `dict` to `data`.
pub fn decode_stream(dict: &Dict, data: &[u8]) -> Result<Vec<u8>> {
    let names = filter_names(dict);
    let mut output = data.to_vec();
    for (i, name) in names.iter().enumerate() {
        output = match *name {
            "FlateDecode" | "Fl" => {
                let inflated = flatedecode(&output)?;
                predictor_from(decode_parms(dict, i)).apply(inflated)?
            }
            "ASCII85Decode" | "A85" => ascii85decode(&output)?,
            "ASCIIHexDecode" | "AHx" => asciihexdecode(&output)?,
            other => {
                return Err(PdfError::DecodeError(format!("unsupported filter {other}")));
            }
        };
    }
    Ok(output)
}

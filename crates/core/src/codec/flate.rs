//! Flate decompression and PNG/TIFF row predictors.

use crate::error::{PdfError, Result};
use flate2::read::ZlibDecoder;
use flate2::{Decompress, FlushDecompress, Status};
use std::io::Read;

/// Inflate a zlib stream.
///
/// A stream that fails part way (bad checksum, truncated tail) yields the
/// output produced up to the failure. Only a stream that produces nothing at
/// all is an error.
pub fn flatedecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    match decoder.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(e) => {
            let partial = decompress_corrupted(data);
            if partial.is_empty() && !data.is_empty() {
                return Err(PdfError::DecodeError(format!("flate: {e}")));
            }
            tracing::debug!(error = %e, recovered = partial.len(), "lenient inflate");
            Ok(partial)
        }
    }
}

/// Best-effort zlib decompression for corrupted streams.
///
/// Feeds the decoder one byte at a time and keeps everything produced before
/// it gives up.
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

/// Parameters of a `DecodeParms` predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predictor {
    pub predictor: usize,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
}

impl Default for Predictor {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl Predictor {
    /// Undo the prediction. Predictor 1 is the identity.
    ///
    /// A row wider than the whole payload is a decode error.
    pub fn apply(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        if self.predictor > 1
            && !data.is_empty()
            && self.row_bytes().is_none_or(|row| row > data.len())
        {
            return Err(PdfError::DecodeError(format!(
                "predictor row of {} columns exceeds {} bytes",
                self.columns,
                data.len()
            )));
        }
        match self.predictor {
            0 | 1 => Ok(data),
            2 => Ok(self.apply_tiff(data)),
            p if p >= 10 => Ok(self.apply_png(&data)),
            p => Err(PdfError::DecodeError(format!("unsupported predictor {p}"))),
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        self.colors.saturating_mul(self.bits_per_component).div_ceil(8).max(1)
    }

    fn row_bytes(&self) -> Option<usize> {
        let bits = self.colors.checked_mul(self.columns)?.checked_mul(self.bits_per_component)?;
        Some(bits.div_ceil(8))
    }

    /// TIFF predictor 2, 8-bit components only.
    fn apply_tiff(&self, mut data: Vec<u8>) -> Vec<u8> {
        if self.bits_per_component != 8 {
            return data;
        }
        let row_bytes = self.row_bytes().unwrap_or(0);
        let bpp = self.bytes_per_pixel();
        if row_bytes == 0 {
            return data;
        }
        for row in data.chunks_mut(row_bytes) {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        data
    }

    /// PNG prediction adds a filter byte at the start of each row.
    /// This reverses the prediction to get the original data.
    fn apply_png(&self, data: &[u8]) -> Vec<u8> {
        let row_bytes = self.row_bytes().unwrap_or(0);
        let bpp = self.bytes_per_pixel();
        let row_size = row_bytes + 1;

        let mut result = Vec::with_capacity(data.len());
        let mut prev_row = vec![0u8; row_bytes];
        let mut current_row = vec![0u8; row_bytes];

        for row in data.chunks_exact(row_size) {
            let filter_type = row[0];
            let row_data = &row[1..];

            match filter_type {
                // Sub
                1 => {
                    for i in 0..row_bytes {
                        let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                        current_row[i] = row_data[i].wrapping_add(left);
                    }
                }
                // Up
                2 => {
                    for i in 0..row_bytes {
                        current_row[i] = row_data[i].wrapping_add(prev_row[i]);
                    }
                }
                // Average
                3 => {
                    for i in 0..row_bytes {
                        let left = if i >= bpp { u16::from(current_row[i - bpp]) } else { 0 };
                        let above = u16::from(prev_row[i]);
                        current_row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                    }
                }
                // Paeth
                4 => {
                    for i in 0..row_bytes {
                        let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                        let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                        current_row[i] =
                            row_data[i].wrapping_add(paeth_predictor(left, prev_row[i], upper_left));
                    }
                }
                // None, and unknown filters copy the row
                _ => current_row.copy_from_slice(row_data),
            }

            result.extend_from_slice(&current_row);
            std::mem::swap(&mut prev_row, &mut current_row);
        }

        result
    }
}

/// Paeth predictor function used in PNG filtering.
const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i32;
    let b = above as i32;
    let c = upper_left as i32;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

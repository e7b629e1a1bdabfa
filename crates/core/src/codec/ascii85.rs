//! ASCII85 and ASCIIHex stream decoders.

use crate::error::{PdfError, Result};

/// Decode ASCII85-encoded data.
/// Handles: z-encoding, <~ ~> markers, whitespace, missing EOD.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);

    // Everything from the ~> marker on is ignored
    let data = match data.iter().position(|&b| b == b'~') {
        Some(pos) => &data[..pos],
        None => data,
    };

    let mut filtered = Vec::with_capacity(data.len());
    for &byte in data {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\x00' => {}
            b'z' if filtered.len() % 5 == 0 => filtered.extend_from_slice(b"!!!!!"),
            b'!'..=b'u' => filtered.push(byte),
            _ => {
                return Err(PdfError::DecodeError(format!(
                    "invalid ASCII85 byte 0x{byte:02x}"
                )));
            }
        }
    }

    let mut result = Vec::with_capacity(filtered.len() / 5 * 4 + 4);
    for chunk in filtered.chunks(5) {
        if chunk.len() == 1 {
            // A lone trailing byte carries no data
            break;
        }
        let mut padded = [b'u'; 5];
        padded[..chunk.len()].copy_from_slice(chunk);
        let mut value: u64 = 0;
        for &byte in &padded {
            value = value * 85 + u64::from(byte - b'!');
        }
        let value = u32::try_from(value)
            .map_err(|_| PdfError::DecodeError("ASCII85 group overflow".into()))?;
        result.extend_from_slice(&value.to_be_bytes()[..chunk.len() - 1]);
    }

    Ok(result)
}

/// Decode ASCIIHex-encoded data. Whitespace is skipped, `>` ends the data and
/// an odd trailing digit is padded with zero.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2 + 1);
    let mut pending: Option<u8> = None;

    for &byte in data {
        if byte == b'>' {
            break;
        }
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\x00' => continue,
            _ => {
                return Err(PdfError::DecodeError(format!(
                    "invalid hex digit 0x{byte:02x}"
                )));
            }
        };
        match pending.take() {
            Some(high) => result.push(high << 4 | nibble),
            None => pending = Some(nibble),
        }
    }
    if let Some(high) = pending {
        result.push(high << 4);
    }

    Ok(result)
}

//! Predictor post-processing for Flate and LZW decoded data
//!
//! Predictor 2 is TIFF horizontal differencing. Predictors 10 through 15
//! are the PNG filters, one filter tag byte in front of every row.

use crate::error::{Error, Result};

/// Reverse the predictor applied before compression.
pub fn apply_predictor_decode(
    data: &[u8],
    predictor: i32,
    colors: i32,
    bits_per_component: i32,
    columns: i32,
) -> Result<Vec<u8>> {
    match predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff_predictor(data, colors, bits_per_component, columns),
        10..=15 => decode_png_predictor(data, colors, bits_per_component, columns),
        _ => Err(Error::xref(format!("unsupported predictor {predictor}"))),
    }
}

/// Bytes each sample occupies, rounded up to at least one.
fn bytes_per_pixel(colors: i32, bits_per_component: i32) -> usize {
    let bits = colors.max(1) as usize * bits_per_component.max(1) as usize;
    bits.div_ceil(8).max(1)
}

/// Bytes each row occupies.
fn bytes_per_row(colors: i32, bits_per_component: i32, columns: i32) -> usize {
    let bits = colors.max(1) as usize * bits_per_component.max(1) as usize * columns.max(1) as usize;
    bits.div_ceil(8)
}

fn decode_tiff_predictor(
    data: &[u8],
    colors: i32,
    bits_per_component: i32,
    columns: i32,
) -> Result<Vec<u8>> {
    if bits_per_component != 8 {
        // Sub-byte TIFF differencing never shows up in xref or object
        // stream dictionaries in practice.
        return Err(Error::xref(format!(
            "TIFF predictor with {bits_per_component} bits per component is not supported"
        )));
    }

    let row_len = bytes_per_row(colors, bits_per_component, columns);
    let pixel_len = bytes_per_pixel(colors, bits_per_component);
    let mut out = data.to_vec();

    for row in out.chunks_mut(row_len) {
        for i in pixel_len..row.len() {
            row[i] = row[i].wrapping_add(row[i - pixel_len]);
        }
    }
    Ok(out)
}

fn decode_png_predictor(
    data: &[u8],
    colors: i32,
    bits_per_component: i32,
    columns: i32,
) -> Result<Vec<u8>> {
    let row_len = bytes_per_row(colors, bits_per_component, columns);
    let pixel_len = bytes_per_pixel(colors, bits_per_component);
    // Every encoded row is the filter tag byte plus the row data.
    let stride = row_len + 1;
    if row_len == 0 || data.len() % stride != 0 {
        return Err(Error::xref(format!(
            "PNG predictor data length {} is not a multiple of row length {}",
            data.len(),
            stride
        )));
    }

    let rows = data.len() / stride;
    let mut out = vec![0u8; rows * row_len];
    let mut prev_row = vec![0u8; row_len];

    for (row_index, chunk) in data.chunks(stride).enumerate() {
        let filter = chunk[0];
        let row_out = &mut out[row_index * row_len..(row_index + 1) * row_len];
        row_out.copy_from_slice(&chunk[1..]);
        decode_png_row(filter, row_out, &prev_row, pixel_len)?;
        prev_row.copy_from_slice(row_out);
    }
    Ok(out)
}

/// Undo one PNG filter in place. `row` holds the filtered bytes on entry
/// and the reconstructed bytes on exit.
fn decode_png_row(filter: u8, row: &mut [u8], prev_row: &[u8], pixel_len: usize) -> Result<()> {
    match filter {
        // None
        0 => {}
        // Sub
        1 => {
            for i in pixel_len..row.len() {
                row[i] = row[i].wrapping_add(row[i - pixel_len]);
            }
        }
        // Up
        2 => {
            for i in 0..row.len() {
                row[i] = row[i].wrapping_add(prev_row[i]);
            }
        }
        // Average
        3 => {
            for i in 0..row.len() {
                let left = if i >= pixel_len { row[i - pixel_len] as u16 } else { 0 };
                let up = prev_row[i] as u16;
                row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
            }
        }
        // Paeth
        4 => {
            for i in 0..row.len() {
                let left = if i >= pixel_len { row[i - pixel_len] } else { 0 };
                let up = prev_row[i];
                let up_left = if i >= pixel_len { prev_row[i - pixel_len] } else { 0 };
                row[i] = row[i].wrapping_add(paeth_predictor(left, up, up_left));
            }
        }
        _ => {
            return Err(Error::xref(format!("unknown PNG filter type {filter}")));
        }
    }
    Ok(())
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictor_none_passthrough() {
        let data = vec![1, 2, 3, 4];
        let result = apply_predictor_decode(&data, 1, 1, 8, 4).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_tiff_predictor() {
        // Two rows of four single-byte samples, horizontally differenced.
        let data = vec![10, 1, 1, 1, 20, 2, 2, 2];
        let result = apply_predictor_decode(&data, 2, 1, 8, 4).unwrap();
        assert_eq!(result, vec![10, 11, 12, 13, 20, 22, 24, 26]);
    }

    #[test]
    fn test_tiff_predictor_multi_component() {
        // One row of two RGB pixels; differencing spans one pixel, not one byte.
        let data = vec![10, 20, 30, 1, 2, 3];
        let result = apply_predictor_decode(&data, 2, 3, 8, 2).unwrap();
        assert_eq!(result, vec![10, 20, 30, 11, 22, 33]);
    }

    #[test]
    fn test_png_predictor_none() {
        let data = vec![0, 5, 6, 7];
        let result = apply_predictor_decode(&data, 10, 1, 8, 3).unwrap();
        assert_eq!(result, vec![5, 6, 7]);
    }

    #[test]
    fn test_png_predictor_sub() {
        let data = vec![1, 10, 1, 1];
        let result = apply_predictor_decode(&data, 12, 1, 8, 3).unwrap();
        assert_eq!(result, vec![10, 11, 12]);
    }

    #[test]
    fn test_png_predictor_up() {
        let data = vec![
            0, 10, 20, 30, // first row, no filtering
            2, 1, 1, 1, // second row, up filter
        ];
        let result = apply_predictor_decode(&data, 12, 1, 8, 3).unwrap();
        assert_eq!(result, vec![10, 20, 30, 11, 21, 31]);
    }

    #[test]
    fn test_png_predictor_average() {
        let data = vec![
            0, 10, 20, // row one
            3, 10, 10, // row two, average of left and up
        ];
        let result = apply_predictor_decode(&data, 12, 1, 8, 2).unwrap();
        // first byte: (0 + 10) / 2 + 10 = 15; second: (15 + 20) / 2 + 10 = 27
        assert_eq!(result, vec![10, 20, 15, 27]);
    }

    #[test]
    fn test_png_predictor_paeth() {
        let data = vec![
            0, 10, 20, // row one
            4, 5, 5, // row two
        ];
        let result = apply_predictor_decode(&data, 15, 1, 8, 2).unwrap();
        // paeth(0, 10, 0) = 10, so 15; paeth(15, 20, 10) = 20, so 25
        assert_eq!(result, vec![10, 20, 15, 25]);
    }

    #[test]
    fn test_png_predictor_bad_length() {
        let data = vec![0, 1, 2, 3, 4];
        let result = apply_predictor_decode(&data, 12, 1, 8, 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_png_predictor_unknown_filter() {
        let data = vec![9, 1, 2, 3];
        let result = apply_predictor_decode(&data, 12, 1, 8, 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_predictor() {
        let result = apply_predictor_decode(&[1, 2, 3], 7, 1, 8, 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_paeth_predictor() {
        assert_eq!(paeth_predictor(0, 0, 0), 0);
        assert_eq!(paeth_predictor(10, 0, 0), 10);
        assert_eq!(paeth_predictor(0, 10, 0), 10);
        // p = 10 + 10 - 10 = 10, pa = 0 wins
        assert_eq!(paeth_predictor(10, 10, 10), 10);
    }

    #[test]
    fn test_xref_stream_style_rows() {
        // The common xref stream layout: PNG up filter over fixed-width rows.
        let rows: Vec<Vec<u8>> = vec![vec![1, 0, 0, 10, 0], vec![1, 0, 0, 25, 0]];
        let mut encoded = Vec::new();
        let mut prev = vec![0u8; 5];
        for row in &rows {
            encoded.push(2);
            for i in 0..5 {
                encoded.push(row[i].wrapping_sub(prev[i]));
            }
            prev.clone_from(row);
        }
        let decoded = apply_predictor_decode(&encoded, 12, 1, 8, 5).unwrap();
        assert_eq!(decoded, vec![1, 0, 0, 10, 0, 1, 0, 0, 25, 0]);
    }
}

//! PNG row predictors (RFC 2083), as used by FlateDecode's /Predictor >= 10.
//!
//! Cross-reference streams are almost always written with the Up predictor,
//! so this is load-bearing for opening PDF 1.5+ files.

use crate::error::{PdfError, Result};

/// Reverse PNG prediction. Each row starts with a filter-type byte.
pub fn apply_png_predictor(
    data: &[u8],
    columns: usize,
    colors: usize,
    bits_per_component: usize,
) -> Result<Vec<u8>> {
    let row_bytes = colors * columns * bits_per_component / 8;
    if row_bytes == 0 {
        return Err(PdfError::Syntax {
            pos: 0,
            msg: "predictor with zero-width rows".into(),
        });
    }
    let bpp = std::cmp::max(1, colors * bits_per_component / 8);
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for row_start in (0..data.len()).step_by(row_size) {
        if row_start + row_size > data.len() {
            break;
        }
        let filter_type = data[row_start];
        let row_data = &data[row_start + 1..row_start + row_size];
        let mut row = vec![0u8; row_bytes];

        match filter_type {
            0 => row.copy_from_slice(row_data),
            1 => {
                // Sub: left neighbor.
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    row[i] = row_data[i].wrapping_add(left);
                }
            }
            2 => {
                // Up: byte above.
                for i in 0..row_bytes {
                    row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                // Average of left and above.
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let above = prev_row[i] as u16;
                    row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row_data[i].wrapping_add(paeth(left, above, upper_left));
                }
            }
            other => {
                return Err(PdfError::Syntax {
                    pos: row_start,
                    msg: format!("unknown PNG filter type {other}"),
                });
            }
        }

        result.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(result)
}

const fn paeth(left: u8, above: u8, upper_left: u8) -> u8 {
    let p = left as i16 + above as i16 - upper_left as i16;
    let pa = (p - left as i16).abs();
    let pb = (p - above as i16).abs();
    let pc = (p - upper_left as i16).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_filter_passes_through() {
        let data = [0u8, 1, 2, 3, 0, 4, 5, 6];
        assert_eq!(
            apply_png_predictor(&data, 3, 1, 8).unwrap(),
            vec![1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn up_filter_accumulates_rows() {
        let data = [2u8, 1, 1, 1, 2, 1, 1, 1];
        assert_eq!(
            apply_png_predictor(&data, 3, 1, 8).unwrap(),
            vec![1, 1, 1, 2, 2, 2]
        );
    }

    #[test]
    fn sub_filter_accumulates_left() {
        let data = [1u8, 5, 1, 1];
        assert_eq!(apply_png_predictor(&data, 3, 1, 8).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn unknown_filter_type_fails() {
        let data = [9u8, 0, 0, 0];
        assert!(apply_png_predictor(&data, 3, 1, 8).is_err());
    }
}

//! LZWDecode support
//!
//! PDF uses the TIFF flavor of LZW: MSB-first codes starting at 9 bits,
//! and by default the code width grows one code early (/EarlyChange 1).

use weezl::{BitOrder, decode::Decoder};

use crate::error::{Error, Result};
use crate::filter::params::LZWDecodeParams;
use crate::filter::predictor::apply_predictor_decode;

/// Decompress LZWDecode data and reverse any predictor.
pub fn decode_lzw(data: &[u8], params: Option<&LZWDecodeParams>) -> Result<Vec<u8>> {
    let early_change = params.map_or(1, |p| p.early_change);
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };

    let decompressed = decoder
        .decode(data)
        .map_err(|e| Error::xref(format!("LZWDecode failed: {e}")))?;

    match params {
        Some(p) if p.predictor > 1 => {
            apply_predictor_decode(&decompressed, p.predictor, p.colors, p.bits_per_component, p.columns)
        }
        _ => Ok(decompressed),
    }
}

//! FlateDecode (zlib/deflate) support

use std::io::Read;

use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;

use crate::error::{Error, Result};
use crate::filter::params::FlateDecodeParams;
use crate::filter::predictor::apply_predictor_decode;

/// Decompress FlateDecode data and reverse any predictor.
pub fn decode_flate(data: &[u8], params: Option<&FlateDecodeParams>) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    let mut decoder = ZlibDecoder::new(data);
    if let Err(zlib_err) = decoder.read_to_end(&mut decompressed) {
        // Some producers write raw deflate data without the zlib header.
        decompressed.clear();
        let mut raw = DeflateDecoder::new(data);
        raw.read_to_end(&mut decompressed)
            .map_err(|_| Error::xref(format!("FlateDecode failed: {zlib_err}")))?;
    }

    match params {
        Some(p) if p.predictor > 1 => {
            apply_predictor_decode(&decompressed, p.predictor, p.colors, p.bits_per_component, p.columns)
        }
        _ => Ok(decompressed),
    }
}

/// Compress data with FlateDecode at the given level (0-9).
pub fn encode_flate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| Error::xref(format!("FlateDecode compression failed: {e}")))
}

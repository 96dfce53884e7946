//! Stream filter decoding
//!
//! The loader only ever decodes the streams it has to read itself, which
//! are cross-reference streams and object streams. Those are written with
//! FlateDecode or LZWDecode in practice, so this module supports exactly
//! that pair and reports anything else as unsupported.

pub mod flate;
pub mod lzw;
pub mod params;
pub mod predictor;

pub use flate::{decode_flate, encode_flate};
pub use lzw::decode_lzw;
pub use params::{FlateDecodeParams, LZWDecodeParams};
pub use predictor::apply_predictor_decode;

use crate::error::{Error, Result};
use crate::object::{Dict, Name, ObjRef, Object};

/// Stream filters the loader can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    FlateDecode,
    LZWDecode,
}

impl FilterType {
    /// Map a filter name to its type, accepting the PDF 1.1 abbreviations.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FlateDecode" | "Fl" => Some(FilterType::FlateDecode),
            "LZWDecode" | "LZW" => Some(FilterType::LZWDecode),
            _ => None,
        }
    }

    pub fn to_name(self) -> &'static str {
        match self {
            FilterType::FlateDecode => "FlateDecode",
            FilterType::LZWDecode => "LZWDecode",
        }
    }
}

/// Decode a stream's payload according to its dictionary.
///
/// `/Filter` may be a single name or an array of names applied in order,
/// with `/DecodeParms` a matching dictionary or array. Indirect values are
/// resolved through `resolve`; an unresolvable reference reads as null.
/// With no `/Filter` entry the data comes back as is.
pub fn decode_stream(
    dict: &Dict,
    data: &[u8],
    mut resolve: impl FnMut(ObjRef) -> Option<Object>,
) -> Result<Vec<u8>> {
    let filters = filter_names(dict, &mut resolve)?;
    if filters.is_empty() {
        return Ok(data.to_vec());
    }

    let parms = deref(dict.get(&Name::new("DecodeParms")), &mut resolve);
    let mut out = data.to_vec();
    for (i, name) in filters.iter().enumerate() {
        let filter_parms = parms_for(&parms, i, filters.len(), &mut resolve);
        out = match FilterType::from_name(name.as_str()) {
            Some(FilterType::FlateDecode) => {
                let p = flate_params(filter_parms.as_ref(), &mut resolve);
                decode_flate(&out, Some(&p))?
            }
            Some(FilterType::LZWDecode) => {
                let p = lzw_params(filter_parms.as_ref(), &mut resolve);
                decode_lzw(&out, Some(&p))?
            }
            None => {
                return Err(Error::xref(format!("unsupported stream filter /{name}")));
            }
        };
    }
    Ok(out)
}

/// Resolve one level of indirection, treating a broken reference as null.
fn deref(obj: Option<&Object>, resolve: &mut impl FnMut(ObjRef) -> Option<Object>) -> Object {
    match obj {
        Some(Object::Ref(r)) => resolve(*r).unwrap_or(Object::Null),
        Some(other) => other.clone(),
        None => Object::Null,
    }
}

/// Collect the filter chain as a list of names.
fn filter_names(
    dict: &Dict,
    resolve: &mut impl FnMut(ObjRef) -> Option<Object>,
) -> Result<Vec<Name>> {
    match deref(dict.get(&Name::new("Filter")), resolve) {
        Object::Null => Ok(Vec::new()),
        Object::Name(name) => Ok(vec![name]),
        Object::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for item in &items {
                match deref(Some(item), resolve) {
                    Object::Name(name) => names.push(name),
                    other => {
                        return Err(Error::xref(format!(
                            "filter array holds a non-name entry: {other:?}"
                        )));
                    }
                }
            }
            Ok(names)
        }
        other => Err(Error::xref(format!("/Filter is not a name or array: {other:?}"))),
    }
}

/// Pick the parameter dictionary for filter `i` out of `/DecodeParms`.
fn parms_for(
    parms: &Object,
    i: usize,
    filter_count: usize,
    resolve: &mut impl FnMut(ObjRef) -> Option<Object>,
) -> Option<Dict> {
    match parms {
        Object::Dict(d) if filter_count == 1 || i == 0 => Some(d.clone()),
        Object::Array(items) => match deref(items.get(i), resolve) {
            Object::Dict(d) => Some(d),
            _ => None,
        },
        _ => None,
    }
}

fn int_field(
    parms: Option<&Dict>,
    key: &str,
    default: i32,
    resolve: &mut impl FnMut(ObjRef) -> Option<Object>,
) -> i32 {
    let value = parms.and_then(|d| d.get(&Name::new(key)).cloned());
    match deref(value.as_ref(), resolve).as_int() {
        Some(n) => n.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        None => default,
    }
}

fn flate_params(
    parms: Option<&Dict>,
    resolve: &mut impl FnMut(ObjRef) -> Option<Object>,
) -> FlateDecodeParams {
    FlateDecodeParams {
        predictor: int_field(parms, "Predictor", 1, resolve),
        colors: int_field(parms, "Colors", 1, resolve),
        bits_per_component: int_field(parms, "BitsPerComponent", 8, resolve),
        columns: int_field(parms, "Columns", 1, resolve),
    }
}

fn lzw_params(
    parms: Option<&Dict>,
    resolve: &mut impl FnMut(ObjRef) -> Option<Object>,
) -> LZWDecodeParams {
    LZWDecodeParams {
        predictor: int_field(parms, "Predictor", 1, resolve),
        colors: int_field(parms, "Colors", 1, resolve),
        bits_per_component: int_field(parms, "BitsPerComponent", 8, resolve),
        columns: int_field(parms, "Columns", 1, resolve),
        early_change: int_field(parms, "EarlyChange", 1, resolve),
    }
}

//! Serialization of a merged object space to a complete PDF file
//!
//! Objects are written in ascending id order with their byte offsets
//! recorded, then cross-checked against the serialized buffer before the
//! classic cross-reference table is emitted. Dictionary keys are written
//! sorted, so the same merged space always produces the same bytes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::merge::MergedDocument;
use crate::object::{Dict, Name, Object, ObjRef, PdfString};

/// Second line of the output, four high bytes marking the file as binary
const BINARY_MARKER: &[u8] = b"%\xE2\xE3\xCF\xD3\n";

/// Largest byte offset a classic ten-digit cross-reference entry can hold
const MAX_CLASSIC_OFFSET: usize = 9_999_999_999;

/// Serialize the merged document into one complete in-memory PDF.
pub fn to_bytes(merged: &MergedDocument) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("%PDF-{}\n", merged.version()).as_bytes());
    out.extend_from_slice(BINARY_MARKER);

    let mut offsets: Vec<(i32, usize)> = Vec::with_capacity(merged.object_count());
    let mut expected_id = 1;
    for (&id, obj) in merged.objects() {
        if id != expected_id {
            return Err(Error::invariant(format!(
                "output ids are not dense: expected {expected_id}, found {id}"
            )));
        }
        expected_id += 1;
        offsets.push((id, out.len()));
        write_indirect_object(&mut out, id, obj);
    }
    verify_offsets(&out, &offsets)?;

    let xref_offset = out.len();
    let size = merged.object_count() as i64 + 1;
    out.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for &(id, offset) in &offsets {
        if offset > MAX_CLASSIC_OFFSET {
            return Err(Error::invariant(format!(
                "object {id} offset {offset} exceeds the classic table width"
            )));
        }
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    let mut trailer = Dict::new();
    trailer.insert(Name::new("Size"), Object::Int(size));
    trailer.insert(
        Name::new("Root"),
        Object::Ref(ObjRef::new(merged.root_id(), 0)),
    );
    trailer.insert(
        Name::new("Info"),
        Object::Ref(ObjRef::new(merged.info_id(), 0)),
    );
    out.extend_from_slice(b"trailer\n");
    write_object(&mut out, &Object::Dict(trailer));
    out.push(b'\n');
    out.extend_from_slice(format!("startxref\n{xref_offset}\n").as_bytes());
    out.extend_from_slice(b"%%EOF\n");

    log::debug!(
        "serialized {} objects, {} bytes, xref at {xref_offset}",
        merged.object_count(),
        out.len()
    );
    Ok(out)
}

/// Serialize into an arbitrary sink. Sink failures are write errors,
/// distinct from the parse-side I/O taxonomy.
pub fn write_to<W: Write>(merged: &MergedDocument, mut sink: W) -> Result<()> {
    let bytes = to_bytes(merged)?;
    sink.write_all(&bytes).map_err(Error::write)?;
    sink.flush().map_err(Error::write)?;
    Ok(())
}

/// Serialize to a file. A failure removes the partial file; the caller
/// never finds a truncated document at the target path.
pub fn save<P: AsRef<Path>>(merged: &MergedDocument, path: P) -> Result<()> {
    let bytes = to_bytes(merged)?;
    let path = path.as_ref();
    if let Err(e) = write_file(path, &bytes) {
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(Error::write)?;
    file.write_all(bytes).map_err(Error::write)?;
    file.flush().map_err(Error::write)?;
    Ok(())
}

/// Check that every recorded offset lands on its own object header.
fn verify_offsets(out: &[u8], offsets: &[(i32, usize)]) -> Result<()> {
    for &(id, offset) in offsets {
        let header = format!("{id} 0 obj");
        if offset >= out.len() || !out[offset..].starts_with(header.as_bytes()) {
            return Err(Error::invariant(format!(
                "object {id} recorded at offset {offset} does not start there"
            )));
        }
    }
    Ok(())
}

fn write_indirect_object(out: &mut Vec<u8>, id: i32, obj: &Object) {
    out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    write_object(out, obj);
    out.extend_from_slice(b"\nendobj\n");
}

fn write_object(out: &mut Vec<u8>, obj: &Object) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => write_real(out, *r),
        Object::String(s) => write_string(out, s),
        Object::Name(n) => write_name(out, n),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item);
            }
            out.push(b']');
        }
        Object::Dict(dict) => write_dict(out, dict),
        Object::Stream { dict, data } => {
            // The declared length is never trusted; the actual payload
            // size is what the output records.
            let mut dict = dict.clone();
            dict.insert(Name::new("Length"), Object::Int(data.len() as i64));
            write_dict(out, &dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Ref(r) => {
            out.extend_from_slice(format!("{} {} R", r.num, r.generation).as_bytes())
        }
    }
}

/// Write a dictionary with its keys in sorted order.
fn write_dict(out: &mut Vec<u8>, dict: &Dict) {
    let mut keys: Vec<&Name> = dict.keys().collect();
    keys.sort();
    out.extend_from_slice(b"<<\n");
    for key in keys {
        write_name(out, key);
        out.push(b' ');
        if let Some(value) = dict.get(key) {
            write_object(out, value);
        }
        out.push(b'\n');
    }
    out.extend_from_slice(b">>");
}

/// Write a name, hex-escaping every byte outside the regular range.
fn write_name(out: &mut Vec<u8>, name: &Name) {
    out.push(b'/');
    for &b in name.as_str().as_bytes() {
        let regular = (0x21..=0x7e).contains(&b)
            && !matches!(
                b,
                b'(' | b')'
                    | b'<'
                    | b'>'
                    | b'['
                    | b']'
                    | b'{'
                    | b'}'
                    | b'/'
                    | b'%'
                    | b'#'
            );
        if regular {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}

/// Write a literal string, escaping delimiters and non-printable bytes.
fn write_string(out: &mut Vec<u8>, s: &PdfString) {
    out.push(b'(');
    for &b in s.as_bytes() {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7e => out.push(b),
            _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
        }
    }
    out.push(b')');
}

/// Write a real without trailing fraction zeros and without exponents.
fn write_real(out: &mut Vec<u8>, value: f64) {
    let formatted = format!("{value:.6}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    out.extend_from_slice(trimmed.as_bytes());
}

//! pdfweld - a pure Rust PDF merge engine
//!
//! This library merges any number of PDF documents into one, preserving
//! page order and page resources. It carries its own PDF machinery from
//! the bytes up: lexer, object parser, cross-reference resolver (classic
//! tables and compressed cross-reference streams), page tree walker, and
//! writer. No system PDF library is involved.
//!
//! The top-level entry points are [`merge_files`] and [`merge_bytes`].
//! The pipeline underneath is exposed for callers that need finer
//! control: load sources with [`Document`], extract pages with
//! [`extract_pages`], combine with [`Merger`], and serialize with the
//! [`writer`] module.
//!
//! # Modules
//!
//! - `lexer` - byte-level tokenizer for PDF syntax
//! - `parser` - assembles tokens into values, indirect objects, and
//!   classic cross-reference sections
//! - `object` - the object model: names, strings, arrays, dictionaries,
//!   streams, references
//! - `xref` - cross-reference index and stream-encoded table decoding
//! - `filter` - stream filters (Flate, LZW) and predictor reversal
//! - `document` - whole-document loading and object resolution
//! - `pages` - page tree traversal and per-page dependency closure
//! - `merge` - clones extracted pages into a fresh object space
//! - `writer` - serialization with a classic cross-reference table
//! - `error` - the error taxonomy shared by every stage
//!
//! Merging is deterministic: the same inputs in the same order produce
//! byte-identical output on every run. With the `parallel` feature,
//! input documents are parsed on the rayon pool; the merge stage itself
//! always runs single threaded so id assignment stays fixed.
//!
//! Encrypted inputs are rejected up front rather than passed through
//! undecrypted, and a failed merge never leaves a partial output file.

use std::path::Path;

pub mod document;
pub mod error;
pub mod filter;
pub mod lexer;
pub mod merge;
pub mod object;
pub mod pages;
pub mod parser;
pub mod writer;
pub mod xref;

pub use document::Document;
pub use error::{Error, Result};
pub use merge::{MergeOptions, MergedDocument, Merger};
pub use object::{Array, Dict, Name, ObjRef, Object, PdfString};
pub use pages::{extract_pages, ExtractedPage};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Merge in-memory PDF buffers into one output buffer.
///
/// Sources are merged in slice order. Errors carry the position of the
/// offending input ("input 3") so callers can report which file of a
/// batch was broken.
pub fn merge_bytes(sources: &[&[u8]]) -> Result<Vec<u8>> {
    if sources.is_empty() {
        return Err(Error::EmptyInput);
    }
    let docs = parse_sources(sources)?;
    let merged = merge_documents(&docs, input_label)?;
    writer::to_bytes(&merged)
}

/// Merge PDF files into one output file.
///
/// Inputs are merged in slice order; errors are tagged with the path of
/// the input that caused them. On failure nothing is left at the output
/// path.
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::EmptyInput);
    }
    let paths: Vec<&Path> = inputs.iter().map(AsRef::as_ref).collect();
    let docs = open_sources(&paths)?;
    let merged = merge_documents(&docs, |i| paths[i].display().to_string())?;
    writer::save(&merged, output)
}

fn merge_documents<F>(docs: &[Document], label: F) -> Result<MergedDocument>
where
    F: Fn(usize) -> String,
{
    let mut merger = Merger::new();
    for (i, doc) in docs.iter().enumerate() {
        merger
            .add_document(doc)
            .map_err(|e| Error::in_input(label(i), e))?;
    }
    merger.merge()
}

fn input_label(i: usize) -> String {
    format!("input {}", i + 1)
}

#[cfg(not(feature = "parallel"))]
fn parse_sources(sources: &[&[u8]]) -> Result<Vec<Document>> {
    sources
        .iter()
        .enumerate()
        .map(|(i, bytes)| {
            Document::from_bytes(bytes).map_err(|e| Error::in_input(input_label(i), e))
        })
        .collect()
}

/// Parse each buffer on the rayon pool. Documents are independent until
/// the merge stage, which stays single threaded. Results are gathered
/// per input and inspected in input order, so the reported error is the
/// first failing input, not the first to finish.
#[cfg(feature = "parallel")]
fn parse_sources(sources: &[&[u8]]) -> Result<Vec<Document>> {
    use rayon::prelude::*;
    let results: Vec<Result<Document>> = sources
        .par_iter()
        .enumerate()
        .map(|(i, bytes)| {
            Document::from_bytes(bytes).map_err(|e| Error::in_input(input_label(i), e))
        })
        .collect();
    results.into_iter().collect()
}

#[cfg(not(feature = "parallel"))]
fn open_sources(paths: &[&Path]) -> Result<Vec<Document>> {
    paths
        .iter()
        .map(|path| Document::open(path).map_err(|e| Error::in_input(path.display().to_string(), e)))
        .collect()
}

#[cfg(feature = "parallel")]
fn open_sources(paths: &[&Path]) -> Result<Vec<Document>> {
    use rayon::prelude::*;
    let results: Vec<Result<Document>> = paths
        .par_iter()
        .map(|path| Document::open(path).map_err(|e| Error::in_input(path.display().to_string(), e)))
        .collect();
    results.into_iter().collect()
}

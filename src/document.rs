//! PDF document loading and object resolution
//!
//! A `Document` is built from a complete input buffer: the cross-reference
//! chain is resolved first, then every live indirect object is materialized
//! into a flat table keyed by object number. Once built, a document is
//! immutable; extraction and merging only read from it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::filter::decode_stream;
use crate::lexer::Token;
use crate::object::{Dict, Name, ObjRef, Object};
use crate::parser::{self, Parser};
use crate::xref::{XrefEntryType, XrefStreamDecoder, XrefTable};

/// How many bytes before end-of-file the startxref anchor is searched in
const STARTXREF_WINDOW: usize = 1024;

/// A fully loaded PDF document
pub struct Document {
    /// Header version, e.g. "1.7"
    version: String,
    /// Resolved cross-reference index
    xref: XrefTable,
    /// Trailer dictionary, merged across the chain with the newest
    /// section winning per key
    trailer: Dict,
    /// Materialized objects keyed by object number
    objects: HashMap<i32, Object>,
    /// Root catalog reference from the trailer
    root: Option<ObjRef>,
}

impl Document {
    /// Load a document from a file via a memory mapping.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: the mapping is only read below and the file handle stays
        // open until the load completes.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Load a document from an in-memory buffer.
    ///
    /// The buffer must hold the complete file; offsets in the
    /// cross-reference data are resolved against it directly.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let version = parser::parse_header(data)?;
        let start = find_startxref(data)?;
        let (xref, trailer) = read_xref_chain(data, start)?;

        // Encrypted documents are rejected outright, before any object
        // materialization, rather than passed through undecrypted.
        match trailer.get(&Name::new("Encrypt")) {
            None | Some(Object::Null) => {}
            Some(_) => return Err(Error::EncryptedDocument),
        }

        let objects = materialize(data, &xref)?;
        let root = trailer
            .get(&Name::new("Root"))
            .and_then(Object::as_reference);
        log::debug!(
            "loaded PDF {}: {} xref entries, {} live objects",
            version,
            xref.len(),
            objects.len()
        );

        Ok(Self {
            version,
            xref,
            trailer,
            objects,
            root,
        })
    }

    /// Header version, e.g. "1.4"
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The merged trailer dictionary
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// Number of live (non-free) objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Look up an indirect object.
    ///
    /// Fails with a dangling-reference error when the object number is
    /// absent, free, or recorded under a different generation.
    pub fn get_object(&self, r: ObjRef) -> Result<&Object> {
        let entry = self
            .xref
            .get(r.num)
            .ok_or_else(|| Error::dangling(r.num, r.generation))?;
        if entry.generation as i32 != r.generation {
            return Err(Error::dangling(r.num, r.generation));
        }
        self.objects
            .get(&r.num)
            .ok_or_else(|| Error::dangling(r.num, r.generation))
    }

    /// Follow a reference exactly one hop; any other value passes through.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Ref(r) => self.get_object(*r),
            other => Ok(other),
        }
    }

    /// The catalog dictionary named by the trailer's /Root.
    pub fn catalog(&self) -> Result<&Dict> {
        let root = self.root.ok_or(Error::MissingPageTree)?;
        match self.get_object(root)? {
            Object::Dict(d) => Ok(d),
            _ => Err(Error::MissingPageTree),
        }
    }

    /// The root node of the page tree, from the catalog's /Pages.
    pub fn root_pages_node(&self) -> Result<&Object> {
        let catalog = self.catalog()?;
        let pages = catalog
            .get(&Name::new("Pages"))
            .ok_or(Error::MissingPageTree)?;
        let node = self.resolve(pages)?;
        match node {
            Object::Dict(_) => Ok(node),
            _ => Err(Error::MissingPageTree),
        }
    }

    /// Declared page count, from the root Pages node's /Count.
    ///
    /// This is what the document claims, not what traversal finds; the
    /// page extractor counts actual leaves and is the authority.
    pub fn page_count(&self) -> Result<i64> {
        let root = self.root_pages_node()?;
        let count = root.dict_get("Count").ok_or(Error::MissingPageTree)?;
        self.resolve(count)?
            .as_int()
            .ok_or(Error::MissingPageTree)
    }
}

/// Locate the last startxref keyword near end-of-file and read its offset.
fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let tail = &data[tail_start..];
    let Some(found) = tail.windows(9).rposition(|w| w == b"startxref") else {
        return Err(Error::xref("startxref not found near end of file"));
    };

    let mut parser = Parser::new_at(data, tail_start + found + 9);
    let offset = parser
        .expect_int()
        .map_err(|_| Error::xref("startxref offset is not an integer"))?;
    if offset < 0 || offset as usize >= data.len() {
        return Err(Error::xref(format!(
            "startxref offset {offset} is outside the file"
        )));
    }
    Ok(offset as usize)
}

/// Walk the cross-reference chain from the newest section backwards.
///
/// Entries are inserted first-seen-wins, so a section closer to the end
/// of the file overrides any older section for the same object number.
/// The trailer is merged the same way, key by key. Hybrid files queue the
/// /XRefStm stream ahead of /Prev.
fn read_xref_chain(data: &[u8], start: usize) -> Result<(XrefTable, Dict)> {
    let mut xref = XrefTable::new();
    let mut trailer = Dict::new();
    let mut stack: Vec<i64> = vec![start as i64];
    let mut visited: HashSet<i64> = HashSet::new();

    while let Some(offset) = stack.pop() {
        if offset < 0 || offset as usize >= data.len() {
            return Err(Error::xref(format!(
                "xref section offset {offset} is outside the file"
            )));
        }
        if !visited.insert(offset) {
            log::warn!("xref chain revisits offset {offset}, ignoring the repeat");
            continue;
        }

        let section_trailer = read_section(data, offset as usize, &mut xref)?;
        for (key, value) in &section_trailer {
            trailer
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        // Pop order makes the hybrid stream read before the previous section.
        if let Some(prev) = int_value(&section_trailer, "Prev") {
            stack.push(prev);
        }
        if let Some(stm) = int_value(&section_trailer, "XRefStm") {
            stack.push(stm);
        }
    }
    Ok((xref, trailer))
}

fn int_value(dict: &Dict, key: &str) -> Option<i64> {
    dict.get(&Name::new(key)).and_then(Object::as_int)
}

/// Read one chain section, classic table or cross-reference stream, and
/// return its trailer dictionary.
fn read_section(data: &[u8], offset: usize, xref: &mut XrefTable) -> Result<Dict> {
    let mut parser = Parser::new_at(data, offset);
    match parser.next_token()? {
        Token::Xref => {
            for entry in parser.parse_xref()? {
                xref.add_if_absent(entry);
            }
            parser.parse_trailer()
        }
        Token::Int => read_stream_section(data, offset, xref),
        other => Err(Error::xref(format!(
            "offset {offset} does not hold an xref section (found {other:?})"
        ))),
    }
}

/// Read a cross-reference stream section. Its dictionary doubles as the
/// section trailer.
fn read_stream_section(data: &[u8], offset: usize, xref: &mut XrefTable) -> Result<Dict> {
    let mut parser = Parser::new_at(data, offset);
    // Everything in a cross-reference stream dictionary must be direct,
    // so no length resolver is needed here.
    let (num, _, obj) = parser.parse_indirect_object(|_| None)?;
    let Object::Stream { dict, data: raw } = obj else {
        return Err(Error::xref(format!(
            "object {num} at offset {offset} is not a cross-reference stream"
        )));
    };
    if let Some(t) = dict.get(&Name::new("Type")).and_then(Object::as_name) {
        if t.as_str() != "XRef" {
            return Err(Error::xref(format!(
                "stream at offset {offset} has /Type /{}, expected /XRef",
                t.as_str()
            )));
        }
    }

    let decoded = decode_stream(&dict, &raw, |_| None)?;
    let decoder = XrefStreamDecoder::from_dict(&dict)?;
    for entry in decoder.decode(&decoded)? {
        xref.add_if_absent(entry);
    }
    Ok(dict)
}

/// Parse every live object into a flat table.
///
/// In-use entries are parsed straight from their byte offsets; compressed
/// entries are grouped per container stream and unpacked afterwards, so
/// each container is decoded exactly once.
fn materialize(data: &[u8], xref: &XrefTable) -> Result<HashMap<i32, Object>> {
    let mut objects = HashMap::with_capacity(xref.len());
    let mut compressed: BTreeMap<i32, Vec<(i32, u32)>> = BTreeMap::new();

    for num in xref.object_numbers() {
        let Some(entry) = xref.get(num) else { continue };
        match entry.entry_type {
            XrefEntryType::Free => {}
            XrefEntryType::InUse => {
                let obj = parse_entry_object(data, xref, num, entry.generation, entry.offset)?;
                objects.insert(num, obj);
            }
            XrefEntryType::Compressed => {
                if entry.offset < 0 || entry.offset > i32::MAX as i64 {
                    return Err(Error::xref(format!(
                        "object {num}: container number {} out of range",
                        entry.offset
                    )));
                }
                compressed
                    .entry(entry.offset as i32)
                    .or_default()
                    .push((num, entry.index));
            }
        }
    }

    for (container_num, members) in compressed {
        load_container_members(&mut objects, container_num, &members)?;
    }
    Ok(objects)
}

/// Parse the in-use object for one xref entry and verify its header.
fn parse_entry_object(
    data: &[u8],
    xref: &XrefTable,
    num: i32,
    generation: u16,
    offset: i64,
) -> Result<Object> {
    if offset < 0 || offset as usize >= data.len() {
        return Err(Error::xref(format!(
            "object {num}: offset {offset} is outside the file"
        )));
    }

    let mut parser = Parser::new_at(data, offset as usize);
    let (parsed_num, parsed_gen, obj) =
        parser.parse_indirect_object(|r| resolve_length_ref(data, xref, r))?;
    if parsed_num != num {
        return Err(Error::xref(format!(
            "offset {offset} holds object {parsed_num}, xref expected {num}"
        )));
    }
    if parsed_gen != generation as i32 {
        log::warn!(
            "object {num}: header generation {parsed_gen} disagrees with xref generation {generation}"
        );
    }
    Ok(obj)
}

/// Resolve an indirect /Length by parsing its target directly from the
/// buffer. Anything unresolvable returns None and lets the stream reader
/// fall back to its endstream scan.
fn resolve_length_ref(data: &[u8], xref: &XrefTable, r: ObjRef) -> Option<i64> {
    let entry = xref.get(r.num)?;
    if !entry.is_in_use() || entry.offset < 0 || entry.offset as usize >= data.len() {
        return None;
    }
    let mut parser = Parser::new_at(data, entry.offset as usize);
    let (num, _, obj) = parser.parse_indirect_object(|_| None).ok()?;
    if num != r.num {
        return None;
    }
    obj.as_int()
}

/// Unpack the requested members of one /ObjStm container.
fn load_container_members(
    objects: &mut HashMap<i32, Object>,
    container_num: i32,
    members: &[(i32, u32)],
) -> Result<()> {
    let (dict, raw) = match objects.get(&container_num) {
        Some(Object::Stream { dict, data }) => (dict.clone(), data.clone()),
        Some(_) => {
            return Err(Error::xref(format!(
                "object stream {container_num} is not a stream"
            )));
        }
        None => {
            return Err(Error::xref(format!(
                "object stream {container_num} is missing"
            )));
        }
    };
    if let Some(t) = dict.get(&Name::new("Type")).and_then(Object::as_name) {
        if t.as_str() != "ObjStm" {
            return Err(Error::xref(format!(
                "object stream {container_num} has /Type /{}, expected /ObjStm",
                t.as_str()
            )));
        }
    }

    let decoded = decode_stream(&dict, &raw, |r| objects.get(&r.num).cloned())?;
    let n = int_value(&dict, "N")
        .ok_or_else(|| Error::xref(format!("object stream {container_num} has no /N")))?;
    let first = int_value(&dict, "First")
        .ok_or_else(|| Error::xref(format!("object stream {container_num} has no /First")))?;
    if n < 0 || first < 0 || first as usize > decoded.len() {
        return Err(Error::xref(format!(
            "object stream {container_num} has invalid /N or /First"
        )));
    }

    // Header: n pairs of (object number, offset relative to /First)
    let mut header = Parser::new(&decoded);
    let mut pairs = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let num = header.expect_int().map_err(|e| {
            Error::xref(format!("object stream {container_num} header: {e}"))
        })?;
        let off = header.expect_int().map_err(|e| {
            Error::xref(format!("object stream {container_num} header: {e}"))
        })?;
        pairs.push((num, off));
    }

    for &(num, index) in members {
        let idx = index as usize;
        let Some(&(header_num, header_off)) = pairs.get(idx) else {
            return Err(Error::xref(format!(
                "object {num}: index {idx} out of range in object stream {container_num}"
            )));
        };
        if header_num != num as i64 {
            return Err(Error::xref(format!(
                "object stream {container_num} lists object {header_num} at index {idx}, expected {num}"
            )));
        }
        let at = match first.checked_add(header_off) {
            Some(at) if (0..decoded.len() as i64).contains(&at) => at as usize,
            _ => {
                return Err(Error::xref(format!(
                    "object {num}: offset {header_off} is outside object stream {container_num}"
                )));
            }
        };
        let obj = Parser::new_at(&decoded, at).parse_object()?;
        objects.insert(num, obj);
    }
    Ok(())
}

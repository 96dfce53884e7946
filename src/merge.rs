//! Merge engine: clones extracted pages into one fresh object space
//!
//! Each source document gets its own remapping table from source ids to
//! output ids, so resources shared between pages of one document are
//! cloned once, while identical-looking objects from different documents
//! are never collapsed. Output ids are handed out in a fixed order
//! (source order, then page order, then closure-discovery order), which
//! makes repeated merges of the same inputs assign identical ids.

use std::collections::{BTreeMap, HashMap};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Array, Dict, Name, ObjRef, Object, PdfString};
use crate::pages::{extract_pages, ExtractedPage};

/// Lowest header version the output ever declares
const MIN_VERSION: (u32, u32) = (1, 4);

/// Knobs for the merge output.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// `/Producer` string stamped into the output info dictionary.
    pub producer: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            producer: concat!("pdfweld ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Accumulates source documents and produces a merged object space.
///
/// Sources are processed in the order they were added. The merge itself
/// is single threaded; ids must be observed in one fixed order.
pub struct Merger<'a> {
    options: MergeOptions,
    sources: Vec<(&'a Document, Vec<ExtractedPage>)>,
}

impl<'a> Merger<'a> {
    pub fn new() -> Self {
        Self::with_options(MergeOptions::default())
    }

    pub fn with_options(options: MergeOptions) -> Self {
        Self {
            options,
            sources: Vec::new(),
        }
    }

    /// Extract a document's pages and queue them for merging.
    pub fn add_document(&mut self, doc: &'a Document) -> Result<()> {
        let pages = extract_pages(doc)?;
        self.sources.push((doc, pages));
        Ok(())
    }

    /// Number of queued source documents
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Total pages across all queued sources
    pub fn page_count(&self) -> usize {
        self.sources.iter().map(|(_, pages)| pages.len()).sum()
    }

    /// Combine all queued sources into one output object space.
    ///
    /// Every object is a physical clone; nothing in the output borrows
    /// from or aliases a source document.
    pub fn merge(self) -> Result<MergedDocument> {
        if self.sources.is_empty() {
            return Err(Error::EmptyInput);
        }
        let total_pages = self.page_count();
        if total_pages == 0 {
            return Err(Error::EmptyInput);
        }

        let mut objects: BTreeMap<i32, Object> = BTreeMap::new();
        let mut next_id: i32 = 1;
        let mut page_ids: Vec<i32> = Vec::with_capacity(total_pages);
        let mut version = MIN_VERSION;

        for (doc, pages) in &self.sources {
            version = version.max(parse_version(doc.version()));

            // Assign ids first: each page, then its closure in discovery
            // order. A page already claimed by an earlier page's closure
            // keeps the id it was given there.
            let mut remap: HashMap<ObjRef, i32> = HashMap::new();
            for page in pages {
                page_ids.push(alloc(&mut next_id, &mut remap, page.page_ref)?);
                for &r in &page.closure {
                    alloc(&mut next_id, &mut remap, r)?;
                }
            }

            // Clone closure objects through the table, then overwrite each
            // page's slot with its effective dictionary. The overwrite
            // matters when one page's closure dragged in a raw copy of a
            // later page.
            for page in pages {
                for &r in &page.closure {
                    let id = mapped(&remap, r)?;
                    objects.insert(id, remap_object(doc.get_object(r)?, &remap)?);
                }
                let mut dict = remap_dict(&page.dict, &remap)?;
                dict.insert(Name::new("Type"), Object::Name(Name::new("Page")));
                objects.insert(mapped(&remap, page.page_ref)?, Object::Dict(dict));
            }
        }

        let pages_root_id = take_id(&mut next_id)?;
        let catalog_id = take_id(&mut next_id)?;
        let info_id = take_id(&mut next_id)?;

        for &id in &page_ids {
            match objects.get_mut(&id) {
                Some(Object::Dict(dict)) => {
                    dict.insert(
                        Name::new("Parent"),
                        Object::Ref(ObjRef::new(pages_root_id, 0)),
                    );
                }
                _ => {
                    return Err(Error::invariant(format!(
                        "page object {id} missing from the merged space"
                    )));
                }
            }
        }

        let kids: Array = page_ids
            .iter()
            .map(|&id| Object::Ref(ObjRef::new(id, 0)))
            .collect();
        let mut pages_dict = Dict::new();
        pages_dict.insert(Name::new("Type"), Object::Name(Name::new("Pages")));
        pages_dict.insert(Name::new("Kids"), Object::Array(kids));
        pages_dict.insert(Name::new("Count"), Object::Int(page_ids.len() as i64));
        objects.insert(pages_root_id, Object::Dict(pages_dict));

        let mut catalog = Dict::new();
        catalog.insert(Name::new("Type"), Object::Name(Name::new("Catalog")));
        catalog.insert(
            Name::new("Pages"),
            Object::Ref(ObjRef::new(pages_root_id, 0)),
        );
        objects.insert(catalog_id, Object::Dict(catalog));

        // A fresh info dictionary. No dates: the same inputs must produce
        // the same bytes on every run.
        let mut info = Dict::new();
        info.insert(
            Name::new("Producer"),
            Object::String(PdfString::from(self.options.producer.as_str())),
        );
        objects.insert(info_id, Object::Dict(info));

        log::debug!(
            "merged {} sources, {} pages, {} objects",
            self.sources.len(),
            total_pages,
            objects.len()
        );

        Ok(MergedDocument {
            version: format!("{}.{}", version.0, version.1),
            objects,
            root_id: catalog_id,
            info_id,
            page_count: total_pages,
        })
    }
}

impl Default for Merger<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// The merged object space, ready for serialization.
///
/// Object ids are dense: they run from 1 to `object_count()` without
/// gaps, all at generation 0.
pub struct MergedDocument {
    version: String,
    objects: BTreeMap<i32, Object>,
    root_id: i32,
    info_id: i32,
    page_count: usize,
}

impl MergedDocument {
    /// Header version for the output, the maximum across the sources
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All output objects, keyed by ascending id
    pub fn objects(&self) -> &BTreeMap<i32, Object> {
        &self.objects
    }

    /// Id of the output catalog
    pub fn root_id(&self) -> i32 {
        self.root_id
    }

    /// Id of the output info dictionary
    pub fn info_id(&self) -> i32 {
        self.info_id
    }

    /// Total pages in the output
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of output objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// Map a source reference to its output id, or allocate the next one.
fn alloc(next_id: &mut i32, remap: &mut HashMap<ObjRef, i32>, r: ObjRef) -> Result<i32> {
    if let Some(&id) = remap.get(&r) {
        return Ok(id);
    }
    let id = take_id(next_id)?;
    remap.insert(r, id);
    Ok(id)
}

fn take_id(next_id: &mut i32) -> Result<i32> {
    let id = *next_id;
    *next_id = next_id
        .checked_add(1)
        .ok_or_else(|| Error::invariant("output object ids exhausted"))?;
    Ok(id)
}

fn mapped(remap: &HashMap<ObjRef, i32>, r: ObjRef) -> Result<i32> {
    remap
        .get(&r)
        .copied()
        .ok_or_else(|| Error::invariant(format!("reference {r} escaped closure discovery")))
}

/// Deep-clone a value, rewriting every reference through the table.
///
/// A reference with no table entry means closure discovery and cloning
/// disagree about reachability, which is a bug, not an input error.
fn remap_object(obj: &Object, remap: &HashMap<ObjRef, i32>) -> Result<Object> {
    Ok(match obj {
        Object::Ref(r) => Object::Ref(ObjRef::new(mapped(remap, *r)?, 0)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| remap_object(item, remap))
                .collect::<Result<_>>()?,
        ),
        Object::Dict(dict) => Object::Dict(remap_dict(dict, remap)?),
        Object::Stream { dict, data } => Object::Stream {
            dict: remap_dict(dict, remap)?,
            data: data.clone(),
        },
        other => other.clone(),
    })
}

/// Clone a dictionary through the table. /Parent entries are dropped
/// wholesale; the merge rewires page parents to the rebuilt tree, and any
/// other parent link would point outside the cloned closure.
fn remap_dict(dict: &Dict, remap: &HashMap<ObjRef, i32>) -> Result<Dict> {
    let mut out = Dict::with_capacity(dict.len());
    for (key, value) in dict {
        if key.as_str() == "Parent" {
            continue;
        }
        out.insert(key.clone(), remap_object(value, remap)?);
    }
    Ok(out)
}

fn parse_version(s: &str) -> (u32, u32) {
    let Some((major, minor)) = s.split_once('.') else {
        return MIN_VERSION;
    };
    match (major.parse(), minor.parse()) {
        (Ok(major), Ok(minor)) => (major, minor),
        _ => MIN_VERSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_pdf_version(version: &str, bodies: &[&str]) -> Vec<u8> {
        let mut out = format!("%PDF-{version}\n").into_bytes();
        let mut offsets = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref_pos = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", bodies.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for off in &offsets {
            out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_pos}\n%%EOF\n",
                bodies.len() + 1
            )
            .as_bytes(),
        );
        out
    }

    fn build_pdf(bodies: &[&str]) -> Vec<u8> {
        build_pdf_version("1.4", bodies)
    }

    /// One page whose media box width identifies the source in assertions.
    fn one_page_pdf(width: i32) -> Vec<u8> {
        build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            &format!("<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 {width} 100] >>"),
            "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
            "<< /Length 8 >>\nstream\nBT ET Tj\nendstream",
        ])
    }

    fn kid_ids(merged: &MergedDocument) -> Vec<i32> {
        let catalog = merged.objects().get(&merged.root_id()).unwrap();
        let pages_ref = catalog
            .dict_get("Pages")
            .and_then(Object::as_reference)
            .unwrap();
        let pages = merged.objects().get(&pages_ref.num).unwrap();
        pages
            .dict_get("Kids")
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|kid| kid.as_reference().unwrap().num)
            .collect()
    }

    fn media_box_width(merged: &MergedDocument, page_id: i32) -> i64 {
        merged
            .objects()
            .get(&page_id)
            .and_then(|page| page.dict_get("MediaBox"))
            .and_then(Object::as_array)
            .and_then(|media_box| media_box[2].as_int())
            .unwrap()
    }

    #[test]
    fn test_merge_zero_sources() {
        let merger = Merger::new();
        assert!(matches!(merger.merge(), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_merge_two_single_page_sources() {
        let pdf_a = one_page_pdf(100);
        let pdf_b = one_page_pdf(200);
        let doc_a = Document::from_bytes(&pdf_a).unwrap();
        let doc_b = Document::from_bytes(&pdf_b).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc_a).unwrap();
        merger.add_document(&doc_b).unwrap();
        assert_eq!(merger.source_count(), 2);
        assert_eq!(merger.page_count(), 2);

        let merged = merger.merge().unwrap();
        assert_eq!(merged.page_count(), 2);

        let kids = kid_ids(&merged);
        assert_eq!(kids.len(), 2);
        assert_eq!(media_box_width(&merged, kids[0]), 100);
        assert_eq!(media_box_width(&merged, kids[1]), 200);
    }

    #[test]
    fn test_identity_merge_keeps_page_order() {
        let pdf = build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>",
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 111 100] >>",
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 222 100] >>",
        ]);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let kids = kid_ids(&merged);
        assert_eq!(merged.page_count(), 2);
        assert_eq!(media_box_width(&merged, kids[0]), 111);
        assert_eq!(media_box_width(&merged, kids[1]), 222);
    }

    #[test]
    fn test_ids_dense_from_one() {
        let pdf_a = one_page_pdf(100);
        let pdf_b = one_page_pdf(200);
        let doc_a = Document::from_bytes(&pdf_a).unwrap();
        let doc_b = Document::from_bytes(&pdf_b).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc_a).unwrap();
        merger.add_document(&doc_b).unwrap();
        let merged = merger.merge().unwrap();

        let ids: Vec<i32> = merged.objects().keys().copied().collect();
        let expected: Vec<i32> = (1..=merged.object_count() as i32).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_pages_rewired_to_new_root() {
        let pdf = one_page_pdf(100);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let catalog = merged.objects().get(&merged.root_id()).unwrap();
        assert!(catalog.has_type("Catalog"));
        let pages_ref = catalog
            .dict_get("Pages")
            .and_then(Object::as_reference)
            .unwrap();
        let pages = merged.objects().get(&pages_ref.num).unwrap();
        assert!(pages.has_type("Pages"));
        assert_eq!(pages.dict_get("Count").and_then(Object::as_int), Some(1));

        for id in kid_ids(&merged) {
            let page = merged.objects().get(&id).unwrap();
            assert!(page.has_type("Page"));
            assert_eq!(
                page.dict_get("Parent").and_then(Object::as_reference),
                Some(pages_ref)
            );
        }
    }

    #[test]
    fn test_shared_resource_cloned_once_within_source() {
        // Both pages use font 5; the output must hold a single clone.
        let pdf = build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>",
            "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 5 0 R >> >> >>",
            "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 5 0 R >> >> >>",
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>",
        ]);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let font_ids: Vec<i32> = merged
            .objects()
            .iter()
            .filter(|(_, obj)| obj.has_type("Font"))
            .map(|(&id, _)| id)
            .collect();
        assert_eq!(font_ids.len(), 1);

        let font_ref_of = |page_id: i32| {
            merged
                .objects()
                .get(&page_id)
                .and_then(|page| page.dict_get("Resources"))
                .and_then(|res| res.dict_get("Font"))
                .and_then(|font| font.dict_get("F1"))
                .and_then(Object::as_reference)
                .unwrap()
        };
        let kids = kid_ids(&merged);
        assert_eq!(font_ref_of(kids[0]), font_ref_of(kids[1]));
        assert_eq!(font_ref_of(kids[0]).num, font_ids[0]);
    }

    #[test]
    fn test_no_aliasing_across_sources() {
        // The same bytes loaded twice: resources must be cloned per
        // source, never collapsed across documents.
        let pdf = one_page_pdf(100);
        let doc_a = Document::from_bytes(&pdf).unwrap();
        let doc_b = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc_a).unwrap();
        merger.add_document(&doc_b).unwrap();
        let merged = merger.merge().unwrap();

        let kids = kid_ids(&merged);
        let contents_of = |page_id: i32| {
            merged
                .objects()
                .get(&page_id)
                .and_then(|page| page.dict_get("Contents"))
                .and_then(Object::as_reference)
                .unwrap()
        };
        assert_ne!(contents_of(kids[0]), contents_of(kids[1]));

        let stream_count = merged
            .objects()
            .values()
            .filter(|obj| matches!(obj, Object::Stream { .. }))
            .count();
        assert_eq!(stream_count, 2);
    }

    #[test]
    fn test_forward_page_reference_keeps_effective_dict() {
        // Page 3's annotation points at page 4, so page 4 lands in page
        // 3's closure as a raw clone first. The final object must still
        // be the effective dictionary, inherited media box included.
        let pdf = build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 333 100] >>",
            "<< /Type /Page /Parent 2 0 R /Annots [5 0 R] >>",
            "<< /Type /Page /Parent 2 0 R >>",
            "<< /Type /Annot /Subtype /Link /Dest [4 0 R /Fit] /Rect [0 0 10 10] >>",
        ]);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let kids = kid_ids(&merged);
        assert_eq!(kids.len(), 2);
        assert_eq!(media_box_width(&merged, kids[1]), 333);

        // The annotation's destination resolves to the second page's id.
        let second_page = merged.objects().get(&kids[1]).unwrap();
        assert!(second_page.has_type("Page"));
        assert!(second_page.dict_get("Parent").is_some());
    }

    #[test]
    fn test_every_output_reference_resolves() {
        let pdf_a = one_page_pdf(100);
        let pdf_b = build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 /Resources << /Font << /F1 4 0 R >> >> >>",
            "<< /Type /Page /Parent 2 0 R /Annots [5 0 R] >>",
            "<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>",
            "<< /Type /Annot /Subtype /Link /P 3 0 R /Rect [0 0 10 10] >>",
        ]);
        let doc_a = Document::from_bytes(&pdf_a).unwrap();
        let doc_b = Document::from_bytes(&pdf_b).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc_a).unwrap();
        merger.add_document(&doc_b).unwrap();
        let merged = merger.merge().unwrap();

        fn check_refs(obj: &Object, objects: &BTreeMap<i32, Object>) {
            match obj {
                Object::Ref(r) => {
                    assert!(objects.contains_key(&r.num), "dangling {r} in output");
                    assert_eq!(r.generation, 0);
                }
                Object::Array(items) => {
                    for item in items {
                        check_refs(item, objects);
                    }
                }
                Object::Dict(dict) | Object::Stream { dict, .. } => {
                    for value in dict.values() {
                        check_refs(value, objects);
                    }
                }
                _ => {}
            }
        }
        for obj in merged.objects().values() {
            check_refs(obj, merged.objects());
        }
    }

    #[test]
    fn test_deterministic_id_assignment() {
        let pdf_a = one_page_pdf(100);
        let pdf_b = one_page_pdf(200);

        let run = || {
            let doc_a = Document::from_bytes(&pdf_a).unwrap();
            let doc_b = Document::from_bytes(&pdf_b).unwrap();
            let mut merger = Merger::new();
            merger.add_document(&doc_a).unwrap();
            merger.add_document(&doc_b).unwrap();
            let merged = merger.merge().unwrap();
            (
                kid_ids(&merged),
                merged.root_id(),
                merged.info_id(),
                merged.objects().keys().copied().collect::<Vec<_>>(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_output_version_is_source_maximum() {
        let pdf_a = build_pdf_version(
            "1.3",
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
                "<< /Type /Page /Parent 2 0 R >>",
            ],
        );
        let pdf_b = build_pdf_version(
            "1.6",
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
                "<< /Type /Page /Parent 2 0 R >>",
            ],
        );
        let doc_a = Document::from_bytes(&pdf_a).unwrap();
        let doc_b = Document::from_bytes(&pdf_b).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc_a).unwrap();
        merger.add_document(&doc_b).unwrap();
        let merged = merger.merge().unwrap();
        assert_eq!(merged.version(), "1.6");
    }

    #[test]
    fn test_output_version_never_below_floor() {
        let pdf = build_pdf_version(
            "1.1",
            &[
                "<< /Type /Catalog /Pages 2 0 R >>",
                "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
                "<< /Type /Page /Parent 2 0 R >>",
            ],
        );
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();
        assert_eq!(merged.version(), "1.4");
    }

    #[test]
    fn test_info_is_fresh_and_dateless() {
        let pdf = one_page_pdf(100);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let info = merged
            .objects()
            .get(&merged.info_id())
            .and_then(Object::as_dict)
            .unwrap();
        assert!(info.contains_key(&Name::new("Producer")));
        assert!(!info.contains_key(&Name::new("CreationDate")));
        assert!(!info.contains_key(&Name::new("ModDate")));
    }

    #[test]
    fn test_custom_producer_string() {
        let pdf = one_page_pdf(100);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::with_options(MergeOptions {
            producer: "archiver 9.1".to_string(),
        });
        merger.add_document(&doc).unwrap();
        let merged = merger.merge().unwrap();

        let producer = merged
            .objects()
            .get(&merged.info_id())
            .and_then(|info| info.dict_get("Producer"))
            .unwrap();
        match producer {
            Object::String(s) => assert_eq!(s.as_bytes(), b"archiver 9.1"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn test_extraction_failure_surfaces_from_add() {
        let pdf = build_pdf(&[
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            "<< /Type /Page /Parent 2 0 R /Contents 9 0 R >>",
        ]);
        let doc = Document::from_bytes(&pdf).unwrap();

        let mut merger = Merger::new();
        let result = merger.add_document(&doc);
        assert!(matches!(
            result,
            Err(Error::DanglingReference { num: 9, .. })
        ));
    }

    #[test]
    fn test_parse_version_fallback() {
        assert_eq!(parse_version("1.7"), (1, 7));
        assert_eq!(parse_version("2.0"), (2, 0));
        assert_eq!(parse_version("junk"), MIN_VERSION);
        assert_eq!(parse_version("1.x"), MIN_VERSION);
    }
}

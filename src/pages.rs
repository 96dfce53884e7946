//! Page tree traversal and per-page dependency closure
//!
//! Walks a document's page tree depth first in /Kids order, fills in the
//! attributes each leaf inherits from its ancestors, then collects every
//! page's transitive dependency closure in a deterministic first-visit
//! order. Extraction only reads from the source document.

use std::collections::{HashSet, VecDeque};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Dict, Name, ObjRef, Object};

/// Fallback page size when no /MediaBox is declared anywhere: US Letter
/// in default user space units.
const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

/// One page pulled out of a source document
#[derive(Debug)]
pub struct ExtractedPage {
    /// The page object's id in its source document
    pub page_ref: ObjRef,
    /// Page dictionary with inherited attributes filled in and /Parent
    /// removed; the merge engine attaches a new parent
    pub dict: Dict,
    /// Objects this page depends on, in first-visit order. Objects already
    /// claimed by an earlier page of the same document are not repeated.
    pub closure: Vec<ObjRef>,
}

/// Attributes inherited through the page tree
#[derive(Clone, Default)]
struct Inherited {
    resources: Option<Object>,
    media_box: Option<Object>,
    rotate: Option<Object>,
}

impl Inherited {
    /// Produce the frame a node passes to its children: the node's own
    /// entries shadow whatever came from above.
    fn overridden_by(&self, dict: &Dict) -> Self {
        Self {
            resources: dict
                .get(&Name::new("Resources"))
                .cloned()
                .or_else(|| self.resources.clone()),
            media_box: dict
                .get(&Name::new("MediaBox"))
                .cloned()
                .or_else(|| self.media_box.clone()),
            rotate: dict
                .get(&Name::new("Rotate"))
                .cloned()
                .or_else(|| self.rotate.clone()),
        }
    }
}

/// Walk the page tree and produce every leaf page in document order,
/// each paired with its dependency closure.
pub fn extract_pages(doc: &Document) -> Result<Vec<ExtractedPage>> {
    let catalog = doc.catalog()?;
    let pages_val = catalog
        .get(&Name::new("Pages"))
        .ok_or(Error::MissingPageTree)?;

    let mut pages = Vec::new();
    let mut tree_visited: HashSet<ObjRef> = HashSet::new();
    let mut closure_visited: HashSet<ObjRef> = HashSet::new();

    if let Some(r) = pages_val.as_reference() {
        tree_visited.insert(r);
    }

    // Work items keep the raw kid value so resolution failures surface at
    // visit time, in document order. Kids are pushed reversed to make the
    // stack pop left to right.
    let mut stack: Vec<(&Object, Inherited)> = vec![(pages_val, Inherited::default())];

    while let Some((value, inherited)) = stack.pop() {
        let node = doc.resolve(value)?;
        let Object::Dict(dict) = node else {
            return Err(Error::xref("page tree node is not a dictionary"));
        };

        if let Some(kids_val) = dict.get(&Name::new("Kids")) {
            let frame = inherited.overridden_by(dict);
            let kids = doc
                .resolve(kids_val)?
                .as_array()
                .ok_or_else(|| Error::xref("page tree /Kids is not an array"))?;
            for kid in kids.iter().rev() {
                let Some(r) = kid.as_reference() else {
                    return Err(Error::xref("page tree kid is not an indirect reference"));
                };
                if !tree_visited.insert(r) {
                    return Err(Error::xref(format!("page tree cycle through {r}")));
                }
                stack.push((kid, frame.clone()));
            }
            continue;
        }

        let Some(page_ref) = value.as_reference() else {
            log::warn!("ignoring page tree leaf without an object id");
            continue;
        };
        match dict.get(&Name::new("Type")).and_then(Object::as_name) {
            Some(t) if t.as_str() == "Page" => {}
            Some(t) => {
                log::warn!(
                    "ignoring page tree leaf {page_ref} with /Type /{}",
                    t.as_str()
                );
                continue;
            }
            None => {
                log::warn!("page tree leaf {page_ref} has no /Type, treating it as a page");
            }
        }

        let effective = effective_page_dict(dict, &inherited);
        closure_visited.insert(page_ref);
        let closure = collect_closure(doc, &effective, &mut closure_visited)?;
        pages.push(ExtractedPage {
            page_ref,
            dict: effective,
            closure,
        });
    }

    if pages.is_empty() {
        return Err(Error::MissingPageTree);
    }
    Ok(pages)
}

/// Build the page dictionary the merge engine will clone: the leaf's own
/// entries, ancestors filling in missing inheritable ones, and a Letter
/// media box as the last resort.
fn effective_page_dict(page: &Dict, inherited: &Inherited) -> Dict {
    let mut dict = page.clone();
    dict.remove(&Name::new("Parent"));

    let fill = [
        ("Resources", &inherited.resources),
        ("MediaBox", &inherited.media_box),
        ("Rotate", &inherited.rotate),
    ];
    for (key, value) in fill {
        let key = Name::new(key);
        if !dict.contains_key(&key) {
            if let Some(v) = value {
                dict.insert(key, v.clone());
            }
        }
    }

    if !dict.contains_key(&Name::new("MediaBox")) {
        dict.insert(
            Name::new("MediaBox"),
            Object::Array(DEFAULT_MEDIA_BOX.iter().map(|v| Object::Int(*v)).collect()),
        );
    }
    dict
}

/// Breadth-first reference chase from a page dictionary.
///
/// `visited` spans the whole document so resources shared between pages
/// are claimed exactly once, by the first page that reaches them.
fn collect_closure(
    doc: &Document,
    start: &Dict,
    visited: &mut HashSet<ObjRef>,
) -> Result<Vec<ObjRef>> {
    let mut queue = VecDeque::new();
    push_dict_refs(start, &mut queue);

    let mut order = Vec::new();
    while let Some(r) = queue.pop_front() {
        if !visited.insert(r) {
            continue;
        }
        order.push(r);
        push_refs(doc.get_object(r)?, &mut queue);
    }
    Ok(order)
}

/// Queue every reference inside a value, arrays in element order.
fn push_refs(obj: &Object, queue: &mut VecDeque<ObjRef>) {
    match obj {
        Object::Ref(r) => queue.push_back(*r),
        Object::Array(items) => {
            for item in items {
                push_refs(item, queue);
            }
        }
        Object::Dict(dict) => push_dict_refs(dict, queue),
        Object::Stream { dict, .. } => push_dict_refs(dict, queue),
        _ => {}
    }
}

/// Queue a dictionary's references with keys visited in sorted order, so
/// discovery order never depends on hash iteration. /Parent is never
/// followed; the merge engine rewires parents to the rebuilt tree.
fn push_dict_refs(dict: &Dict, queue: &mut VecDeque<ObjRef>) {
    let mut keys: Vec<&Name> = dict.keys().collect();
    keys.sort();
    for key in keys {
        if key.as_str() == "Parent" {
            continue;
        }
        if let Some(value) = dict.get(key) {
            push_refs(value, queue);
        }
    }
}

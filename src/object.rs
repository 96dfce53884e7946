//! PDF object types
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Interned Name Implementation
// ============================================================================

/// Interned PDF Name with shared storage
///
/// PDF names repeat constantly (Type, Length, Kids, ...). `Arc<str>` gives
/// zero-copy cloning, and the names the merge pipeline touches on every
/// object are pre-interned so equality is usually a pointer comparison.
#[derive(Debug, Clone, Eq)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a new name, sharing storage with the pre-interned pool when possible
    pub fn new(s: &str) -> Self {
        if let Some(interned) = Self::get_interned(s) {
            return interned;
        }
        Self(Arc::from(s))
    }

    /// Create from owned String
    pub fn from_string(s: String) -> Self {
        if let Some(interned) = Self::get_interned(&s) {
            return interned;
        }
        Self(Arc::from(s))
    }

    /// Get the name string (without the leading slash)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get Arc for zero-copy sharing
    pub fn arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }

    fn get_interned(s: &str) -> Option<Self> {
        COMMON_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, arc)| Self(Arc::clone(arc)))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: pointer equality for interned names
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.as_ref() == other.0.as_ref()
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

// ============================================================================
// Pre-interned Common PDF Names
// ============================================================================

use std::sync::LazyLock;

/// Names the parse/extract/merge/write path looks up on nearly every object
static COMMON_NAMES: LazyLock<Vec<(&'static str, Arc<str>)>> = LazyLock::new(|| {
    vec![
        // Document structure
        ("Type", Arc::from("Type")),
        ("Subtype", Arc::from("Subtype")),
        ("Length", Arc::from("Length")),
        ("Filter", Arc::from("Filter")),
        ("DecodeParms", Arc::from("DecodeParms")),
        ("Parent", Arc::from("Parent")),
        ("Kids", Arc::from("Kids")),
        ("Count", Arc::from("Count")),
        // Page structure
        ("Catalog", Arc::from("Catalog")),
        ("Pages", Arc::from("Pages")),
        ("Page", Arc::from("Page")),
        ("Resources", Arc::from("Resources")),
        ("Contents", Arc::from("Contents")),
        ("MediaBox", Arc::from("MediaBox")),
        ("CropBox", Arc::from("CropBox")),
        ("Rotate", Arc::from("Rotate")),
        ("Annots", Arc::from("Annots")),
        // Resources
        ("Font", Arc::from("Font")),
        ("XObject", Arc::from("XObject")),
        ("ExtGState", Arc::from("ExtGState")),
        ("ColorSpace", Arc::from("ColorSpace")),
        ("Pattern", Arc::from("Pattern")),
        ("Shading", Arc::from("Shading")),
        // Filters the xref/object-stream path decodes
        ("FlateDecode", Arc::from("FlateDecode")),
        ("LZWDecode", Arc::from("LZWDecode")),
        ("Fl", Arc::from("Fl")),
        ("LZW", Arc::from("LZW")),
        ("Predictor", Arc::from("Predictor")),
        ("Colors", Arc::from("Colors")),
        ("BitsPerComponent", Arc::from("BitsPerComponent")),
        ("Columns", Arc::from("Columns")),
        ("EarlyChange", Arc::from("EarlyChange")),
        // Trailer and xref
        ("Root", Arc::from("Root")),
        ("Info", Arc::from("Info")),
        ("Size", Arc::from("Size")),
        ("Prev", Arc::from("Prev")),
        ("XRefStm", Arc::from("XRefStm")),
        ("Encrypt", Arc::from("Encrypt")),
        ("XRef", Arc::from("XRef")),
        ("Index", Arc::from("Index")),
        ("W", Arc::from("W")),
        ("ID", Arc::from("ID")),
        // Object streams
        ("ObjStm", Arc::from("ObjStm")),
        ("N", Arc::from("N")),
        ("First", Arc::from("First")),
        ("Extends", Arc::from("Extends")),
        // Output metadata
        ("Producer", Arc::from("Producer")),
    ]
});

/// A PDF string: an arbitrary byte sequence, not necessarily valid UTF-8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Reference to an indirect object: object number plus generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    pub num: i32,
    pub generation: i32,
}

impl ObjRef {
    pub fn new(num: i32, generation: i32) -> Self {
        Self { num, generation }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.generation)
    }
}

pub type Dict = HashMap<Name, Object>;
pub type Array = Vec<Object>;

/// A parsed PDF value.
///
/// Dictionaries use `HashMap`; every consumer that needs a stable order
/// (the writer, closure discovery) sorts keys at the point of use.
#[derive(Debug, Clone, Default)]
pub enum Object {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(PdfString),
    Name(Name),
    Array(Array),
    Dict(Dict),
    Stream {
        dict: Dict,
        data: Vec<u8>,
    },
    Ref(ObjRef),
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
    pub fn as_bool(&self) -> Option<bool> {
        if let Object::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }
    pub fn as_int(&self) -> Option<i64> {
        if let Object::Int(i) = self {
            Some(*i)
        } else {
            None
        }
    }
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            Object::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_name(&self) -> Option<&Name> {
        if let Object::Name(n) = self {
            Some(n)
        } else {
            None
        }
    }
    pub fn as_string(&self) -> Option<&PdfString> {
        if let Object::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
    pub fn as_array(&self) -> Option<&Array> {
        if let Object::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }
    pub fn as_reference(&self) -> Option<ObjRef> {
        if let Object::Ref(r) = self {
            Some(*r)
        } else {
            None
        }
    }

    /// Dictionary lookup that works on both plain dicts and stream dicts
    pub fn dict_get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|d| d.get(&Name::new(key)))
    }

    /// True when this is a dictionary whose /Type equals the given name
    pub fn has_type(&self, type_name: &str) -> bool {
        self.dict_get("Type")
            .and_then(Object::as_name)
            .is_some_and(|n| n.as_str() == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_interning() {
        let n1 = Name::new("Type");
        let n2 = Name::new("Type");
        // Interned names share one allocation
        assert!(Arc::ptr_eq(&n1.arc(), &n2.arc()));
    }

    #[test]
    fn test_name_non_interned_still_equal() {
        let n1 = Name::new("UncommonName12345");
        let n2 = Name::new("UncommonName12345");
        assert!(!Arc::ptr_eq(&n1.arc(), &n2.arc()));
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_name_display() {
        let name = Name::new("Page");
        assert_eq!(format!("{}", name), "/Page");
    }

    #[test]
    fn test_name_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::new("A"));
        set.insert(Name::new("B"));
        set.insert(Name::new("A"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_pdf_string_bytes() {
        let s = PdfString::new(vec![0xFF, 0xFE]);
        assert_eq!(s.as_bytes(), &[0xFF, 0xFE]);
        assert_eq!(s.as_str(), None);
    }

    #[test]
    fn test_pdf_string_from_str() {
        let s = PdfString::from("Hello");
        assert_eq!(s.as_str(), Some("Hello"));
    }

    #[test]
    fn test_obj_ref_display() {
        let r = ObjRef::new(12, 0);
        assert_eq!(format!("{}", r), "12 0 R");
    }

    #[test]
    fn test_obj_ref_eq_and_ord() {
        let r1 = ObjRef::new(5, 0);
        let r2 = ObjRef::new(5, 0);
        let r3 = ObjRef::new(5, 1);
        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
        assert!(r1 < r3);
    }

    #[test]
    fn test_object_scalars() {
        assert!(Object::Null.is_null());
        assert_eq!(Object::Bool(true).as_bool(), Some(true));
        assert_eq!(Object::Int(42).as_int(), Some(42));
        assert_eq!(Object::Int(42).as_real(), Some(42.0));
        assert_eq!(Object::Real(2.5).as_real(), Some(2.5));
        assert_eq!(Object::Real(2.5).as_int(), None);
    }

    #[test]
    fn test_object_name_accessor() {
        let obj = Object::Name(Name::new("Type"));
        assert_eq!(obj.as_name().unwrap().as_str(), "Type");
    }

    #[test]
    fn test_object_as_dict_covers_streams() {
        let mut dict = HashMap::new();
        dict.insert(Name::new("Length"), Object::Int(5));
        let stream = Object::Stream {
            dict,
            data: b"Hello".to_vec(),
        };
        assert_eq!(
            stream.as_dict().unwrap().get(&Name::new("Length")).unwrap().as_int(),
            Some(5)
        );
    }

    #[test]
    fn test_object_dict_get() {
        let mut dict = HashMap::new();
        dict.insert(Name::new("Count"), Object::Int(3));
        let obj = Object::Dict(dict);
        assert_eq!(obj.dict_get("Count").unwrap().as_int(), Some(3));
        assert!(obj.dict_get("Kids").is_none());
    }

    #[test]
    fn test_object_has_type() {
        let mut dict = HashMap::new();
        dict.insert(Name::new("Type"), Object::Name(Name::new("Page")));
        let obj = Object::Dict(dict);
        assert!(obj.has_type("Page"));
        assert!(!obj.has_type("Pages"));
        assert!(!Object::Int(1).has_type("Page"));
    }

    #[test]
    fn test_object_as_reference() {
        let obj = Object::Ref(ObjRef::new(10, 0));
        assert_eq!(obj.as_reference(), Some(ObjRef::new(10, 0)));
        assert_eq!(Object::Int(10).as_reference(), None);
    }

    #[test]
    fn test_object_default_is_null() {
        let obj: Object = Default::default();
        assert!(obj.is_null());
    }

    #[test]
    fn test_nested_structure() {
        let mut inner = HashMap::new();
        inner.insert(Name::new("Key"), Object::String(PdfString::from("Value")));
        let arr = vec![Object::Int(1), Object::Real(2.5), Object::Dict(inner)];
        let mut outer = HashMap::new();
        outer.insert(Name::new("Kids"), Object::Array(arr));

        let obj = Object::Dict(outer);
        let kids = obj.dict_get("Kids").unwrap().as_array().unwrap();
        assert_eq!(kids.len(), 3);
        assert_eq!(kids[0].as_int(), Some(1));
        assert_eq!(kids[1].as_real(), Some(2.5));
    }
}

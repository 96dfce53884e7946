//! Cross-reference index - object number to byte location mapping
//!
//! Entries come from classic xref tables and from binary cross-reference
//! streams. Incrementally updated files chain sections from newest to
//! oldest; the table keeps the first entry seen per object number, which
//! makes the newest revision win.

use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::object::{Dict, Name, Object};

/// Type of xref entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntryType {
    /// Free object (type 0)
    Free,
    /// In-use object at a byte offset (type 1)
    InUse,
    /// Object stored inside an object stream (type 2)
    Compressed,
}

/// Cross-reference entry
#[derive(Debug, Clone)]
pub struct XrefEntry {
    /// Entry type
    pub entry_type: XrefEntryType,
    /// Object number
    pub num: i32,
    /// Generation number (compressed objects are always generation 0)
    pub generation: u16,
    /// Byte offset (in-use) or container object number (compressed)
    pub offset: i64,
    /// Index within the container stream (compressed only)
    pub index: u32,
}

impl XrefEntry {
    pub fn free(num: i32, generation: u16) -> Self {
        Self {
            entry_type: XrefEntryType::Free,
            num,
            generation,
            offset: 0,
            index: 0,
        }
    }

    pub fn in_use(num: i32, generation: u16, offset: i64) -> Self {
        Self {
            entry_type: XrefEntryType::InUse,
            num,
            generation,
            offset,
            index: 0,
        }
    }

    pub fn compressed(num: i32, container: i64, index: u32) -> Self {
        Self {
            entry_type: XrefEntryType::Compressed,
            num,
            generation: 0,
            offset: container,
            index,
        }
    }

    pub fn is_free(&self) -> bool {
        self.entry_type == XrefEntryType::Free
    }

    pub fn is_in_use(&self) -> bool {
        self.entry_type == XrefEntryType::InUse
    }

    pub fn is_compressed(&self) -> bool {
        self.entry_type == XrefEntryType::Compressed
    }
}

/// Resolved cross-reference index for one document
#[derive(Debug, Default)]
pub struct XrefTable {
    entries: HashMap<i32, XrefEntry>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry unless the object number is already present.
    ///
    /// Sections are merged newest-first, so keeping the existing entry
    /// implements most-recent-revision-wins.
    pub fn add_if_absent(&mut self, entry: XrefEntry) {
        self.entries.entry(entry.num).or_insert(entry);
    }

    pub fn get(&self, num: i32) -> Option<&XrefEntry> {
        self.entries.get(&num)
    }

    pub fn contains(&self, num: i32) -> bool {
        self.entries.contains_key(&num)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Object numbers in ascending order
    pub fn object_numbers(&self) -> Vec<i32> {
        let mut nums: Vec<i32> = self.entries.keys().copied().collect();
        nums.sort_unstable();
        nums
    }

    pub fn max_num(&self) -> i32 {
        self.entries.keys().copied().max().unwrap_or(0)
    }
}

/// Decoder for the binary rows of a cross-reference stream
///
/// Rows are fixed-width big-endian field tuples sized by the stream's /W
/// array; /Index names the (start, count) object ranges the rows cover,
/// defaulting to a single range from 0 to /Size.
pub struct XrefStreamDecoder {
    widths: [usize; 3],
    index: Vec<(i32, i32)>,
}

impl XrefStreamDecoder {
    /// Build a decoder from a cross-reference stream's dictionary
    pub fn from_dict(dict: &Dict) -> Result<Self> {
        let widths = match dict.get(&Name::new("W")).and_then(Object::as_array) {
            Some(w) if w.len() == 3 => {
                let mut out = [0usize; 3];
                for (i, value) in w.iter().enumerate() {
                    let width = value
                        .as_int()
                        .ok_or_else(|| Error::xref("W array element is not an integer"))?;
                    if !(0..=8).contains(&width) {
                        return Err(Error::xref(format!("unsupported W field width {}", width)));
                    }
                    out[i] = width as usize;
                }
                out
            }
            Some(_) => return Err(Error::xref("W array must have 3 elements")),
            None => return Err(Error::xref("cross-reference stream missing /W")),
        };

        let size = dict
            .get(&Name::new("Size"))
            .and_then(Object::as_int)
            .ok_or_else(|| Error::xref("cross-reference stream missing /Size"))?;

        let index = match dict.get(&Name::new("Index")).and_then(Object::as_array) {
            Some(pairs) => {
                if pairs.len() % 2 != 0 {
                    return Err(Error::xref("Index array must have an even length"));
                }
                let mut ranges = Vec::with_capacity(pairs.len() / 2);
                for pair in pairs.chunks(2) {
                    let start = pair[0]
                        .as_int()
                        .ok_or_else(|| Error::xref("Index element is not an integer"))?;
                    let count = pair[1]
                        .as_int()
                        .ok_or_else(|| Error::xref("Index element is not an integer"))?;
                    if start < 0 || count < 0 || count > i32::MAX as i64 - start {
                        return Err(Error::xref("Index range out of bounds"));
                    }
                    ranges.push((start as i32, count as i32));
                }
                ranges
            }
            None => {
                if !(0..=i32::MAX as i64).contains(&size) {
                    return Err(Error::xref("cross-reference stream /Size out of bounds"));
                }
                vec![(0, size as i32)]
            }
        };

        Ok(Self { widths, index })
    }

    /// Total bytes per row
    pub fn row_width(&self) -> usize {
        self.widths.iter().sum()
    }

    /// Decode all rows of the (already decompressed) stream payload.
    ///
    /// Rows with an unknown type field describe null references and are
    /// skipped rather than rejected.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<XrefEntry>> {
        let row_width = self.row_width();
        if row_width == 0 {
            return Err(Error::xref("W array is all zeros"));
        }
        let rows: i64 = self.index.iter().map(|&(_, count)| count as i64).sum();
        if (data.len() as i64) < rows * row_width as i64 {
            return Err(Error::xref(format!(
                "cross-reference stream holds {} bytes but {} rows of {} bytes are indexed",
                data.len(),
                rows,
                row_width
            )));
        }

        let mut entries = Vec::with_capacity(rows as usize);
        let mut pos = 0usize;
        for &(start, count) in &self.index {
            for i in 0..count {
                let num = start + i;
                let row = &data[pos..pos + row_width];
                pos += row_width;

                // Field 1 defaults to type 1 when its width is zero
                let entry_type = if self.widths[0] == 0 {
                    1
                } else {
                    BigEndian::read_uint(row, self.widths[0])
                };
                let field2 = read_field(&row[self.widths[0]..], self.widths[1]);
                let field3 = read_field(&row[self.widths[0] + self.widths[1]..], self.widths[2]);

                match entry_type {
                    0 => entries.push(XrefEntry::free(num, field3.min(u16::MAX as u64) as u16)),
                    1 => entries.push(XrefEntry::in_use(
                        num,
                        field3.min(u16::MAX as u64) as u16,
                        field2 as i64,
                    )),
                    2 => entries.push(XrefEntry::compressed(
                        num,
                        field2 as i64,
                        field3.min(u32::MAX as u64) as u32,
                    )),
                    other => {
                        log::debug!("skipping xref stream row for object {num} with type {other}");
                    }
                }
            }
        }
        Ok(entries)
    }
}

fn read_field(data: &[u8], width: usize) -> u64 {
    if width == 0 {
        0
    } else {
        BigEndian::read_uint(data, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let free = XrefEntry::free(0, 65535);
        assert!(free.is_free());
        assert_eq!(free.generation, 65535);

        let used = XrefEntry::in_use(3, 0, 1234);
        assert!(used.is_in_use());
        assert_eq!(used.offset, 1234);

        let packed = XrefEntry::compressed(7, 5, 2);
        assert!(packed.is_compressed());
        assert_eq!(packed.offset, 5);
        assert_eq!(packed.index, 2);
        assert_eq!(packed.generation, 0);
    }

    #[test]
    fn test_table_first_seen_wins() {
        let mut table = XrefTable::new();
        table.add_if_absent(XrefEntry::in_use(3, 0, 100));
        // An older /Prev section must not override the newer entry
        table.add_if_absent(XrefEntry::in_use(3, 0, 999));
        assert_eq!(table.get(3).unwrap().offset, 100);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_object_numbers_sorted() {
        let mut table = XrefTable::new();
        table.add_if_absent(XrefEntry::in_use(9, 0, 1));
        table.add_if_absent(XrefEntry::in_use(2, 0, 2));
        table.add_if_absent(XrefEntry::free(0, 65535));
        assert_eq!(table.object_numbers(), vec![0, 2, 9]);
        assert_eq!(table.max_num(), 9);
    }

    fn decoder_dict(w: &[i64], index: Option<&[i64]>, size: i64) -> Dict {
        let mut dict = Dict::new();
        dict.insert(
            Name::new("W"),
            Object::Array(w.iter().map(|v| Object::Int(*v)).collect()),
        );
        dict.insert(Name::new("Size"), Object::Int(size));
        if let Some(idx) = index {
            dict.insert(
                Name::new("Index"),
                Object::Array(idx.iter().map(|v| Object::Int(*v)).collect()),
            );
        }
        dict
    }

    #[test]
    fn test_decode_default_index() {
        // W [1 2 1], three rows covering objects 0..3
        let dict = decoder_dict(&[1, 2, 1], None, 3);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();
        assert_eq!(decoder.row_width(), 4);

        let data = [
            0, 0, 0, 255, // free, gen 255
            1, 0x01, 0x00, 0, // in use at 256
            2, 0, 5, 1, // compressed in container 5, index 1
        ];
        let entries = decoder.decode(&data).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_free());
        assert_eq!(entries[1].num, 1);
        assert_eq!(entries[1].offset, 256);
        assert!(entries[2].is_compressed());
        assert_eq!(entries[2].offset, 5);
        assert_eq!(entries[2].index, 1);
    }

    #[test]
    fn test_decode_index_ranges() {
        // Two ranges: object 2 and objects 10-11
        let dict = decoder_dict(&[1, 1, 1], Some(&[2, 1, 10, 2]), 12);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();

        let data = [1, 50, 0, 1, 60, 0, 1, 70, 0];
        let entries = decoder.decode(&data).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].num, 2);
        assert_eq!(entries[0].offset, 50);
        assert_eq!(entries[1].num, 10);
        assert_eq!(entries[2].num, 11);
        assert_eq!(entries[2].offset, 70);
    }

    #[test]
    fn test_decode_zero_type_width_defaults_to_in_use() {
        let dict = decoder_dict(&[0, 2, 0], None, 2);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();

        let data = [0x00, 0x20, 0x01, 0x00];
        let entries = decoder.decode(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_in_use());
        assert_eq!(entries[0].offset, 0x20);
        assert_eq!(entries[1].offset, 0x100);
        assert_eq!(entries[1].generation, 0);
    }

    #[test]
    fn test_decode_skips_unknown_types() {
        let dict = decoder_dict(&[1, 1, 1], None, 2);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();

        let data = [9, 1, 2, 1, 33, 0];
        let entries = decoder.decode(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].num, 1);
        assert_eq!(entries[0].offset, 33);
    }

    #[test]
    fn test_decode_short_data() {
        let dict = decoder_dict(&[1, 2, 1], None, 3);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();
        let err = decoder.decode(&[1, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, Error::Xref(_)));
    }

    #[test]
    fn test_decoder_missing_w() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Size"), Object::Int(3));
        assert!(matches!(
            XrefStreamDecoder::from_dict(&dict),
            Err(Error::Xref(_))
        ));
    }

    #[test]
    fn test_decoder_wide_offsets() {
        // 5-byte offsets exercise the multi-byte big-endian read
        let dict = decoder_dict(&[1, 5, 2], None, 1);
        let decoder = XrefStreamDecoder::from_dict(&dict).unwrap();
        let data = [1, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x07];
        let entries = decoder.decode(&data).unwrap();
        assert_eq!(entries[0].offset, 0x0102030405);
        assert_eq!(entries[0].generation, 7);
    }
}

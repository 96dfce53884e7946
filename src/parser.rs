//! PDF object parser - recursive descent over the token stream
//!
//! Assembles `Object` values from lexer tokens: scalars, names, strings,
//! arrays, dictionaries, `N G R` references (two-token lookahead), and
//! indirect objects with stream payloads. Stream payloads are captured raw;
//! the declared /Length is trusted only when the bytes it names are followed
//! by `endstream`, otherwise the parser salvages by scanning for the
//! keyword.

use crate::error::{Error, Result};
use crate::lexer::{LexBuf, Lexer, Token};
use crate::object::{Array, Dict, Name, ObjRef, Object, PdfString};
use crate::xref::XrefEntry;

/// Containers nested deeper than this are treated as malformed input
const MAX_NESTING: usize = 100;

/// PDF parser over a complete input buffer
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    buf: LexBuf,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser at the start of a buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_at(data, 0)
    }

    /// Create a new parser positioned at a byte offset
    pub fn new_at(data: &'a [u8], pos: usize) -> Self {
        Self {
            lexer: Lexer::new_at(data, pos),
            buf: LexBuf::new(),
            depth: 0,
        }
    }

    /// Current cursor position
    pub fn pos(&self) -> usize {
        self.lexer.pos()
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.lexer.lex(&mut self.buf)
    }

    /// Consume the next token, requiring it to match
    pub fn expect_token(&mut self, expected: Token) -> Result<()> {
        let token = self.next_token()?;
        if token != expected {
            return Err(Error::parse(
                self.lexer.token_start(),
                format!("expected {:?}, got {:?}", expected, token),
            ));
        }
        Ok(())
    }

    /// Consume the next token, requiring an integer
    pub fn expect_int(&mut self) -> Result<i64> {
        let token = self.next_token()?;
        match token {
            Token::Int => Ok(self.buf.as_int()),
            _ => Err(Error::parse(
                self.lexer.token_start(),
                format!("expected integer, got {:?}", token),
            )),
        }
    }

    /// Parse the next object from the stream
    pub fn parse_object(&mut self) -> Result<Object> {
        let token = self.next_token()?;
        self.parse_from_token(token)
    }

    fn parse_from_token(&mut self, token: Token) -> Result<Object> {
        match token {
            Token::Null => Ok(Object::Null),
            Token::True => Ok(Object::Bool(true)),
            Token::False => Ok(Object::Bool(false)),
            Token::Real => Ok(Object::Real(self.buf.as_float())),
            Token::String => Ok(Object::String(PdfString::new(self.buf.bytes.clone()))),
            Token::Name => Ok(Object::Name(Name::new(self.buf.as_str()))),
            Token::OpenArray => self.parse_array(),
            Token::OpenDict => self.parse_dict(),
            Token::Int => {
                // `N G R` lookahead: two more ints and an R make a reference
                let num = self.buf.as_int();
                let save = self.lexer.pos();
                if let Some(r) = self.try_reference(num) {
                    return Ok(Object::Ref(r));
                }
                self.lexer.set_pos(save);
                Ok(Object::Int(num))
            }
            Token::Eof => Err(Error::parse(
                self.lexer.token_start(),
                "unexpected end of input",
            )),
            Token::Keyword => Err(Error::parse(
                self.lexer.token_start(),
                format!("unexpected keyword '{}'", self.buf.as_str()),
            )),
            other => Err(Error::parse(
                self.lexer.token_start(),
                format!("unexpected token {:?}", other),
            )),
        }
    }

    fn try_reference(&mut self, num: i64) -> Option<ObjRef> {
        if num < 0 || num > i32::MAX as i64 {
            return None;
        }
        let Ok(Token::Int) = self.lexer.lex(&mut self.buf) else {
            return None;
        };
        let generation = self.buf.as_int();
        if !(0..=i32::MAX as i64).contains(&generation) {
            return None;
        }
        let Ok(Token::R) = self.lexer.lex(&mut self.buf) else {
            return None;
        };
        Some(ObjRef::new(num as i32, generation as i32))
    }

    fn parse_array(&mut self) -> Result<Object> {
        let start = self.lexer.token_start();
        self.enter_container(start)?;
        let mut arr = Array::new();
        loop {
            let token = self.next_token()?;
            match token {
                Token::CloseArray => break,
                Token::Eof => return Err(Error::parse(start, "unterminated array")),
                _ => arr.push(self.parse_from_token(token)?),
            }
        }
        self.depth -= 1;
        Ok(Object::Array(arr))
    }

    fn parse_dict(&mut self) -> Result<Object> {
        let start = self.lexer.token_start();
        self.enter_container(start)?;
        let mut dict = Dict::new();
        loop {
            let token = self.next_token()?;
            match token {
                Token::CloseDict => break,
                Token::Name => {
                    let key = Name::new(self.buf.as_str());
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                }
                Token::Eof => return Err(Error::parse(start, "unterminated dictionary")),
                other => {
                    return Err(Error::parse(
                        self.lexer.token_start(),
                        format!("dictionary key must be a name, got {:?}", other),
                    ));
                }
            }
        }
        self.depth -= 1;
        Ok(Object::Dict(dict))
    }

    fn enter_container(&mut self, at: usize) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(Error::parse(at, "containers nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Parse an indirect object: `num gen obj <value> endobj`, with stream
    /// payload capture when the value is a stream dictionary.
    ///
    /// `resolve_length` is consulted when /Length is an indirect reference;
    /// returning `None` (or an inconsistent length) triggers the endstream
    /// salvage scan.
    pub fn parse_indirect_object(
        &mut self,
        mut resolve_length: impl FnMut(ObjRef) -> Option<i64>,
    ) -> Result<(i32, i32, Object)> {
        let obj_start = self.lexer.pos();
        let num = self.expect_int()?;
        let generation = self.expect_int()?;
        if num < 0 || num > i32::MAX as i64 || !(0..=i32::MAX as i64).contains(&generation) {
            return Err(Error::parse(obj_start, "object number out of range"));
        }
        self.expect_token(Token::Obj)?;

        let obj = self.parse_object()?;

        // A dictionary followed by `stream` carries a raw payload
        let save = self.lexer.pos();
        let next = self.next_token()?;
        if next == Token::Stream {
            let dict = match obj {
                Object::Dict(d) => d,
                _ => {
                    return Err(Error::parse(
                        self.lexer.token_start(),
                        "stream keyword not preceded by a dictionary",
                    ));
                }
            };
            let data = self.read_stream_payload(&dict, obj_start, &mut resolve_length)?;
            self.expect_token(Token::EndObj)?;
            return Ok((num as i32, generation as i32, Object::Stream { dict, data }));
        }
        self.lexer.set_pos(save);

        self.expect_token(Token::EndObj)?;
        Ok((num as i32, generation as i32, obj))
    }

    /// Capture the raw bytes between `stream` and `endstream`
    fn read_stream_payload(
        &mut self,
        dict: &Dict,
        obj_start: usize,
        resolve_length: &mut impl FnMut(ObjRef) -> Option<i64>,
    ) -> Result<Vec<u8>> {
        let data = self.lexer.data();

        // Single EOL after the `stream` keyword
        let mut start = self.lexer.pos();
        if data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if data.get(start) == Some(&b'\n') {
            start += 1;
        }

        let declared = match dict.get(&Name::new("Length")) {
            Some(Object::Int(n)) => Some(*n),
            Some(Object::Ref(r)) => resolve_length(*r),
            _ => None,
        };

        if let Some(len) = declared {
            if len >= 0 && start + len as usize <= data.len() {
                let end = start + len as usize;
                // The declared length is only trusted when endstream follows
                self.lexer.set_pos(end);
                if let Ok(Token::EndStream) = self.lexer.lex(&mut self.buf) {
                    return Ok(data[start..end].to_vec());
                }
            }
        }

        // Salvage: take everything up to the first endstream keyword
        let Some(found) = find_keyword(data, start, b"endstream") else {
            return Err(Error::parse(obj_start, "unterminated stream"));
        };
        log::warn!(
            "stream at byte {} has missing or inconsistent /Length, salvaged {} bytes by endstream scan",
            obj_start,
            found - start
        );
        let mut end = found;
        if end > start && data[end - 1] == b'\n' {
            end -= 1;
            if end > start && data[end - 1] == b'\r' {
                end -= 1;
            }
        } else if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
        self.lexer.set_pos(found);
        self.expect_token(Token::EndStream)?;
        Ok(data[start..end].to_vec())
    }

    /// Parse a classic xref section body: subsections of `offset gen n|f`
    /// records. The cursor must be just past the `xref` keyword; returns
    /// with the cursor at the `trailer` keyword.
    pub fn parse_xref(&mut self) -> Result<Vec<XrefEntry>> {
        let mut entries = Vec::new();
        loop {
            let save = self.lexer.pos();
            let token = self.next_token()?;
            match token {
                Token::Trailer => {
                    self.lexer.set_pos(save);
                    return Ok(entries);
                }
                Token::Int => {
                    let start_num = self.buf.as_int();
                    let count = self.expect_int()?;
                    if start_num < 0 || count < 0 || count > i32::MAX as i64 - start_num {
                        return Err(Error::parse(
                            self.lexer.token_start(),
                            "xref subsection out of range",
                        ));
                    }
                    for i in 0..count {
                        entries.push(self.parse_xref_record((start_num + i) as i32)?);
                    }
                }
                other => {
                    return Err(Error::parse(
                        self.lexer.token_start(),
                        format!("expected xref subsection or trailer, got {:?}", other),
                    ));
                }
            }
        }
    }

    fn parse_xref_record(&mut self, num: i32) -> Result<XrefEntry> {
        let offset = self.expect_int()?;
        let generation = self.expect_int()?;
        let token = self.next_token()?;
        let generation = if (0..=u16::MAX as i64).contains(&generation) {
            generation as u16
        } else {
            return Err(Error::parse(
                self.lexer.token_start(),
                "xref generation out of range",
            ));
        };
        match token {
            Token::Keyword if self.buf.as_str() == "n" => {
                Ok(XrefEntry::in_use(num, generation, offset))
            }
            Token::Keyword if self.buf.as_str() == "f" => Ok(XrefEntry::free(num, generation)),
            _ => Err(Error::parse(
                self.lexer.token_start(),
                "xref record must end with 'n' or 'f'",
            )),
        }
    }

    /// Parse a trailer dictionary; the cursor must be at the `trailer` keyword
    pub fn parse_trailer(&mut self) -> Result<Dict> {
        self.expect_token(Token::Trailer)?;
        match self.parse_object()? {
            Object::Dict(d) => Ok(d),
            _ => Err(Error::parse(
                self.lexer.token_start(),
                "trailer must be a dictionary",
            )),
        }
    }
}

/// Find a keyword's byte offset at or after `from`
pub(crate) fn find_keyword(data: &[u8], from: usize, keyword: &[u8]) -> Option<usize> {
    if from >= data.len() {
        return None;
    }
    data[from..]
        .windows(keyword.len())
        .position(|w| w == keyword)
        .map(|i| from + i)
}

/// Parse the `%PDF-X.Y` header, which must appear in the first 1KB
pub fn parse_header(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(1024)];
    let Some(at) = find_keyword(window, 0, b"%PDF-") else {
        return Err(Error::parse(0, "missing %PDF header"));
    };
    let version: String = data[at + 5..]
        .iter()
        .take(8)
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|b| *b as char)
        .collect();
    if version.is_empty() {
        return Err(Error::parse(at, "malformed %PDF header version"));
    }
    Ok(version)
}

//! PDF tokenizer - lexical analysis of PDF object syntax
//!
//! Produces one token per call from a byte cursor over the full file buffer.
//! Whitespace and comments are skipped silently. String payloads are byte
//! sequences, not text: escapes and hex pairs decode at lex time into the
//! shared scratch buffer.

use crate::error::{Error, Result};

/// PDF token types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// End of input
    Eof,
    /// '[' - start of array
    OpenArray,
    /// ']' - end of array
    CloseArray,
    /// '<<' - start of dictionary
    OpenDict,
    /// '>>' - end of dictionary
    CloseDict,
    /// Name (e.g., /Type)
    Name,
    /// Integer number
    Int,
    /// Real (floating point) number
    Real,
    /// String, either literal `(...)` or hex `<...>`
    String,
    /// Unrecognized bare keyword
    Keyword,
    /// 'R' - reference keyword
    R,
    /// 'true' boolean
    True,
    /// 'false' boolean
    False,
    /// 'null' value
    Null,
    /// 'obj' keyword
    Obj,
    /// 'endobj' keyword
    EndObj,
    /// 'stream' keyword
    Stream,
    /// 'endstream' keyword
    EndStream,
    /// 'xref' keyword
    Xref,
    /// 'trailer' keyword
    Trailer,
    /// 'startxref' keyword
    StartXref,
}

/// Reusable scratch buffer for token payloads
///
/// Names and keywords land in `buffer`; string payloads land in `bytes`
/// (PDF strings are arbitrary byte sequences and must not round-trip
/// through UTF-8).
#[derive(Debug)]
pub struct LexBuf {
    /// Text of the last name or keyword token
    pub buffer: String,
    /// Decoded payload of the last string token
    pub bytes: Vec<u8>,
    /// Value of the last integer token
    pub int_value: i64,
    /// Value of the last real token
    pub float_value: f64,
}

impl LexBuf {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
            bytes: Vec::with_capacity(capacity),
            int_value: 0,
            float_value: 0.0,
        }
    }

    /// Clear the buffer for reuse
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.bytes.clear();
        self.int_value = 0;
        self.float_value = 0.0;
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_int(&self) -> i64 {
        self.int_value
    }

    pub fn as_float(&self) -> f64 {
        self.float_value
    }
}

impl Default for LexBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// PDF lexer over a complete input buffer
///
/// The lexer owns the cursor; the parser saves and restores it through
/// `pos`/`set_pos` for lookahead and reads stream payloads directly from
/// `data` at the cursor.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer at the start of a buffer
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_at(data, 0)
    }

    /// Create a new lexer positioned at a byte offset
    pub fn new_at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            token_start: pos,
        }
    }

    /// Full input buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current cursor position
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor (used by the parser for lookahead restore)
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Byte offset where the last token began, for error reporting
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Get the next token
    pub fn lex(&mut self, buf: &mut LexBuf) -> Result<Token> {
        buf.clear();
        self.skip_whitespace_and_comments();
        self.token_start = self.pos;

        if self.is_eof() {
            return Ok(Token::Eof);
        }

        let ch = self.data[self.pos];
        match ch {
            b'[' => {
                self.pos += 1;
                Ok(Token::OpenArray)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::CloseArray)
            }
            b'<' => {
                self.pos += 1;
                if self.peek_eq(b'<') {
                    self.pos += 1;
                    Ok(Token::OpenDict)
                } else {
                    self.lex_hex_string(buf)
                }
            }
            b'>' => {
                self.pos += 1;
                if self.peek_eq(b'>') {
                    self.pos += 1;
                    Ok(Token::CloseDict)
                } else {
                    Err(Error::lex(self.token_start, "unexpected '>'"))
                }
            }
            b'/' => {
                self.pos += 1;
                self.lex_name(buf)
            }
            b'(' => {
                self.pos += 1;
                self.lex_string(buf)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.lex_number(buf),
            b')' | b'{' | b'}' => Err(Error::lex(
                self.token_start,
                format!("unexpected delimiter '{}'", ch as char),
            )),
            _ => self.lex_keyword(buf),
        }
    }

    /// Skip whitespace and `%` comments without emitting anything
    pub fn skip_whitespace_and_comments(&mut self) {
        while !self.is_eof() {
            match self.data[self.pos] {
                b'\x00' | b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' => {
                    self.pos += 1;
                }
                b'%' => {
                    // Comment runs to end of line
                    self.pos += 1;
                    while !self.is_eof()
                        && self.data[self.pos] != b'\n'
                        && self.data[self.pos] != b'\r'
                    {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_name(&mut self, buf: &mut LexBuf) -> Result<Token> {
        while !self.is_eof() {
            let ch = self.data[self.pos];
            if Self::is_delimiter(ch) || Self::is_whitespace(ch) {
                break;
            }
            if ch == b'#' {
                // #XX hex escape; a '#' not followed by two hex digits is
                // taken literally, matching common reader leniency
                let hi = self.data.get(self.pos + 1).copied();
                let lo = self.data.get(self.pos + 2).copied();
                if let (Some(hi), Some(lo)) = (hex_digit(hi), hex_digit(lo)) {
                    buf.buffer.push((hi * 16 + lo) as char);
                    self.pos += 3;
                    continue;
                }
            }
            buf.buffer.push(ch as char);
            self.pos += 1;
        }
        Ok(Token::Name)
    }

    fn lex_string(&mut self, buf: &mut LexBuf) -> Result<Token> {
        let start = self.token_start;
        let mut depth = 1;
        while !self.is_eof() {
            let ch = self.data[self.pos];
            self.pos += 1;

            match ch {
                b'(' => {
                    depth += 1;
                    buf.bytes.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Token::String);
                    }
                    buf.bytes.push(b')');
                }
                b'\\' => {
                    if self.is_eof() {
                        break;
                    }
                    let next = self.data[self.pos];
                    self.pos += 1;
                    match next {
                        b'n' => buf.bytes.push(b'\n'),
                        b'r' => buf.bytes.push(b'\r'),
                        b't' => buf.bytes.push(b'\t'),
                        b'b' => buf.bytes.push(b'\x08'),
                        b'f' => buf.bytes.push(b'\x0C'),
                        b'(' => buf.bytes.push(b'('),
                        b')' => buf.bytes.push(b')'),
                        b'\\' => buf.bytes.push(b'\\'),
                        b'0'..=b'7' => {
                            // Octal escape, up to three digits, high bits dropped
                            let mut octal = (next - b'0') as u32;
                            for _ in 0..2 {
                                match self.data.get(self.pos) {
                                    Some(d @ b'0'..=b'7') => {
                                        octal = octal * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            buf.bytes.push((octal & 0xFF) as u8);
                        }
                        b'\r' => {
                            // Line continuation
                            if self.peek_eq(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        _ => buf.bytes.push(next),
                    }
                }
                b'\r' => {
                    // Unescaped EOL inside a string reads as a single LF
                    if self.peek_eq(b'\n') {
                        self.pos += 1;
                    }
                    buf.bytes.push(b'\n');
                }
                _ => buf.bytes.push(ch),
            }
        }
        Err(Error::lex(start, "unterminated literal string"))
    }

    fn lex_hex_string(&mut self, buf: &mut LexBuf) -> Result<Token> {
        let start = self.token_start;
        let mut pending: Option<u8> = None;
        while !self.is_eof() {
            let ch = self.data[self.pos];
            self.pos += 1;
            if ch == b'>' {
                // Odd digit count pads the final byte with 0
                if let Some(hi) = pending {
                    buf.bytes.push(hi * 16);
                }
                return Ok(Token::String);
            }
            if Self::is_whitespace(ch) {
                continue;
            }
            match hex_digit(Some(ch)) {
                Some(digit) => match pending.take() {
                    Some(hi) => buf.bytes.push(hi * 16 + digit),
                    None => pending = Some(digit),
                },
                None => {
                    return Err(Error::lex(
                        self.pos - 1,
                        format!("invalid hex digit '{}'", ch as char),
                    ));
                }
            }
        }
        Err(Error::lex(start, "unterminated hex string"))
    }

    fn lex_number(&mut self, buf: &mut LexBuf) -> Result<Token> {
        let start = self.pos;
        let mut is_real = false;

        if self.peek_eq(b'+') || self.peek_eq(b'-') {
            buf.buffer.push(self.data[self.pos] as char);
            self.pos += 1;
        }

        while !self.is_eof() && self.data[self.pos].is_ascii_digit() {
            buf.buffer.push(self.data[self.pos] as char);
            self.pos += 1;
        }

        if !self.is_eof() && self.data[self.pos] == b'.' {
            is_real = true;
            buf.buffer.push('.');
            self.pos += 1;

            while !self.is_eof() && self.data[self.pos].is_ascii_digit() {
                buf.buffer.push(self.data[self.pos] as char);
                self.pos += 1;
            }
        }

        if is_real {
            buf.float_value = buf
                .buffer
                .parse()
                .map_err(|_| Error::lex(start, format!("invalid real '{}'", buf.buffer)))?;
            Ok(Token::Real)
        } else {
            buf.int_value = buf
                .buffer
                .parse()
                .map_err(|_| Error::lex(start, format!("invalid integer '{}'", buf.buffer)))?;
            Ok(Token::Int)
        }
    }

    fn lex_keyword(&mut self, buf: &mut LexBuf) -> Result<Token> {
        while !self.is_eof() {
            let ch = self.data[self.pos];
            if Self::is_delimiter(ch) || Self::is_whitespace(ch) {
                break;
            }
            buf.buffer.push(ch as char);
            self.pos += 1;
        }

        match buf.buffer.as_str() {
            "R" => Ok(Token::R),
            "true" => Ok(Token::True),
            "false" => Ok(Token::False),
            "null" => Ok(Token::Null),
            "obj" => Ok(Token::Obj),
            "endobj" => Ok(Token::EndObj),
            "stream" => Ok(Token::Stream),
            "endstream" => Ok(Token::EndStream),
            "xref" => Ok(Token::Xref),
            "trailer" => Ok(Token::Trailer),
            "startxref" => Ok(Token::StartXref),
            _ => Ok(Token::Keyword),
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek_eq(&self, ch: u8) -> bool {
        self.pos < self.data.len() && self.data[self.pos] == ch
    }

    /// PDF delimiter characters
    pub fn is_delimiter(ch: u8) -> bool {
        matches!(
            ch,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    /// PDF whitespace characters
    pub fn is_whitespace(ch: u8) -> bool {
        matches!(ch, b'\x00' | b' ' | b'\t' | b'\r' | b'\n' | b'\x0C')
    }

    /// Regular characters: anything that is neither whitespace nor delimiter
    pub fn is_regular(ch: u8) -> bool {
        !Self::is_delimiter(ch) && !Self::is_whitespace(ch)
    }
}

fn hex_digit(ch: Option<u8>) -> Option<u8> {
    match ch? {
        d @ b'0'..=b'9' => Some(d - b'0'),
        d @ b'a'..=b'f' => Some(d - b'a' + 10),
        d @ b'A'..=b'F' => Some(d - b'A' + 10),
        _ => None,
    }
}

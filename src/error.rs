//! Error handling for pdfweld

use std::io;
use thiserror::Error;

/// The main error type for pdfweld operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("lex error at byte {offset}: {msg}")]
    Lex { offset: usize, msg: String },
    #[error("parse error at byte {offset}: {msg}")]
    Parse { offset: usize, msg: String },
    #[error("xref error: {0}")]
    Xref(String),
    #[error("dangling reference: {num} {generation} R")]
    DanglingReference { num: i32, generation: i32 },
    #[error("document has no page tree")]
    MissingPageTree,
    #[error("no pages to merge")]
    EmptyInput,
    #[error("document is encrypted")]
    EncryptedDocument,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("write error: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
    #[error("{name}: {source}")]
    Input {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn lex<S: Into<String>>(offset: usize, msg: S) -> Self {
        Error::Lex {
            offset,
            msg: msg.into(),
        }
    }
    pub fn parse<S: Into<String>>(offset: usize, msg: S) -> Self {
        Error::Parse {
            offset,
            msg: msg.into(),
        }
    }
    pub fn xref<S: Into<String>>(msg: S) -> Self {
        Error::Xref(msg.into())
    }
    pub fn dangling(num: i32, generation: i32) -> Self {
        Error::DanglingReference { num, generation }
    }
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        Error::InternalInvariant(msg.into())
    }

    /// Tag an I/O error as a sink failure during serialization.
    pub fn write(source: io::Error) -> Self {
        Error::Write { source }
    }

    /// Wrap an error with the identity of the input it came from.
    pub fn in_input<S: Into<String>>(name: S, source: Error) -> Self {
        Error::Input {
            name: name.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

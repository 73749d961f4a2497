//! Error types for the marginalia PDF extraction library.

use thiserror::Error;

/// Primary error type for PDF parsing and extraction operations.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("syntax error at position {pos}: {msg}")]
    Syntax { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("structure nested deeper than {0} levels")]
    StructureTooDeep(usize),

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("no valid xref table found")]
    NoValidXRef,

    #[error("document is encrypted; extraction denied")]
    ExtractionDenied,

    #[error("page has a degenerate media box")]
    DegeneratePage,

    #[error("unsupported stream filter: {0}")]
    UnsupportedFilter(String),

    #[error("named destination not found: {0}")]
    DestinationNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;

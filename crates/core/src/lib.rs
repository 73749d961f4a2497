//! marginalia - PDF link, rich-media, comment, and outline extraction.
//!
//! Built for digital-publication pipelines: given a PDF, produce a JSON
//! report of link annotations (internal bookmarks and external URLs),
//! embedded rich-media assets, `[[`-marked annotator comments found in the
//! page text, and the document outline. Geometry comes out as fractions of
//! the page size, measured from the top-left corner, so overlays survive
//! any rendering resolution.
//!
//! The PDF structural machinery is in-tree and deliberately minimal: a
//! lexer, an object parser, a cross-reference resolver (classic tables and
//! xref/object streams), a materialized page index, and a restricted
//! content-stream interpreter that recovers text-run bounding boxes.
//!
//! ```no_run
//! let extraction = marginalia_core::extract_file("book.pdf")?;
//! println!("{}", extraction.report.to_json(false)?);
//! # Ok::<(), marginalia_core::PdfError>(())
//! ```

pub mod codec;
pub mod document;
pub mod error;
pub mod extract;
pub mod interp;
pub mod model;
pub mod parser;
pub mod utils;

pub use document::{Document, OutlineEntry, Page};
pub use error::{PdfError, Result};
pub use extract::{DocumentReport, Extraction, PageReport, Section};
pub use model::{Dict, ObjRef, PdfObject, PdfStream};

use std::path::Path;

/// Open a PDF file and extract its full report.
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    let doc = Document::open(path)?;
    Extraction::build(&doc)
}

/// Extract a full report from in-memory PDF data.
pub fn extract_bytes(data: &[u8]) -> Result<Extraction> {
    let doc = Document::new(data)?;
    Extraction::build(&doc)
}

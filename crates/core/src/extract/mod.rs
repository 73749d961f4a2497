//! Extraction of links, rich media, comments, and the assembled report.

pub mod annots;
pub mod comments;
pub mod report;

pub use annots::{Diagnostic, LinkAnnot, LinkTarget, MediaAnnot, PageAnnotations};
pub use comments::Comment;
pub use report::{
    DestValue, DocumentReport, Extraction, LinkMeta, MediaAsset, PageItem, PageReport, Section,
};

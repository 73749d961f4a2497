//! PDF object model.

pub mod objects;

pub use objects::{Dict, ObjRef, PdfObject, PdfStream, require, safe_num, safe_rect};

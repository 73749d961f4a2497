//! Annotation classification: links, bookmarks, and rich media.

use crate::document::{Document, Page};
use crate::error::{PdfError, Result};
use crate::model::{Dict, PdfObject, require, safe_rect};
use crate::utils::{Rect, decode_text, quote_plus};

/// Characters left unescaped when encoding link URIs.
const URI_SAFE: &str = ":/?=&#;";

/// Where a link annotation points.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// Internal destination: 0-based page index.
    Page(usize),
    /// External destination: percent-encoded URI.
    Uri(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnnot {
    /// Raw /Rect in PDF space; page rotation is not applied.
    pub rect: Rect,
    pub target: LinkTarget,
}

#[derive(Debug, Clone)]
pub struct MediaAnnot {
    pub rect: Rect,
    /// Filename declared by the embedded file specification.
    pub filename: String,
    /// Decoded asset bytes.
    pub data: Vec<u8>,
}

/// A recovered per-item failure. Extraction carries on; these make the
/// skipped work observable.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based page number.
    pub page: usize,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct PageAnnotations {
    pub links: Vec<LinkAnnot>,
    pub media: Vec<MediaAnnot>,
    pub skipped: Vec<Diagnostic>,
}

enum Outcome {
    Link(LinkAnnot),
    Media(MediaAnnot),
    Skip(String),
}

/// Classify every annotation on a page. One annotation's failure never
/// aborts its siblings: it is recorded and the loop continues.
pub fn extract_annotations(doc: &Document, page: &Page) -> PageAnnotations {
    let mut result = PageAnnotations::default();
    let page_no = page.index + 1;

    let Some(annots_obj) = &page.annots else {
        return result;
    };
    let annots = match doc.resolve(annots_obj) {
        Ok(a) => a,
        Err(e) => {
            log::warn!("page {page_no}: unresolvable /Annots: {e}");
            result.skipped.push(Diagnostic {
                page: page_no,
                detail: format!("unresolvable /Annots: {e}"),
            });
            return result;
        }
    };
    let entries = match annots.as_array() {
        Ok(arr) => arr,
        Err(e) => {
            result.skipped.push(Diagnostic {
                page: page_no,
                detail: format!("/Annots is not an array: {e}"),
            });
            return result;
        }
    };

    for entry in entries {
        match classify(doc, entry) {
            Ok(Outcome::Link(link)) => result.links.push(link),
            Ok(Outcome::Media(media)) => result.media.push(media),
            Ok(Outcome::Skip(reason)) => {
                log::warn!("page {page_no}: skipping annotation: {reason}");
                result.skipped.push(Diagnostic {
                    page: page_no,
                    detail: reason,
                });
            }
            Err(e) => {
                log::warn!("page {page_no}: skipping annotation: {e}");
                result.skipped.push(Diagnostic {
                    page: page_no,
                    detail: e.to_string(),
                });
            }
        }
    }

    result
}

fn classify(doc: &Document, entry: &PdfObject) -> Result<Outcome> {
    let annot = doc.resolve(entry)?;
    let dict = annot.as_dict()?;
    let subtype_obj = doc.resolve(require(dict, "Subtype")?)?;
    let subtype = subtype_obj.as_name()?;

    match subtype {
        "Link" => classify_link(doc, dict),
        "RichMedia" => classify_media(doc, dict),
        other => Ok(Outcome::Skip(format!(
            "unrecognized annotation subtype: {other}"
        ))),
    }
}

fn classify_link(doc: &Document, dict: &Dict) -> Result<Outcome> {
    let Some(action_obj) = dict.get("A") else {
        return Ok(Outcome::Skip("link annotation without an action".into()));
    };
    let rect = annot_rect(doc, dict)?;
    let action = doc.resolve(action_obj)?;
    let action = action.as_dict()?;

    if let Some(dest) = action.get("D") {
        return match doc.dest_page_index(dest) {
            Some(index) => Ok(Outcome::Link(LinkAnnot {
                rect,
                target: LinkTarget::Page(index),
            })),
            None => Ok(Outcome::Skip(
                "bookmark destination matches no page".into(),
            )),
        };
    }

    if let Some(uri_obj) = action.get("URI") {
        let uri = doc.resolve(uri_obj)?;
        let encoded = quote_plus(uri.as_str()?, URI_SAFE);
        return Ok(Outcome::Link(LinkAnnot {
            rect,
            target: LinkTarget::Uri(encoded),
        }));
    }

    Ok(Outcome::Skip("link action carries neither /D nor /URI".into()))
}

/// Pull the embedded asset out of a RichMedia annotation:
/// /RichMediaContent/Assets/Names[1]/EF/F holds the file stream, keyed by
/// the filename in /F.
fn classify_media(doc: &Document, dict: &Dict) -> Result<Outcome> {
    let rect = annot_rect(doc, dict)?;

    let content = doc.resolve(require(dict, "RichMediaContent")?)?;
    let assets = doc.resolve(require(content.as_dict()?, "Assets")?)?;
    let names = doc.resolve(require(assets.as_dict()?, "Names")?)?;
    let names = names.as_array()?;
    let spec_obj = names
        .get(1)
        .ok_or_else(|| PdfError::KeyError("Names[1]".into()))?;
    let spec = doc.resolve(spec_obj)?;
    let spec = spec.as_dict()?;

    let name_obj = doc.resolve(require(spec, "F")?)?;
    let filename = decode_text(name_obj.as_str()?);

    let ef = doc.resolve(require(spec, "EF")?)?;
    let file_obj = doc.resolve(require(ef.as_dict()?, "F")?)?;
    let stream = file_obj.as_stream()?;
    // An unsupported filter skips this asset, not the page.
    let data = doc.decode_stream(stream)?;

    Ok(Outcome::Media(MediaAnnot {
        rect,
        filename,
        data,
    }))
}

fn annot_rect(doc: &Document, dict: &Dict) -> Result<Rect> {
    let rect_obj = doc.resolve(require(dict, "Rect")?)?;
    safe_rect(&rect_obj).ok_or(PdfError::TypeError {
        expected: "rectangle",
        got: "malformed /Rect",
    })
}

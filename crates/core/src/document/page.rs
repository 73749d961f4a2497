//! Materialized page list and page attributes.

use super::catalog::Document;
use crate::error::Result;
use crate::model::{Dict, PdfObject};
use crate::utils::Rect;
use std::collections::HashSet;
use std::sync::Arc;

/// Default media box (US Letter) for pages whose inheritance chain never
/// defines one.
const DEFAULT_MEDIABOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Attributes a page inherits from the nearest ancestor that defines them.
#[derive(Debug)]
struct InheritedNode {
    parent: Option<Arc<InheritedNode>>,
    resources: Option<PdfObject>,
    mediabox: Option<PdfObject>,
    cropbox: Option<PdfObject>,
    rotate: Option<PdfObject>,
}

impl InheritedNode {
    fn from_dict(parent: Option<Arc<InheritedNode>>, dict: &Dict) -> Arc<Self> {
        Arc::new(Self {
            parent,
            resources: dict.get("Resources").cloned(),
            mediabox: dict.get("MediaBox").cloned(),
            cropbox: dict.get("CropBox").cloned(),
            rotate: dict.get("Rotate").cloned(),
        })
    }

    fn resources(&self) -> Option<&PdfObject> {
        self.resources
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.resources()))
    }

    fn mediabox(&self) -> Option<&PdfObject> {
        self.mediabox
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.mediabox()))
    }

    fn cropbox(&self) -> Option<&PdfObject> {
        self.cropbox
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.cropbox()))
    }

    fn rotate(&self) -> Option<&PdfObject> {
        self.rotate
            .as_ref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.rotate()))
    }

    /// Fill attributes the page dict itself does not define.
    fn apply_to(&self, dest: &mut Dict) {
        let inherited = [
            ("Resources", self.resources()),
            ("MediaBox", self.mediabox()),
            ("CropBox", self.cropbox()),
            ("Rotate", self.rotate()),
        ];
        for (key, val) in inherited {
            if !dest.contains_key(key)
                && let Some(val) = val
            {
                dest.insert(key.to_string(), val.clone());
            }
        }
    }
}

/// Location of one leaf page plus its inherited attributes.
#[derive(Debug, Clone)]
pub struct PageRef {
    objid: u32,
    inherited: Option<Arc<InheritedNode>>,
}

/// The materialized page list: one pre-order walk of the `/Pages` tree at
/// document open, indexable ever after. Re-walking the tree is never needed.
#[derive(Debug, Default)]
pub struct PageIndex {
    pages: Vec<PageRef>,
}

impl PageIndex {
    pub(crate) fn new(doc: &Document) -> Self {
        Self {
            pages: Self::collect(doc),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&PageRef> {
        self.pages.get(index)
    }

    pub(crate) fn objid_at(&self, index: usize) -> Option<u32> {
        self.pages.get(index).map(|p| p.objid)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn collect(doc: &Document) -> Vec<PageRef> {
        let mut pages = Vec::new();
        let Some(pages_obj) = doc.catalog().get("Pages") else {
            return pages;
        };
        let Ok(root) = pages_obj.as_reference() else {
            return pages;
        };

        let mut stack: Vec<(u32, Option<Arc<InheritedNode>>)> = vec![(root.objid, None)];
        let mut visited = HashSet::new();

        while let Some((objid, parent)) = stack.pop() {
            if !visited.insert(objid) {
                continue;
            }
            let Ok(obj) = doc.getobj_shared(objid) else {
                continue;
            };
            let Ok(dict) = obj.as_dict() else {
                continue;
            };

            match dict.get("Type") {
                Some(PdfObject::Name(name)) if name == "Pages" => {
                    let inherited = InheritedNode::from_dict(parent, dict);
                    if let Some(kids) = dict.get("Kids")
                        && let Ok(kids) = doc.resolve(kids)
                        && let Ok(kids_arr) = kids.as_array()
                    {
                        // Reverse push keeps document order on the stack.
                        for kid in kids_arr.iter().rev() {
                            if let Ok(kid_ref) = kid.as_reference() {
                                stack.push((kid_ref.objid, Some(Arc::clone(&inherited))));
                            }
                        }
                    }
                }
                Some(PdfObject::Name(name)) if name == "Page" => {
                    pages.push(PageRef {
                        objid,
                        inherited: parent,
                    });
                }
                _ => {}
            }
        }

        pages
    }
}

/// One page of an open document. Read-only after construction.
#[derive(Debug)]
pub struct Page {
    /// 0-based position in the page list.
    pub index: usize,
    /// The page object's id.
    pub objid: u32,
    /// Effective media box (own or inherited): x0, y0, x1, y1.
    pub mediabox: [f64; 4],
    /// The raw /Annots entry, unresolved.
    pub annots: Option<PdfObject>,
    attrs: Dict,
}

impl Page {
    pub(crate) fn build(doc: &Document, index: usize, page_ref: &PageRef) -> Result<Self> {
        let obj = doc.getobj_shared(page_ref.objid)?;
        let dict = obj.as_dict()?;
        let mut attrs = dict.clone();
        if let Some(inherited) = &page_ref.inherited {
            inherited.apply_to(&mut attrs);
        }

        let mediabox = Self::parse_box(&attrs, "MediaBox", doc).unwrap_or_else(|| {
            log::warn!(
                "page {} has no media box anywhere in its tree, assuming letter size",
                index + 1
            );
            DEFAULT_MEDIABOX
        });
        let annots = attrs.get("Annots").cloned();

        Ok(Self {
            index,
            objid: page_ref.objid,
            mediabox,
            annots,
            attrs,
        })
    }

    /// Media box as a rect tuple.
    pub fn media_rect(&self) -> Rect {
        let [x0, y0, x1, y1] = self.mediabox;
        (x0, y0, x1, y1)
    }

    /// Decoded content streams, in order. A page's /Contents may be one
    /// stream or an array of streams; undecodable streams are skipped.
    pub fn contents(&self, doc: &Document) -> Vec<Vec<u8>> {
        let Some(contents_obj) = self.attrs.get("Contents") else {
            return Vec::new();
        };
        let Ok(resolved) = doc.resolve(contents_obj) else {
            return Vec::new();
        };

        match resolved.as_ref() {
            PdfObject::Stream(stream) => match doc.decode_stream(stream) {
                Ok(data) => vec![data],
                Err(e) => {
                    log::warn!("page {}: undecodable content stream: {e}", self.index + 1);
                    Vec::new()
                }
            },
            PdfObject::Array(arr) => arr
                .iter()
                .filter_map(|item| {
                    let obj = doc.resolve(item).ok()?;
                    let stream = obj.as_stream().ok()?;
                    match doc.decode_stream(stream) {
                        Ok(data) => Some(data),
                        Err(e) => {
                            log::warn!(
                                "page {}: undecodable content stream: {e}",
                                self.index + 1
                            );
                            None
                        }
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn parse_box(attrs: &Dict, key: &str, doc: &Document) -> Option<[f64; 4]> {
        let obj = attrs.get(key)?;
        let resolved = doc.resolve(obj).ok()?;
        let arr = resolved.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        Some([
            arr[0].as_num().ok()?,
            arr[1].as_num().ok()?,
            arr[2].as_num().ok()?,
            arr[3].as_num().ok()?,
        ])
    }
}

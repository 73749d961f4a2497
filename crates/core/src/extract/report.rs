//! Report assembly: per-page item lists, link metadata, outline sections.

use crate::document::Document;
use crate::error::Result;
use crate::extract::annots::{self, Diagnostic, LinkTarget, PageAnnotations};
use crate::extract::comments;
use crate::interp::LayoutInterpreter;
use crate::utils::{NormalizedRect, normalize_rect};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

/// One entry in a page's item list. Items keep the fixed order media →
/// links → comments within a page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PageItem {
    Media {
        rect: NormalizedRect,
        #[serde(rename = "type")]
        kind: &'static str,
        filename: String,
    },
    Link {
        rect: NormalizedRect,
        #[serde(rename = "type")]
        kind: &'static str,
        dest: DestValue,
    },
    Comment {
        rect: NormalizedRect,
        comment: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DestValue {
    /// 1-based target page number.
    Page(u32),
    Url(String),
}

/// Link metadata, parallel to the links portion of the item list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum LinkMeta {
    Bookmark {
        /// 1-based target page number, as a string.
        dest_page: String,
        x: f64,
        y: f64,
        height: f64,
        width: f64,
    },
    External {
        url: String,
        x: f64,
        y: f64,
        height: f64,
        width: f64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub pgno: u32,
    pub pgwidth: f64,
    pub pgheight: f64,
    pub links_metadata: Vec<LinkMeta>,
    pub pg: Vec<PageItem>,
}

/// An outline entry that resolved to a page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Section {
    pub name: String,
    /// 1-based page number.
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    pub pages: Vec<PageReport>,
    pub sections: Vec<Section>,
}

impl DocumentReport {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

/// A rich-media payload extracted alongside the report.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub filename: String,
    pub data: Vec<u8>,
}

/// The full result of extracting a document: the report itself, the
/// rich-media payloads, and every recovered per-item failure.
#[derive(Debug)]
pub struct Extraction {
    pub report: DocumentReport,
    pub assets: Vec<MediaAsset>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// Extract the whole document. Pages share no mutable state once the
    /// document is open, so multi-page documents fan out over rayon.
    pub fn build(doc: &Document) -> Result<Self> {
        let count = doc.page_count();

        let results: Vec<PageOutput> = if count > 1 {
            (0..count)
                .into_par_iter()
                .map(|i| extract_page(doc, i))
                .collect()
        } else {
            (0..count).map(|i| extract_page(doc, i)).collect()
        };

        let mut pages = Vec::with_capacity(count);
        let mut assets = Vec::new();
        let mut diagnostics = Vec::new();
        for output in results {
            pages.push(output.report);
            assets.extend(output.assets);
            diagnostics.extend(output.diagnostics);
        }

        let sections = doc
            .outline()
            .into_iter()
            .map(|entry| Section {
                name: entry.title,
                page: (entry.page_index + 1) as u32,
            })
            .collect();

        Ok(Self {
            report: DocumentReport {
                page_count: count as u32,
                pages,
                sections,
            },
            assets,
            diagnostics,
        })
    }

    /// Write every rich-media asset into `dir`, named by its embedded
    /// filename (path components are stripped).
    pub fn save_assets<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for asset in &self.assets {
            let name = Path::new(&asset.filename)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "asset".to_string());
            std::fs::write(dir.join(name), &asset.data)?;
        }
        Ok(())
    }
}

struct PageOutput {
    report: PageReport,
    assets: Vec<MediaAsset>,
    diagnostics: Vec<Diagnostic>,
}

fn extract_page(doc: &Document, index: usize) -> PageOutput {
    let pgno = (index + 1) as u32;
    let mut diagnostics = Vec::new();

    let page = match doc.page(index) {
        Ok(page) => page,
        Err(e) => {
            log::warn!("page {pgno}: {e}");
            diagnostics.push(Diagnostic {
                page: index + 1,
                detail: e.to_string(),
            });
            return PageOutput {
                report: PageReport {
                    pgno,
                    pgwidth: 0.0,
                    pgheight: 0.0,
                    links_metadata: Vec::new(),
                    pg: Vec::new(),
                },
                assets: Vec::new(),
                diagnostics,
            };
        }
    };

    let pagebox = page.media_rect();
    let pgwidth = (pagebox.0 - pagebox.2).abs().round();
    let pgheight = (pagebox.1 - pagebox.3).abs().round();

    let PageAnnotations {
        links,
        media,
        skipped,
    } = annots::extract_annotations(doc, &page);
    diagnostics.extend(skipped);

    let mut items = Vec::new();
    let mut links_metadata = Vec::new();
    let mut assets = Vec::new();

    for m in media {
        match normalize_rect(m.rect, pagebox) {
            Ok(rect) => {
                items.push(PageItem::Media {
                    rect,
                    kind: "media",
                    filename: m.filename.clone(),
                });
                assets.push(MediaAsset {
                    filename: m.filename,
                    data: m.data,
                });
            }
            Err(e) => diagnostics.push(Diagnostic {
                page: index + 1,
                detail: format!("media annotation dropped: {e}"),
            }),
        }
    }

    for link in links {
        let rect = match normalize_rect(link.rect, pagebox) {
            Ok(rect) => rect,
            Err(e) => {
                diagnostics.push(Diagnostic {
                    page: index + 1,
                    detail: format!("link annotation dropped: {e}"),
                });
                continue;
            }
        };
        match link.target {
            LinkTarget::Page(target_index) => {
                let dest = (target_index + 1) as u32;
                items.push(PageItem::Link {
                    rect,
                    kind: "bookmark",
                    dest: DestValue::Page(dest),
                });
                links_metadata.push(LinkMeta::Bookmark {
                    dest_page: dest.to_string(),
                    x: rect.x,
                    y: rect.y,
                    height: rect.height,
                    width: rect.width,
                });
            }
            LinkTarget::Uri(url) => {
                items.push(PageItem::Link {
                    rect,
                    kind: "link",
                    dest: DestValue::Url(url.clone()),
                });
                links_metadata.push(LinkMeta::External {
                    url,
                    x: rect.x,
                    y: rect.y,
                    height: rect.height,
                    width: rect.width,
                });
            }
        }
    }

    match LayoutInterpreter::process(&page.contents(doc)) {
        Ok(layout) => {
            for comment in comments::find_bracketed_comments(&layout) {
                match normalize_rect(comment.rect, pagebox) {
                    Ok(rect) => items.push(PageItem::Comment {
                        rect,
                        comment: comment.text,
                    }),
                    Err(e) => diagnostics.push(Diagnostic {
                        page: index + 1,
                        detail: format!("comment dropped: {e}"),
                    }),
                }
            }
        }
        Err(e) => {
            log::warn!("page {pgno}: content stream not interpretable: {e}");
            diagnostics.push(Diagnostic {
                page: index + 1,
                detail: format!("content stream not interpretable: {e}"),
            });
        }
    }

    PageOutput {
        report: PageReport {
            pgno,
            pgwidth,
            pgheight,
            links_metadata,
            pg: items,
        },
        assets,
        diagnostics,
    }
}

//! End-to-end extraction tests: links, bookmarks, rich media, comments,
//! and the assembled report shape.

mod common;

use common::{PdfBuilder, zlib_compress};
use marginalia_core::extract::{DestValue, LinkMeta, PageItem};
use marginalia_core::{Document, Extraction};

/// The canonical three-page fixture: an internal link on page 1 targeting
/// page 2, nothing on page 2, an external link on page 3.
fn three_page_pdf() -> Vec<u8> {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(
            2,
            "<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 /MediaBox [0 0 612 792] >>",
        )
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /Annots [6 0 R] >>",
        )
        .object(4, "<< /Type /Page /Parent 2 0 R >>")
        .object(
            5,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 768 1024] /Annots [7 0 R] >>",
        )
        .object(
            6,
            "<< /Type /Annot /Subtype /Link /Rect [34 362 380 34] \
             /A << /S /GoTo /D [4 0 R /Fit] >> >>",
        )
        .object(
            7,
            "<< /Type /Annot /Subtype /Link /Rect [82 929 686 610] \
             /A << /S /URI /URI (http://www.10layer.com) >> >>",
        );
    b.finish(1)
}

#[test]
fn three_page_report() {
    let doc = Document::new(three_page_pdf()).unwrap();
    let extraction = Extraction::build(&doc).unwrap();
    let report = &extraction.report;

    assert_eq!(report.page_count, 3);
    assert_eq!(report.pages.len(), 3);
    assert!(extraction.diagnostics.is_empty());

    // Page 1: one bookmark to page 2.
    let page1 = &report.pages[0];
    assert_eq!(page1.pgno, 1);
    assert_eq!(page1.pgwidth, 612.0);
    assert_eq!(page1.pgheight, 792.0);
    assert_eq!(page1.pg.len(), 1);
    match &page1.pg[0] {
        PageItem::Link { kind, dest, rect } => {
            assert_eq!(*kind, "bookmark");
            assert_eq!(*dest, DestValue::Page(2));
            assert_eq!(rect.x, 34.0 / 612.0);
            assert_eq!(rect.y, (792.0 - 362.0) / 792.0);
            assert_eq!(rect.width, (380.0 - 34.0) / 612.0);
            assert_eq!(rect.height, (362.0 - 34.0) / 792.0);
        }
        other => panic!("unexpected item: {other:?}"),
    }
    match &page1.links_metadata[0] {
        LinkMeta::Bookmark { dest_page, .. } => assert_eq!(dest_page, "2"),
        other => panic!("unexpected metadata: {other:?}"),
    }

    // Page 2: nothing.
    assert!(report.pages[1].pg.is_empty());
    assert!(report.pages[1].links_metadata.is_empty());

    // Page 3: the external link, URI unchanged (already within the safe set).
    match &report.pages[2].links_metadata[0] {
        LinkMeta::External { url, .. } => assert_eq!(url, "http://www.10layer.com"),
        other => panic!("unexpected metadata: {other:?}"),
    }
}

#[test]
fn report_wire_format() {
    let doc = Document::new(three_page_pdf()).unwrap();
    let extraction = Extraction::build(&doc).unwrap();
    let value = serde_json::to_value(&extraction.report).unwrap();

    assert_eq!(value["pageCount"], 3);
    assert_eq!(value["pages"][0]["pgno"], 1);
    assert_eq!(value["pages"][0]["pg"][0]["type"], "bookmark");
    assert_eq!(value["pages"][0]["pg"][0]["dest"], 2);
    assert_eq!(value["pages"][0]["links_metadata"][0]["dest_page"], "2");
    assert_eq!(
        value["pages"][2]["links_metadata"][0]["url"],
        "http://www.10layer.com"
    );
    assert_eq!(value["sections"], serde_json::json!([]));
}

#[test]
fn unknown_subtype_skips_without_aborting_siblings() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R 5 0 R 6 0 R] >>")
        .object(
            4,
            "<< /Type /Annot /Subtype /Square /Rect [0 0 10 10] >>",
        )
        // A broken annotation (unresolvable) in the middle.
        .object(5, "<< /Type /Annot >>")
        .object(
            6,
            "<< /Type /Annot /Subtype /Link /Rect [0 0 10 10] \
             /A << /S /URI /URI (http://example.com) >> >>",
        );
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    let page = &extraction.report.pages[0];
    assert_eq!(page.pg.len(), 1);
    assert_eq!(page.links_metadata.len(), 1);
    assert_eq!(extraction.diagnostics.len(), 2);
    assert!(
        extraction
            .diagnostics
            .iter()
            .any(|d| d.detail.contains("unrecognized annotation subtype"))
    );
}

#[test]
fn uri_gets_percent_encoded() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R] >>")
        .object(
            4,
            "<< /Type /Annot /Subtype /Link /Rect [0 0 10 10] \
             /A << /S /URI /URI (http://example.com/a b?q=1&r=2) >> >>",
        );
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    match &extraction.report.pages[0].links_metadata[0] {
        LinkMeta::External { url, .. } => {
            assert_eq!(url, "http://example.com/a+b?q=1&r=2");
        }
        other => panic!("unexpected metadata: {other:?}"),
    }
}

#[test]
fn bracketed_comment_text_is_stripped() {
    let content = b"BT /F1 12 Tf 100 700 Td (foo[[bar]]baz) Tj ET";
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>",
        )
        .stream_object(4, "", content);
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    let page = &extraction.report.pages[0];
    assert_eq!(page.pg.len(), 1);
    match &page.pg[0] {
        PageItem::Comment { comment, .. } => {
            assert_eq!(comment, "foobarbaz");
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn comment_on_a_drawn_box_reports_the_box() {
    // A filled rectangle behind the comment text, top edge below the text's
    // top: the containment heuristic picks the rectangle.
    let content = b"50 650 300 60 re f BT /F1 12 Tf 100 700 Td ([[note]]) Tj ET";
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>")
        .stream_object(4, "", content);
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    match &extraction.report.pages[0].pg[0] {
        PageItem::Comment { rect, comment } => {
            assert_eq!(comment, "note");
            assert_eq!(rect.x, 50.0 / 612.0);
            assert_eq!(rect.y, (792.0 - 710.0) / 792.0);
            assert_eq!(rect.width, 300.0 / 612.0);
            assert_eq!(rect.height, 60.0 / 792.0);
        }
        other => panic!("unexpected item: {other:?}"),
    }
}

#[test]
fn rich_media_asset_is_decoded_and_ordered_first() {
    let payload = b"MOVIE DATA";
    let packed = zlib_compress(payload);
    let content = b"BT /F1 12 Tf 100 700 Td ([[cue]]) Tj ET";
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(
            3,
            "<< /Type /Page /Parent 2 0 R /Contents 10 0 R /Annots [4 0 R 5 0 R] >>",
        )
        // A link listed before the media annotation: the item order must
        // still be media, then links, then comments.
        .object(
            4,
            "<< /Type /Annot /Subtype /Link /Rect [0 0 10 10] \
             /A << /S /URI /URI (http://example.com) >> >>",
        )
        .object(
            5,
            "<< /Type /Annot /Subtype /RichMedia /Rect [10 10 110 110] \
             /RichMediaContent << /Assets << /Names [(video.mp4) 8 0 R] >> >> >>",
        )
        .object(8, "<< /F (video.mp4) /EF << /F 9 0 R >> >>")
        .stream_object(9, "/Filter /FlateDecode", &packed)
        .stream_object(10, "", content);
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    assert_eq!(extraction.assets.len(), 1);
    assert_eq!(extraction.assets[0].filename, "video.mp4");
    assert_eq!(extraction.assets[0].data, payload);

    let kinds: Vec<&str> = extraction.report.pages[0]
        .pg
        .iter()
        .map(|item| match item {
            PageItem::Media { .. } => "media",
            PageItem::Link { .. } => "link",
            PageItem::Comment { .. } => "comment",
        })
        .collect();
    assert_eq!(kinds, vec!["media", "link", "comment"]);
}

#[test]
fn unsupported_filter_skips_the_asset_not_the_page() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R 5 0 R] >>")
        .object(
            4,
            "<< /Type /Annot /Subtype /RichMedia /Rect [10 10 110 110] \
             /RichMediaContent << /Assets << /Names [(clip.mov) 8 0 R] >> >> >>",
        )
        .object(
            5,
            "<< /Type /Annot /Subtype /Link /Rect [0 0 10 10] \
             /A << /S /URI /URI (http://example.com) >> >>",
        )
        .object(8, "<< /F (clip.mov) /EF << /F 9 0 R >> >>")
        .stream_object(9, "/Filter /LZWDecode", b"\x80\x0b\x60\x50");
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    let page = &extraction.report.pages[0];
    assert!(extraction.assets.is_empty());
    assert_eq!(page.links_metadata.len(), 1);
    assert!(
        extraction
            .diagnostics
            .iter()
            .any(|d| d.detail.contains("unsupported stream filter"))
    );
}

#[test]
fn degenerate_page_drops_items_with_diagnostics() {
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 0 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R] >>")
        .object(
            4,
            "<< /Type /Annot /Subtype /Link /Rect [0 0 10 10] \
             /A << /S /URI /URI (http://example.com) >> >>",
        );
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    let page = &extraction.report.pages[0];
    assert!(page.pg.is_empty());
    assert!(page.links_metadata.is_empty());
    assert!(
        extraction
            .diagnostics
            .iter()
            .any(|d| d.detail.contains("degenerate"))
    );
}

#[test]
fn save_assets_writes_by_embedded_filename() {
    let payload = b"MOVIE DATA";
    let packed = zlib_compress(payload);
    let mut b = PdfBuilder::new();
    b.object(1, "<< /Type /Catalog /Pages 2 0 R >>")
        .object(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>")
        .object(3, "<< /Type /Page /Parent 2 0 R /Annots [4 0 R] >>")
        .object(
            4,
            "<< /Type /Annot /Subtype /RichMedia /Rect [10 10 110 110] \
             /RichMediaContent << /Assets << /Names [(video.mp4) 8 0 R] >> >> >>",
        )
        // Embedded name tries to escape the target directory.
        .object(8, "<< /F (../video.mp4) /EF << /F 9 0 R >> >>")
        .stream_object(9, "/Filter /FlateDecode", &packed);
    let doc = Document::new(b.finish(1)).unwrap();
    let extraction = Extraction::build(&doc).unwrap();

    let dir = std::env::temp_dir().join(format!("marginalia-assets-{}", std::process::id()));
    extraction.save_assets(&dir).unwrap();
    let written = std::fs::read(dir.join("video.mp4")).unwrap();
    assert_eq!(written, payload);
    std::fs::remove_dir_all(&dir).unwrap();
}

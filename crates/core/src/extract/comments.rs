//! Bracketed-comment detection.
//!
//! Annotators mark comments in the page text itself with a `[[` marker.
//! When a marked run sits on top of another drawn object, the comment
//! reports that object's box so the overlay matches what the reader sees.

use crate::interp::PageLayout;
use crate::utils::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// PDF-space rectangle: the containing box if one qualifies, else the
    /// run's own bounding box.
    pub rect: Rect,
    /// Run text with all `[[` and `]]` markers stripped.
    pub text: String,
}

pub fn find_bracketed_comments(layout: &PageLayout) -> Vec<Comment> {
    let mut out = Vec::new();
    for (i, run) in layout.runs.iter().enumerate() {
        if !run.text.contains("[[") {
            continue;
        }
        let rect = containing_box(layout, i).unwrap_or(run.bbox);
        let text = run.text.replace("]]", "").replace("[[", "");
        out.push(Comment { rect, text });
    }
    out
}

/// First box that encloses the run on its left, bottom, and right edges
/// without rising above the run's top. The top edge is deliberately tested
/// the other way around; containers that extend higher than the text do not
/// qualify.
fn containing_box(layout: &PageLayout, run_ix: usize) -> Option<Rect> {
    let run = &layout.runs[run_ix];
    let candidates = layout.boxes.iter().copied().chain(
        layout
            .runs
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != run_ix)
            .map(|(_, r)| r.bbox),
    );
    for cand in candidates {
        if run.bbox.0 >= cand.0
            && run.bbox.1 >= cand.1
            && run.bbox.2 <= cand.2
            && run.bbox.3 >= cand.3
        {
            return Some(cand);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::TextRun;

    fn run(bbox: Rect, text: &str) -> TextRun {
        TextRun {
            bbox,
            text: text.to_string(),
        }
    }

    #[test]
    fn strips_all_markers() {
        let layout = PageLayout {
            runs: vec![run((0.0, 0.0, 10.0, 10.0), "foo[[bar]]baz")],
            boxes: vec![],
        };
        let comments = find_bracketed_comments(&layout);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "foobarbaz");
        assert!(!comments[0].text.contains("[["));
        assert!(!comments[0].text.contains("]]"));
    }

    #[test]
    fn unmarked_runs_are_ignored() {
        let layout = PageLayout {
            runs: vec![run((0.0, 0.0, 10.0, 10.0), "plain text")],
            boxes: vec![],
        };
        assert!(find_bracketed_comments(&layout).is_empty());
    }

    #[test]
    fn container_below_the_top_edge_wins() {
        let layout = PageLayout {
            runs: vec![run((100.0, 700.0, 150.0, 712.0), "[[note]]")],
            // Reaches past the run on the left/bottom/right, top edge below
            // the run's top.
            boxes: vec![(50.0, 650.0, 350.0, 710.0)],
        };
        let comments = find_bracketed_comments(&layout);
        assert_eq!(comments[0].rect, (50.0, 650.0, 350.0, 710.0));
    }

    #[test]
    fn container_rising_above_the_run_does_not_qualify() {
        let layout = PageLayout {
            runs: vec![run((100.0, 700.0, 150.0, 712.0), "[[note]]")],
            // Fully contains the run, including its top edge, so the
            // asymmetric test rejects it.
            boxes: vec![(50.0, 650.0, 350.0, 750.0)],
        };
        let comments = find_bracketed_comments(&layout);
        assert_eq!(comments[0].rect, (100.0, 700.0, 150.0, 712.0));
    }
}

//! Engine-owned logical selection.
//!
//! The host's native selection is mirrored into a [`DomRange`] here. Every
//! read re-validates against the live tree: a stale or out-of-bounds range
//! silently becomes a caret at the document start (logged), never an error.
//! Ranges whose endpoints sit in different unbreakable islands are clamped
//! into the start island when set.

use vellum_dom::{
    Dom, DomPoint, DomRange, NodeId, first_leaf, last_leaf, nearest_unbreakable,
};

#[derive(Debug, Default)]
pub struct SelectionState {
    range: Option<DomRange>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `range`, clamped into the tree and into one unbreakable
    /// island. Setting the same range twice is a no-op.
    pub fn set(&mut self, dom: &Dom, range: DomRange) {
        self.range = Some(clamp_range(dom, range));
    }

    pub fn set_caret(&mut self, dom: &Dom, point: DomPoint) {
        self.set(dom, DomRange::collapsed(point));
    }

    pub fn clear(&mut self) {
        self.range = None;
    }

    /// The current selection, re-validated. Recovers to a caret at the
    /// document start when the stored range no longer fits the tree.
    pub fn resolve(&mut self, dom: &Dom) -> DomRange {
        if let Some(range) = self.range {
            if range.is_valid(dom) {
                return range.normalize(dom);
            }
            tracing::debug!(
                target: "vellum::editor",
                "selection no longer fits the document, reset to start"
            );
        }
        let fallback = DomRange::collapsed(document_start(dom));
        self.range = Some(fallback);
        fallback
    }

    pub fn bookmark(&mut self, dom: &Dom) -> Bookmark {
        Bookmark::capture(dom, self.resolve(dom))
    }

    pub fn restore(&mut self, dom: &Dom, bookmark: &Bookmark) {
        let range = bookmark.resolve(dom);
        self.set(dom, range);
    }
}

fn document_start(dom: &Dom) -> DomPoint {
    DomPoint::start_of(first_leaf(dom, dom.root(), false))
}

/// The island a point belongs to. A point sitting *at* an unbreakable node
/// (not inside it) belongs to the surrounding island.
fn island_of(dom: &Dom, node: NodeId) -> NodeId {
    let island = nearest_unbreakable(dom, node);
    if island == node && node != dom.root() {
        match dom.parent(node) {
            Some(parent) => nearest_unbreakable(dom, parent),
            None => island,
        }
    } else {
        island
    }
}

fn clamp_point(dom: &Dom, point: DomPoint) -> Option<DomPoint> {
    if !dom.is_attached(point.node) {
        return None;
    }
    let max = dom.point_max_offset(point.node);
    Some(DomPoint::new(point.node, point.offset.min(max)))
}

fn clamp_range(dom: &Dom, range: DomRange) -> DomRange {
    let (start, end) = match (clamp_point(dom, range.start), clamp_point(dom, range.end)) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (None, None) => {
            tracing::debug!(target: "vellum::editor", "selection endpoints detached, reset");
            let p = document_start(dom);
            (p, p)
        }
    };
    let range = DomRange::new(start, end).normalize(dom);
    if island_of(dom, range.start.node) != island_of(dom, range.end.node) {
        tracing::debug!(target: "vellum::editor", "selection clamped to one unbreakable island");
        let island = island_of(dom, range.start.node);
        let leaf = last_leaf(dom, island, true);
        let end = DomPoint::end_of(dom, leaf);
        return DomRange::new(range.start, end).normalize(dom);
    }
    range
}

/// A selection serialized independently of node ids, so it survives the
/// tree being rebuilt (undo, rejected-command restore). The root path is
/// authoritative; an absolute text offset is the fallback when the path no
/// longer resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    start: BookmarkPoint,
    end: BookmarkPoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BookmarkPoint {
    path: Vec<usize>,
    offset: usize,
    text_offset: usize,
}

impl Bookmark {
    pub fn capture(dom: &Dom, range: DomRange) -> Self {
        let range = range.normalize(dom);
        Self {
            start: BookmarkPoint::capture(dom, range.start),
            end: BookmarkPoint::capture(dom, range.end),
        }
    }

    pub fn resolve(&self, dom: &Dom) -> DomRange {
        DomRange::new(self.start.resolve(dom), self.end.resolve(dom))
    }
}

impl BookmarkPoint {
    fn capture(dom: &Dom, point: DomPoint) -> Self {
        Self {
            path: vellum_dom::range::path_from_root(dom, point.node),
            offset: point.offset,
            text_offset: absolute_text_offset(dom, point),
        }
    }

    fn resolve(&self, dom: &Dom) -> DomPoint {
        let mut cur = dom.root();
        let mut exact = true;
        for &idx in &self.path {
            let children = dom.children(cur);
            if children.is_empty() {
                exact = false;
                break;
            }
            if idx >= children.len() {
                exact = false;
                cur = children[children.len() - 1];
                break;
            }
            cur = children[idx];
        }
        if exact && self.offset <= dom.point_max_offset(cur) {
            return DomPoint::new(cur, self.offset);
        }
        point_at_text_offset(dom, self.text_offset)
    }
}

/// Chars of text strictly before `point`, over the whole document.
pub(crate) fn absolute_text_offset(dom: &Dom, point: DomPoint) -> usize {
    let mut acc = 0;
    let mut stack = vec![dom.root()];
    while let Some(n) = stack.pop() {
        if n == point.node {
            if dom.is_text(n) {
                return acc + point.offset;
            }
            for &child in &dom.children(n)[..point.offset.min(dom.children(n).len())] {
                acc += dom.text_content(child).chars().count();
            }
            return acc;
        }
        if let Some(text) = dom.text(n) {
            acc += text.chars().count();
        }
        stack.extend(dom.children(n).iter().rev().copied());
    }
    acc
}

/// The position `offset` chars into the document's text, clamped to the
/// last text position.
pub(crate) fn point_at_text_offset(dom: &Dom, offset: usize) -> DomPoint {
    let mut remaining = offset;
    let mut last_text: Option<NodeId> = None;
    let mut stack = vec![dom.root()];
    while let Some(n) = stack.pop() {
        if let Some(text) = dom.text(n) {
            let len = text.chars().count();
            if remaining <= len {
                return DomPoint::new(n, remaining);
            }
            remaining -= len;
            last_text = Some(n);
        }
        stack.extend(dom.children(n).iter().rev().copied());
    }
    match last_text {
        Some(n) => DomPoint::end_of(dom, n),
        None => document_start(dom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_dom::parse_fragment;

    fn make_doc(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        dom
    }

    #[test]
    fn test_resolve_recovers_from_detached_node() {
        let mut dom = make_doc("<p>ab</p><p>cd</p>");
        let root = dom.root();
        let p2 = dom.children(root)[1];
        let t2 = dom.children(p2)[0];

        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::collapsed(DomPoint::new(t2, 1)));
        dom.detach(p2);

        let recovered = sel.resolve(&dom);
        assert!(recovered.is_collapsed());
        let first = dom.children(dom.children(root)[0])[0];
        assert_eq!(recovered.start, DomPoint::new(first, 0));
    }

    #[test]
    fn test_set_clamps_offsets_and_order() {
        let dom = make_doc("<p>abc</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        // Backwards and past the end.
        sel.set(
            &dom,
            DomRange::new(DomPoint::new(t, 99), DomPoint::new(t, 1)),
        );
        let got = sel.resolve(&dom);
        assert_eq!(got.start, DomPoint::new(t, 1));
        assert_eq!(got.end, DomPoint::new(t, 3));
    }

    #[test]
    fn test_cross_island_selection_is_clamped() {
        let dom = make_doc(
            "<table><tbody><tr><td>one</td><td>two</td></tr></tbody></table>",
        );
        let root = dom.root();
        let tr = {
            let table = dom.children(root)[0];
            let tbody = dom.children(table)[0];
            dom.children(tbody)[0]
        };
        let t1 = dom.children(dom.children(tr)[0])[0];
        let t2 = dom.children(dom.children(tr)[1])[0];

        let mut sel = SelectionState::new();
        sel.set(
            &dom,
            DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t2, 2)),
        );
        let got = sel.resolve(&dom);
        assert_eq!(got.start, DomPoint::new(t1, 1));
        // End pulled back into the first cell.
        assert_eq!(got.end, DomPoint::new(t1, 3));
    }

    #[test]
    fn test_bookmark_roundtrip_by_path() {
        let dom = make_doc("<p>ab<b>cd</b></p>");
        let p = dom.children(dom.root())[0];
        let cd = dom.children(dom.children(p)[1])[0];
        let range = DomRange::new(DomPoint::new(cd, 1), DomPoint::new(cd, 2));
        let bm = Bookmark::capture(&dom, range);
        assert_eq!(bm.resolve(&dom), range);
    }

    #[test]
    fn test_bookmark_survives_rebuild() {
        let dom = make_doc("<p>hello</p><p>world</p>");
        let t2 = dom.children(dom.children(dom.root())[1])[0];
        let bm = Bookmark::capture(
            &dom,
            DomRange::collapsed(DomPoint::new(t2, 3)),
        );
        // A fresh tree parsed from the same markup resolves to the same
        // logical position even though all ids differ.
        let rebuilt = make_doc("<p>hello</p><p>world</p>");
        let got = bm.resolve(&rebuilt);
        let t2b = rebuilt.children(rebuilt.children(rebuilt.root())[1])[0];
        assert_eq!(got, DomRange::collapsed(DomPoint::new(t2b, 3)));
    }

    #[test]
    fn test_bookmark_falls_back_to_text_offset() {
        let dom = make_doc("<p>hello world</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let bm = Bookmark::capture(&dom, DomRange::collapsed(DomPoint::new(t, 8)));
        // Same text, different shape: the path misses, the offset lands.
        let reshaped = make_doc("<p>hello</p><p> world</p>");
        let got = bm.resolve(&reshaped);
        let t2 = reshaped.children(reshaped.children(reshaped.root())[1])[0];
        assert_eq!(got.start.node, t2);
        assert_eq!(got.start.offset, 3);
    }

    #[test]
    fn test_empty_document_bookmark() {
        let dom = Dom::new();
        let bm = Bookmark::capture(
            &dom,
            DomRange::collapsed(DomPoint::new(dom.root(), 0)),
        );
        let got = bm.resolve(&dom);
        assert_eq!(got.start.node, dom.root());
    }
}

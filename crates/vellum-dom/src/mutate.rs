//! Mutation helpers: point splits, sibling merges, wrap/unwrap and ranged
//! deletion.
//!
//! Every operation here validates before it mutates. When a split would
//! cross an unbreakable boundary the tree is left byte-identical and the
//! caller gets [`UnbreakableViolation`] to absorb.

use crate::arena::{Dom, NodeId, NodeKind};
use crate::inspect::{
    first_block_ancestor, first_leaf, is_unbreakable, last_leaf, nearest_unbreakable, next_leaf,
};
use crate::range::{DomPoint, DomRange};
use crate::tags::{is_format_tag, is_mergeable_container};

/// A split, merge or deletion tried to cross an unbreakable boundary.
/// The tree is unchanged when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation would cross an unbreakable boundary")]
pub struct UnbreakableViolation;

#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    /// When the split point sits at the edge of an inline format span, keep
    /// the empty half so formatting continues on both sides. Paragraph
    /// splits want this; collapsed format toggles do not.
    pub keep_format_on_both_sides: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self { keep_format_on_both_sides: true }
    }
}

/// Splits the content under `limit` at `point`, duplicating the ancestor
/// chain between them to the right. Returns the split position between
/// `limit`'s children (the right half begins at the returned offset).
///
/// Block elements always split into two, even when one half ends up empty;
/// format spans follow [`SplitOptions::keep_format_on_both_sides`].
pub fn split_at_point(
    dom: &mut Dom,
    limit: NodeId,
    point: DomPoint,
    opts: &SplitOptions,
) -> Result<DomPoint, UnbreakableViolation> {
    if point.node == limit {
        let offset = point.offset.min(dom.children(limit).len());
        return Ok(DomPoint::new(limit, offset));
    }
    if !dom.contains(limit, point.node) {
        debug_assert!(false, "split point must be under the limit");
        return Err(UnbreakableViolation);
    }
    // Validate the whole chain first so a refusal leaves no partial split.
    let mut cur = point.node;
    while cur != limit {
        if is_unbreakable(dom, cur) {
            tracing::debug!(target: "vellum::dom", "split blocked by unbreakable boundary");
            return Err(UnbreakableViolation);
        }
        cur = dom.parent(cur).ok_or(UnbreakableViolation)?;
    }

    let (mut current, mut split_index) = match dom.kind(point.node) {
        NodeKind::Text(_) => {
            let len = dom.text_len(point.node);
            let offset = point.offset.min(len);
            let parent = dom.parent(point.node).expect("validated above");
            let at = dom.index_in_parent(point.node).expect("validated above");
            if offset == 0 {
                (parent, at)
            } else if offset == len {
                (parent, at + 1)
            } else {
                let tail = dom.remove_text(point.node, offset, len);
                let right = dom.create_text(tail);
                dom.insert_child(parent, at + 1, right);
                (parent, at + 1)
            }
        }
        NodeKind::Element(_) => {
            (point.node, point.offset.min(dom.children(point.node).len()))
        }
    };

    while current != limit {
        let parent = dom.parent(current).expect("validated above");
        let at = dom.index_in_parent(current).expect("validated above");
        let child_count = dom.children(current).len();
        let format = dom.tag(current).is_some_and(is_format_tag);

        if format && !opts.keep_format_on_both_sides && split_index == child_count {
            // Right half would be an empty husk; split just after instead.
            current = parent;
            split_index = at + 1;
            continue;
        }
        if format && !opts.keep_format_on_both_sides && split_index == 0 {
            // Left half would be empty; the whole span belongs to the right.
            current = parent;
            split_index = at;
            continue;
        }

        let el = dom
            .element(current)
            .cloned()
            .expect("split chain nodes are elements");
        let clone = dom.create_element(el);
        let tail: Vec<NodeId> = dom.children(current)[split_index..].to_vec();
        for id in tail {
            dom.append_child(clone, id);
        }
        dom.insert_child(parent, at + 1, clone);
        current = parent;
        split_index = at + 1;
    }

    Ok(DomPoint::new(limit, split_index))
}

/// Merges consecutive children of `parent` for which `can_merge` holds,
/// moving the second node's children into the first. One ordered pass.
pub fn merge_adjacent_when(
    dom: &mut Dom,
    parent: NodeId,
    can_merge: impl Fn(&Dom, NodeId, NodeId) -> bool,
) -> Vec<NodeId> {
    let mut i = 1;
    while i < dom.children(parent).len() {
        let prev = dom.children(parent)[i - 1];
        let cur = dom.children(parent)[i];
        if can_merge(dom, prev, cur) {
            let moved = dom.take_children(cur);
            for id in moved {
                dom.append_child(prev, id);
            }
            dom.detach(cur);
        } else {
            i += 1;
        }
    }
    dom.children(parent).to_vec()
}

/// Merges adjacent same-tag mergeable containers (lists) among `parent`'s
/// children. `[ul, ul, p, ul, ul]` becomes `[ul, p, ul]`.
pub fn merge_adjacent_same_tag(dom: &mut Dom, parent: NodeId) -> Vec<NodeId> {
    merge_adjacent_when(dom, parent, |d, a, b| {
        match (d.tag(a), d.tag(b)) {
            (Some(ta), Some(tb)) => {
                ta == tb
                    && is_mergeable_container(ta)
                    && !is_unbreakable(d, a)
                    && !is_unbreakable(d, b)
            }
            _ => false,
        }
    })
}

/// Replaces `id` with its children and returns them. A detached `id` is
/// left alone.
pub fn unwrap_node(dom: &mut Dom, id: NodeId) -> Vec<NodeId> {
    let Some(parent) = dom.parent(id) else {
        debug_assert!(false, "unwrap of a detached node");
        return Vec::new();
    };
    let at = dom.index_in_parent(id).expect("parented node has an index");
    let children = dom.take_children(id);
    for (k, &child) in children.iter().enumerate() {
        dom.insert_child(parent, at + k, child);
    }
    dom.detach(id);
    children
}

/// Wraps a run of consecutive siblings in a new element with `tag`,
/// inserted where the first of them stood.
pub fn wrap_nodes(dom: &mut Dom, ids: &[NodeId], tag: &str) -> Option<NodeId> {
    let first = *ids.first()?;
    let parent = dom.parent(first)?;
    let at = dom.index_in_parent(first)?;
    let wrapper = dom.create_element_with_tag(tag);
    dom.insert_child(parent, at, wrapper);
    for &id in ids {
        dom.append_child(wrapper, id);
    }
    Some(wrapper)
}

/// Drops empty text children of `parent` and joins adjacent text siblings.
/// Callers re-derive any selection offsets afterwards.
pub fn join_adjacent_text(dom: &mut Dom, parent: NodeId) {
    let mut i = 0;
    while i < dom.children(parent).len() {
        let cur = dom.children(parent)[i];
        if dom.text(cur) == Some("") {
            dom.detach(cur);
            continue;
        }
        if i > 0 {
            let prev = dom.children(parent)[i - 1];
            if dom.is_text(prev) && dom.is_text(cur) {
                let merged = format!(
                    "{}{}",
                    dom.text(prev).unwrap_or(""),
                    dom.text(cur).unwrap_or("")
                );
                dom.set_text(prev, merged);
                dom.detach(cur);
                continue;
            }
        }
        i += 1;
    }
}

/// Deletes the content covered by `range` and returns the collapse point.
///
/// Endpoints in different unbreakable islands are clamped to the start
/// island first (logged), so partial cross-island damage cannot happen.
/// Unbreakable atoms wholly inside the range are removed whole. Blocks are
/// merged when the endpoints sat in different blocks of one island, and
/// adjacent lists re-merge afterwards.
pub fn delete_range(dom: &mut Dom, range: DomRange) -> DomPoint {
    let range = range.normalize(dom);
    if range.is_collapsed() {
        return range.start;
    }

    // Fast path: both endpoints in one text node.
    if range.start.node == range.end.node && dom.is_text(range.start.node) {
        dom.remove_text(range.start.node, range.start.offset, range.end.offset);
        return range.start;
    }

    let root = dom.root();
    let (start_leaf, start_offset, start_covered) = resolve_to_leaf(dom, range.start, true);
    let (mut end_leaf, mut end_offset, mut end_covered) = resolve_to_leaf(dom, range.end, false);

    let start_island = island_for(dom, start_leaf);
    if island_for(dom, end_leaf) != start_island {
        tracing::debug!(target: "vellum::dom", "range clamped to one unbreakable island");
        end_leaf = last_leaf(dom, start_island, false);
        end_offset = dom.point_max_offset(end_leaf);
        end_covered = true;
    }

    if start_leaf == end_leaf {
        if dom.is_text(start_leaf) {
            dom.remove_text(start_leaf, start_offset, end_offset);
            return DomPoint::new(start_leaf, start_offset.min(dom.point_max_offset(start_leaf)));
        }
        // An element leaf bracketed by both endpoints is removed whole.
        if start_covered && end_covered {
            let parent = dom.parent(start_leaf);
            let at = dom.index_in_parent(start_leaf);
            let block = first_block_ancestor(dom, start_leaf).unwrap_or(root);
            detach_and_prune(dom, start_leaf, block);
            if let (Some(parent), Some(at)) = (parent, at) {
                if dom.is_attached(parent) {
                    return DomPoint::new(parent, at.min(dom.point_max_offset(parent)));
                }
            }
            let leaf = first_leaf(dom, root, false);
            return DomPoint::new(leaf, 0);
        }
        return DomPoint::new(start_leaf, start_offset.min(dom.point_max_offset(start_leaf)));
    }

    let start_block = first_block_ancestor(dom, start_leaf).unwrap_or(root);
    let end_block = first_block_ancestor(dom, end_leaf).unwrap_or(root);

    // Collect the middle before mutating; the walk is over live structure.
    let mut middle = Vec::new();
    let mut cur = start_leaf;
    while let Some(leaf) = next_leaf(dom, cur, root) {
        if leaf == end_leaf {
            break;
        }
        middle.push(leaf);
        cur = leaf;
    }

    // Trim the start leaf's tail.
    let start_kept = match dom.kind(start_leaf) {
        NodeKind::Text(_) => {
            let len = dom.text_len(start_leaf);
            dom.remove_text(start_leaf, start_offset.min(len), len);
            start_offset > 0
        }
        NodeKind::Element(_) => !start_covered,
    };
    if !start_kept {
        detach_and_prune(dom, start_leaf, start_block);
    }

    // Trim the end leaf's head.
    let end_kept = match dom.kind(end_leaf) {
        NodeKind::Text(_) => {
            dom.remove_text(end_leaf, 0, end_offset);
            dom.text_len(end_leaf) > 0
        }
        NodeKind::Element(_) => !end_covered,
    };
    if !end_kept {
        detach_and_prune(dom, end_leaf, end_block);
    }

    for leaf in middle {
        if !dom.is_attached(leaf) {
            continue;
        }
        detach_and_prune(dom, leaf, root);
    }

    // Merge what remains of the end block into the start block.
    if start_block != end_block
        && dom.is_attached(start_block)
        && dom.is_attached(end_block)
        && start_block != root
        && end_block != root
        && !is_unbreakable(dom, end_block)
        && !is_unbreakable(dom, start_block)
    {
        let leftovers = dom.take_children(end_block);
        for id in leftovers {
            dom.append_child(start_block, id);
        }
        detach_and_prune(dom, end_block, root);
    }

    if dom.is_attached(start_block) {
        join_adjacent_text(dom, start_block);
        if let Some(parent) = dom.parent(start_block) {
            merge_adjacent_same_tag(dom, parent);
        }
    }

    // Collapse point: end of what survives before the cut.
    if dom.is_attached(start_leaf) {
        let len = dom.point_max_offset(start_leaf);
        return DomPoint::new(start_leaf, start_offset.min(len));
    }
    if dom.is_attached(start_block) {
        if dom.children(start_block).is_empty() {
            return DomPoint::new(start_block, 0);
        }
        let leaf = first_leaf(dom, start_block, false);
        return DomPoint::new(leaf, 0);
    }
    let leaf = first_leaf(dom, root, false);
    DomPoint::new(leaf, 0)
}

/// The island a leaf participates in. An unbreakable leaf is an atom of
/// its parent's island, not an island of its own.
fn island_for(dom: &Dom, leaf: NodeId) -> NodeId {
    let island = nearest_unbreakable(dom, leaf);
    if island == leaf && leaf != dom.root() {
        if let Some(parent) = dom.parent(leaf) {
            return nearest_unbreakable(dom, parent);
        }
    }
    island
}

/// Maps a point to a concrete leaf position. `forward` picks the leaf at or
/// after an element offset; otherwise the leaf before it. An unbreakable
/// child at the offset is the leaf itself, kept whole.
///
/// The third value says whether the leaf lies strictly inside the range
/// from this endpoint's side. Offsets alone cannot tell this apart for
/// childless elements, where "before the node" and "at its end" are both
/// offset zero.
fn resolve_to_leaf(dom: &Dom, point: DomPoint, forward: bool) -> (NodeId, usize, bool) {
    if dom.is_text(point.node) || dom.children(point.node).is_empty() {
        let offset = point.offset.min(dom.point_max_offset(point.node));
        return (point.node, offset, false);
    }
    let children = dom.children(point.node);
    if forward {
        if point.offset < children.len() {
            let child = children[point.offset];
            if is_unbreakable(dom, child) {
                return (child, 0, true);
            }
            (first_leaf(dom, child, false), 0, true)
        } else {
            let leaf = last_leaf(dom, point.node, false);
            (leaf, dom.point_max_offset(leaf), false)
        }
    } else if point.offset == 0 {
        let leaf = first_leaf(dom, point.node, false);
        (leaf, 0, false)
    } else {
        let child = children[point.offset - 1];
        if is_unbreakable(dom, child) {
            return (child, dom.point_max_offset(child), true);
        }
        let leaf = last_leaf(dom, child, false);
        (leaf, dom.point_max_offset(leaf), true)
    }
}

/// Detaches `id` and then prunes newly empty ancestors, never touching
/// `stop` or anything above it.
fn detach_and_prune(dom: &mut Dom, id: NodeId, stop: NodeId) {
    let mut parent = dom.parent(id);
    dom.detach(id);
    while let Some(p) = parent {
        if p == stop || p == dom.root() || !dom.children(p).is_empty() {
            break;
        }
        parent = dom.parent(p);
        dom.detach(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_fragment;
    use crate::serialize::{SerializeOptions, serialize_children};
    use crate::tags::ATTR_EMBEDDED;

    fn make_doc(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        dom
    }

    fn html_of(dom: &Dom) -> String {
        serialize_children(dom, dom.root(), &SerializeOptions::history())
    }

    #[test]
    fn test_split_text_in_middle_of_paragraph() {
        let mut dom = make_doc("<p>abcd</p>");
        let root = dom.root();
        let p = dom.children(root)[0];
        let t = dom.children(p)[0];
        let after = split_at_point(&mut dom, root, DomPoint::new(t, 2), &SplitOptions::default())
            .unwrap();
        assert_eq!(after.node, root);
        assert_eq!(after.offset, 1);
        assert_eq!(html_of(&dom), "<p>ab</p><p>cd</p>");
    }

    #[test]
    fn test_split_at_edges_keeps_empty_block_halves() {
        let mut dom = make_doc("<p>ab</p>");
        let root = dom.root();
        let t = dom.children(dom.children(root)[0])[0];
        split_at_point(&mut dom, root, DomPoint::new(t, 2), &SplitOptions::default()).unwrap();
        assert_eq!(html_of(&dom), "<p>ab</p><p></p>");

        let mut dom = make_doc("<p>ab</p>");
        let root = dom.root();
        let t = dom.children(dom.children(root)[0])[0];
        split_at_point(&mut dom, root, DomPoint::new(t, 0), &SplitOptions::default()).unwrap();
        assert_eq!(html_of(&dom), "<p></p><p>ab</p>");
    }

    #[test]
    fn test_split_through_format_chain() {
        let mut dom = make_doc("<p>a<b>bc</b>d</p>");
        let root = dom.root();
        let p = dom.children(root)[0];
        let b = dom.children(p)[1];
        let t = dom.children(b)[0];
        split_at_point(&mut dom, root, DomPoint::new(t, 1), &SplitOptions::default()).unwrap();
        assert_eq!(html_of(&dom), "<p>a<b>b</b></p><p><b>c</b>d</p>");
    }

    #[test]
    fn test_split_format_edge_without_keep_flag() {
        // Splitting at the end of <b> with keep=false must not leave an
        // empty <b> husk on the right.
        let mut dom = make_doc("<p>a<b>bc</b>d</p>");
        let root = dom.root();
        let p = dom.children(root)[0];
        let b = dom.children(p)[1];
        let t = dom.children(b)[0];
        let opts = SplitOptions { keep_format_on_both_sides: false };
        let after = split_at_point(&mut dom, p, DomPoint::new(t, 2), &opts).unwrap();
        assert_eq!(html_of(&dom), "<p>a<b>bc</b>d</p>");
        assert_eq!(after, DomPoint::new(p, 2));
    }

    #[test]
    fn test_split_mid_format_without_keep_flag_still_splits() {
        let mut dom = make_doc("<p><b>bc</b></p>");
        let root = dom.root();
        let p = dom.children(root)[0];
        let b = dom.children(p)[0];
        let t = dom.children(b)[0];
        let opts = SplitOptions { keep_format_on_both_sides: false };
        let after = split_at_point(&mut dom, p, DomPoint::new(t, 1), &opts).unwrap();
        assert_eq!(html_of(&dom), "<p><b>b</b><b>c</b></p>");
        assert_eq!(after, DomPoint::new(p, 1));
    }

    #[test]
    fn test_split_blocked_by_unbreakable_leaves_tree_intact() {
        let mut dom = make_doc("<table><tbody><tr><td>ab</td></tr></tbody></table>");
        let before = html_of(&dom);
        let root = dom.root();
        let table = dom.children(root)[0];
        let td = {
            let tbody = dom.children(table)[0];
            let tr = dom.children(tbody)[0];
            dom.children(tr)[0]
        };
        let t = dom.children(td)[0];
        // Splitting up to the root would clone the cell: refused.
        let err = split_at_point(&mut dom, root, DomPoint::new(t, 1), &SplitOptions::default());
        assert_eq!(err, Err(UnbreakableViolation));
        assert_eq!(html_of(&dom), before);
        // Splitting within the cell is fine.
        split_at_point(&mut dom, td, DomPoint::new(t, 1), &SplitOptions::default()).unwrap();
        assert_eq!(
            html_of(&dom),
            "<table><tbody><tr><td>ab</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_merge_list_runs() {
        let mut dom = make_doc(
            "<ul><li>1</li></ul><ul><li>2</li></ul><p>x</p><ul><li>3</li></ul><ul><li>4</li></ul>",
        );
        let root = dom.root();
        let merged = merge_adjacent_same_tag(&mut dom, root);
        assert_eq!(merged.len(), 3);
        assert_eq!(
            html_of(&dom),
            "<ul><li>1</li><li>2</li></ul><p>x</p><ul><li>3</li><li>4</li></ul>"
        );
    }

    #[test]
    fn test_merge_skips_different_tags_and_embeds() {
        let mut dom = make_doc(&format!(
            "<ul><li>1</li></ul><ol><li>2</li></ol><ul {}=\"x\"><li>3</li></ul><ul><li>4</li></ul>",
            ATTR_EMBEDDED
        ));
        let root = dom.root();
        let merged = merge_adjacent_same_tag(&mut dom, root);
        // ol breaks the first run; the embedded ul never merges.
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_unwrap_promotes_children_in_place() {
        let mut dom = make_doc("<p>a<b>b<i>c</i></b>d</p>");
        let root = dom.root();
        let p = dom.children(root)[0];
        let b = dom.children(p)[1];
        let promoted = unwrap_node(&mut dom, b);
        assert_eq!(promoted.len(), 2);
        assert_eq!(html_of(&dom), "<p>ab<i>c</i>d</p>");
    }

    #[test]
    fn test_wrap_consecutive_siblings() {
        let mut dom = make_doc("<p>a</p><p>b</p><p>c</p>");
        let root = dom.root();
        let kids = dom.children(root).to_vec();
        let wrapper = wrap_nodes(&mut dom, &kids[1..], "blockquote").unwrap();
        assert_eq!(dom.children(wrapper).len(), 2);
        assert_eq!(html_of(&dom), "<p>a</p><blockquote><p>b</p><p>c</p></blockquote>");
    }

    #[test]
    fn test_join_adjacent_text_drops_empties() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_element_with_tag("p");
        dom.append_child(root, p);
        for s in ["a", "", "b", "c"] {
            let t = dom.create_text(s);
            dom.append_child(p, t);
        }
        join_adjacent_text(&mut dom, p);
        assert_eq!(dom.children(p).len(), 1);
        assert_eq!(dom.text_content(p), "abc");
    }

    #[test]
    fn test_delete_within_one_text_node() {
        let mut dom = make_doc("<p>abcdef</p>");
        let p = dom.children(dom.root())[0];
        let t = dom.children(p)[0];
        let caret = delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t, 1), DomPoint::new(t, 4)),
        );
        assert_eq!(html_of(&dom), "<p>aef</p>");
        assert_eq!(caret, DomPoint::new(t, 1));
    }

    #[test]
    fn test_delete_across_inline_span() {
        let mut dom = make_doc("<p>ab<b>cd</b>ef</p>");
        let p = dom.children(dom.root())[0];
        let t1 = dom.children(p)[0];
        let t2 = dom.children(p)[2];
        delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t2, 1)),
        );
        assert_eq!(html_of(&dom), "<p>af</p>");
    }

    #[test]
    fn test_delete_across_blocks_merges_them() {
        let mut dom = make_doc("<p>hello</p><p>world</p>");
        let root = dom.root();
        let t1 = dom.children(dom.children(root)[0])[0];
        let t2 = dom.children(dom.children(root)[1])[0];
        let caret = delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 3), DomPoint::new(t2, 2)),
        );
        assert_eq!(html_of(&dom), "<p>helrld</p>");
        assert_eq!(caret.node, t1);
        assert_eq!(caret.offset, 3);
    }

    #[test]
    fn test_delete_spanning_whole_middle_block() {
        let mut dom = make_doc("<p>aa</p><p>skip</p><p>bb</p>");
        let root = dom.root();
        let t1 = dom.children(dom.children(root)[0])[0];
        let t3 = dom.children(dom.children(root)[2])[0];
        delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t3, 1)),
        );
        assert_eq!(html_of(&dom), "<p>ab</p>");
    }

    #[test]
    fn test_delete_removes_wholly_covered_atom() {
        let mut dom = make_doc(&format!(
            "<p>a</p><div {}=\"toggle\"><p>t</p></div><p>b</p>",
            ATTR_EMBEDDED
        ));
        let root = dom.root();
        let t1 = dom.children(dom.children(root)[0])[0];
        let t2 = dom.children(dom.children(root)[2])[0];
        delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 0), DomPoint::new(t2, 1)),
        );
        assert_eq!(html_of(&dom), "<p></p>");
    }

    #[test]
    fn test_delete_bracketed_single_atom() {
        let mut dom = make_doc(&format!(
            "<p>a</p><div {}=\"toggle\"><p>t</p></div><p>b</p>",
            ATTR_EMBEDDED
        ));
        let root = dom.root();
        let caret = delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(root, 1), DomPoint::new(root, 2)),
        );
        assert_eq!(html_of(&dom), "<p>a</p><p>b</p>");
        assert_eq!(caret, DomPoint::new(root, 1));
    }

    #[test]
    fn test_delete_everything_starting_at_an_atom() {
        let mut dom = make_doc(&format!(
            "<div {}=\"toggle\"><p>t</p></div><p>b</p>",
            ATTR_EMBEDDED
        ));
        let root = dom.root();
        // Whole-document range by element offsets, as select-all produces.
        let caret = delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(root, 0), DomPoint::new(root, 2)),
        );
        assert_eq!(html_of(&dom), "<p></p>");
        let p = dom.children(root)[0];
        assert_eq!(caret, DomPoint::new(p, 0));
    }

    #[test]
    fn test_delete_clamps_to_one_island() {
        let mut dom = make_doc(
            "<table><tbody><tr><td>one</td><td>two</td></tr></tbody></table>",
        );
        let root = dom.root();
        let table = dom.children(root)[0];
        let tr = dom.children(dom.children(table)[0])[0];
        let td1 = dom.children(tr)[0];
        let td2 = dom.children(tr)[1];
        let t1 = dom.children(td1)[0];
        let t2 = dom.children(td2)[0];
        delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t2, 3)),
        );
        // Only the first cell is touched.
        assert_eq!(
            html_of(&dom),
            "<table><tbody><tr><td>o</td><td>two</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_delete_merging_list_items_remerges_lists() {
        let mut dom = make_doc("<ul><li>ab</li></ul><p>mid</p><ul><li>cd</li></ul>");
        let root = dom.root();
        let t1 = {
            let ul = dom.children(root)[0];
            let li = dom.children(ul)[0];
            dom.children(li)[0]
        };
        let t2 = {
            let ul = dom.children(root)[2];
            let li = dom.children(ul)[0];
            dom.children(li)[0]
        };
        delete_range(
            &mut dom,
            DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t2, 1)),
        );
        assert_eq!(html_of(&dom), "<ul><li>ad</li></ul>");
    }
}

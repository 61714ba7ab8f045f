//! Structural queries over the tree: block-ness, blank-ness, ancestors,
//! leaves. All read-only.

use crate::arena::{Dom, NodeId};
use crate::tags::{ATTR_EMBEDDED, ATTR_EMBEDDED_EDITABLE, ZERO_WIDTH, is_block_tag};

/// An unbreakable node is an editing island: splits, merges and deletions
/// never cross its boundary. The root, tables and their cells, and embedded
/// block containers/regions qualify.
pub fn is_unbreakable(dom: &Dom, id: NodeId) -> bool {
    if id == dom.root() {
        return true;
    }
    let Some(el) = dom.element(id) else {
        return false;
    };
    matches!(el.tag(), "table" | "td" | "th")
        || el.has_attr(ATTR_EMBEDDED)
        || el.has_attr(ATTR_EMBEDDED_EDITABLE)
}

pub fn is_block_node(dom: &Dom, id: NodeId) -> bool {
    dom.tag(id).is_some_and(is_block_tag)
}

/// True when the subtree carries no meaningful content: whitespace and
/// zero-width text, `<br>` padding, and elements holding only those.
/// Images and unbreakable islands always count as content.
pub fn is_blank_node(dom: &Dom, id: NodeId) -> bool {
    if let Some(text) = dom.text(id) {
        return text.chars().all(|c| c.is_whitespace() || c == ZERO_WIDTH);
    }
    let Some(el) = dom.element(id) else {
        return false;
    };
    match el.tag() {
        "br" => return true,
        "img" => return false,
        _ => {}
    }
    if is_unbreakable(dom, id) {
        return false;
    }
    dom.children(id).iter().all(|&c| is_blank_node(dom, c))
}

/// Nearest ancestor (including `id` itself) satisfying `pred`.
pub fn closest_matching_ancestor(
    dom: &Dom,
    id: NodeId,
    pred: impl Fn(&Dom, NodeId) -> bool,
) -> Option<NodeId> {
    let mut cur = Some(id);
    while let Some(n) = cur {
        if pred(dom, n) {
            return Some(n);
        }
        cur = dom.parent(n);
    }
    None
}

/// Nearest block-level ancestor, `id` included. The root container is the
/// answer of last resort for content sitting directly under it.
pub fn first_block_ancestor(dom: &Dom, id: NodeId) -> Option<NodeId> {
    closest_matching_ancestor(dom, id, |d, n| is_block_node(d, n) || n == d.root())
}

/// The unbreakable island `id` lives in. The root qualifies, so there is
/// always one.
pub fn nearest_unbreakable(dom: &Dom, id: NodeId) -> NodeId {
    closest_matching_ancestor(dom, id, is_unbreakable).expect("the root is unbreakable")
}

/// Deepest node containing both `a` and `b` (inclusive). None when one of
/// them is detached from the other's tree.
pub fn lowest_common_ancestor(dom: &Dom, a: NodeId, b: NodeId) -> Option<NodeId> {
    let mut cur = Some(a);
    while let Some(n) = cur {
        if dom.contains(n, b) {
            return Some(n);
        }
        cur = dom.parent(n);
    }
    None
}

/// Deepest first descendant. With `enter_unbreakable` false, an unbreakable
/// child is returned whole, as an atom.
pub fn first_leaf(dom: &Dom, id: NodeId, enter_unbreakable: bool) -> NodeId {
    let mut cur = id;
    while let Some(child) = dom.first_child(cur) {
        if !enter_unbreakable && is_unbreakable(dom, child) {
            return child;
        }
        cur = child;
    }
    cur
}

/// Deepest last descendant; see [`first_leaf`] for the unbreakable rule.
pub fn last_leaf(dom: &Dom, id: NodeId, enter_unbreakable: bool) -> NodeId {
    let mut cur = id;
    while let Some(child) = dom.last_child(cur) {
        if !enter_unbreakable && is_unbreakable(dom, child) {
            return child;
        }
        cur = child;
    }
    cur
}

/// Next leaf in document order after the subtree of `id`, staying within
/// `within`. Unbreakable islands come back whole.
pub fn next_leaf(dom: &Dom, id: NodeId, within: NodeId) -> Option<NodeId> {
    let mut cur = id;
    loop {
        if cur == within {
            return None;
        }
        if let Some(sib) = dom.next_sibling(cur) {
            if is_unbreakable(dom, sib) {
                return Some(sib);
            }
            return Some(first_leaf(dom, sib, false));
        }
        cur = dom.parent(cur)?;
    }
}

/// Previous leaf in document order before the subtree of `id`, staying
/// within `within`.
pub fn prev_leaf(dom: &Dom, id: NodeId, within: NodeId) -> Option<NodeId> {
    let mut cur = id;
    loop {
        if cur == within {
            return None;
        }
        if let Some(sib) = dom.prev_sibling(cur) {
            if is_unbreakable(dom, sib) {
                return Some(sib);
            }
            return Some(last_leaf(dom, sib, false));
        }
        cur = dom.parent(cur)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Element;
    use crate::parse::parse_fragment;

    fn make_doc(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        dom
    }

    #[test]
    fn test_blank_detection() {
        let dom = make_doc("<p><br></p><p>text</p><p>  </p><p><img src=\"x\"></p>");
        let root = dom.root();
        let kids = dom.children(root).to_vec();
        assert!(is_blank_node(&dom, kids[0]));
        assert!(!is_blank_node(&dom, kids[1]));
        assert!(is_blank_node(&dom, kids[2]));
        assert!(!is_blank_node(&dom, kids[3]));
    }

    #[test]
    fn test_zero_width_text_is_blank() {
        let mut dom = Dom::new();
        let t = dom.create_text("\u{200B}");
        let root = dom.root();
        dom.append_child(root, t);
        assert!(is_blank_node(&dom, t));
    }

    #[test]
    fn test_block_ancestor_from_text() {
        let dom = make_doc("<ul><li>one</li></ul>");
        let root = dom.root();
        let ul = dom.children(root)[0];
        let li = dom.children(ul)[0];
        let text = dom.children(li)[0];
        assert_eq!(first_block_ancestor(&dom, text), Some(li));
        assert_eq!(first_block_ancestor(&dom, li), Some(li));
    }

    #[test]
    fn test_leaves_stop_at_unbreakable() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_element_with_tag("p");
        let mut embed = Element::new("div");
        embed.set_attr(ATTR_EMBEDDED, "toggle");
        let island = dom.create_element(embed);
        let inner = dom.create_text("hidden");
        dom.append_child(root, p);
        dom.append_child(p, island);
        dom.append_child(island, inner);

        assert_eq!(first_leaf(&dom, p, false), island);
        assert_eq!(first_leaf(&dom, p, true), inner);
        assert!(is_unbreakable(&dom, island));
    }

    #[test]
    fn test_leaf_walk_order() {
        let dom = make_doc("<p>a<b>b</b></p><p>c</p>");
        let root = dom.root();
        let p1 = dom.children(root)[0];
        let p2 = dom.children(root)[1];
        let a = dom.children(p1)[0];
        let b_el = dom.children(p1)[1];
        let b = dom.children(b_el)[0];
        let c = dom.children(p2)[0];

        assert_eq!(first_leaf(&dom, root, false), a);
        assert_eq!(next_leaf(&dom, a, root), Some(b));
        assert_eq!(next_leaf(&dom, b, root), Some(c));
        assert_eq!(next_leaf(&dom, c, root), None);
        assert_eq!(prev_leaf(&dom, c, root), Some(b));
        assert_eq!(prev_leaf(&dom, a, root), None);
    }

    #[test]
    fn test_cells_are_unbreakable() {
        let dom = make_doc("<table><tbody><tr><td>x</td></tr></tbody></table>");
        let root = dom.root();
        let table = dom.children(root)[0];
        let tbody = dom.children(table)[0];
        let tr = dom.children(tbody)[0];
        let td = dom.children(tr)[0];
        assert!(is_unbreakable(&dom, table));
        assert!(!is_unbreakable(&dom, tr));
        assert!(is_unbreakable(&dom, td));
    }
}

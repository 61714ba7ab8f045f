//! Arena-backed document tree.
//!
//! Nodes live in an append-only arena owned by [`Dom`]; a [`NodeId`] is an
//! index into it. Invariants:
//! - ids are never reused, so a stale id reads as detached rather than
//!   aliasing some newer node
//! - a node has at most one parent, and the parent's child list is the only
//!   source of sibling order
//! - the root is an element and can never be detached

use smol_str::SmolStr;

/// Handle to a node in a [`Dom`] arena.
///
/// Only meaningful for the document that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

/// Tag plus attributes, order-preserving.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
}

impl Element {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self { tag: tag.into(), attrs: Vec::new() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    /// Sets `name` to `value`, keeping the attribute's original position if
    /// it already exists.
    pub fn set_attr(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let at = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(at).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Keeps only attributes for which `keep` returns true.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attrs.retain(|(n, _)| keep(n));
    }
}

#[derive(Debug)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// The document tree. One per editor instance.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Dom {
    /// An empty document: a root container element with no children.
    pub fn new() -> Self {
        let mut dom = Dom { nodes: Vec::new(), root: NodeId(0) };
        let root = dom.alloc(NodeKind::Element(Element::new("div")));
        dom.root = root;
        dom
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { parent: None, children: Vec::new(), kind });
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeKind::Element(element))
    }

    pub fn create_element_with_tag(&mut self, tag: impl Into<SmolStr>) -> NodeId {
        self.create_element(Element::new(tag))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    // === Kind accessors ===

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<SmolStr>, value: impl Into<String>) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    // === Structure accessors ===

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        self.node(parent).children.iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let at = self.index_in_parent(id)?;
        if at == 0 {
            None
        } else {
            Some(self.node(parent).children[at - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let at = self.index_in_parent(id)?;
        self.node(parent).children.get(at + 1).copied()
    }

    /// True when `id` is the root or reachable from it.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// True when `ancestor` is `id` or a proper ancestor of it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.node(n).parent;
        }
        false
    }

    /// Ancestors of `id`, nearest first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.node(id).parent;
        while let Some(n) = cur {
            out.push(n);
            cur = self.node(n).parent;
        }
        out
    }

    /// Preorder descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev().copied());
        }
        out
    }

    // === Structure mutation ===

    /// Appends `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let at = self.node(parent).children.len();
        self.insert_child(parent, at, child);
    }

    /// Inserts `child` at `index` in `parent`'s child list. Rejects cycles
    /// and self-insertion with a logged no-op.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if child == self.root || self.contains(child, parent) {
            tracing::debug!(target: "vellum::dom", "rejected cyclic attach");
            return;
        }
        if self.is_text(parent) {
            debug_assert!(false, "text nodes cannot have children");
            return;
        }
        self.detach(child);
        let index = index.min(self.node(parent).children.len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Inserts `new` immediately before `reference` under the same parent.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.node(reference).parent else {
            debug_assert!(false, "insert_before on a detached reference");
            return;
        };
        // Index lookup must come after a detach of `new`: if both share a
        // parent, detaching shifts indices.
        self.detach(new);
        let Some(at) = self.index_in_parent(reference) else {
            return;
        };
        self.insert_child(parent, at, new);
    }

    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.node(reference).parent else {
            debug_assert!(false, "insert_after on a detached reference");
            return;
        };
        self.detach(new);
        let Some(at) = self.index_in_parent(reference) else {
            return;
        };
        self.insert_child(parent, at + 1, new);
    }

    /// Unlinks `id` from its parent. The node and its subtree stay in the
    /// arena and can be reattached. Detaching the root is a no-op.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if let Some(at) = self.index_in_parent(id) {
            self.node_mut(parent).children.remove(at);
        }
        self.node_mut(id).parent = None;
    }

    /// Detaches every child of `id` and returns them in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for &c in &children {
            self.node_mut(c).parent = None;
        }
        children
    }

    // === Text access ===

    /// Char length of a text node, child count of an element. This is the
    /// valid offset domain for a [`crate::DomPoint`] at `id`.
    pub fn point_max_offset(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(t) => t.chars().count(),
            NodeKind::Element(_) => self.node(id).children.len(),
        }
    }

    /// Char count of a text node; 0 for elements.
    pub fn text_len(&self, id: NodeId) -> usize {
        match &self.node(id).kind {
            NodeKind::Text(t) => t.chars().count(),
            NodeKind::Element(_) => 0,
        }
    }

    /// Concatenated text of the subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.text(d) {
                out.push_str(t);
            }
        }
        out
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeKind::Text(t) = &mut self.node_mut(id).kind {
            *t = text.into();
        } else {
            debug_assert!(false, "set_text on an element");
        }
    }

    /// Inserts `s` into a text node at a char offset (clamped).
    pub fn insert_text(&mut self, id: NodeId, char_offset: usize, s: &str) {
        if let NodeKind::Text(t) = &mut self.node_mut(id).kind {
            let at = byte_of_char(t, char_offset);
            t.insert_str(at, s);
        } else {
            debug_assert!(false, "insert_text on an element");
        }
    }

    /// Removes chars `[start, end)` from a text node and returns them.
    pub fn remove_text(&mut self, id: NodeId, start: usize, end: usize) -> String {
        if let NodeKind::Text(t) = &mut self.node_mut(id).kind {
            let from = byte_of_char(t, start);
            let to = byte_of_char(t, end.max(start));
            t.drain(from..to).collect()
        } else {
            debug_assert!(false, "remove_text on an element");
            String::new()
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the `char_offset`-th char, clamped to the string end.
pub(crate) fn byte_of_char(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

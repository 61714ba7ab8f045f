//! Positions and ranges over the document tree.
//!
//! A point's `offset` is a char offset when `node` is a text node and a
//! child index when `node` is an element, so "before child n" and "inside
//! this text at char n" share one representation.

use std::cmp::Ordering;

use crate::arena::{Dom, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Point at the very start of `node`.
    pub fn start_of(node: NodeId) -> Self {
        Self { node, offset: 0 }
    }

    /// Point just past the last char (or child) of `node`.
    pub fn end_of(dom: &Dom, node: NodeId) -> Self {
        Self { node, offset: dom.point_max_offset(node) }
    }

    /// True when the point's node is attached and the offset is in range.
    pub fn is_valid(&self, dom: &Dom) -> bool {
        dom.is_attached(self.node) && self.offset <= dom.point_max_offset(self.node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl DomRange {
    pub fn new(start: DomPoint, end: DomPoint) -> Self {
        Self { start, end }
    }

    pub fn collapsed(point: DomPoint) -> Self {
        Self { start: point, end: point }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn is_valid(&self, dom: &Dom) -> bool {
        self.start.is_valid(dom) && self.end.is_valid(dom)
    }

    /// Returns the range with endpoints in document order.
    pub fn normalize(&self, dom: &Dom) -> DomRange {
        match cmp_points(dom, self.start, self.end) {
            Ordering::Greater => DomRange { start: self.end, end: self.start },
            _ => *self,
        }
    }
}

/// Path of child indices from the root down to `node`.
pub fn path_from_root(dom: &Dom, node: NodeId) -> Vec<usize> {
    let mut path = Vec::new();
    let mut cur = node;
    while let Some(at) = dom.index_in_parent(cur) {
        path.push(at);
        cur = dom.parent(cur).expect("index_in_parent implies a parent");
    }
    path.reverse();
    path
}

/// Document-order comparison of two points.
///
/// Each point maps to its node's root path extended by the offset; the paths
/// compare lexicographically. A point on an element just before child n and
/// a point at the start of that child compare as adjacent, element first.
pub fn cmp_points(dom: &Dom, a: DomPoint, b: DomPoint) -> Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    let mut pa = path_from_root(dom, a.node);
    pa.push(a.offset);
    let mut pb = path_from_root(dom, b.node);
    pb.push(b.offset);
    pa.cmp(&pb)
}

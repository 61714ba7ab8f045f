//! vellum-dom: the document tree underneath the vellum editing engine.
//!
//! This crate provides:
//! - `Dom` - an arena-backed element/text tree with stable node ids
//! - `DomPoint` / `DomRange` - positions and ranges over the tree
//! - a permissive HTML reader and a deterministic HTML writer
//! - structural queries (blocks, blanks, leaves, ancestors)
//! - mutation helpers (point splits, same-tag merges, wrap/unwrap)
//!   that respect unbreakable boundaries

pub mod arena;
pub mod inspect;
pub mod mutate;
pub mod parse;
pub mod range;
pub mod serialize;
pub mod tags;

pub use arena::{Dom, Element, NodeId, NodeKind};
pub use inspect::{
    closest_matching_ancestor, first_block_ancestor, first_leaf, is_blank_node, is_block_node,
    is_unbreakable, last_leaf, lowest_common_ancestor, nearest_unbreakable, next_leaf, prev_leaf,
};
pub use mutate::{
    SplitOptions, UnbreakableViolation, delete_range, join_adjacent_text,
    merge_adjacent_same_tag, merge_adjacent_when, split_at_point, unwrap_node, wrap_nodes,
};
pub use parse::parse_fragment;
pub use range::{DomPoint, DomRange};
pub use serialize::{SerializeOptions, serialize_children, serialize_node};
pub use smol_str::SmolStr;
pub use tags::{
    ATTR_EMBEDDED, ATTR_EMBEDDED_EDITABLE, ATTR_TOGGLE_COLLAPSED, ATTR_TOGGLE_ID, Format,
    ZERO_WIDTH, is_block_tag, is_format_tag, is_mergeable_container, is_void_tag,
};

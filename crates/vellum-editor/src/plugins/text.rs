//! Core text editing: typing, paragraph and line splits, deletions,
//! select-all, and block padding.
//!
//! Deletions lean on `delete_range` for everything beyond the one-char
//! case, so block merges and island clamping behave the same whether the
//! user backspaced or selected and deleted.

use vellum_dom::{
    Dom, DomPoint, DomRange, NodeId, SplitOptions, ZERO_WIDTH, delete_range,
    first_block_ancestor, first_leaf, is_blank_node, is_unbreakable, is_void_tag, last_leaf,
    nearest_unbreakable, next_leaf, prev_leaf, split_at_point,
};

use crate::command::{Command, CommandKind, CommandOutcome, EditCtx};
use crate::error::CommandFailure;
use crate::plugin::{Plugin, PluginResources};

#[derive(Debug, Default)]
pub struct TextPlugin;

impl TextPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TextPlugin {
    fn name(&self) -> &'static str {
        "text"
    }

    fn resources(&self) -> PluginResources {
        PluginResources::new()
            .claim(CommandKind::InsertText)
            .claim(CommandKind::InsertParagraph)
            .claim(CommandKind::InsertLineBreak)
            .claim(CommandKind::DeleteBackward)
            .claim(CommandKind::DeleteForward)
            .claim(CommandKind::SelectAll)
    }

    fn on_command(
        &mut self,
        ctx: &mut EditCtx,
        command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        match command {
            Command::InsertText(text) => insert_text(ctx, text),
            Command::InsertParagraph => insert_paragraph(ctx),
            Command::InsertLineBreak => insert_line_break(ctx),
            Command::DeleteBackward => delete_backward(ctx),
            Command::DeleteForward => delete_forward(ctx),
            Command::SelectAll => select_all(ctx),
            _ => Ok(CommandOutcome::UNCHANGED),
        }
    }

    fn normalize(&mut self, ctx: &mut EditCtx) -> bool {
        pad_blocks(ctx.dom)
    }
}

/// Collapses the selection, deleting its content if it spans anything.
pub(crate) fn collapsed_caret(ctx: &mut EditCtx) -> DomPoint {
    let range = ctx.selection.resolve(ctx.dom);
    if range.is_collapsed() {
        return range.start;
    }
    let caret = delete_range(ctx.dom, range);
    ctx.selection.set_caret(ctx.dom, caret);
    caret
}

/// A child-index boundary for inserting at `caret`: a text node caret is
/// split in place first, a void element caret becomes the slot before it.
pub(crate) fn caret_boundary(dom: &mut Dom, caret: DomPoint) -> Option<DomPoint> {
    if dom.is_text(caret.node) {
        let parent = dom.parent(caret.node)?;
        return split_at_point(dom, parent, caret, &SplitOptions::default()).ok();
    }
    if dom.tag(caret.node).is_some_and(is_void_tag) {
        let parent = dom.parent(caret.node)?;
        let at = dom.index_in_parent(caret.node)?;
        return Some(DomPoint::new(parent, at));
    }
    Some(caret)
}

/// Guarantees a text node at the caret, reusing an adjacent one when it
/// is already there.
fn ensure_text_point(dom: &mut Dom, point: DomPoint) -> DomPoint {
    if dom.is_text(point.node) {
        return point;
    }
    let kids = dom.children(point.node).to_vec();
    if point.offset > 0 && point.offset <= kids.len() {
        let before = kids[point.offset - 1];
        if dom.is_text(before) {
            return DomPoint::end_of(dom, before);
        }
    }
    if point.offset < kids.len() && dom.is_text(kids[point.offset]) {
        return DomPoint::start_of(kids[point.offset]);
    }
    let t = dom.create_text("");
    dom.insert_child(point.node, point.offset.min(kids.len()), t);
    DomPoint::new(t, 0)
}

/// Drops zero-width marker chars from `node` once real content sits next
/// to them, returning `offset` shifted to the same logical position. A
/// lone marker is left alone; it is still someone's caret anchor.
fn strip_markers(dom: &mut Dom, node: NodeId, offset: usize) -> usize {
    let text = match dom.text(node) {
        Some(t) => t.to_owned(),
        None => return offset,
    };
    if !text.contains(ZERO_WIDTH) || text.chars().all(|c| c == ZERO_WIDTH) {
        return offset;
    }
    let mut kept_before = 0;
    let mut kept = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        if c == ZERO_WIDTH {
            continue;
        }
        if i < offset {
            kept_before += 1;
        }
        kept.push(c);
    }
    dom.set_text(node, kept);
    kept_before
}

fn insert_text(ctx: &mut EditCtx, text: &str) -> Result<CommandOutcome, CommandFailure> {
    if text.is_empty() {
        return Ok(CommandOutcome::UNCHANGED);
    }
    let caret = collapsed_caret(ctx);
    let caret = ensure_text_point(ctx.dom, caret);
    ctx.dom.insert_text(caret.node, caret.offset, text);
    let offset = caret.offset + text.chars().count();
    let offset = strip_markers(ctx.dom, caret.node, offset);
    ctx.selection.set_caret(ctx.dom, DomPoint::new(caret.node, offset));
    Ok(CommandOutcome::CHANGED)
}

fn insert_paragraph(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let caret = collapsed_caret(ctx);
    let dom = &mut *ctx.dom;
    let root = dom.root();
    let block = first_block_ancestor(dom, caret.node).unwrap_or(root);

    if is_unbreakable(dom, block) {
        // Bare cells and the root itself take a line break instead.
        return insert_line_break(ctx);
    }
    if dom.tag(block) == Some("li") && is_blank_node(dom, block) {
        return exit_list(ctx, block);
    }

    let limit = dom.parent(block).expect("breakable block has a parent");
    let after = split_at_point(dom, limit, caret, &SplitOptions::default())
        .map_err(|e| CommandFailure::new(e.to_string()))?;
    let caret = match dom.children(limit).get(after.offset).copied() {
        Some(second) => DomPoint::start_of(first_leaf(dom, second, false)),
        None => after,
    };
    ctx.selection.set_caret(dom, caret);
    Ok(CommandOutcome::CHANGED)
}

/// Enter on a blank list item: the item leaves the list and becomes a
/// paragraph sitting where the list was split.
fn exit_list(ctx: &mut EditCtx, li: NodeId) -> Result<CommandOutcome, CommandFailure> {
    let dom = &mut *ctx.dom;
    let list = dom.parent(li).expect("list item has a parent");
    let at = dom.index_in_parent(li).expect("list item has an index");
    let limit = dom.parent(list).expect("list has a parent");

    let split = split_at_point(dom, limit, DomPoint::new(list, at), &SplitOptions::default())
        .map_err(|e| CommandFailure::new(e.to_string()))?;
    let left = split.offset.checked_sub(1).and_then(|i| dom.children(limit).get(i).copied());
    let right = dom.children(limit).get(split.offset).copied();

    let mut insert_at = split.offset;
    if let Some(right) = right {
        if dom.first_child(right) == Some(li) {
            dom.detach(li);
        }
        if dom.children(right).is_empty() {
            dom.detach(right);
        }
    }
    if let Some(left) = left {
        if dom.children(left).is_empty() {
            dom.detach(left);
            insert_at -= 1;
        }
    }

    let p = dom.create_element_with_tag("p");
    dom.insert_child(limit, insert_at.min(dom.children(limit).len()), p);
    ctx.selection.set_caret(dom, DomPoint::new(p, 0));
    Ok(CommandOutcome::CHANGED)
}

fn insert_line_break(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let caret = collapsed_caret(ctx);
    let dom = &mut *ctx.dom;
    let (container, at) = if dom.is_text(caret.node) {
        let parent = dom.parent(caret.node).expect("resolved caret is attached");
        let split = split_at_point(dom, parent, caret, &SplitOptions::default())
            .map_err(|e| CommandFailure::new(e.to_string()))?;
        (split.node, split.offset)
    } else {
        (caret.node, caret.offset.min(dom.children(caret.node).len()))
    };
    let br = dom.create_element_with_tag("br");
    dom.insert_child(container, at, br);

    // At a block end, anchor the caret on a marker so typing continues on
    // the new line.
    let after = at + 1;
    if after >= dom.children(container).len() {
        let anchor = dom.create_text(String::from(ZERO_WIDTH));
        dom.insert_child(container, after, anchor);
        ctx.selection.set_caret(dom, DomPoint::new(anchor, 1));
    } else {
        ctx.selection.set_caret(dom, DomPoint::new(container, after));
    }
    Ok(CommandOutcome::CHANGED)
}

/// The leaf immediately before `point` within its island, if any.
fn leaf_before(dom: &Dom, point: DomPoint, island: NodeId) -> Option<NodeId> {
    if dom.is_element(point.node) && point.offset > 0 {
        let child = dom.children(point.node)[point.offset - 1];
        if is_unbreakable(dom, child) {
            return Some(child);
        }
        return Some(last_leaf(dom, child, false));
    }
    prev_leaf(dom, point.node, island)
}

/// The leaf immediately after `point` within its island, if any.
fn leaf_after(dom: &Dom, point: DomPoint, island: NodeId) -> Option<NodeId> {
    if dom.is_element(point.node) {
        let kids = dom.children(point.node);
        if point.offset < kids.len() {
            let child = kids[point.offset];
            if is_unbreakable(dom, child) {
                return Some(child);
            }
            return Some(first_leaf(dom, child, false));
        }
    }
    next_leaf(dom, point.node, island)
}

fn delete_backward(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let range = ctx.selection.resolve(ctx.dom);
    if !range.is_collapsed() {
        let caret = delete_range(ctx.dom, range);
        ctx.selection.set_caret(ctx.dom, caret);
        return Ok(CommandOutcome::CHANGED);
    }
    let caret = range.start;
    let dom = &mut *ctx.dom;
    let root = dom.root();

    if dom.is_text(caret.node) && caret.offset > 0 {
        let from = DomPoint::new(caret.node, caret.offset - 1);
        let after = delete_range(dom, DomRange::new(from, caret));
        ctx.selection.set_caret(dom, after);
        return Ok(CommandOutcome::CHANGED);
    }

    let island = nearest_unbreakable(dom, caret.node);
    loop {
        let Some(prev) = leaf_before(dom, caret, island) else {
            return Ok(CommandOutcome::UNCHANGED);
        };
        if is_unbreakable(dom, prev) {
            // Atoms are never edited into from outside.
            return Ok(CommandOutcome::UNCHANGED);
        }
        let prev_block = first_block_ancestor(dom, prev).unwrap_or(root);
        let caret_block = first_block_ancestor(dom, caret.node).unwrap_or(root);
        if prev_block != caret_block {
            // Block boundary: merge without consuming a character.
            let from = point_after_leaf(dom, prev);
            let after = delete_range(dom, DomRange::new(from, caret));
            ctx.selection.set_caret(dom, after);
            return Ok(CommandOutcome::CHANGED);
        }
        if dom.is_text(prev) {
            let len = dom.text_len(prev);
            if len == 0 {
                dom.detach(prev);
                continue;
            }
            let after = delete_range(
                dom,
                DomRange::new(DomPoint::new(prev, len - 1), DomPoint::new(prev, len)),
            );
            ctx.selection.set_caret(dom, after);
            return Ok(CommandOutcome::CHANGED);
        }
        // br or an inline atom like img: remove it whole.
        let parent = dom.parent(prev).expect("leaf in island has a parent");
        let at = dom.index_in_parent(prev).expect("leaf in island has an index");
        dom.detach(prev);
        ctx.selection
            .set_caret(dom, DomPoint::new(parent, at.min(dom.point_max_offset(parent))));
        return Ok(CommandOutcome::CHANGED);
    }
}

fn delete_forward(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let range = ctx.selection.resolve(ctx.dom);
    if !range.is_collapsed() {
        let caret = delete_range(ctx.dom, range);
        ctx.selection.set_caret(ctx.dom, caret);
        return Ok(CommandOutcome::CHANGED);
    }
    let caret = range.start;
    let dom = &mut *ctx.dom;
    let root = dom.root();

    if dom.is_text(caret.node) && caret.offset < dom.text_len(caret.node) {
        let to = DomPoint::new(caret.node, caret.offset + 1);
        let after = delete_range(dom, DomRange::new(caret, to));
        ctx.selection.set_caret(dom, after);
        return Ok(CommandOutcome::CHANGED);
    }

    let island = nearest_unbreakable(dom, caret.node);
    loop {
        let Some(next) = leaf_after(dom, caret, island) else {
            return Ok(CommandOutcome::UNCHANGED);
        };
        if is_unbreakable(dom, next) {
            return Ok(CommandOutcome::UNCHANGED);
        }
        let next_block = first_block_ancestor(dom, next).unwrap_or(root);
        let caret_block = first_block_ancestor(dom, caret.node).unwrap_or(root);
        if next_block != caret_block {
            // Pull the next block into this one.
            let to = DomPoint::start_of(next);
            let after = delete_range(dom, DomRange::new(caret, to));
            ctx.selection.set_caret(dom, after);
            return Ok(CommandOutcome::CHANGED);
        }
        if dom.is_text(next) {
            if dom.text_len(next) == 0 {
                dom.detach(next);
                continue;
            }
            let after = delete_range(
                dom,
                DomRange::new(DomPoint::new(next, 0), DomPoint::new(next, 1)),
            );
            ctx.selection.set_caret(dom, after);
            return Ok(CommandOutcome::CHANGED);
        }
        let parent = dom.parent(next).expect("leaf in island has a parent");
        let at = dom.index_in_parent(next).expect("leaf in island has an index");
        dom.detach(next);
        ctx.selection
            .set_caret(dom, DomPoint::new(parent, at.min(dom.point_max_offset(parent))));
        return Ok(CommandOutcome::CHANGED);
    }
}

/// The position just past `leaf`, in its parent's coordinates.
fn point_after_leaf(dom: &Dom, leaf: NodeId) -> DomPoint {
    if dom.is_text(leaf) {
        return DomPoint::end_of(dom, leaf);
    }
    match (dom.parent(leaf), dom.index_in_parent(leaf)) {
        (Some(parent), Some(at)) => DomPoint::new(parent, at + 1),
        _ => DomPoint::end_of(dom, leaf),
    }
}

fn select_all(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let root = ctx.dom.root();
    let end = ctx.dom.children(root).len();
    ctx.selection.set(
        ctx.dom,
        DomRange::new(DomPoint::new(root, 0), DomPoint::new(root, end)),
    );
    // Selection-only; the document did not change.
    Ok(CommandOutcome::UNCHANGED)
}

/// Tags whose emptiness needs a `<br>` so a caret can land inside them.
pub(crate) fn is_paddable(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "blockquote" | "td" | "th"
    )
}

/// Keeps paddable blocks selectable: empty ones gain a `<br>`, and the
/// padding `<br>` goes away again once real content arrives.
pub(crate) fn pad_blocks(dom: &mut Dom) -> bool {
    let mut changed = false;
    let all = dom.descendants(dom.root());
    for id in all {
        if !dom.is_attached(id) {
            continue;
        }
        let Some(tag) = dom.tag(id) else { continue };
        if !is_paddable(tag) {
            continue;
        }
        let kids = dom.children(id).to_vec();
        if kids.is_empty() {
            let br = dom.create_element_with_tag("br");
            dom.append_child(id, br);
            changed = true;
            continue;
        }
        if kids.len() >= 2 {
            let last = kids[kids.len() - 1];
            let rest_has_content = kids[..kids.len() - 1]
                .iter()
                .any(|&k| !is_blank_node(dom, k));
            if dom.tag(last) == Some("br") && rest_has_content {
                dom.detach(last);
                changed = true;
            }
        }
    }
    changed
}

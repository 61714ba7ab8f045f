//! The collapsible toggle block, the embedded-block pattern the engine
//! ships with.
//!
//! A toggle is a `<div data-embedded="toggle">` container holding two
//! editable regions, a one-line title and a block-level content area.
//! Container and regions are unbreakable, so ordinary editing cannot
//! leak across their edges; structural changes go through the hooks
//! below and always leave either a well-formed toggle or plain
//! paragraphs behind, never a half-block.

use uuid::Uuid;
use vellum_dom::{
    ATTR_EMBEDDED, ATTR_EMBEDDED_EDITABLE, ATTR_TOGGLE_COLLAPSED, ATTR_TOGGLE_ID, Dom, DomPoint,
    NodeId, first_block_ancestor, first_leaf, is_blank_node, is_block_node, is_unbreakable,
    last_leaf,
};

use crate::command::{Command, CommandKind, CommandOutcome, EditCtx};
use crate::error::CommandFailure;
use crate::plugin::{Hook, Plugin, PluginResources};
use crate::plugins::paste::{caret_after, insert_blocks, wrap_inline_runs};
use crate::plugins::text::{TextPlugin, collapsed_caret, is_paddable};

pub(crate) const TOGGLE_KIND: &str = "toggle";
const REGION_TITLE: &str = "title";
const REGION_CONTENT: &str = "content";

#[derive(Debug, Default)]
pub struct TogglePlugin;

impl TogglePlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for TogglePlugin {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["text"]
    }

    fn auto_install(&self) -> Vec<Box<dyn Plugin>> {
        vec![Box::new(TextPlugin::new())]
    }

    fn resources(&self) -> PluginResources {
        PluginResources::new()
            .claim(CommandKind::InsertToggle)
            .claim(CommandKind::ToggleCollapse)
            .intercept(Hook::DeleteBackward)
            .intercept(Hook::Split)
            .intercept(Hook::Tab)
            .intercept(Hook::ShiftTab)
    }

    fn on_command(
        &mut self,
        ctx: &mut EditCtx,
        command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        match command {
            Command::InsertToggle => insert_toggle(ctx),
            Command::ToggleCollapse { id } => toggle_collapse(ctx, id),
            _ => Ok(CommandOutcome::UNCHANGED),
        }
    }

    fn on_hook(
        &mut self,
        ctx: &mut EditCtx,
        hook: Hook,
    ) -> Result<Option<CommandOutcome>, CommandFailure> {
        let range = ctx.selection.resolve(ctx.dom);
        if !range.is_collapsed() {
            return Ok(None);
        }
        let point = range.start;
        let Some((container, region)) = enclosing_region(ctx.dom, point.node) else {
            return Ok(None);
        };
        if ctx.dom.attr(region, ATTR_EMBEDDED_EDITABLE) != Some(REGION_TITLE) {
            return Ok(None);
        }
        match hook {
            Hook::DeleteBackward if at_region_start(ctx.dom, region, point) => {
                dissolve(ctx, container).map(Some)
            }
            Hook::Split => leave_title(ctx, container).map(Some),
            Hook::Tab => nest_under_previous(ctx, container),
            Hook::ShiftTab => unnest(ctx, container),
            _ => Ok(None),
        }
    }

    fn normalize(&mut self, ctx: &mut EditCtx) -> bool {
        let containers: Vec<NodeId> = ctx
            .dom
            .descendants(ctx.dom.root())
            .into_iter()
            .filter(|&n| is_toggle(ctx.dom, n))
            .collect();
        let mut changed = false;
        for container in containers {
            if !ctx.dom.is_attached(container) {
                continue;
            }
            changed |= ensure_structure(ctx.dom, container);
        }
        changed
    }

    fn hint_for(&self, dom: &Dom, node: NodeId) -> Option<String> {
        let (_, region) = enclosing_region(dom, node)?;
        if dom.attr(region, ATTR_EMBEDDED_EDITABLE) != Some(REGION_TITLE) {
            return None;
        }
        if region_is_blank(dom, region) {
            return Some("Toggle title".to_string());
        }
        None
    }
}

pub(crate) fn is_toggle(dom: &Dom, id: NodeId) -> bool {
    dom.attr(id, ATTR_EMBEDDED) == Some(TOGGLE_KIND)
}

fn region_of(dom: &Dom, container: NodeId, role: &str) -> Option<NodeId> {
    dom.children(container)
        .iter()
        .copied()
        .find(|&c| dom.attr(c, ATTR_EMBEDDED_EDITABLE) == Some(role))
}

/// A region is blank when every child is. `is_blank_node` cannot answer
/// this directly: the region div is unbreakable and therefore never
/// blank itself.
fn region_is_blank(dom: &Dom, region: NodeId) -> bool {
    dom.children(region).iter().all(|&c| is_blank_node(dom, c))
}

/// The toggle container and editable region holding `node`, when there
/// is one. The nearest region wins for nested toggles.
fn enclosing_region(dom: &Dom, node: NodeId) -> Option<(NodeId, NodeId)> {
    let mut walk = Some(node);
    while let Some(cur) = walk {
        if dom.has_attr(cur, ATTR_EMBEDDED_EDITABLE) {
            let container = dom.parent(cur)?;
            if is_toggle(dom, container) {
                return Some((container, cur));
            }
            return None;
        }
        walk = dom.parent(cur);
    }
    None
}

fn at_region_start(dom: &Dom, region: NodeId, point: DomPoint) -> bool {
    if point.offset != 0 {
        return false;
    }
    let first = first_leaf(dom, region, false);
    if point.node == first {
        return true;
    }
    dom.is_element(point.node) && first_leaf(dom, point.node, false) == first
}

fn padded_paragraph(dom: &mut Dom) -> NodeId {
    let p = dom.create_element_with_tag("p");
    let br = dom.create_element_with_tag("br");
    dom.append_child(p, br);
    p
}

/// A fresh expanded toggle. Returns the container and the title
/// paragraph the caret belongs in.
fn build_toggle(dom: &mut Dom) -> (NodeId, NodeId) {
    let container = dom.create_element_with_tag("div");
    dom.set_attr(container, ATTR_EMBEDDED, TOGGLE_KIND);
    dom.set_attr(container, ATTR_TOGGLE_ID, Uuid::new_v4().to_string());

    let title = dom.create_element_with_tag("div");
    dom.set_attr(title, ATTR_EMBEDDED_EDITABLE, REGION_TITLE);
    let title_p = padded_paragraph(dom);
    dom.append_child(title, title_p);
    dom.append_child(container, title);

    let content = dom.create_element_with_tag("div");
    dom.set_attr(content, ATTR_EMBEDDED_EDITABLE, REGION_CONTENT);
    let content_p = padded_paragraph(dom);
    dom.append_child(content, content_p);
    dom.append_child(container, content);

    (container, title_p)
}

fn insert_toggle(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let caret = collapsed_caret(ctx);
    let root = ctx.dom.root();
    let block = first_block_ancestor(ctx.dom, caret.node).unwrap_or(root);
    if block != root && is_unbreakable(ctx.dom, block) {
        tracing::debug!(target: "vellum::editor", "insert-toggle needs a splittable block");
        return Ok(CommandOutcome::UNCHANGED);
    }
    if let Some((_, region)) = enclosing_region(ctx.dom, caret.node) {
        if ctx.dom.attr(region, ATTR_EMBEDDED_EDITABLE) == Some(REGION_TITLE) {
            tracing::debug!(target: "vellum::editor", "insert-toggle refused inside a title");
            return Ok(CommandOutcome::UNCHANGED);
        }
    }

    let staging = ctx.dom.create_element_with_tag("div");
    let (container, title_p) = build_toggle(ctx.dom);
    ctx.dom.append_child(staging, container);
    insert_blocks(ctx, staging, caret);
    ctx.selection.set_caret(ctx.dom, DomPoint::new(title_p, 0));
    tracing::debug!(
        target: "vellum::editor",
        id = ctx.dom.attr(container, ATTR_TOGGLE_ID).unwrap_or(""),
        "toggle inserted"
    );
    Ok(CommandOutcome::CHANGED)
}

fn toggle_collapse(ctx: &mut EditCtx, id: &str) -> Result<CommandOutcome, CommandFailure> {
    let root = ctx.dom.root();
    let target = ctx
        .dom
        .descendants(root)
        .into_iter()
        .find(|&n| is_toggle(ctx.dom, n) && ctx.dom.attr(n, ATTR_TOGGLE_ID) == Some(id));
    let Some(container) = target else {
        tracing::debug!(target: "vellum::editor", id, "toggle-collapse target not found");
        return Ok(CommandOutcome::UNCHANGED);
    };

    if ctx.dom.has_attr(container, ATTR_TOGGLE_COLLAPSED) {
        if let Some(el) = ctx.dom.element_mut(container) {
            el.remove_attr(ATTR_TOGGLE_COLLAPSED);
        }
        return Ok(CommandOutcome::CHANGED);
    }
    ctx.dom.set_attr(container, ATTR_TOGGLE_COLLAPSED, "true");

    // A caret the collapse would hide moves to the end of the title.
    let range = ctx.selection.resolve(ctx.dom);
    if let Some(content) = region_of(ctx.dom, container, REGION_CONTENT) {
        let hidden = ctx.dom.contains(content, range.start.node)
            || ctx.dom.contains(content, range.end.node);
        if hidden {
            if let Some(title) = region_of(ctx.dom, container, REGION_TITLE) {
                let leaf = last_leaf(ctx.dom, title, false);
                let caret = caret_after(ctx.dom, leaf);
                ctx.selection.set_caret(ctx.dom, caret);
            }
        }
    }
    Ok(CommandOutcome::CHANGED)
}

/// Backspace at the start of a title: the title line merges into the
/// preceding paragraph (or becomes one) and the content is promoted to
/// siblings. The toggle itself is gone afterwards.
fn dissolve(ctx: &mut EditCtx, container: NodeId) -> Result<CommandOutcome, CommandFailure> {
    let dom = &mut *ctx.dom;
    let Some(parent) = dom.parent(container) else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let at = dom.index_in_parent(container).expect("attached container has an index");

    let mut line: Vec<NodeId> = Vec::new();
    if let Some(title) = region_of(dom, container, REGION_TITLE) {
        for block in dom.take_children(title) {
            if is_block_node(dom, block) && !is_unbreakable(dom, block) {
                line.extend(dom.take_children(block));
            } else {
                line.push(block);
            }
        }
    }
    line.retain(|&n| !is_blank_node(dom, n));

    let promoted: Vec<NodeId> = match region_of(dom, container, REGION_CONTENT) {
        Some(content) if !region_is_blank(dom, content) => dom.take_children(content),
        _ => Vec::new(),
    };

    let prev = at.checked_sub(1).map(|i| dom.children(parent)[i]);
    let target =
        prev.filter(|&p| dom.tag(p).is_some_and(is_paddable) && !is_unbreakable(dom, p));
    dom.detach(container);

    let caret = match target {
        Some(prev) => {
            if is_blank_node(dom, prev) {
                dom.take_children(prev);
            }
            let seam = dom.children(prev).len();
            for &n in &line {
                dom.append_child(prev, n);
            }
            for (k, &n) in promoted.iter().enumerate() {
                dom.insert_child(parent, at + k, n);
            }
            DomPoint::new(prev, seam)
        }
        None => {
            let p = dom.create_element_with_tag("p");
            for &n in &line {
                dom.append_child(p, n);
            }
            if dom.children(p).is_empty() {
                let br = dom.create_element_with_tag("br");
                dom.append_child(p, br);
            }
            dom.insert_child(parent, at, p);
            for (k, &n) in promoted.iter().enumerate() {
                dom.insert_child(parent, at + 1 + k, n);
            }
            DomPoint::new(p, 0)
        }
    };
    ctx.selection.set_caret(dom, caret);
    tracing::debug!(target: "vellum::editor", "toggle dissolved into paragraphs");
    Ok(CommandOutcome::CHANGED)
}

/// Enter in a title. Expanded: the caret enters the first content block.
/// Collapsed: a fresh paragraph opens after the whole toggle.
fn leave_title(ctx: &mut EditCtx, container: NodeId) -> Result<CommandOutcome, CommandFailure> {
    let dom = &mut *ctx.dom;
    if dom.has_attr(container, ATTR_TOGGLE_COLLAPSED) {
        let Some(parent) = dom.parent(container) else {
            return Ok(CommandOutcome::UNCHANGED);
        };
        let at = dom.index_in_parent(container).expect("attached container has an index");
        let p = padded_paragraph(dom);
        dom.insert_child(parent, at + 1, p);
        ctx.selection.set_caret(dom, DomPoint::new(p, 0));
        return Ok(CommandOutcome::CHANGED);
    }

    let repaired = ensure_structure(dom, container);
    let content = region_of(dom, container, REGION_CONTENT).expect("structure ensured above");
    let first = dom.children(content)[0];
    let caret = if is_unbreakable(dom, first) {
        DomPoint::new(content, 0)
    } else {
        DomPoint::new(first, 0)
    };
    ctx.selection.set_caret(dom, caret);
    if repaired {
        Ok(CommandOutcome::CHANGED)
    } else {
        // Caret movement only.
        Ok(CommandOutcome::UNCHANGED)
    }
}

/// Tab in a title: the toggle nests as the first child of the previous
/// sibling toggle's content region. The target expands so the move stays
/// visible.
fn nest_under_previous(
    ctx: &mut EditCtx,
    container: NodeId,
) -> Result<Option<CommandOutcome>, CommandFailure> {
    let dom = &mut *ctx.dom;
    let Some(parent) = dom.parent(container) else {
        return Ok(None);
    };
    let at = dom.index_in_parent(container).expect("attached container has an index");
    let prev = match at.checked_sub(1).map(|i| dom.children(parent)[i]) {
        Some(prev) if is_toggle(dom, prev) => prev,
        _ => return Ok(None),
    };

    ensure_structure(dom, prev);
    let content = region_of(dom, prev, REGION_CONTENT).expect("structure ensured above");
    if region_is_blank(dom, content) {
        dom.take_children(content);
    }
    if let Some(el) = dom.element_mut(prev) {
        el.remove_attr(ATTR_TOGGLE_COLLAPSED);
    }
    dom.insert_child(content, 0, container);
    tracing::debug!(target: "vellum::editor", "toggle nested under its previous sibling");
    Ok(Some(CommandOutcome::CHANGED))
}

/// Shift-tab in a title: a nested toggle moves out to sit right after
/// the toggle that contained it.
fn unnest(
    ctx: &mut EditCtx,
    container: NodeId,
) -> Result<Option<CommandOutcome>, CommandFailure> {
    let dom = &mut *ctx.dom;
    let region = match dom.parent(container) {
        Some(p) if dom.has_attr(p, ATTR_EMBEDDED_EDITABLE) => p,
        _ => return Ok(None),
    };
    let outer = match dom.parent(region) {
        Some(o) if is_toggle(dom, o) => o,
        _ => return Ok(None),
    };
    let Some(dest) = dom.parent(outer) else {
        return Ok(None);
    };
    let at = dom.index_in_parent(outer).expect("attached container has an index");
    dom.insert_child(dest, at + 1, container);
    ensure_structure(dom, outer);
    tracing::debug!(target: "vellum::editor", "toggle moved out of its parent");
    Ok(Some(CommandOutcome::CHANGED))
}

/// Repairs one container to the canonical shape: a fresh id when the
/// attribute is missing, a title region first, a content region after
/// it, stray children folded into the content, and both regions holding
/// at least one block.
fn ensure_structure(dom: &mut Dom, container: NodeId) -> bool {
    let mut changed = false;

    if dom.attr(container, ATTR_TOGGLE_ID).map_or(true, str::is_empty) {
        dom.set_attr(container, ATTR_TOGGLE_ID, Uuid::new_v4().to_string());
        changed = true;
    }

    let title = match region_of(dom, container, REGION_TITLE) {
        Some(t) => t,
        None => {
            let t = dom.create_element_with_tag("div");
            dom.set_attr(t, ATTR_EMBEDDED_EDITABLE, REGION_TITLE);
            dom.insert_child(container, 0, t);
            changed = true;
            t
        }
    };
    if dom.index_in_parent(title) != Some(0) {
        dom.insert_child(container, 0, title);
        changed = true;
    }
    let content = match region_of(dom, container, REGION_CONTENT) {
        Some(c) => c,
        None => {
            let c = dom.create_element_with_tag("div");
            dom.set_attr(c, ATTR_EMBEDDED_EDITABLE, REGION_CONTENT);
            dom.append_child(container, c);
            changed = true;
            c
        }
    };

    let stray: Vec<NodeId> = dom
        .children(container)
        .iter()
        .copied()
        .filter(|&c| c != title && c != content)
        .collect();
    for n in stray {
        dom.append_child(content, n);
        changed = true;
    }

    for region in [title, content] {
        let has_inline = dom.children(region).iter().any(|&c| !is_block_node(dom, c));
        if has_inline {
            wrap_inline_runs(dom, region);
            changed = true;
        }
        if dom.children(region).is_empty() {
            let p = padded_paragraph(dom);
            dom.append_child(region, p);
            changed = true;
        }
    }
    changed
}

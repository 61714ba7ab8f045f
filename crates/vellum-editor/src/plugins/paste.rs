//! Paste handling: clipboard HTML is parsed into a detached staging
//! element, sanitized down to the editor's allowed subset, then inserted
//! at the selection.
//!
//! Sanitization is fail-safe rather than fail-fast. Clipboard markup is
//! untrusted and frequently malformed, so every pass is total: the worst
//! input produces an empty payload and the command inserts nothing.
//! Running the sanitizer on its own output changes nothing.

use std::collections::HashSet;

use uuid::Uuid;
use vellum_dom::{
    ATTR_EMBEDDED, ATTR_EMBEDDED_EDITABLE, ATTR_TOGGLE_COLLAPSED, ATTR_TOGGLE_ID, Dom, DomPoint,
    NodeId, SerializeOptions, SplitOptions, ZERO_WIDTH, first_block_ancestor, is_blank_node,
    is_block_node, is_block_tag, is_format_tag, is_unbreakable, is_void_tag, last_leaf,
    merge_adjacent_same_tag, parse_fragment, serialize_children, split_at_point, unwrap_node,
    wrap_nodes,
};

use crate::command::{Command, CommandKind, CommandOutcome, EditCtx};
use crate::error::CommandFailure;
use crate::plugin::{Plugin, PluginResources};
use crate::plugins::text::{caret_boundary, collapsed_caret, is_paddable};

#[derive(Debug, Default)]
pub struct PastePlugin;

impl PastePlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for PastePlugin {
    fn name(&self) -> &'static str {
        "paste"
    }

    fn resources(&self) -> PluginResources {
        PluginResources::new().claim(CommandKind::Paste)
    }

    fn on_command(
        &mut self,
        ctx: &mut EditCtx,
        command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        match command {
            Command::Paste { html, text } => paste(ctx, html.as_deref(), text.as_deref()),
            _ => Ok(CommandOutcome::UNCHANGED),
        }
    }
}

/// Sanitizes untrusted clipboard HTML down to the editor's allowed subset
/// and returns the result as HTML. Total over arbitrary input.
pub fn sanitize_html(html: &str) -> String {
    let mut dom = Dom::new();
    let staging = dom.create_element_with_tag("div");
    parse_fragment(&mut dom, staging, html);
    sanitize_fragment(&mut dom, staging);
    serialize_children(&dom, staging, &SerializeOptions::history())
}

fn paste(
    ctx: &mut EditCtx,
    html: Option<&str>,
    text: Option<&str>,
) -> Result<CommandOutcome, CommandFailure> {
    let staging = ctx.dom.create_element_with_tag("div");
    match (html, text) {
        (Some(html), _) => {
            parse_fragment(ctx.dom, staging, html);
            sanitize_fragment(ctx.dom, staging);
        }
        (None, Some(text)) => stage_plain_text(ctx.dom, staging, text),
        (None, None) => {}
    }
    regenerate_duplicate_ids(ctx.dom, staging);

    let had_selection = !ctx.selection.resolve(ctx.dom).is_collapsed();
    tracing::debug!(
        target: "vellum::editor",
        nodes = ctx.dom.children(staging).len(),
        had_selection,
        "paste"
    );
    if ctx.dom.children(staging).is_empty() {
        if !had_selection {
            return Ok(CommandOutcome::UNCHANGED);
        }
        collapsed_caret(ctx);
        return Ok(CommandOutcome::CHANGED);
    }
    let caret = collapsed_caret(ctx);
    let all_inline = ctx
        .dom
        .children(staging)
        .iter()
        .all(|&n| !is_block_node(ctx.dom, n));
    if all_inline {
        insert_inline(ctx, staging, caret);
    } else {
        insert_blocks(ctx, staging, caret);
    }
    Ok(CommandOutcome::CHANGED)
}

// === Sanitization ===

fn is_denied_tag(tag: &str) -> bool {
    matches!(
        tag,
        "script"
            | "style"
            | "meta"
            | "head"
            | "title"
            | "link"
            | "iframe"
            | "object"
            | "embed"
            | "form"
            | "input"
            | "button"
            | "select"
            | "textarea"
    )
}

fn is_allowed_node(dom: &Dom, id: NodeId) -> bool {
    let Some(tag) = dom.tag(id) else {
        return true;
    };
    if tag == "div" {
        return dom.has_attr(id, ATTR_EMBEDDED) || dom.has_attr(id, ATTR_EMBEDDED_EDITABLE);
    }
    is_block_tag(tag) || is_format_tag(tag) || matches!(tag, "a" | "br" | "img")
}

fn is_allowed_attr(name: &str) -> bool {
    matches!(name, "class" | "href" | "src")
        || name == ATTR_EMBEDDED
        || name == ATTR_EMBEDDED_EDITABLE
        || name == ATTR_TOGGLE_ID
        || name == ATTR_TOGGLE_COLLAPSED
}

pub(crate) fn sanitize_fragment(dom: &mut Dom, staging: NodeId) {
    drop_denied(dom, staging);
    unwrap_disallowed(dom, staging);
    strip_attrs(dom, staging);
    prune_invisible_inline(dom, staging);
    prune_empty_containers(dom, staging);
    pad_or_drop_empty_blocks(dom, staging);
    wrap_cell_inline(dom, staging);
    wrap_interior_inline(dom, staging);
    merge_lists(dom, staging);
}

/// Removes deny-listed elements with their whole subtree.
fn drop_denied(dom: &mut Dom, staging: NodeId) {
    let denied: Vec<NodeId> = dom
        .descendants(staging)
        .into_iter()
        .filter(|&n| dom.tag(n).is_some_and(is_denied_tag))
        .collect();
    for n in denied {
        if dom.contains(staging, n) {
            dom.detach(n);
        }
    }
}

/// Unwraps elements outside the allow-list until none remain. Each pass
/// removes one element, so the loop is bounded by the tree size.
fn unwrap_disallowed(dom: &mut Dom, staging: NodeId) {
    loop {
        let target = dom
            .descendants(staging)
            .into_iter()
            .find(|&n| !is_allowed_node(dom, n));
        match target {
            Some(n) => {
                unwrap_node(dom, n);
            }
            None => break,
        }
    }
}

fn strip_attrs(dom: &mut Dom, staging: NodeId) {
    for n in dom.descendants(staging) {
        if let Some(el) = dom.element_mut(n) {
            el.retain_attrs(is_allowed_attr);
        }
    }
}

/// Scrubs zero-width marker characters out of pasted text and drops
/// childless inline elements, to a fixed point so emptied wrappers go too.
fn prune_invisible_inline(dom: &mut Dom, staging: NodeId) {
    let marked: Vec<NodeId> = dom
        .descendants(staging)
        .into_iter()
        .filter(|&n| dom.text(n).is_some_and(|t| t.contains(ZERO_WIDTH)))
        .collect();
    for n in marked {
        let scrubbed: String = dom
            .text(n)
            .unwrap_or("")
            .chars()
            .filter(|&c| c != ZERO_WIDTH)
            .collect();
        if scrubbed.is_empty() {
            dom.detach(n);
        } else {
            dom.set_text(n, scrubbed);
        }
    }
    loop {
        let stale: Vec<NodeId> = dom
            .descendants(staging)
            .into_iter()
            .filter(|&n| {
                dom.tag(n)
                    .is_some_and(|t| !is_block_tag(t) && !is_void_tag(t))
                    && dom.children(n).is_empty()
            })
            .collect();
        if stale.is_empty() {
            break;
        }
        for n in stale {
            dom.detach(n);
        }
    }
}

fn is_structural_container(tag: &str) -> bool {
    matches!(tag, "ul" | "ol" | "table" | "thead" | "tbody" | "tfoot" | "tr")
}

/// Removes list and table containers left childless, bottom-up.
fn prune_empty_containers(dom: &mut Dom, staging: NodeId) {
    loop {
        let empties: Vec<NodeId> = dom
            .descendants(staging)
            .into_iter()
            .filter(|&n| {
                dom.tag(n).is_some_and(is_structural_container) && dom.children(n).is_empty()
            })
            .collect();
        if empties.is_empty() {
            break;
        }
        for n in empties {
            dom.detach(n);
        }
    }
}

/// Empty paddable blocks gain a `<br>` so the caret has a landing spot;
/// empty embedded regions get a padded paragraph. Other empty blocks are
/// dropped, except embedded containers, whose owning plugin rebuilds
/// their interior on the next normalize pass.
fn pad_or_drop_empty_blocks(dom: &mut Dom, staging: NodeId) {
    let empties: Vec<NodeId> = dom
        .descendants(staging)
        .into_iter()
        .filter(|&n| {
            dom.tag(n)
                .is_some_and(|t| is_block_tag(t) && !is_void_tag(t))
                && dom.children(n).is_empty()
        })
        .collect();
    for n in empties {
        let Some(tag) = dom.tag(n) else { continue };
        if is_paddable(tag) {
            let br = dom.create_element_with_tag("br");
            dom.append_child(n, br);
        } else if dom.has_attr(n, ATTR_EMBEDDED_EDITABLE) {
            let p = dom.create_element_with_tag("p");
            let br = dom.create_element_with_tag("br");
            dom.append_child(p, br);
            dom.append_child(n, p);
        } else if !dom.has_attr(n, ATTR_EMBEDDED) {
            dom.detach(n);
        }
    }
}

/// Table cells only hold block children; bare inline runs get a paragraph.
fn wrap_cell_inline(dom: &mut Dom, staging: NodeId) {
    let cells: Vec<NodeId> = dom
        .descendants(staging)
        .into_iter()
        .filter(|&n| matches!(dom.tag(n), Some("td" | "th")))
        .collect();
    for cell in cells {
        wrap_inline_runs(dom, cell);
    }
}

pub(crate) fn wrap_inline_runs(dom: &mut Dom, parent: NodeId) {
    let mut i = 0;
    while i < dom.children(parent).len() {
        if is_block_node(dom, dom.children(parent)[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut run: Vec<NodeId> = Vec::new();
        while i < dom.children(parent).len() {
            let c = dom.children(parent)[i];
            if is_block_node(dom, c) {
                break;
            }
            run.push(c);
            i += 1;
        }
        wrap_nodes(dom, &run, "p");
        i = start + 1;
    }
}

/// Inline runs sitting between blocks at the payload's top level become
/// paragraphs. Leading and trailing runs stay bare; insertion flows them
/// into the blocks next to the caret.
fn wrap_interior_inline(dom: &mut Dom, staging: NodeId) {
    let kids = dom.children(staging);
    let Some(first_block) = kids.iter().position(|&n| is_block_node(dom, n)) else {
        return;
    };
    let Some(last_block) = kids.iter().rposition(|&n| is_block_node(dom, n)) else {
        return;
    };
    if last_block <= first_block + 1 {
        return;
    }
    let mut i = first_block + 1;
    let mut end = last_block;
    while i < end {
        if is_block_node(dom, dom.children(staging)[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut run: Vec<NodeId> = Vec::new();
        while i < end && !is_block_node(dom, dom.children(staging)[i]) {
            run.push(dom.children(staging)[i]);
            i += 1;
        }
        wrap_nodes(dom, &run, "p");
        // The run collapsed into one paragraph; later indices shift left.
        end -= run.len() - 1;
        i = start + 1;
    }
}

/// Adjacent same-tag lists merge, including ones surfaced by unwrapping.
fn merge_lists(dom: &mut Dom, staging: NodeId) {
    let parents: Vec<NodeId> = std::iter::once(staging)
        .chain(dom.descendants(staging))
        .filter(|&n| !dom.is_text(n))
        .collect();
    for p in parents {
        merge_adjacent_same_tag(dom, p);
    }
}

/// Pasted toggle blocks whose id collides with one already in the
/// document (or earlier in the payload) get a fresh id.
fn regenerate_duplicate_ids(dom: &mut Dom, staging: NodeId) {
    let mut seen: HashSet<String> = dom
        .descendants(dom.root())
        .into_iter()
        .filter_map(|n| dom.attr(n, ATTR_TOGGLE_ID).map(str::to_owned))
        .collect();
    let stamped: Vec<NodeId> = dom
        .descendants(staging)
        .into_iter()
        .filter(|&n| dom.has_attr(n, ATTR_TOGGLE_ID))
        .collect();
    for n in stamped {
        let id = dom.attr(n, ATTR_TOGGLE_ID).unwrap_or("").to_owned();
        if id.is_empty() || seen.contains(&id) {
            let fresh = Uuid::new_v4().to_string();
            tracing::debug!(target: "vellum::editor", "pasted toggle id regenerated");
            dom.set_attr(n, ATTR_TOGGLE_ID, fresh.clone());
            seen.insert(fresh);
        } else {
            seen.insert(id);
        }
    }
}

// === Staging and insertion ===

/// Plain text becomes one paragraph per line; a single line stays inline
/// so it flows into the text at the caret.
fn stage_plain_text(dom: &mut Dom, staging: NodeId, text: &str) {
    if text.is_empty() {
        return;
    }
    if !text.contains('\n') {
        let t = dom.create_text(text);
        dom.append_child(staging, t);
        return;
    }
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let p = dom.create_element_with_tag("p");
        if line.is_empty() {
            let br = dom.create_element_with_tag("br");
            dom.append_child(p, br);
        } else {
            let t = dom.create_text(line);
            dom.append_child(p, t);
        }
        dom.append_child(staging, p);
    }
}

pub(crate) fn insert_inline(ctx: &mut EditCtx, staging: NodeId, caret: DomPoint) {
    let nodes = ctx.dom.take_children(staging);
    let Some(&last) = nodes.last() else {
        return;
    };
    let Some(boundary) = caret_boundary(ctx.dom, caret) else {
        return;
    };
    for (k, &n) in nodes.iter().enumerate() {
        ctx.dom.insert_child(boundary.node, boundary.offset + k, n);
    }
    let caret = caret_after(ctx.dom, last);
    ctx.selection.set_caret(ctx.dom, caret);
}

pub(crate) fn insert_blocks(ctx: &mut EditCtx, staging: NodeId, caret: DomPoint) {
    let root = ctx.dom.root();
    let block = first_block_ancestor(ctx.dom, caret.node).unwrap_or(root);

    // A block that cannot split (table cell, embedded region) takes the
    // payload flattened to lines instead.
    if block != root && is_unbreakable(ctx.dom, block) {
        flatten_blocks(ctx.dom, staging);
        insert_inline(ctx, staging, caret);
        return;
    }
    let limit = if block == root {
        root
    } else {
        ctx.dom.parent(block).unwrap_or(root)
    };
    let boundary = match split_at_point(ctx.dom, limit, caret, &SplitOptions::default()) {
        Ok(b) => b,
        Err(_) => {
            flatten_blocks(ctx.dom, staging);
            insert_inline(ctx, staging, caret);
            return;
        }
    };

    let kids = ctx.dom.take_children(staging);
    let Some(first_block) = kids.iter().position(|&n| is_block_node(ctx.dom, n)) else {
        return;
    };
    let Some(last_block) = kids.iter().rposition(|&n| is_block_node(ctx.dom, n)) else {
        return;
    };
    let leading = &kids[..first_block];
    let blocks = &kids[first_block..=last_block];
    let trailing = &kids[last_block + 1..];

    // Splitting a block always yields both halves; at the root there are
    // none and everything lands at the boundary.
    let (left, right) = if block == root {
        (None, None)
    } else {
        (
            Some(ctx.dom.children(limit)[boundary.offset - 1]),
            Some(ctx.dom.children(limit)[boundary.offset]),
        )
    };

    let mut at = boundary.offset;
    match left {
        Some(left) if !leading.is_empty() => {
            for &n in leading {
                ctx.dom.append_child(left, n);
            }
        }
        _ => {
            for &n in leading {
                ctx.dom.insert_child(limit, at, n);
                at += 1;
            }
        }
    }
    for &n in blocks {
        ctx.dom.insert_child(limit, at, n);
        at += 1;
    }
    match right {
        Some(right) if !trailing.is_empty() => {
            for (k, &n) in trailing.iter().enumerate() {
                ctx.dom.insert_child(right, k, n);
            }
        }
        _ => {
            for &n in trailing {
                ctx.dom.insert_child(limit, at, n);
                at += 1;
            }
        }
    }

    // An untouched empty half is split residue, not content.
    if let Some(left) = left {
        if leading.is_empty() && is_blank_node(ctx.dom, left) {
            ctx.dom.detach(left);
        }
    }
    if let Some(right) = right {
        if trailing.is_empty() && is_blank_node(ctx.dom, right) {
            ctx.dom.detach(right);
        }
    }

    let caret = if !trailing.is_empty() {
        match right {
            Some(right) => DomPoint::new(right, trailing.len()),
            None => caret_after(ctx.dom, kids[kids.len() - 1]),
        }
    } else {
        caret_after_block(ctx.dom, blocks[blocks.len() - 1])
    };
    ctx.selection.set_caret(ctx.dom, caret);
}

/// Hoists block children of `staging` to inline content, a `<br>` joining
/// the lines. Embedded blocks cannot be flattened and are dropped.
fn flatten_blocks(dom: &mut Dom, staging: NodeId) {
    loop {
        let Some((i, block)) = dom
            .children(staging)
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, c)| is_block_node(dom, c))
        else {
            break;
        };
        if is_unbreakable(dom, block) {
            dom.detach(block);
            continue;
        }
        let needs_break =
            i > 0 && dom.tag(dom.children(staging)[i - 1]) != Some("br");
        let promoted = unwrap_node(dom, block);
        if needs_break && !promoted.is_empty() {
            let br = dom.create_element_with_tag("br");
            dom.insert_child(staging, i, br);
        }
    }
}

pub(crate) fn caret_after(dom: &Dom, last: NodeId) -> DomPoint {
    if dom.is_text(last) {
        return DomPoint::end_of(dom, last);
    }
    match (dom.parent(last), dom.index_in_parent(last)) {
        (Some(p), Some(at)) => DomPoint::new(p, at + 1),
        _ => DomPoint::start_of(dom.root()),
    }
}

/// The natural caret after pasting `block`: inside its end, or right
/// after it when its interior is off limits.
fn caret_after_block(dom: &Dom, block: NodeId) -> DomPoint {
    if is_unbreakable(dom, block) {
        if let (Some(p), Some(at)) = (dom.parent(block), dom.index_in_parent(block)) {
            return DomPoint::new(p, at + 1);
        }
    }
    let leaf = last_leaf(dom, block, false);
    if leaf != block
        && (is_unbreakable(dom, leaf) || dom.tag(leaf).is_some_and(is_void_tag))
    {
        if let (Some(p), Some(at)) = (dom.parent(leaf), dom.index_in_parent(leaf)) {
            return DomPoint::new(p, at + 1);
        }
    }
    DomPoint::end_of(dom, leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_dom::DomRange;

    use crate::selection::SelectionState;

    fn make_doc(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        dom
    }

    fn html_of(dom: &Dom) -> String {
        serialize_children(dom, dom.root(), &SerializeOptions::history())
    }

    fn paste_html(dom: &mut Dom, sel: &mut SelectionState, html: &str) -> CommandOutcome {
        let mut plugin = PastePlugin::new();
        let mut ctx = EditCtx::new(dom, sel);
        let command = Command::Paste { html: Some(html.into()), text: None };
        plugin.on_command(&mut ctx, &command).unwrap()
    }

    fn paste_text(dom: &mut Dom, sel: &mut SelectionState, text: &str) -> CommandOutcome {
        let mut plugin = PastePlugin::new();
        let mut ctx = EditCtx::new(dom, sel);
        let command = Command::Paste { html: None, text: Some(text.into()) };
        plugin.on_command(&mut ctx, &command).unwrap()
    }

    #[test]
    fn test_sanitize_drops_scripts_and_unwraps_divs() {
        assert_eq!(
            sanitize_html("<div><script>alert(1)</script><p>hello</p></div>"),
            "<p>hello</p>"
        );
    }

    #[test]
    fn test_sanitize_pads_empty_paragraphs() {
        assert_eq!(sanitize_html("<p></p>"), "<p><br></p>");
    }

    #[test]
    fn test_sanitize_strips_attributes_outside_the_allow_list() {
        assert_eq!(
            sanitize_html(r#"<p style="color:red" class="note">a<a href="x" onclick="e()">l</a></p>"#),
            r#"<p class="note">a<a href="x">l</a></p>"#
        );
    }

    #[test]
    fn test_sanitize_wraps_bare_inline_in_cells() {
        assert_eq!(
            sanitize_html("<table><tr><td>a<b>c</b></td></tr></table>"),
            "<table><tr><td><p>a<b>c</b></p></td></tr></table>"
        );
    }

    #[test]
    fn test_sanitize_leaves_root_inline_bare() {
        assert_eq!(sanitize_html("a<b>c</b>"), "a<b>c</b>");
    }

    #[test]
    fn test_sanitize_wraps_inline_between_blocks() {
        assert_eq!(
            sanitize_html("a<p>b</p>c<p>d</p>e"),
            "a<p>b</p><p>c</p><p>d</p>e"
        );
    }

    #[test]
    fn test_sanitize_merges_lists_surfaced_by_unwrapping() {
        assert_eq!(
            sanitize_html("<div><ul><li>a</li></ul></div><ul><li>b</li></ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_sanitize_keeps_embedded_containers() {
        let toggle = "<div data-embedded=\"toggle\" data-toggle-id=\"t1\">\
            <div data-embedded-editable=\"title\"><p>t</p></div>\
            <div data-embedded-editable=\"content\"><p>c</p></div></div>";
        assert_eq!(sanitize_html(toggle), toggle);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in [
            "<div><script>alert(1)</script><p>hello</p></div>",
            "<p></p>",
            "a<p>b</p>c<p>d</p>e",
            "<span>x<font>y</font></span>",
            "<table><tr><td>a</td></tr></table>",
            "<ul></ul><ul><li>a</li></ul><ul><li>b</li></ul>",
            "<<<>>>",
            "<b></b><i>\u{200B}</i>",
        ] {
            let once = sanitize_html(input);
            assert_eq!(sanitize_html(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_paste_inline_at_the_caret() {
        let mut dom = make_doc("<p>ab</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        let out = paste_html(&mut dom, &mut sel, "<b>x</b>y");
        assert!(out.changed);
        assert_eq!(html_of(&dom), "<p>a<b>x</b>yb</p>");

        let p = dom.children(dom.root())[0];
        let y = dom.children(p)[2];
        assert_eq!(sel.resolve(&dom).start, DomPoint::new(y, 1));
    }

    #[test]
    fn test_paste_blocks_split_the_paragraph() {
        let mut dom = make_doc("<p>abcd</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 2));

        paste_html(&mut dom, &mut sel, "<p>X</p><p>Y</p>");
        assert_eq!(html_of(&dom), "<p>ab</p><p>X</p><p>Y</p><p>cd</p>");
    }

    #[test]
    fn test_paste_distributes_edge_inline_runs() {
        let mut dom = make_doc("<p>abcd</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 2));

        paste_html(&mut dom, &mut sel, "x<p>M</p>y");
        assert_eq!(html_of(&dom), "<p>abx</p><p>M</p><p>ycd</p>");

        // Caret sits after the pasted "y", before the original tail.
        let last = dom.children(dom.root())[2];
        assert_eq!(sel.resolve(&dom).start, DomPoint::new(last, 1));
    }

    #[test]
    fn test_paste_at_block_edges_leaves_no_empty_halves() {
        let mut dom = make_doc("<p>ab</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 2));

        paste_html(&mut dom, &mut sel, "<p>X</p>");
        assert_eq!(html_of(&dom), "<p>ab</p><p>X</p>");
    }

    #[test]
    fn test_paste_replaces_the_selection() {
        let mut dom = make_doc("<p>abcd</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t, 1), DomPoint::new(t, 3)));

        paste_text(&mut dom, &mut sel, "z");
        assert_eq!(html_of(&dom), "<p>azd</p>");
    }

    #[test]
    fn test_paste_plain_text_makes_a_paragraph_per_line() {
        let mut dom = make_doc("<p>xy</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        paste_text(&mut dom, &mut sel, "a\nb");
        assert_eq!(html_of(&dom), "<p>x</p><p>a</p><p>b</p><p>y</p>");
    }

    #[test]
    fn test_paste_into_a_cell_flattens_blocks() {
        let mut dom = make_doc("<table><tr><td>x</td></tr></table>");
        let table = dom.children(dom.root())[0];
        let tr = dom.children(table)[0];
        let td = dom.children(tr)[0];
        let t = dom.children(td)[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        paste_html(&mut dom, &mut sel, "<p>a</p><p>b</p>");
        assert_eq!(
            html_of(&dom),
            "<table><tr><td>xa<br>b</td></tr></table>"
        );
    }

    #[test]
    fn test_paste_regenerates_colliding_toggle_ids() {
        let toggle = "<div data-embedded=\"toggle\" data-toggle-id=\"t1\">\
            <div data-embedded-editable=\"title\"><p>t</p></div>\
            <div data-embedded-editable=\"content\"><p>c</p></div></div>";
        let mut dom = make_doc(&format!("{toggle}<p>c</p>"));
        let p = dom.children(dom.root())[1];
        let t = dom.children(p)[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        paste_html(&mut dom, &mut sel, toggle);

        let pasted = dom.children(dom.root())[2];
        let id = dom.attr(pasted, ATTR_TOGGLE_ID).unwrap_or("");
        assert_eq!(dom.attr(pasted, ATTR_EMBEDDED), Some("toggle"));
        assert!(!id.is_empty());
        assert_ne!(id, "t1");
        let original = dom.children(dom.root())[0];
        assert_eq!(dom.attr(original, ATTR_TOGGLE_ID), Some("t1"));
    }

    #[test]
    fn test_paste_of_nothing_but_junk_is_a_no_op() {
        let mut dom = make_doc("<p>ab</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        let out = paste_html(&mut dom, &mut sel, "<script>boom()</script>");
        assert!(!out.changed);
        assert_eq!(html_of(&dom), "<p>ab</p>");
    }
}

//! Inline format toggling.
//!
//! A toggle first decides its direction: the format is removed only when
//! every text leaf under the selection already carries it, otherwise the
//! selection converges to fully styled. Removal splits the format spans
//! at the selection edges and unwraps the covered middle; application
//! wraps runs of covered siblings in one span and merges with adjacent
//! same-format spans afterwards. Children move between spans but text
//! nodes are never joined, so leaf ids stay valid for reselection.
//!
//! Positions are tracked as absolute text offsets across the whole pass.
//! None of the edits here add or remove characters, which makes those
//! offsets stable through every split, wrap and unwrap.

use vellum_dom::{
    Dom, DomPoint, DomRange, Format, NodeId, SplitOptions, ZERO_WIDTH, is_blank_node,
    is_block_node, is_format_tag, is_unbreakable, merge_adjacent_when, next_leaf, split_at_point,
    unwrap_node, wrap_nodes,
};

use crate::command::{Command, CommandKind, CommandOutcome, EditCtx};
use crate::error::CommandFailure;
use crate::plugin::{Plugin, PluginResources};
use crate::plugins::text::caret_boundary;
use crate::selection::{absolute_text_offset, point_at_text_offset};

#[derive(Debug, Default)]
pub struct FormatPlugin;

impl FormatPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for FormatPlugin {
    fn name(&self) -> &'static str {
        "format"
    }

    fn resources(&self) -> PluginResources {
        PluginResources::new()
            .claim(CommandKind::ToggleFormat)
            .claim(CommandKind::RemoveFormat)
    }

    fn on_command(
        &mut self,
        ctx: &mut EditCtx,
        command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        match command {
            Command::ToggleFormat(format) => toggle_format(ctx, *format),
            Command::RemoveFormat => remove_all_formats(ctx),
            _ => Ok(CommandOutcome::UNCHANGED),
        }
    }

    fn normalize(&mut self, ctx: &mut EditCtx) -> bool {
        clean_markers(ctx)
    }
}

fn format_of(dom: &Dom, id: NodeId) -> Option<Format> {
    dom.tag(id).and_then(Format::from_tag)
}

/// Any ancestor of `node` carries `format`. Synonym tags count.
fn has_format(dom: &Dom, node: NodeId, format: Format) -> bool {
    dom.ancestors(node).iter().any(|&a| format_of(dom, a) == Some(format))
}

/// The outermost ancestor of `node` carrying `format`.
fn highest_format_ancestor(dom: &Dom, node: NodeId, format: Format) -> Option<NodeId> {
    dom.ancestors(node)
        .into_iter()
        .filter(|&a| format_of(dom, a) == Some(format))
        .last()
}

fn contains_format(dom: &Dom, id: NodeId, format: Format) -> bool {
    dom.descendants(id).iter().any(|&n| format_of(dom, n) == Some(format))
}

/// A text node holding nothing but zero-width marker characters.
fn is_marker_text(dom: &Dom, id: NodeId) -> bool {
    dom.text(id)
        .is_some_and(|t| !t.is_empty() && t.chars().all(|c| c == ZERO_WIDTH))
}

/// Text leaves with at least one character inside `start..end`, in document
/// order. Marker-only leaves are invisible and excluded.
fn covered_text_leaves(dom: &Dom, start: DomPoint, end: DomPoint) -> Vec<NodeId> {
    let mut out = Vec::new();
    if start == end {
        return out;
    }
    let root = dom.root();
    let mut cur = if dom.is_text(start.node) && start.offset >= dom.text_len(start.node) {
        next_leaf(dom, start.node, root)
    } else {
        Some(start.node)
    };
    while let Some(n) = cur {
        if n == end.node {
            if dom.is_text(n) && end.offset > 0 && !is_marker_text(dom, n) {
                out.push(n);
            }
            break;
        }
        if dom.is_text(n) && !is_marker_text(dom, n) {
            out.push(n);
        }
        cur = next_leaf(dom, n, root);
    }
    out
}

fn toggle_format(ctx: &mut EditCtx, format: Format) -> Result<CommandOutcome, CommandFailure> {
    let range = ctx.selection.resolve(ctx.dom);
    if range.is_collapsed() {
        return toggle_at_caret(ctx, range.start, format);
    }
    let abs_start = absolute_text_offset(ctx.dom, range.start);
    let abs_end = absolute_text_offset(ctx.dom, range.end);
    if abs_start == abs_end {
        return Ok(CommandOutcome::UNCHANGED);
    }
    let start = point_at_text_offset(ctx.dom, abs_start);
    let end = point_at_text_offset(ctx.dom, abs_end);
    let leaves = covered_text_leaves(ctx.dom, start, end);
    if leaves.is_empty() {
        return Ok(CommandOutcome::UNCHANGED);
    }
    let remove = leaves.iter().all(|&l| has_format(ctx.dom, l, format));
    tracing::debug!(
        target: "vellum::editor",
        ?format,
        remove,
        leaves = leaves.len(),
        "toggle format"
    );
    if remove {
        remove_over_range(ctx.dom, abs_start, abs_end, format);
    } else {
        apply_over_range(ctx.dom, abs_start, abs_end, format);
    }
    reselect(ctx, abs_start, abs_end);
    Ok(CommandOutcome::CHANGED)
}

fn reselect(ctx: &mut EditCtx, abs_start: usize, abs_end: usize) {
    let start = point_at_text_offset(ctx.dom, abs_start);
    let end = point_at_text_offset(ctx.dom, abs_end);
    ctx.selection.set(ctx.dom, DomRange::new(start, end));
}

/// Splits the text node at `abs` in place, so the selection edge falls on
/// a node boundary. Ancestors are left alone.
fn split_text_edge(dom: &mut Dom, abs: usize) {
    let point = point_at_text_offset(dom, abs);
    if !dom.is_text(point.node) {
        return;
    }
    let Some(parent) = dom.parent(point.node) else {
        return;
    };
    let _ = split_at_point(dom, parent, point, &SplitOptions::default());
}

/// Splits the outermost `format` ancestor at `abs`, dropping the empty
/// half so no husk is left on the untouched side.
fn split_format_edge(dom: &mut Dom, abs: usize, format: Format) {
    let point = point_at_text_offset(dom, abs);
    let Some(span) = highest_format_ancestor(dom, point.node, format) else {
        return;
    };
    let Some(limit) = dom.parent(span) else {
        return;
    };
    let opts = SplitOptions { keep_format_on_both_sides: false };
    if split_at_point(dom, limit, point, &opts).is_err() {
        tracing::debug!(target: "vellum::editor", "format edge split refused");
    }
}

fn apply_over_range(dom: &mut Dom, abs_start: usize, abs_end: usize, format: Format) {
    split_text_edge(dom, abs_end);
    split_text_edge(dom, abs_start);
    let start = point_at_text_offset(dom, abs_start);
    let end = point_at_text_offset(dom, abs_end);

    let mut frontier: Vec<NodeId> = Vec::new();
    for leaf in covered_text_leaves(dom, start, end) {
        if has_format(dom, leaf, format) {
            continue;
        }
        let top = wrap_frontier(dom, leaf, abs_start, abs_end, format);
        if frontier.last() != Some(&top) {
            frontier.push(top);
        }
    }

    let mut parents: Vec<NodeId> = Vec::new();
    for run in sibling_runs(dom, &frontier) {
        let Some(parent) = dom.parent(run[0]) else {
            continue;
        };
        wrap_nodes(dom, &run, format.tag());
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }
    for parent in parents {
        merge_format_siblings(dom, parent);
    }
}

/// The widest ancestor of `leaf` that lies fully inside the selection and
/// brings no existing `format` content with it. Wrapping at this level
/// keeps sibling structure (line breaks, other inline spans) in one new
/// span instead of fragmenting per leaf.
fn wrap_frontier(
    dom: &Dom,
    leaf: NodeId,
    abs_start: usize,
    abs_end: usize,
    format: Format,
) -> NodeId {
    let mut cur = leaf;
    while let Some(parent) = dom.parent(cur) {
        if parent == dom.root() || is_block_node(dom, parent) || is_unbreakable(dom, parent) {
            break;
        }
        if contains_format(dom, parent, format) {
            break;
        }
        let span_start = absolute_text_offset(dom, DomPoint::new(parent, 0));
        let span_len = dom.text_content(parent).chars().count();
        if span_start < abs_start || span_start + span_len > abs_end {
            break;
        }
        cur = parent;
    }
    cur
}

/// Groups `nodes` into runs of siblings, swallowing blank siblings (brs,
/// marker text) that sit between two members so one span covers the run.
fn sibling_runs(dom: &Dom, nodes: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut runs: Vec<Vec<NodeId>> = Vec::new();
    for &n in nodes {
        if let Some(run) = runs.last_mut() {
            let last = *run.last().expect("runs hold at least one node");
            if let Some(gap) = blank_gap(dom, last, n) {
                run.extend(gap);
                run.push(n);
                continue;
            }
        }
        runs.push(vec![n]);
    }
    runs
}

/// The blank siblings strictly between `a` and `b`, when they share a
/// parent and nothing solid separates them.
fn blank_gap(dom: &Dom, a: NodeId, b: NodeId) -> Option<Vec<NodeId>> {
    let parent = dom.parent(a)?;
    if dom.parent(b) != Some(parent) {
        return None;
    }
    let ia = dom.index_in_parent(a)?;
    let ib = dom.index_in_parent(b)?;
    if ib <= ia {
        return None;
    }
    let between: Vec<NodeId> = dom.children(parent)[ia + 1..ib].to_vec();
    let all_blank = between
        .iter()
        .all(|&n| is_blank_node(dom, n) && !is_unbreakable(dom, n));
    if all_blank { Some(between) } else { None }
}

fn remove_over_range(dom: &mut Dom, abs_start: usize, abs_end: usize, format: Format) {
    split_format_edge(dom, abs_end, format);
    split_format_edge(dom, abs_start, format);

    // After the edge splits every span of `format` touching covered text
    // lies fully inside the range. Unwrap them outermost first; nested
    // duplicates surface again on the next pass.
    loop {
        let start = point_at_text_offset(dom, abs_start);
        let end = point_at_text_offset(dom, abs_end);
        let span = covered_text_leaves(dom, start, end)
            .into_iter()
            .find_map(|l| highest_format_ancestor(dom, l, format));
        match span {
            Some(span) => {
                unwrap_node(dom, span);
            }
            None => break,
        }
    }

    let start = point_at_text_offset(dom, abs_start);
    let end = point_at_text_offset(dom, abs_end);
    let mut parents: Vec<NodeId> = Vec::new();
    for leaf in covered_text_leaves(dom, start, end) {
        if let Some(p) = dom.parent(leaf) {
            if !parents.contains(&p) {
                parents.push(p);
            }
        }
    }
    for parent in parents {
        merge_format_siblings(dom, parent);
    }
}

/// Joins adjacent siblings carrying the same format, so repeated toggles
/// converge to one span per run. Children move; text nodes are not joined.
fn merge_format_siblings(dom: &mut Dom, parent: NodeId) {
    merge_adjacent_when(dom, parent, |d, a, b| {
        match (format_of(d, a), format_of(d, b)) {
            (Some(fa), Some(fb)) => fa == fb,
            _ => false,
        }
    });
}

fn toggle_at_caret(
    ctx: &mut EditCtx,
    caret: DomPoint,
    format: Format,
) -> Result<CommandOutcome, CommandFailure> {
    if has_format(ctx.dom, caret.node, format) {
        caret_remove_marker(ctx, caret, format)
    } else {
        caret_apply_marker(ctx, caret, format)
    }
}

/// Inserts a zero-width marker wrapped in `format` at the caret, giving a
/// collapsed toggle a concrete node to type into.
fn caret_apply_marker(
    ctx: &mut EditCtx,
    caret: DomPoint,
    format: Format,
) -> Result<CommandOutcome, CommandFailure> {
    let Some(boundary) = caret_boundary(ctx.dom, caret) else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let marker = ctx.dom.create_text(ZERO_WIDTH.to_string());
    let span = ctx.dom.create_element_with_tag(format.tag());
    ctx.dom.append_child(span, marker);
    let at = boundary.offset.min(ctx.dom.children(boundary.node).len());
    ctx.dom.insert_child(boundary.node, at, span);
    ctx.selection.set_caret(ctx.dom, DomPoint::new(marker, 1));
    Ok(CommandOutcome::CHANGED)
}

/// Splits out of the outermost `format` ancestor at the caret and drops a
/// marker between the halves. Formats nested inside the abandoned span are
/// rebuilt around the marker so only `format` ends.
fn caret_remove_marker(
    ctx: &mut EditCtx,
    caret: DomPoint,
    format: Format,
) -> Result<CommandOutcome, CommandFailure> {
    let Some(span) = highest_format_ancestor(ctx.dom, caret.node, format) else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let mut keep: Vec<Format> = Vec::new();
    for a in ctx.dom.ancestors(caret.node) {
        if a == span {
            break;
        }
        if let Some(f) = format_of(ctx.dom, a) {
            if f != format && !keep.contains(&f) {
                keep.push(f);
            }
        }
    }
    let Some(limit) = ctx.dom.parent(span) else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let opts = SplitOptions { keep_format_on_both_sides: false };
    let boundary = match split_at_point(ctx.dom, limit, caret, &opts) {
        Ok(b) => b,
        Err(_) => return Ok(CommandOutcome::UNCHANGED),
    };
    let marker = ctx.dom.create_text(ZERO_WIDTH.to_string());
    let mut outer = marker;
    // `keep` is nearest-first, so wrapping in order rebuilds the nesting.
    for f in keep {
        let span = ctx.dom.create_element_with_tag(f.tag());
        ctx.dom.append_child(span, outer);
        outer = span;
    }
    let at = boundary.offset.min(ctx.dom.children(boundary.node).len());
    ctx.dom.insert_child(boundary.node, at, outer);
    ctx.selection.set_caret(ctx.dom, DomPoint::new(marker, 1));
    Ok(CommandOutcome::CHANGED)
}

fn remove_all_formats(ctx: &mut EditCtx) -> Result<CommandOutcome, CommandFailure> {
    let range = ctx.selection.resolve(ctx.dom);
    if range.is_collapsed() {
        return caret_remove_all(ctx, range.start);
    }
    let abs_start = absolute_text_offset(ctx.dom, range.start);
    let abs_end = absolute_text_offset(ctx.dom, range.end);
    if abs_start == abs_end {
        return Ok(CommandOutcome::UNCHANGED);
    }
    let mut changed = false;
    for format in Format::ALL {
        let start = point_at_text_offset(ctx.dom, abs_start);
        let end = point_at_text_offset(ctx.dom, abs_end);
        let present = covered_text_leaves(ctx.dom, start, end)
            .iter()
            .any(|&l| has_format(ctx.dom, l, format));
        if present {
            remove_over_range(ctx.dom, abs_start, abs_end, format);
            changed = true;
        }
    }
    if !changed {
        return Ok(CommandOutcome::UNCHANGED);
    }
    reselect(ctx, abs_start, abs_end);
    Ok(CommandOutcome::CHANGED)
}

/// Splits out of every format ancestor at the caret and leaves a bare
/// marker, so typing continues unstyled.
fn caret_remove_all(ctx: &mut EditCtx, caret: DomPoint) -> Result<CommandOutcome, CommandFailure> {
    let spans: Vec<NodeId> = ctx
        .dom
        .ancestors(caret.node)
        .into_iter()
        .filter(|&a| ctx.dom.tag(a).is_some_and(is_format_tag))
        .collect();
    let Some(&top) = spans.last() else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let Some(limit) = ctx.dom.parent(top) else {
        return Ok(CommandOutcome::UNCHANGED);
    };
    let opts = SplitOptions { keep_format_on_both_sides: false };
    let boundary = match split_at_point(ctx.dom, limit, caret, &opts) {
        Ok(b) => b,
        Err(_) => return Ok(CommandOutcome::UNCHANGED),
    };
    let marker = ctx.dom.create_text(ZERO_WIDTH.to_string());
    let at = boundary.offset.min(ctx.dom.children(boundary.node).len());
    ctx.dom.insert_child(boundary.node, at, marker);
    ctx.selection.set_caret(ctx.dom, DomPoint::new(marker, 1));
    Ok(CommandOutcome::CHANGED)
}

/// Drops markers the caret has left behind, along with format spans they
/// emptied and any other childless format span. The caret's own nodes are
/// spared: a fresh marker or an empty span waiting for input stays.
fn clean_markers(ctx: &mut EditCtx) -> bool {
    let range = ctx.selection.resolve(ctx.dom);
    let keep = [range.start.node, range.end.node];
    let mut changed = false;

    let stale: Vec<NodeId> = ctx
        .dom
        .descendants(ctx.dom.root())
        .into_iter()
        .filter(|&n| {
            is_marker_text(ctx.dom, n)
                && !keep.contains(&n)
                && ctx.dom.ancestors(n).iter().any(|&a| ctx.dom.tag(a).is_some_and(is_format_tag))
        })
        .collect();
    for n in stale {
        ctx.dom.detach(n);
        changed = true;
    }

    loop {
        let husks: Vec<NodeId> = ctx
            .dom
            .descendants(ctx.dom.root())
            .into_iter()
            .filter(|&n| {
                !keep.contains(&n)
                    && ctx.dom.tag(n).is_some_and(is_format_tag)
                    && ctx.dom.children(n).is_empty()
            })
            .collect();
        if husks.is_empty() {
            break;
        }
        for n in husks {
            ctx.dom.detach(n);
        }
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_dom::parse_fragment;

    use crate::selection::SelectionState;

    fn make_doc(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        dom
    }

    fn html_of(dom: &Dom) -> String {
        vellum_dom::serialize_children(
            dom,
            dom.root(),
            &vellum_dom::SerializeOptions::history(),
        )
    }

    fn run(
        dom: &mut Dom,
        sel: &mut SelectionState,
        command: Command,
    ) -> CommandOutcome {
        let mut plugin = FormatPlugin::new();
        let mut ctx = EditCtx::new(dom, sel);
        plugin.on_command(&mut ctx, &command).unwrap()
    }

    fn toggle_bold(dom: &mut Dom, sel: &mut SelectionState) -> CommandOutcome {
        run(dom, sel, Command::ToggleFormat(Format::Bold))
    }

    #[test]
    fn test_bold_wraps_the_selected_middle() {
        let mut dom = make_doc("<p>abc</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t, 1), DomPoint::new(t, 2)));

        let out = toggle_bold(&mut dom, &mut sel);
        assert!(out.changed);
        assert_eq!(html_of(&dom), "<p>a<b>b</b>c</p>");

        // The selection still covers the newly bold "b".
        let p = dom.children(dom.root())[0];
        let span = dom.children(p)[1];
        let inner = dom.children(span)[0];
        let range = sel.resolve(&dom);
        assert_eq!(range.end, DomPoint::new(inner, 1));
    }

    #[test]
    fn test_unbold_of_a_partial_span_splits_it() {
        let mut dom = make_doc("<p>a<b>bc</b>d</p>");
        let p = dom.children(dom.root())[0];
        let t = dom.children(dom.children(p)[1])[0];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t, 0), DomPoint::new(t, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p>ab<b>c</b>d</p>");
    }

    #[test]
    fn test_bold_toggle_is_symmetric() {
        let mut dom = make_doc("<p><b>abc</b></p>");
        let p = dom.children(dom.root())[0];
        let t = dom.children(dom.children(p)[0])[0];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t, 0), DomPoint::new(t, 3)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p>abc</p>");

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b>abc</b></p>");
    }

    #[test]
    fn test_mixed_selection_converges_to_styled() {
        let mut dom = make_doc("<p>a<b>b</b>c</p>");
        let p = dom.children(dom.root())[0];
        let ta = dom.children(p)[0];
        let tc = dom.children(p)[2];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(ta, 0), DomPoint::new(tc, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b>abc</b></p>");
    }

    #[test]
    fn test_left_partial_overlap_extends_the_span() {
        let mut dom = make_doc("<p><b>ab</b>cd</p>");
        let p = dom.children(dom.root())[0];
        let tb = dom.children(dom.children(p)[0])[0];
        let tc = dom.children(p)[1];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(tb, 1), DomPoint::new(tc, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b>abc</b>d</p>");
    }

    #[test]
    fn test_right_partial_overlap_extends_the_span() {
        let mut dom = make_doc("<p>ab<b>cd</b></p>");
        let p = dom.children(dom.root())[0];
        let ta = dom.children(p)[0];
        let tc = dom.children(dom.children(p)[1])[0];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(ta, 1), DomPoint::new(tc, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p>a<b>bcd</b></p>");
    }

    #[test]
    fn test_wrapping_keeps_inner_spans_in_one_piece() {
        let mut dom = make_doc("<p>abc<i>d</i>ef</p>");
        let p = dom.children(dom.root())[0];
        let t1 = dom.children(p)[0];
        let t2 = dom.children(p)[2];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t1, 1), DomPoint::new(t2, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p>a<b>bc<i>d</i>e</b>f</p>");
    }

    #[test]
    fn test_never_nests_identical_tags() {
        let mut dom = make_doc("<p>a<i><b>x</b>y</i>b</p>");
        let p = dom.children(dom.root())[0];
        let ta = dom.children(p)[0];
        let tb = dom.children(p)[2];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(ta, 0), DomPoint::new(tb, 1)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b>a</b><i><b>xy</b></i><b>b</b></p>");
    }

    #[test]
    fn test_bold_spans_across_a_line_break() {
        let mut dom = make_doc("<p>ab<br>cd</p>");
        let p = dom.children(dom.root())[0];
        let t1 = dom.children(p)[0];
        let t2 = dom.children(p)[2];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(t1, 0), DomPoint::new(t2, 2)));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b>ab<br>cd</b></p>");
    }

    #[test]
    fn test_collapsed_toggle_plants_a_wrapped_marker() {
        let mut dom = make_doc("<p>ab</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        let out = toggle_bold(&mut dom, &mut sel);
        assert!(out.changed);
        assert_eq!(html_of(&dom), "<p>a<b>\u{200B}</b>b</p>");

        let p = dom.children(dom.root())[0];
        let marker = dom.children(dom.children(p)[1])[0];
        assert_eq!(sel.resolve(&dom).start, DomPoint::new(marker, 1));
    }

    #[test]
    fn test_collapsed_untoggle_keeps_outer_formats() {
        let mut dom = make_doc("<p><b><i>ab</i></b></p>");
        let p = dom.children(dom.root())[0];
        let i = dom.children(dom.children(p)[0])[0];
        let t = dom.children(i)[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 2));

        toggle_bold(&mut dom, &mut sel);
        assert_eq!(html_of(&dom), "<p><b><i>ab</i></b><i>\u{200B}</i></p>");

        let marker = dom.children(dom.children(p)[1])[0];
        assert_eq!(sel.resolve(&dom).start, DomPoint::new(marker, 1));
    }

    #[test]
    fn test_remove_format_strips_every_style() {
        let mut dom = make_doc("<p><b>a</b><i>b</i>c</p>");
        let p = dom.children(dom.root())[0];
        let ta = dom.children(dom.children(p)[0])[0];
        let tc = dom.children(p)[2];
        let mut sel = SelectionState::new();
        sel.set(&dom, DomRange::new(DomPoint::new(ta, 0), DomPoint::new(tc, 1)));

        let out = run(&mut dom, &mut sel, Command::RemoveFormat);
        assert!(out.changed);
        assert_eq!(html_of(&dom), "<p>abc</p>");
    }

    #[test]
    fn test_remove_format_at_a_caret_breaks_out_of_the_span() {
        let mut dom = make_doc("<p><b>ab</b></p>");
        let p = dom.children(dom.root())[0];
        let t = dom.children(dom.children(p)[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        run(&mut dom, &mut sel, Command::RemoveFormat);
        assert_eq!(html_of(&dom), "<p><b>a</b>\u{200B}<b>b</b></p>");
    }

    #[test]
    fn test_remove_format_without_formats_is_a_no_op() {
        let mut dom = make_doc("<p>ab</p>");
        let t = dom.children(dom.children(dom.root())[0])[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(t, 1));

        let out = run(&mut dom, &mut sel, Command::RemoveFormat);
        assert!(!out.changed);
        assert_eq!(html_of(&dom), "<p>ab</p>");
    }

    #[test]
    fn test_normalize_sweeps_abandoned_markers() {
        let mut dom = make_doc("<p>a<b>\u{200B}</b>b</p>");
        let p = dom.children(dom.root())[0];
        let ta = dom.children(p)[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(ta, 0));

        let mut plugin = FormatPlugin::new();
        let mut ctx = EditCtx::new(&mut dom, &mut sel);
        assert!(plugin.normalize(&mut ctx));
        assert_eq!(html_of(&dom), "<p>ab</p>");

        let mut ctx = EditCtx::new(&mut dom, &mut sel);
        assert!(!plugin.normalize(&mut ctx));
    }

    #[test]
    fn test_normalize_spares_the_span_under_the_caret() {
        let mut dom = make_doc("<p><b>ab</b></p><p><b></b></p>");
        let p2 = dom.children(dom.root())[1];
        let husk = dom.children(p2)[0];
        let mut sel = SelectionState::new();
        sel.set_caret(&dom, DomPoint::new(husk, 0));

        let mut plugin = FormatPlugin::new();
        let mut ctx = EditCtx::new(&mut dom, &mut sel);
        assert!(!plugin.normalize(&mut ctx));
        assert_eq!(html_of(&dom), "<p><b>ab</b></p><p><b></b></p>");
    }
}

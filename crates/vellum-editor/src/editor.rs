//! The editor facade that hosts embed.
//!
//! One `Editor` owns the document, the selection, the plugin set, the
//! undo history, and the event bus. Commands run single-flight: a turn
//! routes the command through hook interceptors and then the claiming
//! plugin, runs chained follow-ups in the same turn, re-normalizes the
//! tree, and records exactly one history step plus one `ValueChanged`
//! when the serialized document actually changed. A rejected command
//! restores the document byte for byte before the error surfaces.

use std::collections::VecDeque;

use vellum_dom::{
    Dom, DomPoint, DomRange, NodeId, SerializeOptions, parse_fragment, serialize_children,
};
use web_time::Instant;

use crate::command::{Command, CommandOutcome, EditCtx};
use crate::error::EditorError;
use crate::events::{EditorEvent, EventBus};
use crate::history::{History, HistoryStep};
use crate::plugin::{Hook, Plugin, PluginManager};
use crate::plugins::{FormatPlugin, PastePlugin, TextPlugin, TogglePlugin};
use crate::selection::SelectionState;

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Commands one turn may chain before the rest is dropped.
const CHAIN_LIMIT: usize = 32;

/// Normalize passes per turn before giving up on a fixed point.
const NORMALIZE_ROUNDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Built,
    Started,
    Destroyed,
}

/// Host-facing serialization knobs for [`Editor::value_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetValueOptions {
    /// Keep zero-width caret markers in the output. Off for persistence;
    /// history snapshots always keep them.
    pub keep_markers: bool,
}

/// What [`Editor::save`] hands back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub was_dirty: bool,
    pub value: String,
}

pub struct EditorBuilder {
    plugins: Vec<Box<dyn Plugin>>,
    value: String,
    history_limit: usize,
}

impl EditorBuilder {
    /// A builder preloaded with the built-in plugin set.
    pub fn new() -> Self {
        Self::bare()
            .with_plugin(TextPlugin::new())
            .with_plugin(FormatPlugin::new())
            .with_plugin(PastePlugin::new())
            .with_plugin(TogglePlugin::new())
    }

    /// A builder with no plugins registered at all.
    pub fn bare() -> Self {
        Self {
            plugins: Vec::new(),
            value: String::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Initial document HTML.
    pub fn with_value(mut self, html: impl Into<String>) -> Self {
        self.value = html.into();
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn build(self) -> Result<Editor, EditorError> {
        let mut plugins = PluginManager::new();
        for plugin in self.plugins {
            plugins.register(plugin)?;
        }
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, &self.value);
        Ok(Editor {
            dom,
            selection: SelectionState::new(),
            plugins,
            history: History::new(self.history_limit),
            events: EventBus::new(),
            baseline: String::new(),
            lifecycle: Lifecycle::Built,
            focused: false,
            executing: false,
            pending: VecDeque::new(),
        })
    }
}

impl Default for EditorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Editor {
    dom: Dom,
    selection: SelectionState,
    plugins: PluginManager,
    history: History,
    events: EventBus,
    /// History-form serialization at the last save point.
    baseline: String,
    lifecycle: Lifecycle,
    focused: bool,
    executing: bool,
    pending: VecDeque<Command>,
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::new()
    }

    /// Starts every plugin in dependency order, normalizes the initial
    /// document, and seeds history and dirty baseline. Idempotent once
    /// started.
    pub fn start(&mut self) -> Result<(), EditorError> {
        match self.lifecycle {
            Lifecycle::Destroyed => return Err(EditorError::Destroyed),
            Lifecycle::Started => return Ok(()),
            Lifecycle::Built => {}
        }
        {
            let mut ctx = EditCtx::new(&mut self.dom, &mut self.selection);
            self.plugins.start_all(&mut ctx)?;
        }
        self.normalize_tree();
        let value = self.serialize(&SerializeOptions::history());
        let bookmark = self.selection.bookmark(&self.dom);
        self.history.reset(value.clone(), bookmark);
        self.baseline = value;
        self.lifecycle = Lifecycle::Started;
        tracing::debug!(target: "vellum::editor", plugins = ?self.plugins.names(), "started");
        Ok(())
    }

    /// Stops plugins and retires the instance. Safe to call twice.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        if self.lifecycle == Lifecycle::Started {
            self.plugins.stop_all();
        }
        self.lifecycle = Lifecycle::Destroyed;
        tracing::debug!(target: "vellum::editor", "destroyed");
    }

    /// Runs one command to completion. A command arriving while another
    /// runs is deferred and reported as queued; deferred commands run in
    /// arrival order before the editor goes idle again.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, EditorError> {
        self.guard_started()?;
        if self.executing {
            tracing::debug!(
                target: "vellum::editor",
                command = command.kind().name(),
                "editor busy, command deferred"
            );
            self.pending.push_back(command);
            return Ok(CommandOutcome::QUEUED);
        }

        self.pending.push_back(command);
        self.executing = true;
        let mut result = Ok(CommandOutcome::UNCHANGED);
        while let Some(next) = self.pending.pop_front() {
            let last = self.pending.is_empty();
            match self.run_command(next) {
                outcome if last => result = outcome,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(
                        target: "vellum::editor",
                        error = %err,
                        "deferred command rejected"
                    );
                }
            }
        }
        self.executing = false;
        result
    }

    /// Serialized document with markers stripped.
    pub fn value(&self) -> String {
        self.value_with(&GetValueOptions::default())
    }

    pub fn value_with(&self, options: &GetValueOptions) -> String {
        let opts = if options.keep_markers {
            SerializeOptions::history()
        } else {
            SerializeOptions::value()
        };
        self.serialize(&opts)
    }

    /// Replaces the document wholesale: history and the dirty baseline
    /// restart from the new value.
    pub fn set_value(&mut self, html: &str) -> Result<(), EditorError> {
        self.guard_started()?;
        self.load_dom(html);
        self.selection.clear();
        self.normalize_tree();
        let value = self.serialize(&SerializeOptions::history());
        let bookmark = self.selection.bookmark(&self.dom);
        self.history.reset(value.clone(), bookmark);
        self.baseline = value;
        self.events.emit(EditorEvent::ValueChanged { dirty: false });
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.serialize(&SerializeOptions::history()) != self.baseline
    }

    /// Hands the current value to the host and resets the dirty baseline.
    pub fn save(&mut self) -> Result<SaveOutcome, EditorError> {
        self.guard_started()?;
        let was_dirty = self.is_dirty();
        self.baseline = self.serialize(&SerializeOptions::history());
        let value = self.value();
        self.events.emit(EditorEvent::Saved);
        tracing::debug!(target: "vellum::editor", was_dirty, "saved");
        Ok(SaveOutcome { was_dirty, value })
    }

    pub fn focus(&mut self) -> Result<(), EditorError> {
        self.guard_started()?;
        if self.focused {
            return Ok(());
        }
        self.focused = true;
        let mut ctx = EditCtx::new(&mut self.dom, &mut self.selection);
        self.plugins.notify_focus(&mut ctx, true);
        self.events.emit(EditorEvent::FocusChanged { focused: true });
        Ok(())
    }

    pub fn blur(&mut self) -> Result<(), EditorError> {
        self.guard_started()?;
        if !self.focused {
            return Ok(());
        }
        self.focused = false;
        let mut ctx = EditCtx::new(&mut self.dom, &mut self.selection);
        self.plugins.notify_focus(&mut ctx, false);
        self.events.emit(EditorEvent::FocusChanged { focused: false });
        Ok(())
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn subscribe(&mut self, sink: impl FnMut(&EditorEvent) + 'static) {
        self.events.subscribe(sink);
    }

    /// The document tree, for hosts mapping native nodes to ids.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// The current selection, re-validated against the live tree.
    pub fn selection(&mut self) -> DomRange {
        self.selection.resolve(&self.dom)
    }

    pub fn set_selection(&mut self, range: DomRange) -> Result<(), EditorError> {
        self.guard_started()?;
        self.selection.set(&self.dom, range);
        Ok(())
    }

    pub fn set_caret(&mut self, point: DomPoint) -> Result<(), EditorError> {
        self.guard_started()?;
        self.selection.set_caret(&self.dom, point);
        Ok(())
    }

    /// The first plugin-provided UI hint for `node`, if any plugin owns
    /// something there.
    pub fn hint_at(&self, node: NodeId) -> Option<String> {
        self.plugins.hint_at(&self.dom, node)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// When the history step holding the current document state was
    /// recorded. `None` until `start` seeds the history. Hosts poll this
    /// to detect idle pauses between edits.
    pub fn last_edit_at(&self) -> Option<Instant> {
        self.history.current().map(HistoryStep::at)
    }

    fn guard_started(&self) -> Result<(), EditorError> {
        match self.lifecycle {
            Lifecycle::Built => Err(EditorError::NotStarted),
            Lifecycle::Destroyed => Err(EditorError::Destroyed),
            Lifecycle::Started => Ok(()),
        }
    }

    fn serialize(&self, opts: &SerializeOptions) -> String {
        serialize_children(&self.dom, self.dom.root(), opts)
    }

    fn load_dom(&mut self, html: &str) {
        let mut dom = Dom::new();
        let root = dom.root();
        parse_fragment(&mut dom, root, html);
        self.dom = dom;
    }

    fn run_command(&mut self, command: Command) -> Result<CommandOutcome, EditorError> {
        match command {
            Command::Undo => return self.traverse_history(true),
            Command::Redo => return self.traverse_history(false),
            _ => {}
        }

        let before = self.serialize(&SerializeOptions::history());
        let bookmark_before = self.selection.bookmark(&self.dom);
        let kind = command.kind();

        if let Err(failure) = self.run_turn(command) {
            self.load_dom(&before);
            self.selection.restore(&self.dom, &bookmark_before);
            tracing::debug!(
                target: "vellum::editor",
                command = kind.name(),
                reason = failure.reason(),
                "command rejected, document restored"
            );
            return Err(EditorError::Command(failure));
        }
        self.normalize_tree();

        let after = self.serialize(&SerializeOptions::history());
        let changed = after != before;
        tracing::debug!(target: "vellum::editor", command = kind.name(), changed, "command ran");
        if changed {
            let bookmark = self.selection.bookmark(&self.dom);
            self.history.record(after, bookmark);
            let dirty = self.is_dirty();
            self.events.emit(EditorEvent::ValueChanged { dirty });
        }
        Ok(CommandOutcome { changed, queued: false })
    }

    /// Routes the command and everything it chains. Any failure aborts
    /// the whole turn.
    fn run_turn(&mut self, command: Command) -> Result<(), crate::error::CommandFailure> {
        let mut queue = VecDeque::from([command]);
        let mut ran = 0;
        while let Some(next) = queue.pop_front() {
            ran += 1;
            if ran > CHAIN_LIMIT {
                tracing::debug!(
                    target: "vellum::editor",
                    dropped = queue.len() + 1,
                    "chained command limit reached"
                );
                break;
            }
            let mut ctx = EditCtx::new(&mut self.dom, &mut self.selection);
            match hook_for(&next) {
                Some(hook) => {
                    if self.plugins.invoke_override(&mut ctx, hook)?.is_none() {
                        self.plugins.dispatch(&mut ctx, &next)?;
                    }
                }
                None => {
                    self.plugins.dispatch(&mut ctx, &next)?;
                }
            }
            queue.extend(ctx.take_chained());
        }
        Ok(())
    }

    fn normalize_tree(&mut self) {
        for _ in 0..NORMALIZE_ROUNDS {
            let mut ctx = EditCtx::new(&mut self.dom, &mut self.selection);
            if !self.plugins.normalize_all(&mut ctx) {
                return;
            }
        }
        tracing::debug!(target: "vellum::editor", "normalize did not settle this turn");
    }

    fn traverse_history(&mut self, back: bool) -> Result<CommandOutcome, EditorError> {
        let step = if back { self.history.undo() } else { self.history.redo() };
        let Some(step) = step else {
            return Ok(CommandOutcome::UNCHANGED);
        };
        let value = step.value.clone();
        let bookmark = step.bookmark.clone();

        self.load_dom(&value);
        self.selection.restore(&self.dom, &bookmark);
        self.events.emit(EditorEvent::HistoryTraversed {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
        let dirty = self.is_dirty();
        self.events.emit(EditorEvent::ValueChanged { dirty });
        Ok(CommandOutcome::CHANGED)
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("lifecycle", &self.lifecycle)
            .field("plugins", &self.plugins.names())
            .field("focused", &self.focused)
            .finish()
    }
}

/// The structural hook a command offers interceptors before its default
/// handler runs.
fn hook_for(command: &Command) -> Option<Hook> {
    match command {
        Command::DeleteBackward => Some(Hook::DeleteBackward),
        Command::DeleteForward => Some(Hook::DeleteForward),
        Command::InsertParagraph => Some(Hook::Split),
        Command::Indent => Some(Hook::Tab),
        Command::Outdent => Some(Hook::ShiftTab),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::command::CommandKind;
    use crate::error::CommandFailure;
    use crate::plugin::PluginResources;

    fn started(html: &str) -> Editor {
        let mut editor = Editor::builder().with_value(html).build().unwrap();
        editor.start().unwrap();
        editor
    }

    fn caret_in_first_text(editor: &mut Editor, offset: usize) {
        let root = editor.dom().root();
        let p = editor.dom().children(root)[0];
        let t = editor.dom().children(p)[0];
        editor.set_caret(DomPoint::new(t, offset)).unwrap();
    }

    #[test]
    fn test_lifecycle_guards() {
        let mut editor = Editor::builder().build().unwrap();
        assert!(matches!(
            editor.execute(Command::SelectAll),
            Err(EditorError::NotStarted)
        ));

        editor.start().unwrap();
        editor.destroy();
        assert!(matches!(
            editor.execute(Command::SelectAll),
            Err(EditorError::Destroyed)
        ));
        assert!(matches!(editor.start(), Err(EditorError::Destroyed)));
    }

    #[test]
    fn test_only_mutating_commands_record_steps() {
        let mut editor = started("<p>ab</p>");
        assert_eq!(editor.undo_depth(), 0);

        let out = editor.execute(Command::SelectAll).unwrap();
        assert!(!out.changed);
        assert_eq!(editor.undo_depth(), 0);

        caret_in_first_text(&mut editor, 2);
        let out = editor.execute(Command::InsertText("c".into())).unwrap();
        assert!(out.changed);
        assert_eq!(editor.undo_depth(), 1);
        assert_eq!(editor.value(), "<p>abc</p>");
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut editor = started("<p>a</p>");
        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        assert_eq!(editor.value(), "<p>ab</p>");

        let out = editor.execute(Command::Undo).unwrap();
        assert!(out.changed);
        assert_eq!(editor.value(), "<p>a</p>");
        assert!(editor.can_redo());

        editor.execute(Command::Redo).unwrap();
        assert_eq!(editor.value(), "<p>ab</p>");

        // Nothing left to redo; the command is a quiet no-op.
        let out = editor.execute(Command::Redo).unwrap();
        assert!(!out.changed);
    }

    #[test]
    fn test_typing_resumes_after_undo() {
        let mut editor = started("<p>a</p>");
        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        editor.execute(Command::DeleteBackward).unwrap();
        assert_eq!(editor.value(), "<p>a</p>");
        assert_eq!(editor.undo_depth(), 2);

        // Undo lands on the insert step; its bookmark puts the caret
        // back after the restored character.
        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.value(), "<p>ab</p>");
        editor.execute(Command::InsertText("z".into())).unwrap();
        assert_eq!(editor.value(), "<p>abz</p>");
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_save_resets_the_dirty_baseline() {
        let mut editor = started("<p>a</p>");
        assert!(!editor.is_dirty());

        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        assert!(editor.is_dirty());

        let saved = editor.save().unwrap();
        assert!(saved.was_dirty);
        assert_eq!(saved.value, "<p>ab</p>");
        assert!(!editor.is_dirty());

        let saved = editor.save().unwrap();
        assert!(!saved.was_dirty);
    }

    #[test]
    fn test_set_value_restarts_history() {
        let mut editor = started("<p>a</p>");
        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        assert!(editor.can_undo());

        editor.set_value("<p>fresh</p>").unwrap();
        assert_eq!(editor.value(), "<p>fresh</p>");
        assert!(!editor.can_undo());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_set_value_announces_the_new_value_without_a_step() {
        let mut editor = started("<p>a</p>");
        let seen: Rc<RefCell<Vec<EditorEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |ev| sink.borrow_mut().push(*ev));

        editor.set_value("<p>swapped</p>").unwrap();

        // The host hears about the replacement even though nothing was
        // recorded to undo.
        assert_eq!(*seen.borrow(), vec![EditorEvent::ValueChanged { dirty: false }]);
        assert_eq!(editor.undo_depth(), 0);
    }

    #[test]
    fn test_last_edit_at_tracks_committed_steps() {
        let mut editor = Editor::builder().with_value("<p>a</p>").build().unwrap();
        assert!(editor.last_edit_at().is_none());

        editor.start().unwrap();
        let seeded = editor.last_edit_at().unwrap();

        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        assert!(editor.last_edit_at().unwrap() >= seeded);
    }

    #[test]
    fn test_busy_editor_defers_commands_in_order() {
        let mut editor = started("");
        editor.executing = true;
        let out = editor.execute(Command::InsertText("a".into())).unwrap();
        assert!(out.queued);
        assert_eq!(editor.value(), "");

        editor.executing = false;
        let out = editor.execute(Command::InsertText("b".into())).unwrap();
        assert!(out.changed);
        assert!(!out.queued);
        assert_eq!(editor.value(), "ab");
    }

    #[test]
    fn test_events_fire_once_per_committed_command() {
        let mut editor = started("<p>a</p>");
        let seen: Rc<RefCell<Vec<EditorEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |ev| sink.borrow_mut().push(*ev));

        caret_in_first_text(&mut editor, 1);
        editor.execute(Command::InsertText("b".into())).unwrap();
        editor.execute(Command::SelectAll).unwrap();
        editor.execute(Command::Undo).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                EditorEvent::ValueChanged { dirty: true },
                EditorEvent::HistoryTraversed { can_undo: false, can_redo: true },
                EditorEvent::ValueChanged { dirty: false },
            ]
        );
    }

    #[test]
    fn test_focus_round_trip_notifies_once() {
        let mut editor = started("<p>a</p>");
        let seen: Rc<RefCell<Vec<EditorEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |ev| sink.borrow_mut().push(*ev));

        editor.focus().unwrap();
        editor.focus().unwrap();
        editor.blur().unwrap();
        assert!(!editor.is_focused());
        assert_eq!(
            *seen.borrow(),
            vec![
                EditorEvent::FocusChanged { focused: true },
                EditorEvent::FocusChanged { focused: false },
            ]
        );
    }

    struct Vandal;

    impl Plugin for Vandal {
        fn name(&self) -> &'static str {
            "vandal"
        }

        fn resources(&self) -> PluginResources {
            PluginResources::new().claim(CommandKind::Indent)
        }

        fn on_command(
            &mut self,
            ctx: &mut EditCtx,
            _command: &Command,
        ) -> Result<CommandOutcome, CommandFailure> {
            // Mutates first, then rejects: the editor must roll both back.
            let junk = ctx.dom.create_text("junk");
            let root = ctx.dom.root();
            ctx.dom.append_child(root, junk);
            Err(CommandFailure::new("selection precondition failed"))
        }
    }

    #[test]
    fn test_rejected_commands_leave_no_trace() {
        let mut editor = EditorBuilder::bare()
            .with_plugin(TextPlugin::new())
            .with_plugin(Vandal)
            .with_value("<p>ab</p>")
            .build()
            .unwrap();
        editor.start().unwrap();
        caret_in_first_text(&mut editor, 1);

        let err = editor.execute(Command::Indent).unwrap_err();
        assert!(matches!(err, EditorError::Command(_)));
        assert_eq!(editor.value(), "<p>ab</p>");
        assert_eq!(editor.undo_depth(), 0);

        // The restored selection still works for the next command.
        editor.execute(Command::InsertText("x".into())).unwrap();
        assert_eq!(editor.value(), "<p>axb</p>");
    }

    struct Chainer;

    impl Plugin for Chainer {
        fn name(&self) -> &'static str {
            "chainer"
        }

        fn resources(&self) -> PluginResources {
            PluginResources::new().claim(CommandKind::Indent)
        }

        fn on_command(
            &mut self,
            ctx: &mut EditCtx,
            _command: &Command,
        ) -> Result<CommandOutcome, CommandFailure> {
            ctx.chain(Command::InsertText("x".into()));
            ctx.chain(Command::InsertText("y".into()));
            Ok(CommandOutcome::UNCHANGED)
        }
    }

    #[test]
    fn test_chained_commands_share_one_history_step() {
        let mut editor = EditorBuilder::bare()
            .with_plugin(TextPlugin::new())
            .with_plugin(Chainer)
            .with_value("<p>a</p>")
            .build()
            .unwrap();
        editor.start().unwrap();
        caret_in_first_text(&mut editor, 1);

        let out = editor.execute(Command::Indent).unwrap();
        assert!(out.changed);
        assert_eq!(editor.value(), "<p>axy</p>");
        assert_eq!(editor.undo_depth(), 1);

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.value(), "<p>a</p>");
    }
}

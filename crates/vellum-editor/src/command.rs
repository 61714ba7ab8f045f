//! The command vocabulary and the context plugins edit through.
//!
//! Commands are plain data. The host (or another plugin) submits one, the
//! manager routes it to the plugin that registered for its kind, and the
//! plugin mutates the document through an [`EditCtx`]. A plugin can chain
//! follow-up commands into the same transaction; they run after it returns
//! and share its single history step.

use smol_str::SmolStr;
use vellum_dom::{Dom, Format};

use crate::selection::SelectionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InsertText(SmolStr),
    InsertParagraph,
    InsertLineBreak,
    DeleteBackward,
    DeleteForward,
    ToggleFormat(Format),
    RemoveFormat,
    Paste {
        html: Option<String>,
        text: Option<String>,
    },
    InsertToggle,
    ToggleCollapse {
        id: SmolStr,
    },
    Indent,
    Outdent,
    SelectAll,
    Undo,
    Redo,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::InsertText(_) => CommandKind::InsertText,
            Command::InsertParagraph => CommandKind::InsertParagraph,
            Command::InsertLineBreak => CommandKind::InsertLineBreak,
            Command::DeleteBackward => CommandKind::DeleteBackward,
            Command::DeleteForward => CommandKind::DeleteForward,
            Command::ToggleFormat(_) => CommandKind::ToggleFormat,
            Command::RemoveFormat => CommandKind::RemoveFormat,
            Command::Paste { .. } => CommandKind::Paste,
            Command::InsertToggle => CommandKind::InsertToggle,
            Command::ToggleCollapse { .. } => CommandKind::ToggleCollapse,
            Command::Indent => CommandKind::Indent,
            Command::Outdent => CommandKind::Outdent,
            Command::SelectAll => CommandKind::SelectAll,
            Command::Undo => CommandKind::Undo,
            Command::Redo => CommandKind::Redo,
        }
    }
}

/// Field-less mirror of [`Command`], used as the routing key plugins
/// register under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    InsertText,
    InsertParagraph,
    InsertLineBreak,
    DeleteBackward,
    DeleteForward,
    ToggleFormat,
    RemoveFormat,
    Paste,
    InsertToggle,
    ToggleCollapse,
    Indent,
    Outdent,
    SelectAll,
    Undo,
    Redo,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::InsertText => "insert-text",
            CommandKind::InsertParagraph => "insert-paragraph",
            CommandKind::InsertLineBreak => "insert-line-break",
            CommandKind::DeleteBackward => "delete-backward",
            CommandKind::DeleteForward => "delete-forward",
            CommandKind::ToggleFormat => "toggle-format",
            CommandKind::RemoveFormat => "remove-format",
            CommandKind::Paste => "paste",
            CommandKind::InsertToggle => "insert-toggle",
            CommandKind::ToggleCollapse => "toggle-collapse",
            CommandKind::Indent => "indent",
            CommandKind::Outdent => "outdent",
            CommandKind::SelectAll => "select-all",
            CommandKind::Undo => "undo",
            CommandKind::Redo => "redo",
        }
    }
}

/// What a command did. `queued` is reported by the editor when a command
/// arrived while another was running and was deferred instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub changed: bool,
    pub queued: bool,
}

impl CommandOutcome {
    pub const CHANGED: Self = Self { changed: true, queued: false };
    pub const UNCHANGED: Self = Self { changed: false, queued: false };
    pub const QUEUED: Self = Self { changed: false, queued: true };
}

/// Mutable view of one in-flight transaction.
pub struct EditCtx<'a> {
    pub dom: &'a mut Dom,
    pub selection: &'a mut SelectionState,
    chained: Vec<Command>,
}

impl<'a> EditCtx<'a> {
    pub fn new(dom: &'a mut Dom, selection: &'a mut SelectionState) -> Self {
        Self { dom, selection, chained: Vec::new() }
    }

    /// Runs `command` inside the current transaction, after the current
    /// plugin returns. Chained commands share the caller's history step.
    pub fn chain(&mut self, command: Command) {
        self.chained.push(command);
    }

    pub(crate) fn take_chained(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.chained)
    }
}

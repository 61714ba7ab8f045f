//! vellum-editor: a headless rich-text editing engine.
//!
//! This crate provides:
//! - `Editor` - the host facade: lifecycle, commands, value access,
//!   undo history, focus, and typed events
//! - a plugin system with declared command claims, hook interceptors,
//!   dependency-ordered startup, and per-turn normalize passes
//! - built-in plugins for text editing, inline formats, sanitized
//!   paste, and collapsible toggle blocks
//! - `SelectionState` - a validated selection over the `vellum-dom`
//!   tree, with rebuild-proof bookmarks
//!
//! The engine never touches a real browser DOM. Hosts feed it commands
//! and selections, observe events, and render the serialized value.

pub mod command;
pub mod editor;
pub mod error;
pub mod events;
pub mod history;
pub mod plugin;
pub mod plugins;
pub mod selection;

pub use command::{Command, CommandKind, CommandOutcome, EditCtx};
pub use editor::{Editor, EditorBuilder, GetValueOptions, SaveOutcome};
pub use error::{CommandFailure, EditorError, PluginError};
pub use events::{EditorEvent, EventBus};
pub use history::{History, HistoryStep};
pub use plugin::{Hook, Plugin, PluginManager, PluginResources};
pub use plugins::paste::sanitize_html;
pub use plugins::{FormatPlugin, PastePlugin, TextPlugin, TogglePlugin};
pub use selection::{Bookmark, SelectionState};

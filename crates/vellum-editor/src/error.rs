//! Error types for the editing engine.
//!
//! Only construction and lifecycle faults surface to the host. Everything
//! recoverable inside a command (out-of-bounds ranges, refused splits)
//! degrades to a no-change outcome with a debug log instead.

use miette::Diagnostic;

/// Error type plugins report from their own lifecycle entry points.
pub type PluginError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors of the engine surface.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditorError {
    /// A plugin names a dependency nobody registered.
    #[error("plugin `{name}` requires unknown dependency `{dependency}`")]
    #[diagnostic(
        code(vellum::plugin::missing_dependency),
        help("register the `{dependency}` plugin before building the editor")
    )]
    MissingDependency { name: String, dependency: String },

    /// The dependency graph has a cycle.
    #[error("plugin dependency cycle involving `{name}`")]
    #[diagnostic(code(vellum::plugin::cycle))]
    CyclicDependency { name: String },

    /// Two plugins registered under one name.
    #[error("plugin `{name}` registered twice")]
    #[diagnostic(code(vellum::plugin::duplicate))]
    DuplicatePlugin { name: String },

    /// A plugin failed its setup/start chain. Already-started plugins were
    /// stopped again before this was returned.
    #[error("plugin `{name}` failed to start")]
    #[diagnostic(code(vellum::plugin::start))]
    PluginStart {
        name: String,
        #[source]
        source: PluginError,
    },

    /// A command handler rejected the command. The document was restored
    /// to its pre-command bytes.
    #[error(transparent)]
    #[diagnostic(code(vellum::command::rejected))]
    Command(#[from] CommandFailure),

    /// The editor was used before `start`.
    #[error("editor is not started")]
    #[diagnostic(code(vellum::lifecycle::not_started))]
    NotStarted,

    /// The editor was used after `destroy`.
    #[error("editor was destroyed")]
    #[diagnostic(code(vellum::lifecycle::destroyed))]
    Destroyed,
}

/// A command handler's refusal, carried inside [`EditorError::Command`].
#[derive(thiserror::Error, Debug)]
#[error("command rejected: {reason}")]
pub struct CommandFailure {
    reason: String,
}

impl CommandFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

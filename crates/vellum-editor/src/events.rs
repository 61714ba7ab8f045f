//! Typed editor events with synchronous delivery.
//!
//! Hosts subscribe closures; delivery is an in-order function call per
//! sink, on the caller's thread. A committed command fires exactly one
//! `ValueChanged`.

/// What the engine tells its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The serialized document value changed, whether through a command,
    /// a history traversal, or the host replacing the value.
    ValueChanged { dirty: bool },
    /// Undo or redo moved the history cursor. Fired before the matching
    /// `ValueChanged`, so hosts can refresh undo/redo affordances.
    HistoryTraversed { can_undo: bool, can_redo: bool },
    /// Focus moved into or out of the editor.
    FocusChanged { focused: bool },
    /// `save` ran and the dirty baseline was reset.
    Saved,
}

type Sink = Box<dyn FnMut(&EditorEvent)>;

#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Sink>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: impl FnMut(&EditorEvent) + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn emit(&mut self, event: EditorEvent) {
        tracing::trace!(target: "vellum::editor", ?event, sinks = self.sinks.len(), "emit");
        for sink in &mut self.sinks {
            sink(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

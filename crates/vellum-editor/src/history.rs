//! Linear undo history.
//!
//! Each step is a full serialized snapshot of the document plus a selection
//! bookmark. Recording after an undo discards the redo tail; the oldest
//! steps are evicted once the configured depth is exceeded.

use web_time::Instant;

use crate::selection::Bookmark;

#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub value: String,
    pub bookmark: Bookmark,
    at: Instant,
}

impl HistoryStep {
    /// When this step was recorded. Hosts compare against now to spot
    /// idle pauses between edits.
    pub fn at(&self) -> Instant {
        self.at
    }
}

#[derive(Debug)]
pub struct History {
    steps: Vec<HistoryStep>,
    /// Index of the step the document currently shows.
    cursor: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self { steps: Vec::new(), cursor: 0, limit }
    }

    /// Discards everything and seeds the history with `value` as the floor
    /// no undo can pass.
    pub fn reset(&mut self, value: impl Into<String>, bookmark: Bookmark) {
        self.steps.clear();
        self.steps.push(HistoryStep {
            value: value.into(),
            bookmark,
            at: Instant::now(),
        });
        self.cursor = 0;
    }

    /// Records a new step after the cursor, dropping any redo tail. Every
    /// record appends exactly one step.
    pub fn record(&mut self, value: impl Into<String>, bookmark: Bookmark) {
        if !self.steps.is_empty() {
            self.steps.truncate(self.cursor + 1);
        }
        self.steps.push(HistoryStep {
            value: value.into(),
            bookmark,
            at: Instant::now(),
        });
        if self.steps.len() > self.limit + 1 {
            let excess = self.steps.len() - (self.limit + 1);
            self.steps.drain(..excess);
        }
        self.cursor = self.steps.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&HistoryStep> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.steps.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&HistoryStep> {
        if self.cursor + 1 >= self.steps.len() {
            return None;
        }
        self.cursor += 1;
        self.steps.get(self.cursor)
    }

    pub fn current(&self) -> Option<&HistoryStep> {
        self.steps.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.steps.len()
    }

    /// Steps an undo could walk back through right now.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.steps.len().saturating_sub(self.cursor + 1)
    }
}

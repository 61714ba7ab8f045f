//! The plugin system.
//!
//! All editing behavior lives in plugins. A plugin names itself, lists the
//! plugins it depends on, and registers resources: the command kinds it
//! claims and the structural hooks it wants first refusal on. The manager
//! orders plugins so dependencies start first, auto-installs missing ones
//! a plugin knows how to provide, and routes commands and hooks.

use vellum_dom::{Dom, NodeId};

use crate::command::{Command, CommandKind, CommandOutcome, EditCtx};
use crate::error::{CommandFailure, EditorError, PluginError};

/// A structural editing moment a plugin may intercept before the default
/// handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    DeleteBackward,
    DeleteForward,
    Split,
    Tab,
    ShiftTab,
}

/// What a plugin registers with the manager.
#[derive(Debug, Clone, Default)]
pub struct PluginResources {
    pub commands: Vec<CommandKind>,
    pub overrides: Vec<Hook>,
}

impl PluginResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(mut self, kind: CommandKind) -> Self {
        self.commands.push(kind);
        self
    }

    pub fn intercept(mut self, hook: Hook) -> Self {
        self.overrides.push(hook);
        self
    }
}

pub trait Plugin {
    fn name(&self) -> &'static str;

    /// Names of plugins that must be registered and started before this
    /// one. Missing names fail startup unless [`Plugin::auto_install`]
    /// provides them.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Instances to register automatically when a dependency is absent.
    fn auto_install(&self) -> Vec<Box<dyn Plugin>> {
        Vec::new()
    }

    fn resources(&self) -> PluginResources {
        PluginResources::new()
    }

    /// One-time preparation with document access, run for every plugin
    /// before any starts.
    fn setup(&mut self, _ctx: &mut EditCtx) -> Result<(), PluginError> {
        Ok(())
    }

    fn start(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    fn stop(&mut self) {}

    /// Handles a command this plugin claimed via its resources.
    fn on_command(
        &mut self,
        _ctx: &mut EditCtx,
        _command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        Ok(CommandOutcome::UNCHANGED)
    }

    /// Offered a hook this plugin registered for. `Some` claims the moment
    /// and suppresses the default handler; `None` passes.
    fn on_hook(
        &mut self,
        _ctx: &mut EditCtx,
        _hook: Hook,
    ) -> Result<Option<CommandOutcome>, CommandFailure> {
        Ok(None)
    }

    /// Post-command cleanup of structures this plugin owns. Returns true
    /// when the tree changed.
    fn normalize(&mut self, _ctx: &mut EditCtx) -> bool {
        false
    }

    /// A short UI affordance description for the given node, if this
    /// plugin owns something there.
    fn hint_for(&self, _dom: &Dom, _node: NodeId) -> Option<String> {
        None
    }

    fn on_focus_change(&mut self, _ctx: &mut EditCtx, _focused: bool) {}
}

struct PluginEntry {
    plugin: Box<dyn Plugin>,
    resources: PluginResources,
}

/// Owns every registered plugin in dependency-start order.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<PluginEntry>,
    started: bool,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.plugins.iter().any(|e| e.plugin.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|e| e.plugin.name()).collect()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), EditorError> {
        if self.has(plugin.name()) {
            return Err(EditorError::DuplicatePlugin { name: plugin.name().into() });
        }
        let resources = plugin.resources();
        tracing::debug!(
            target: "vellum::plugin",
            plugin = plugin.name(),
            commands = resources.commands.len(),
            "registered"
        );
        self.plugins.push(PluginEntry { plugin, resources });
        Ok(())
    }

    /// Installs missing dependencies, orders the set, then runs every
    /// setup followed by every start. A start failure stops the plugins
    /// already started, in reverse, before reporting.
    pub fn start_all(&mut self, ctx: &mut EditCtx) -> Result<(), EditorError> {
        self.install_missing()?;
        self.sort_by_dependencies()?;
        for entry in &mut self.plugins {
            entry.plugin.setup(ctx).map_err(|source| EditorError::PluginStart {
                name: entry.plugin.name().into(),
                source,
            })?;
        }
        for i in 0..self.plugins.len() {
            if let Err(source) = self.plugins[i].plugin.start() {
                let name = self.plugins[i].plugin.name();
                for j in (0..i).rev() {
                    self.plugins[j].plugin.stop();
                }
                return Err(EditorError::PluginStart { name: name.into(), source });
            }
        }
        self.started = true;
        Ok(())
    }

    /// Stops every plugin, last started first.
    pub fn stop_all(&mut self) {
        for entry in self.plugins.iter_mut().rev() {
            entry.plugin.stop();
        }
        self.started = false;
    }

    /// Routes `command` to the first plugin (in start order) claiming its
    /// kind. An unclaimed command is a logged no-op.
    pub fn dispatch(
        &mut self,
        ctx: &mut EditCtx,
        command: &Command,
    ) -> Result<CommandOutcome, CommandFailure> {
        let kind = command.kind();
        for entry in &mut self.plugins {
            if entry.resources.commands.contains(&kind) {
                tracing::trace!(
                    target: "vellum::plugin",
                    plugin = entry.plugin.name(),
                    command = kind.name(),
                    "dispatch"
                );
                return entry.plugin.on_command(ctx, command);
            }
        }
        tracing::debug!(target: "vellum::plugin", command = kind.name(), "unclaimed command");
        Ok(CommandOutcome::UNCHANGED)
    }

    /// Offers `hook` to registered interceptors in start order; the first
    /// `Some` wins.
    pub fn invoke_override(
        &mut self,
        ctx: &mut EditCtx,
        hook: Hook,
    ) -> Result<Option<CommandOutcome>, CommandFailure> {
        for entry in &mut self.plugins {
            if !entry.resources.overrides.contains(&hook) {
                continue;
            }
            if let Some(outcome) = entry.plugin.on_hook(ctx, hook)? {
                tracing::trace!(
                    target: "vellum::plugin",
                    plugin = entry.plugin.name(),
                    hook = ?hook,
                    "hook claimed"
                );
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }

    /// Runs every plugin's normalize pass once, in start order. True when
    /// any pass changed the tree.
    pub fn normalize_all(&mut self, ctx: &mut EditCtx) -> bool {
        let mut changed = false;
        for entry in &mut self.plugins {
            if entry.plugin.normalize(ctx) {
                changed = true;
            }
        }
        changed
    }

    pub fn notify_focus(&mut self, ctx: &mut EditCtx, focused: bool) {
        for entry in &mut self.plugins {
            entry.plugin.on_focus_change(ctx, focused);
        }
    }

    pub fn hint_at(&self, dom: &Dom, node: NodeId) -> Option<String> {
        self.plugins.iter().find_map(|e| e.plugin.hint_for(dom, node))
    }

    fn install_missing(&mut self) -> Result<(), EditorError> {
        loop {
            let mut to_add: Vec<Box<dyn Plugin>> = Vec::new();
            for entry in &self.plugins {
                for candidate in entry.plugin.auto_install() {
                    let name = candidate.name();
                    if !self.has(name) && !to_add.iter().any(|p| p.name() == name) {
                        tracing::debug!(
                            target: "vellum::plugin",
                            plugin = name,
                            wanted_by = entry.plugin.name(),
                            "auto-install"
                        );
                        to_add.push(candidate);
                    }
                }
            }
            if to_add.is_empty() {
                return Ok(());
            }
            for plugin in to_add {
                self.register(plugin)?;
            }
        }
    }

    /// Stable topological order: scan in registration order, place the
    /// first plugin whose dependencies are all placed, repeat.
    fn sort_by_dependencies(&mut self) -> Result<(), EditorError> {
        for entry in &self.plugins {
            for dep in entry.plugin.dependencies() {
                if !self.has(dep) {
                    return Err(EditorError::MissingDependency {
                        name: entry.plugin.name().into(),
                        dependency: (*dep).into(),
                    });
                }
            }
        }

        let n = self.plugins.len();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let next = (0..n).find(|&i| {
                !placed[i]
                    && self.plugins[i].plugin.dependencies().iter().all(|dep| {
                        self.plugins
                            .iter()
                            .enumerate()
                            .any(|(j, e)| placed[j] && e.plugin.name() == *dep)
                    })
            });
            match next {
                Some(i) => {
                    placed[i] = true;
                    order.push(i);
                }
                None => {
                    let stuck = (0..n)
                        .find(|&i| !placed[i])
                        .map(|i| self.plugins[i].plugin.name())
                        .unwrap_or("?");
                    return Err(EditorError::CyclicDependency { name: stuck.into() });
                }
            }
        }

        let mut slots: Vec<Option<PluginEntry>> =
            std::mem::take(&mut self.plugins).into_iter().map(Some).collect();
        self.plugins = order
            .into_iter()
            .map(|i| slots[i].take().expect("each index is placed exactly once"))
            .collect();
        Ok(())
    }
}

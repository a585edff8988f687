//! Bounded linear undo/redo history.

use tracing::debug;

use super::command::Command;
use crate::constants::history::DEFAULT_MAX_DEPTH;
use crate::models::SettingsTree;

/// Undo/redo stacks over [`Command`]s.
///
/// `push` clears the redo tail, `undo` moves one command from past to
/// future and `redo` moves it back. Both are no-ops on empty stacks. When
/// `past` exceeds the bound the oldest command is dropped.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    past: Vec<Command>,
    future: Vec<Command>,
    bound: usize,
    coalescing_open: bool,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl CommandHistory {
    /// Creates an empty history retaining at most `bound` commands (min 1).
    pub fn new(bound: usize) -> Self {
        let bound = bound.max(1);
        Self {
            past: Vec::with_capacity(bound),
            future: Vec::new(),
            bound,
            coalescing_open: false,
        }
    }

    /// Applies `command` to `tree` and records it.
    ///
    /// A command whose coalescing key matches the most recent command while
    /// the coalescing window is open is merged into it instead.
    pub fn push(&mut self, command: Command, tree: &mut SettingsTree) {
        command.apply(tree);
        self.future.clear();

        let key = command.coalesce_key().cloned();
        let merge = self.coalescing_open
            && key.is_some()
            && self
                .past
                .last()
                .is_some_and(|last| last.coalesce_key() == key.as_ref());

        if merge {
            if let Some(last) = self.past.last_mut() {
                debug!(description = %command.description(), "Coalesced edit");
                last.absorb(command);
                if last.is_identity_on(tree) {
                    debug!("Coalesced edit returned to its start, dropped");
                    self.past.pop();
                }
            }
        } else {
            debug!(description = %command.description(), "Applied command");
            self.past.push(command);
            if self.past.len() > self.bound {
                let excess = self.past.len() - self.bound;
                self.past.drain(..excess);
            }
        }
        self.coalescing_open = key.is_some();
    }

    /// Reverts the most recent command. Returns its description, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self, tree: &mut SettingsTree) -> Option<String> {
        self.coalescing_open = false;
        let command = self.past.pop()?;
        command.invert(tree);
        let description = command.description().to_string();
        debug!(description = %description, "Undo");
        self.future.push(command);
        Some(description)
    }

    /// Re-applies the most recently undone command. Returns its description,
    /// or `None` when there is nothing to redo.
    pub fn redo(&mut self, tree: &mut SettingsTree) -> Option<String> {
        self.coalescing_open = false;
        let command = self.future.pop()?;
        command.apply(tree);
        let description = command.description().to_string();
        debug!(description = %description, "Redo");
        self.past.push(command);
        Some(description)
    }

    /// Ends the current coalescing window (blur/commit of a field).
    pub fn close_coalescing(&mut self) {
        self.coalescing_open = false;
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Description of the command `undo` would revert, or `""`.
    pub fn undo_description(&self) -> &str {
        self.past.last().map_or("", Command::description)
    }

    /// Description of the command `redo` would re-apply, or `""`.
    pub fn redo_description(&self) -> &str {
        self.future.last().map_or("", Command::description)
    }

    /// Number of undoable commands.
    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    /// Number of redoable commands.
    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// Maximum number of retained commands.
    pub const fn bound(&self) -> usize {
        self.bound
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.coalescing_open = false;
    }
}

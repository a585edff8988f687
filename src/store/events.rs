//! Change notifications emitted by the store.
//!
//! Consumers subscribe and re-render; they never write back into the store.

use tokio::sync::broadcast;
use tracing::trace;

use super::command::Section;
use crate::constants::persistence::EVENT_CHANNEL_CAPACITY;

/// Something observable happened to the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A command was applied
    Changed {
        /// Sections the command touched
        sections: Vec<Section>,
        /// Command description
        description: String,
    },
    /// A command was undone
    Undone {
        /// Description of the undone command
        description: String,
    },
    /// A command was redone
    Redone {
        /// Description of the redone command
        description: String,
    },
    /// The initial load completed
    Loaded,
    /// Settings were reset to defaults
    Reset,
    /// The active draft was edited
    DraftChanged {
        /// Form owning the draft
        form_id: String,
        /// Whether the draft differs from the committed settings
        has_changes: bool,
    },
    /// The active draft was dropped without committing
    DraftDiscarded {
        /// Form owning the draft
        form_id: String,
    },
}

/// Broadcast sender wrapper. Sending never fails the caller.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// New subscription; receives events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Emits an event to all current subscribers.
    pub fn emit(&self, event: StoreEvent) {
        trace!(?event, "Emitting store event");
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

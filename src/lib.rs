//! Dashview Admin Library
//!
//! Configuration store for the admin panel of a home-automation dashboard.
//! It owns the settings document (which rooms and entities are shown, in
//! which order, under which labels), applies every edit as an undoable
//! command, and persists the result through a pluggable gateway with a
//! debounced save.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dashview_admin::{ConfigurationStore, FilePersistence, HomeRegistry, StoreOptions};
//!
//! # async fn demo(registry: HomeRegistry) -> dashview_admin::StoreResult<()> {
//! let gateway = Arc::new(FilePersistence::new("settings.json"));
//! let mut store = ConfigurationStore::new(gateway, registry, StoreOptions::default());
//! store.load().await?;
//! store.toggle_room_enabled("kitchen")?;
//! assert_eq!(store.undo_description(), "Disabled room Kitchen");
//! store.undo();
//! # Ok(())
//! # }
//! ```

// Module declarations
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::{IdKind, StoreError, StoreResult};
pub use models::{EntityType, HomeRegistry, SettingsTree};
pub use services::{
    EntityEnablementResolver, FilePersistence, MemoryPersistence, PersistenceGateway,
    PersistenceStatus,
};
pub use store::{ConfigurationStore, StoreEvent, StoreOptions};

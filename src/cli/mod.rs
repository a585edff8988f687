//! CLI command handlers for the dashboard admin.
//!
//! This module provides headless, scriptable access to the configuration
//! store for automation and for editing a settings file offline.

pub mod common;
pub mod entity;
pub mod floor;
pub mod labels;
pub mod reset;
pub mod room;
pub mod show;
pub mod validate;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode, StoreArgs};
pub use entity::EntityArgs;
pub use floor::FloorArgs;
pub use labels::LabelsArgs;
pub use reset::ResetArgs;
pub use room::RoomArgs;
pub use show::ShowArgs;
pub use validate::ValidateArgs;

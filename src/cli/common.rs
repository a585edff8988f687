//! Shared plumbing for CLI commands: exit codes, errors and store setup.

use crate::config::Config;
use crate::error::StoreError;
use crate::models::HomeRegistry;
use crate::services::FilePersistence;
use crate::store::ConfigurationStore;
use clap::Args;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Input was rejected (unknown id, bad permutation, invalid value)
    ValidationError = 1,
    /// Files could not be read or written
    IoError = 2,
}

/// Error returned by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code to terminate with
    pub code: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Input rejected.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// Reading or writing failed.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::IoError,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        if err.is_user_facing() {
            Self::validation(err.to_string())
        } else {
            Self::io(err.to_string())
        }
    }
}

/// Result alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Arguments locating the settings document and the registry snapshot.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Registry snapshot (JSON with floors, areas, labels, entities, devices)
    #[arg(short, long, value_name = "FILE")]
    pub registry: PathBuf,

    /// Settings document; defaults to the configured settings file
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

impl StoreArgs {
    /// Resolves the settings path from the flag or the app config.
    pub fn settings_path(&self) -> CliResult<PathBuf> {
        if let Some(path) = &self.settings {
            return Ok(path.clone());
        }
        let config =
            Config::load().map_err(|e| CliError::io(format!("Failed to load config: {e:#}")))?;
        config
            .storage
            .settings_path()
            .map_err(|e| CliError::io(format!("Failed to resolve settings path: {e:#}")))
    }

    /// Opens and loads a store over the settings file.
    pub async fn open(&self) -> CliResult<ConfigurationStore> {
        let registry = load_registry(&self.registry)?;
        let options = Config::load()
            .map(|config| config.store_options())
            .unwrap_or_default();
        let gateway = Arc::new(FilePersistence::new(self.settings_path()?));
        let mut store = ConfigurationStore::new(gateway, registry, options);
        store.load().await?;
        Ok(store)
    }
}

/// Reads a registry snapshot from a JSON file.
pub fn load_registry(path: &Path) -> CliResult<HomeRegistry> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CliError::io(format!("Failed to read registry {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::validation(format!("Failed to parse registry {}: {e}", path.display()))
    })
}

/// Applies a mutation, prints its undo description and writes the file.
pub async fn apply_and_save(
    store: &mut ConfigurationStore,
    mutate: impl FnOnce(&mut ConfigurationStore) -> Result<bool, StoreError>,
) -> CliResult<()> {
    if mutate(store)? {
        println!("✓ {}", store.undo_description());
        store.save_now().await?;
    } else {
        println!("Nothing to change");
    }
    Ok(())
}

/// Parses an entity type key such as `lights` or `mediaPlayers`.
pub fn parse_entity_type(value: &str) -> Result<crate::models::EntityType, String> {
    crate::models::EntityType::from_key(value).ok_or_else(|| {
        let keys: Vec<&str> = crate::models::EntityType::ALL
            .iter()
            .map(|ty| ty.key())
            .collect();
        format!("unknown entity type '{value}' (expected one of: {})", keys.join(", "))
    })
}

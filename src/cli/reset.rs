//! Reset command.

use crate::cli::common::{apply_and_save, CliError, CliResult, StoreArgs};
use clap::Args;

/// Reset every setting to its default
#[derive(Debug, Clone, Args)]
pub struct ResetArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Confirm the reset
    #[arg(long)]
    pub yes: bool,
}

impl ResetArgs {
    /// Execute the reset command
    pub async fn execute(&self) -> CliResult<()> {
        if !self.yes {
            return Err(CliError::validation("Refusing to reset without --yes"));
        }
        let mut store = self.store.open().await?;
        apply_and_save(&mut store, crate::store::ConfigurationStore::reset).await
    }
}

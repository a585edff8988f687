//! Category label commands.

use crate::cli::common::{apply_and_save, parse_entity_type, CliResult, StoreArgs};
use crate::models::EntityType;
use clap::{Args, Subcommand};

/// Manage category labels
#[derive(Debug, Clone, Args)]
pub struct LabelsArgs {
    /// Labels subcommand
    #[command(subcommand)]
    pub command: LabelsCommand,
}

/// Labels subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum LabelsCommand {
    /// Map a label to an entity type (omit --label to clear)
    Set(SetLabelArgs),
    /// Suggest label mappings from label names
    Suggest(SuggestArgs),
}

/// Map a label
#[derive(Debug, Clone, Args)]
pub struct SetLabelArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entity type key
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: EntityType,

    /// Label id
    #[arg(long, value_name = "ID")]
    pub label: Option<String>,
}

/// Suggest mappings
#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Apply suggestions for types without a label
    #[arg(long)]
    pub apply: bool,
}

impl LabelsArgs {
    /// Execute the labels command
    pub async fn execute(&self) -> CliResult<()> {
        match &self.command {
            LabelsCommand::Set(args) => {
                let mut store = args.store.open().await?;
                apply_and_save(&mut store, |store| {
                    store.set_category_label(args.entity_type, args.label.as_deref())
                })
                .await
            }
            LabelsCommand::Suggest(args) => {
                let mut store = args.store.open().await?;
                let suggestions = store.suggest_category_labels();
                if suggestions.is_empty() {
                    println!("No suggestions");
                    return Ok(());
                }
                for (entity_type, label_id) in &suggestions {
                    println!("  {:<14} {label_id}", entity_type.key());
                }
                if !args.apply {
                    return Ok(());
                }
                let mut changed = false;
                for (entity_type, label_id) in &suggestions {
                    if store.settings().category_label(*entity_type).is_none() {
                        changed |= store.set_category_label(*entity_type, Some(label_id.as_str()))?;
                    }
                }
                if changed {
                    store.save_now().await?;
                    println!("✓ Applied suggestions");
                }
                Ok(())
            }
        }
    }
}

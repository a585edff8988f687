//! Entity enablement commands.

use crate::cli::common::{apply_and_save, parse_entity_type, CliResult, StoreArgs};
use crate::models::EntityType;
use clap::{Args, Subcommand};

/// Manage entity visibility per type
#[derive(Debug, Clone, Args)]
pub struct EntityArgs {
    /// Entity subcommand
    #[command(subcommand)]
    pub command: EntityCommand,
}

/// Entity subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum EntityCommand {
    /// Flip one entity
    Toggle(EntityTarget),
    /// Enable every listed entity of a room
    Enable(BulkArgs),
    /// Disable every listed entity of a room
    Disable(BulkArgs),
    /// List a room's entities of one type
    List(ListEntitiesArgs),
}

/// A single entity
#[derive(Debug, Clone, Args)]
pub struct EntityTarget {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entity type key (lights, covers, mediaPlayers, ...)
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: EntityType,

    /// Entity id
    #[arg(long, value_name = "ID")]
    pub entity: String,
}

/// Entities of a room
#[derive(Debug, Clone, Args)]
pub struct BulkArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entity type key
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: EntityType,

    /// Area id
    #[arg(long, value_name = "ID")]
    pub area: String,

    /// Only entities whose name or id contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

/// List entities
#[derive(Debug, Clone, Args)]
pub struct ListEntitiesArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Entity type key
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: EntityType,

    /// Area id
    #[arg(long, value_name = "ID")]
    pub area: String,
}

impl EntityArgs {
    /// Execute the entity command
    pub async fn execute(&self) -> CliResult<()> {
        match &self.command {
            EntityCommand::Toggle(target) => {
                let mut store = target.store.open().await?;
                apply_and_save(&mut store, |store| {
                    store.toggle_entity_enabled(target.entity_type, &target.entity)
                })
                .await
            }
            EntityCommand::Enable(args) => bulk(args, true).await,
            EntityCommand::Disable(args) => bulk(args, false).await,
            EntityCommand::List(args) => {
                let store = args.store.open().await?;
                for view in store.entities_for_area_and_type(&args.area, args.entity_type) {
                    let mark = if view.enabled { "✓" } else { "✗" };
                    println!("{mark} {:<30} {:<12} {}", view.name, view.state, view.entity_id);
                }
                Ok(())
            }
        }
    }
}

async fn bulk(args: &BulkArgs, enabled: bool) -> CliResult<()> {
    let mut store = args.store.open().await?;
    let views = store.entities_for_area_and_type(&args.area, args.entity_type);
    let views = match &args.filter {
        Some(query) => crate::services::search_filter(&views, query),
        None => views,
    };
    let ids: Vec<String> = views.into_iter().map(|view| view.entity_id).collect();
    apply_and_save(&mut store, |store| {
        store.bulk_set_enabled(&args.area, args.entity_type, &ids, enabled)
    })
    .await
}

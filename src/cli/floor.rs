//! Floor ordering and overview commands.

use crate::cli::common::{apply_and_save, CliResult, StoreArgs};
use clap::{Args, Subcommand};

/// Manage floors
#[derive(Debug, Clone, Args)]
pub struct FloorArgs {
    /// Floor subcommand
    #[command(subcommand)]
    pub command: FloorCommand,
}

/// Floor subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum FloorCommand {
    /// Move a floor one step
    Move(MoveFloorArgs),
    /// Replace the floor order (comma-separated ids, all floors exactly once)
    Order(OrderFloorsArgs),
    /// Flip the overview card of a floor
    Overview(FloorTarget),
}

/// Move a floor up (-1) or down (+1)
#[derive(Debug, Clone, Args)]
pub struct MoveFloorArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Floor id
    #[arg(long, value_name = "ID")]
    pub floor: String,

    /// Direction: -1 moves up, +1 moves down
    #[arg(long, allow_hyphen_values = true)]
    pub step: i32,
}

/// New floor order
#[derive(Debug, Clone, Args)]
pub struct OrderFloorsArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Floor ids in the new order
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub order: Vec<String>,
}

/// A single floor
#[derive(Debug, Clone, Args)]
pub struct FloorTarget {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Floor id
    #[arg(long, value_name = "ID")]
    pub floor: String,
}

impl FloorArgs {
    /// Execute the floor command
    pub async fn execute(&self) -> CliResult<()> {
        match &self.command {
            FloorCommand::Move(args) => {
                let mut store = args.store.open().await?;
                apply_and_save(&mut store, |store| store.move_floor(&args.floor, args.step)).await
            }
            FloorCommand::Order(args) => {
                let mut store = args.store.open().await?;
                apply_and_save(&mut store, |store| store.reorder_floors(&args.order)).await
            }
            FloorCommand::Overview(target) => {
                let mut store = target.store.open().await?;
                apply_and_save(&mut store, |store| store.toggle_floor_overview(&target.floor))
                    .await
            }
        }
    }
}

//! Room enablement and ordering commands.

use crate::cli::common::{apply_and_save, CliResult, StoreArgs};
use clap::{Args, Subcommand};

/// Manage rooms
#[derive(Debug, Clone, Args)]
pub struct RoomArgs {
    /// Room subcommand
    #[command(subcommand)]
    pub command: RoomCommand,
}

/// Room subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum RoomCommand {
    /// Show a room on the dashboard
    Enable(RoomTarget),
    /// Hide a room from the dashboard
    Disable(RoomTarget),
    /// Flip a room's visibility
    Toggle(RoomTarget),
    /// Move a room one step within its floor
    Move(MoveRoomArgs),
}

/// A single room
#[derive(Debug, Clone, Args)]
pub struct RoomTarget {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Area id
    #[arg(long, value_name = "ID")]
    pub area: String,
}

/// Move a room up (-1) or down (+1)
#[derive(Debug, Clone, Args)]
pub struct MoveRoomArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Area id
    #[arg(long, value_name = "ID")]
    pub area: String,

    /// Direction: -1 moves up, +1 moves down
    #[arg(long, allow_hyphen_values = true)]
    pub step: i32,
}

impl RoomArgs {
    /// Execute the room command
    pub async fn execute(&self) -> CliResult<()> {
        match &self.command {
            RoomCommand::Enable(target) => {
                let mut store = target.store.open().await?;
                apply_and_save(&mut store, |store| store.set_room_enabled(&target.area, true)).await
            }
            RoomCommand::Disable(target) => {
                let mut store = target.store.open().await?;
                apply_and_save(&mut store, |store| store.set_room_enabled(&target.area, false))
                    .await
            }
            RoomCommand::Toggle(target) => {
                let mut store = target.store.open().await?;
                apply_and_save(&mut store, |store| store.toggle_room_enabled(&target.area)).await
            }
            RoomCommand::Move(args) => {
                let mut store = args.store.open().await?;
                apply_and_save(&mut store, |store| store.move_room(&args.area, args.step)).await
            }
        }
    }
}

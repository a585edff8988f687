//! Dashview Admin - command-line access to the dashboard configuration
//!
//! Edits the dashboard settings document offline: room and entity
//! visibility, floor and room ordering, category labels.

use clap::{Parser, Subcommand};
use dashview_admin::cli::{
    EntityArgs, ExitCode, FloorArgs, LabelsArgs, ResetArgs, RoomArgs, ShowArgs, ValidateArgs,
};
use dashview_admin::constants::LOG_ENV;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dashview Admin - dashboard configuration from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show floors, rooms and category labels
    Show(ShowArgs),
    /// Manage rooms
    Room(RoomArgs),
    /// Manage floors
    Floor(FloorArgs),
    /// Manage entity visibility
    Entity(EntityArgs),
    /// Manage category labels
    Labels(LabelsArgs),
    /// Reset all settings to defaults
    Reset(ResetArgs),
    /// Check the settings against the registry
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Show(args) => args.execute().await,
        Command::Room(args) => args.execute().await,
        Command::Floor(args) => args.execute().await,
        Command::Entity(args) => args.execute().await,
        Command::Labels(args) => args.execute().await,
        Command::Reset(args) => args.execute().await,
        Command::Validate(args) => args.execute().await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(err.code as i32);
    }
    std::process::exit(ExitCode::Success as i32);
}

//! Prints the effective dashboard structure.

use crate::cli::common::{CliError, CliResult, StoreArgs};
use crate::models::EntityType;
use clap::Args;
use serde::Serialize;

/// Show floors, rooms and category labels in display order
#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FloorSummary {
    id: Option<String>,
    name: String,
    overview: bool,
    rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize)]
struct RoomSummary {
    id: String,
    name: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct ShowResponse {
    floors: Vec<FloorSummary>,
    category_labels: Vec<(String, Option<String>)>,
}

impl ShowArgs {
    /// Execute the show command
    pub async fn execute(&self) -> CliResult<()> {
        let store = self.store.open().await?;
        let registry = store.registry();

        let room = |id: String| RoomSummary {
            name: registry.area_name(&id).to_string(),
            enabled: store.is_room_enabled(&id),
            id,
        };

        let mut floors: Vec<FloorSummary> = store
            .ordered_floors()
            .into_iter()
            .map(|floor_id| FloorSummary {
                name: registry.floor_name(&floor_id).to_string(),
                overview: store.settings().is_floor_overview_enabled(&floor_id),
                rooms: store
                    .ordered_rooms_for_floor(Some(&floor_id))
                    .into_iter()
                    .map(room)
                    .collect(),
                id: Some(floor_id),
            })
            .collect();

        let unassigned: Vec<RoomSummary> = store
            .ordered_rooms_for_floor(None)
            .into_iter()
            .map(room)
            .collect();
        if !unassigned.is_empty() {
            floors.push(FloorSummary {
                id: None,
                name: "Other rooms".to_string(),
                overview: false,
                rooms: unassigned,
            });
        }

        let response = ShowResponse {
            floors,
            category_labels: EntityType::ALL
                .iter()
                .map(|ty| {
                    (
                        ty.key().to_string(),
                        store.settings().category_label(*ty).map(str::to_string),
                    )
                })
                .collect(),
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&response)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
            return Ok(());
        }

        for floor in &response.floors {
            let overview = if floor.overview { " [overview]" } else { "" };
            println!("{}{}", floor.name, overview);
            for room in &floor.rooms {
                let mark = if room.enabled { "✓" } else { "✗" };
                println!("  {mark} {} ({})", room.name, room.id);
            }
        }

        println!("\nCategory labels:");
        for (key, label) in &response.category_labels {
            println!("  {key:<14} {}", label.as_deref().unwrap_or("-"));
        }

        Ok(())
    }
}

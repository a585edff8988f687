//! Validation command for settings documents.
//!
//! Reports ids in the settings that the registry no longer knows. Stale ids
//! are harmless for rendering but usually mean a device was removed.

use crate::cli::common::{CliError, CliResult, StoreArgs};
use crate::models::{HomeRegistry, SettingsTree};
use clap::Args;
use serde::Serialize;

/// Check a settings document against the registry
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Settings and registry locations
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat stale ids as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,
}

/// One stale reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleReference {
    /// Settings field holding the id
    pub field: String,
    /// The unknown id
    pub id: String,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self) -> CliResult<()> {
        let store = self.store.open().await?;
        let stale = find_stale_references(store.settings(), store.registry());

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stale)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
        } else if stale.is_empty() {
            println!("✓ Validation passed");
        } else {
            println!("⚠ {} stale reference(s):", stale.len());
            for reference in &stale {
                println!("  {:<24} {}", reference.field, reference.id);
            }
        }

        if self.strict && !stale.is_empty() {
            return Err(CliError::validation("Stale references found in strict mode"));
        }
        Ok(())
    }
}

/// Collects every id in `settings` that `registry` does not know.
pub fn find_stale_references(settings: &SettingsTree, registry: &HomeRegistry) -> Vec<StaleReference> {
    let mut stale = Vec::new();
    let mut report = |field: &str, id: &str| {
        stale.push(StaleReference {
            field: field.to_string(),
            id: id.to_string(),
        });
    };

    for floor_id in settings.floor_order.iter() {
        if !registry.has_floor(floor_id) {
            report("floorOrder", floor_id);
        }
    }
    for area_id in settings.room_order_by_floor.values().flat_map(|order| order.iter()) {
        if registry.area(area_id).is_none() {
            report("roomOrder", area_id);
        }
    }
    for area_id in settings.enabled_rooms.keys() {
        if registry.area(area_id).is_none() {
            report("enabledRooms", area_id);
        }
    }
    for (entity_type, map) in settings.enabled_by_type.iter() {
        for entity_id in map.keys() {
            if !registry.entities.contains(entity_id) {
                report(&format!("enabled.{}", entity_type.key()), entity_id);
            }
        }
    }
    for label_id in settings.category_label_id.values().flatten() {
        if registry.label(label_id).is_none() {
            report("categoryLabelId", label_id);
        }
    }
    for device_id in settings.enabled_appliances.keys() {
        if !registry.devices.contains(device_id) {
            report("enabledAppliances", device_id);
        }
    }
    for (floor_id, slots) in settings.floor_card_config.iter() {
        if !registry.has_floor(floor_id) {
            report("floorCardConfig", floor_id);
        }
        for slot in slots.values() {
            if !registry.entities.contains(&slot.entity_id) {
                report("floorCardConfig", &slot.entity_id);
            }
        }
    }

    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AreaEntry, EntityEntry, EntityRegistrySnapshot, EntityType, FloorEntry};
    use std::sync::Arc;

    #[test]
    fn test_find_stale_references() {
        let registry = HomeRegistry {
            floors: vec![FloorEntry {
                floor_id: "ground".to_string(),
                name: "Ground".to_string(),
                level: Some(0),
            }],
            areas: vec![AreaEntry {
                area_id: "kitchen".to_string(),
                name: "Kitchen".to_string(),
                floor_id: Some("ground".to_string()),
            }],
            entities: EntityRegistrySnapshot::from_entries([
                EntityEntry::new("light.kitchen").with_area("kitchen")
            ]),
            ..HomeRegistry::default()
        };

        let mut settings = SettingsTree::default();
        settings.floor_order = Arc::new(vec!["ground".to_string(), "attic".to_string()]);
        Arc::make_mut(&mut settings.enabled_rooms).insert("kitchen".to_string(), false);
        Arc::make_mut(&mut settings.enabled_rooms).insert("garden".to_string(), true);
        let lights = Arc::make_mut(&mut settings.enabled_by_type)
            .entry(EntityType::Lights)
            .or_default();
        Arc::make_mut(lights).insert("light.gone".to_string(), false);

        let stale = find_stale_references(&settings, &registry);
        let ids: Vec<&str> = stale.iter().map(|reference| reference.id.as_str()).collect();
        assert_eq!(ids, vec!["attic", "garden", "light.gone"]);
        assert_eq!(stale[2].field, "enabled.lights");
    }
}

//! Shared test fixtures: a small deterministic home and store helpers.
#![allow(dead_code)] // Not every test binary uses every fixture

use dashview_admin::models::{
    AreaEntry, DeviceEntry, DeviceRegistrySnapshot, EntityEntry, EntityRegistrySnapshot,
    FloorEntry, HomeRegistry, LabelEntry,
};
use dashview_admin::services::{MemoryPersistence, PersistenceGateway};
use dashview_admin::store::{ConfigurationStore, StoreOptions};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn floor(floor_id: &str, name: &str, level: i32) -> FloorEntry {
    FloorEntry {
        floor_id: floor_id.to_string(),
        name: name.to_string(),
        level: Some(level),
    }
}

fn area(area_id: &str, name: &str, floor_id: Option<&str>) -> AreaEntry {
    AreaEntry {
        area_id: area_id.to_string(),
        name: name.to_string(),
        floor_id: floor_id.map(str::to_string),
    }
}

fn label(label_id: &str, name: &str) -> LabelEntry {
    LabelEntry {
        label_id: label_id.to_string(),
        name: name.to_string(),
        icon: None,
    }
}

fn device(device_id: &str, name: &str, area_id: &str, entity_ids: &[&str]) -> DeviceEntry {
    DeviceEntry {
        device_id: device_id.to_string(),
        name: name.to_string(),
        area_id: Some(area_id.to_string()),
        entity_ids: entity_ids.iter().map(|id| (*id).to_string()).collect(),
        ..DeviceEntry::default()
    }
}

/// Three floors (ground, first, attic), six rooms (one without floor),
/// lights, a blind, a motion sensor, a washer and a TV.
pub fn home_registry() -> HomeRegistry {
    HomeRegistry {
        floors: vec![
            floor("ground", "Ground Floor", 0),
            floor("first", "First Floor", 1),
            floor("attic", "Attic", 2),
        ],
        areas: vec![
            area("kitchen", "Kitchen", Some("ground")),
            area("living_room", "Living Room", Some("ground")),
            area("bedroom", "Bedroom", Some("first")),
            area("office", "Office", Some("first")),
            area("storage", "Storage", Some("attic")),
            area("garden", "Garden", None),
        ],
        labels: vec![
            label("licht", "Licht"),
            label("rollo", "Rollo"),
            label("bewegung", "Bewegung"),
            label("favorites", "Favorites"),
            label("tv", "TV"),
        ],
        entities: EntityRegistrySnapshot::from_entries([
            EntityEntry::new("light.kitchen_ceiling")
                .with_area("kitchen")
                .with_device("dev_kitchen_light")
                .with_label("licht")
                .with_name("Ceiling")
                .with_state("on"),
            EntityEntry::new("light.kitchen_counter")
                .with_area("kitchen")
                .with_label("licht")
                .with_name("Counter")
                .with_state("off"),
            EntityEntry::new("light.kitchen_spots")
                .with_area("kitchen")
                .with_label("licht")
                .with_name("Spots")
                .with_state("off"),
            EntityEntry::new("cover.kitchen_window")
                .with_area("kitchen")
                .with_label("rollo")
                .with_name("Kitchen Blind")
                .with_state("open"),
            EntityEntry::new("light.living_lamp")
                .with_area("living_room")
                .with_label("licht")
                .with_name("Floor Lamp")
                .with_state("on"),
            EntityEntry::new("light.bedroom")
                .with_area("bedroom")
                .with_label("licht")
                .with_name("Bedroom Light")
                .with_state("off"),
            EntityEntry::new("binary_sensor.office_motion")
                .with_area("office")
                .with_label("bewegung")
                .with_name("Office Motion")
                .with_state("off"),
            EntityEntry::new("sensor.washer_status")
                .with_device("dev_washer")
                .with_name("Washer Status")
                .with_state("running"),
            EntityEntry::new("sensor.washer_remaining")
                .with_device("dev_washer")
                .with_name("Washer Remaining")
                .with_state("42"),
            EntityEntry::new("switch.washer_power")
                .with_device("dev_washer")
                .with_label("favorites")
                .with_name("Washer Power")
                .with_state("on"),
            EntityEntry::new("media_player.living_tv")
                .with_device("dev_tv")
                .with_label("favorites")
                .with_name("Living TV")
                .with_state("playing"),
            EntityEntry::new("sensor.tv_power")
                .with_device("dev_tv")
                .with_name("TV Power")
                .with_state("87"),
            EntityEntry::new("sensor.waste_collection").with_name("Waste Collection"),
            EntityEntry::new("sensor.train_s1").with_name("S1 Departures"),
        ]),
        devices: DeviceRegistrySnapshot::from_entries([
            device(
                "dev_kitchen_light",
                "Kitchen Light",
                "kitchen",
                &["light.kitchen_ceiling"],
            ),
            device(
                "dev_washer",
                "Washer",
                "storage",
                &[
                    "sensor.washer_status",
                    "sensor.washer_remaining",
                    "switch.washer_power",
                ],
            ),
            device(
                "dev_tv",
                "TV",
                "living_room",
                &["media_player.living_tv", "sensor.tv_power"],
            ),
        ]),
    }
}

/// A stored settings document mapping three category labels.
pub fn settings_document() -> Value {
    json!({
        "categoryLabelId": {
            "lights": "licht",
            "covers": "rollo",
            "motion": "bewegung"
        },
        "floorOrder": ["ground", "first", "attic"]
    })
}

/// Store options with the default bound and debounce.
pub fn default_options() -> StoreOptions {
    StoreOptions {
        history_depth: 20,
        save_debounce: Duration::from_millis(500),
    }
}

/// A store over `gateway` that has not been loaded yet.
pub fn store_over(gateway: &Arc<MemoryPersistence>, options: StoreOptions) -> ConfigurationStore {
    let gateway: Arc<dyn PersistenceGateway> = gateway.clone();
    ConfigurationStore::new(gateway, home_registry(), options)
}

/// A loaded store over [`settings_document`] and its recording gateway.
pub async fn loaded_store() -> (ConfigurationStore, Arc<MemoryPersistence>) {
    loaded_store_with(default_options()).await
}

/// Like [`loaded_store`] with custom options.
pub async fn loaded_store_with(
    options: StoreOptions,
) -> (ConfigurationStore, Arc<MemoryPersistence>) {
    let gateway = Arc::new(MemoryPersistence::with_document(settings_document()));
    let mut store = store_over(&gateway, options);
    store.load().await.unwrap();
    (store, gateway)
}

/// Writes the registry and settings document into `dir` for CLI tests.
///
/// Returns `(registry_path, settings_path)`.
pub fn write_home_files(dir: &Path) -> (PathBuf, PathBuf) {
    let registry_path = dir.join("registry.json");
    let settings_path = dir.join("settings.json");
    fs::write(
        &registry_path,
        serde_json::to_string_pretty(&home_registry()).unwrap(),
    )
    .unwrap();
    fs::write(
        &settings_path,
        serde_json::to_string_pretty(&settings_document()).unwrap(),
    )
    .unwrap();
    (registry_path, settings_path)
}

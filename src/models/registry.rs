//! Read-only snapshots of the automation hub's registries.
//!
//! The caller refreshes these whenever the hub reports changes; the store and
//! resolver only ever read them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{AreaId, DeviceId, EntityId, FloorId, LabelId};

/// One entity as reported by the entity registry plus its live state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Entity id (e.g. "light.kitchen_ceiling")
    pub entity_id: EntityId,
    /// Area assigned directly to the entity
    #[serde(default)]
    pub area_id: Option<AreaId>,
    /// Owning device
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    /// Labels attached to the entity
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    /// Live state string ("on", "open", "21.5", ...)
    #[serde(default)]
    pub state: Option<String>,
    /// Friendly name attribute
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Icon attribute or registry icon
    #[serde(default)]
    pub icon: Option<String>,
    /// Unit of measurement
    #[serde(default)]
    pub unit: Option<String>,
    /// Current HVAC action for thermostats
    #[serde(default)]
    pub hvac_action: Option<String>,
}

impl EntityEntry {
    /// Creates an entry with just an id; other fields via the `with_*` helpers.
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Sets the area.
    pub fn with_area(mut self, area_id: impl Into<AreaId>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    /// Sets the owning device.
    pub fn with_device(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Adds a label.
    pub fn with_label(mut self, label_id: impl Into<LabelId>) -> Self {
        self.labels.insert(label_id.into());
        self
    }

    /// Sets the live state.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the friendly name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Display name: friendly name, falling back to the entity id.
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.entity_id)
    }

    /// Live state, "unknown" when the hub has not reported one.
    pub fn state_or_unknown(&self) -> &str {
        self.state.as_deref().unwrap_or("unknown")
    }
}

/// One device from the device registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device id
    pub device_id: DeviceId,
    /// Display name (user-assigned name preferred by the caller)
    #[serde(default)]
    pub name: String,
    /// Area of the device
    #[serde(default)]
    pub area_id: Option<AreaId>,
    /// Manufacturer string
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Model string
    #[serde(default)]
    pub model: Option<String>,
    /// Entities belonging to the device
    #[serde(default)]
    pub entity_ids: Vec<EntityId>,
}

/// Area (room) registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaEntry {
    /// Area id
    pub area_id: AreaId,
    /// Display name
    pub name: String,
    /// Floor the area belongs to, if any
    #[serde(default)]
    pub floor_id: Option<FloorId>,
}

/// Floor registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorEntry {
    /// Floor id
    pub floor_id: FloorId,
    /// Display name
    pub name: String,
    /// Floor level as configured in the hub
    #[serde(default)]
    pub level: Option<i32>,
}

/// Label registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// Label id
    pub label_id: LabelId,
    /// Display name
    pub name: String,
    /// Icon
    #[serde(default)]
    pub icon: Option<String>,
}

/// Entity id → entity entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRegistrySnapshot {
    entities: BTreeMap<EntityId, EntityEntry>,
}

impl EntityRegistrySnapshot {
    /// Builds a snapshot from entries, keyed by their entity id.
    pub fn from_entries(entries: impl IntoIterator<Item = EntityEntry>) -> Self {
        Self {
            entities: entries
                .into_iter()
                .map(|entry| (entry.entity_id.clone(), entry))
                .collect(),
        }
    }

    /// Looks up an entity.
    pub fn get(&self, entity_id: &str) -> Option<&EntityEntry> {
        self.entities.get(entity_id)
    }

    /// Whether the entity exists.
    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    /// Iterates all entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityEntry> {
        self.entities.values()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Device id → device entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRegistrySnapshot {
    devices: BTreeMap<DeviceId, DeviceEntry>,
}

impl DeviceRegistrySnapshot {
    /// Builds a snapshot from entries, keyed by their device id.
    pub fn from_entries(entries: impl IntoIterator<Item = DeviceEntry>) -> Self {
        Self {
            devices: entries
                .into_iter()
                .map(|entry| (entry.device_id.clone(), entry))
                .collect(),
        }
    }

    /// Looks up a device.
    pub fn get(&self, device_id: &str) -> Option<&DeviceEntry> {
        self.devices.get(device_id)
    }

    /// Whether the device exists.
    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// Iterates all devices in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.devices.values()
    }
}

/// Everything the store needs to know about the installation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HomeRegistry {
    /// Floors in hub order
    #[serde(default)]
    pub floors: Vec<FloorEntry>,
    /// Areas in hub order
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
    /// All labels
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    /// Entity registry
    #[serde(default)]
    pub entities: EntityRegistrySnapshot,
    /// Device registry
    #[serde(default)]
    pub devices: DeviceRegistrySnapshot,
}

impl HomeRegistry {
    /// Whether a floor id is known.
    pub fn has_floor(&self, floor_id: &str) -> bool {
        self.floors.iter().any(|floor| floor.floor_id == floor_id)
    }

    /// Looks up an area.
    pub fn area(&self, area_id: &str) -> Option<&AreaEntry> {
        self.areas.iter().find(|area| area.area_id == area_id)
    }

    /// Looks up a floor.
    pub fn floor(&self, floor_id: &str) -> Option<&FloorEntry> {
        self.floors.iter().find(|floor| floor.floor_id == floor_id)
    }

    /// Looks up a label.
    pub fn label(&self, label_id: &str) -> Option<&LabelEntry> {
        self.labels.iter().find(|label| label.label_id == label_id)
    }

    /// Area display name, falling back to the id.
    pub fn area_name<'a>(&'a self, area_id: &'a str) -> &'a str {
        self.area(area_id).map_or(area_id, |area| area.name.as_str())
    }

    /// Floor display name, falling back to the id.
    pub fn floor_name<'a>(&'a self, floor_id: &'a str) -> &'a str {
        self.floor(floor_id).map_or(floor_id, |floor| floor.name.as_str())
    }

    /// Floor ids in hub order.
    pub fn floor_ids(&self) -> Vec<FloorId> {
        self.floors.iter().map(|floor| floor.floor_id.clone()).collect()
    }

    /// Area ids on a floor in hub order; `None` selects rooms without a floor.
    pub fn area_ids_on_floor(&self, floor_id: Option<&str>) -> Vec<AreaId> {
        self.areas
            .iter()
            .filter(|area| area.floor_id.as_deref() == floor_id)
            .map(|area| area.area_id.clone())
            .collect()
    }

    /// Effective area of an entity: its own area, else its device's area.
    pub fn area_of_entity(&self, entity_id: &str) -> Option<&str> {
        let entry = self.entities.get(entity_id)?;
        if let Some(area_id) = entry.area_id.as_deref() {
            return Some(area_id);
        }
        entry
            .device_id
            .as_deref()
            .and_then(|device_id| self.devices.get(device_id))
            .and_then(|device| device.area_id.as_deref())
    }

    /// Entities belonging to a device.
    ///
    /// Uses the device's own entity list when present, otherwise scans the
    /// entity registry for back-references.
    pub fn entities_of_device(&self, device_id: &str) -> Vec<&EntityEntry> {
        match self.devices.get(device_id) {
            Some(device) if !device.entity_ids.is_empty() => device
                .entity_ids
                .iter()
                .filter_map(|entity_id| self.entities.get(entity_id))
                .collect(),
            _ => self
                .entities
                .iter()
                .filter(|entry| entry.device_id.as_deref() == Some(device_id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HomeRegistry {
        HomeRegistry {
            floors: vec![FloorEntry {
                floor_id: "floor.ground".to_string(),
                name: "Ground".to_string(),
                level: Some(0),
            }],
            areas: vec![
                AreaEntry {
                    area_id: "area.kitchen".to_string(),
                    name: "Kitchen".to_string(),
                    floor_id: Some("floor.ground".to_string()),
                },
                AreaEntry {
                    area_id: "area.shed".to_string(),
                    name: "Shed".to_string(),
                    floor_id: None,
                },
            ],
            labels: vec![],
            entities: EntityRegistrySnapshot::from_entries([
                EntityEntry::new("light.kitchen").with_area("area.kitchen"),
                EntityEntry::new("sensor.washer_status").with_device("dev.washer"),
            ]),
            devices: DeviceRegistrySnapshot::from_entries([DeviceEntry {
                device_id: "dev.washer".to_string(),
                name: "Washer".to_string(),
                area_id: Some("area.kitchen".to_string()),
                ..DeviceEntry::default()
            }]),
        }
    }

    #[test]
    fn test_area_of_entity_falls_back_to_device() {
        let registry = registry();
        assert_eq!(registry.area_of_entity("light.kitchen"), Some("area.kitchen"));
        assert_eq!(
            registry.area_of_entity("sensor.washer_status"),
            Some("area.kitchen")
        );
        assert_eq!(registry.area_of_entity("light.missing"), None);
    }

    #[test]
    fn test_entities_of_device_scans_back_references() {
        let registry = registry();
        let entities = registry.entities_of_device("dev.washer");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_id, "sensor.washer_status");
    }

    #[test]
    fn test_area_ids_on_floor() {
        let registry = registry();
        assert_eq!(
            registry.area_ids_on_floor(Some("floor.ground")),
            vec!["area.kitchen".to_string()]
        );
        assert_eq!(
            registry.area_ids_on_floor(None),
            vec!["area.shed".to_string()]
        );
    }
}

//! Derives the effective entity sets shown per area and classification.
//!
//! Everything here is read-only over a [`SettingsTree`] and a
//! [`HomeRegistry`]; calling it any number of times has no side effects.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    AreaId, DeviceId, EntityEntry, EntityId, EntityType, HomeRegistry, LabelEntry, LabelId,
    SettingsTree,
};

/// An entity as presented by the admin panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityView {
    /// Entity id
    pub entity_id: EntityId,
    /// Display name
    pub name: String,
    /// Live state
    pub state: String,
    /// Icon to render
    pub icon: Option<String>,
    /// Effective area
    pub area_id: Option<AreaId>,
    /// Classification this entity resolved to, if any
    pub entity_type: Option<EntityType>,
    /// Effective enablement
    pub enabled: bool,
}

/// A device listed under "Devices".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceView {
    /// Device id
    pub device_id: DeviceId,
    /// Display name
    pub name: String,
    /// Area of the device
    pub area_id: Option<AreaId>,
    /// Manufacturer
    pub manufacturer: Option<String>,
    /// Model
    pub model: Option<String>,
    /// Effective enablement
    pub enabled: bool,
    /// Shown in the home status line
    pub show_in_home_status: bool,
    /// Configured state entity
    pub state_entity: Option<EntityId>,
    /// Configured timer entity
    pub timer_entity: Option<EntityId>,
    /// Entities not claimed by any category label
    pub entities: Vec<EntityView>,
}

/// An entity under a custom label together with its child entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEntityView {
    /// The labelled entity
    pub entity: EntityView,
    /// Linked child entities with their live state
    pub children: Vec<EntityView>,
}

/// Read-only resolver over the settings and the registry.
#[derive(Debug, Clone, Copy)]
pub struct EntityEnablementResolver<'a> {
    settings: &'a SettingsTree,
    registry: &'a HomeRegistry,
}

impl<'a> EntityEnablementResolver<'a> {
    /// Creates a resolver borrowing the current state.
    pub const fn new(settings: &'a SettingsTree, registry: &'a HomeRegistry) -> Self {
        Self { settings, registry }
    }

    /// Whether an entity is enabled for a classification (absent means enabled).
    pub fn is_enabled(&self, entity_type: EntityType, entity_id: &str) -> bool {
        self.settings.is_entity_enabled(entity_type, entity_id)
    }

    /// Whether a room is enabled (absent means enabled).
    pub fn is_room_enabled(&self, area_id: &str) -> bool {
        self.settings.is_room_enabled(area_id)
    }

    /// Classification of an entity: the first type, in declaration order,
    /// whose configured label the entity carries.
    pub fn classify(&self, entry: &EntityEntry) -> Option<EntityType> {
        EntityType::ALL.into_iter().find(|ty| {
            self.settings
                .category_label(*ty)
                .is_some_and(|label| entry.labels.contains(label))
        })
    }

    /// Whether the entity carries any configured category label.
    pub fn is_claimed(&self, entry: &EntityEntry, claimed: &BTreeSet<&str>) -> bool {
        entry
            .labels
            .iter()
            .any(|label| claimed.contains(label.as_str()))
    }

    /// Entities of `area_id` classified as `entity_type`, sorted by name.
    pub fn entities_for_area_and_type(
        &self,
        area_id: &str,
        entity_type: EntityType,
    ) -> Vec<EntityView> {
        if self.settings.category_label(entity_type).is_none() {
            return Vec::new();
        }
        let mut views: Vec<EntityView> = self
            .entities_in_area(area_id)
            .filter(|entry| self.classify(entry) == Some(entity_type))
            .map(|entry| {
                self.view(entry, Some(entity_type), self.is_enabled(entity_type, &entry.entity_id))
            })
            .collect();
        sort_by_name(&mut views);
        views
    }

    /// Devices in `area_id` with at least one entity not claimed by a
    /// category label. Each device lists only its unclaimed entities.
    pub fn appliances_for_area(&self, area_id: &str) -> Vec<DeviceView> {
        let claimed = self.settings.configured_category_labels();
        let mut views: Vec<DeviceView> = self
            .registry
            .devices
            .iter()
            .filter(|device| device.area_id.as_deref() == Some(area_id))
            .filter_map(|device| self.device_view(&device.device_id, &claimed))
            .collect();
        views.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        views
    }

    /// Enabled appliances flagged for the home status line, across all areas.
    pub fn appliances_with_home_status(&self) -> Vec<DeviceView> {
        let claimed = self.settings.configured_category_labels();
        let mut views: Vec<DeviceView> = self
            .settings
            .enabled_appliances
            .iter()
            .filter(|(_, config)| config.enabled && config.show_in_home_status)
            .filter_map(|(device_id, _)| self.device_view(device_id, &claimed))
            .collect();
        views.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        views
    }

    /// Entities of `area_id` carrying the custom label `label_id`.
    ///
    /// Labels mapped to a built-in classification yield nothing.
    pub fn custom_label_entities_for_area(
        &self,
        area_id: &str,
        label_id: &str,
    ) -> Vec<CustomEntityView> {
        if self.settings.configured_category_labels().contains(label_id) {
            return Vec::new();
        }
        let mut views: Vec<CustomEntityView> = self
            .entities_in_area(area_id)
            .filter(|entry| entry.labels.contains(label_id))
            .map(|entry| {
                let config = self.settings.custom_entity(&entry.entity_id);
                let children = config
                    .child_entities
                    .iter()
                    .filter(|child| **child != entry.entity_id)
                    .filter_map(|child| self.registry.entities.get(child))
                    .map(|child| self.view(child, None, true))
                    .collect();
                CustomEntityView {
                    entity: self.view(entry, None, config.enabled),
                    children,
                }
            })
            .collect();
        views.sort_by(|a, b| {
            a.entity
                .name
                .to_lowercase()
                .cmp(&b.entity.name.to_lowercase())
        });
        views
    }

    /// Candidate children for `parent_id`: other entities of the same device.
    pub fn potential_child_entities(&self, parent_id: &str) -> Vec<EntityView> {
        let Some(device_id) = self
            .registry
            .entities
            .get(parent_id)
            .and_then(|entry| entry.device_id.as_deref())
        else {
            return Vec::new();
        };
        let mut views: Vec<EntityView> = self
            .registry
            .entities_of_device(device_id)
            .into_iter()
            .filter(|entry| entry.entity_id != parent_id)
            .map(|entry| self.view(entry, self.classify(entry), true))
            .collect();
        sort_by_name(&mut views);
        views
    }

    /// Registry labels not mapped to a built-in classification.
    pub fn custom_labels(&self) -> Vec<&'a LabelEntry> {
        let claimed = self.settings.configured_category_labels();
        self.registry
            .labels
            .iter()
            .filter(|label| !claimed.contains(label.label_id.as_str()))
            .collect()
    }

    /// Suggested label for each classification that has none configured,
    /// detected from label names.
    pub fn suggest_category_labels(&self) -> BTreeMap<EntityType, LabelId> {
        let claimed = self.settings.configured_category_labels();
        let mut suggestions = BTreeMap::new();
        for label in &self.registry.labels {
            if claimed.contains(label.label_id.as_str()) {
                continue;
            }
            let Some(ty) = EntityType::detect_label(&label.label_id, &label.name) else {
                continue;
            };
            if self.settings.category_label(ty).is_none() {
                suggestions
                    .entry(ty)
                    .or_insert_with(|| label.label_id.clone());
            }
        }
        suggestions
    }

    fn entities_in_area<'s>(
        &'s self,
        area_id: &'s str,
    ) -> impl Iterator<Item = &'a EntityEntry> + 's {
        let registry = self.registry;
        registry
            .entities
            .iter()
            .filter(move |entry| registry.area_of_entity(&entry.entity_id) == Some(area_id))
    }

    fn device_view(&self, device_id: &str, claimed: &BTreeSet<&str>) -> Option<DeviceView> {
        let device = self.registry.devices.get(device_id)?;
        let mut entities: Vec<EntityView> = self
            .registry
            .entities_of_device(device_id)
            .into_iter()
            .filter(|entry| !self.is_claimed(entry, claimed))
            .map(|entry| self.view(entry, None, true))
            .collect();
        if entities.is_empty() {
            return None;
        }
        sort_by_name(&mut entities);
        let config = self.settings.appliance(device_id);
        Some(DeviceView {
            device_id: device.device_id.clone(),
            name: if device.name.is_empty() {
                device.device_id.clone()
            } else {
                device.name.clone()
            },
            area_id: device.area_id.clone(),
            manufacturer: device.manufacturer.clone(),
            model: device.model.clone(),
            enabled: config.enabled,
            show_in_home_status: config.show_in_home_status,
            state_entity: config.state_entity,
            timer_entity: config.timer_entity,
            entities,
        })
    }

    fn view(&self, entry: &EntityEntry, entity_type: Option<EntityType>, enabled: bool) -> EntityView {
        let state = entry.state_or_unknown().to_string();
        let icon = entry.icon.clone().or_else(|| {
            entity_type.map(|ty| ty.icon_for(&state, entry.hvac_action.as_deref()).to_string())
        });
        EntityView {
            entity_id: entry.entity_id.clone(),
            name: entry.display_name().to_string(),
            state,
            icon,
            area_id: self.registry.area_of_entity(&entry.entity_id).map(str::to_string),
            entity_type,
            enabled,
        }
    }
}

/// Case-insensitive substring filter over entity id and name.
///
/// An empty query returns the input unchanged.
pub fn search_filter(entities: &[EntityView], query: &str) -> Vec<EntityView> {
    if query.is_empty() {
        return entities.to_vec();
    }
    let needle = query.to_lowercase();
    entities
        .iter()
        .filter(|view| {
            view.entity_id.to_lowercase().contains(&needle)
                || view.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

fn sort_by_name(views: &mut [EntityView]) {
    views.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AreaEntry, DeviceEntry, DeviceRegistrySnapshot, EntityRegistrySnapshot, LabelEntry,
    };
    use std::sync::Arc;

    fn registry() -> HomeRegistry {
        HomeRegistry {
            floors: vec![],
            areas: vec![AreaEntry {
                area_id: "area.kitchen".to_string(),
                name: "Kitchen".to_string(),
                floor_id: None,
            }],
            labels: vec![
                LabelEntry {
                    label_id: "label.licht".to_string(),
                    name: "Licht".to_string(),
                    icon: None,
                },
                LabelEntry {
                    label_id: "label.window".to_string(),
                    name: "Fenster".to_string(),
                    icon: None,
                },
            ],
            entities: EntityRegistrySnapshot::from_entries([
                EntityEntry::new("light.ceiling")
                    .with_area("area.kitchen")
                    .with_label("label.licht")
                    .with_name("Ceiling")
                    .with_state("on"),
                EntityEntry::new("light.both")
                    .with_area("area.kitchen")
                    .with_label("label.licht")
                    .with_label("label.window")
                    .with_name("Both"),
                EntityEntry::new("binary_sensor.window")
                    .with_area("area.kitchen")
                    .with_label("label.window")
                    .with_name("Window"),
                EntityEntry::new("sensor.dishwasher_state")
                    .with_device("dev.dishwasher")
                    .with_name("Dishwasher state"),
                EntityEntry::new("light.dishwasher_led")
                    .with_device("dev.dishwasher")
                    .with_label("label.licht")
                    .with_name("Dishwasher LED"),
            ]),
            devices: DeviceRegistrySnapshot::from_entries([DeviceEntry {
                device_id: "dev.dishwasher".to_string(),
                name: "Dishwasher".to_string(),
                area_id: Some("area.kitchen".to_string()),
                ..DeviceEntry::default()
            }]),
        }
    }

    fn settings() -> SettingsTree {
        let mut tree = SettingsTree::default();
        let labels = Arc::make_mut(&mut tree.category_label_id);
        labels.insert(EntityType::Lights, Some("label.licht".to_string()));
        labels.insert(EntityType::Windows, Some("label.window".to_string()));
        tree
    }

    #[test]
    fn test_entities_for_area_and_type_first_match_wins() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);

        let lights = resolver.entities_for_area_and_type("area.kitchen", EntityType::Lights);
        let names: Vec<&str> = lights.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Both", "Ceiling", "Dishwasher LED"]);
        assert!(lights.iter().all(|v| v.enabled));
        assert_eq!(lights[1].icon.as_deref(), Some("mdi:lightbulb"));

        let windows = resolver.entities_for_area_and_type("area.kitchen", EntityType::Windows);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].entity_id, "binary_sensor.window");
    }

    #[test]
    fn test_unconfigured_type_yields_nothing() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        assert!(resolver
            .entities_for_area_and_type("area.kitchen", EntityType::Locks)
            .is_empty());
    }

    #[test]
    fn test_explicit_false_disables() {
        let registry = registry();
        let mut tree = settings();
        let lights = Arc::make_mut(&mut tree.enabled_by_type);
        Arc::make_mut(lights.entry(EntityType::Lights).or_default())
            .insert("light.ceiling".to_string(), false);
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        assert!(!resolver.is_enabled(EntityType::Lights, "light.ceiling"));
        assert!(resolver.is_enabled(EntityType::Lights, "light.both"));
    }

    #[test]
    fn test_appliances_exclude_claimed_entities() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);

        let appliances = resolver.appliances_for_area("area.kitchen");
        assert_eq!(appliances.len(), 1);
        let ids: Vec<&str> = appliances[0]
            .entities
            .iter()
            .map(|v| v.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["sensor.dishwasher_state"]);
        assert!(appliances[0].enabled);
    }

    #[test]
    fn test_custom_label_entities_skip_category_labels() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        assert!(resolver
            .custom_label_entities_for_area("area.kitchen", "label.licht")
            .is_empty());
    }

    #[test]
    fn test_potential_child_entities() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        let children = resolver.potential_child_entities("sensor.dishwasher_state");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].entity_id, "light.dishwasher_led");
        assert!(resolver.potential_child_entities("light.ceiling").is_empty());
    }

    #[test]
    fn test_search_filter() {
        let registry = registry();
        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        let lights = resolver.entities_for_area_and_type("area.kitchen", EntityType::Lights);

        assert_eq!(search_filter(&lights, ""), lights);
        let hits = search_filter(&lights, "CEIL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity_id, "light.ceiling");
        let hits = search_filter(&lights, "light.dish");
        assert_eq!(hits.len(), 1);

        // Whitespace is matched literally
        let hits = search_filter(&lights, " ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Dishwasher LED");
        assert!(search_filter(&lights, "  ").is_empty());
    }

    #[test]
    fn test_suggest_category_labels_skips_configured() {
        let registry = registry();
        let tree = SettingsTree::default();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        let suggestions = resolver.suggest_category_labels();
        assert_eq!(
            suggestions.get(&EntityType::Lights).map(String::as_str),
            Some("label.licht")
        );
        assert_eq!(
            suggestions.get(&EntityType::Windows).map(String::as_str),
            Some("label.window")
        );

        let tree = settings();
        let resolver = EntityEnablementResolver::new(&tree, &registry);
        assert!(resolver.suggest_category_labels().is_empty());
    }
}

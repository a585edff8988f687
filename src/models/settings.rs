//! The persisted settings document.
//!
//! `SettingsTree` is a plain serde document whose top-level sections are held
//! behind `Arc`s. Cloning a tree is therefore cheap, and a mutation only
//! copies the section it touches (`Arc::make_mut`). Undo commands capture
//! these `Arc`s instead of deep copies.
//!
//! Absent keys in every `enabled*` map mean "enabled": only an explicit
//! `false` disables.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{AreaId, DeviceId, EntityId, EntityType, FloorId, LabelId};
use crate::constants::{defaults, layout, thresholds};

/// Id → explicit enabled flag.
pub type EnabledMap = BTreeMap<String, bool>;

/// Room-order key for a floor; rooms without a floor use `_unassigned`.
pub fn room_order_key(floor_id: Option<&str>) -> String {
    floor_id.map_or_else(|| layout::UNASSIGNED_FLOOR_KEY.to_string(), str::to_string)
}

/// Custom (non built-in) label configuration. Custom labels are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomLabelConfig {
    /// Whether the label gets its own section
    #[serde(default)]
    pub enabled: bool,
}

/// Per-entity configuration for entities shown under a custom label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEntityConfig {
    /// Whether the entity is shown
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Related entities displayed together with this one
    #[serde(default)]
    pub child_entities: Vec<EntityId>,
}

impl Default for CustomEntityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            child_entities: Vec::new(),
        }
    }
}

/// Configuration of a device shown as an appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceConfig {
    /// Whether the appliance is shown
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the appliance appears in the home status line
    #[serde(default)]
    pub show_in_home_status: bool,
    /// Entity reporting the appliance state
    #[serde(default)]
    pub state_entity: Option<EntityId>,
    /// Entity reporting the remaining/finish time
    #[serde(default)]
    pub timer_entity: Option<EntityId>,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_in_home_status: false,
            state_entity: None,
            timer_entity: None,
        }
    }
}

/// What a scene button triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneActionType {
    /// Calls a service (`domain.service`)
    #[default]
    Service,
    /// Activates a scene
    Scene,
    /// Runs a script
    Script,
}

/// A quick-action button on the home screen or in a room popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneButton {
    /// Button text
    pub label: String,
    /// MDI icon
    #[serde(default = "default_scene_icon")]
    pub icon: String,
    /// Kind of action
    #[serde(default)]
    pub action_type: SceneActionType,
    /// Entity or service to call
    #[serde(default)]
    pub entity: String,
    /// Room the button belongs to; `None` for the global row
    #[serde(default)]
    pub room_id: Option<AreaId>,
}

impl SceneButton {
    /// Creates a button with the default icon.
    pub fn new(
        label: impl Into<String>,
        action_type: SceneActionType,
        entity: impl Into<String>,
        room_id: Option<AreaId>,
    ) -> Self {
        Self {
            label: label.into(),
            icon: default_scene_icon(),
            action_type,
            entity: entity.into(),
            room_id,
        }
    }
}

/// Content of a floor-card slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// A single entity
    #[default]
    Entity,
    /// An appliance (device)
    Appliance,
}

/// One assigned slot on a floor card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorCardSlot {
    /// Entity shown in the slot
    pub entity_id: EntityId,
    /// Slot content kind
    #[serde(rename = "type", default)]
    pub kind: SlotKind,
    /// Device when the slot shows an appliance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appliance: Option<DeviceId>,
}

impl FloorCardSlot {
    /// Slot showing an entity.
    pub fn entity(entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: SlotKind::Entity,
            appliance: None,
        }
    }

    /// Slot showing an appliance through one of its entities.
    pub fn appliance(device_id: impl Into<DeviceId>, entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: SlotKind::Appliance,
            appliance: Some(device_id.into()),
        }
    }
}

/// Media quick-play preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPreset {
    /// Display name
    pub name: String,
    /// Content id passed to `media_player.play_media`
    pub media_content_id: String,
    /// Cover image
    #[serde(default)]
    pub image_url: String,
}

/// A public-transport departure sensor shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDeparture {
    /// Unique id (the same sensor may be added more than once)
    pub id: String,
    /// Departure sensor
    pub entity: EntityId,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Only show while this entity is in `condition_state`
    #[serde(default)]
    pub condition_entity: String,
    /// Required state of `condition_entity`
    #[serde(default)]
    pub condition_state: String,
    /// Walking time to the station in minutes
    #[serde(default)]
    pub delay_minutes: u32,
    /// Start of the display window (HH:MM)
    #[serde(default)]
    pub time_start: String,
    /// End of the display window (HH:MM)
    #[serde(default)]
    pub time_end: String,
}

/// Items of the header status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InfoTextKey {
    /// Motion detected
    Motion,
    /// Garage open
    Garage,
    /// Washing machine
    Washer,
    /// Open windows
    Windows,
    /// Lights on
    Lights,
    /// Open covers
    Covers,
    /// Dishwasher
    Dishwasher,
    /// Dryer
    Dryer,
    /// Robot vacuum
    Vacuum,
    /// Low batteries
    BatteryLow,
}

impl InfoTextKey {
    /// All keys in display order.
    pub const ALL: [Self; 10] = [
        Self::Motion,
        Self::Garage,
        Self::Washer,
        Self::Windows,
        Self::Lights,
        Self::Covers,
        Self::Dishwasher,
        Self::Dryer,
        Self::Vacuum,
        Self::BatteryLow,
    ];

    /// Factory default for this item.
    pub fn default_item(self) -> InfoTextItem {
        let mut item = InfoTextItem {
            enabled: matches!(self, Self::Motion | Self::Garage | Self::Washer),
            ..InfoTextItem::default()
        };
        match self {
            Self::Washer | Self::Dishwasher | Self::Dryer => {
                item.entity = Some(String::new());
                item.finish_time_entity = Some(String::new());
            }
            Self::Vacuum => item.entity = Some(String::new()),
            Self::BatteryLow => item.threshold = Some(thresholds::BATTERY_LOW),
            _ => {}
        }
        item
    }
}

/// Configuration of one status-line item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoTextItem {
    /// Whether the item is shown
    #[serde(default)]
    pub enabled: bool,
    /// Entity backing the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityId>,
    /// Entity reporting the finish time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time_entity: Option<EntityId>,
    /// Threshold (battery percentage)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
}

/// Role of a configured weather entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeatherRole {
    /// Main forecast entity
    Forecast,
    /// Current temperature sensor
    CurrentTemp,
    /// Current condition sensor
    CurrentState,
    /// Today's temperature
    TodayTemp,
    /// Today's condition
    TodayState,
    /// Tomorrow's temperature
    TomorrowTemp,
    /// Tomorrow's condition
    TomorrowState,
    /// Temperature the day after tomorrow
    Day2Temp,
    /// Condition the day after tomorrow
    Day2State,
    /// Precipitation sensor
    Precipitation,
    /// Hourly forecast entity
    HourlyForecast,
    /// Weather warning entity
    DwdWarning,
}

/// Scalars and small collections that do not warrant their own section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiscSettings {
    /// Temperature notification threshold (°C)
    pub notification_temp_threshold: f64,
    /// Humidity notification threshold (%)
    pub notification_humidity_threshold: f64,
    /// Weather entities by role
    pub weather: BTreeMap<WeatherRole, EntityId>,
    /// Person entity → custom photo URL
    pub user_photos: BTreeMap<EntityId, String>,
    /// Waste-collection sensors
    pub garbage_sensors: Vec<EntityId>,
    /// Floor whose card shows the waste collection
    pub garbage_display_floor: Option<FloorId>,
    /// Departure sensors
    pub train_departures: Vec<TrainDeparture>,
    /// Header status line configuration
    pub info_text_config: BTreeMap<InfoTextKey, InfoTextItem>,
    /// Last release whose changelog was shown
    pub last_seen_version: Option<String>,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            notification_temp_threshold: thresholds::DEFAULT_TEMP_NOTIFICATION,
            notification_humidity_threshold: thresholds::DEFAULT_HUMIDITY_NOTIFICATION,
            weather: BTreeMap::from([(WeatherRole::Forecast, defaults::WEATHER_ENTITY.to_string())]),
            user_photos: BTreeMap::new(),
            garbage_sensors: Vec::new(),
            garbage_display_floor: None,
            train_departures: Vec::new(),
            info_text_config: InfoTextKey::ALL
                .into_iter()
                .map(|key| (key, key.default_item()))
                .collect(),
            last_seen_version: None,
        }
    }
}

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsTree {
    /// Floor display order
    pub floor_order: Arc<Vec<FloorId>>,
    /// Room display order per floor (`_unassigned` for rooms without floor)
    #[serde(alias = "roomOrder")]
    pub room_order_by_floor: Arc<BTreeMap<String, Arc<Vec<AreaId>>>>,
    /// Explicit room enablement
    pub enabled_rooms: Arc<EnabledMap>,
    /// Explicit entity enablement per classification
    #[serde(deserialize_with = "type_keyed")]
    pub enabled_by_type: Arc<BTreeMap<EntityType, Arc<EnabledMap>>>,
    /// Label mapped to each built-in classification
    #[serde(alias = "categoryLabels", deserialize_with = "type_keyed")]
    pub category_label_id: Arc<BTreeMap<EntityType, Option<LabelId>>>,
    /// Custom label configuration
    pub custom_labels: Arc<BTreeMap<LabelId, CustomLabelConfig>>,
    /// Per-entity configuration under custom labels
    pub enabled_custom_entities: Arc<BTreeMap<EntityId, CustomEntityConfig>>,
    /// Appliance configuration per device
    pub enabled_appliances: Arc<BTreeMap<DeviceId, ApplianceConfig>>,
    /// Scene buttons, global and per room
    pub scene_buttons: Arc<Vec<SceneButton>>,
    /// Floor card slot assignments
    pub floor_card_config: Arc<BTreeMap<FloorId, BTreeMap<u8, FloorCardSlot>>>,
    /// Floors showing the overview card
    pub floor_overview_enabled: Arc<BTreeMap<FloorId, bool>>,
    /// Media presets
    pub media_presets: Arc<Vec<MediaPreset>>,
    /// Remaining scalars
    #[serde(flatten)]
    pub misc: Arc<MiscSettings>,
}

impl Default for SettingsTree {
    fn default() -> Self {
        Self {
            floor_order: Arc::default(),
            room_order_by_floor: Arc::default(),
            enabled_rooms: Arc::default(),
            enabled_by_type: Arc::new(
                EntityType::ALL
                    .into_iter()
                    .map(|ty| (ty, Arc::default()))
                    .collect(),
            ),
            category_label_id: Arc::new(EntityType::ALL.into_iter().map(|ty| (ty, None)).collect()),
            custom_labels: Arc::default(),
            enabled_custom_entities: Arc::default(),
            enabled_appliances: Arc::default(),
            scene_buttons: Arc::default(),
            floor_card_config: Arc::default(),
            floor_overview_enabled: Arc::default(),
            media_presets: Arc::default(),
            misc: Arc::default(),
        }
    }
}

impl SettingsTree {
    /// Parses a persisted document and merges it over the defaults.
    ///
    /// Missing fields take their default, unknown fields and unknown
    /// classification keys are ignored, and per-key maps (category labels,
    /// status-line items, enablement per type) are completed key by key.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        let mut tree: Self = serde_json::from_value(value)?;
        tree.fill_defaults();
        Ok(tree)
    }

    /// Serializes the document.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn fill_defaults(&mut self) {
        if EntityType::ALL
            .iter()
            .any(|ty| !self.enabled_by_type.contains_key(ty))
        {
            let map = Arc::make_mut(&mut self.enabled_by_type);
            for ty in EntityType::ALL {
                map.entry(ty).or_default();
            }
        }
        if EntityType::ALL
            .iter()
            .any(|ty| !self.category_label_id.contains_key(ty))
        {
            let map = Arc::make_mut(&mut self.category_label_id);
            for ty in EntityType::ALL {
                map.entry(ty).or_insert(None);
            }
        }
        if InfoTextKey::ALL
            .iter()
            .any(|key| !self.misc.info_text_config.contains_key(key))
        {
            let misc = Arc::make_mut(&mut self.misc);
            for key in InfoTextKey::ALL {
                misc.info_text_config
                    .entry(key)
                    .or_insert_with(|| key.default_item());
            }
        }
    }

    /// Whether a room is enabled (absent means enabled).
    pub fn is_room_enabled(&self, area_id: &str) -> bool {
        self.enabled_rooms.get(area_id).copied().unwrap_or(true)
    }

    /// Whether an entity is enabled for a classification (absent means enabled).
    pub fn is_entity_enabled(&self, entity_type: EntityType, entity_id: &str) -> bool {
        self.enabled_by_type
            .get(&entity_type)
            .and_then(|map| map.get(entity_id))
            .copied()
            .unwrap_or(true)
    }

    /// Label mapped to a classification, if any.
    pub fn category_label(&self, entity_type: EntityType) -> Option<&str> {
        self.category_label_id
            .get(&entity_type)
            .and_then(|label| label.as_deref())
    }

    /// Every label mapped to some classification.
    pub fn configured_category_labels(&self) -> BTreeSet<&str> {
        self.category_label_id
            .values()
            .filter_map(|label| label.as_deref())
            .collect()
    }

    /// Whether a custom label is enabled (absent means disabled).
    pub fn is_custom_label_enabled(&self, label_id: &str) -> bool {
        self.custom_labels
            .get(label_id)
            .is_some_and(|config| config.enabled)
    }

    /// Custom-entity configuration, defaulted when absent.
    pub fn custom_entity(&self, entity_id: &str) -> CustomEntityConfig {
        self.enabled_custom_entities
            .get(entity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Appliance configuration, defaulted when absent.
    pub fn appliance(&self, device_id: &str) -> ApplianceConfig {
        self.enabled_appliances
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether a floor shows the overview card (opt-in).
    pub fn is_floor_overview_enabled(&self, floor_id: &str) -> bool {
        self.floor_overview_enabled
            .get(floor_id)
            .copied()
            .unwrap_or(false)
    }

    /// Stored room order for a floor (`None` for unassigned rooms).
    pub fn room_order(&self, floor_id: Option<&str>) -> &[AreaId] {
        self.room_order_by_floor
            .get(&room_order_key(floor_id))
            .map_or(&[], |order| order.as_slice())
    }

    /// Scene buttons of a room, or the global ones for `None`.
    pub fn scene_buttons_for_room(&self, room_id: Option<&str>) -> Vec<&SceneButton> {
        self.scene_buttons
            .iter()
            .filter(|button| button.room_id.as_deref() == room_id)
            .collect()
    }
}

fn default_true() -> bool {
    true
}

fn default_scene_icon() -> String {
    defaults::SCENE_BUTTON_ICON.to_string()
}

/// Deserializes a classification-keyed map, skipping keys that are not a
/// known classification. Singular keys of older documents ("light") are
/// accepted; the current key wins when both are present.
fn type_keyed<'de, D, V>(deserializer: D) -> Result<Arc<BTreeMap<EntityType, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    let mut map = BTreeMap::new();
    for (key, value) in raw {
        if let Some(ty) = EntityType::from_key(&key) {
            map.insert(ty, value);
        } else if let Some(ty) = EntityType::from_legacy_key(&key) {
            map.entry(ty).or_insert(value);
        }
    }
    Ok(Arc::new(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_enabled_semantics() {
        let tree = SettingsTree::default();
        assert!(tree.is_room_enabled("area.kitchen"));
        assert!(tree.is_entity_enabled(EntityType::Lights, "light.anything"));
        assert!(!tree.is_custom_label_enabled("label.tv_extras"));
        assert!(!tree.is_floor_overview_enabled("floor.ground"));
        assert!(tree.appliance("dev.washer").enabled);
        assert!(tree.custom_entity("media_player.tv").enabled);
    }

    #[test]
    fn test_from_json_merges_over_defaults() {
        let tree = SettingsTree::from_json(json!({
            "floorOrder": ["floor.first", "floor.ground"],
            "enabledRooms": {"area.kitchen": false},
            "categoryLabels": {"lights": "label.licht", "doors": "label.door"},
            "notificationTempThreshold": 25.5,
            "someFutureField": {"nested": true}
        }))
        .unwrap();

        assert_eq!(*tree.floor_order, vec!["floor.first", "floor.ground"]);
        assert!(!tree.is_room_enabled("area.kitchen"));
        assert_eq!(tree.category_label(EntityType::Lights), Some("label.licht"));
        assert_eq!(tree.category_label(EntityType::Covers), None);
        assert_eq!(tree.category_label_id.len(), EntityType::ALL.len());
        assert_eq!(tree.enabled_by_type.len(), EntityType::ALL.len());
        assert!((tree.misc.notification_temp_threshold - 25.5).abs() < f64::EPSILON);
        assert_eq!(
            tree.misc.weather.get(&WeatherRole::Forecast).map(String::as_str),
            Some(defaults::WEATHER_ENTITY)
        );
        assert_eq!(tree.misc.info_text_config.len(), InfoTextKey::ALL.len());
    }

    #[test]
    fn test_from_json_reads_singular_category_keys() {
        let tree = SettingsTree::from_json(json!({
            "categoryLabels": {
                "light": "label.licht",
                "mediaPlayer": "label.media",
                "tv": null,
                "cover": "label.old_rollo",
                "covers": "label.rollo"
            }
        }))
        .unwrap();

        assert_eq!(tree.category_label(EntityType::Lights), Some("label.licht"));
        assert_eq!(tree.category_label(EntityType::MediaPlayers), Some("label.media"));
        assert_eq!(tree.category_label(EntityType::Tvs), None);
        assert_eq!(tree.category_label(EntityType::Covers), Some("label.rollo"));

        let value = tree.to_json().unwrap();
        assert_eq!(value["categoryLabelId"]["lights"], "label.licht");
    }

    #[test]
    fn test_partial_info_text_config_is_completed() {
        let tree = SettingsTree::from_json(json!({
            "infoTextConfig": {"windows": {"enabled": true}}
        }))
        .unwrap();
        assert!(tree.misc.info_text_config[&InfoTextKey::Windows].enabled);
        assert_eq!(
            tree.misc.info_text_config[&InfoTextKey::BatteryLow].threshold,
            Some(thresholds::BATTERY_LOW)
        );
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let tree = SettingsTree::default();
        let value = tree.to_json().unwrap();
        assert!(value.get("floorOrder").is_some());
        assert!(value.get("notificationTempThreshold").is_some());
        assert_eq!(SettingsTree::from_json(value).unwrap(), tree);
    }

    #[test]
    fn test_floor_card_slot_shape() {
        let slot = FloorCardSlot::entity("sensor.temp_ground");
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value, json!({"entity_id": "sensor.temp_ground", "type": "entity"}));
    }

    #[test]
    fn test_unassigned_room_order_key() {
        assert_eq!(room_order_key(None), "_unassigned");
        assert_eq!(room_order_key(Some("floor.ground")), "floor.ground");
    }
}

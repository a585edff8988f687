//! Data models for the dashboard configuration.
//!
//! This module contains the settings document, its value types, the entity
//! classification table and the registry snapshots supplied by the caller.
//! Models are independent of the store and of persistence.

pub mod entity_type;
pub mod registry;
pub mod settings;

/// Floor id from the hub's floor registry
pub type FloorId = String;
/// Area (room) id
pub type AreaId = String;
/// Entity id
pub type EntityId = String;
/// Device id
pub type DeviceId = String;
/// Label id
pub type LabelId = String;

// Re-export all model types
pub use entity_type::{ActiveRule, EntityType, EntityTypeDescriptor};
pub use registry::{
    AreaEntry, DeviceEntry, DeviceRegistrySnapshot, EntityEntry, EntityRegistrySnapshot,
    FloorEntry, HomeRegistry, LabelEntry,
};
pub use settings::{
    room_order_key, ApplianceConfig, CustomEntityConfig, CustomLabelConfig, EnabledMap,
    FloorCardSlot, InfoTextItem, InfoTextKey, MediaPreset, MiscSettings, SceneActionType,
    SceneButton, SettingsTree, SlotKind, TrainDeparture, WeatherRole,
};

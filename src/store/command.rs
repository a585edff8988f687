//! Reversible, describable mutations of the settings tree.
//!
//! A [`Command`] carries a forward and a backward list of [`Patch`]es. Each
//! patch replaces the smallest affected part of the tree: a single enablement
//! flag, one floor's room order, or one top-level section. Section patches
//! hold `Arc`s taken from the tree, so building a command never deep-copies.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{
    ApplianceConfig, AreaId, CustomEntityConfig, CustomLabelConfig, DeviceId, EnabledMap,
    EntityId, EntityType, FloorCardSlot, FloorId, LabelId, MediaPreset, MiscSettings,
    SceneButton, SettingsTree,
};

/// Top-level section of the settings tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    /// `floorOrder`
    FloorOrder,
    /// `roomOrderByFloor`
    RoomOrder,
    /// `enabledRooms`
    EnabledRooms,
    /// `enabledByType`
    EnabledByType,
    /// `categoryLabelId`
    CategoryLabels,
    /// `customLabels`
    CustomLabels,
    /// `enabledCustomEntities`
    CustomEntities,
    /// `enabledAppliances`
    Appliances,
    /// `sceneButtons`
    SceneButtons,
    /// `floorCardConfig`
    FloorCards,
    /// `floorOverviewEnabled`
    FloorOverview,
    /// `mediaPresets`
    MediaPresets,
    /// Thresholds, weather, photos, garbage, departures, status line
    Misc,
}

impl Section {
    /// Every section.
    pub const ALL: [Self; 13] = [
        Self::FloorOrder,
        Self::RoomOrder,
        Self::EnabledRooms,
        Self::EnabledByType,
        Self::CategoryLabels,
        Self::CustomLabels,
        Self::CustomEntities,
        Self::Appliances,
        Self::SceneButtons,
        Self::FloorCards,
        Self::FloorOverview,
        Self::MediaPresets,
        Self::Misc,
    ];
}

/// A captured section value.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionSnapshot {
    /// Floor order
    FloorOrder(Arc<Vec<FloorId>>),
    /// Room order for every floor
    RoomOrder(Arc<BTreeMap<String, Arc<Vec<AreaId>>>>),
    /// Room enablement
    EnabledRooms(Arc<EnabledMap>),
    /// Entity enablement per type
    EnabledByType(Arc<BTreeMap<EntityType, Arc<EnabledMap>>>),
    /// Category label mapping
    CategoryLabels(Arc<BTreeMap<EntityType, Option<LabelId>>>),
    /// Custom labels
    CustomLabels(Arc<BTreeMap<LabelId, CustomLabelConfig>>),
    /// Custom entities
    CustomEntities(Arc<BTreeMap<EntityId, CustomEntityConfig>>),
    /// Appliances
    Appliances(Arc<BTreeMap<DeviceId, ApplianceConfig>>),
    /// Scene buttons
    SceneButtons(Arc<Vec<SceneButton>>),
    /// Floor card slots
    FloorCards(Arc<BTreeMap<FloorId, BTreeMap<u8, FloorCardSlot>>>),
    /// Floor overview flags
    FloorOverview(Arc<BTreeMap<FloorId, bool>>),
    /// Media presets
    MediaPresets(Arc<Vec<MediaPreset>>),
    /// Misc scalars
    Misc(Arc<MiscSettings>),
}

impl SectionSnapshot {
    /// Captures `section` from `tree` (an `Arc` clone).
    pub fn capture(tree: &SettingsTree, section: Section) -> Self {
        match section {
            Section::FloorOrder => Self::FloorOrder(Arc::clone(&tree.floor_order)),
            Section::RoomOrder => Self::RoomOrder(Arc::clone(&tree.room_order_by_floor)),
            Section::EnabledRooms => Self::EnabledRooms(Arc::clone(&tree.enabled_rooms)),
            Section::EnabledByType => Self::EnabledByType(Arc::clone(&tree.enabled_by_type)),
            Section::CategoryLabels => Self::CategoryLabels(Arc::clone(&tree.category_label_id)),
            Section::CustomLabels => Self::CustomLabels(Arc::clone(&tree.custom_labels)),
            Section::CustomEntities => {
                Self::CustomEntities(Arc::clone(&tree.enabled_custom_entities))
            }
            Section::Appliances => Self::Appliances(Arc::clone(&tree.enabled_appliances)),
            Section::SceneButtons => Self::SceneButtons(Arc::clone(&tree.scene_buttons)),
            Section::FloorCards => Self::FloorCards(Arc::clone(&tree.floor_card_config)),
            Section::FloorOverview => Self::FloorOverview(Arc::clone(&tree.floor_overview_enabled)),
            Section::MediaPresets => Self::MediaPresets(Arc::clone(&tree.media_presets)),
            Section::Misc => Self::Misc(Arc::clone(&tree.misc)),
        }
    }

    /// Section this snapshot belongs to.
    pub const fn section(&self) -> Section {
        match self {
            Self::FloorOrder(_) => Section::FloorOrder,
            Self::RoomOrder(_) => Section::RoomOrder,
            Self::EnabledRooms(_) => Section::EnabledRooms,
            Self::EnabledByType(_) => Section::EnabledByType,
            Self::CategoryLabels(_) => Section::CategoryLabels,
            Self::CustomLabels(_) => Section::CustomLabels,
            Self::CustomEntities(_) => Section::CustomEntities,
            Self::Appliances(_) => Section::Appliances,
            Self::SceneButtons(_) => Section::SceneButtons,
            Self::FloorCards(_) => Section::FloorCards,
            Self::FloorOverview(_) => Section::FloorOverview,
            Self::MediaPresets(_) => Section::MediaPresets,
            Self::Misc(_) => Section::Misc,
        }
    }

    /// Writes the snapshot back into `tree`.
    pub fn restore(&self, tree: &mut SettingsTree) {
        match self {
            Self::FloorOrder(value) => tree.floor_order = Arc::clone(value),
            Self::RoomOrder(value) => tree.room_order_by_floor = Arc::clone(value),
            Self::EnabledRooms(value) => tree.enabled_rooms = Arc::clone(value),
            Self::EnabledByType(value) => tree.enabled_by_type = Arc::clone(value),
            Self::CategoryLabels(value) => tree.category_label_id = Arc::clone(value),
            Self::CustomLabels(value) => tree.custom_labels = Arc::clone(value),
            Self::CustomEntities(value) => tree.enabled_custom_entities = Arc::clone(value),
            Self::Appliances(value) => tree.enabled_appliances = Arc::clone(value),
            Self::SceneButtons(value) => tree.scene_buttons = Arc::clone(value),
            Self::FloorCards(value) => tree.floor_card_config = Arc::clone(value),
            Self::FloorOverview(value) => tree.floor_overview_enabled = Arc::clone(value),
            Self::MediaPresets(value) => tree.media_presets = Arc::clone(value),
            Self::Misc(value) => tree.misc = Arc::clone(value),
        }
    }
}

/// One change to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Replace a whole section
    Section(SectionSnapshot),
    /// Set or clear one room's explicit enablement
    RoomEnabled {
        /// Room
        area_id: AreaId,
        /// `None` removes the explicit flag
        value: Option<bool>,
    },
    /// Set or clear one entity's explicit enablement
    EntityEnabled {
        /// Classification
        entity_type: EntityType,
        /// Entity
        entity_id: EntityId,
        /// `None` removes the explicit flag
        value: Option<bool>,
    },
    /// Replace or remove one floor's room order
    RoomOrder {
        /// Room-order key (floor id or `_unassigned`)
        floor_key: String,
        /// `None` removes the entry
        order: Option<Arc<Vec<AreaId>>>,
    },
}

impl Patch {
    /// Applies the patch to `tree`.
    pub fn apply(&self, tree: &mut SettingsTree) {
        match self {
            Self::Section(snapshot) => snapshot.restore(tree),
            Self::RoomEnabled { area_id, value } => {
                let rooms = Arc::make_mut(&mut tree.enabled_rooms);
                match value {
                    Some(enabled) => {
                        rooms.insert(area_id.clone(), *enabled);
                    }
                    None => {
                        rooms.remove(area_id);
                    }
                }
            }
            Self::EntityEnabled {
                entity_type,
                entity_id,
                value,
            } => {
                let by_type = Arc::make_mut(&mut tree.enabled_by_type);
                let map = Arc::make_mut(by_type.entry(*entity_type).or_default());
                match value {
                    Some(enabled) => {
                        map.insert(entity_id.clone(), *enabled);
                    }
                    None => {
                        map.remove(entity_id);
                    }
                }
            }
            Self::RoomOrder { floor_key, order } => {
                let orders = Arc::make_mut(&mut tree.room_order_by_floor);
                match order {
                    Some(order) => {
                        orders.insert(floor_key.clone(), Arc::clone(order));
                    }
                    None => {
                        orders.remove(floor_key);
                    }
                }
            }
        }
    }

    /// Section touched by this patch.
    pub const fn section(&self) -> Section {
        match self {
            Self::Section(snapshot) => snapshot.section(),
            Self::RoomEnabled { .. } => Section::EnabledRooms,
            Self::EntityEnabled { .. } => Section::EnabledByType,
            Self::RoomOrder { .. } => Section::RoomOrder,
        }
    }

    /// The patch that restores the part of `tree` this patch overwrites.
    pub fn inverse_against(&self, tree: &SettingsTree) -> Self {
        match self {
            Self::Section(snapshot) => {
                Self::Section(SectionSnapshot::capture(tree, snapshot.section()))
            }
            Self::RoomEnabled { area_id, .. } => Self::RoomEnabled {
                area_id: area_id.clone(),
                value: tree.enabled_rooms.get(area_id).copied(),
            },
            Self::EntityEnabled {
                entity_type,
                entity_id,
                ..
            } => Self::EntityEnabled {
                entity_type: *entity_type,
                entity_id: entity_id.clone(),
                value: tree
                    .enabled_by_type
                    .get(entity_type)
                    .and_then(|map| map.get(entity_id))
                    .copied(),
            },
            Self::RoomOrder { floor_key, .. } => Self::RoomOrder {
                floor_key: floor_key.clone(),
                order: tree.room_order_by_floor.get(floor_key).cloned(),
            },
        }
    }
}

/// Key under which rapid edits of the same leaf are merged into one command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoalesceKey {
    /// Mutation method
    pub method: &'static str,
    /// Primary target id
    pub target: String,
}

impl CoalesceKey {
    /// Creates a key.
    pub fn new(method: &'static str, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
        }
    }
}

/// A reversible mutation with a human-readable description.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    description: String,
    coalesce: Option<CoalesceKey>,
    forward: Vec<Patch>,
    backward: Vec<Patch>,
}

impl Command {
    /// Builds a command whose backward patches are captured from `tree`,
    /// the state the forward patches will be applied to.
    pub fn from_patches(
        description: impl Into<String>,
        forward: Vec<Patch>,
        tree: &SettingsTree,
    ) -> Self {
        let mut scratch = tree.clone();
        let mut backward = Vec::with_capacity(forward.len());
        for patch in &forward {
            backward.push(patch.inverse_against(&scratch));
            patch.apply(&mut scratch);
        }
        Self {
            description: description.into(),
            coalesce: None,
            forward,
            backward,
        }
    }

    /// Marks the command as coalescable under `key`.
    pub fn coalescing(mut self, key: CoalesceKey) -> Self {
        self.coalesce = Some(key);
        self
    }

    /// Description shown in undo/redo tooltips.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Coalescing key, if any.
    pub const fn coalesce_key(&self) -> Option<&CoalesceKey> {
        self.coalesce.as_ref()
    }

    /// Sections touched by this command, deduplicated.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = self.forward.iter().map(Patch::section).collect();
        sections.sort();
        sections.dedup();
        sections
    }

    /// Applies the forward patches.
    pub fn apply(&self, tree: &mut SettingsTree) {
        for patch in &self.forward {
            patch.apply(tree);
        }
    }

    /// Applies the backward patches in reverse order.
    pub fn invert(&self, tree: &mut SettingsTree) {
        for patch in self.backward.iter().rev() {
            patch.apply(tree);
        }
    }

    /// Whether inverting this command on `tree` would leave every touched
    /// section as it is, i.e. the command has no net effect.
    pub fn is_identity_on(&self, tree: &SettingsTree) -> bool {
        let mut reverted = tree.clone();
        self.invert(&mut reverted);
        self.sections().into_iter().all(|section| {
            SectionSnapshot::capture(&reverted, section) == SectionSnapshot::capture(tree, section)
        })
    }

    /// Folds a newer command into this one. Inverting the merged command
    /// restores the state before the first edit.
    ///
    /// When both commands replace the same whole sections, the newer forward
    /// patches simply supersede the older ones.
    pub fn absorb(&mut self, newer: Self) {
        self.description = newer.description;
        let supersedes = self.forward.len() == newer.forward.len()
            && self
                .forward
                .iter()
                .zip(&newer.forward)
                .all(|(old, new)| match (old, new) {
                    (Patch::Section(old), Patch::Section(new)) => old.section() == new.section(),
                    _ => false,
                });
        if supersedes {
            self.forward = newer.forward;
        } else {
            self.forward.extend(newer.forward);
            self.backward.extend(newer.backward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_toggle_roundtrip_restores_absence() {
        let original = SettingsTree::default();
        let mut tree = original.clone();
        let command = Command::from_patches(
            "Disabled light Ceiling",
            vec![Patch::EntityEnabled {
                entity_type: EntityType::Lights,
                entity_id: "light.ceiling".to_string(),
                value: Some(false),
            }],
            &tree,
        );

        command.apply(&mut tree);
        assert!(!tree.is_entity_enabled(EntityType::Lights, "light.ceiling"));

        command.invert(&mut tree);
        assert_eq!(tree, original);
    }

    #[test]
    fn test_section_patch_shares_untouched_sections() {
        let mut tree = SettingsTree::default();
        let before_rooms = Arc::clone(&tree.enabled_rooms);
        let command = Command::from_patches(
            "Reordered floors",
            vec![Patch::Section(SectionSnapshot::FloorOrder(Arc::new(vec![
                "floor.first".to_string(),
            ])))],
            &tree,
        );
        command.apply(&mut tree);
        assert!(Arc::ptr_eq(&before_rooms, &tree.enabled_rooms));
        assert_eq!(command.sections(), vec![Section::FloorOrder]);
    }

    #[test]
    fn test_absorb_keeps_oldest_backward() {
        let original = SettingsTree::default();
        let mut tree = original.clone();
        let set = |value: &str, tree: &SettingsTree| {
            let mut misc = (*tree.misc).clone();
            misc.last_seen_version = Some(value.to_string());
            Command::from_patches(
                "Changed version",
                vec![Patch::Section(SectionSnapshot::Misc(Arc::new(misc)))],
                tree,
            )
        };

        let mut first = set("1.0", &tree);
        first.apply(&mut tree);
        let second = set("1.1", &tree);
        second.apply(&mut tree);
        first.absorb(second);

        assert_eq!(tree.misc.last_seen_version.as_deref(), Some("1.1"));
        first.invert(&mut tree);
        assert_eq!(tree, original);
        first.apply(&mut tree);
        assert_eq!(tree.misc.last_seen_version.as_deref(), Some("1.1"));
    }
}

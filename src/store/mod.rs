//! The configuration store: the only writer of the settings tree.
//!
//! Every mutation validates its input against the registry, builds a
//! [`Command`], pushes it through the [`CommandHistory`], notifies
//! subscribers and schedules a debounced save. A rejected mutation leaves
//! the tree and the history untouched.
//!
//! The store is driven by a single caller (the admin UI). Mutations are
//! synchronous; only [`ConfigurationStore::load`] and
//! [`ConfigurationStore::save_now`] await I/O.

pub mod command;
pub mod draft;
pub mod events;
pub mod history;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::constants::{history as history_defaults, layout, persistence as persistence_defaults};
use crate::error::{IdKind, StoreError, StoreResult};
use crate::models::{
    room_order_key, ApplianceConfig, AreaEntry, AreaId, EntityEntry, EntityId, EntityType,
    FloorCardSlot, FloorEntry, FloorId, HomeRegistry, InfoTextItem, InfoTextKey, LabelEntry,
    LabelId, MediaPreset, MiscSettings, SceneButton, SettingsTree, TrainDeparture, WeatherRole,
};
use crate::services::persistence::{PersistenceGateway, PersistenceStatus, SaveScheduler};
use crate::services::reorder::{compute_reorder, effective_order, move_one_step, Direction};
use crate::services::resolver::{EntityEnablementResolver, EntityView};

pub use command::{CoalesceKey, Command, Patch, Section, SectionSnapshot};
pub use draft::Draft;
pub use events::{EventBus, StoreEvent};
pub use history::CommandHistory;

/// Tunables of a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Maximum number of undoable commands
    pub history_depth: usize,
    /// Quiet period before a save is written
    pub save_debounce: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_depth: history_defaults::DEFAULT_MAX_DEPTH,
            save_debounce: Duration::from_millis(persistence_defaults::DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Façade over the settings tree, its history and its persistence.
pub struct ConfigurationStore {
    gateway: Arc<dyn PersistenceGateway>,
    options: StoreOptions,
    registry: HomeRegistry,
    tree: SettingsTree,
    history: CommandHistory,
    draft: Option<Draft>,
    events: EventBus,
    saver: Option<SaveScheduler>,
    ready: bool,
}

impl std::fmt::Debug for ConfigurationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationStore")
            .field("options", &self.options)
            .field("ready", &self.ready)
            .field("undo_len", &self.history.undo_len())
            .field("redo_len", &self.history.redo_len())
            .field("draft", &self.draft.as_ref().map(Draft::form_id))
            .finish_non_exhaustive()
    }
}

impl ConfigurationStore {
    /// Creates a store that is not ready until [`Self::load`] succeeds.
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        registry: HomeRegistry,
        options: StoreOptions,
    ) -> Self {
        Self {
            gateway,
            options,
            registry,
            tree: SettingsTree::default(),
            history: CommandHistory::new(options.history_depth),
            draft: None,
            events: EventBus::default(),
            saver: None,
            ready: false,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Loads the persisted settings and starts accepting mutations.
    ///
    /// A missing document yields defaults. On failure the store stays not
    /// ready and the error is returned. Loading twice is a no-op.
    pub async fn load(&mut self) -> StoreResult<()> {
        if self.ready {
            return Ok(());
        }

        let document = match self.gateway.load().await {
            Ok(document) => document,
            Err(err) => {
                error!(error = %format!("{err:#}"), "Failed to load settings");
                return Err(err.into());
            }
        };

        self.tree = match document {
            Some(value) => SettingsTree::from_json(value).map_err(|err| {
                error!(error = %err, "Stored settings are not a valid document");
                StoreError::Persistence(format!("invalid settings document: {err}"))
            })?,
            None => {
                info!("No stored settings; starting from defaults");
                SettingsTree::default()
            }
        };

        self.saver = Some(SaveScheduler::spawn(
            Arc::clone(&self.gateway),
            self.options.save_debounce,
        ));
        self.ready = true;
        info!("Settings loaded");
        self.events.emit(StoreEvent::Loaded);
        Ok(())
    }

    /// Whether the initial load has completed.
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Writes the current settings immediately, cancelling any pending save.
    pub async fn save_now(&self) -> StoreResult<()> {
        self.ensure_ready()?;
        let snapshot = self
            .tree
            .to_json()
            .map_err(|err| StoreError::Persistence(err.to_string()))?;
        match &self.saver {
            Some(saver) => saver.flush(snapshot).await,
            None => Err(StoreError::NotReady),
        }
    }

    /// Outcome of recent saves.
    pub fn persistence_status(&self) -> PersistenceStatus {
        self.saver
            .as_ref()
            .map(SaveScheduler::status)
            .unwrap_or_default()
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Replaces the registry snapshot (after the hub reported changes).
    pub fn set_registry(&mut self, registry: HomeRegistry) {
        self.registry = registry;
    }

    /// Current registry snapshot.
    pub const fn registry(&self) -> &HomeRegistry {
        &self.registry
    }

    /// Current settings.
    pub const fn settings(&self) -> &SettingsTree {
        &self.tree
    }

    /// Resolver over the current settings and registry.
    pub const fn resolver(&self) -> EntityEnablementResolver<'_> {
        EntityEnablementResolver::new(&self.tree, &self.registry)
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Reverts the last command. Returns its description, `None` if there
    /// was nothing to undo.
    pub fn undo(&mut self) -> Option<String> {
        let description = self.history.undo(&mut self.tree)?;
        self.schedule_save();
        self.events.emit(StoreEvent::Undone {
            description: description.clone(),
        });
        Some(description)
    }

    /// Re-applies the last undone command. Returns its description, `None`
    /// if there was nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        let description = self.history.redo(&mut self.tree)?;
        self.schedule_save();
        self.events.emit(StoreEvent::Redone {
            description: description.clone(),
        });
        Some(description)
    }

    /// Whether there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Description of the command `undo` would revert, or `""`.
    pub fn undo_description(&self) -> &str {
        self.history.undo_description()
    }

    /// Description of the command `redo` would re-apply, or `""`.
    pub fn redo_description(&self) -> &str {
        self.history.redo_description()
    }

    /// Drops the undo and redo stacks.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Ends the current text/slider edit so the next edit gets its own
    /// undo step (field blur or form commit).
    pub fn commit_edit(&mut self) {
        self.history.close_coalescing();
    }

    /// Read access to the history.
    pub const fn history(&self) -> &CommandHistory {
        &self.history
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Whether an entity is enabled for a classification.
    pub fn is_enabled(&self, entity_type: EntityType, entity_id: &str) -> bool {
        self.tree.is_entity_enabled(entity_type, entity_id)
    }

    /// Whether a room is enabled.
    pub fn is_room_enabled(&self, area_id: &str) -> bool {
        self.tree.is_room_enabled(area_id)
    }

    /// Entities of a room for one classification.
    pub fn entities_for_area_and_type(
        &self,
        area_id: &str,
        entity_type: EntityType,
    ) -> Vec<EntityView> {
        self.resolver()
            .entities_for_area_and_type(area_id, entity_type)
    }

    /// Floors in display order.
    pub fn ordered_floors(&self) -> Vec<FloorId> {
        effective_order(&self.tree.floor_order, &self.registry.floor_ids())
    }

    /// Rooms of a floor in display order; `None` for rooms without a floor.
    pub fn ordered_rooms_for_floor(&self, floor_id: Option<&str>) -> Vec<AreaId> {
        effective_order(
            self.tree.room_order(floor_id),
            &self.registry.area_ids_on_floor(floor_id),
        )
    }

    /// Suggested category labels detected from label names.
    pub fn suggest_category_labels(&self) -> BTreeMap<EntityType, LabelId> {
        self.resolver().suggest_category_labels()
    }

    /// Scene buttons of a room (`None` for the global row).
    pub fn scene_buttons_for_room(&self, room_id: Option<&str>) -> Vec<&SceneButton> {
        self.tree.scene_buttons_for_room(room_id)
    }

    // ========================================================================
    // Entity and room enablement
    // ========================================================================

    /// Flips an entity's enablement for a classification.
    pub fn toggle_entity_enabled(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> StoreResult<bool> {
        let enabled = !self.tree.is_entity_enabled(entity_type, entity_id);
        self.set_entity_enabled(entity_type, entity_id, enabled)
    }

    /// Sets an entity's enablement for a classification.
    pub fn set_entity_enabled(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
        enabled: bool,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.require_entity(entity_id)?.display_name().to_string();
        if self.tree.is_entity_enabled(entity_type, entity_id) == enabled {
            return Ok(false);
        }
        let description = format!(
            "{} {} {}",
            enabled_verb(enabled),
            entity_type.descriptor().noun,
            name
        );
        let command = Command::from_patches(
            description,
            vec![Patch::EntityEnabled {
                entity_type,
                entity_id: entity_id.to_string(),
                value: Some(enabled),
            }],
            &self.tree,
        );
        self.commit(command);
        Ok(true)
    }

    /// Sets the enablement of every listed entity (select all / none).
    /// Entities not listed are left untouched.
    pub fn bulk_set_enabled(
        &mut self,
        area_id: &str,
        entity_type: EntityType,
        entity_ids: &[EntityId],
        enabled: bool,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let area_name = self.require_area(area_id)?.name.clone();
        for entity_id in entity_ids {
            self.require_entity(entity_id)?;
        }

        let mut patches: Vec<Patch> = Vec::new();
        for entity_id in entity_ids {
            let already = self.tree.is_entity_enabled(entity_type, entity_id) == enabled;
            let queued = patches.iter().any(|patch| {
                matches!(patch, Patch::EntityEnabled { entity_id: id, .. } if id == entity_id)
            });
            if !already && !queued {
                patches.push(Patch::EntityEnabled {
                    entity_type,
                    entity_id: entity_id.clone(),
                    value: Some(enabled),
                });
            }
        }
        if patches.is_empty() {
            return Ok(false);
        }

        let description = format!(
            "{} {} {}s in {}",
            enabled_verb(enabled),
            patches.len(),
            entity_type.descriptor().noun,
            area_name
        );
        let command = Command::from_patches(description, patches, &self.tree);
        self.commit(command);
        Ok(true)
    }

    /// Flips a room's enablement.
    pub fn toggle_room_enabled(&mut self, area_id: &str) -> StoreResult<bool> {
        let enabled = !self.tree.is_room_enabled(area_id);
        self.set_room_enabled(area_id, enabled)
    }

    /// Sets a room's enablement.
    pub fn set_room_enabled(&mut self, area_id: &str, enabled: bool) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.require_area(area_id)?.name.clone();
        if self.tree.is_room_enabled(area_id) == enabled {
            return Ok(false);
        }
        let command = Command::from_patches(
            format!("{} room {}", enabled_verb(enabled), name),
            vec![Patch::RoomEnabled {
                area_id: area_id.to_string(),
                value: Some(enabled),
            }],
            &self.tree,
        );
        self.commit(command);
        Ok(true)
    }

    // ========================================================================
    // Labels and custom entities
    // ========================================================================

    /// Maps a registry label to a classification, or clears the mapping.
    pub fn set_category_label(
        &mut self,
        entity_type: EntityType,
        label_id: Option<&str>,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let description = match label_id {
            Some(label_id) => format!(
                "Set {} label to {}",
                entity_type.descriptor().title,
                self.require_label(label_id)?.name
            ),
            None => format!("Cleared {} label", entity_type.descriptor().title),
        };
        self.edit_section(Section::CategoryLabels, description, None, |tree| {
            Arc::make_mut(&mut tree.category_label_id)
                .insert(entity_type, label_id.map(str::to_string));
            Ok(())
        })
    }

    /// Flips whether a custom label gets its own section.
    pub fn toggle_custom_label(&mut self, label_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.require_label(label_id)?.name.clone();
        let enabled = !self.tree.is_custom_label_enabled(label_id);
        self.edit_section(
            Section::CustomLabels,
            format!("{} label {}", enabled_verb(enabled), name),
            None,
            |tree| {
                Arc::make_mut(&mut tree.custom_labels)
                    .entry(label_id.to_string())
                    .or_default()
                    .enabled = enabled;
                Ok(())
            },
        )
    }

    /// Flips whether an entity under a custom label is shown.
    pub fn toggle_custom_entity(&mut self, entity_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.require_entity(entity_id)?.display_name().to_string();
        let enabled = !self.tree.custom_entity(entity_id).enabled;
        self.edit_section(
            Section::CustomEntities,
            format!("{} {}", enabled_verb(enabled), name),
            None,
            |tree| {
                Arc::make_mut(&mut tree.enabled_custom_entities)
                    .entry(entity_id.to_string())
                    .or_default()
                    .enabled = enabled;
                Ok(())
            },
        )
    }

    /// Links `child_id` to `parent_id`. Linking twice is a no-op.
    pub fn add_child_entity(&mut self, parent_id: &str, child_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let parent = self.require_entity(parent_id)?.display_name().to_string();
        let child = self.require_entity(child_id)?.display_name().to_string();
        if parent_id == child_id {
            return Err(StoreError::invalid(
                "childEntities",
                format!("{child_id} cannot be its own child"),
            ));
        }
        if self
            .tree
            .custom_entity(parent_id)
            .child_entities
            .iter()
            .any(|id| id == child_id)
        {
            return Ok(false);
        }
        self.edit_section(
            Section::CustomEntities,
            format!("Linked {child} to {parent}"),
            None,
            |tree| {
                Arc::make_mut(&mut tree.enabled_custom_entities)
                    .entry(parent_id.to_string())
                    .or_default()
                    .child_entities
                    .push(child_id.to_string());
                Ok(())
            },
        )
    }

    /// Unlinks `child_id` from `parent_id`. Unlinking a non-child is a no-op.
    pub fn remove_child_entity(&mut self, parent_id: &str, child_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let parent = self.require_entity(parent_id)?.display_name().to_string();
        let child = self
            .registry
            .entities
            .get(child_id)
            .map_or_else(|| child_id.to_string(), |entry| entry.display_name().to_string());
        self.edit_section(
            Section::CustomEntities,
            format!("Unlinked {child} from {parent}"),
            None,
            |tree| {
                if let Some(config) =
                    Arc::make_mut(&mut tree.enabled_custom_entities).get_mut(parent_id)
                {
                    config.child_entities.retain(|id| id != child_id);
                }
                Ok(())
            },
        )
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Accepts a new floor order (drag and drop).
    pub fn reorder_floors(&mut self, new_order: &[FloorId]) -> StoreResult<bool> {
        self.ensure_ready()?;
        let current = self.ordered_floors();
        let result = compute_reorder(&current, new_order).inspect_err(|err| {
            warn!(error = %err, "Rejected floor reorder");
        })?;
        let Some(moved) = result.moved else {
            return Ok(false);
        };
        let description = format!(
            "Moved floor {} to position {}",
            self.registry.floor_name(&moved.id),
            moved.new_index + 1
        );
        self.commit_floor_order(result.new_order, description);
        Ok(true)
    }

    /// Moves a floor one step up (`-1`) or down (`+1`).
    pub fn move_floor(&mut self, floor_id: &str, step: i32) -> StoreResult<bool> {
        self.ensure_ready()?;
        let direction = Direction::from_step(step)?;
        let name = self.require_floor(floor_id)?.name.clone();
        let current = self.ordered_floors();
        let new_order = move_one_step(&current, &floor_id.to_string(), direction);
        if new_order == current {
            return Ok(false);
        }
        self.commit_floor_order(new_order, format!("Moved floor {name} {}", direction_word(direction)));
        Ok(true)
    }

    /// Accepts a new room order for a floor (`None` for rooms without floor).
    pub fn reorder_rooms(
        &mut self,
        floor_id: Option<&str>,
        new_order: &[AreaId],
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        if let Some(floor_id) = floor_id {
            self.require_floor(floor_id)?;
        }
        let current = self.ordered_rooms_for_floor(floor_id);
        let result = compute_reorder(&current, new_order).inspect_err(|err| {
            warn!(error = %err, "Rejected room reorder");
        })?;
        let Some(moved) = result.moved else {
            return Ok(false);
        };
        let description = format!(
            "Moved room {} to position {}",
            self.registry.area_name(&moved.id),
            moved.new_index + 1
        );
        self.commit_room_order(floor_id, result.new_order, description);
        Ok(true)
    }

    /// Moves a room one step up (`-1`) or down (`+1`) within its floor.
    pub fn move_room(&mut self, area_id: &str, step: i32) -> StoreResult<bool> {
        self.ensure_ready()?;
        let direction = Direction::from_step(step)?;
        let area = self.require_area(area_id)?;
        let name = area.name.clone();
        let floor_id = area.floor_id.clone();
        let current = self.ordered_rooms_for_floor(floor_id.as_deref());
        let new_order = move_one_step(&current, &area_id.to_string(), direction);
        if new_order == current {
            return Ok(false);
        }
        self.commit_room_order(
            floor_id.as_deref(),
            new_order,
            format!("Moved room {name} {}", direction_word(direction)),
        );
        Ok(true)
    }

    fn commit_floor_order(&mut self, new_order: Vec<FloorId>, description: String) {
        let command = Command::from_patches(
            description,
            vec![Patch::Section(SectionSnapshot::FloorOrder(Arc::new(new_order)))],
            &self.tree,
        );
        self.commit(command);
    }

    fn commit_room_order(&mut self, floor_id: Option<&str>, new_order: Vec<AreaId>, description: String) {
        let command = Command::from_patches(
            description,
            vec![Patch::RoomOrder {
                floor_key: room_order_key(floor_id),
                order: Some(Arc::new(new_order)),
            }],
            &self.tree,
        );
        self.commit(command);
    }

    // ========================================================================
    // Appliances
    // ========================================================================

    /// Flips whether a device is shown as an appliance.
    pub fn toggle_appliance(&mut self, device_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.device_name(device_id)?;
        let enabled = !self.tree.appliance(device_id).enabled;
        self.edit_appliance(
            device_id,
            format!("{} appliance {}", enabled_verb(enabled), name),
            None,
            |config| config.enabled = enabled,
        )
    }

    /// Sets whether an appliance appears in the home status line.
    pub fn set_appliance_home_status(&mut self, device_id: &str, show: bool) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.device_name(device_id)?;
        let verb = if show { "Showed" } else { "Hid" };
        self.edit_appliance(
            device_id,
            format!("{verb} {name} in home status"),
            None,
            |config| config.show_in_home_status = show,
        )
    }

    /// Sets (or clears) the entity reporting an appliance's state.
    pub fn set_appliance_state_entity(
        &mut self,
        device_id: &str,
        entity_id: Option<&str>,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.device_name(device_id)?;
        if let Some(entity_id) = entity_id {
            self.require_entity(entity_id)?;
        }
        self.edit_appliance(
            device_id,
            format!("Changed state entity of {name}"),
            None,
            |config| config.state_entity = entity_id.map(str::to_string),
        )
    }

    /// Sets (or clears) the entity reporting an appliance's timer.
    pub fn set_appliance_timer_entity(
        &mut self,
        device_id: &str,
        entity_id: Option<&str>,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.device_name(device_id)?;
        if let Some(entity_id) = entity_id {
            self.require_entity(entity_id)?;
        }
        self.edit_appliance(
            device_id,
            format!("Changed timer entity of {name}"),
            None,
            |config| config.timer_entity = entity_id.map(str::to_string),
        )
    }

    fn edit_appliance(
        &mut self,
        device_id: &str,
        description: String,
        coalesce: Option<CoalesceKey>,
        edit: impl FnOnce(&mut ApplianceConfig),
    ) -> StoreResult<bool> {
        self.edit_section(Section::Appliances, description, coalesce, |tree| {
            edit(
                Arc::make_mut(&mut tree.enabled_appliances)
                    .entry(device_id.to_string())
                    .or_default(),
            );
            Ok(())
        })
    }

    fn device_name(&self, device_id: &str) -> StoreResult<String> {
        let device = self
            .registry
            .devices
            .get(device_id)
            .ok_or_else(|| StoreError::unknown(IdKind::Device, device_id))?;
        Ok(if device.name.is_empty() {
            device.device_id.clone()
        } else {
            device.name.clone()
        })
    }

    // ========================================================================
    // Scene buttons and floor cards
    // ========================================================================

    /// Appends a scene button and returns its index.
    pub fn add_scene_button(&mut self, button: SceneButton) -> StoreResult<usize> {
        self.ensure_ready()?;
        self.validate_scene_button(&button)?;
        let index = self.tree.scene_buttons.len();
        let description = format!("Added scene button {}", button.label);
        self.edit_section(Section::SceneButtons, description, None, |tree| {
            Arc::make_mut(&mut tree.scene_buttons).push(button);
            Ok(())
        })?;
        Ok(index)
    }

    /// Replaces the scene button at `index`. Consecutive edits of the same
    /// button coalesce until [`Self::commit_edit`].
    pub fn update_scene_button(&mut self, index: usize, button: SceneButton) -> StoreResult<bool> {
        self.ensure_ready()?;
        require_index(self.tree.scene_buttons.len(), index)?;
        self.validate_scene_button(&button)?;
        let description = format!("Edited scene button {}", button.label);
        self.edit_section(
            Section::SceneButtons,
            description,
            Some(CoalesceKey::new("update_scene_button", index.to_string())),
            |tree| {
                if let Some(slot) = Arc::make_mut(&mut tree.scene_buttons).get_mut(index) {
                    *slot = button;
                }
                Ok(())
            },
        )
    }

    /// Removes the scene button at `index`.
    pub fn remove_scene_button(&mut self, index: usize) -> StoreResult<bool> {
        self.ensure_ready()?;
        require_index(self.tree.scene_buttons.len(), index)?;
        let description = format!("Removed scene button {}", self.tree.scene_buttons[index].label);
        self.edit_section(Section::SceneButtons, description, None, |tree| {
            Arc::make_mut(&mut tree.scene_buttons).remove(index);
            Ok(())
        })
    }

    fn validate_scene_button(&self, button: &SceneButton) -> StoreResult<()> {
        if button.label.trim().is_empty() {
            return Err(StoreError::invalid("sceneButtons.label", "label must not be empty"));
        }
        if let Some(room_id) = button.room_id.as_deref() {
            self.require_area(room_id)?;
        }
        Ok(())
    }

    /// Assigns (or clears, with `None`) slot `slot` of a floor card.
    pub fn set_floor_card_slot(
        &mut self,
        floor_id: &str,
        slot: u8,
        content: Option<FloorCardSlot>,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let floor = self.require_floor(floor_id)?.name.clone();
        if slot >= layout::FLOOR_CARD_SLOTS {
            return Err(StoreError::invalid(
                "floorCardConfig.slot",
                format!("slot {slot} is outside 0..{}", layout::FLOOR_CARD_SLOTS),
            ));
        }
        if let Some(content) = &content {
            self.require_entity(&content.entity_id)?;
            if let Some(device_id) = content.appliance.as_deref() {
                self.device_name(device_id)?;
            }
        }
        let description = match &content {
            Some(content) => format!("Assigned {} to {floor} slot {}", content.entity_id, slot + 1),
            None => format!("Cleared {floor} slot {}", slot + 1),
        };
        self.edit_section(Section::FloorCards, description, None, |tree| {
            let cards = Arc::make_mut(&mut tree.floor_card_config);
            match content {
                Some(content) => {
                    cards.entry(floor_id.to_string()).or_default().insert(slot, content);
                }
                None => {
                    if let Some(slots) = cards.get_mut(floor_id) {
                        slots.remove(&slot);
                        if slots.is_empty() {
                            cards.remove(floor_id);
                        }
                    }
                }
            }
            Ok(())
        })
    }

    /// Flips whether a floor shows the overview card.
    pub fn toggle_floor_overview(&mut self, floor_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let name = self.require_floor(floor_id)?.name.clone();
        let enabled = !self.tree.is_floor_overview_enabled(floor_id);
        self.edit_section(
            Section::FloorOverview,
            format!("{} overview for {name}", enabled_verb(enabled)),
            None,
            |tree| {
                Arc::make_mut(&mut tree.floor_overview_enabled).insert(floor_id.to_string(), enabled);
                Ok(())
            },
        )
    }

    // ========================================================================
    // Media presets
    // ========================================================================

    /// Appends a media preset and returns its index.
    pub fn add_media_preset(&mut self, preset: MediaPreset) -> StoreResult<usize> {
        self.ensure_ready()?;
        validate_media_preset(&preset)?;
        let index = self.tree.media_presets.len();
        let description = format!("Added media preset {}", preset.name);
        self.edit_section(Section::MediaPresets, description, None, |tree| {
            Arc::make_mut(&mut tree.media_presets).push(preset);
            Ok(())
        })?;
        Ok(index)
    }

    /// Replaces the preset at `index`; edits coalesce until [`Self::commit_edit`].
    pub fn update_media_preset(&mut self, index: usize, preset: MediaPreset) -> StoreResult<bool> {
        self.ensure_ready()?;
        require_index(self.tree.media_presets.len(), index)?;
        validate_media_preset(&preset)?;
        let description = format!("Edited media preset {}", preset.name);
        self.edit_section(
            Section::MediaPresets,
            description,
            Some(CoalesceKey::new("update_media_preset", index.to_string())),
            |tree| {
                if let Some(slot) = Arc::make_mut(&mut tree.media_presets).get_mut(index) {
                    *slot = preset;
                }
                Ok(())
            },
        )
    }

    /// Removes the preset at `index`.
    pub fn remove_media_preset(&mut self, index: usize) -> StoreResult<bool> {
        self.ensure_ready()?;
        require_index(self.tree.media_presets.len(), index)?;
        let description = format!("Removed media preset {}", self.tree.media_presets[index].name);
        self.edit_section(Section::MediaPresets, description, None, |tree| {
            Arc::make_mut(&mut tree.media_presets).remove(index);
            Ok(())
        })
    }

    /// Moves the preset at `index` one step up (`-1`) or down (`+1`).
    pub fn move_media_preset(&mut self, index: usize, step: i32) -> StoreResult<bool> {
        self.ensure_ready()?;
        let direction = Direction::from_step(step)?;
        let len = self.tree.media_presets.len();
        require_index(len, index)?;
        let current: Vec<usize> = (0..len).collect();
        let new_order = move_one_step(&current, &index, direction);
        if new_order == current {
            return Ok(false);
        }
        let description = format!(
            "Moved media preset {} {}",
            self.tree.media_presets[index].name,
            direction_word(direction)
        );
        self.commit_media_order(&new_order, description)
    }

    /// Accepts a new preset order given as the presets' current indices
    /// rendered as strings (`["2", "0", "1"]`).
    pub fn reorder_media_presets(&mut self, new_order: &[String]) -> StoreResult<bool> {
        self.ensure_ready()?;
        let current: Vec<String> = (0..self.tree.media_presets.len())
            .map(|index| index.to_string())
            .collect();
        let result = compute_reorder(&current, new_order)?;
        let Some(moved) = result.moved else {
            return Ok(false);
        };
        let indices: Vec<usize> = result
            .new_order
            .iter()
            .filter_map(|index| index.parse().ok())
            .collect();
        let name = moved
            .id
            .parse::<usize>()
            .ok()
            .and_then(|index| self.tree.media_presets.get(index))
            .map_or_else(String::new, |preset| preset.name.clone());
        let description = format!("Moved media preset {name} to position {}", moved.new_index + 1);
        self.commit_media_order(&indices, description)
    }

    fn commit_media_order(&mut self, indices: &[usize], description: String) -> StoreResult<bool> {
        let reordered: Vec<MediaPreset> = indices
            .iter()
            .filter_map(|index| self.tree.media_presets.get(*index).cloned())
            .collect();
        if reordered.len() != self.tree.media_presets.len() {
            return Err(StoreError::permutation("preset indices do not cover every preset"));
        }
        self.edit_section(Section::MediaPresets, description, None, |tree| {
            tree.media_presets = Arc::new(reordered);
            Ok(())
        })
    }

    // ========================================================================
    // Misc scalars
    // ========================================================================

    /// Sets the temperature and humidity notification thresholds.
    pub fn set_notification_thresholds(&mut self, temperature: f64, humidity: f64) -> StoreResult<bool> {
        self.ensure_ready()?;
        if !temperature.is_finite() {
            return Err(StoreError::invalid(
                "notificationTempThreshold",
                "must be a finite number",
            ));
        }
        if !(0.0..=100.0).contains(&humidity) {
            return Err(StoreError::invalid(
                "notificationHumidityThreshold",
                format!("{humidity} is outside 0..=100"),
            ));
        }
        self.edit_misc(
            "Changed notification thresholds".to_string(),
            Some(CoalesceKey::new("set_notification_thresholds", "thresholds")),
            |misc| {
                misc.notification_temp_threshold = temperature;
                misc.notification_humidity_threshold = humidity;
            },
        )
    }

    /// Sets (or clears) the weather entity for a role.
    pub fn set_weather_entity(&mut self, role: WeatherRole, entity_id: Option<&str>) -> StoreResult<bool> {
        self.ensure_ready()?;
        let entity_id = entity_id.filter(|id| !id.trim().is_empty());
        self.edit_misc(
            "Changed weather entity".to_string(),
            Some(CoalesceKey::new("set_weather_entity", format!("{role:?}"))),
            |misc| match entity_id {
                Some(entity_id) => {
                    misc.weather.insert(role, entity_id.to_string());
                }
                None => {
                    misc.weather.remove(&role);
                }
            },
        )
    }

    /// Sets (or clears) a custom photo URL for a person.
    pub fn set_user_photo(&mut self, person_id: &str, url: Option<&str>) -> StoreResult<bool> {
        self.ensure_ready()?;
        let url = url.filter(|url| !url.trim().is_empty());
        self.edit_misc(
            format!("Changed photo of {person_id}"),
            Some(CoalesceKey::new("set_user_photo", person_id)),
            |misc| match url {
                Some(url) => {
                    misc.user_photos.insert(person_id.to_string(), url.to_string());
                }
                None => {
                    misc.user_photos.remove(person_id);
                }
            },
        )
    }

    /// Replaces the waste-collection sensors.
    pub fn set_garbage_sensors(&mut self, sensors: &[EntityId]) -> StoreResult<bool> {
        self.ensure_ready()?;
        for sensor in sensors {
            self.require_entity(sensor)?;
        }
        let mut deduped: Vec<EntityId> = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            if !deduped.contains(sensor) {
                deduped.push(sensor.clone());
            }
        }
        self.edit_misc("Changed waste sensors".to_string(), None, |misc| {
            misc.garbage_sensors = deduped;
        })
    }

    /// Sets the floor whose card shows the waste collection.
    pub fn set_garbage_display_floor(&mut self, floor_id: Option<&str>) -> StoreResult<bool> {
        self.ensure_ready()?;
        if let Some(floor_id) = floor_id {
            self.require_floor(floor_id)?;
        }
        self.edit_misc("Changed waste display floor".to_string(), None, |misc| {
            misc.garbage_display_floor = floor_id.map(str::to_string);
        })
    }

    /// Adds a departure sensor and returns the new entry's id.
    pub fn add_train_departure(&mut self, entity_id: &str) -> StoreResult<String> {
        self.ensure_ready()?;
        let label = self.require_entity(entity_id)?.display_name().to_string();
        let id = Uuid::new_v4().to_string();
        let departure = TrainDeparture {
            id: id.clone(),
            entity: entity_id.to_string(),
            label: label.clone(),
            condition_entity: String::new(),
            condition_state: String::new(),
            delay_minutes: 0,
            time_start: String::new(),
            time_end: String::new(),
        };
        self.edit_misc(format!("Added departure {label}"), None, |misc| {
            misc.train_departures.push(departure);
        })?;
        Ok(id)
    }

    /// Edits a departure entry. The entry id cannot be changed; edits of the
    /// same entry coalesce until [`Self::commit_edit`].
    pub fn update_train_departure(
        &mut self,
        departure_id: &str,
        edit: impl FnOnce(&mut TrainDeparture),
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let label = self
            .tree
            .misc
            .train_departures
            .iter()
            .find(|departure| departure.id == departure_id)
            .map(|departure| departure.label.clone())
            .ok_or_else(|| StoreError::unknown(IdKind::TrainDeparture, departure_id))?;
        self.edit_misc(
            format!("Edited departure {label}"),
            Some(CoalesceKey::new("update_train_departure", departure_id)),
            |misc| {
                if let Some(departure) = misc
                    .train_departures
                    .iter_mut()
                    .find(|departure| departure.id == departure_id)
                {
                    edit(departure);
                    departure.id = departure_id.to_string();
                }
            },
        )
    }

    /// Removes a departure entry.
    pub fn remove_train_departure(&mut self, departure_id: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        let label = self
            .tree
            .misc
            .train_departures
            .iter()
            .find(|departure| departure.id == departure_id)
            .map(|departure| departure.label.clone())
            .ok_or_else(|| StoreError::unknown(IdKind::TrainDeparture, departure_id))?;
        self.edit_misc(format!("Removed departure {label}"), None, |misc| {
            misc.train_departures.retain(|departure| departure.id != departure_id);
        })
    }

    /// Replaces one status-line item.
    pub fn set_info_text_item(&mut self, key: InfoTextKey, item: InfoTextItem) -> StoreResult<bool> {
        self.ensure_ready()?;
        self.edit_misc(
            format!("Changed status item {key:?}"),
            Some(CoalesceKey::new("set_info_text_item", format!("{key:?}"))),
            |misc| {
                misc.info_text_config.insert(key, item);
            },
        )
    }

    /// Records the last release whose changelog was shown.
    pub fn set_last_seen_version(&mut self, version: &str) -> StoreResult<bool> {
        self.ensure_ready()?;
        self.edit_misc(format!("Marked version {version} as seen"), None, |misc| {
            misc.last_seen_version = Some(version.to_string());
        })
    }

    fn edit_misc(
        &mut self,
        description: String,
        coalesce: Option<CoalesceKey>,
        edit: impl FnOnce(&mut MiscSettings),
    ) -> StoreResult<bool> {
        self.edit_section(Section::Misc, description, coalesce, |tree| {
            edit(Arc::make_mut(&mut tree.misc));
            Ok(())
        })
    }

    // ========================================================================
    // Reset and drafts
    // ========================================================================

    /// Replaces every section with its default as one undoable command.
    pub fn reset(&mut self) -> StoreResult<bool> {
        self.ensure_ready()?;
        let defaults = SettingsTree::default();
        let patches: Vec<Patch> = Section::ALL
            .into_iter()
            .filter(|section| {
                SectionSnapshot::capture(&defaults, *section)
                    != SectionSnapshot::capture(&self.tree, *section)
            })
            .map(|section| Patch::Section(SectionSnapshot::capture(&defaults, section)))
            .collect();
        if patches.is_empty() {
            return Ok(false);
        }
        let command = Command::from_patches("Reset all settings", patches, &self.tree);
        self.commit(command);
        self.events.emit(StoreEvent::Reset);
        Ok(true)
    }

    /// Opens a draft of `sections` for a form, replacing any open draft.
    pub fn start_draft(&mut self, form_id: &str, sections: &[Section]) -> StoreResult<()> {
        self.ensure_ready()?;
        if let Some(previous) = self.draft.take() {
            warn!(form_id = %previous.form_id(), "Replacing open draft");
        }
        self.draft = Some(Draft::start(form_id, sections, &self.tree));
        Ok(())
    }

    /// Working copy of the open draft.
    pub fn draft_tree(&self) -> Option<&SettingsTree> {
        self.draft.as_ref().map(Draft::tree)
    }

    /// Edits the open draft.
    pub fn update_draft(&mut self, edit: impl FnOnce(&mut SettingsTree)) -> StoreResult<()> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| StoreError::invalid("draft", "no draft is active"))?;
        draft.update(edit);
        self.events.emit(StoreEvent::DraftChanged {
            form_id: draft.form_id().to_string(),
            has_changes: draft.has_changes(),
        });
        Ok(())
    }

    /// Whether the open draft differs from the settings it started from.
    pub fn has_draft_changes(&self) -> bool {
        self.draft.as_ref().is_some_and(Draft::has_changes)
    }

    /// Whether a draft is open.
    pub const fn is_draft_active(&self) -> bool {
        self.draft.is_some()
    }

    /// Applies the open draft as a single command `Draft: <form_id>`.
    /// Returns `false` when no draft is open or it has no changes.
    pub fn commit_draft(&mut self) -> StoreResult<bool> {
        self.ensure_ready()?;
        let Some(draft) = self.draft.take() else {
            return Ok(false);
        };
        let description = format!("Draft: {}", draft.form_id());
        let patches = draft.into_patches();
        if patches.is_empty() {
            return Ok(false);
        }
        let command = Command::from_patches(description, patches, &self.tree);
        self.commit(command);
        Ok(true)
    }

    /// Drops the open draft without applying it.
    pub fn discard_draft(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.events.emit(StoreEvent::DraftDiscarded {
                form_id: draft.form_id().to_string(),
            });
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_ready(&self) -> StoreResult<()> {
        if self.ready {
            Ok(())
        } else {
            warn!("Mutation rejected: settings not loaded");
            Err(StoreError::NotReady)
        }
    }

    /// Runs `edit` on a cheap copy of the tree and commits the changed
    /// section as one command. Returns `false` when nothing changed.
    fn edit_section(
        &mut self,
        section: Section,
        description: String,
        coalesce: Option<CoalesceKey>,
        edit: impl FnOnce(&mut SettingsTree) -> StoreResult<()>,
    ) -> StoreResult<bool> {
        self.ensure_ready()?;
        let mut scratch = self.tree.clone();
        edit(&mut scratch)?;
        let after = SectionSnapshot::capture(&scratch, section);
        if after == SectionSnapshot::capture(&self.tree, section) {
            return Ok(false);
        }
        let mut command = Command::from_patches(description, vec![Patch::Section(after)], &self.tree);
        if let Some(key) = coalesce {
            command = command.coalescing(key);
        }
        self.commit(command);
        Ok(true)
    }

    fn commit(&mut self, command: Command) {
        let sections = command.sections();
        let description = command.description().to_string();
        self.history.push(command, &mut self.tree);
        self.schedule_save();
        self.events.emit(StoreEvent::Changed {
            sections,
            description,
        });
    }

    fn schedule_save(&self) {
        let Some(saver) = &self.saver else {
            return;
        };
        match self.tree.to_json() {
            Ok(snapshot) => saver.schedule(snapshot),
            Err(err) => warn!(error = %err, "Failed to serialize settings for saving"),
        }
    }

    fn require_entity(&self, entity_id: &str) -> StoreResult<&EntityEntry> {
        self.registry.entities.get(entity_id).ok_or_else(|| {
            warn!(entity_id, "Mutation references unknown entity");
            StoreError::unknown(IdKind::Entity, entity_id)
        })
    }

    fn require_area(&self, area_id: &str) -> StoreResult<&AreaEntry> {
        self.registry
            .area(area_id)
            .ok_or_else(|| StoreError::unknown(IdKind::Area, area_id))
    }

    fn require_floor(&self, floor_id: &str) -> StoreResult<&FloorEntry> {
        self.registry
            .floor(floor_id)
            .ok_or_else(|| StoreError::unknown(IdKind::Floor, floor_id))
    }

    fn require_label(&self, label_id: &str) -> StoreResult<&LabelEntry> {
        self.registry
            .label(label_id)
            .ok_or_else(|| StoreError::unknown(IdKind::Label, label_id))
    }
}

fn require_index(len: usize, index: usize) -> StoreResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(StoreError::unknown(IdKind::Index, index.to_string()))
    }
}

fn validate_media_preset(preset: &MediaPreset) -> StoreResult<()> {
    if preset.name.trim().is_empty() {
        return Err(StoreError::invalid("mediaPresets.name", "name must not be empty"));
    }
    if preset.media_content_id.trim().is_empty() {
        return Err(StoreError::invalid(
            "mediaPresets.media_content_id",
            "content id must not be empty",
        ));
    }
    Ok(())
}

const fn enabled_verb(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

const fn direction_word(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Down => "down",
    }
}

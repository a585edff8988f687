//! Built-in entity classifications and their descriptor table.

use serde::{Deserialize, Serialize};

/// Built-in classification of an entity.
///
/// Variants are declared in classification priority order: when an entity
/// carries the labels of several types it is classified under the first one
/// in this order (see [`EntityType::ALL`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    /// Lights
    Lights,
    /// Covers / blinds
    Covers,
    /// Roof windows
    RoofWindows,
    /// Window contacts
    Windows,
    /// Garage doors
    Garages,
    /// Motion sensors
    Motion,
    /// Smoke detectors
    Smoke,
    /// Vibration sensors
    Vibration,
    /// Temperature sensors
    Temperature,
    /// Humidity sensors
    Humidity,
    /// Thermostats
    Climate,
    /// Media players
    MediaPlayers,
    /// Televisions
    Tvs,
    /// Locks
    Locks,
}

/// How an entity's live state maps to "active".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveRule {
    /// Active when the state string equals the given value
    StateIs(&'static str),
    /// Active while the thermostat reports it is heating
    Heating,
    /// Measurement types are never "active"
    Never,
}

/// Static description of an entity type used by resolver output and
/// command descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTypeDescriptor {
    /// Serialized key (e.g. "mediaPlayers")
    pub key: &'static str,
    /// Singular key of older settings documents (e.g. "mediaPlayer")
    pub legacy_key: &'static str,
    /// Section title shown in the admin panel
    pub title: &'static str,
    /// Singular noun used in undo descriptions ("light")
    pub noun: &'static str,
    /// Section icon
    pub icon: &'static str,
    /// Icon used for an active entity
    pub active_icon: &'static str,
    /// Icon used for an inactive entity
    pub inactive_icon: &'static str,
    /// Active-state rule
    pub active: ActiveRule,
    /// Lowercase label names/ids that suggest this type
    pub label_patterns: &'static [&'static str],
}

const LIGHTS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "lights",
    legacy_key: "light",
    title: "Lights",
    noun: "light",
    icon: "mdi:lightbulb-group",
    active_icon: "mdi:lightbulb",
    inactive_icon: "mdi:lightbulb-outline",
    active: ActiveRule::StateIs("on"),
    label_patterns: &["light", "lights", "licht"],
};

const COVERS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "covers",
    legacy_key: "cover",
    title: "Covers",
    noun: "cover",
    icon: "mdi:window-shutter",
    active_icon: "mdi:window-shutter-open",
    inactive_icon: "mdi:window-shutter",
    active: ActiveRule::StateIs("open"),
    label_patterns: &["cover", "rollo", "blind"],
};

const ROOF_WINDOWS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "roofWindows",
    legacy_key: "roofWindow",
    title: "Roof Windows",
    noun: "roof window",
    icon: "mdi:window-open-variant",
    active_icon: "mdi:window-open-variant",
    inactive_icon: "mdi:window-closed-variant",
    active: ActiveRule::StateIs("open"),
    label_patterns: &["roof window", "dachfenster"],
};

const WINDOWS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "windows",
    legacy_key: "window",
    title: "Windows",
    noun: "window",
    icon: "mdi:window-closed",
    active_icon: "mdi:window-open",
    inactive_icon: "mdi:window-closed",
    active: ActiveRule::StateIs("open"),
    label_patterns: &["window", "fenster"],
};

const GARAGES: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "garages",
    legacy_key: "garage",
    title: "Garages",
    noun: "garage",
    icon: "mdi:garage",
    active_icon: "mdi:garage-open",
    inactive_icon: "mdi:garage",
    active: ActiveRule::StateIs("open"),
    label_patterns: &["garage", "garagentor"],
};

const MOTION: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "motion",
    legacy_key: "motion",
    title: "Motion Sensors",
    noun: "motion sensor",
    icon: "mdi:motion-sensor",
    active_icon: "mdi:motion-sensor",
    inactive_icon: "mdi:motion-sensor-off",
    active: ActiveRule::StateIs("on"),
    label_patterns: &["motion", "bewegung"],
};

const SMOKE: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "smoke",
    legacy_key: "smoke",
    title: "Smoke Detectors",
    noun: "smoke detector",
    icon: "mdi:smoke-detector",
    active_icon: "mdi:smoke-detector-alert",
    inactive_icon: "mdi:smoke-detector",
    active: ActiveRule::StateIs("on"),
    label_patterns: &["smoke", "rauchmelder", "smoke detector"],
};

const VIBRATION: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "vibration",
    legacy_key: "vibration",
    title: "Vibration Sensors",
    noun: "vibration sensor",
    icon: "mdi:vibrate",
    active_icon: "mdi:vibrate",
    inactive_icon: "mdi:vibrate-off",
    active: ActiveRule::StateIs("on"),
    label_patterns: &["vibration", "erschütterung"],
};

const TEMPERATURE: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "temperature",
    legacy_key: "temperature",
    title: "Temperature Sensors",
    noun: "temperature sensor",
    icon: "mdi:thermometer",
    active_icon: "mdi:thermometer",
    inactive_icon: "mdi:thermometer",
    active: ActiveRule::Never,
    label_patterns: &["temperature", "temperatur"],
};

const HUMIDITY: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "humidity",
    legacy_key: "humidity",
    title: "Humidity Sensors",
    noun: "humidity sensor",
    icon: "mdi:water-percent",
    active_icon: "mdi:water-percent",
    inactive_icon: "mdi:water-percent",
    active: ActiveRule::Never,
    label_patterns: &["humidity", "luftfeuchtigkeit", "luftfeuchtigkeitssensor"],
};

const CLIMATE: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "climate",
    legacy_key: "climate",
    title: "Thermostats",
    noun: "thermostat",
    icon: "mdi:thermostat",
    active_icon: "mdi:fire",
    inactive_icon: "mdi:thermostat",
    active: ActiveRule::Heating,
    label_patterns: &["climate", "thermostat"],
};

const MEDIA_PLAYERS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "mediaPlayers",
    legacy_key: "mediaPlayer",
    title: "Media Players",
    noun: "media player",
    icon: "mdi:speaker",
    active_icon: "mdi:speaker-play",
    inactive_icon: "mdi:speaker-off",
    active: ActiveRule::StateIs("playing"),
    label_patterns: &["media player", "media_player", "mediaplayer"],
};

const TVS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "tvs",
    legacy_key: "tv",
    title: "TVs",
    noun: "TV",
    icon: "mdi:television",
    active_icon: "mdi:television",
    inactive_icon: "mdi:television-off",
    active: ActiveRule::StateIs("on"),
    label_patterns: &["tv", "fernseher", "television"],
};

const LOCKS: EntityTypeDescriptor = EntityTypeDescriptor {
    key: "locks",
    legacy_key: "lock",
    title: "Locks",
    noun: "lock",
    icon: "mdi:lock",
    active_icon: "mdi:lock-open-variant",
    inactive_icon: "mdi:lock",
    active: ActiveRule::StateIs("unlocked"),
    label_patterns: &["lock", "locks", "schloss"],
};

impl EntityType {
    /// All types in classification priority order.
    pub const ALL: [Self; 14] = [
        Self::Lights,
        Self::Covers,
        Self::RoofWindows,
        Self::Windows,
        Self::Garages,
        Self::Motion,
        Self::Smoke,
        Self::Vibration,
        Self::Temperature,
        Self::Humidity,
        Self::Climate,
        Self::MediaPlayers,
        Self::Tvs,
        Self::Locks,
    ];

    /// Returns the static descriptor for this type.
    #[must_use]
    pub const fn descriptor(self) -> &'static EntityTypeDescriptor {
        match self {
            Self::Lights => &LIGHTS,
            Self::Covers => &COVERS,
            Self::RoofWindows => &ROOF_WINDOWS,
            Self::Windows => &WINDOWS,
            Self::Garages => &GARAGES,
            Self::Motion => &MOTION,
            Self::Smoke => &SMOKE,
            Self::Vibration => &VIBRATION,
            Self::Temperature => &TEMPERATURE,
            Self::Humidity => &HUMIDITY,
            Self::Climate => &CLIMATE,
            Self::MediaPlayers => &MEDIA_PLAYERS,
            Self::Tvs => &TVS,
            Self::Locks => &LOCKS,
        }
    }

    /// Serialized key of this type.
    #[must_use]
    pub const fn key(self) -> &'static str {
        self.descriptor().key
    }

    /// Parses a serialized key ("mediaPlayers") back into a type.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.key() == key)
    }

    /// Parses a singular key from an older document ("mediaPlayer").
    pub fn from_legacy_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.descriptor().legacy_key == key)
    }

    /// Whether an entity in `state` (with optional thermostat action) counts
    /// as active for this type.
    pub fn is_active(self, state: &str, hvac_action: Option<&str>) -> bool {
        match self.descriptor().active {
            ActiveRule::StateIs(expected) => state == expected,
            ActiveRule::Heating => hvac_action == Some("heating"),
            ActiveRule::Never => false,
        }
    }

    /// Icon for an entity of this type in the given state.
    pub fn icon_for(self, state: &str, hvac_action: Option<&str>) -> &'static str {
        let descriptor = self.descriptor();
        if self == Self::Climate && state == "off" {
            return "mdi:thermostat-off";
        }
        if self.is_active(state, hvac_action) {
            descriptor.active_icon
        } else {
            descriptor.inactive_icon
        }
    }

    /// Suggests a type for a registry label whose id or name contains one
    /// of the known patterns ("Licht EG", "Smart Lights"). The first type in
    /// priority order wins, so "Dachfenster" is a roof window.
    pub fn detect_label(label_id: &str, label_name: &str) -> Option<Self> {
        let id = label_id.to_lowercase();
        let name = label_name.to_lowercase();
        Self::ALL.into_iter().find(|ty| {
            ty.descriptor()
                .label_patterns
                .iter()
                .any(|pattern| id.contains(pattern) || name.contains(pattern))
        })
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

//! Application-wide constants.
//!
//! This module contains all magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Directory name under the platform config dir
pub const APP_CONFIG_DIR: &str = "Dashview";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "DASHVIEW_CONFIG_DIR";

/// Environment variable holding the tracing filter for the binary
pub const LOG_ENV: &str = "DASHVIEW_LOG";

/// Undo/redo history defaults
pub mod history {
    /// Maximum number of retained undo commands
    pub const DEFAULT_MAX_DEPTH: usize = 20;
}

/// Persistence timing
pub mod persistence {
    /// Quiet period before a debounced save is written (milliseconds)
    pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

    /// Upper bound accepted for the debounce setting (milliseconds)
    pub const MAX_DEBOUNCE_MS: u64 = 10_000;

    /// Capacity of the change notification channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Layout constants
pub mod layout {
    /// Number of slots on a floor card (indices 0..=5)
    pub const FLOOR_CARD_SLOTS: u8 = 6;

    /// Room-order key used for rooms without a floor
    pub const UNASSIGNED_FLOOR_KEY: &str = "_unassigned";
}

/// Default notification thresholds
pub mod thresholds {
    /// Temperature above which a notification is shown (°C)
    pub const DEFAULT_TEMP_NOTIFICATION: f64 = 23.0;

    /// Humidity above which a notification is shown (%)
    pub const DEFAULT_HUMIDITY_NOTIFICATION: f64 = 60.0;

    /// Battery percentage considered low
    pub const BATTERY_LOW: u8 = 20;
}

/// Defaults for newly created items
pub mod defaults {
    /// Weather entity used until the admin picks one
    pub const WEATHER_ENTITY: &str = "weather.forecast_home";

    /// Icon of a freshly added scene button
    pub const SCENE_BUTTON_ICON: &str = "mdi:lightbulb";
}

//! Typed errors surfaced by the configuration store.

use thiserror::Error;

/// Kind of id referenced by a rejected mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Floor id
    Floor,
    /// Area (room) id
    Area,
    /// Entity id
    Entity,
    /// Device id
    Device,
    /// Label id
    Label,
    /// Index into an ordered list (scene buttons, media presets)
    Index,
    /// Train departure id
    TrainDeparture,
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Floor => write!(f, "floor"),
            Self::Area => write!(f, "area"),
            Self::Entity => write!(f, "entity"),
            Self::Device => write!(f, "device"),
            Self::Label => write!(f, "label"),
            Self::Index => write!(f, "index"),
            Self::TrainDeparture => write!(f, "train departure"),
        }
    }
}

/// Errors returned by store mutations.
///
/// Structural errors (`InvalidPermutation`, `UnknownId`, `InvalidValue`) leave
/// the settings tree and the history untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A proposed order is not a permutation of the current ids
    #[error("invalid permutation: {reason}")]
    InvalidPermutation {
        /// What made the order invalid
        reason: String,
    },

    /// The mutation references an id that is not in the current registry
    #[error("unknown {kind} id: {id}")]
    UnknownId {
        /// Which registry was consulted
        kind: IdKind,
        /// The offending id
        id: String,
    },

    /// A value is outside its accepted range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field being set
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A mutation was attempted before the initial load completed
    #[error("settings have not been loaded yet")]
    NotReady,

    /// Loading or saving through the persistence gateway failed
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Shorthand for an [`StoreError::UnknownId`].
    pub fn unknown(kind: IdKind, id: impl Into<String>) -> Self {
        Self::UnknownId {
            kind,
            id: id.into(),
        }
    }

    /// Shorthand for an [`StoreError::InvalidPermutation`].
    pub fn permutation(reason: impl Into<String>) -> Self {
        Self::InvalidPermutation {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`StoreError::InvalidValue`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true for errors that leave state untouched and should be
    /// shown to the admin (as opposed to background persistence failures).
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Persistence(_))
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}

/// Result alias used across the store.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StoreError::unknown(IdKind::Entity, "light.nowhere");
        assert_eq!(err.to_string(), "unknown entity id: light.nowhere");

        let err = StoreError::permutation("duplicate id floor.ground");
        assert_eq!(
            err.to_string(),
            "invalid permutation: duplicate id floor.ground"
        );

        assert_eq!(
            StoreError::NotReady.to_string(),
            "settings have not been loaded yet"
        );
    }

    #[test]
    fn test_anyhow_conversion_is_persistence() {
        let err: StoreError = anyhow::anyhow!("disk full").into();
        assert_eq!(err, StoreError::Persistence("disk full".to_string()));
        assert!(!err.is_user_facing());
        assert!(StoreError::NotReady.is_user_facing());
    }
}

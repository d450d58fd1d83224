use std::error::Error;

use thiserror::Error;

use crate::Owner;

/// Error returned by the [`SettingsStore`](crate::SettingsStore)'s operations
///
/// A missing setting is **not** an error, it is resolved through the default chain.
/// Failures of the storage or cache are passed through as this error's source.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings key is empty.
    #[error("The settings key must not be empty.")]
    EmptyKey,

    /// The key is too long.
    ///
    /// A key must not be more than 255 bytes long.
    #[error("The settings key '{0}' is too long.")]
    KeyTooLong(String),

    /// Only one half of an owner's type and id has been provided.
    ///
    /// A setting either belongs to an owner (both are set) or is global (both are absent).
    #[error("An owner requires both a type and an id, got only one of them.")]
    MixedScope,

    /// The owner's type or id is an empty string.
    ///
    /// Use `None` as owner for global settings.
    #[error("The owner '{0}' has an empty type or id.")]
    EmptyOwner(Owner),

    /// The value could not be serialized.
    ///
    /// This is necessary to write it to the storage.
    ///
    /// Please check your type's [`Serialize`](serde::Serialize) implementation.
    #[error("{0}")]
    Serialize(serde_json::Error),

    /// The stored value could not be deserialized into the requested type.
    ///
    /// Did the type of the setting change since it was written?
    #[error("{0}")]
    Deserialize(serde_json::Error),

    /// The [`SettingsStorage`](crate::SettingsStorage) failed.
    #[error("The settings storage failed: {0}")]
    Storage(#[source] Box<dyn Error + Send + Sync + 'static>),

    /// The [`SettingsCache`](crate::SettingsCache) failed.
    #[error("The settings cache failed: {0}")]
    Cache(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl SettingsError {
    /// Wraps an error produced by a [`SettingsStorage`](crate::SettingsStorage)
    pub fn storage(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(error))
    }

    /// Wraps an error produced by a [`SettingsCache`](crate::SettingsCache)
    pub fn cache(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Cache(Box::new(error))
    }
}

//! Core of scoped-settings
//!
//! # Settings and their scope
//!
//! A **setting** is a JSON value stored under a string key.
//! It either belongs to the **global** scope or to an [`Owner`],
//! i.e. one specific instance of some entity type (a user, a tenant, ...).
//!
//! Reads are resolved by the [`SettingsStore`] in the following order:
//! cache (if enabled), storage, the caller's default,
//! the owner type's configured default and finally the global configured default.
//!
//! # Starting point
//! Construct a [`SettingsConfig`], pick a [`SettingsStorage`] and a [`SettingsCache`]
//! and hand them to [`SettingsStore::new`].
#![warn(missing_docs)]

pub use crate::cache::MemoryCache;
pub use crate::cache::SettingsCache;
pub use crate::cache_key::cache_key;
pub use crate::coerce::SettingType;
pub use crate::coerce::TypedValue;
pub use crate::coerce::UnknownSettingType;
pub use crate::config::ConfigError;
pub use crate::config::SchemaConfig;
pub use crate::config::SettingsConfig;
pub use crate::error::SettingsError;
pub use crate::key::SettingsKey;
pub use crate::owner::OwnedSettings;
pub use crate::owner::Owner;
pub use crate::owner::SettingsOwner;
pub use crate::storage::MemoryStorage;
pub use crate::storage::SettingFilter;
pub use crate::storage::SettingRecord;
pub use crate::storage::SettingsStorage;
pub use crate::store::SettingsStore;

/// Re-exports of crates appearing in this crate's public api
pub mod re_exports {
    pub use serde;
    pub use serde_json;
    pub use time;
}

mod cache;
mod cache_key;
pub mod coerce;
mod config;
mod error;
mod key;
mod owner;
mod storage;
mod store;

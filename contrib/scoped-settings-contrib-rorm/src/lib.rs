//! Relational storage for scoped-settings
//!
//! [`RormStorage`] implements [`SettingsStorage`](scoped_settings_core::SettingsStorage)
//! on top of a single table described by the [`ScopedSetting`] model.
//!
//! # Migrations
//! The table is part of your application's rorm models.
//! Generate and apply the migration for it with rorm's cli just like for your own models.
#![warn(missing_docs)]

pub use crate::model::NewScopedSetting;
pub use crate::model::ScopedSetting;
pub use crate::storage::RormStorage;

mod model;
mod storage;

//! Keyed settings, optionally scoped to an owner
//!
//! This crate bundles [`scoped_settings_core`] with its contrib crates
//! and provides a [`ScopedSettings::builder`] to set everything up.
//!
//! # Example
//!
//! ```rust
//! # use scoped_settings::ScopedSettings;
//! # use scoped_settings::SettingsConfig;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ScopedSettings::builder()
//!     .config(SettingsConfig::default().with_default("theme", "light"))
//!     .build_in_memory()?;
//!
//! store.set("theme", "dark").await?;
//! assert_eq!(store.get_string("theme", None, None).await?.as_deref(), Some("dark"));
//! # Ok(())
//! # }
//! ```

pub mod contrib;

pub mod core {
    pub use scoped_settings_core::*;
}

pub use scoped_settings_core::*;

pub use crate::builder::*;
pub use crate::tracing::init_tracing;

mod builder;
pub mod error;
mod tracing;

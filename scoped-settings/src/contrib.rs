//! Re-exports of included contrib crates
//!
//! If this module is empty our you can't find a specific crate, then check scoped-settings' feature flags.

#[cfg(feature = "contrib-rorm")]
pub use scoped_settings_contrib_rorm as rorm;

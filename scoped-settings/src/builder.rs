use scoped_settings_core::MemoryCache;
use scoped_settings_core::MemoryStorage;
use scoped_settings_core::SettingsCache;
use scoped_settings_core::SettingsConfig;
use scoped_settings_core::SettingsStorage;
use scoped_settings_core::SettingsStore;
use tracing::info;

use crate::error::BuildError;
use crate::init_tracing;

/// Entrypoint for setting up a [`SettingsStore`]
#[non_exhaustive]
pub struct ScopedSettings;

impl ScopedSettings {
    /// Starts building a [`SettingsStore`]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }
}

/// Assembles a [`SettingsStore`] from its configuration and collaborators
#[derive(Default)]
pub struct StoreBuilder {
    config: Option<SettingsConfig>,
    tracing: bool,
}

impl StoreBuilder {
    /// Uses `config` instead of reading it from the environment
    pub fn config(mut self, config: SettingsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Installs a global tracing subscriber during [`StoreBuilder::build`]
    ///
    /// See [`init_tracing`].
    pub fn with_tracing(mut self) -> Self {
        self.tracing = true;
        self
    }

    /// Builds the store
    ///
    /// If no config has been provided, it is read using [`SettingsConfig::from_env`].
    pub fn build<S, C>(self, storage: S, cache: C) -> Result<SettingsStore<S, C>, BuildError>
    where
        S: SettingsStorage,
        C: SettingsCache,
    {
        if self.tracing {
            init_tracing()?;
        }

        let config = match self.config {
            Some(config) => config,
            None => SettingsConfig::from_env()?,
        };
        info!(
            with_cache = config.with_cache,
            cache_prefix = config.cache_prefix.as_str(),
            defaults = config.defaults.len(),
            model_defaults = config.model_defaults.len(),
            "Settings store configured"
        );

        Ok(SettingsStore::new(config, storage, cache))
    }

    /// Builds a store which keeps its settings and cache in memory
    pub fn build_in_memory(self) -> Result<SettingsStore<MemoryStorage>, BuildError> {
        self.build(MemoryStorage::new(), MemoryCache::new())
    }
}

#[cfg(test)]
mod tests {
    use scoped_settings_core::Owner;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn builds_with_explicit_config() {
        let store = ScopedSettings::builder()
            .config(
                SettingsConfig::default()
                    .with_default("theme", "light")
                    .with_model_default("User", "theme", "blue"),
            )
            .build_in_memory()
            .unwrap();

        assert_eq!(store.get("theme", None).await.unwrap(), Some(json!("light")));
        assert_eq!(
            store
                .get_with_model("theme", &Owner::new("User", 1), None)
                .await
                .unwrap(),
            Some(json!("blue"))
        );
    }
}

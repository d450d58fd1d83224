use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Configuration of a [`SettingsStore`](crate::SettingsStore)
///
/// It is constructed once and passed to [`SettingsStore::new`](crate::SettingsStore::new).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Whether reads should go through the [`SettingsCache`](crate::SettingsCache)
    pub with_cache: bool,

    /// Namespace prepended to every cache key
    pub cache_prefix: String,

    /// How long a cached value stays valid, in seconds
    pub cache_lifetime_secs: u64,

    /// Column names for storage backends which support custom schemas
    pub schema: SchemaConfig,

    /// Fallback values for settings which have not been set
    pub defaults: HashMap<String, Value>,

    /// Fallback values for owner-scoped settings which have not been set
    ///
    /// The outer key is the [`Owner::owner_type`](crate::Owner::owner_type).
    pub model_defaults: HashMap<String, HashMap<String, Value>>,
}

/// Column names of the settings table
///
/// These are naming hints for [`SettingsStorage`](crate::SettingsStorage) implementations
/// which build their queries at runtime. The resolver itself never reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct SchemaConfig {
    pub key_column: String,
    pub value_column: String,
    pub owner_type_column: String,
    pub owner_id_column: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            with_cache: false,
            cache_prefix: "settings".to_string(),
            cache_lifetime_secs: 60 * 60 * 24 * 7,
            schema: SchemaConfig::default(),
            defaults: HashMap::new(),
            model_defaults: HashMap::new(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            key_column: "key".to_string(),
            value_column: "value".to_string(),
            owner_type_column: "owner_type".to_string(),
            owner_id_column: "owner_id".to_string(),
        }
    }
}

impl SettingsConfig {
    /// Prefix of the environment variables read by [`SettingsConfig::from_env`]
    pub const ENV_PREFIX: &'static str = "SETTINGS_";

    /// Reads the configuration from `SETTINGS_*` environment variables
    ///
    /// Unset variables keep their [`Default`] value.
    /// `SETTINGS_DEFAULTS` and `SETTINGS_MODEL_DEFAULTS` are expected to contain JSON objects.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env: EnvConfig = envy::prefixed(Self::ENV_PREFIX).from_env()?;
        Self::from_env_config(env)
    }

    /// Reads the configuration from an iterator of `(name, value)` pairs
    ///
    /// The names are expected to carry the `SETTINGS_` prefix, just like [`SettingsConfig::from_env`].
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(Self::ENV_PREFIX).from_iter(vars)?;
        Self::from_env_config(env)
    }

    fn from_env_config(env: EnvConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let EnvConfig {
            with_cache,
            cache_prefix,
            cache_lifetime_secs,
            key_column,
            value_column,
            owner_type_column,
            owner_id_column,
            defaults,
            model_defaults,
        } = env;

        if let Some(with_cache) = with_cache {
            config.with_cache = with_cache;
        }
        if let Some(cache_prefix) = cache_prefix {
            config.cache_prefix = cache_prefix;
        }
        if let Some(cache_lifetime_secs) = cache_lifetime_secs {
            config.cache_lifetime_secs = cache_lifetime_secs;
        }
        if let Some(key_column) = key_column {
            config.schema.key_column = key_column;
        }
        if let Some(value_column) = value_column {
            config.schema.value_column = value_column;
        }
        if let Some(owner_type_column) = owner_type_column {
            config.schema.owner_type_column = owner_type_column;
        }
        if let Some(owner_id_column) = owner_id_column {
            config.schema.owner_id_column = owner_id_column;
        }
        if let Some(defaults) = defaults {
            config.defaults = serde_json::from_str(&defaults).map_err(ConfigError::Defaults)?;
        }
        if let Some(model_defaults) = model_defaults {
            config.model_defaults =
                serde_json::from_str(&model_defaults).map_err(ConfigError::Defaults)?;
        }

        Ok(config)
    }

    /// Adds a global default value
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Adds a default value for settings owned by an entity of type `owner_type`
    pub fn with_model_default(
        mut self,
        owner_type: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.model_defaults
            .entry(owner_type.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// The cache lifetime as [`Duration`]
    pub fn cache_lifetime(&self) -> Duration {
        Duration::from_secs(self.cache_lifetime_secs)
    }
}

/// Error returned by [`SettingsConfig::from_env`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{0}")]
    Env(#[from] envy::Error),

    /// `SETTINGS_DEFAULTS` or `SETTINGS_MODEL_DEFAULTS` is not a valid JSON object.
    #[error("Invalid default settings: {0}")]
    Defaults(serde_json::Error),
}

/// Flat view of [`SettingsConfig`] as it is read from the environment
#[derive(Deserialize, Debug)]
struct EnvConfig {
    with_cache: Option<bool>,
    cache_prefix: Option<String>,
    cache_lifetime_secs: Option<u64>,
    key_column: Option<String>,
    value_column: Option<String>,
    owner_type_column: Option<String>,
    owner_id_column: Option<String>,
    defaults: Option<String>,
    model_defaults: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_variables() {
        let config = SettingsConfig::from_vars(Vec::new()).unwrap();
        assert!(!config.with_cache);
        assert_eq!(config.cache_prefix, "settings");
        assert_eq!(config.cache_lifetime(), Duration::from_secs(604_800));
        assert_eq!(config.schema.key_column, "key");
        assert!(config.defaults.is_empty());
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = SettingsConfig::from_vars(vars(&[
            ("SETTINGS_WITH_CACHE", "true"),
            ("SETTINGS_CACHE_PREFIX", "app"),
            ("SETTINGS_CACHE_LIFETIME_SECS", "30"),
            ("SETTINGS_OWNER_TYPE_COLUMN", "model_type"),
            ("SETTINGS_DEFAULTS", r#"{"theme": "dark"}"#),
            ("SETTINGS_MODEL_DEFAULTS", r#"{"User": {"theme": "light"}}"#),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert!(config.with_cache);
        assert_eq!(config.cache_prefix, "app");
        assert_eq!(config.cache_lifetime_secs, 30);
        assert_eq!(config.schema.owner_type_column, "model_type");
        assert_eq!(config.schema.owner_id_column, "owner_id");
        assert_eq!(config.defaults["theme"], json!("dark"));
        assert_eq!(config.model_defaults["User"]["theme"], json!("light"));
    }

    #[test]
    fn rejects_malformed_defaults() {
        let result = SettingsConfig::from_vars(vars(&[("SETTINGS_DEFAULTS", "[1, 2]")]));
        assert!(matches!(result, Err(ConfigError::Defaults(_))));

        let result = SettingsConfig::from_vars(vars(&[("SETTINGS_WITH_CACHE", "maybe")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn builder_helpers() {
        let config = SettingsConfig::default()
            .with_default("theme", "dark")
            .with_model_default("User", "theme", "light")
            .with_model_default("User", "locale", "en");
        assert_eq!(config.defaults["theme"], json!("dark"));
        assert_eq!(config.model_defaults["User"].len(), 2);
    }
}

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::instrument;
use tracing::trace;

use crate::MemoryCache;
use crate::OwnedSettings;
use crate::Owner;
use crate::SettingFilter;
use crate::SettingType;
use crate::SettingsCache;
use crate::SettingsConfig;
use crate::SettingsError;
use crate::SettingsKey;
use crate::SettingsOwner;
use crate::SettingsStorage;
use crate::TypedValue;
use crate::cache_key::cache_key;
use crate::coerce;

/// Reads, writes and deletes settings
///
/// A setting is identified by its key and an optional [`Owner`].
/// Methods without an owner operate on the global scope,
/// `*_with_model` methods require an owner and `*_scoped` methods accept either.
///
/// # Resolution
///
/// Reading a setting returns the first hit of:
/// 1. the cached value (if [`SettingsConfig::with_cache`] is set)
/// 2. the stored value (which will be cached afterward)
/// 3. the `default` passed by the caller
/// 4. the owner type's entry in [`SettingsConfig::model_defaults`]
/// 5. the entry in [`SettingsConfig::defaults`]
///
/// Writes and deletes evict the setting's cache entry without repopulating it.
///
/// # Consistency
///
/// The store takes no locks of its own.
/// A read racing a concurrent write may observe and even cache the old value
/// until the entry expires or is evicted by the next write.
pub struct SettingsStore<S, C = MemoryCache> {
    config: SettingsConfig,
    storage: S,
    cache: C,
}

impl<S: SettingsStorage> SettingsStore<S, MemoryCache> {
    /// Constructs a new store using an in-memory cache
    pub fn with_memory_cache(config: SettingsConfig, storage: S) -> Self {
        Self::new(config, storage, MemoryCache::new())
    }
}

impl<S: SettingsStorage, C: SettingsCache> SettingsStore<S, C> {
    /// Constructs a new store
    ///
    /// The `cache` is only used if [`SettingsConfig::with_cache`] is set.
    pub fn new(config: SettingsConfig, storage: S, cache: C) -> Self {
        Self {
            config,
            storage,
            cache,
        }
    }

    /// The store's configuration
    pub fn config(&self) -> &SettingsConfig {
        &self.config
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The underlying cache
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Restricts the store to settings owned by `owner`
    pub fn owned_by<O: SettingsOwner>(&self, owner: &O) -> OwnedSettings<'_, S, C> {
        OwnedSettings::new(self, owner.settings_owner())
    }

    /// Sets a global setting
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        self.set_scoped(key, value, None).await
    }

    /// Gets a global setting
    ///
    /// See the [type's documentation](SettingsStore#resolution) for the resolution order.
    pub async fn get(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<Value>, SettingsError> {
        self.get_scoped(key, None, default).await
    }

    /// Deletes a global setting
    pub async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.delete_scoped(key, None).await
    }

    /// Deletes a global setting
    #[deprecated(note = "Use `delete` instead")]
    pub async fn forget(&self, key: &str) -> Result<(), SettingsError> {
        self.delete(key).await
    }

    /// Sets a setting owned by `owner`
    pub async fn set_with_model<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        owner: &Owner,
    ) -> Result<(), SettingsError> {
        self.set_scoped(key, value, Some(owner)).await
    }

    /// Gets a setting owned by `owner`
    pub async fn get_with_model(
        &self,
        key: &str,
        owner: &Owner,
        default: Option<Value>,
    ) -> Result<Option<Value>, SettingsError> {
        self.get_scoped(key, Some(owner), default).await
    }

    /// Deletes a setting owned by `owner`
    pub async fn delete_with_model(&self, key: &str, owner: &Owner) -> Result<(), SettingsError> {
        self.delete_scoped(key, Some(owner)).await
    }

    /// Deletes a setting owned by `owner`
    #[deprecated(note = "Use `delete_with_model` instead")]
    pub async fn forget_with_model(&self, key: &str, owner: &Owner) -> Result<(), SettingsError> {
        self.delete_with_model(key, owner).await
    }

    /// Sets a setting in the global scope (`owner` is `None`) or in an owner's scope
    ///
    /// The value is inserted or replaces the existing one.
    #[instrument(level = "debug", skip(self, value))]
    pub async fn set_scoped<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        owner: Option<&Owner>,
    ) -> Result<(), SettingsError> {
        let key = SettingsKey::new(key)?;
        owner.map(Owner::validate).transpose()?;
        let value = serde_json::to_value(value).map_err(SettingsError::Serialize)?;

        self.storage
            .upsert(
                &SettingFilter {
                    key: key.as_str(),
                    owner,
                },
                value,
            )
            .await
            .map_err(SettingsError::storage)?;

        self.evict(&key, owner).await
    }

    /// Gets a setting from the global scope (`owner` is `None`) or from an owner's scope
    ///
    /// See the [type's documentation](SettingsStore#resolution) for the resolution order.
    ///
    /// A `default` of `Some(Value::Null)` is returned as is,
    /// pass `None` to fall through to the configured defaults.
    #[instrument(level = "debug", skip(self, default))]
    pub async fn get_scoped(
        &self,
        key: &str,
        owner: Option<&Owner>,
        default: Option<Value>,
    ) -> Result<Option<Value>, SettingsError> {
        let key = SettingsKey::new(key)?;
        owner.map(Owner::validate).transpose()?;
        let cache_key = self
            .config
            .with_cache
            .then(|| cache_key(&self.config.cache_prefix, &key, owner));

        if let Some(cache_key) = &cache_key {
            if let Some(value) = self.cached(cache_key).await? {
                trace!(%cache_key, "Cache hit");
                return Ok(Some(value));
            }
            trace!(%cache_key, "Cache miss");
        }

        let record = self
            .storage
            .find_one(&SettingFilter {
                key: key.as_str(),
                owner,
            })
            .await
            .map_err(SettingsError::storage)?;

        if let Some(record) = record {
            if let Some(cache_key) = &cache_key {
                self.cache
                    .put(
                        cache_key,
                        record.value.clone(),
                        self.config.cache_lifetime(),
                    )
                    .await
                    .map_err(SettingsError::cache)?;
            }
            return Ok(Some(record.value));
        }

        Ok(self.fallback(&key, owner, default))
    }

    /// Deletes a setting from the global scope (`owner` is `None`) or from an owner's scope
    ///
    /// Deleting a setting which doesn't exist is not an error.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_scoped(&self, key: &str, owner: Option<&Owner>) -> Result<(), SettingsError> {
        let key = SettingsKey::new(key)?;
        owner.map(Owner::validate).transpose()?;

        let deleted = self
            .storage
            .delete_many(&SettingFilter {
                key: key.as_str(),
                owner,
            })
            .await
            .map_err(SettingsError::storage)?;
        debug!(deleted, "Deleted setting");

        self.evict(&key, owner).await
    }

    /// Gets a setting and coerces it into `setting_type`
    ///
    /// The setting is resolved like [`SettingsStore::get_scoped`].
    /// If this yields nothing or `null`, then `None` is returned without any coercion.
    pub async fn get_as(
        &self,
        key: &str,
        setting_type: SettingType,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<TypedValue>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::coerce(&value, setting_type)))
    }

    /// Gets a setting as [`SettingType::String`]
    pub async fn get_string(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<String>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_string(&value)))
    }

    /// Gets a setting as [`SettingType::Integer`]
    pub async fn get_integer(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<i64>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_integer(&value)))
    }

    /// Gets a setting as [`SettingType::Float`]
    pub async fn get_float(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<f64>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_float(&value)))
    }

    /// Gets a setting as [`SettingType::Boolean`]
    pub async fn get_boolean(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<bool>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_boolean(&value)))
    }

    /// Gets a setting as [`SettingType::Array`]
    pub async fn get_array(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<Vec<Value>>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_array(&value)))
    }

    /// Gets a setting as [`SettingType::Object`]
    pub async fn get_object(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<Map<String, Value>>, SettingsError> {
        let value = self.get_non_null(key, default, owner).await?;
        Ok(value.map(|value| coerce::to_object(&value)))
    }

    /// Gets a setting and deserializes it into `T`
    ///
    /// Unlike the coercing getters, this fails if the value doesn't match `T`.
    pub async fn get_deserialized<T: DeserializeOwned>(
        &self,
        key: &str,
        owner: Option<&Owner>,
    ) -> Result<Option<T>, SettingsError> {
        match self.get_non_null(key, None, owner).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(SettingsError::Deserialize),
            None => Ok(None),
        }
    }

    /// Resolves a setting, treating `null` like a missing value
    async fn get_non_null(
        &self,
        key: &str,
        default: Option<Value>,
        owner: Option<&Owner>,
    ) -> Result<Option<Value>, SettingsError> {
        let value = self.get_scoped(key, owner, default).await?;
        Ok(value.filter(|value| !value.is_null()))
    }

    /// Looks up a cache entry
    async fn cached(&self, cache_key: &str) -> Result<Option<Value>, SettingsError> {
        if !self
            .cache
            .has(cache_key)
            .await
            .map_err(SettingsError::cache)?
        {
            return Ok(None);
        }
        self.cache
            .get(cache_key)
            .await
            .map_err(SettingsError::cache)
    }

    /// Removes a setting's cache entry if caching is enabled
    async fn evict(&self, key: &str, owner: Option<&Owner>) -> Result<(), SettingsError> {
        if !self.config.with_cache {
            return Ok(());
        }
        let cache_key = cache_key(&self.config.cache_prefix, key, owner);
        trace!(%cache_key, "Evicting cache entry");
        self.cache
            .forget(&cache_key)
            .await
            .map_err(SettingsError::cache)
    }

    /// Resolves a setting which is neither cached nor stored
    fn fallback(&self, key: &str, owner: Option<&Owner>, default: Option<Value>) -> Option<Value> {
        if default.is_some() {
            return default;
        }

        let model_default = owner
            .and_then(|owner| self.config.model_defaults.get(&owner.owner_type))
            .and_then(|defaults| defaults.get(key));
        if let Some(value) = model_default {
            trace!(key, "Using the owner type's default");
            return Some(value.clone());
        }

        let default = self.config.defaults.get(key).cloned();
        if default.is_some() {
            trace!(key, "Using the global default");
        }
        default
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MemoryStorage;

    fn store(config: SettingsConfig) -> SettingsStore<MemoryStorage> {
        SettingsStore::with_memory_cache(config, MemoryStorage::new())
    }

    #[test]
    fn fallback_order() {
        let store = store(
            SettingsConfig::default()
                .with_default("theme", "global")
                .with_model_default("User", "theme", "user"),
        );
        let user = Owner::new("User", 1);
        let team = Owner::new("Team", 1);

        assert_eq!(
            store.fallback("theme", Some(&user), Some(json!("caller"))),
            Some(json!("caller"))
        );
        assert_eq!(store.fallback("theme", Some(&user), None), Some(json!("user")));
        assert_eq!(store.fallback("theme", Some(&team), None), Some(json!("global")));
        assert_eq!(store.fallback("theme", None, None), Some(json!("global")));
        assert_eq!(store.fallback("missing", Some(&user), None), None);
    }

    #[test]
    fn explicit_null_default_wins() {
        let store = store(SettingsConfig::default().with_default("theme", "global"));
        assert_eq!(
            store.fallback("theme", None, Some(Value::Null)),
            Some(Value::Null)
        );
    }
}

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::SettingType;
use crate::SettingsCache;
use crate::SettingsError;
use crate::SettingsStorage;
use crate::SettingsStore;
use crate::TypedValue;

/// The entity a setting belongs to
///
/// It consists of the entity's type (e.g. `"User"`) and the instance's id.
/// Settings without an owner are global.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// Name of the owning entity's type
    pub owner_type: String,

    /// Identifier of the owning entity
    pub owner_id: String,
}

impl Owner {
    /// Constructs a new owner
    pub fn new(owner_type: impl Into<String>, owner_id: impl fmt::Display) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.to_string(),
        }
    }

    /// Constructs the scope from a nullable type and id pair
    ///
    /// Empty strings are treated like absent values.
    ///
    /// # Errors
    /// If only one of the two is present.
    pub fn from_parts(
        owner_type: Option<&str>,
        owner_id: Option<&str>,
    ) -> Result<Option<Self>, SettingsError> {
        let owner_type = owner_type.filter(|owner_type| !owner_type.is_empty());
        let owner_id = owner_id.filter(|owner_id| !owner_id.is_empty());
        match (owner_type, owner_id) {
            (Some(owner_type), Some(owner_id)) => Ok(Some(Self::new(owner_type, owner_id))),
            (None, None) => Ok(None),
            _ => Err(SettingsError::MixedScope),
        }
    }

    /// Checks that neither the type nor the id is empty
    ///
    /// The [`SettingsStore`] rejects owners failing this check.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.owner_type.is_empty() || self.owner_id.is_empty() {
            return Err(SettingsError::EmptyOwner(self.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner_type, self.owner_id)
    }
}

/// An entity which can own settings
///
/// # Example
///
/// ```rust
/// # use scoped_settings_core::SettingsOwner;
/// struct User {
///     id: i64,
/// }
///
/// impl SettingsOwner for User {
///     const OWNER_TYPE: &'static str = "User";
///
///     fn owner_id(&self) -> String {
///         self.id.to_string()
///     }
/// }
/// ```
pub trait SettingsOwner {
    /// Name of the entity's type
    ///
    /// This is used as [`Owner::owner_type`] and to look up [`model_defaults`](crate::SettingsConfig::model_defaults).
    const OWNER_TYPE: &'static str;

    /// Identifier of this instance
    fn owner_id(&self) -> String;

    /// Constructs the [`Owner`] representing this instance
    fn settings_owner(&self) -> Owner {
        Owner::new(Self::OWNER_TYPE, self.owner_id())
    }
}

/// A [`SettingsStore`] restricted to the settings of a single [`Owner`]
///
/// Returned by [`SettingsStore::owned_by`].
pub struct OwnedSettings<'a, S, C> {
    store: &'a SettingsStore<S, C>,
    owner: Owner,
}

impl<'a, S: SettingsStorage, C: SettingsCache> OwnedSettings<'a, S, C> {
    pub(crate) fn new(store: &'a SettingsStore<S, C>, owner: Owner) -> Self {
        Self { store, owner }
    }

    /// The owner this view is restricted to
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Sets one of the owner's settings
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        self.store.set_with_model(key, value, &self.owner).await
    }

    /// Gets one of the owner's settings
    pub async fn get(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<Value>, SettingsError> {
        self.store.get_with_model(key, &self.owner, default).await
    }

    /// Deletes one of the owner's settings
    pub async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.store.delete_with_model(key, &self.owner).await
    }

    /// Deletes one of the owner's settings
    #[deprecated(note = "Use `delete` instead")]
    pub async fn forget(&self, key: &str) -> Result<(), SettingsError> {
        self.delete(key).await
    }

    /// Gets one of the owner's settings and coerces it into `setting_type`
    pub async fn get_as(
        &self,
        key: &str,
        setting_type: SettingType,
        default: Option<Value>,
    ) -> Result<Option<TypedValue>, SettingsError> {
        self.store
            .get_as(key, setting_type, default, Some(&self.owner))
            .await
    }

    /// Gets one of the owner's settings as string
    pub async fn get_string(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<String>, SettingsError> {
        self.store.get_string(key, default, Some(&self.owner)).await
    }

    /// Gets one of the owner's settings as integer
    pub async fn get_integer(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<i64>, SettingsError> {
        self.store.get_integer(key, default, Some(&self.owner)).await
    }

    /// Gets one of the owner's settings as float
    pub async fn get_float(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<f64>, SettingsError> {
        self.store.get_float(key, default, Some(&self.owner)).await
    }

    /// Gets one of the owner's settings as boolean
    pub async fn get_boolean(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<bool>, SettingsError> {
        self.store.get_boolean(key, default, Some(&self.owner)).await
    }

    /// Gets one of the owner's settings as array
    pub async fn get_array(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<Vec<Value>>, SettingsError> {
        self.store.get_array(key, default, Some(&self.owner)).await
    }

    /// Gets one of the owner's settings as object
    pub async fn get_object(
        &self,
        key: &str,
        default: Option<Value>,
    ) -> Result<Option<Map<String, Value>>, SettingsError> {
        self.store.get_object(key, default, Some(&self.owner)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts() {
        assert_eq!(Owner::from_parts(None, None).unwrap(), None);
        assert_eq!(Owner::from_parts(Some(""), Some("")).unwrap(), None);
        assert_eq!(
            Owner::from_parts(Some("User"), Some("42")).unwrap(),
            Some(Owner::new("User", 42))
        );
        assert!(matches!(
            Owner::from_parts(Some("User"), None),
            Err(SettingsError::MixedScope)
        ));
        assert!(matches!(
            Owner::from_parts(None, Some("42")),
            Err(SettingsError::MixedScope)
        ));
        assert!(matches!(
            Owner::from_parts(Some("User"), Some("")),
            Err(SettingsError::MixedScope)
        ));
    }

    #[test]
    fn validate() {
        assert!(Owner::new("User", 42).validate().is_ok());
        assert!(matches!(
            Owner::new("", "").validate(),
            Err(SettingsError::EmptyOwner(_))
        ));
        assert!(matches!(
            Owner::new("User", "").validate(),
            Err(SettingsError::EmptyOwner(_))
        ));
    }

    #[test]
    fn settings_owner() {
        struct Team(u32);
        impl SettingsOwner for Team {
            const OWNER_TYPE: &'static str = "Team";

            fn owner_id(&self) -> String {
                self.0.to_string()
            }
        }

        assert_eq!(Team(7).settings_owner(), Owner::new("Team", "7"));
        assert_eq!(Team(7).settings_owner().to_string(), "Team#7");
    }
}

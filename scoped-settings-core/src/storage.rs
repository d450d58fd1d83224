use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde_json::Value;
use time::OffsetDateTime;

use crate::Owner;

/// Persistent storage of settings records
///
/// Every method operates on the single record identified by a [`SettingFilter`].
/// Implementations must guarantee that there is at most one record per filter.
pub trait SettingsStorage: Send + Sync + 'static {
    /// Error produced by the storage's underlying system
    type Error: Error + Send + Sync + 'static;

    /// Inserts the record matching `filter` or updates its value if it already exists
    fn upsert(
        &self,
        filter: &SettingFilter<'_>,
        value: Value,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Retrieves the record matching `filter`
    fn find_one(
        &self,
        filter: &SettingFilter<'_>,
    ) -> impl Future<Output = Result<Option<SettingRecord>, Self::Error>> + Send;

    /// Deletes the record matching `filter`
    ///
    /// Deleting a non-existing record is not an error.
    /// Returns the number of deleted records.
    fn delete_many(
        &self,
        filter: &SettingFilter<'_>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}

/// Identifies a single setting
#[derive(Debug, Copy, Clone)]
pub struct SettingFilter<'a> {
    /// The setting's key
    pub key: &'a str,

    /// The setting's owner or `None` for a global setting
    pub owner: Option<&'a Owner>,
}

/// A setting as it is persisted by a [`SettingsStorage`]
#[derive(Debug, Clone, PartialEq)]
pub struct SettingRecord {
    /// The setting's key
    pub key: String,

    /// The setting's value
    pub value: Value,

    /// The setting's owner or `None` for a global setting
    pub owner: Option<Owner>,

    /// Point in time the record has been inserted
    pub created_at: OffsetDateTime,

    /// Point in time the record's value has been written last
    pub updated_at: OffsetDateTime,
}

/// [`SettingsStorage`] keeping its records in memory
///
/// Useful for tests and for applications which don't need their settings to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<(String, Option<Owner>), SettingRecord>>,
}

impl MemoryStorage {
    /// Constructs an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no records are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingFilter<'_> {
    fn to_map_key(self) -> (String, Option<Owner>) {
        (self.key.to_string(), self.owner.cloned())
    }
}

impl SettingsStorage for MemoryStorage {
    type Error = Infallible;

    async fn upsert(&self, filter: &SettingFilter<'_>, value: Value) -> Result<(), Self::Error> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(filter.to_map_key())
            .and_modify(|record| {
                record.value = value.clone();
                record.updated_at = now;
            })
            .or_insert_with(|| SettingRecord {
                key: filter.key.to_string(),
                value,
                owner: filter.owner.cloned(),
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn find_one(
        &self,
        filter: &SettingFilter<'_>,
    ) -> Result<Option<SettingRecord>, Self::Error> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&filter.to_map_key()).cloned())
    }

    async fn delete_many(&self, filter: &SettingFilter<'_>) -> Result<u64, Self::Error> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(&filter.to_map_key()).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn upsert_keeps_single_record() {
        let storage = MemoryStorage::new();
        let filter = SettingFilter {
            key: "theme",
            owner: None,
        };

        storage.upsert(&filter, json!("dark")).await.unwrap();
        let created = storage.find_one(&filter).await.unwrap().unwrap();
        storage.upsert(&filter, json!("light")).await.unwrap();
        let updated = storage.find_one(&filter).await.unwrap().unwrap();

        assert_eq!(storage.len(), 1);
        assert_eq!(updated.value, json!("light"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn scopes_are_separate_records() {
        let storage = MemoryStorage::new();
        let owner = Owner::new("User", 1);
        let global = SettingFilter {
            key: "theme",
            owner: None,
        };
        let owned = SettingFilter {
            key: "theme",
            owner: Some(&owner),
        };

        storage.upsert(&global, json!("dark")).await.unwrap();
        storage.upsert(&owned, json!("light")).await.unwrap();
        assert_eq!(storage.len(), 2);

        let record = storage.find_one(&owned).await.unwrap().unwrap();
        assert_eq!(record.owner.as_ref(), Some(&owner));
        assert_eq!(record.value, json!("light"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let storage = MemoryStorage::new();
        let filter = SettingFilter {
            key: "theme",
            owner: None,
        };

        storage.upsert(&filter, json!("dark")).await.unwrap();
        assert_eq!(storage.delete_many(&filter).await.unwrap(), 1);
        assert_eq!(storage.delete_many(&filter).await.unwrap(), 0);
        assert!(storage.find_one(&filter).await.unwrap().is_none());
        assert!(storage.is_empty());
    }
}

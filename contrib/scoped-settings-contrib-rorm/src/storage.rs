use rorm::Database;
use rorm::fields::types::Json;
use scoped_settings_core::Owner;
use scoped_settings_core::SettingFilter;
use scoped_settings_core::SettingRecord;
use scoped_settings_core::SettingsStorage;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::model::NewScopedSetting;
use crate::model::ScopedSetting;

/// [`SettingsStorage`] persisting settings in the [`ScopedSetting`] table
///
/// Rows are identified by [`ScopedSetting::scope`] whose unique constraint
/// keeps concurrent upserts of the same setting from inserting it twice.
#[derive(Clone)]
pub struct RormStorage {
    db: Database,
}

impl RormStorage {
    /// Constructs a storage using the database `db`
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Overwrites the value of an existing row, returning the number of updated rows
    async fn update_value(
        &self,
        scope: &str,
        value: Value,
        now: OffsetDateTime,
    ) -> Result<u64, rorm::Error> {
        rorm::update(&self.db, ScopedSetting)
            .set(ScopedSetting.value, Json(value))
            .set(ScopedSetting.updated_at, now)
            .condition(ScopedSetting.scope.equals(scope))
            .await
    }
}

impl SettingsStorage for RormStorage {
    type Error = rorm::Error;

    async fn upsert(&self, filter: &SettingFilter<'_>, value: Value) -> Result<(), Self::Error> {
        let scope = scope_of(filter);
        let now = OffsetDateTime::now_utc();

        if self.update_value(&scope, value.clone(), now).await? > 0 {
            debug!(%scope, "Updated setting");
            return Ok(());
        }

        let inserted = rorm::insert(&self.db, ScopedSetting)
            .return_nothing()
            .single(&NewScopedSetting {
                scope: scope.clone(),
                key: filter.key.to_string(),
                value: Json(value.clone()),
                owner_type: filter.owner.map(|owner| owner.owner_type.clone()),
                owner_id: filter.owner.map(|owner| owner.owner_id.clone()),
                created_at: now,
                updated_at: now,
            })
            .await;

        match inserted {
            Ok(()) => {
                debug!(%scope, "Inserted setting");
                Ok(())
            }
            Err(error) => {
                // A concurrent upsert inserted the row in between
                if self.update_value(&scope, value, now).await? > 0 {
                    debug!(%scope, "Updated setting after losing insert race");
                    Ok(())
                } else {
                    Err(error)
                }
            }
        }
    }

    async fn find_one(
        &self,
        filter: &SettingFilter<'_>,
    ) -> Result<Option<SettingRecord>, Self::Error> {
        let scope = scope_of(filter);
        let setting = rorm::query(&self.db, ScopedSetting)
            .condition(ScopedSetting.scope.equals(scope.as_str()))
            .optional()
            .await?;
        Ok(setting.map(into_record))
    }

    async fn delete_many(&self, filter: &SettingFilter<'_>) -> Result<u64, Self::Error> {
        let scope = scope_of(filter);
        rorm::delete(&self.db, ScopedSetting)
            .condition(ScopedSetting.scope.equals(scope.as_str()))
            .await
    }
}

/// Encodes the key and owner into the value of [`ScopedSetting::scope`]
///
/// Every part is prefixed with its length, so no two filters share a scope.
fn scope_of(filter: &SettingFilter<'_>) -> String {
    let owner = filter
        .owner
        .map(|owner| [owner.owner_type.as_str(), owner.owner_id.as_str()]);

    let mut scope = String::new();
    for part in [filter.key].into_iter().chain(owner.into_iter().flatten()) {
        scope.push_str(&part.len().to_string());
        scope.push(':');
        scope.push_str(part);
    }
    scope
}

/// Converts the database model into the storage-agnostic record
fn into_record(setting: ScopedSetting) -> SettingRecord {
    let owner = match (setting.owner_type, setting.owner_id) {
        (Some(owner_type), Some(owner_id)) => Some(Owner {
            owner_type,
            owner_id,
        }),
        _ => None,
    };
    SettingRecord {
        key: setting.key,
        value: setting.value.0,
        owner,
        created_at: setting.created_at,
        updated_at: setting.updated_at,
    }
}

use rorm::Model;
use rorm::Patch;
use rorm::fields::types::Json;
use serde_json::Value;
use time::OffsetDateTime;

/// A single setting
///
/// `owner_type` and `owner_id` are both `None` for global settings.
#[derive(Model)]
pub struct ScopedSetting {
    /// Auto-incremented primary key
    #[rorm(id)]
    pub id: i64,

    /// Encoding of `key`, `owner_type` and `owner_id`
    ///
    /// Its unique constraint ensures there is at most one row per key and owner.
    #[rorm(unique, max_length = 1024)]
    pub scope: String,

    /// The setting's key
    #[rorm(max_length = 255)]
    pub key: String,

    /// The setting's value
    pub value: Json<Value>,

    /// Type of the setting's owner
    #[rorm(max_length = 255)]
    pub owner_type: Option<String>,

    /// Id of the setting's owner
    #[rorm(max_length = 255)]
    pub owner_id: Option<String>,

    /// Point in time the setting has been inserted
    pub created_at: OffsetDateTime,

    /// Point in time the setting's value has been written last
    pub updated_at: OffsetDateTime,
}

/// [`ScopedSetting`] without its generated primary key
#[derive(Patch)]
#[rorm(model = "ScopedSetting")]
#[allow(missing_docs)]
pub struct NewScopedSetting {
    pub scope: String,
    pub key: String,
    pub value: Json<Value>,
    pub owner_type: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

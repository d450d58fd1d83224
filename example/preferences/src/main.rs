use std::error::Error;

use scoped_settings::ScopedSettings;
use scoped_settings::SettingsConfig;
use scoped_settings::SettingsOwner;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::info;

struct User {
    id: i64,
}

impl SettingsOwner for User {
    const OWNER_TYPE: &'static str = "User";

    fn owner_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Notifications {
    email: bool,
    digest_hour: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Environment variables like SETTINGS_WITH_CACHE=true are layered below the defaults set here
    let config = SettingsConfig::from_env()?
        .with_default("theme", "light")
        .with_default("items_per_page", 25)
        .with_model_default("User", "theme", "blue");

    let store = ScopedSettings::builder()
        .config(config)
        .with_tracing()
        .build_in_memory()?;

    let alice = User { id: 1 };
    let bob = User { id: 2 };

    store.owned_by(&alice).set("theme", "dark").await?;
    store
        .owned_by(&alice)
        .set(
            "notifications",
            &Notifications {
                email: true,
                digest_hour: 8,
            },
        )
        .await?;
    store.set("items_per_page", "50 per page").await?;

    let alice_theme = store.owned_by(&alice).get_string("theme", None).await?;
    let bob_theme = store.owned_by(&bob).get_string("theme", None).await?;
    let global_theme = store.get_string("theme", None, None).await?;
    info!(?alice_theme, ?bob_theme, ?global_theme, "Themes");

    let items_per_page = store.get_integer("items_per_page", None, None).await?;
    info!(?items_per_page, "Coerced from a string");

    let notifications: Option<Notifications> = store
        .get_deserialized("notifications", Some(&alice.settings_owner()))
        .await?;
    info!(?notifications, "Alice's notifications");

    store.owned_by(&alice).delete("theme").await?;
    let alice_theme = store.owned_by(&alice).get_string("theme", None).await?;
    let language = store
        .owned_by(&bob)
        .get("language", Some(json!("en")))
        .await?;
    info!(?alice_theme, ?language, "After resetting");

    Ok(())
}

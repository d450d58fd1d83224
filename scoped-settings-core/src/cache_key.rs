use crate::Owner;

/// Builds the key under which a setting is stored in the [`SettingsCache`](crate::SettingsCache)
///
/// The format is `{prefix}.{key}[.{owner_type}][.{owner_id}]`.
/// The owner's segments are only appended if they are not empty.
pub fn cache_key(prefix: &str, key: &str, owner: Option<&Owner>) -> String {
    let mut cache_key = String::with_capacity(prefix.len() + key.len() + 1);
    cache_key.push_str(prefix);
    cache_key.push('.');
    cache_key.push_str(key);

    if let Some(owner) = owner {
        for segment in [owner.owner_type.as_str(), owner.owner_id.as_str()] {
            if !segment.is_empty() {
                cache_key.push('.');
                cache_key.push_str(segment);
            }
        }
    }

    cache_key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_key() {
        assert_eq!(cache_key("settings", "theme", None), "settings.theme");
    }

    #[test]
    fn owner_key() {
        let owner = Owner::new("User", 42);
        assert_eq!(
            cache_key("settings", "theme", Some(&owner)),
            "settings.theme.User.42"
        );
    }

    #[test]
    fn owner_keys_differ_from_global_key() {
        let fst = Owner::new("User", 1);
        let snd = Owner::new("User", 2);
        let global = cache_key("p", "k", None);
        let fst = cache_key("p", "k", Some(&fst));
        let snd = cache_key("p", "k", Some(&snd));
        assert_ne!(global, fst);
        assert_ne!(global, snd);
        assert_ne!(fst, snd);
    }
}

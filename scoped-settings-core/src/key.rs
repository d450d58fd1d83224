use std::fmt;
use std::ops::Deref;

use crate::SettingsError;

/// A validated settings key
///
/// It is non-empty and at most [`SettingsKey::MAX_LEN`] bytes long.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SettingsKey(String);

impl SettingsKey {
    /// The maximum length of a key in bytes
    pub const MAX_LEN: usize = 255;

    /// Validates a key
    pub fn new(key: impl Into<String>) -> Result<Self, SettingsError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SettingsError::EmptyKey);
        }
        if key.len() > Self::MAX_LEN {
            return Err(SettingsError::KeyTooLong(key));
        }
        Ok(Self(key))
    }

    /// Borrows the key as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwraps the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for SettingsKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(SettingsKey::new(""), Err(SettingsError::EmptyKey)));
    }

    #[test]
    fn rejects_long_key() {
        let key = "k".repeat(SettingsKey::MAX_LEN + 1);
        assert!(matches!(
            SettingsKey::new(key),
            Err(SettingsError::KeyTooLong(_))
        ));
        assert!(SettingsKey::new("k".repeat(SettingsKey::MAX_LEN)).is_ok());
    }
}

//! Store configuration.

use crate::{StoreError, keys::KeyCategory};

/// Namespacing for one installation's backend keys.
///
/// Several installations can share a backend as long as their names differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    installation_name: String,
}

impl StoreConfig {
    /// Installation name used by [`StoreConfig::default`].
    pub const DEFAULT_INSTALLATION_NAME: &'static str = "sealink";

    /// Create a config for `installation_name`.
    ///
    /// # Errors
    ///
    /// - `Config` if the name is empty or contains whitespace
    pub fn new(installation_name: impl Into<String>) -> Result<Self, StoreError> {
        let installation_name = installation_name.into();
        if installation_name.is_empty() {
            return Err(StoreError::Config("installation name must not be empty".to_string()));
        }
        if installation_name.chars().any(char::is_whitespace) {
            return Err(StoreError::Config(format!(
                "installation name must not contain whitespace: {installation_name:?}"
            )));
        }

        Ok(Self { installation_name })
    }

    /// Installation name.
    pub fn installation_name(&self) -> &str {
        &self.installation_name
    }

    /// Backend key holding the credentials blob.
    pub fn creds_key(&self) -> String {
        format!("{}_creds", self.installation_name)
    }

    /// Backend key of the legacy whole-bag blob.
    pub fn legacy_keys_key(&self) -> String {
        format!("{}_keys", self.installation_name)
    }

    /// Backend key holding one key-bag entry.
    ///
    /// Category names never contain `/`, so distinct `(category, id)` pairs
    /// always map to distinct keys.
    pub fn entry_key(&self, category: KeyCategory, id: &str) -> String {
        format!("{}_keys/{category}/{id}", self.installation_name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { installation_name: Self::DEFAULT_INSTALLATION_NAME.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let config = StoreConfig::new("bot1").unwrap();

        assert_eq!(config.creds_key(), "bot1_creds");
        assert_eq!(config.legacy_keys_key(), "bot1_keys");
        assert_eq!(
            config.entry_key(KeyCategory::AppStateSyncKey, "AAAAAJ9x"),
            "bot1_keys/app-state-sync-key/AAAAAJ9x"
        );
    }

    #[test]
    fn entry_keys_never_collide_across_categories() {
        let config = StoreConfig::default();
        let mut seen = std::collections::HashSet::new();

        for category in KeyCategory::ALL {
            for id in ["g", "memory-g", "key-g", "sync-key-g", "a/b", ""] {
                assert!(seen.insert(config.entry_key(category, id)), "{category} {id}");
            }
        }
    }

    #[test]
    fn default_name() {
        assert_eq!(StoreConfig::default().creds_key(), "sealink_creds");
    }

    #[test]
    fn rejects_empty_or_whitespace_names() {
        assert!(matches!(StoreConfig::new(""), Err(StoreError::Config(_))));
        assert!(matches!(StoreConfig::new("my bot"), Err(StoreError::Config(_))));
    }
}

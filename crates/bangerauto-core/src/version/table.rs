use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

use super::VersionConfig;

/// Exact-match lookup from module fingerprint to version config.
#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    by_fingerprint: HashMap<String, Arc<VersionConfig>>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a config under each of its fingerprints.
    ///
    /// Invalid configs are never added. Later inserts win on duplicate fingerprints.
    pub fn insert(&mut self, config: VersionConfig) -> Result<()> {
        config.validate()?;
        let config = Arc::new(config);
        for fingerprint in &config.fingerprints {
            if self
                .by_fingerprint
                .insert(fingerprint.clone(), Arc::clone(&config))
                .is_some()
            {
                debug!(
                    "Fingerprint {} re-registered for '{}'",
                    fingerprint, config.display_name
                );
            }
        }
        Ok(())
    }

    pub fn resolve(&self, fingerprint: &str) -> Option<Arc<VersionConfig>> {
        self.by_fingerprint.get(fingerprint).cloned()
    }

    /// Number of registered fingerprints
    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::sample_config;

    #[test]
    fn test_resolve_exact_match() {
        let mut table = VersionTable::new();
        table.insert(sample_config("d41d8cd98f00b204e9800998ecf8427e")).unwrap();

        let config = table.resolve("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        assert_eq!(config.display_name, "1.312");
        assert!(table.resolve("d41d8cd98f00b204e9800998ecf8427").is_none());
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let mut table = VersionTable::new();
        table.insert(sample_config("abcdef")).unwrap();
        assert!(table.resolve("abcdef").is_some());
        assert!(table.resolve("ABCDEF").is_none());
        assert!(table.resolve("AbCdEf").is_none());
    }

    #[test]
    fn test_invalid_configs_never_inserted() {
        let mut table = VersionTable::new();

        let mut zero = sample_config("zero");
        zero.is_playing_offset = 0;
        assert!(table.insert(zero).is_err());

        let mut huge = sample_config("huge");
        huge.time_offset = 2 * 1024 * 1024;
        assert!(table.insert(huge).is_err());

        assert!(table.is_empty());
        assert!(table.resolve("zero").is_none());
        assert!(table.resolve("huge").is_none());
    }

    #[test]
    fn test_multiple_fingerprints_share_config() {
        let mut config = sample_config("aa");
        config.fingerprints.insert("bb".to_string());
        let mut table = VersionTable::new();
        table.insert(config).unwrap();

        assert_eq!(table.len(), 2);
        let a = table.resolve("aa").unwrap();
        let b = table.resolve("bb").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

//! `versions.json` loading.
//!
//! ```json
//! {
//!   "app_version": "1.0.3",
//!   "configurations": [
//!     {
//!       "md5_hashes": ["0123abcd..."],
//!       "display_name": "1.312",
//!       "autoplay": [72, 139, -1, 5],
//!       "is_playing_offset": 16,
//!       "time_offset": 32,
//!       "settle_delay_ms": 550
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::signature::Pattern;

use super::{VersionConfig, VersionTable};

/// Source of the version table, re-read on every reload.
pub trait VersionSource: Send + Sync {
    fn load(&self) -> Result<VersionTable>;

    /// Human-readable origin for log messages
    fn describe(&self) -> String;
}

/// Version table stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonVersionFile {
    path: PathBuf,
}

impl JsonVersionFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VersionSource for JsonVersionFile {
    fn load(&self) -> Result<VersionTable> {
        let content = fs::read_to_string(&self.path)?;
        let table = parse_versions(&content)?;
        info!(
            "Loaded {} version fingerprints from {}",
            table.len(),
            self.path.display()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    #[serde(default)]
    app_version: Option<String>,
    #[serde(default)]
    configurations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    md5_hashes: Option<Vec<String>>,
    display_name: Option<String>,
    autoplay: Option<Vec<i64>>,
    is_playing_offset: Option<i32>,
    time_offset: Option<i32>,
    #[serde(default)]
    settle_delay_ms: Option<u64>,
}

/// Parse a version file, skipping entries that are incomplete or invalid.
///
/// Fails only when the document is not a JSON object or no entry survives.
pub fn parse_versions(content: &str) -> Result<VersionTable> {
    let file: VersionFile = serde_json::from_str(content)?;
    if let Some(app_version) = &file.app_version {
        debug!("Version file app_version: {}", app_version);
    }

    let mut table = VersionTable::new();
    for (index, value) in file.configurations.into_iter().enumerate() {
        let entry: RawEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping configuration #{}: {}", index, e);
                continue;
            }
        };

        match entry_to_config(entry).and_then(|config| table.insert(config)) {
            Ok(()) => {}
            Err(e) => warn!("Skipping configuration #{}: {}", index, e),
        }
    }

    if table.is_empty() {
        return Err(Error::InvalidConfig(
            "Config corrupted: no usable configurations".to_string(),
        ));
    }

    Ok(table)
}

fn entry_to_config(entry: RawEntry) -> Result<VersionConfig> {
    let missing = |field: &str| Error::InvalidConfig(format!("{} missing", field));

    let fingerprints = entry.md5_hashes.ok_or_else(|| missing("md5_hashes"))?;
    let display_name = entry.display_name.ok_or_else(|| missing("display_name"))?;
    let autoplay = entry.autoplay.ok_or_else(|| missing("autoplay"))?;
    let is_playing_offset = entry
        .is_playing_offset
        .ok_or_else(|| missing("is_playing_offset"))?;
    let time_offset = entry.time_offset.ok_or_else(|| missing("time_offset"))?;

    Ok(VersionConfig {
        pattern: Pattern::from_decimal(&autoplay)?,
        is_playing_offset,
        time_offset,
        display_name,
        fingerprints: fingerprints.into_iter().collect(),
        settle_delay: entry.settle_delay_ms.map(Duration::from_millis),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "app_version": "1.0.3",
        "configurations": [
            {
                "md5_hashes": ["aaaa", "bbbb"],
                "display_name": "1.311",
                "autoplay": [17, -1, 34],
                "is_playing_offset": 16,
                "time_offset": 32,
                "settle_delay_ms": 550
            },
            {
                "md5_hashes": ["cccc"],
                "display_name": "1.312",
                "autoplay": [1, 2, 3],
                "is_playing_offset": -8,
                "time_offset": 24
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_file() {
        let table = parse_versions(VALID).unwrap();
        assert_eq!(table.len(), 3);

        let old = table.resolve("bbbb").unwrap();
        assert_eq!(old.display_name, "1.311");
        assert_eq!(old.settle_delay, Some(Duration::from_millis(550)));
        assert_eq!(old.pattern.to_string(), "11 ?? 22");

        let new = table.resolve("cccc").unwrap();
        assert_eq!(new.is_playing_offset, -8);
        assert_eq!(new.settle_delay, None);
    }

    #[test]
    fn test_incomplete_and_invalid_entries_skipped() {
        let content = r#"{
            "configurations": [
                { "md5_hashes": ["nooffsets"], "display_name": "x", "autoplay": [1] },
                { "md5_hashes": ["zero"], "display_name": "x", "autoplay": [1],
                  "is_playing_offset": 0, "time_offset": 4 },
                { "md5_hashes": ["badbyte"], "display_name": "x", "autoplay": [1, 300],
                  "is_playing_offset": 4, "time_offset": 4 },
                { "md5_hashes": ["wrongtype"], "display_name": "x", "autoplay": ["a"],
                  "is_playing_offset": 4, "time_offset": 4 },
                { "md5_hashes": ["emptypattern"], "display_name": "x", "autoplay": [],
                  "is_playing_offset": 4, "time_offset": 8 },
                { "md5_hashes": ["ok"], "display_name": "ok", "autoplay": [1, -1],
                  "is_playing_offset": 4, "time_offset": 8 }
            ]
        }"#;

        let table = parse_versions(content).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.resolve("ok").is_some());
        for rejected in [
            "nooffsets",
            "zero",
            "badbyte",
            "wrongtype",
            "emptypattern",
        ] {
            assert!(table.resolve(rejected).is_none(), "{} was accepted", rejected);
        }
    }

    #[test]
    fn test_no_usable_entries_is_error() {
        let err = parse_versions(r#"{ "configurations": [] }"#).unwrap_err();
        assert!(err.to_string().contains("Config corrupted"));
    }

    #[test]
    fn test_not_an_object_is_error() {
        assert!(matches!(parse_versions("[1, 2]"), Err(Error::Json(_))));
    }

    #[test]
    fn test_json_version_file_load() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        file.flush().unwrap();

        let source = JsonVersionFile::new(file.path());
        let table = source.load().unwrap();
        assert!(table.resolve("aaaa").is_some());
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let source = JsonVersionFile::new("does/not/exist/versions.json");
        assert!(source.load().unwrap_err().is_not_found());
    }
}

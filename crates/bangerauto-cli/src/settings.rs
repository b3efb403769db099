use bangerauto_core::Settings;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load settings from a TOML file, falling back to defaults.
///
/// A missing file is normal; an unreadable or invalid one is logged.
pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No settings file at {}, using defaults", path.display());
            return Settings::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            return Settings::default();
        }
    };

    match toml::from_str::<Settings>(&content) {
        Ok(settings) => {
            info!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            warn!("Failed to parse {}: {}, using defaults", path.display(), e);
            Settings::default()
        }
    }
}

/// Apply command-line overrides on top of the loaded settings.
pub fn apply_overrides(
    mut settings: Settings,
    versions: Option<PathBuf>,
    process: Option<String>,
) -> Settings {
    if let Some(versions) = versions {
        settings.versions_path = versions;
    }
    if let Some(process) = process {
        settings.process_name = process;
    }
    settings.versions_path = resolve_versions_path(settings.versions_path);
    settings
}

/// A relative version file that is not in the working directory is looked up
/// next to the executable.
fn resolve_versions_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path;
    }

    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&path)));
    match beside_exe {
        Some(candidate) if candidate.exists() => {
            debug!("Using version file {}", candidate.display());
            candidate
        }
        _ => path,
    }
}

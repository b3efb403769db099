//! Version resolution: module fingerprint to signature and offsets.

mod config;
mod file;
mod table;

pub use config::{DecisionRule, VersionConfig};
pub use file::{JsonVersionFile, VersionSource, parse_versions};
pub use table::VersionTable;

#[cfg(test)]
pub(crate) use config::tests::sample_config;

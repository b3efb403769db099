use std::collections::BTreeSet;
use std::time::Duration;

use crate::constants::version::MAX_REASONABLE_OFFSET;
use crate::error::{Error, Result};
use crate::signature::Pattern;

/// How the autoplay flag is derived from the watched values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionRule {
    /// `is_playing && time > 0`, evaluated immediately.
    PlayingWithElapsedTime,
    /// `is_playing`, evaluated only after `delay` has passed since play started.
    ///
    /// For builds that initialise their play state after raising the flag.
    SettleOnStart { delay: Duration },
}

impl DecisionRule {
    pub fn evaluate(&self, is_playing: bool, time: f64) -> bool {
        match self {
            DecisionRule::PlayingWithElapsedTime => is_playing && time > 0.0,
            DecisionRule::SettleOnStart { .. } => is_playing,
        }
    }

    /// Delay to wait on a not-playing to playing edge.
    pub fn settle_delay(&self) -> Option<Duration> {
        match self {
            DecisionRule::PlayingWithElapsedTime => None,
            DecisionRule::SettleOnStart { delay } => Some(*delay),
        }
    }
}

/// Signature and offsets for one supported game build.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionConfig {
    pub pattern: Pattern,
    /// Distance from the flag back to the is-playing byte
    pub is_playing_offset: i32,
    /// Distance from the flag back to the song time
    pub time_offset: i32,
    pub display_name: String,
    /// Module hashes identifying this build
    pub fingerprints: BTreeSet<String>,
    pub settle_delay: Option<Duration>,
}

impl VersionConfig {
    /// Reject configs that could never describe a real build.
    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "'{}': pattern is empty",
                self.display_name
            )));
        }

        for (name, offset) in [
            ("is_playing_offset", self.is_playing_offset),
            ("time_offset", self.time_offset),
        ] {
            if offset == 0 {
                return Err(Error::InvalidConfig(format!(
                    "'{}': {} is zero",
                    self.display_name, name
                )));
            }
            if offset.unsigned_abs() > MAX_REASONABLE_OFFSET.unsigned_abs() {
                return Err(Error::InvalidConfig(format!(
                    "'{}': {} {} exceeds +/-{:#x}",
                    self.display_name, name, offset, MAX_REASONABLE_OFFSET
                )));
            }
        }

        if self.fingerprints.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "'{}': no fingerprints",
                self.display_name
            )));
        }

        Ok(())
    }

    pub fn decision_rule(&self) -> DecisionRule {
        match self.settle_delay {
            Some(delay) => DecisionRule::SettleOnStart { delay },
            None => DecisionRule::PlayingWithElapsedTime,
        }
    }
}

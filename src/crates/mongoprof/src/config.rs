//! Profiling run configuration
//!
//! A run is described once up front and treated as immutable after it starts.
//! Field names on disk keep the report layout's historical JSON keys.

use crate::error::{ProfilerError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Profile size the instance uses when nothing is configured, in megabytes.
/// The records collection is only recreated when the configured size differs.
pub const DEFAULT_PROFILE_SIZE_MB: f64 = 1.0;

/// Which databases a profiling run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSelection {
    /// Every database discovered on the instance
    All,
    /// An explicit set of names, validated against discovery before the run
    Named(Vec<String>),
}

impl DbSelection {
    /// Build a selection from a list of names, empty meaning "all"
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            DbSelection::All
        } else {
            DbSelection::Named(names)
        }
    }
}

impl fmt::Display for DbSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbSelection::All => write!(f, "all"),
            DbSelection::Named(names) => write!(f, "{}", names.join(", ")),
        }
    }
}

impl FromStr for DbSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(DbSelection::All);
        }
        let names = s
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        Ok(DbSelection::from_names(names))
    }
}

impl Serialize for DbSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DbSelection::All => serializer.serialize_str("all"),
            DbSelection::Named(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for DbSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Older manifests stored a comma-joined string instead of an array.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Names(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Names(names) => Ok(DbSelection::Named(names)),
            Repr::Text(text) => text
                .parse()
                .map_err(|_| D::Error::custom("invalid database selection")),
        }
    }
}

/// Configuration of one profiling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingConfig {
    /// Threshold in milliseconds; queries at or above it are recorded.
    /// 0 passes through as "record all operations".
    #[serde(rename = "slowms")]
    pub slow_ms: u64,

    /// Databases the run targets
    #[serde(rename = "dbList")]
    pub databases: DbSelection,

    /// Size of the records collection in megabytes
    #[serde(rename = "profileSizeMB")]
    pub profile_size_mb: f64,

    /// How long each database is profiled, in minutes
    #[serde(rename = "durationMin")]
    pub duration_minutes: f64,

    /// Databases profiled concurrently; 0 runs every target at once
    #[serde(rename = "parallel", default)]
    pub parallelism: usize,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            slow_ms: 100,
            databases: DbSelection::All,
            profile_size_mb: DEFAULT_PROFILE_SIZE_MB,
            duration_minutes: 1.0,
            parallelism: 0,
        }
    }
}

impl ProfilingConfig {
    /// Reject values the instance would misbehave on before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.profile_size_mb <= 0.0 {
            return Err(ProfilerError::Config(format!(
                "profile size must be positive, got {}MB",
                self.profile_size_mb
            )));
        }
        if self.duration_minutes <= 0.0 {
            return Err(ProfilerError::Config(format!(
                "profiling duration must be positive, got {} minute(s)",
                self.duration_minutes
            )));
        }
        if let DbSelection::Named(names) = &self.databases {
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(ProfilerError::Config(
                    "database names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Wall-clock length of the profiling wait
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_minutes * 60.0)
    }

    /// Records collection capacity in bytes
    pub fn profile_size_bytes(&self) -> u64 {
        (self.profile_size_mb * 1024.0 * 1024.0) as u64
    }

    /// Whether the records collection must be recreated with a custom capacity
    pub fn uses_custom_profile_size(&self) -> bool {
        (self.profile_size_mb - DEFAULT_PROFILE_SIZE_MB).abs() > f64::EPSILON
    }

    /// Concurrency cap for a given number of targets; 0 means "no cap"
    pub fn effective_parallelism(&self, targets: usize) -> usize {
        if self.parallelism == 0 {
            targets
        } else {
            self.parallelism
        }
    }

    /// Human-readable one-line description of the run
    pub fn summary(&self) -> String {
        format!(
            "Profiling queries slower than {}ms for {} minute(s) for databases: \"{}\". Profile size set to {}MB",
            self.slow_ms, self.duration_minutes, self.databases, self.profile_size_mb
        )
    }
}

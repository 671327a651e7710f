//! Data entities shared across the profiling pipeline

use crate::config::ProfilingConfig;
use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw profiling record, exactly as the instance's profiler produced it.
/// Nothing in the pipeline parses or reorders these.
pub type ProfileRecord = Document;

/// Everything one database's lifecycle captured
#[derive(Debug, Clone)]
pub struct DatabaseProfileResult {
    /// Database the records belong to
    pub database: String,
    /// Captured records in natural retrieval order
    pub records: Vec<ProfileRecord>,
}

/// One complete profiling run across a set of databases
#[derive(Debug, Clone)]
pub struct ProfileSession {
    /// Fixed when the run starts, before any profiling work
    pub started_at: DateTime<Utc>,
    /// Configuration the run was started with
    pub config: ProfilingConfig,
    /// One result per targeted database
    pub results: Vec<DatabaseProfileResult>,
}

/// On-disk projection of a session's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionManifest {
    #[serde(flatten)]
    pub config: ProfilingConfig,

    /// Session start as unix seconds
    #[serde(rename = "profilingStart")]
    pub profiling_start: i64,
}

impl SessionManifest {
    /// Project a session into its persisted configuration artifact
    pub fn for_session(session: &ProfileSession) -> Self {
        Self {
            config: session.config.clone(),
            profiling_start: session.started_at.timestamp(),
        }
    }
}

/// A session reconstructed from its persisted artifacts
#[derive(Debug, Clone)]
pub struct PersistedSession {
    /// Timestamp-derived directory suffix identifying the session
    pub id: String,
    /// Parsed configuration artifact
    pub manifest: SessionManifest,
    /// Record sequences keyed by database name
    pub profiles: BTreeMap<String, Vec<serde_json::Value>>,
}

//! Time-boxed MongoDB query profiling orchestration
//!
//! mongoprof enables the MongoDB profiler across the databases of a single
//! instance with bounded parallelism, collects the captured records, stores
//! each run as an on-disk session, and aggregates stored sessions into a
//! single report payload.

pub mod cli;
pub mod config;
pub mod connector;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod profiler;
pub mod report;
pub mod store;

// Re-export key types for convenience
pub use config::{DbSelection, ProfilingConfig, DEFAULT_PROFILE_SIZE_MB};
pub use connector::{InstanceCommands, MongoConnector, PROFILE_COLLECTION};
pub use models::{
    DatabaseProfileResult, PersistedSession, ProfileRecord, ProfileSession, SessionManifest,
};
pub use orchestrator::ProfilingOrchestrator;
pub use profiler::DatabaseProfiler;
pub use report::{aggregate, generate_report, SessionReport};
pub use store::{ReportLayout, SessionStore};

// Error types
pub use error::{AggregateFailure, DatabaseFailure, ProfilerError, Result};

//! Error types for mongoprof
//!
//! Provides a unified error type for all profiling operations.

use crate::models::DatabaseProfileResult;
use std::fmt;
use thiserror::Error;

/// Result type alias for profiling operations
pub type Result<T> = std::result::Result<T, ProfilerError>;

/// Main error type for profiling operations
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// Instance unreachable, refused the connection, or timed out
    #[error("failed to connect to MongoDB instance {uri}: {message}")]
    Connection { uri: String, message: String },

    /// Discovery produced an empty target set
    #[error("there are no databases to profile on this MongoDB instance")]
    NoDatabases,

    /// An explicitly requested database is absent from the instance
    #[error("database \"{name}\" does not exist on this MongoDB instance")]
    UnknownDatabase { name: String },

    /// A named collection is absent; callers may treat this as ignorable
    #[error("collection {collection} not found in database {database}")]
    CollectionNotFound { database: String, collection: String },

    /// An instance command failed
    #[error("command failed for database {database}: {message}")]
    Command { database: String, message: String },

    /// Disabling the profiler or dropping its records collection failed
    #[error("cleanup failed for database {database}: {source}")]
    Cleanup {
        database: String,
        #[source]
        source: Box<ProfilerError>,
    },

    /// One or more per-database lifecycles failed
    #[error("{0}")]
    Aggregate(AggregateFailure),

    /// Configuration error
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ProfilerError {
    /// Check if this is a missing-collection error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfilerError::CollectionNotFound { .. })
    }
}

impl From<String> for ProfilerError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

/// Outcome of a profiling run in which at least one database failed.
///
/// Successful results are still attached so the caller can decide what to do
/// with them; the reference persistence policy writes nothing in this case.
#[derive(Debug)]
pub struct AggregateFailure {
    /// Results of the lifecycles that completed
    pub succeeded: Vec<DatabaseProfileResult>,
    /// One entry per lifecycle that failed
    pub failed: Vec<DatabaseFailure>,
}

/// A single database's failed lifecycle
#[derive(Debug)]
pub struct DatabaseFailure {
    /// Database the lifecycle was profiling
    pub database: String,
    /// Error that ended the lifecycle
    pub error: ProfilerError,
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.succeeded.len() + self.failed.len();
        write!(
            f,
            "profiling failed for {} of {} database(s): ",
            self.failed.len(),
            total
        )?;
        for (i, failure) in self.failed.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "\"{}\" ({})", failure.database, failure.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classifier() {
        let err = ProfilerError::CollectionNotFound {
            database: "app".to_string(),
            collection: "system.profile".to_string(),
        };
        assert!(err.is_not_found());

        let err = ProfilerError::Command {
            database: "app".to_string(),
            message: "boom".to_string(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_aggregate_display_names_failed_databases() {
        let failure = AggregateFailure {
            succeeded: vec![],
            failed: vec![
                DatabaseFailure {
                    database: "orders".to_string(),
                    error: ProfilerError::Command {
                        database: "orders".to_string(),
                        message: "cursor torn down".to_string(),
                    },
                },
                DatabaseFailure {
                    database: "users".to_string(),
                    error: ProfilerError::Other("timed out".to_string()),
                },
            ],
        };
        let msg = failure.to_string();
        assert!(msg.contains("2 of 2"));
        assert!(msg.contains("\"orders\""));
        assert!(msg.contains("\"users\""));
        assert!(msg.contains("cursor torn down"));
    }

    #[test]
    fn test_cleanup_error_display() {
        let err = ProfilerError::Cleanup {
            database: "app".to_string(),
            source: Box::new(ProfilerError::Command {
                database: "app".to_string(),
                message: "not authorized".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("cleanup failed for database app"));
        assert!(msg.contains("not authorized"));
    }
}

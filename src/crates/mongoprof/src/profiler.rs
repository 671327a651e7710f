//! Per-database profiling lifecycle
//!
//! Drives the enable/wait/collect/disable sequence for one database and
//! guarantees the profiling state is torn down on every exit path, success
//! or error.

use crate::config::ProfilingConfig;
use crate::connector::{InstanceCommands, PROFILE_COLLECTION};
use crate::error::{ProfilerError, Result};
use crate::models::{DatabaseProfileResult, ProfileRecord};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the profiling lifecycle for a single database
#[derive(Clone)]
pub struct DatabaseProfiler<C> {
    commands: Arc<C>,
    config: ProfilingConfig,
}

impl<C: InstanceCommands> DatabaseProfiler<C> {
    pub fn new(commands: Arc<C>, config: ProfilingConfig) -> Self {
        Self { commands, config }
    }

    /// Profile one database for the configured duration.
    ///
    /// Cleanup (profiling off, records collection dropped) runs whether the
    /// capture succeeded or not. A capture error is re-raised after cleanup
    /// finishes; a cleanup error after a successful capture propagates as
    /// [`ProfilerError::Cleanup`].
    pub async fn profile(&self, database: &str) -> Result<DatabaseProfileResult> {
        debug!(database, "starting profiling lifecycle");

        let captured = self.capture(database).await;
        let cleanup = self.cleanup(database).await;

        match captured {
            Ok(records) => {
                cleanup?;
                debug!(database, records = records.len(), "profiling lifecycle finished");
                Ok(DatabaseProfileResult {
                    database: database.to_string(),
                    records,
                })
            }
            Err(err) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(
                        database,
                        error = %cleanup_err,
                        "cleanup after failed lifecycle also failed"
                    );
                }
                Err(err)
            }
        }
    }

    async fn capture(&self, database: &str) -> Result<Vec<ProfileRecord>> {
        // Start from a clean slate in case an earlier run died mid-lifecycle.
        self.cleanup(database).await?;

        if self.config.uses_custom_profile_size() {
            debug!(
                database,
                size_mb = self.config.profile_size_mb,
                "recreating records collection with custom capacity"
            );
            self.commands
                .create_capped_collection(
                    database,
                    PROFILE_COLLECTION,
                    self.config.profile_size_bytes(),
                )
                .await?;
        }

        self.commands
            .enable_profiling(database, self.config.slow_ms)
            .await?;
        debug!(database, slow_ms = self.config.slow_ms, "profiling enabled");

        tokio::time::sleep(self.config.run_duration()).await;

        // Natural retrieval order, no sort imposed.
        let records = self
            .commands
            .read_collection(database, PROFILE_COLLECTION)
            .await?;
        debug!(database, records = records.len(), "collected profiling records");

        self.commands.disable_profiling(database).await?;

        Ok(records)
    }

    /// Turn profiling off and drop the records collection.
    ///
    /// A missing records collection is not an error; anything else is
    /// surfaced as [`ProfilerError::Cleanup`].
    pub async fn cleanup(&self, database: &str) -> Result<()> {
        if let Err(err) = self.commands.set_profiling_level_off(database).await {
            return Err(cleanup_error(database, err));
        }

        match self
            .commands
            .drop_collection(database, PROFILE_COLLECTION)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(cleanup_error(database, err)),
        }
    }
}

fn cleanup_error(database: &str, source: ProfilerError) -> ProfilerError {
    match source {
        // Already classified; do not wrap twice.
        ProfilerError::Cleanup { .. } => source,
        other => ProfilerError::Cleanup {
            database: database.to_string(),
            source: Box::new(other),
        },
    }
}

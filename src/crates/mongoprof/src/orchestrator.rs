//! Profiling run orchestration
//!
//! Discovers target databases, fans out one profiling lifecycle per target
//! with bounded concurrency, and assembles the results into a session.

use crate::config::{DbSelection, ProfilingConfig};
use crate::connector::InstanceCommands;
use crate::error::{AggregateFailure, DatabaseFailure, ProfilerError, Result};
use crate::models::ProfileSession;
use crate::profiler::DatabaseProfiler;
use crate::store::SessionStore;
use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Coordinates profiling lifecycles across the instance's databases
pub struct ProfilingOrchestrator<C> {
    commands: Arc<C>,
    config: ProfilingConfig,
}

impl<C: InstanceCommands + 'static> ProfilingOrchestrator<C> {
    pub fn new(commands: Arc<C>, config: ProfilingConfig) -> Self {
        Self { commands, config }
    }

    /// Run one complete profiling session.
    ///
    /// Targets are resolved and validated before any profiling command is
    /// issued. At most the configured number of lifecycles is in flight at
    /// once; as one finishes the next pending database starts immediately.
    /// If any lifecycle fails the whole run fails with
    /// [`ProfilerError::Aggregate`], which still carries the successful
    /// results.
    pub async fn run(&self) -> Result<ProfileSession> {
        self.config.validate()?;

        let discovered = self.commands.list_database_names().await?;
        info!(count = discovered.len(), "discovered databases");

        let targets = self.resolve_targets(&discovered)?;
        let started_at = Utc::now();

        let cap = self.config.effective_parallelism(targets.len());
        info!(targets = targets.len(), parallelism = cap, "starting profiling session");

        let semaphore = Arc::new(Semaphore::new(cap));
        let mut names = Vec::with_capacity(targets.len());
        let mut tasks = Vec::with_capacity(targets.len());
        for database in targets {
            let profiler = DatabaseProfiler::new(Arc::clone(&self.commands), self.config.clone());
            let semaphore = Arc::clone(&semaphore);
            let task_db = database.clone();
            names.push(database);
            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(ProfilerError::Other(
                            "profiling scheduler shut down before lifecycle started".to_string(),
                        ))
                    }
                };
                profiler.profile(&task_db).await
            }));
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (database, joined) in names.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(Ok(result)) => succeeded.push(result),
                Ok(Err(err)) => {
                    error!(database = %database, error = %err, "database profiling failed");
                    failed.push(DatabaseFailure {
                        database,
                        error: err,
                    });
                }
                Err(join_err) => {
                    error!(database = %database, error = %join_err, "profiling task aborted");
                    failed.push(DatabaseFailure {
                        database,
                        error: ProfilerError::Other(format!("profiling task aborted: {join_err}")),
                    });
                }
            }
        }

        if failed.is_empty() {
            info!(databases = succeeded.len(), "profiling session finished");
            Ok(ProfileSession {
                started_at,
                config: self.config.clone(),
                results: succeeded,
            })
        } else {
            Err(ProfilerError::Aggregate(AggregateFailure {
                succeeded,
                failed,
            }))
        }
    }

    /// Run a session and persist it, all or nothing.
    ///
    /// Nothing is written when any lifecycle failed; the aggregate error is
    /// returned as-is for the caller to report.
    pub async fn run_and_save(&self, store: &SessionStore) -> Result<(ProfileSession, PathBuf)> {
        let session = self.run().await?;
        let path = store.save(&session).await?;
        Ok((session, path))
    }

    /// Force-reset profiling state on every database of the instance.
    ///
    /// Returns how many databases were cleaned.
    pub async fn cleanup_all(&self) -> Result<usize> {
        let databases = self.commands.list_database_names().await?;

        let cleanups = databases.iter().map(|database| {
            let profiler = DatabaseProfiler::new(Arc::clone(&self.commands), self.config.clone());
            async move { profiler.cleanup(database).await }
        });
        for outcome in join_all(cleanups).await {
            outcome?;
        }

        info!(databases = databases.len(), "profiling state reset");
        Ok(databases.len())
    }

    fn resolve_targets(&self, discovered: &[String]) -> Result<Vec<String>> {
        let targets = match &self.config.databases {
            DbSelection::All => discovered.to_vec(),
            DbSelection::Named(names) => {
                for name in names {
                    if !discovered.iter().any(|db| db == name) {
                        return Err(ProfilerError::UnknownDatabase { name: name.clone() });
                    }
                }
                names.clone()
            }
        };

        if targets.is_empty() {
            return Err(ProfilerError::NoDatabases);
        }
        Ok(targets)
    }
}

//! Shared mock MongoDB instance for integration tests

use async_trait::async_trait;
use mongodb::bson::Document;
use mongoprof::{InstanceCommands, ProfilerError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory stand-in for a MongoDB instance.
///
/// Records every command it receives so tests can assert on ordering, and
/// tracks how many databases hold profiling enabled at once.
#[derive(Default)]
pub struct MockInstance {
    databases: Vec<String>,
    records: HashMap<String, Vec<Document>>,
    read_delays: HashMap<String, Duration>,
    fail_reads: HashSet<String>,
    fail_enables: HashSet<String>,
    fail_drops: HashSet<String>,

    ops: Mutex<Vec<(String, String)>>,
    collections: Mutex<HashSet<String>>,
    enabled: Mutex<HashSet<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockInstance {
    pub fn new(databases: &[&str]) -> Self {
        Self {
            databases: databases.iter().map(|db| db.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Records `read_collection` returns for `database`
    pub fn with_records(mut self, database: &str, records: Vec<Document>) -> Self {
        self.records.insert(database.to_string(), records);
        self
    }

    /// Make `read_collection` fail for `database`
    pub fn fail_read(mut self, database: &str) -> Self {
        self.fail_reads.insert(database.to_string());
        self
    }

    /// Make `enable_profiling` fail for `database`
    pub fn fail_enable(mut self, database: &str) -> Self {
        self.fail_enables.insert(database.to_string());
        self
    }

    /// Make `drop_collection` fail for `database` with a non-ignorable error
    pub fn fail_drop(mut self, database: &str) -> Self {
        self.fail_drops.insert(database.to_string());
        self
    }

    /// Delay `read_collection` for `database`, to skew completion order
    pub fn delay_read(mut self, database: &str, delay: Duration) -> Self {
        self.read_delays.insert(database.to_string(), delay);
        self
    }

    /// Commands issued against `database`, in order
    pub fn ops_for(&self, database: &str) -> Vec<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, db)| db == database)
            .map(|(op, _)| op.clone())
            .collect()
    }

    /// Total number of commands issued
    pub fn op_count(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    /// Most databases that held profiling enabled at the same time
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn log(&self, op: &str, database: &str) {
        self.ops
            .lock()
            .unwrap()
            .push((op.to_string(), database.to_string()));
    }

    fn activate(&self, database: &str) {
        if self.enabled.lock().unwrap().insert(database.to_string()) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
        }
    }

    fn deactivate(&self, database: &str) {
        if self.enabled.lock().unwrap().remove(database) {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl InstanceCommands for MockInstance {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        Ok(self.databases.clone())
    }

    async fn set_profiling_level_off(&self, database: &str) -> Result<()> {
        self.log("set_off", database);
        self.deactivate(database);
        Ok(())
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        self.log("drop", database);
        if self.fail_drops.contains(database) {
            return Err(ProfilerError::Command {
                database: database.to_string(),
                message: "not authorized to drop".to_string(),
            });
        }
        if self.collections.lock().unwrap().remove(database) {
            Ok(())
        } else {
            Err(ProfilerError::CollectionNotFound {
                database: database.to_string(),
                collection: collection.to_string(),
            })
        }
    }

    async fn create_capped_collection(
        &self,
        database: &str,
        _collection: &str,
        _size_bytes: u64,
    ) -> Result<()> {
        self.log("create_capped", database);
        self.collections.lock().unwrap().insert(database.to_string());
        Ok(())
    }

    async fn enable_profiling(&self, database: &str, _slow_ms: u64) -> Result<()> {
        self.log("enable", database);
        if self.fail_enables.contains(database) {
            return Err(ProfilerError::Command {
                database: database.to_string(),
                message: "profiling rejected".to_string(),
            });
        }
        // Enabling recreates the records collection on a real instance.
        self.collections.lock().unwrap().insert(database.to_string());
        self.activate(database);
        Ok(())
    }

    async fn disable_profiling(&self, database: &str) -> Result<()> {
        self.log("disable", database);
        self.deactivate(database);
        Ok(())
    }

    async fn read_collection(&self, database: &str, _collection: &str) -> Result<Vec<Document>> {
        if let Some(delay) = self.read_delays.get(database) {
            tokio::time::sleep(*delay).await;
        }
        self.log("read", database);
        if self.fail_reads.contains(database) {
            return Err(ProfilerError::Command {
                database: database.to_string(),
                message: "cursor torn down".to_string(),
            });
        }
        Ok(self.records.get(database).cloned().unwrap_or_default())
    }
}

//! MongoDB instance access
//!
//! `InstanceCommands` names every command the profiling engine issues, so the
//! engine never touches the driver directly; `MongoConnector` is the driver
//! implementation used by the CLI.

use crate::error::{ProfilerError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::Client;
use std::time::Duration;
use tracing::debug;

/// Collection the instance writes profiling records into
pub const PROFILE_COLLECTION: &str = "system.profile";

/// Fixed timeout for establishing a connection
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Idle allowance added to the run duration so a connection is not reclaimed
/// mid-wait
const IDLE_SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Server error code for a missing namespace
const NAMESPACE_NOT_FOUND: i32 = 26;

/// Commands the profiling engine issues against an instance.
///
/// Implementations must be safe to call from concurrently running lifecycles;
/// each lifecycle only ever touches its own database.
#[async_trait]
pub trait InstanceCommands: Send + Sync {
    /// List every database name on the instance (admin scope)
    async fn list_database_names(&self) -> Result<Vec<String>>;

    /// Set the profiling level of `database` to off
    async fn set_profiling_level_off(&self, database: &str) -> Result<()>;

    /// Drop `collection`; absent collections surface as
    /// [`ProfilerError::CollectionNotFound`]
    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()>;

    /// Create `collection` as a fixed-capacity collection of `size_bytes`
    async fn create_capped_collection(
        &self,
        database: &str,
        collection: &str,
        size_bytes: u64,
    ) -> Result<()>;

    /// Enable profiling with the given slow-query threshold in milliseconds
    async fn enable_profiling(&self, database: &str, slow_ms: u64) -> Result<()>;

    /// Disable profiling
    async fn disable_profiling(&self, database: &str) -> Result<()>;

    /// Read every document from `collection` in natural retrieval order
    async fn read_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>>;
}

/// Driver-backed connection to a single MongoDB instance.
///
/// The driver pools connections internally, which stands in for per-call
/// re-acquisition; the idle timeout is sized to outlive the profiling wait.
pub struct MongoConnector {
    uri: String,
    client: Client,
}

impl MongoConnector {
    /// Connect to an instance, verifying reachability with an admin ping.
    ///
    /// When `run_duration` is given, pooled connections are allowed to idle
    /// for the whole run plus a safety margin.
    pub async fn connect(uri: &str, run_duration: Option<Duration>) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|err| connection_error(uri, &err))?;
        options.direct_connection = Some(true);
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        if let Some(duration) = run_duration {
            options.max_idle_time = Some(duration + IDLE_SAFETY_MARGIN);
        }

        let client = Client::with_options(options).map_err(|err| connection_error(uri, &err))?;

        // The driver connects lazily; a ping surfaces refusals and timeouts now.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|err| connection_error(uri, &err))?;

        debug!(uri, "connected to MongoDB instance");
        Ok(Self {
            uri: uri.to_string(),
            client,
        })
    }

    /// Connection string this connector was built from
    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn set_profile_level(&self, database: &str, level: i32) -> Result<()> {
        self.client
            .database(database)
            .run_command(doc! { "profile": level })
            .await
            .map_err(|err| command_error(database, &err))?;
        Ok(())
    }
}

#[async_trait]
impl InstanceCommands for MongoConnector {
    async fn list_database_names(&self) -> Result<Vec<String>> {
        self.client
            .list_database_names()
            .await
            .map_err(|err| command_error("admin", &err))
    }

    async fn set_profiling_level_off(&self, database: &str) -> Result<()> {
        self.set_profile_level(database, 0).await
    }

    async fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        self.client
            .database(database)
            .collection::<Document>(collection)
            .drop()
            .await
            .map_err(|err| {
                if is_namespace_not_found(&err) {
                    ProfilerError::CollectionNotFound {
                        database: database.to_string(),
                        collection: collection.to_string(),
                    }
                } else {
                    command_error(database, &err)
                }
            })
    }

    async fn create_capped_collection(
        &self,
        database: &str,
        collection: &str,
        size_bytes: u64,
    ) -> Result<()> {
        self.client
            .database(database)
            .create_collection(collection)
            .capped(true)
            .size(size_bytes)
            .await
            .map_err(|err| command_error(database, &err))
    }

    async fn enable_profiling(&self, database: &str, slow_ms: u64) -> Result<()> {
        self.client
            .database(database)
            .run_command(doc! { "profile": 1, "slowms": slow_ms as i64 })
            .await
            .map_err(|err| command_error(database, &err))?;
        Ok(())
    }

    async fn disable_profiling(&self, database: &str) -> Result<()> {
        self.set_profile_level(database, 0).await
    }

    async fn read_collection(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .await
            .map_err(|err| command_error(database, &err))?;

        cursor
            .try_collect()
            .await
            .map_err(|err| command_error(database, &err))
    }
}

fn connection_error(uri: &str, err: &mongodb::error::Error) -> ProfilerError {
    ProfilerError::Connection {
        uri: uri.to_string(),
        message: err.to_string(),
    }
}

fn command_error(database: &str, err: &mongodb::error::Error) -> ProfilerError {
    ProfilerError::Command {
        database: database.to_string(),
        message: err.to_string(),
    }
}

fn is_namespace_not_found(err: &mongodb::error::Error) -> bool {
    match *err.kind {
        ErrorKind::Command(ref failure) => {
            failure.code == NAMESPACE_NOT_FOUND || failure.message.contains("ns not found")
        }
        _ => false,
    }
}

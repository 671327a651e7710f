//! On-disk session persistence
//!
//! Each session is a directory under the reports root: a configuration
//! artifact plus one record file per database. The layout is explicit
//! construction state, not globals, so tests can point a store anywhere.

use crate::error::{ProfilerError, Result};
use crate::models::{PersistedSession, ProfileSession, SessionManifest};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Directory-name timestamp, second precision
const FOLDER_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H_%M_%S";

/// Naming scheme of the reports directory tree
#[derive(Debug, Clone)]
pub struct ReportLayout {
    /// Directory session folders live under
    pub root: PathBuf,
    /// Prefix of every session folder
    pub report_folder_prefix: String,
    /// Prefix of every per-database record file
    pub profile_file_prefix: String,
    /// Name of the configuration artifact inside a session folder
    pub config_file_name: String,
}

impl ReportLayout {
    /// Standard layout rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("profiling-reports"),
            report_folder_prefix: "REPORT_".to_string(),
            profile_file_prefix: "PROFILE_".to_string(),
            config_file_name: "_PROFILER_CONFIG_.json".to_string(),
        }
    }
}

/// Persists profiling sessions and reads them back
pub struct SessionStore {
    layout: ReportLayout,
}

impl SessionStore {
    pub fn new(layout: ReportLayout) -> Self {
        Self { layout }
    }

    /// Directory session folders live under
    pub fn root(&self) -> &Path {
        &self.layout.root
    }

    /// Write a session to disk and return its directory.
    ///
    /// The folder name is derived from the session start with second
    /// precision; two sessions starting within the same second are not
    /// handled.
    pub async fn save(&self, session: &ProfileSession) -> Result<PathBuf> {
        let folder = format!(
            "{}{}",
            self.layout.report_folder_prefix,
            session.started_at.format(FOLDER_TIMESTAMP_FORMAT)
        );
        let session_dir = self.layout.root.join(folder);
        fs::create_dir_all(&session_dir).await?;

        let manifest = SessionManifest::for_session(session);
        fs::write(
            session_dir.join(&self.layout.config_file_name),
            serde_json::to_vec(&manifest)?,
        )
        .await?;

        for result in &session.results {
            let file = format!(
                "{}{}.json",
                self.layout.profile_file_prefix, result.database
            );
            fs::write(
                session_dir.join(file),
                serde_json::to_vec_pretty(&result.records)?,
            )
            .await?;
        }

        info!(
            path = %session_dir.display(),
            databases = session.results.len(),
            "profiling session saved"
        );
        Ok(session_dir)
    }

    /// Load every persisted session, ordered by session timestamp.
    ///
    /// A missing reports root means no sessions have been saved yet.
    pub async fn load_all(&self) -> Result<Vec<PersistedSession>> {
        let mut folders = Vec::new();
        let mut dir = match fs::read_dir(&self.layout.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir()
                && name.starts_with(&self.layout.report_folder_prefix)
            {
                folders.push(name);
            }
        }
        folders.sort();

        let mut sessions = Vec::with_capacity(folders.len());
        for folder in &folders {
            sessions.push(self.load_session(folder).await?);
        }
        debug!(sessions = sessions.len(), "loaded persisted sessions");
        Ok(sessions)
    }

    /// Delete every session folder under the root.
    ///
    /// Idempotent: an absent root or folder is not an error. Returns how
    /// many folders were deleted.
    pub async fn remove_all(&self) -> Result<usize> {
        let mut dir = match fs::read_dir(&self.layout.root).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let mut removed = 0;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type().await?.is_dir()
                || !name.starts_with(&self.layout.report_folder_prefix)
            {
                continue;
            }
            match fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        info!(removed, "session folders deleted");
        Ok(removed)
    }

    async fn load_session(&self, folder: &str) -> Result<PersistedSession> {
        let dir = self.layout.root.join(folder);

        let manifest_bytes = fs::read(dir.join(&self.layout.config_file_name)).await?;
        let manifest: SessionManifest = serde_json::from_slice(&manifest_bytes).map_err(|err| {
            ProfilerError::Config(format!(
                "invalid configuration artifact in {}: {err}",
                dir.display()
            ))
        })?;

        let mut profiles = BTreeMap::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file = entry.file_name().to_string_lossy().into_owned();
            let database = match file
                .strip_prefix(&self.layout.profile_file_prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                Some(name) => name.to_string(),
                None => continue,
            };
            let records: Vec<serde_json::Value> =
                serde_json::from_slice(&fs::read(entry.path()).await?)?;
            profiles.insert(database, records);
        }

        let id = folder
            .strip_prefix(&self.layout.report_folder_prefix)
            .unwrap_or(folder)
            .to_string();
        Ok(PersistedSession {
            id,
            manifest,
            profiles,
        })
    }
}

//! Session aggregation and report generation
//!
//! Flattens persisted sessions into the payload an external page renders.
//! No cross-session computation happens here.

use crate::error::Result;
use crate::models::{PersistedSession, SessionManifest};
use crate::store::SessionStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Static page the payload is substituted into
const REPORT_TEMPLATE: &str = include_str!("assets/results-template.html");

/// Token the serialized payload replaces in the template
const PAYLOAD_PLACEHOLDER: &str = "{REPORTS_ARRAY_PLACEHOLDER}";

/// One session's slice of the report payload
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Timestamp-derived session identifier
    #[serde(rename = "profileId")]
    pub session_id: String,

    /// Configuration the session ran with
    #[serde(rename = "profilerConfig")]
    pub config: SessionManifest,

    /// Record sequences keyed by database name
    pub profiles: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Label each loaded session for rendering, preserving session order
pub fn aggregate(sessions: Vec<PersistedSession>) -> Vec<SessionReport> {
    sessions
        .into_iter()
        .map(|session| SessionReport {
            session_id: session.id,
            config: session.manifest,
            profiles: session.profiles,
        })
        .collect()
}

/// Build the HTML report from every persisted session and write it to
/// `output`. Returns how many sessions the report covers.
pub async fn generate_report(store: &SessionStore, output: &Path) -> Result<usize> {
    let sessions = store.load_all().await?;
    let payload = aggregate(sessions);
    let count = payload.len();

    let json = serde_json::to_string(&payload)?;
    let html = REPORT_TEMPLATE.replace(PAYLOAD_PLACEHOLDER, &json);
    fs::write(output, html).await?;

    info!(sessions = count, path = %output.display(), "report generated");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DbSelection, ProfilingConfig};

    fn manifest() -> SessionManifest {
        SessionManifest {
            config: ProfilingConfig {
                slow_ms: 100,
                databases: DbSelection::All,
                profile_size_mb: 1.0,
                duration_minutes: 1.0,
                parallelism: 0,
            },
            profiling_start: 1_772_000_000,
        }
    }

    #[test]
    fn test_aggregate_labels_without_merging() {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "orders".to_string(),
            vec![serde_json::json!({"op": "query"})],
        );
        let sessions = vec![
            PersistedSession {
                id: "20260301_14_30_05".to_string(),
                manifest: manifest(),
                profiles,
            },
            PersistedSession {
                id: "20260302_09_00_00".to_string(),
                manifest: manifest(),
                profiles: BTreeMap::new(),
            },
        ];

        let payload = aggregate(sessions);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].session_id, "20260301_14_30_05");
        assert_eq!(payload[0].profiles["orders"].len(), 1);
        assert!(payload[1].profiles.is_empty());
    }

    #[test]
    fn test_payload_uses_rendering_keys() {
        let payload = aggregate(vec![PersistedSession {
            id: "20260301_14_30_05".to_string(),
            manifest: manifest(),
            profiles: BTreeMap::new(),
        }]);

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value[0]["profileId"], "20260301_14_30_05");
        assert!(value[0]["profilerConfig"]["slowms"].is_u64());
        assert!(value[0]["profiles"].is_object());
    }

    #[test]
    fn test_template_carries_placeholder() {
        assert!(REPORT_TEMPLATE.contains(PAYLOAD_PLACEHOLDER));
    }
}

//! Cleanup command handlers

use crate::config::ProfilingConfig;
use crate::connector::MongoConnector;
use crate::error::Result;
use crate::orchestrator::ProfilingOrchestrator;
use crate::store::{ReportLayout, SessionStore};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle the cleanup-reports command: delete every stored session
pub async fn handle_cleanup_reports(reports_dir: PathBuf) -> Result<()> {
    let store = SessionStore::new(ReportLayout::with_root(reports_dir));

    let removed = store.remove_all().await?;
    if removed == 0 {
        println!("{}", "No report folders found to delete".yellow());
    } else {
        println!(
            "{}",
            format!("✓ Deleted {removed} report folder(s)").green().bold()
        );
    }
    Ok(())
}

/// Handle the cleanup-profiling command: reset profiling state on every
/// database of the instance
pub async fn handle_cleanup_profiling(uri: String) -> Result<()> {
    println!("Connecting MongoDB instance {}", uri);
    let connector = MongoConnector::connect(&uri, None).await?;

    let orchestrator =
        ProfilingOrchestrator::new(Arc::new(connector), ProfilingConfig::default());
    let cleaned = orchestrator.cleanup_all().await?;

    println!(
        "{}",
        format!("✓ Profiling state reset on {cleaned} database(s)")
            .green()
            .bold()
    );
    Ok(())
}

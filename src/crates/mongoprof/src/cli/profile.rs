//! Profile command handler

use crate::config::ProfilingConfig;
use crate::connector::MongoConnector;
use crate::error::{ProfilerError, Result};
use crate::orchestrator::ProfilingOrchestrator;
use crate::store::{ReportLayout, SessionStore};
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Handle the profile command: run a session and persist it on success
pub async fn handle_profile(uri: String, config: ProfilingConfig, reports_dir: PathBuf) -> Result<()> {
    config.validate()?;

    println!("Connecting MongoDB instance {}", uri);
    let connector = MongoConnector::connect(&uri, Some(config.run_duration())).await?;

    let orchestrator = ProfilingOrchestrator::new(Arc::new(connector), config.clone());
    let store = SessionStore::new(ReportLayout::with_root(reports_dir));

    println!("{}", config.summary());

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(match config.parallelism {
        0 => "Profiling databases (all in parallel)".to_string(),
        cap => format!("Profiling databases (batch size: {cap})"),
    });

    match orchestrator.run_and_save(&store).await {
        Ok((session, path)) => {
            spinner.finish_and_clear();
            println!("{}", "✓ Profiling finished".green().bold());
            println!("  Databases: {}", session.results.len());
            println!("  Session:   {}", path.display());
            Ok(())
        }
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("{}", format!("✗ Profiling error: {err}").red());
            if let ProfilerError::Aggregate(ref failure) = err {
                for failed in &failure.failed {
                    eprintln!("  {}: {}", failed.database.red().bold(), failed.error);
                }
            }
            Err(err)
        }
    }
}

//! Report command handler

use crate::error::Result;
use crate::report::generate_report;
use crate::store::{ReportLayout, SessionStore};
use colored::Colorize;
use std::path::PathBuf;

/// Handle the report command: aggregate all sessions into the HTML page
pub async fn handle_report(output: PathBuf, reports_dir: PathBuf) -> Result<()> {
    let store = SessionStore::new(ReportLayout::with_root(reports_dir));

    let sessions = generate_report(&store, &output).await?;
    if sessions == 0 {
        println!("{}", "No profiling sessions found".yellow());
    }
    println!("{}", "✓ Report generated".green().bold());
    println!("  Sessions: {}", sessions);
    println!("  Output:   {}", output.display());
    Ok(())
}

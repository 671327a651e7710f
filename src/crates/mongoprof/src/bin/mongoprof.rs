//! mongoprof CLI - time-boxed MongoDB query profiling
//!
//! Main entry point for the mongoprof command-line tool.

use clap::{Parser, Subcommand};
use mongoprof::{DbSelection, ProfilingConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mongoprof")]
#[command(about = "Time-boxed MongoDB query profiling with session reports", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile slow queries across the instance's databases
    Profile {
        /// MongoDB connection string
        #[arg(long)]
        uri: String,

        /// Slow query threshold in milliseconds (0 records all operations)
        #[arg(long, default_value_t = 100)]
        slowms: u64,

        /// Databases to profile: "all" or a comma-separated list of names
        #[arg(long, default_value = "all")]
        databases: DbSelection,

        /// system.profile collection size in megabytes
        #[arg(long, default_value_t = 1.0)]
        max_profile_size: f64,

        /// Profiling duration in minutes
        #[arg(long, default_value_t = 1.0)]
        duration: f64,

        /// Databases profiled concurrently (0 = all at once)
        #[arg(long, default_value_t = 0)]
        parallel: usize,

        /// Directory session reports are stored under
        #[arg(long, default_value = "profiling-reports")]
        reports_dir: PathBuf,
    },

    /// Build the HTML report from every stored session
    Report {
        /// Output HTML file
        #[arg(short, long, default_value = "profiling-results.html")]
        output: PathBuf,

        /// Directory session reports are stored under
        #[arg(long, default_value = "profiling-reports")]
        reports_dir: PathBuf,
    },

    /// Delete every stored session report
    CleanupReports {
        /// Directory session reports are stored under
        #[arg(long, default_value = "profiling-reports")]
        reports_dir: PathBuf,
    },

    /// Reset profiling state on every database of the instance
    CleanupProfiling {
        /// MongoDB connection string
        #[arg(long)]
        uri: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            uri,
            slowms,
            databases,
            max_profile_size,
            duration,
            parallel,
            reports_dir,
        } => {
            let config = ProfilingConfig {
                slow_ms: slowms,
                databases,
                profile_size_mb: max_profile_size,
                duration_minutes: duration,
                parallelism: parallel,
            };
            mongoprof::cli::profile::handle_profile(uri, config, reports_dir).await?;
        }
        Commands::Report {
            output,
            reports_dir,
        } => {
            mongoprof::cli::report::handle_report(output, reports_dir).await?;
        }
        Commands::CleanupReports { reports_dir } => {
            mongoprof::cli::cleanup::handle_cleanup_reports(reports_dir).await?;
        }
        Commands::CleanupProfiling { uri } => {
            mongoprof::cli::cleanup::handle_cleanup_profiling(uri).await?;
        }
    }

    Ok(())
}

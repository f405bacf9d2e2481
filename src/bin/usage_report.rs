//! Workbook usage report - scheduled run
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin usage_report -- --lookback_days 90
//! ```
//!
//! ## Files
//!
//! - config/.env - server + personal access token settings
//! - config/config.yml - user ignore list
//! - config/query.txt - Metadata API query, sent verbatim
//!
//! ## Environment Variables
//!
//! - TABLEAU_SERVER, TABLEAU_SERVER_NAME, TABLEAU_SITE_ID, TABLEAU_VERSION
//! - TABLEAU_PERSONAL_ACCESS_TOKEN_NAME, TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET
//! - HYPERD_PATH - hyperd executable (default: hyperd on PATH)
//! - HYPER_STARTUP_TIMEOUT_SECS - wait for hyperd to accept connections (default: 30)
//! - RUST_LOG - Logging level (optional, default: info)

use clap::Parser;
use std::path::Path;
use std::time::{Duration, Instant};
use tableau_usage::config::{
    self, AppConfig, RunSettings, ServerConfig, DEFAULT_APP_CONFIG_PATH, DEFAULT_ENV_PATH,
    DEFAULT_LOOKBACK_DAYS, DEFAULT_QUERY_PATH,
};
use tableau_usage::extract::HyperdEngine;

/// Query workbook metadata and usage events, and write the merged usage report.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Number of lookback days of usage events to aggregate
    #[arg(long = "lookback_days", default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback_days: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    config::load_env_file(Path::new(DEFAULT_ENV_PATH));

    if let Err(e) = run(cli).await {
        log::error!("❌ Run failed: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();

    let server = ServerConfig::from_env()?;
    let app = AppConfig::load(Path::new(DEFAULT_APP_CONFIG_PATH))?;
    let query = config::load_query(Path::new(DEFAULT_QUERY_PATH))?;
    let settings = RunSettings::for_today(cli.lookback_days);

    log::info!("🚀 Starting workbook usage report");
    log::info!("   ├─ Server: {} ({})", server.server_name, server.server_url);
    log::info!(
        "   ├─ Site: {}",
        if server.site_id.is_empty() { "<default>" } else { server.site_id.as_str() }
    );
    log::info!("   ├─ API version: {}", server.api_version);
    log::info!(
        "   ├─ Ignore list: {} ({} users)",
        if app.user_ignore_list.enabled { "enabled" } else { "disabled" },
        app.user_ignore_list.users_email.len()
    );
    log::info!("   ├─ Lookback: {} days", settings.lookback_days);
    log::info!("   └─ Lookback date for event logs: {}", settings.lookback_date);

    let engine = HyperdEngine::new(settings.hyper.clone());
    let summary = tableau_usage::run(&server, &app, &query, &settings, &engine).await?;

    log::info!("✅ Report complete: {}", summary.output_dir.display());
    log::info!("   ├─ Workbooks: {}", summary.workbook_count);
    log::info!("   ├─ Metadata rows: {}", summary.metadata_rows);
    log::info!(
        "   ├─ Events: {} ({} ignored)",
        summary.event_rows,
        summary.ignored_rows
    );
    log::info!("   ├─ Workbooks with usage: {}", summary.usage_groups);
    log::info!(
        "   └─ Merged rows: {} ({} with usage)",
        summary.merged_rows,
        summary.matched_rows
    );
    log::info!("Duration {}", format_elapsed(started.elapsed()));
    Ok(())
}

/// `H:MM:SS`, rounded to the second
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64().round() as u64;
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(400)), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(61_600)), "0:01:02");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 5)), "3:00:05");
    }

    #[test]
    fn test_cli_default_lookback() {
        let cli = Cli::try_parse_from(["usage_report"]).unwrap();
        assert_eq!(cli.lookback_days, 180);
    }

    #[test]
    fn test_cli_lookback_flag() {
        let cli = Cli::try_parse_from(["usage_report", "--lookback_days", "90"]).unwrap();
        assert_eq!(cli.lookback_days, 90);
        assert!(Cli::try_parse_from(["usage_report", "--lookback_days", "-3"]).is_err());
        assert!(Cli::try_parse_from(["usage_report", "--other"]).is_err());
    }
}

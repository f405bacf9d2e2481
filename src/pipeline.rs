//! End-to-end reporting run
//!
//! ```text
//! serverinfo → sign in
//!   → metadata query → flatten → workbooks_metadata_<ts>.json
//!   → list data sources → "TS Events" → download .tdsx
//!   → unpack + decode extract → ignore list → full events CSV
//!   → date/item filter → group → usage CSV
//!   → left join → merged CSV
//! → sign out
//! ```
//!
//! Strictly sequential; the first failure aborts the run. Artifacts written
//! before the failure stay on disk.

use crate::config::{AppConfig, RunSettings, ServerConfig};
use crate::error::ReportError;
use crate::extract::{decode_events_extract, ExtractEngine};
use crate::report::{
    aggregate_usage, events_from_table, flatten_workbooks, merge_usage, IgnoreList, RunOutput,
    WorkbookRecord,
};
use crate::tableau::{self, Session, TableauClient};
use chrono::Local;
use std::path::PathBuf;

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub workbook_count: usize,
    pub metadata_rows: usize,
    pub event_rows: usize,
    pub ignored_rows: usize,
    pub usage_groups: usize,
    pub merged_rows: usize,
    pub matched_rows: usize,
    pub artifacts: Vec<PathBuf>,
}

/// Run the whole report against the server described by `server`.
pub async fn run(
    server: &ServerConfig,
    app: &AppConfig,
    query: &str,
    settings: &RunSettings,
    engine: &dyn ExtractEngine,
) -> Result<RunSummary, ReportError> {
    let mut client = TableauClient::new(server)?;
    client.use_server_version().await?;
    let client = &client;

    tableau::with_session(client, server, |session| async move {
        run_signed_in(client, &session, app, query, settings, engine).await
    })
    .await
}

async fn run_signed_in(
    client: &TableauClient,
    session: &Session,
    app: &AppConfig,
    query: &str,
    settings: &RunSettings,
    engine: &dyn ExtractEngine,
) -> Result<RunSummary, ReportError> {
    let mut artifacts = Vec::new();

    // Metadata
    let raw_workbooks = tableau::fetch_workbooks(client, session, query).await?;
    let output = RunOutput::create(&settings.results_root, &Local::now())?;

    let records: Vec<WorkbookRecord> = raw_workbooks.iter().map(WorkbookRecord::from_value).collect();
    let metadata = flatten_workbooks(&records);
    log::info!(
        "📋 Flattened {} workbooks into {} metadata rows",
        records.len(),
        metadata.len()
    );
    artifacts.push(output.write_metadata_json(&raw_workbooks)?);

    // Events extract
    let datasources = tableau::list_datasources(client, session).await?;
    let events_source = tableau::find_unique_by_name(&datasources, &settings.events_datasource)?;
    let package = output.package_path();
    tableau::download_datasource(client, session, events_source, &package).await?;

    let mut events_table = decode_events_extract(&package, &output.unpack_dir(), engine).await?;

    let ignore = IgnoreList::new(&app.user_ignore_list);
    let ignored_rows = ignore.apply(&mut events_table)?;
    if ignored_rows > 0 {
        log::info!("🚫 Dropped {} events from ignored users", ignored_rows);
    }
    artifacts.push(output.write_full_events_csv(&events_table)?);

    // Aggregation
    let events = events_from_table(&events_table)?;
    let usage = aggregate_usage(&events, settings.lookback_date);
    log::info!("📊 {} workbooks with usage since {}", usage.len(), settings.lookback_date);
    artifacts.push(output.write_usage_csv(&usage)?);

    // Report
    let merged = merge_usage(&metadata, &usage);
    let matched_rows = merged.iter().filter(|row| row.has_usage()).count();
    artifacts.push(output.write_merged_csv(&merged)?);

    Ok(RunSummary {
        output_dir: output.dir().to_path_buf(),
        workbook_count: records.len(),
        metadata_rows: metadata.len(),
        event_rows: events.len(),
        ignored_rows,
        usage_groups: usage.len(),
        merged_rows: merged.len(),
        matched_rows,
        artifacts,
    })
}

//! Per-run output directory and artifact writers
//!
//! Layout under `results/<ts>/`:
//! - `workbooks_metadata_<ts>.json`
//! - `TS_Events.hyper.tdsx` + `extracted_tdsx/` (working files)
//! - `full_hyper_tableau_events_database_data.csv`
//! - `workbooks_usage_events_count_<ts>.csv`
//! - `merged_workbooks_metadata_<ts>.csv`

use super::merge::MergedRow;
use super::usage::UsageRow;
use crate::error::ReportError;
use crate::extract::ExtractTable;
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
pub const PACKAGE_FILE: &str = "TS_Events.hyper.tdsx";
pub const UNPACK_DIR: &str = "extracted_tdsx";
pub const FULL_EVENTS_FILE: &str = "full_hyper_tableau_events_database_data.csv";

/// Output directory of one run; every artifact name shares its timestamp
#[derive(Debug, Clone)]
pub struct RunOutput {
    dir: PathBuf,
    timestamp: String,
}

impl RunOutput {
    /// Create `<root>/<timestamp>/` (and parents)
    pub fn create<Tz: TimeZone>(root: &Path, started_at: &DateTime<Tz>) -> Result<Self, ReportError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = started_at.format(TIMESTAMP_FORMAT).to_string();
        let dir = root.join(&timestamp);
        fs::create_dir_all(&dir)?;
        log::info!("📁 Output directory: {}", dir.display());
        Ok(Self { dir, timestamp })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn package_path(&self) -> PathBuf {
        self.dir.join(PACKAGE_FILE)
    }

    pub fn unpack_dir(&self) -> PathBuf {
        self.dir.join(UNPACK_DIR)
    }

    pub fn metadata_json_path(&self) -> PathBuf {
        self.dir
            .join(format!("workbooks_metadata_{}.json", self.timestamp))
    }

    pub fn full_events_csv_path(&self) -> PathBuf {
        self.dir.join(FULL_EVENTS_FILE)
    }

    pub fn usage_csv_path(&self) -> PathBuf {
        self.dir
            .join(format!("workbooks_usage_events_count_{}.csv", self.timestamp))
    }

    pub fn merged_csv_path(&self) -> PathBuf {
        self.dir
            .join(format!("merged_workbooks_metadata_{}.csv", self.timestamp))
    }

    /// Raw workbook records, pretty-printed
    pub fn write_metadata_json(&self, workbooks: &[Value]) -> Result<PathBuf, ReportError> {
        let path = self.metadata_json_path();
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, workbooks)?;
        writer.flush()?;
        log::info!("💾 JSON file saved as {}", path.display());
        Ok(path)
    }

    /// Every decoded event row (after the ignore list), all columns
    pub fn write_full_events_csv(&self, table: &ExtractTable) -> Result<PathBuf, ReportError> {
        let path = self.full_events_csv_path();
        let mut writer = csv::Writer::from_path(&path)?;
        if !table.columns.is_empty() {
            writer.write_record(&table.columns)?;
        }
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        log::info!("💾 CSV file saved as {} ({} rows)", path.display(), table.len());
        Ok(path)
    }

    pub fn write_usage_csv(&self, rows: &[UsageRow]) -> Result<PathBuf, ReportError> {
        let path = self.usage_csv_path();
        write_records(&path, UsageRow::HEADER, rows)?;
        log::info!("💾 CSV file saved as {} ({} rows)", path.display(), rows.len());
        Ok(path)
    }

    pub fn write_merged_csv(&self, rows: &[MergedRow]) -> Result<PathBuf, ReportError> {
        let path = self.merged_csv_path();
        write_records(&path, MergedRow::HEADER, rows)?;
        log::info!("💾 CSV file saved as {} ({} rows)", path.display(), rows.len());
        Ok(path)
    }
}

/// Header first (even with no rows), then one serialized record per row
fn write_records<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

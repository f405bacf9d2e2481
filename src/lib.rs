//! Workbook usage reporting for an analytics server
//!
//! One run = one sequential pass:
//! sign in → workbook metadata → usage events extract → per-workbook usage →
//! merged report files under `results/<timestamp>/` → sign out.
//!
//! ## Module Organization
//!
//! - `config` - env settings, YAML app config, query file, run settings
//! - `tableau` - REST / Metadata API client (auth, metadata, data sources)
//! - `extract` - `.tdsx` unpacking and extract decoding via an external engine
//! - `report` - flattening, usage aggregation, merge, artifact writers
//! - `pipeline` - the end-to-end run

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod tableau;

pub use config::{AppConfig, RunSettings, ServerConfig};
pub use error::ReportError;
pub use pipeline::{run, RunSummary};

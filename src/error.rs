//! Run-level error: any failure aborts the whole run

use crate::config::ConfigError;
use crate::extract::ExtractError;
use crate::tableau::TableauError;

#[derive(Debug)]
pub enum ReportError {
    Config(ConfigError),
    Tableau(TableauError),
    Extract(ExtractError),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl From<ConfigError> for ReportError {
    fn from(err: ConfigError) -> Self {
        ReportError::Config(err)
    }
}

impl From<TableauError> for ReportError {
    fn from(err: TableauError) -> Self {
        ReportError::Tableau(err)
    }
}

impl From<ExtractError> for ReportError {
    fn from(err: ExtractError) -> Self {
        ReportError::Extract(err)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err)
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Config(e) => write!(f, "Configuration error: {}", e),
            ReportError::Tableau(e) => write!(f, "Server error: {}", e),
            ReportError::Extract(e) => write!(f, "Extract error: {}", e),
            ReportError::Io(e) => write!(f, "IO error: {}", e),
            ReportError::Csv(e) => write!(f, "CSV error: {}", e),
            ReportError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Config(e) => Some(e),
            ReportError::Tableau(e) => Some(e),
            ReportError::Extract(e) => Some(e),
            ReportError::Io(e) => Some(e),
            ReportError::Csv(e) => Some(e),
            ReportError::Json(e) => Some(e),
        }
    }
}

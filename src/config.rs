//! Run configuration
//!
//! Everything the run needs is loaded once at startup into plain structs and
//! handed to each component explicitly:
//! - `ServerConfig` - server connection + personal access token (env, `config/.env`)
//! - `AppConfig` - ignore list (`config/config.yml`)
//! - query text (`config/query.txt`)
//! - `RunSettings` - lookback window, output root, extract engine settings

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENV_PATH: &str = "config/.env";
pub const DEFAULT_APP_CONFIG_PATH: &str = "config/config.yml";
pub const DEFAULT_QUERY_PATH: &str = "config/query.txt";
pub const DEFAULT_RESULTS_ROOT: &str = "results";

/// Name of the published data source holding the usage events extract
pub const EVENTS_DATASOURCE_NAME: &str = "TS Events";

pub const DEFAULT_LOOKBACK_DAYS: u32 = 180;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
    Io { path: PathBuf, source: std::io::Error },
    Yaml { path: PathBuf, source: serde_yaml::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            ConfigError::Yaml { path, source } => {
                write!(f, "Failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Yaml { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Analytics server connection settings
#[derive(Clone)]
pub struct ServerConfig {
    pub server_url: String,
    pub server_name: String,
    /// Site content URL; empty string selects the default site
    pub site_id: String,
    pub api_version: String,
    pub token_name: String,
    pub token_secret: String,
}

// Keeps the token secret out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_url", &self.server_url)
            .field("server_name", &self.server_name)
            .field("site_id", &self.site_id)
            .field("api_version", &self.api_version)
            .field("token_name", &self.token_name)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Load server settings from environment variables
    ///
    /// Environment variables:
    /// - `TABLEAU_SERVER` (required, http:// or https://)
    /// - `TABLEAU_SERVER_NAME` (optional display name, default: server URL)
    /// - `TABLEAU_SITE_ID` (optional, default: "" = default site)
    /// - `TABLEAU_VERSION` (required, REST API version e.g. 3.19)
    /// - `TABLEAU_PERSONAL_ACCESS_TOKEN_NAME` (required)
    /// - `TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET` (required)
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = required("TABLEAU_SERVER")?;
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "TABLEAU_SERVER must start with http:// or https://".to_string(),
            ));
        }
        let server_url = server_url.trim_end_matches('/').to_string();

        let server_name = env::var("TABLEAU_SERVER_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| server_url.clone());

        Ok(Self {
            server_url,
            server_name,
            site_id: env::var("TABLEAU_SITE_ID").unwrap_or_default(),
            api_version: required("TABLEAU_VERSION")?,
            token_name: required("TABLEAU_PERSONAL_ACCESS_TOKEN_NAME")?,
            token_secret: required("TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET")?,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
}

/// Load `config/.env` (or another env file) into the process environment.
///
/// A missing file is not an error; variables may come from the real environment.
pub fn load_env_file(path: &Path) {
    match dotenv::from_path(path) {
        Ok(()) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) => log::debug!("No env file loaded from {}: {}", path.display(), e),
    }
}

/// Actors whose events are dropped before aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IgnoreListConfig {
    pub enabled: bool,
    #[serde(default)]
    pub users_email: Vec<String>,
}

/// Static application config (`config/config.yml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub user_ignore_list: IgnoreListConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}

/// Read the metadata query text. It is sent to the server verbatim.
pub fn load_query(path: &Path) -> Result<String, ConfigError> {
    let query = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if query.trim().is_empty() {
        return Err(ConfigError::InvalidValue(format!(
            "metadata query file {} is empty",
            path.display()
        )));
    }
    Ok(query)
}

/// External extract engine settings
#[derive(Debug, Clone)]
pub struct HyperConfig {
    /// `hyperd` executable (resolved through PATH when not absolute)
    pub hyperd_path: PathBuf,
    pub startup_timeout: Duration,
}

impl Default for HyperConfig {
    fn default() -> Self {
        Self {
            hyperd_path: PathBuf::from("hyperd"),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

impl HyperConfig {
    /// Environment variables:
    /// - `HYPERD_PATH` (default: hyperd)
    /// - `HYPER_STARTUP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            hyperd_path: env::var("HYPERD_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.hyperd_path),
            startup_timeout: env::var("HYPER_STARTUP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.startup_timeout),
        }
    }
}

/// Per-run settings derived from the CLI
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub lookback_days: u32,
    /// Earliest event date (inclusive) considered by the aggregation
    pub lookback_date: NaiveDate,
    pub results_root: PathBuf,
    pub events_datasource: String,
    pub hyper: HyperConfig,
}

impl RunSettings {
    pub fn new(lookback_days: u32, today: NaiveDate) -> Self {
        Self {
            lookback_days,
            lookback_date: lookback_date(today, lookback_days),
            results_root: PathBuf::from(DEFAULT_RESULTS_ROOT),
            events_datasource: EVENTS_DATASOURCE_NAME.to_string(),
            hyper: HyperConfig::default(),
        }
    }

    /// Settings for a run starting now, engine settings taken from env
    pub fn for_today(lookback_days: u32) -> Self {
        let mut settings = Self::new(lookback_days, Local::now().date_naive());
        settings.hyper = HyperConfig::from_env();
        settings
    }
}

pub fn lookback_date(today: NaiveDate, lookback_days: u32) -> NaiveDate {
    today - ChronoDuration::days(i64::from(lookback_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookback_date_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            lookback_date(today, 180),
            NaiveDate::from_ymd_opt(2023, 7, 14).unwrap()
        );
        assert_eq!(lookback_date(today, 0), today);
    }

    #[test]
    fn test_run_settings_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let settings = RunSettings::new(DEFAULT_LOOKBACK_DAYS, today);
        assert_eq!(settings.events_datasource, "TS Events");
        assert_eq!(settings.results_root, PathBuf::from("results"));
        assert_eq!(settings.lookback_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_app_config() {
        let raw = r#"
user_ignore_list:
  enabled: true
  users_email:
    - admin@example.com
    - svc_refresh@example.com
"#;
        let config = AppConfig::from_yaml_str(raw).unwrap();
        assert!(config.user_ignore_list.enabled);
        assert_eq!(
            config.user_ignore_list.users_email,
            vec!["admin@example.com", "svc_refresh@example.com"]
        );
    }

    #[test]
    fn test_parse_app_config_without_users() {
        let config = AppConfig::from_yaml_str("user_ignore_list:\n  enabled: false\n").unwrap();
        assert!(!config.user_ignore_list.enabled);
        assert!(config.user_ignore_list.users_email.is_empty());
    }

    #[test]
    fn test_load_query_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ workbooks {{ id name }} }}").unwrap();

        let query = load_query(file.path()).unwrap();
        assert_eq!(query, "{ workbooks { id name } }\n");
    }

    #[test]
    fn test_load_query_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            load_query(file.path()),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_load_app_config_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    // Single test touching process env to avoid races between parallel tests.
    #[test]
    fn test_server_config_from_env() {
        let vars = [
            "TABLEAU_SERVER",
            "TABLEAU_SERVER_NAME",
            "TABLEAU_SITE_ID",
            "TABLEAU_VERSION",
            "TABLEAU_PERSONAL_ACCESS_TOKEN_NAME",
            "TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET",
        ];
        for var in vars {
            env::remove_var(var);
        }

        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::MissingVariable(v)) if v == "TABLEAU_SERVER"
        ));

        env::set_var("TABLEAU_SERVER", "tableau.example.com");
        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        env::set_var("TABLEAU_SERVER", "https://tableau.example.com/");
        env::set_var("TABLEAU_VERSION", "3.19");
        env::set_var("TABLEAU_PERSONAL_ACCESS_TOKEN_NAME", "reporting");
        env::set_var("TABLEAU_PERSONAL_ACCESS_TOKEN_SECRET", "s3cr3t");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.server_url, "https://tableau.example.com");
        assert_eq!(config.server_name, "https://tableau.example.com");
        assert_eq!(config.site_id, "");
        assert_eq!(config.api_version, "3.19");
        assert!(!format!("{:?}", config).contains("s3cr3t"));

        for var in vars {
            env::remove_var(var);
        }
    }
}

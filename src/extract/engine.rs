//! Extract decoding engines
//!
//! The `.hyper` format is never parsed here. `HyperdEngine` runs the vendor
//! `hyperd` server, which speaks the PostgreSQL wire protocol, attaches the
//! extract file as the connection database and reads the table back as text.

use super::error::ExtractError;
use super::table::ExtractTable;
use crate::config::HyperConfig;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

/// Table holding the rows of a single-table extract
pub const EXTRACT_TABLE: &str = "Extract";

const HYPER_USER: &str = "tableau_internal_user";
const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// hyperd starts (each time on a new port) at most this many times
const START_ATTEMPTS: usize = 3;

/// Reads a whole table out of an extract file
#[async_trait]
pub trait ExtractEngine: Send + Sync {
    /// `SELECT * FROM "<table>"` against the extract at `database`
    async fn read_table(&self, database: &Path, table: &str) -> Result<ExtractTable, ExtractError>;

    /// Engine name for logging
    fn engine_name(&self) -> &'static str;
}

pub struct HyperdEngine {
    config: HyperConfig,
}

impl HyperdEngine {
    pub fn new(config: HyperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExtractEngine for HyperdEngine {
    async fn read_table(&self, database: &Path, table: &str) -> Result<ExtractTable, ExtractError> {
        let log_dir = database.parent().unwrap_or_else(|| Path::new("."));
        let (process, mut conn) = HyperProcess::start_connected(&self.config, log_dir, database).await?;

        let sql = format!("SELECT * FROM {}", quote_ident(table));
        let decoded = read_all(&mut conn, &sql).await;
        let closed = conn.close().await;
        process.shutdown().await;

        let decoded = decoded?;
        closed?;
        Ok(decoded)
    }

    fn engine_name(&self) -> &'static str {
        "hyperd"
    }
}

/// Column names come from the statement description, so a table without
/// rows still reports its columns. Rows go through the simple protocol and
/// arrive as text.
async fn read_all(conn: &mut PgConnection, sql: &str) -> Result<ExtractTable, ExtractError> {
    log::debug!("Running extract query: {}", sql);

    let described = (&mut *conn).describe(sql).await?;
    let columns = described
        .columns()
        .iter()
        .map(|c| c.name().trim_matches('"').to_string())
        .collect();

    let rows: Vec<PgRow> = Executor::fetch_all(&mut *conn, sqlx::raw_sql(sql)).await?;
    rows_to_table(columns, &rows)
}

/// Why hyperd never became reachable
enum StartupFailure {
    /// The process died first; may be a lost port race, worth a new start
    Exited(ExitStatus),
    Failed(ExtractError),
}

impl From<StartupFailure> for ExtractError {
    fn from(failure: StartupFailure) -> Self {
        match failure {
            StartupFailure::Exited(status) => ExtractError::Engine(format!(
                "hyperd exited before accepting connections ({})",
                status
            )),
            StartupFailure::Failed(err) => err,
        }
    }
}

/// A running `hyperd` child, killed on shutdown or drop
struct HyperProcess {
    child: Child,
    port: u16,
}

impl HyperProcess {
    /// Start hyperd and connect to it with `database` attached.
    ///
    /// The listen port is picked before hyperd binds it, so another process
    /// can take it in between. hyperd then exits at startup; that case is
    /// retried on a fresh port.
    async fn start_connected(
        config: &HyperConfig,
        log_dir: &Path,
        database: &Path,
    ) -> Result<(Self, PgConnection), ExtractError> {
        let mut attempt = 1;
        loop {
            let mut process = Self::start(config, log_dir)?;
            match process.connect(database, config.startup_timeout).await {
                Ok(conn) => return Ok((process, conn)),
                Err(StartupFailure::Exited(status)) if attempt < START_ATTEMPTS => {
                    log::warn!(
                        "⚠️  hyperd exited during startup ({}), retrying ({}/{})",
                        status,
                        attempt + 1,
                        START_ATTEMPTS
                    );
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into()),
            }
        }
    }

    fn start(config: &HyperConfig, log_dir: &Path) -> Result<Self, ExtractError> {
        let port = free_loopback_port()?;

        let child = Command::new(&config.hyperd_path)
            .arg("run")
            .arg("--skip-license")
            .arg("--no-password")
            .arg(format!("--init-user={}", HYPER_USER))
            .arg("--listen-connection")
            .arg(format!("tab.tcp://127.0.0.1:{}", port))
            .arg(format!("--log-dir={}", log_dir.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExtractError::Engine(format!(
                    "failed to start {}: {}",
                    config.hyperd_path.display(),
                    e
                ))
            })?;

        log::info!("🗄️  Started hyperd on 127.0.0.1:{}", port);
        Ok(Self { child, port })
    }

    /// Connect once hyperd accepts connections, attaching `database`.
    ///
    /// Only connection-level (IO) errors are retried; anything hyperd itself
    /// answers with, such as a rejected attach, fails at once.
    async fn connect(
        &mut self,
        database: &Path,
        startup_timeout: Duration,
    ) -> Result<PgConnection, StartupFailure> {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(self.port)
            .username(HYPER_USER)
            .database(&database.to_string_lossy());

        let deadline = Instant::now() + startup_timeout;
        loop {
            let exited = self
                .child
                .try_wait()
                .map_err(|e| StartupFailure::Failed(e.into()))?;
            if let Some(status) = exited {
                return Err(StartupFailure::Exited(status));
            }

            match options.connect().await {
                Ok(conn) => return Ok(conn),
                Err(e) if is_startup_error(&e) && Instant::now() < deadline => {
                    log::debug!("hyperd not ready yet: {}", e);
                    tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
                }
                Err(e) if is_startup_error(&e) => {
                    return Err(StartupFailure::Failed(ExtractError::Engine(format!(
                        "hyperd did not accept connections within {}s: {}",
                        startup_timeout.as_secs(),
                        e
                    ))));
                }
                Err(e) => return Err(StartupFailure::Failed(e.into())),
            }
        }
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            log::warn!("Failed to stop hyperd: {}", e);
        } else {
            log::debug!("hyperd stopped");
        }
    }
}

/// Nothing listening yet, or the socket dropped while hyperd starts
fn is_startup_error(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_))
}

fn free_loopback_port() -> Result<u16, ExtractError> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn rows_to_table(columns: Vec<String>, rows: &[PgRow]) -> Result<ExtractTable, ExtractError> {
    let mut table = ExtractTable::new(columns);
    for row in rows {
        if row.len() != table.columns.len() {
            return Err(ExtractError::Engine(format!(
                "row has {} values for {} described columns",
                row.len(),
                table.columns.len()
            )));
        }
        let cells = (0..row.len())
            .map(|idx| row.try_get_unchecked::<Option<String>, _>(idx))
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(cells);
    }
    Ok(table)
}

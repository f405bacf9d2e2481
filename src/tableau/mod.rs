//! Analytics server access (REST API + Metadata API)
//!
//! ```text
//! TableauClient::new ──► use_server_version
//!        │
//!   with_session (sign in … sign out)
//!        ├─ metadata::fetch_workbooks      → raw workbook records
//!        ├─ datasources::list_datasources  → published data sources
//!        └─ datasources::download_datasource → TS_Events.hyper.tdsx
//! ```

pub mod auth;
pub mod client;
pub mod datasources;
pub mod error;
pub mod metadata;
pub mod types;

pub use auth::{sign_in, sign_out, with_session, Session};
pub use client::TableauClient;
pub use datasources::{download_datasource, find_unique_by_name, list_datasources};
pub use error::TableauError;
pub use metadata::fetch_workbooks;
pub use types::PublishedDatasource;

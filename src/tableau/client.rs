//! REST client handle shared by every server call of a run

use super::error::TableauError;
use super::types::ServerInfoResponse;
use crate::config::ServerConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Response;

pub const AUTH_HEADER: &str = "X-Tableau-Auth";

pub struct TableauClient {
    http: reqwest::Client,
    server_url: String,
    api_version: String,
}

impl TableauClient {
    /// Build a client for `config.server_url` speaking `config.api_version`.
    ///
    /// No request timeout is set: extract downloads may be large and the
    /// run has no deadline.
    pub fn new(config: &ServerConfig) -> Result<Self, TableauError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("tableau-usage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `{server}/api/{version}/{path}`
    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.server_url, self.api_version, path)
    }

    pub(crate) fn metadata_url(&self) -> String {
        format!("{}/api/metadata/graphql", self.server_url)
    }

    /// Switch to the newest REST API version the server reports.
    ///
    /// Returns the adopted version.
    pub async fn use_server_version(&mut self) -> Result<String, TableauError> {
        let response = self.http.get(self.rest_url("serverinfo")).send().await?;
        let response = ensure_success(response, "Server info").await?;
        let info: ServerInfoResponse = response.json().await?;

        let version = info.server_info.rest_api_version;
        if version != self.api_version {
            log::info!(
                "🔧 Using server REST API version {} (configured {})",
                version,
                self.api_version
            );
        }
        if let Some(product) = info.server_info.product_version.and_then(|p| p.value) {
            log::debug!("Server product version: {}", product);
        }
        self.api_version = version.clone();
        Ok(version)
    }
}

/// Turn a non-2xx response into `TableauError::Status`, keeping the body
/// for the error message.
pub(crate) async fn ensure_success(
    response: Response,
    context: &'static str,
) -> Result<Response, TableauError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TableauError::Status {
        context,
        status,
        body,
    })
}

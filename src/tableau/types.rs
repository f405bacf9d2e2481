//! REST / Metadata API wire types (JSON flavour of the REST API)

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub credentials: SignInCredentials<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInCredentials<'a> {
    #[serde(rename = "personalAccessTokenName")]
    pub personal_access_token_name: &'a str,
    #[serde(rename = "personalAccessTokenSecret")]
    pub personal_access_token_secret: &'a str,
    pub site: SiteRef<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteRef<'a> {
    #[serde(rename = "contentUrl")]
    pub content_url: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub credentials: IssuedCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuedCredentials {
    pub token: String,
    pub site: IssuedSite,
    pub user: IssuedUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuedSite {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuedUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfoResponse {
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "restApiVersion")]
    pub rest_api_version: String,
    #[serde(rename = "productVersion", default)]
    pub product_version: Option<ProductVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductVersion {
    pub value: Option<String>,
}

/// REST pagination block; the JSON API encodes its numbers as strings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(rename = "pageNumber", deserialize_with = "de_count")]
    pub page_number: u64,
    #[serde(rename = "pageSize", deserialize_with = "de_count")]
    pub page_size: u64,
    #[serde(rename = "totalAvailable", deserialize_with = "de_count")]
    pub total_available: u64,
}

impl Pagination {
    pub fn is_last_page(&self) -> bool {
        self.page_size == 0 || self.page_number.saturating_mul(self.page_size) >= self.total_available
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceListResponse {
    pub pagination: Pagination,
    #[serde(default)]
    pub datasources: DatasourceList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasourceList {
    #[serde(default)]
    pub datasource: Vec<PublishedDatasource>,
}

/// A published data source as listed by the REST API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublishedDatasource {
    pub id: String,
    pub name: String,
    #[serde(rename = "contentUrl", default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorMessage {
    pub message: String,
}

fn de_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Num(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Num(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datasource_page() {
        let body = r#"{
            "pagination": {"pageNumber": "2", "pageSize": "100", "totalAvailable": "150"},
            "datasources": {"datasource": [
                {"id": "ds-1", "name": "TS Events", "contentUrl": "TSEvents",
                 "project": {"id": "p-1", "name": "Admin Insights"}}
            ]}
        }"#;

        let page: DatasourceListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.pagination.page_number, 2);
        assert_eq!(page.pagination.total_available, 150);
        assert!(page.pagination.is_last_page());
        assert_eq!(page.datasources.datasource.len(), 1);
        assert_eq!(page.datasources.datasource[0].name, "TS Events");
    }

    #[test]
    fn test_parse_empty_datasource_page() {
        let body = r#"{"pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": "0"}, "datasources": {}}"#;
        let page: DatasourceListResponse = serde_json::from_str(body).unwrap();
        assert!(page.datasources.datasource.is_empty());
        assert!(page.pagination.is_last_page());
    }

    #[test]
    fn test_pagination_not_last() {
        let pagination = Pagination {
            page_number: 1,
            page_size: 100,
            total_available: 101,
        };
        assert!(!pagination.is_last_page());
    }

    #[test]
    fn test_sign_in_request_shape() {
        let request = SignInRequest {
            credentials: SignInCredentials {
                personal_access_token_name: "reporting",
                personal_access_token_secret: "secret",
                site: SiteRef { content_url: "analytics" },
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["credentials"]["personalAccessTokenName"], "reporting");
        assert_eq!(json["credentials"]["site"]["contentUrl"], "analytics");
    }

    #[test]
    fn test_parse_server_info_and_sign_in() {
        let info: ServerInfoResponse = serde_json::from_str(
            r#"{"serverInfo": {"productVersion": {"value": "2023.3.0", "build": "20233.23"},
                "restApiVersion": "3.21"}}"#,
        )
        .unwrap();
        assert_eq!(info.server_info.rest_api_version, "3.21");
        assert_eq!(
            info.server_info.product_version.and_then(|p| p.value).as_deref(),
            Some("2023.3.0")
        );

        let signed_in: SignInResponse = serde_json::from_str(
            r#"{"credentials": {"token": "t", "estimatedTimeToExpiration": "365:22:00",
                "site": {"id": "site-1", "contentUrl": "analytics"}, "user": {"id": "user-1"}}}"#,
        )
        .unwrap();
        assert_eq!(signed_in.credentials.site.id, "site-1");
        assert_eq!(signed_in.credentials.user.id, "user-1");
    }
}

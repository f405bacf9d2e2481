//! Workbook metadata records and their flattened row form
//!
//! Records are read leniently from the raw Metadata API JSON: a missing or
//! oddly typed field becomes `None` instead of failing the run.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasourceRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub has_extracts: Option<bool>,
    pub extract_last_refresh_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub uri: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub project_name: Option<String>,
    pub owner_id: Option<String>,
    pub owner_username: Option<String>,
    pub embedded_datasources: Vec<DatasourceRecord>,
}

impl WorkbookRecord {
    pub fn from_value(value: &Value) -> Self {
        let owner = value.get("owner");
        let embedded_datasources = value
            .get("embeddedDatasources")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(DatasourceRecord::from_value).collect())
            .unwrap_or_default();

        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            description: text(value, "description"),
            uri: text(value, "uri"),
            created_at: text(value, "createdAt"),
            updated_at: text(value, "updatedAt"),
            project_name: text(value, "projectName"),
            owner_id: owner.and_then(|o| text(o, "id")),
            owner_username: owner.and_then(|o| text(o, "username")),
            embedded_datasources,
        }
    }
}

impl DatasourceRecord {
    pub fn from_value(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            name: text(value, "name"),
            has_extracts: value.get("hasExtracts").and_then(Value::as_bool),
            extract_last_refresh_time: text(value, "extractLastRefreshTime"),
        }
    }
}

/// JSON scalar as text; null, missing, arrays and objects give `None`
fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One row per (workbook, embedded datasource)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub uri: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    pub owner_id: Option<String>,
    pub owner_username: Option<String>,
    pub datasource_id: Option<String>,
    pub datasource_name: Option<String>,
    #[serde(rename = "datasource_hasExtracts")]
    pub datasource_has_extracts: Option<bool>,
    #[serde(rename = "datasource_extractLastRefreshTime")]
    pub datasource_extract_last_refresh_time: Option<String>,
}

impl MetadataRow {
    pub const HEADER: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "uri",
        "createdAt",
        "updatedAt",
        "projectName",
        "owner_id",
        "owner_username",
        "datasource_id",
        "datasource_name",
        "datasource_hasExtracts",
        "datasource_extractLastRefreshTime",
    ];

    fn new(workbook: &WorkbookRecord, datasource: Option<&DatasourceRecord>) -> Self {
        let datasource = datasource.cloned().unwrap_or_default();
        Self {
            id: workbook.id.clone(),
            name: workbook.name.clone(),
            description: workbook.description.clone(),
            uri: workbook.uri.clone(),
            created_at: workbook.created_at.clone(),
            updated_at: workbook.updated_at.clone(),
            project_name: workbook.project_name.clone(),
            owner_id: workbook.owner_id.clone(),
            owner_username: workbook.owner_username.clone(),
            datasource_id: datasource.id,
            datasource_name: datasource.name,
            datasource_has_extracts: datasource.has_extracts,
            datasource_extract_last_refresh_time: datasource.extract_last_refresh_time,
        }
    }
}

/// Denormalize workbooks into one row per embedded datasource, in server
/// order. A workbook without datasources still yields one row (datasource
/// fields empty).
pub fn flatten_workbooks(workbooks: &[WorkbookRecord]) -> Vec<MetadataRow> {
    let mut rows = Vec::new();
    for workbook in workbooks {
        if workbook.embedded_datasources.is_empty() {
            rows.push(MetadataRow::new(workbook, None));
            continue;
        }
        for datasource in &workbook.embedded_datasources {
            rows.push(MetadataRow::new(workbook, Some(datasource)));
        }
    }
    rows
}

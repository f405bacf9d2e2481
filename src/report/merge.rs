//! Left-outer join of flattened metadata with per-workbook usage
//!
//! Key: (name, projectName) = (workbook_name, project_name). Every metadata
//! row appears exactly once; usage columns stay empty when nothing matches.

use super::usage::UsageRow;
use super::workbook::MetadataRow;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedRow {
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
    pub workbook_name: Option<String>,
    #[serde(rename = "project_name")]
    pub usage_project_name: Option<String>,
    pub event_count: Option<usize>,
    pub grouped_events: Option<String>,
    pub grouped_actor_user_name: Option<String>,
    pub grouped_event_name: Option<String>,
}

impl MergedRow {
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
        "workbook_name",
        "project_name",
        "event_count",
        "grouped_events",
        "grouped_actor_user_name",
        "grouped_event_name",
    ];

    fn new(meta: &MetadataRow, usage: Option<&UsageRow>) -> Self {
        Self {
            id: meta.id.clone(),
            name: meta.name.clone(),
            description: meta.description.clone(),
            uri: meta.uri.clone(),
            created_at: meta.created_at.clone(),
            updated_at: meta.updated_at.clone(),
            project_name: meta.project_name.clone(),
            owner_id: meta.owner_id.clone(),
            owner_username: meta.owner_username.clone(),
            datasource_id: meta.datasource_id.clone(),
            datasource_name: meta.datasource_name.clone(),
            datasource_has_extracts: meta.datasource_has_extracts,
            datasource_extract_last_refresh_time: meta.datasource_extract_last_refresh_time.clone(),
            workbook_name: usage.map(|u| u.workbook_name.clone()),
            usage_project_name: usage.map(|u| u.project_name.clone()),
            event_count: usage.map(|u| u.event_count),
            grouped_events: usage.map(|u| u.grouped_events.clone()),
            grouped_actor_user_name: usage.map(|u| u.grouped_actor_user_name.clone()),
            grouped_event_name: usage.map(|u| u.grouped_event_name.clone()),
        }
    }

    pub fn has_usage(&self) -> bool {
        self.event_count.is_some()
    }
}

/// Join usage onto metadata rows, keeping metadata order.
///
/// A metadata row with a null name or project never matches.
pub fn merge_usage(metadata: &[MetadataRow], usage: &[UsageRow]) -> Vec<MergedRow> {
    let by_key: HashMap<(&str, &str), &UsageRow> = usage
        .iter()
        .map(|u| ((u.workbook_name.as_str(), u.project_name.as_str()), u))
        .collect();

    metadata
        .iter()
        .map(|meta| {
            let matched = match (meta.name.as_deref(), meta.project_name.as_deref()) {
                (Some(name), Some(project)) => by_key.get(&(name, project)).copied(),
                _ => None,
            };
            MergedRow::new(meta, matched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, project: &str, datasource: &str) -> MetadataRow {
        MetadataRow {
            name: Some(name.to_string()),
            project_name: Some(project.to_string()),
            datasource_name: Some(datasource.to_string()),
            ..Default::default()
        }
    }

    fn usage(workbook: &str, project: &str, count: usize) -> UsageRow {
        UsageRow {
            workbook_name: workbook.to_string(),
            project_name: project.to_string(),
            event_count: count,
            grouped_events: vec!["Access"; count].join(", "),
            grouped_actor_user_name: vec!["ana"; count].join(", "),
            grouped_event_name: vec!["View"; count].join(", "),
        }
    }

    #[test]
    fn test_left_join_keeps_every_metadata_row() {
        let metadata = vec![
            meta("Sales", "Finance", "Orders"),
            meta("Sales", "Finance", "Targets"),
            meta("Ops", "IT", "Tickets"),
            meta("Sales", "Marketing", "Leads"),
        ];
        let usage_rows = vec![usage("Sales", "Finance", 2), usage("Unknown", "Nowhere", 5)];

        let merged = merge_usage(&metadata, &usage_rows);

        assert_eq!(merged.len(), metadata.len());
        assert_eq!(merged[0].event_count, Some(2));
        assert_eq!(merged[1].event_count, Some(2));
        assert_eq!(merged[1].datasource_name.as_deref(), Some("Targets"));
        assert!(!merged[2].has_usage());
        assert_eq!(merged[2].workbook_name, None);
        // same workbook name in another project does not match
        assert!(!merged[3].has_usage());
    }

    #[test]
    fn test_null_keys_never_match() {
        let mut nameless = meta("Sales", "Finance", "Orders");
        nameless.name = None;
        let merged = merge_usage(&[nameless], &[usage("Sales", "Finance", 1)]);
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].has_usage());
    }

    #[test]
    fn test_merge_without_usage() {
        let merged = merge_usage(&[meta("Sales", "Finance", "Orders")], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].grouped_events, None);
    }
}

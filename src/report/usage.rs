//! Usage event filtering and per-workbook aggregation
//!
//! Order of operations:
//! 1. ignore list (on the decoded table, before the full-dump CSV is written)
//! 2. `event_date >= lookback_date` and `item_type == "Workbook"`
//! 3. group by (workbook_name, project_name)

use crate::config::IgnoreListConfig;
use crate::extract::{parse_event_date, ExtractError, ExtractTable, EVENT_DATE_COLUMN};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const WORKBOOK_ITEM_TYPE: &str = "Workbook";

pub const ACTOR_COLUMN: &str = "actor_user_name";
const EVENT_TYPE_COLUMN: &str = "event_type";
const EVENT_NAME_COLUMN: &str = "event_name";
const ITEM_TYPE_COLUMN: &str = "item_type";
const WORKBOOK_NAME_COLUMN: &str = "workbook_name";
const PROJECT_NAME_COLUMN: &str = "project_name";

/// Separator used inside the grouped string columns
pub const LIST_SEPARATOR: &str = ", ";

/// Typed view of one decoded usage event
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub actor_user_name: String,
    pub event_type: String,
    pub event_name: String,
    pub item_type: String,
    /// Group key; `None` (SQL NULL) never reaches a usage row
    pub workbook_name: Option<String>,
    pub project_name: Option<String>,
    pub event_date: Option<NaiveDate>,
}

/// Actors excluded from every aggregation
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    enabled: bool,
    users: HashSet<String>,
}

impl IgnoreList {
    pub fn new(config: &IgnoreListConfig) -> Self {
        Self {
            enabled: config.enabled,
            users: config.users_email.iter().cloned().collect(),
        }
    }

    fn is_ignored(&self, actor: &str) -> bool {
        self.enabled && self.users.contains(actor)
    }

    /// Drop rows whose actor is ignored. Returns the number of rows removed.
    pub fn apply(&self, table: &mut ExtractTable) -> Result<usize, ExtractError> {
        if !self.enabled || table.is_empty() {
            return Ok(0);
        }
        let actor_idx = table.require_column(ACTOR_COLUMN)?;

        let before = table.len();
        table.retain(|row| {
            row[actor_idx]
                .as_deref()
                .map_or(true, |actor| !self.is_ignored(actor))
        });
        Ok(before - table.len())
    }
}

/// Read typed events out of a decoded table. Null text cells become "",
/// except the two group key columns which stay `None`.
pub fn events_from_table(table: &ExtractTable) -> Result<Vec<UsageEvent>, ExtractError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let actor = table.require_column(ACTOR_COLUMN)?;
    let event_type = table.require_column(EVENT_TYPE_COLUMN)?;
    let event_name = table.require_column(EVENT_NAME_COLUMN)?;
    let item_type = table.require_column(ITEM_TYPE_COLUMN)?;
    let workbook_name = table.require_column(WORKBOOK_NAME_COLUMN)?;
    let project_name = table.require_column(PROJECT_NAME_COLUMN)?;
    let event_date = table.require_column(EVENT_DATE_COLUMN)?;

    let cell = |row: &[Option<String>], idx: usize| row[idx].clone().unwrap_or_default();

    table
        .rows
        .iter()
        .map(|row| -> Result<UsageEvent, ExtractError> {
            let date = match row[event_date].as_deref() {
                Some(raw) => Some(parse_event_date(raw).ok_or_else(|| ExtractError::InvalidDate {
                    column: EVENT_DATE_COLUMN.to_string(),
                    value: raw.to_string(),
                })?),
                None => None,
            };
            Ok(UsageEvent {
                actor_user_name: cell(row, actor),
                event_type: cell(row, event_type),
                event_name: cell(row, event_name),
                item_type: cell(row, item_type),
                workbook_name: row[workbook_name].clone(),
                project_name: row[project_name].clone(),
                event_date: date,
            })
        })
        .collect()
}

/// Events on or after `lookback_date` about workbooks, in input order.
///
/// Dates are compared as calendar dates; an event without a date never passes,
/// nor does one with a null workbook or project name.
pub fn filter_workbook_events(events: &[UsageEvent], lookback_date: NaiveDate) -> Vec<&UsageEvent> {
    events
        .iter()
        .filter(|e| e.item_type == WORKBOOK_ITEM_TYPE)
        .filter(|e| e.event_date.is_some_and(|d| d >= lookback_date))
        .filter(|e| e.workbook_name.is_some() && e.project_name.is_some())
        .collect()
}

/// Per-workbook usage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub workbook_name: String,
    pub project_name: String,
    pub event_count: usize,
    pub grouped_events: String,
    pub grouped_actor_user_name: String,
    pub grouped_event_name: String,
}

impl UsageRow {
    pub const HEADER: &'static [&'static str] = &[
        "workbook_name",
        "project_name",
        "event_count",
        "grouped_events",
        "grouped_actor_user_name",
        "grouped_event_name",
    ];
}

#[derive(Default)]
struct Group<'a> {
    event_types: Vec<&'a str>,
    actors: Vec<&'a str>,
    event_names: Vec<&'a str>,
}

/// Group filtered events by (workbook_name, project_name), sorted by key.
///
/// Within a group the three joined lists keep the filtered input order.
pub fn group_usage(filtered: &[&UsageEvent]) -> Vec<UsageRow> {
    let mut groups: BTreeMap<(&str, &str), Group<'_>> = BTreeMap::new();
    for event in filtered {
        let (Some(workbook_name), Some(project_name)) =
            (event.workbook_name.as_deref(), event.project_name.as_deref())
        else {
            continue;
        };
        let group = groups.entry((workbook_name, project_name)).or_default();
        group.event_types.push(&event.event_type);
        group.actors.push(&event.actor_user_name);
        group.event_names.push(&event.event_name);
    }

    groups
        .into_iter()
        .map(|((workbook_name, project_name), group)| UsageRow {
            workbook_name: workbook_name.to_string(),
            project_name: project_name.to_string(),
            event_count: group.event_types.len(),
            grouped_events: group.event_types.join(LIST_SEPARATOR),
            grouped_actor_user_name: group.actors.join(LIST_SEPARATOR),
            grouped_event_name: group.event_names.join(LIST_SEPARATOR),
        })
        .collect()
}

/// Date/item filter followed by grouping
pub fn aggregate_usage(events: &[UsageEvent], lookback_date: NaiveDate) -> Vec<UsageRow> {
    let filtered = filter_workbook_events(events, lookback_date);
    log::info!(
        "🧮 {} of {} events are workbook events since {}",
        filtered.len(),
        events.len(),
        lookback_date
    );
    group_usage(&filtered)
}

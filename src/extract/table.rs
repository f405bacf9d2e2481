//! In-memory extract table: column names plus text cells

use super::error::ExtractError;
use chrono::{Datelike, NaiveDate};

/// Column holding the event date in the usage events extract
pub const EVENT_DATE_COLUMN: &str = "event_date";

/// Every row of a decoded table, cells rendered as text (`None` = SQL NULL)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ExtractTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, ExtractError> {
        self.column_index(name)
            .ok_or_else(|| ExtractError::MissingColumn(name.to_string()))
    }

    /// Keep only rows for which `keep` returns true, preserving order
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Rewrite a date column in place to the `YYYY-M-D` form (no zero padding).
    ///
    /// The column must exist unless the table is empty.
    pub fn normalize_date_column(&mut self, name: &str) -> Result<(), ExtractError> {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None if self.rows.is_empty() => return Ok(()),
            None => return Err(ExtractError::MissingColumn(name.to_string())),
        };

        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(idx).and_then(Option::as_mut) {
                let date = parse_event_date(cell).ok_or_else(|| ExtractError::InvalidDate {
                    column: name.to_string(),
                    value: cell.clone(),
                })?;
                *cell = unpadded_date(date);
            }
        }
        Ok(())
    }
}

/// `2024-01-05` → `2024-1-5`
pub fn unpadded_date(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Parse a date cell, padded or not, ignoring any trailing time part
/// (`2024-1-5`, `2024-01-05`, `2024-01-05 13:45:00`).
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    let mut parts = date_part.splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_unpadded_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(unpadded_date(date), "2024-1-5");
        let date = NaiveDate::from_ymd_opt(2023, 11, 28).unwrap();
        assert_eq!(unpadded_date(date), "2023-11-28");
    }

    #[test]
    fn test_parse_event_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(parse_event_date("2024-01-05"), expected);
        assert_eq!(parse_event_date("2024-1-5"), expected);
        assert_eq!(parse_event_date("2024-01-05 13:45:00"), expected);
        assert_eq!(parse_event_date("2024-01-05T13:45:00"), expected);
        assert_eq!(parse_event_date("2024-02-30"), None);
        assert_eq!(parse_event_date("yesterday"), None);
        assert_eq!(parse_event_date(""), None);
    }

    #[test]
    fn test_normalize_date_column() {
        let mut table = ExtractTable::new(vec!["event_name".into(), "event_date".into()]);
        table.push_row(cells(&[Some("Access View"), Some("2024-01-05")]));
        table.push_row(cells(&[Some("Access View"), None]));
        table.push_row(cells(&[Some("Publish"), Some("2024-12-31")]));

        table.normalize_date_column(EVENT_DATE_COLUMN).unwrap();

        assert_eq!(table.rows[0][1].as_deref(), Some("2024-1-5"));
        assert_eq!(table.rows[1][1], None);
        assert_eq!(table.rows[2][1].as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let mut table = ExtractTable::new(vec!["event_date".into()]);
        table.push_row(cells(&[Some("not a date")]));
        assert!(matches!(
            table.normalize_date_column(EVENT_DATE_COLUMN),
            Err(ExtractError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_normalize_missing_column() {
        let mut empty = ExtractTable::new(vec![]);
        assert!(empty.normalize_date_column(EVENT_DATE_COLUMN).is_ok());

        let mut table = ExtractTable::new(vec!["event_name".into()]);
        table.push_row(cells(&[Some("Publish")]));
        assert!(matches!(
            table.normalize_date_column(EVENT_DATE_COLUMN),
            Err(ExtractError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut table = ExtractTable::new(vec!["actor".into()]);
        for actor in ["a", "b", "c", "b"] {
            table.push_row(cells(&[Some(actor)]));
        }
        table.retain(|row| row[0].as_deref() != Some("b"));
        assert_eq!(table.rows, vec![cells(&[Some("a")]), cells(&[Some("c")])]);
    }
}

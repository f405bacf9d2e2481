//! Report building: flatten → aggregate → merge → write

pub mod merge;
pub mod usage;
pub mod workbook;
pub mod writer;

pub use merge::{merge_usage, MergedRow};
pub use usage::{aggregate_usage, events_from_table, IgnoreList, UsageEvent, UsageRow};
pub use workbook::{flatten_workbooks, MetadataRow, WorkbookRecord};
pub use writer::RunOutput;

//! Usage events extract decoding
//!
//! ```text
//! TS_Events.hyper.tdsx ─unpack─► extracted_tdsx/Data/Extracts/*.hyper
//!        ─ExtractEngine::read_table("Extract")─► ExtractTable
//!        ─normalize event_date─► YYYY-M-D
//! ```

pub mod archive;
pub mod engine;
pub mod error;
pub mod table;

pub use archive::{locate_hyper_file, unpack_archive};
pub use engine::{ExtractEngine, HyperdEngine, EXTRACT_TABLE};
pub use error::ExtractError;
pub use table::{parse_event_date, unpadded_date, ExtractTable, EVENT_DATE_COLUMN};

use std::path::Path;

/// Unpack the downloaded package into `unpack_dir` and read every row of its
/// extract through `engine`, with `event_date` rendered as `YYYY-M-D`.
pub async fn decode_events_extract(
    package: &Path,
    unpack_dir: &Path,
    engine: &dyn ExtractEngine,
) -> Result<ExtractTable, ExtractError> {
    unpack_archive(package, unpack_dir)?;
    let hyper_file = locate_hyper_file(unpack_dir)?;
    log::info!(
        "🔎 Reading {} with {}",
        hyper_file.display(),
        engine.engine_name()
    );

    let mut table = engine.read_table(&hyper_file, EXTRACT_TABLE).await?;
    table.normalize_date_column(EVENT_DATE_COLUMN)?;

    log::info!(
        "✅ Decoded {} event rows ({} columns)",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

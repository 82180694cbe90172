//! JSON output of a finished search.
//!
//! Files are organized by run date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── results.json
//! ```

use crate::models::ArticleRecord;
use chrono::NaiveDate;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `records` as pretty JSON to `{json_output_dir}/{date}/results.json`.
///
/// Returns the path written.
#[instrument(
    level = "info",
    skip_all,
    fields(json_output_dir = %json_output_dir, count = records.len())
)]
pub async fn write_results(
    records: &[ArticleRecord],
    json_output_dir: &str,
    date: NaiveDate,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(records)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(date.format("%Y-%m-%d").to_string());
    info!(dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join("results.json");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON results file");
    Ok(path)
}

//! Local crawl records
//!
//! The output store keeps one folder per exposition with the exposition
//! document inside. The modification time of that document is the local
//! crawl timestamp; together with the remote last-modified time from the
//! feed it forms the ephemeral [`CrawlRecord`] the staleness decider
//! consumes. Records are derived, never persisted separately.

use std::collections::HashMap;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// The staleness decider's view of one exposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlRecord {
    pub exposition_id: u64,
    /// Last-modified epoch reported by the upstream feed
    pub remote_last_modified: i64,
    /// Epoch of the last completed local crawl
    pub local_timestamp: i64,
}

/// Reads the local crawl timestamp for one exposition, if present
pub fn local_record(research_dir: &Path, exposition_id: u64) -> Option<i64> {
    let document = research_dir
        .join(exposition_id.to_string())
        .join(format!("{}.json", exposition_id));
    let modified = std::fs::metadata(document).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_secs() as i64)
}

/// Scans the research directory for all local crawl timestamps
///
/// Folders whose name is not a numeric exposition id are ignored, as are
/// folders without a completed exposition document.
pub fn scan_records(research_dir: &Path) -> HashMap<u64, i64> {
    let mut records = HashMap::new();

    let Ok(entries) = std::fs::read_dir(research_dir) else {
        return records;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(id) = name.to_str().and_then(|n| n.parse::<u64>().ok()) else {
            continue;
        };
        if let Some(timestamp) = local_record(research_dir, id) {
            records.insert(id, timestamp);
        }
    }

    records
}

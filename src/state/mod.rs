//! Crawl state: local crawl records and the staleness decision

mod records;
mod staleness;

pub use records::{local_record, scan_records, CrawlRecord};
pub use staleness::{StalenessDecider, StalenessDecision, StalenessMode};

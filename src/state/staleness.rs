//! Staleness decider
//!
//! Decides per exposition whether the local copy is outdated relative to
//! the upstream feed and must be re-crawled. The decision gates the whole
//! pipeline: a fresh exposition is not fetched at all.

use crate::config::StalenessConfig;
use crate::state::CrawlRecord;

/// How the current batch treats previously crawled expositions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessMode {
    /// Compare the remote last-modified time against the local record
    Normal,

    /// Additionally re-crawl records older than the resume window,
    /// recovering expositions whose previous crawl was interrupted
    Resume,
}

/// Outcome of the staleness decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessDecision {
    /// No local record exists
    NeverCrawled,

    /// The remote copy is newer than the local record plus tolerance
    Outdated,

    /// Resume mode: the local record is older than the resume window
    Expired,

    /// The local record is current
    Fresh,
}

impl StalenessDecision {
    /// Returns true when the exposition must be (re-)crawled
    pub fn is_stale(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

/// Applies the staleness rules of one crawl batch
#[derive(Debug, Clone)]
pub struct StalenessDecider {
    tolerance_secs: i64,
    resume_window_secs: i64,
    mode: StalenessMode,
}

impl StalenessDecider {
    pub fn new(config: &StalenessConfig, mode: StalenessMode) -> Self {
        Self {
            tolerance_secs: config.tolerance_secs,
            resume_window_secs: config.resume_window_secs,
            mode,
        }
    }

    /// Decides whether an exposition needs re-crawling
    ///
    /// # Arguments
    ///
    /// * `record` - The local crawl record, if one exists
    /// * `now` - The current POSIX time
    ///
    /// # Rules
    ///
    /// * No local record → stale.
    /// * `remote > local + tolerance` → stale. The tolerance compensates
    ///   for clock and feed skew.
    /// * Resume mode only: `now - local > resume_window` → stale,
    ///   regardless of the remote comparison.
    pub fn decide(&self, record: Option<&CrawlRecord>, now: i64) -> StalenessDecision {
        let Some(record) = record else {
            return StalenessDecision::NeverCrawled;
        };

        if record.remote_last_modified > record.local_timestamp + self.tolerance_secs {
            return StalenessDecision::Outdated;
        }

        if self.mode == StalenessMode::Resume
            && now - record.local_timestamp > self.resume_window_secs
        {
            return StalenessDecision::Expired;
        }

        StalenessDecision::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decider(tolerance: i64, window: i64, mode: StalenessMode) -> StalenessDecider {
        StalenessDecider::new(
            &StalenessConfig {
                tolerance_secs: tolerance,
                resume_window_secs: window,
            },
            mode,
        )
    }

    fn record(remote: i64, local: i64) -> CrawlRecord {
        CrawlRecord {
            exposition_id: 1,
            remote_last_modified: remote,
            local_timestamp: local,
        }
    }

    #[test]
    fn test_missing_record_is_stale() {
        let decider = decider(100, 1000, StalenessMode::Normal);
        let decision = decider.decide(None, 0);
        assert_eq!(decision, StalenessDecision::NeverCrawled);
        assert!(decision.is_stale());
    }

    #[test]
    fn test_remote_newer_than_tolerance_is_stale() {
        // remote 1000, local 500, tolerance 100: 1000 > 600
        let decider = decider(100, 1_000_000, StalenessMode::Normal);
        let decision = decider.decide(Some(&record(1000, 500)), 2000);
        assert_eq!(decision, StalenessDecision::Outdated);
        assert!(decision.is_stale());
    }

    #[test]
    fn test_remote_within_tolerance_is_fresh() {
        // remote 1000, local 950, tolerance 100: 1000 <= 1050
        let decider = decider(100, 1_000_000, StalenessMode::Normal);
        let decision = decider.decide(Some(&record(1000, 950)), 2000);
        assert_eq!(decision, StalenessDecision::Fresh);
        assert!(!decision.is_stale());
    }

    #[test]
    fn test_normal_mode_ignores_record_age() {
        let decider = decider(100, 10, StalenessMode::Normal);
        // local is ancient but remote hasn't moved
        let decision = decider.decide(Some(&record(1000, 990)), 1_000_000);
        assert_eq!(decision, StalenessDecision::Fresh);
    }

    #[test]
    fn test_resume_mode_expires_old_records() {
        let decider = decider(100, 10, StalenessMode::Resume);
        let decision = decider.decide(Some(&record(1000, 990)), 1_000_000);
        assert_eq!(decision, StalenessDecision::Expired);
        assert!(decision.is_stale());
    }

    #[test]
    fn test_resume_mode_keeps_recent_records() {
        let decider = decider(100, 1000, StalenessMode::Resume);
        let decision = decider.decide(Some(&record(1000, 990)), 1500);
        assert_eq!(decision, StalenessDecision::Fresh);
    }

    #[test]
    fn test_resume_mode_still_sees_remote_updates() {
        let decider = decider(100, 1_000_000, StalenessMode::Resume);
        let decision = decider.decide(Some(&record(5000, 100)), 200);
        assert_eq!(decision, StalenessDecision::Outdated);
    }
}

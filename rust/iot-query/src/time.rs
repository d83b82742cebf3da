//! Time windows applied to telemetry reads.

use chrono::{DateTime, Duration, Utc};

/// Inclusive `[start, end]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilterSpec {
    AllHistory,
    /// The trailing `n` hours ending at the resolution instant.
    RelativeHours(i64),
}

impl TimeFilterSpec {
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<TimeRange> {
        match self {
            TimeFilterSpec::AllHistory => None,
            TimeFilterSpec::RelativeHours(hours) => Some(TimeRange {
                start: now - Duration::hours(*hours),
                end: now,
            }),
        }
    }
}

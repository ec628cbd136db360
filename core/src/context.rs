//! Execution context: the simulated day a run treats as "today".
//!
//! The core never reads the wall clock. A scheduler adapter supplies
//! real values through `from_scheduler`; tests use `fixture`.

use crate::error::{GenError, GenResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    date:      NaiveDate,
    timestamp: NaiveDateTime,
}

impl ExecutionContext {
    /// The timestamp must fall on `date`.
    pub fn new(date: NaiveDate, timestamp: NaiveDateTime) -> GenResult<Self> {
        if timestamp.date() != date {
            return Err(GenError::InvalidContext(format!(
                "timestamp {timestamp} is not on simulated date {date}"
            )));
        }
        Ok(Self { date, timestamp })
    }

    /// 2024-12-12 at 06:00:00, the default dry-run day.
    pub fn fixture() -> Self {
        let date = NaiveDate::from_ymd_opt(2024, 12, 12).expect("fixture date is valid");
        let timestamp = date.and_hms_opt(6, 0, 0).expect("fixture time is valid");
        Self { date, timestamp }
    }

    /// Parse scheduler-style `ds` (`YYYY-MM-DD`) and `ts` (ISO-8601,
    /// offset optional). An offset is dropped and wall-clock time kept.
    pub fn from_scheduler(ds: &str, ts: &str) -> GenResult<Self> {
        let date = NaiveDate::parse_from_str(ds.trim(), "%Y-%m-%d")
            .map_err(|e| GenError::InvalidContext(format!("bad ds '{ds}': {e}")))?;
        let ts = ts.trim();
        let timestamp = match DateTime::parse_from_rfc3339(ts) {
            Ok(dt) => dt.naive_local(),
            Err(_) => NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S")
                .map_err(|e| GenError::InvalidContext(format!("bad ts '{ts}': {e}")))?,
        };
        Self::new(date, timestamp)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// The simulated date `days` before this one.
    pub fn days_ago(&self, days: u32) -> NaiveDate {
        self.date - Duration::days(days as i64)
    }
}

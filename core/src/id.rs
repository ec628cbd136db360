//! Day-scoped identifiers.
//!
//! An identifier is `YYYYMMDD * 100 + sequence`, where the sequence is
//! a 2-digit number unique within one simulated day and one record
//! category. The originating date can always be read back from the id.
//!
//! Sequence 0 is never issued; the first record of a day gets 01.
//! Sequence 100 would spill into the day digits, so a day holds at
//! most 99 records per category. Running past that is a hard error.

use crate::{
    error::{GenError, GenResult},
    types::RecordCategory,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SEQUENCE_SCALE: u64 = 100;
pub const FIRST_SEQUENCE: u32 = 1;
pub const MAX_SEQUENCE:   u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayScopedId(u64);

impl DayScopedId {
    /// Encode a (date, sequence) pair. Fails once the sequence leaves
    /// the 2-digit window.
    pub fn encode(date: NaiveDate, category: RecordCategory, sequence: u32) -> GenResult<Self> {
        if !(FIRST_SEQUENCE..=MAX_SEQUENCE).contains(&sequence) {
            return Err(GenError::SequenceExhausted { date, category, sequence });
        }
        Ok(Self(date_key(date) * SEQUENCE_SCALE + sequence as u64))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn sequence(&self) -> u32 {
        (self.0 % SEQUENCE_SCALE) as u32
    }

    /// The simulated date baked into this id, if the day digits form a
    /// real calendar date.
    pub fn date(&self) -> Option<NaiveDate> {
        let key = self.0 / SEQUENCE_SCALE;
        let year = (key / 10_000) as i32;
        let month = ((key / 100) % 100) as u32;
        let day = (key % 100) as u32;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// True when the id carries a real date and a sequence in range.
    pub fn is_well_formed(&self) -> bool {
        self.date().is_some() && (FIRST_SEQUENCE..=MAX_SEQUENCE).contains(&self.sequence())
    }
}

impl fmt::Display for DayScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `YYYYMMDD` as an integer.
pub fn date_key(date: NaiveDate) -> u64 {
    date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

/// Per-day, per-category sequence counter.
///
/// One counter is created per category for a run and passed by `&mut`
/// into every pass that issues ids of that category.
#[derive(Debug, Clone)]
pub struct DailySequence {
    date:     NaiveDate,
    category: RecordCategory,
    next:     u32,
}

impl DailySequence {
    pub fn new(date: NaiveDate, category: RecordCategory) -> Self {
        Self { date, category, next: FIRST_SEQUENCE }
    }

    /// Issue the next id for this day.
    pub fn allocate(&mut self) -> GenResult<DayScopedId> {
        let id = DayScopedId::encode(self.date, self.category, self.next)?;
        self.next += 1;
        Ok(id)
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u32 {
        self.next - FIRST_SEQUENCE
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

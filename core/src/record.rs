//! Raw record types, one per warehouse landing table.
//!
//! Field order is column order in the written files; `id` comes first.

use crate::id::DayScopedId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A row type with a fixed column list, matching its serde field order.
pub trait CsvRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawUser {
    pub id: DayScopedId,
    pub name: String,
    pub registration_date: NaiveDate,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawUserPreference {
    pub id: DayScopedId,
    pub user_id: DayScopedId,
    pub preferred_language: String,
    pub notifications_enabled: bool,
    pub marketing_opt_in: bool,
    #[serde(serialize_with = "warehouse_timestamp")]
    pub event_timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub id: DayScopedId,
    pub user_id: DayScopedId,
    pub transaction_date: NaiveDate,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl CsvRow for RawUser {
    const COLUMNS: &'static [&'static str] = &["id", "name", "registration_date", "email"];
}

impl CsvRow for RawUserPreference {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "preferred_language",
        "notifications_enabled",
        "marketing_opt_in",
        "event_timestamp",
    ];
}

impl CsvRow for RawTransaction {
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "transaction_date", "amount", "type"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn sign(&self) -> i64 {
        match self {
            Self::Deposit    => 1,
            Self::Withdrawal => -1,
        }
    }
}

/// Largest transaction magnitude, 100.00.
pub const MAX_AMOUNT_CENTS: u64 = 10_000;

/// A signed amount held in cents. Positive for deposits, negative for
/// withdrawals. Written with exactly two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    cents: i64,
}

impl Amount {
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `YYYY-MM-DD HH:MM:SS`, the form the warehouse autodetects.
fn warehouse_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_two_decimals() {
        assert_eq!(Amount::from_cents(1).to_string(), "0.01");
        assert_eq!(Amount::from_cents(-1).to_string(), "-0.01");
        assert_eq!(Amount::from_cents(10_000).to_string(), "100.00");
        assert_eq!(Amount::from_cents(-4_507).to_string(), "-45.07");
    }

    #[test]
    fn transaction_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TransactionType::Withdrawal).unwrap(), "\"withdrawal\"");
        assert_eq!(TransactionType::Withdrawal.sign(), -1);
    }
}

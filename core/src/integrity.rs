//! Post-generation checks of the referential and value invariants.
//!
//! The generator upholds these by construction. `verify` exists so a
//! run can prove it before anything is handed downstream.

use crate::{
    config::{GeneratorConfig, MAX_PREFERENCE_WINDOW_SECS},
    dataset::RawDataset,
    id::DayScopedId,
    record::{TransactionType, MAX_AMOUNT_CENTS},
    types::RecordCategory,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    DuplicateId { category: RecordCategory, id: DayScopedId },
    MalformedId { category: RecordCategory, id: DayScopedId },
    WrongIdDate { category: RecordCategory, id: DayScopedId },
    DanglingPreference { id: DayScopedId, user_id: DayScopedId },
    DuplicatePreference { user_id: DayScopedId },
    DanglingTransaction { id: DayScopedId, user_id: DayScopedId },
    UnexpectedTransactionDate { id: DayScopedId, date: NaiveDate },
    AmountOutOfRange { id: DayScopedId, cents: i64 },
    AmountSignMismatch { id: DayScopedId, kind: TransactionType },
    PreferenceOutsideWindow { id: DayScopedId },
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { category, id } => write!(f, "{category}: duplicate id {id}"),
            Self::MalformedId { category, id } => write!(f, "{category}: malformed id {id}"),
            Self::WrongIdDate { category, id } => {
                write!(f, "{category}: id {id} not issued on the run's day")
            }
            Self::DanglingPreference { id, user_id } => {
                write!(f, "preference {id} references unknown user {user_id}")
            }
            Self::DuplicatePreference { user_id } => {
                write!(f, "user {user_id} has more than one preference")
            }
            Self::DanglingTransaction { id, user_id } => {
                write!(f, "transaction {id} references invalid user {user_id}")
            }
            Self::UnexpectedTransactionDate { id, date } => {
                write!(f, "transaction {id} dated {date} outside the run's days")
            }
            Self::AmountOutOfRange { id, cents } => {
                write!(f, "transaction {id} amount {cents} cents out of range")
            }
            Self::AmountSignMismatch { id, kind } => {
                write!(f, "transaction {id} sign disagrees with type {kind:?}")
            }
            Self::PreferenceOutsideWindow { id } => {
                write!(f, "preference {id} timestamp outside the event window")
            }
        }
    }
}

impl RawDataset {
    /// Check every invariant; an empty result means the dataset is sound.
    pub fn verify(&self, config: &GeneratorConfig) -> Vec<IntegrityViolation> {
        let mut out = Vec::new();
        let today = self.context.date();

        check_ids(RecordCategory::User, self.users.iter().map(|u| u.id), today, &mut out);
        check_ids(
            RecordCategory::UserPreference,
            self.preferences.iter().map(|p| p.id),
            today,
            &mut out,
        );
        check_ids(
            RecordCategory::Transaction,
            self.transactions.iter().map(|t| t.id),
            today,
            &mut out,
        );

        let user_ids: HashSet<DayScopedId> = self.users.iter().map(|u| u.id).collect();
        let window = config.preference_window_secs.min(MAX_PREFERENCE_WINDOW_SECS);
        let window_start = self.context.timestamp() - Duration::seconds(window as i64);
        let mut with_preference = HashSet::new();
        for p in &self.preferences {
            if !user_ids.contains(&p.user_id) {
                out.push(IntegrityViolation::DanglingPreference { id: p.id, user_id: p.user_id });
            }
            if !with_preference.insert(p.user_id) {
                out.push(IntegrityViolation::DuplicatePreference { user_id: p.user_id });
            }
            if p.event_timestamp > self.context.timestamp() || p.event_timestamp < window_start {
                out.push(IntegrityViolation::PreferenceOutsideWindow { id: p.id });
            }
        }

        let prior: Vec<NaiveDate> = (1..=config.prior_days).map(|d| self.context.days_ago(d)).collect();
        for t in &self.transactions {
            if t.transaction_date == today {
                if !user_ids.contains(&t.user_id) {
                    out.push(IntegrityViolation::DanglingTransaction { id: t.id, user_id: t.user_id });
                }
            } else if prior.contains(&t.transaction_date) {
                if !t.user_id.is_well_formed() || t.user_id.date() != Some(t.transaction_date) {
                    out.push(IntegrityViolation::DanglingTransaction { id: t.id, user_id: t.user_id });
                }
            } else {
                out.push(IntegrityViolation::UnexpectedTransactionDate {
                    id: t.id,
                    date: t.transaction_date,
                });
            }

            let cents = t.amount.cents();
            let magnitude = cents.unsigned_abs();
            if magnitude > MAX_AMOUNT_CENTS || !config.amount_cents.contains(magnitude) {
                out.push(IntegrityViolation::AmountOutOfRange { id: t.id, cents });
            }
            if cents.signum() != t.kind.sign() {
                out.push(IntegrityViolation::AmountSignMismatch { id: t.id, kind: t.kind });
            }
        }

        out
    }
}

fn check_ids(
    category: RecordCategory,
    ids: impl Iterator<Item = DayScopedId>,
    today: NaiveDate,
    out: &mut Vec<IntegrityViolation>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !id.is_well_formed() {
            out.push(IntegrityViolation::MalformedId { category, id });
        } else if id.date() != Some(today) {
            out.push(IntegrityViolation::WrongIdDate { category, id });
        }
        if !seen.insert(id) {
            out.push(IntegrityViolation::DuplicateId { category, id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::ExecutionContext,
        record::{Amount, RawTransaction, RawUser},
    };

    fn one_user() -> RawDataset {
        let ctx = ExecutionContext::fixture();
        RawDataset {
            context: ctx,
            users: vec![RawUser {
                id: DayScopedId::from_raw(2024121201),
                name: "Ana Silva".into(),
                registration_date: ctx.date(),
                email: "ana.silva@example.com".into(),
            }],
            preferences: vec![],
            transactions: vec![],
        }
    }

    fn txn(id: u64, user: u64, date: NaiveDate, cents: i64, kind: TransactionType) -> RawTransaction {
        RawTransaction {
            id: DayScopedId::from_raw(id),
            user_id: DayScopedId::from_raw(user),
            transaction_date: date,
            amount: Amount::from_cents(cents),
            kind,
        }
    }

    #[test]
    fn clean_dataset_passes() {
        let mut data = one_user();
        let today = data.context.date();
        data.transactions.push(txn(2024121201, 2024121201, today, 100, TransactionType::Deposit));
        data.transactions.push(txn(
            2024121202,
            2024121103,
            data.context.days_ago(1),
            -1,
            TransactionType::Withdrawal,
        ));
        assert!(data.verify(&GeneratorConfig::default()).is_empty());
    }

    #[test]
    fn catches_dangling_and_duplicate_and_bad_amounts() {
        let mut data = one_user();
        let today = data.context.date();
        data.transactions.push(txn(2024121201, 2024121299, today, 100, TransactionType::Deposit));
        data.transactions.push(txn(2024121201, 2024121201, today, -100, TransactionType::Deposit));
        data.transactions.push(txn(2024121202, 2024121201, today, 10_001, TransactionType::Deposit));
        data.transactions.push(txn(
            2024121203,
            2024121001,
            data.context.days_ago(1),
            5,
            TransactionType::Deposit,
        ));

        let violations = data.verify(&GeneratorConfig::default());
        let has = |want: &IntegrityViolation| violations.contains(want);
        assert!(has(&IntegrityViolation::DanglingTransaction {
            id: DayScopedId::from_raw(2024121201),
            user_id: DayScopedId::from_raw(2024121299),
        }));
        assert!(has(&IntegrityViolation::DuplicateId {
            category: RecordCategory::Transaction,
            id: DayScopedId::from_raw(2024121201),
        }));
        assert!(has(&IntegrityViolation::AmountSignMismatch {
            id: DayScopedId::from_raw(2024121201),
            kind: TransactionType::Deposit,
        }));
        assert!(has(&IntegrityViolation::AmountOutOfRange {
            id: DayScopedId::from_raw(2024121202),
            cents: 10_001,
        }));
        assert!(has(&IntegrityViolation::DanglingTransaction {
            id: DayScopedId::from_raw(2024121203),
            user_id: DayScopedId::from_raw(2024121001),
        }));
    }

    #[test]
    fn transactions_outside_the_run_days_are_flagged() {
        let mut data = one_user();
        let three_ago = data.context.days_ago(3);
        data.transactions.push(txn(2024121201, 2024120901, three_ago, 100, TransactionType::Deposit));
        assert_eq!(
            data.verify(&GeneratorConfig::default()),
            vec![IntegrityViolation::UnexpectedTransactionDate {
                id: DayScopedId::from_raw(2024121201),
                date: three_ago,
            }]
        );
    }

    #[test]
    fn ceiling_holds_even_when_config_allows_more() {
        let mut data = one_user();
        let today = data.context.date();
        data.transactions.push(txn(2024121201, 2024121201, today, 28_904, TransactionType::Deposit));
        let loose = GeneratorConfig {
            amount_cents: crate::types::CountRange::new(20_000, 30_000),
            ..GeneratorConfig::default()
        };
        assert_eq!(
            data.verify(&loose),
            vec![IntegrityViolation::AmountOutOfRange {
                id: DayScopedId::from_raw(2024121201),
                cents: 28_904,
            }]
        );
    }
}

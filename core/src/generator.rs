//! The synthetic record generator.
//!
//! GENERATION ORDER (fixed; reordering changes every output):
//!   1. Draw the user count and sample names      (sampling stream)
//!   2. Per sampled name: user + preference       (users / preferences streams)
//!   3. Current-day transactions, per new user    (transactions stream)
//!   4. Prior-day transactions, day-1 then day-2  (transactions stream)
//!
//! RULES:
//!   - Every precondition is checked before the first record exists.
//!   - One DailySequence per category, passed explicitly through each
//!     pass. The transaction counter spans steps 3 and 4.
//!   - Nothing is written here; callers decide where the dataset goes.

use crate::{
    config::GeneratorConfig,
    context::ExecutionContext,
    dataset::RawDataset,
    error::{GenError, GenResult},
    id::{DailySequence, DayScopedId},
    record::{Amount, RawTransaction, RawUser, RawUserPreference, TransactionType},
    rng::{RngBank, StreamRng, StreamSlot},
    types::{RecordCategory, Seed},
    vocabulary::{derive_email, Vocabulary},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;

pub struct RawDataGenerator {
    config:    GeneratorConfig,
    names:     Vocabulary,
    languages: Vocabulary,
}

impl RawDataGenerator {
    pub fn new(config: GeneratorConfig, names: Vocabulary, languages: Vocabulary) -> GenResult<Self> {
        config.validate()?;
        Ok(Self { config, names, languages })
    }

    /// Build a generator reading both vocabularies from `data_dir`.
    pub fn from_data_dir(config: GeneratorConfig, data_dir: &Path) -> GenResult<Self> {
        let names = Vocabulary::load("names", &config.names_path(data_dir))?;
        let languages = Vocabulary::load("languages", &config.languages_path(data_dir))?;
        Self::new(config, names, languages)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one simulated day, drawing the user count from
    /// `config.new_users`.
    pub fn generate(&self, ctx: &ExecutionContext, seed: Seed) -> GenResult<RawDataset> {
        let bank = RngBank::new(seed);
        let mut sampling = bank.for_stream(StreamSlot::Sampling, ctx.date());
        let range = self.config.new_users;
        let count = sampling.next_in_range(range.min, range.max) as usize;
        self.run(ctx, &bank, &mut sampling, count)
    }

    /// Generate one simulated day with exactly `count` new users.
    pub fn generate_with_count(
        &self,
        ctx: &ExecutionContext,
        seed: Seed,
        count: usize,
    ) -> GenResult<RawDataset> {
        let bank = RngBank::new(seed);
        let mut sampling = bank.for_stream(StreamSlot::Sampling, ctx.date());
        self.run(ctx, &bank, &mut sampling, count)
    }

    fn run(
        &self,
        ctx: &ExecutionContext,
        bank: &RngBank,
        sampling: &mut StreamRng,
        count: usize,
    ) -> GenResult<RawDataset> {
        if count > self.names.len() {
            return Err(GenError::InsufficientNames {
                requested: count,
                available: self.names.len(),
            });
        }
        let epoch_start = self.epoch_start();
        if ctx.timestamp() <= epoch_start {
            return Err(GenError::InvalidContext(format!(
                "execution instant {} is not after registration epoch {}",
                ctx.timestamp(),
                self.config.registration_epoch
            )));
        }

        let date = ctx.date();
        log::debug!("{date}: sampling {count} of {} {}", self.names.len(), self.names.name());
        let sampled: Vec<&str> = sampling
            .sample_indices(self.names.len(), count)
            .into_iter()
            .map(|i| self.names.entries()[i].as_str())
            .collect();

        let mut users_rng = bank.for_stream(StreamSlot::Users, date);
        let mut prefs_rng = bank.for_stream(StreamSlot::Preferences, date);
        let mut txn_rng = bank.for_stream(StreamSlot::Transactions, date);

        let mut user_seq = DailySequence::new(date, RecordCategory::User);
        let mut pref_seq = DailySequence::new(date, RecordCategory::UserPreference);
        let mut txn_seq = DailySequence::new(date, RecordCategory::Transaction);

        let mut users = Vec::with_capacity(count);
        let mut preferences = Vec::with_capacity(count);
        let mut planned = Vec::with_capacity(count);

        for name in sampled {
            let user = self.build_user(ctx, name, &mut user_seq, &mut users_rng)?;
            let preference = self.build_preference(ctx, user.id, &mut pref_seq, &mut prefs_rng)?;
            let per_user = self.config.transactions_per_user;
            let txn_count = users_rng.next_in_range(per_user.min, per_user.max);
            planned.push((user.id, txn_count));
            users.push(user);
            preferences.push(preference);
        }

        let mut transactions = Vec::new();
        for (user_id, txn_count) in planned {
            for _ in 0..txn_count {
                let txn = self.build_transaction(date, user_id, &mut txn_seq, &mut txn_rng)?;
                transactions.push(txn);
            }
        }
        let current_day = transactions.len();
        log::debug!("{date}: {current_day} current-day transactions");

        for days_ago in 1..=self.config.prior_days {
            let prior_date = ctx.days_ago(days_ago);
            let range = self.config.prior_day_transactions;
            let txn_count = txn_rng.next_in_range(range.min, range.max) as u32;
            for position in 1..=txn_count {
                // Prior users are not read back from storage; the reference is
                // rebuilt from the position they would have had that day.
                let user_id = DayScopedId::encode(prior_date, RecordCategory::User, position)?;
                let txn = self.build_transaction(prior_date, user_id, &mut txn_seq, &mut txn_rng)?;
                transactions.push(txn);
            }
            log::debug!("{date}: {txn_count} transactions for users of {prior_date}");
        }

        log::info!(
            "{date}: generated {} users, {} preferences, {} transactions ({} sequence ids used)",
            users.len(),
            preferences.len(),
            transactions.len(),
            txn_seq.issued()
        );

        Ok(RawDataset {
            context: *ctx,
            users,
            preferences,
            transactions,
        })
    }

    fn epoch_start(&self) -> NaiveDateTime {
        self.config.registration_epoch.and_time(chrono::NaiveTime::MIN)
    }

    fn build_user(
        &self,
        ctx: &ExecutionContext,
        name: &str,
        seq: &mut DailySequence,
        rng: &mut StreamRng,
    ) -> GenResult<RawUser> {
        let id = seq.allocate()?;
        let registration_date = self.registration_date(ctx, rng);
        Ok(RawUser {
            id,
            name: name.to_string(),
            registration_date,
            email: derive_email(name, &self.config.email_separator, &self.config.email_domain),
        })
    }

    /// Uniform second in [epoch, execution instant), truncated to a date.
    fn registration_date(&self, ctx: &ExecutionContext, rng: &mut StreamRng) -> NaiveDate {
        let start = self.epoch_start();
        let span = (ctx.timestamp() - start).num_seconds() as u64;
        let offset = rng.next_u64_below(span);
        (start + Duration::seconds(offset as i64)).date()
    }

    fn build_preference(
        &self,
        ctx: &ExecutionContext,
        user_id: DayScopedId,
        seq: &mut DailySequence,
        rng: &mut StreamRng,
    ) -> GenResult<RawUserPreference> {
        let id = seq.allocate()?;
        let preferred_language = rng.pick(self.languages.entries()).clone();
        let notifications_enabled = rng.coin();
        let marketing_opt_in = rng.coin();
        let back = rng.next_in_range(0, self.config.preference_window_secs);
        Ok(RawUserPreference {
            id,
            user_id,
            preferred_language,
            notifications_enabled,
            marketing_opt_in,
            event_timestamp: ctx.timestamp() - Duration::seconds(back as i64),
        })
    }

    /// `transaction_date` may be a prior day; the id always comes from
    /// the current day's counter.
    fn build_transaction(
        &self,
        transaction_date: NaiveDate,
        user_id: DayScopedId,
        seq: &mut DailySequence,
        rng: &mut StreamRng,
    ) -> GenResult<RawTransaction> {
        let kind = if rng.coin() {
            TransactionType::Deposit
        } else {
            TransactionType::Withdrawal
        };
        let range = self.config.amount_cents;
        let magnitude = rng.next_in_range(range.min, range.max) as i64;
        Ok(RawTransaction {
            id: seq.allocate()?,
            user_id,
            transaction_date,
            amount: Amount::from_cents(kind.sign() * magnitude),
            kind,
        })
    }
}

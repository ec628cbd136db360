use crate::{
    error::{GenError, GenResult},
    record::MAX_AMOUNT_CENTS,
    types::CountRange,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preference events must stay within a day of the execution instant.
pub const MAX_PREFERENCE_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Knobs for the synthetic record generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// How many new users a run creates, drawn uniformly.
    pub new_users: CountRange,
    /// Earliest possible registration date.
    pub registration_epoch: NaiveDate,
    pub email_domain: String,
    /// Replaces spaces in the lower-cased name to form the mailbox.
    pub email_separator: String,
    /// Preference events land within this many seconds before the
    /// execution instant.
    pub preference_window_secs: u64,
    /// Current-day transactions per new user.
    pub transactions_per_user: CountRange,
    /// Transactions per prior day attributed to earlier users.
    pub prior_day_transactions: CountRange,
    pub prior_days: u32,
    /// Transaction magnitude in cents.
    pub amount_cents: CountRange,
    pub names_file: String,
    pub languages_file: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            new_users: CountRange::new(5, 30),
            registration_epoch: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            email_domain: "example.com".into(),
            email_separator: ".".into(),
            preference_window_secs: 3 * 60 * 60,
            transactions_per_user: CountRange::new(0, 3),
            prior_day_transactions: CountRange::new(1, 4),
            prior_days: 2,
            amount_cents: CountRange::new(1, 10_000),
            names_file: "random_names.txt".into(),
            languages_file: "languages.txt".into(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> GenResult<()> {
        let ranges = [
            ("new_users", self.new_users),
            ("transactions_per_user", self.transactions_per_user),
            ("prior_day_transactions", self.prior_day_transactions),
            ("amount_cents", self.amount_cents),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                return Err(GenError::InvalidConfig(format!(
                    "{name}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }
        if self.amount_cents.min == 0 {
            return Err(GenError::InvalidConfig(
                "amount_cents.min must be at least 1 cent".into(),
            ));
        }
        if self.amount_cents.max > MAX_AMOUNT_CENTS {
            return Err(GenError::InvalidConfig(format!(
                "amount_cents.max {} exceeds {MAX_AMOUNT_CENTS} cents",
                self.amount_cents.max
            )));
        }
        if self.preference_window_secs > MAX_PREFERENCE_WINDOW_SECS {
            return Err(GenError::InvalidConfig(format!(
                "preference_window_secs {} exceeds {MAX_PREFERENCE_WINDOW_SECS}",
                self.preference_window_secs
            )));
        }
        if self.email_domain.trim().is_empty() {
            return Err(GenError::InvalidConfig("email_domain is empty".into()));
        }
        Ok(())
    }

    pub fn names_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.names_file)
    }

    pub fn languages_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.languages_file)
    }
}

/// Static description of the daily ELT schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub dag_id: String,
    pub display_name: String,
    /// Cron expression, handed to the scheduler verbatim.
    pub schedule: String,
    pub start_date: NaiveDate,
    pub max_active_runs: u32,
    pub max_active_tasks: u32,
    pub bucket: String,
    /// Object prefix under which raw files are uploaded.
    pub object_prefix: String,
    /// Warehouse project that owns the landing dataset.
    pub warehouse_project: String,
    pub landing_dataset: String,
    pub partition_field: String,
    pub dbt_project_dir: PathBuf,
    /// dbt selector namespace, e.g. `challenge`.
    pub dbt_namespace: String,
    /// Follow every final model run with a dbt test.
    pub dbt_tests: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dag_id: "challenge".into(),
            display_name: "Daily raw data ELT".into(),
            schedule: "0 6 * * *".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 12, 11).unwrap_or(NaiveDate::MIN),
            max_active_runs: 1,
            max_active_tasks: 2,
            bucket: "daybatch-raw".into(),
            object_prefix: "challenge_data".into(),
            warehouse_project: "daybatch-warehouse".into(),
            landing_dataset: "l1_landing".into(),
            partition_field: "ds".into(),
            dbt_project_dir: PathBuf::from("dbt/ancient"),
            dbt_namespace: "challenge".into(),
            dbt_tests: false,
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> GenResult<()> {
        if self.dag_id.trim().is_empty() {
            return Err(GenError::InvalidConfig("dag_id is empty".into()));
        }
        if self.max_active_runs == 0 || self.max_active_tasks == 0 {
            return Err(GenError::InvalidConfig(
                "max_active_runs and max_active_tasks must be positive".into(),
            ));
        }
        if self.bucket.trim().is_empty() {
            return Err(GenError::InvalidConfig("bucket is empty".into()));
        }
        Ok(())
    }
}

/// Top-level config file: `{ "generator": {..}, "pipeline": {..} }`.
/// Either section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub generator: GeneratorConfig,
    pub pipeline: PipelineSettings,
}

impl BatchConfig {
    /// Load and validate a JSON config file.
    /// In tests, use BatchConfig::default().
    pub fn load(path: &Path) -> GenResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: BatchConfig = serde_json::from_str(&content)?;
        config.generator.validate()?;
        config.pipeline.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

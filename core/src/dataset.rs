//! The three record sets for one simulated day, and their CSV output.

use crate::{
    context::ExecutionContext,
    error::GenResult,
    record::{CsvRow, RawTransaction, RawUser, RawUserPreference},
    types::RecordCategory,
};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataset {
    pub context:      ExecutionContext,
    pub users:        Vec<RawUser>,
    pub preferences:  Vec<RawUserPreference>,
    pub transactions: Vec<RawTransaction>,
}

impl RawDataset {
    pub fn len_of(&self, category: RecordCategory) -> usize {
        match category {
            RecordCategory::User           => self.users.len(),
            RecordCategory::UserPreference => self.preferences.len(),
            RecordCategory::Transaction    => self.transactions.len(),
        }
    }

    /// Write one record set as CSV, header first.
    pub fn write_table<W: Write>(&self, category: RecordCategory, writer: W) -> GenResult<()> {
        match category {
            RecordCategory::User           => write_rows(writer, &self.users),
            RecordCategory::UserPreference => write_rows(writer, &self.preferences),
            RecordCategory::Transaction    => write_rows(writer, &self.transactions),
        }
    }

    /// Write all three record sets into `dir` as `raw_<table>.csv`,
    /// replacing existing files. Returns the paths written.
    pub fn write_csv(&self, dir: &Path) -> GenResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(RecordCategory::ALL.len());
        for category in RecordCategory::ALL {
            let path = dir.join(category.raw_file_name());
            let file = std::fs::File::create(&path)?;
            self.write_table(category, file)?;
            log::info!(
                "Wrote {} {} rows to {}",
                self.len_of(category),
                category,
                path.display()
            );
            written.push(path);
        }
        Ok(written)
    }

    /// Render one record set to a CSV string.
    pub fn table_to_string(&self, category: RecordCategory) -> GenResult<String> {
        let mut buf = Vec::new();
        self.write_table(category, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Header is written from `T::COLUMNS` so an empty set still has one.
fn write_rows<W: Write, T: CsvRow>(writer: W, rows: &[T]) -> GenResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(T::COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Paths of the three raw files inside `dir`.
pub fn raw_file_paths(dir: &Path) -> Vec<PathBuf> {
    RecordCategory::ALL
        .iter()
        .map(|c| dir.join(c.raw_file_name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        id::DayScopedId,
        record::{Amount, TransactionType},
    };

    fn sample() -> RawDataset {
        let ctx = ExecutionContext::fixture();
        let uid = DayScopedId::from_raw(2024121201);
        RawDataset {
            context: ctx,
            users: vec![RawUser {
                id: uid,
                name: "Ana Silva".into(),
                registration_date: ctx.date(),
                email: "ana.silva@example.com".into(),
            }],
            preferences: vec![RawUserPreference {
                id: uid,
                user_id: uid,
                preferred_language: "pt".into(),
                notifications_enabled: true,
                marketing_opt_in: false,
                event_timestamp: ctx.timestamp(),
            }],
            transactions: vec![RawTransaction {
                id: DayScopedId::from_raw(2024121201),
                user_id: uid,
                transaction_date: ctx.date(),
                amount: Amount::from_cents(-505),
                kind: TransactionType::Withdrawal,
            }],
        }
    }

    #[test]
    fn tables_have_header_and_id_first() {
        let data = sample();
        let users = data.table_to_string(RecordCategory::User).unwrap();
        assert_eq!(
            users,
            "id,name,registration_date,email\n2024121201,Ana Silva,2024-12-12,ana.silva@example.com\n"
        );

        let prefs = data.table_to_string(RecordCategory::UserPreference).unwrap();
        assert!(prefs.starts_with(
            "id,user_id,preferred_language,notifications_enabled,marketing_opt_in,event_timestamp\n"
        ));
        assert!(prefs.contains("2024121201,2024121201,pt,true,false,2024-12-12 06:00:00"));

        let txns = data.table_to_string(RecordCategory::Transaction).unwrap();
        assert_eq!(
            txns,
            "id,user_id,transaction_date,amount,type\n2024121201,2024121201,2024-12-12,-5.05,withdrawal\n"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut data = sample();
        data.transactions.clear();
        let txns = data.table_to_string(RecordCategory::Transaction).unwrap();
        assert_eq!(txns, "id,user_id,transaction_date,amount,type\n");
    }

    #[test]
    fn writes_three_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let written = sample().write_csv(dir.path()).unwrap();
        assert_eq!(written, raw_file_paths(dir.path()));
        for path in written {
            assert!(path.exists(), "{} missing", path.display());
        }
    }
}

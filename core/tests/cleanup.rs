//! Local raw file removal after upload.

use daybatch_core::{
    cleanup::{remove_files, remove_raw_files},
    config::GeneratorConfig,
    context::ExecutionContext,
    dataset::raw_file_paths,
    generator::RawDataGenerator,
    vocabulary::Vocabulary,
};
use std::path::PathBuf;

#[test]
fn missing_file_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("raw_users.csv");
    let absent = dir.path().join("raw_transactions.csv");
    std::fs::write(&present, "id\n").unwrap();

    let report = remove_files(&[present.clone(), absent.clone()]).unwrap();

    assert_eq!(report.removed, vec![present.clone()]);
    assert_eq!(report.missing, vec![absent]);
    assert!(!report.is_clean());
    assert!(!present.exists());
}

#[test]
fn empty_list_removes_the_three_raw_files() {
    let dir = tempfile::tempdir().unwrap();
    let g = RawDataGenerator::new(
        GeneratorConfig::default(),
        Vocabulary::from_lines("names", ["Ada Lovelace", "Alan Turing"]).unwrap(),
        Vocabulary::from_lines("languages", ["en"]).unwrap(),
    )
    .unwrap();
    let data = g.generate_with_count(&ExecutionContext::fixture(), 1, 2).unwrap();
    data.write_csv(dir.path()).unwrap();

    let report = remove_raw_files(dir.path(), &[]).unwrap();

    assert_eq!(report.removed, raw_file_paths(dir.path()));
    assert!(report.is_clean());
    assert!(raw_file_paths(dir.path()).iter().all(|p| !p.exists()));
}

#[test]
fn explicit_names_resolve_against_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("raw_user_preferences.csv"), "id\n").unwrap();

    let report = remove_raw_files(dir.path(), &[PathBuf::from("raw_user_preferences.csv")]).unwrap();

    assert_eq!(report.removed, vec![dir.path().join("raw_user_preferences.csv")]);
    assert!(report.missing.is_empty());
}

#[test]
fn running_twice_reports_everything_missing() {
    let dir = tempfile::tempdir().unwrap();
    let report = remove_raw_files(dir.path(), &[]).unwrap();
    assert!(report.removed.is_empty());
    assert_eq!(report.missing.len(), 3);
}

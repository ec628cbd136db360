use crate::types::RecordCategory;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Name pool too small: requested {requested} users, pool has {available} names")]
    InsufficientNames { requested: usize, available: usize },

    #[error("Vocabulary file {} cannot be read: {source}", .path.display())]
    VocabularyMissing {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Vocabulary '{name}' is empty")]
    EmptyVocabulary { name: String },

    #[error("Exceeded daily ID limit: {category} sequence {sequence} on {date}")]
    SequenceExhausted {
        date:     NaiveDate,
        category: RecordCategory,
        sequence: u32,
    },

    #[error("Invalid execution context: {0}")]
    InvalidContext(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Task '{id}' is already defined")]
    DuplicateTask { id: String },

    #[error("Task '{id}' not found")]
    UnknownTask { id: String },

    #[error("Task '{id}' cannot depend on itself")]
    SelfDependency { id: String },

    #[error("Dependency cycle through task '{id}'")]
    CycleDetected { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;

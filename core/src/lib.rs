//! Synthetic raw data for the daily ELT batch: users, preferences and
//! transactions for one simulated day, plus the declared task graph that
//! moves them through the warehouse layers.

pub mod cleanup;
pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod id;
pub mod integrity;
pub mod pipeline;
pub mod record;
pub mod rng;
pub mod types;
pub mod vocabulary;

//! Storage Layer
//!
//! Defines the sink that computed risk levels are handed to, and an
//! in-memory repository implementing it.

mod repository;

pub use repository::{Repository, RiskRecord, RiskSink};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

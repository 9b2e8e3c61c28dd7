//! Repository Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Risk level persisted for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub sample_id: String,
    pub risk_level: String,
    pub model_version: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Destination for computed risk levels, keyed by sample identity.
///
/// Implementations may block; callers treat every write as best-effort.
pub trait RiskSink: Send + Sync {
    /// Store or replace the risk level for `record.sample_id`
    fn record_risk(&self, record: RiskRecord) -> Result<(), StorageError>;
}

/// Repository for risk records (in-memory)
pub struct Repository {
    /// Records, oldest first
    records: Mutex<VecDeque<RiskRecord>>,
    /// Max records kept
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Create a repository keeping at most `max_records` entries
    pub fn with_capacity(max_records: usize) -> Self {
        info!("Creating in-memory risk repository (max {} records)", max_records);
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(1024))),
            max_records: max_records.max(1),
        }
    }

    /// Insert or replace the record for a sample
    pub fn upsert(&self, record: RiskRecord) -> Result<(), StorageError> {
        if record.sample_id.trim().is_empty() {
            return Err(StorageError::InvalidRecord("empty sample_id".to_string()));
        }

        let mut records = self.records.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        records.retain(|r| r.sample_id != record.sample_id);

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }

        debug!("Stored risk {} for sample {}", record.risk_level, record.sample_id);
        records.push_back(record);
        Ok(())
    }

    /// Look up the record for one sample
    pub fn get(&self, sample_id: &str) -> Result<RiskRecord, StorageError> {
        let records = self.records.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        records
            .iter()
            .find(|r| r.sample_id == sample_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// Most recent records first
    pub fn recent(&self, limit: usize) -> Result<Vec<RiskRecord>, StorageError> {
        let records = self.records.lock().map_err(|e| {
            StorageError::DatabaseError(format!("Lock error: {}", e))
        })?;

        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    /// Get total record count
    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskSink for Repository {
    fn record_risk(&self, record: RiskRecord) -> Result<(), StorageError> {
        self.upsert(record)
    }
}

//! Where runs are recorded.
//!
//! The orchestrator writes a record when a run starts, upserts every step
//! transition, and sets the final status. A failing sink never fails a run;
//! its errors are logged and the run continues.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chunlian_core::provider::BoxFuture;
use chunlian_types::{
    couplet::FormData,
    workflow::{CoupletSet, GenerationRecord, RecordStatus, WorkflowStep, upsert_step},
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("no history record with id {0}")]
    NotFound(Uuid),
    #[error("history record {0} already exists")]
    Duplicate(Uuid),
    #[error("history storage failed: {0}")]
    Storage(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Persistence port for run records.
pub trait HistorySink: Send + Sync {
    fn create_record<'a>(&'a self, id: Uuid, form_data: &'a FormData) -> BoxFuture<'a, HistoryResult<()>>;

    /// Apply the step with the amend-last-running-step rule.
    fn add_or_update_step<'a>(&'a self, id: Uuid, step: &'a WorkflowStep) -> BoxFuture<'a, HistoryResult<()>>;

    fn update_record_status<'a>(
        &'a self,
        id: Uuid,
        status: RecordStatus,
        result: Option<&'a CoupletSet>,
        error: Option<&'a str>,
    ) -> BoxFuture<'a, HistoryResult<()>>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHistory;

impl HistorySink for NoHistory {
    fn create_record<'a>(&'a self, _id: Uuid, _form_data: &'a FormData) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn add_or_update_step<'a>(&'a self, _id: Uuid, _step: &'a WorkflowStep) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn update_record_status<'a>(
        &'a self,
        _id: Uuid,
        _status: RecordStatus,
        _result: Option<&'a CoupletSet>,
        _error: Option<&'a str>,
    ) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Process-local store. The lock is only held for the duration of a map
/// operation, never across an await.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: Mutex<HashMap<Uuid, GenerationRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> HistoryResult<MutexGuard<'_, HashMap<Uuid, GenerationRecord>>> {
        self.records
            .lock()
            .map_err(|_| HistoryError::Storage("history lock poisoned".into()))
    }

    fn with_record<T>(&self, id: Uuid, f: impl FnOnce(&mut GenerationRecord) -> T) -> HistoryResult<T> {
        let mut records = self.records()?;
        let record = records.get_mut(&id).ok_or(HistoryError::NotFound(id))?;
        Ok(f(record))
    }

    pub fn get_record(&self, id: Uuid) -> Option<GenerationRecord> {
        self.records().ok()?.get(&id).cloned()
    }

    /// All records, newest first.
    pub fn all_records(&self) -> Vec<GenerationRecord> {
        let mut all: Vec<GenerationRecord> = match self.records() {
            Ok(records) => records.values().cloned().collect(),
            Err(_) => return Vec::new(),
        };
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Returns whether a record was removed.
    pub fn delete_record(&self, id: Uuid) -> bool {
        self.records()
            .map(|mut records| records.remove(&id).is_some())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records() {
            records.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistorySink for InMemoryHistory {
    fn create_record<'a>(&'a self, id: Uuid, form_data: &'a FormData) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async move {
            let mut records = self.records()?;
            if records.contains_key(&id) {
                return Err(HistoryError::Duplicate(id));
            }
            records.insert(id, GenerationRecord::new(id, form_data.clone()));
            Ok(())
        })
    }

    fn add_or_update_step<'a>(&'a self, id: Uuid, step: &'a WorkflowStep) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async move { self.with_record(id, |record| upsert_step(&mut record.steps, step.clone())) })
    }

    fn update_record_status<'a>(
        &'a self,
        id: Uuid,
        status: RecordStatus,
        result: Option<&'a CoupletSet>,
        error: Option<&'a str>,
    ) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async move {
            self.with_record(id, |record| {
                record.status = status;
                if let Some(result) = result {
                    record.result = Some(result.clone());
                }
                if let Some(error) = error {
                    record.error = Some(error.to_owned());
                }
            })
        })
    }
}

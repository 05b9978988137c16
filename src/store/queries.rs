/// Record operations on a store
///
/// Put, fetch, batch delete and clear. None of these prompt; callers pass in
/// the decision they already got from the user.

use crate::error::Result;
use crate::store::models::{Record, Records, TypeFilter};
use crate::store::RecordStore;
use tracing::{debug, info};

/// What a `put` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Replaced,
    /// Id already existed and overwrite was not allowed
    Cancelled,
}

/// Result of a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub records: Records,
    /// False when the store file does not exist yet
    pub store_present: bool,
}

/// Per-id result of a batch delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Result of a batch delete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteReport {
    /// Caller declined; nothing was touched
    pub cancelled: bool,
    pub store_present: bool,
    pub outcomes: Vec<(String, DeleteOutcome)>,
}

impl DeleteReport {
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == DeleteOutcome::Deleted)
            .count()
    }

    pub fn missing(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == DeleteOutcome::NotFound)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl RecordStore {
    /// Insert or replace a record
    ///
    /// # Arguments
    /// * `id` - Record id
    /// * `record` - The record; its kind becomes `element_type`
    /// * `overwrite` - Whether an existing record with this id may be replaced
    ///
    /// # Returns
    /// * `Ok(PutOutcome::Cancelled)` - Id exists and `overwrite` is false; file untouched
    /// * `Ok(PutOutcome::Inserted | Replaced)` - Record stored
    pub fn put(&self, id: &str, record: impl Into<Record>, overwrite: bool) -> Result<PutOutcome> {
        let record = record.into();

        self.update(|records| {
            if records.contains(id) && !overwrite {
                debug!(id, "record exists, not overwriting");
                return Ok(PutOutcome::Cancelled);
            }

            let outcome = match records.insert(id, record) {
                Some(_) => PutOutcome::Replaced,
                None => PutOutcome::Inserted,
            };
            info!(id, ?outcome, path = %self.path().display(), "record stored");
            Ok(outcome)
        })
    }

    /// Fetch records of one kind, or everything with `TypeFilter::Any`
    ///
    /// A missing store file is an empty result with `store_present` unset,
    /// never an error.
    pub fn fetch_by_type(&self, filter: TypeFilter) -> Result<Fetched> {
        if !self.exists() {
            return Ok(Fetched {
                records: Records::new(),
                store_present: false,
            });
        }

        let records = self.load()?.filtered(filter);
        Ok(Fetched {
            records,
            store_present: true,
        })
    }

    /// Delete a batch of ids
    ///
    /// # Arguments
    /// * `ids` - Ids to remove; unknown ids are reported, not fatal
    /// * `proceed` - The caller's confirmation. `false` aborts the whole batch.
    pub fn delete_many<S: AsRef<str>>(&self, ids: &[S], proceed: bool) -> Result<DeleteReport> {
        if !proceed {
            return Ok(DeleteReport::cancelled());
        }

        if !self.exists() {
            return Ok(DeleteReport {
                cancelled: false,
                store_present: false,
                outcomes: ids
                    .iter()
                    .map(|id| (id.as_ref().to_string(), DeleteOutcome::NotFound))
                    .collect(),
            });
        }

        let outcomes = self.update(|records| {
            Ok(ids
                .iter()
                .map(|id| {
                    let id = id.as_ref();
                    let outcome = match records.remove(id) {
                        Some(_) => DeleteOutcome::Deleted,
                        None => DeleteOutcome::NotFound,
                    };
                    debug!(id, ?outcome, "delete");
                    (id.to_string(), outcome)
                })
                .collect())
        })?;

        Ok(DeleteReport {
            cancelled: false,
            store_present: true,
            outcomes,
        })
    }

    /// Replace the store with an empty collection
    pub fn clear(&self) -> Result<()> {
        let _lock = self.lock()?;
        self.save(&Records::new())?;
        info!(path = %self.path().display(), "store cleared");
        Ok(())
    }
}

//! In-memory record store used as data source and status endpoint by the tui host.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::RVError;
use crate::filter::SearchCriteria;
use crate::record::{DEFAULT_KEY_FIELD, Record, field_text, record_id};
use crate::source::{DataSource, StatusUpdater};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<Record>,
    key_field: String,
    status_field: String,
    rejected_statuses: HashSet<String>,
    offline: bool,
    update_calls: usize,
}

impl MemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        MemoryStore {
            records,
            key_field: DEFAULT_KEY_FIELD.to_string(),
            status_field: "status".to_string(),
            rejected_statuses: HashSet::new(),
            offline: false,
            update_calls: 0,
        }
    }

    pub fn with_key_field(mut self, key_field: &str) -> Self {
        self.key_field = key_field.to_string();
        self
    }

    pub fn with_status_field(mut self, status_field: &str) -> Self {
        self.status_field = status_field.to_string();
        self
    }

    /// Moves into these statuses are refused, the way a validation rule on
    /// the server side would refuse them.
    pub fn reject_statuses<I: IntoIterator<Item = S>, S: Into<String>>(mut self, statuses: I) -> Self {
        self.rejected_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// While offline every call fails.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn check_online(&self) -> Result<(), RVError> {
        if self.offline {
            return Err(RVError::Remote("The record store is not reachable.".to_string()));
        }
        Ok(())
    }
}

impl DataSource for MemoryStore {
    #[instrument(skip_all)]
    fn fetch_records(&mut self, criteria: &SearchCriteria) -> Result<Vec<Record>, RVError> {
        self.check_online()?;
        let records = criteria.apply(self.records.clone());
        debug!("Fetched {} records", records.len());
        Ok(records)
    }

    #[instrument(skip_all)]
    fn fetch_records_by_bucket(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<BTreeMap<String, Vec<Record>>, RVError> {
        let mut grouped: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        for record in self.fetch_records(criteria)? {
            let status = field_text(&record, &self.status_field);
            grouped.entry(status).or_default().push(record);
        }
        Ok(grouped)
    }
}

impl StatusUpdater for MemoryStore {
    #[instrument(skip(self))]
    fn update_status(&mut self, id: &str, new_status: &str) -> Result<Record, RVError> {
        self.update_calls += 1;
        self.check_online()?;
        if self.rejected_statuses.contains(new_status) {
            return Err(RVError::Remote(format!(
                "Records cannot be moved to {new_status}."
            )));
        }
        let key_field = self.key_field.clone();
        let record = self
            .records
            .iter_mut()
            .find(|r| record_id(r, &key_field).as_deref() == Some(id))
            .ok_or_else(|| RVError::RecordNotFound(id.to_string()))?;
        record.insert(
            self.status_field.clone(),
            Value::String(new_status.to_string()),
        );
        info!("Record {} moved to {}", id, new_status);
        Ok(record.clone())
    }
}

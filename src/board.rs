//! Status board: records partitioned into fixed status buckets, moved by drag
//! and drop with an optimistic local patch and a resync after every move.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::RVError;
use crate::filter::SearchCriteria;
use crate::record::{DEFAULT_KEY_FIELD, Record, field_text, record_id};
use crate::source::{DataSource, Navigator, Notifier, Severity, StatusUpdater};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    pub value: String,
    pub label: String,
}

impl BucketSpec {
    pub fn new(value: &str, label: &str) -> Self {
        BucketSpec {
            value: value.to_string(),
            label: label.to_string(),
        }
    }

    pub fn user_story_defaults() -> Vec<BucketSpec> {
        vec![
            BucketSpec::new("Backlog", "Backlog"),
            BucketSpec::new("In_Progress", "In Progress"),
            BucketSpec::new("In_Review", "In Review"),
            BucketSpec::new("Done", "Done"),
            BucketSpec::new("Blocked", "Blocked"),
        ]
    }
}

/// Display label of a status, the raw value when it has no bucket.
pub fn label_for(specs: &[BucketSpec], status: &str) -> String {
    specs
        .iter()
        .find(|s| s.value == status)
        .map(|s| s.label.clone())
        .unwrap_or_else(|| status.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub spec: BucketSpec,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub record_id: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub record_id: String,
    pub from: String,
    pub to: String,
}

/// Lifecycle of one move. Both terminal states ask for a resync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MoveState {
    #[default]
    Idle,
    Pending(PendingMove),
    Committed(PendingMove),
    RolledBack(PendingMove),
}

/// Badge and fallback texts of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub status_label: String,
    pub priority_label: String,
    pub priority_class: &'static str,
    pub assignee: String,
    pub feature: String,
}

impl CardView {
    pub fn from_record(record: &Record, key_field: &str, status_label: String) -> Self {
        let or = |field: &str, fallback: &str| {
            let text = field_text(record, field);
            if text.is_empty() {
                fallback.to_string()
            } else {
                text
            }
        };
        let priority = field_text(record, "priority");
        let priority_class = match priority.as_str() {
            "Medium" => "badge",
            "High" => "badge-warning",
            "Critical" => "badge-error",
            _ => "badge-lightest",
        };
        CardView {
            id: record_id(record, key_field).unwrap_or_default(),
            name: field_text(record, "name"),
            status_label,
            priority_label: or("priority", "Not Set"),
            priority_class,
            assignee: or("assigneeName", "Unassigned"),
            feature: or("featureName", "No Feature"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusBoard {
    buckets: Vec<Bucket>,
    status_field: String,
    key_field: String,
    drag: Option<DragState>,
    state: MoveState,
}

impl StatusBoard {
    pub fn new(specs: Vec<BucketSpec>) -> Self {
        let mut board = StatusBoard {
            buckets: Vec::new(),
            status_field: "status".to_string(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            drag: None,
            state: MoveState::Idle,
        };
        board.set_records(Vec::new(), specs);
        board
    }

    pub fn with_status_field(mut self, field: &str) -> Self {
        self.status_field = field.to_string();
        self
    }

    pub fn with_key_field(mut self, field: &str) -> Self {
        self.key_field = field.to_string();
        self
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn specs(&self) -> Vec<BucketSpec> {
        self.buckets.iter().map(|b| b.spec.clone()).collect()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, value: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.spec.value == value)
    }

    pub fn counts(&self) -> Vec<(String, usize)> {
        self.buckets
            .iter()
            .map(|b| (b.spec.value.clone(), b.records.len()))
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|b| b.records.len()).sum()
    }

    /// Bucket holding the record.
    pub fn locate(&self, id: &str) -> Option<&str> {
        self.buckets
            .iter()
            .find(|b| b.records.iter().any(|r| self.has_id(r, id)))
            .map(|b| b.spec.value.as_str())
    }

    pub fn card(&self, record: &Record) -> CardView {
        let status = field_text(record, &self.status_field);
        CardView::from_record(record, &self.key_field, label_for(&self.specs(), &status))
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.records.clear();
        }
    }

    /// Partitions `records` by status. Records with an unknown status are left off the board.
    pub fn set_records(&mut self, records: Vec<Record>, specs: Vec<BucketSpec>) {
        self.buckets = specs
            .into_iter()
            .map(|spec| Bucket {
                spec,
                records: Vec::new(),
            })
            .collect();
        let mut seen = HashSet::new();
        let mut dropped = 0;
        for record in records {
            let status = field_text(&record, &self.status_field);
            let id = record_id(&record, &self.key_field);
            match self.buckets.iter_mut().find(|b| b.spec.value == status) {
                Some(bucket) if id.as_ref().is_none_or(|id| seen.insert(id.clone())) => {
                    bucket.records.push(record)
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("{} records left off the board", dropped);
        }
    }

    /// Takes records already grouped by bucket key, as a by-bucket fetch returns them.
    pub fn set_grouped(&mut self, mut grouped: BTreeMap<String, Vec<Record>>) {
        self.clear();
        let mut seen = HashSet::new();
        for bucket in self.buckets.iter_mut() {
            let Some(records) = grouped.remove(&bucket.spec.value) else {
                continue;
            };
            for record in records {
                let id = record_id(&record, &self.key_field);
                if id.as_ref().is_none_or(|id| seen.insert(id.clone())) {
                    bucket.records.push(record);
                }
            }
        }
        if !grouped.is_empty() {
            debug!("Unknown buckets left off the board: {:?}", grouped.keys());
        }
    }

    pub fn begin_drag(&mut self, id: &str, source: &str) {
        if id.is_empty() || source.is_empty() {
            return;
        }
        debug!("Drag {} from {}", id, source);
        self.drag = Some(DragState {
            record_id: id.to_string(),
            source: source.to_string(),
        });
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn dragging(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_updating(&self) -> bool {
        matches!(self.state, MoveState::Pending(_))
    }

    pub fn move_state(&self) -> &MoveState {
        &self.state
    }

    /// Drops the dragged record onto `target`. On a real move the record is
    /// patched locally and the returned move has to be persisted and settled.
    pub fn drop(&mut self, target: &str) -> Option<PendingMove> {
        let drag = self.drag.clone()?;
        if target.is_empty() || drag.source == target {
            return None;
        }
        if self.bucket(target).is_none() {
            warn!("Drop on {} ignored, not a bucket of this board", target);
            return None;
        }
        if self.is_updating() {
            warn!("Drop on {} ignored, a status update is in flight", target);
            return None;
        }

        let pending = PendingMove {
            record_id: drag.record_id,
            from: drag.source,
            to: target.to_string(),
        };
        self.apply_patch(&pending);
        self.state = MoveState::Pending(pending.clone());
        Some(pending)
    }

    fn apply_patch(&mut self, pending: &PendingMove) {
        let key_field = self.key_field.clone();
        let Some(source) = self.buckets.iter_mut().find(|b| b.spec.value == pending.from) else {
            return;
        };
        let Some(pos) = source
            .records
            .iter()
            .position(|r| record_id(r, &key_field).as_deref() == Some(pending.record_id.as_str()))
        else {
            debug!("Record {} not in {}, no local patch", pending.record_id, pending.from);
            return;
        };
        let mut record = source.records.remove(pos);
        record.insert(
            self.status_field.clone(),
            Value::String(pending.to.clone()),
        );
        match self.buckets.iter_mut().find(|b| b.spec.value == pending.to) {
            Some(target) => target.records.push(record),
            None => debug!("Target {} is not on the board", pending.to),
        }
    }

    /// Ends the in-flight move with the endpoint's outcome and notifies the user.
    /// The local patch stays provisional either way: call [`StatusBoard::resync`] next.
    pub fn settle(
        &mut self,
        pending: PendingMove,
        outcome: Result<Record, RVError>,
        notifier: &mut dyn Notifier,
    ) -> &MoveState {
        if self.state != MoveState::Pending(pending.clone()) {
            warn!("Settling a move that is not in flight: {:?}", pending);
        }
        self.state = match outcome {
            Ok(updated) => {
                let name = field_text(&updated, "name");
                let name = if name.is_empty() {
                    pending.record_id.clone()
                } else {
                    name
                };
                let label = label_for(&self.specs(), &pending.to);
                info!("Move of {} to {} committed", pending.record_id, pending.to);
                notifier.notify(
                    "Status Updated",
                    &format!("\"{name}\" moved to {label}."),
                    Severity::Success,
                );
                MoveState::Committed(pending)
            }
            Err(e) => {
                warn!("Move of {} to {} failed: {}", pending.record_id, pending.to, e);
                let message = e.to_string();
                let message = if message.is_empty() {
                    "Failed to update record status.".to_string()
                } else {
                    message
                };
                notifier.notify("Update Failed", &message, Severity::Error);
                MoveState::RolledBack(pending)
            }
        };
        &self.state
    }

    /// Replaces the board with the source of truth. A failed load empties the board.
    pub fn resync(
        &mut self,
        source: &mut dyn DataSource,
        criteria: &SearchCriteria,
        notifier: &mut dyn Notifier,
    ) -> bool {
        match source.fetch_records_by_bucket(criteria) {
            Ok(grouped) => {
                self.set_grouped(grouped);
                true
            }
            Err(e) => {
                warn!("Board load failed: {}", e);
                self.clear();
                notifier.notify("Error Loading Records", &e.to_string(), Severity::Error);
                false
            }
        }
    }

    /// Drop, persist, settle and resync in one go, for endpoints that answer synchronously.
    pub fn move_record<S: DataSource + StatusUpdater>(
        &mut self,
        target: &str,
        store: &mut S,
        criteria: &SearchCriteria,
        notifier: &mut dyn Notifier,
    ) -> Option<MoveState> {
        let pending = self.drop(target)?;
        let outcome = store.update_status(&pending.record_id, &pending.to);
        let state = self.settle(pending, outcome, notifier).clone();
        self.resync(store, criteria, notifier);
        Some(state)
    }

    /// Card activation (click, Enter or Space) opens the record.
    pub fn activate(&self, id: &str, navigator: &mut dyn Navigator) -> bool {
        if self.locate(id).is_none() {
            return false;
        }
        navigator.navigate_to_record(id);
        true
    }

    fn has_id(&self, record: &Record, id: &str) -> bool {
        record_id(record, &self.key_field).as_deref() == Some(id)
    }
}

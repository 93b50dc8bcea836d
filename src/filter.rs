//! Record filtering for search result tables.

use serde_json::Value;
use tracing::debug;

use crate::record::{Record, field_text, parse_timestamp_str, resolve};

/// Fields left out of the free text search.
const SEARCH_EXCLUDED_FIELDS: [&str; 3] = ["key", "blUrl", "blaUrl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub term: String,
    pub mode: MatchMode,
}

/// Parameter values coming from a host form. Empty values and unresolved
/// `{placeholder}` merge fields count as unset.
pub fn param(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(v) if !v.is_empty() && !v.starts_with('{') => Some(v.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchCriteria {
    pub search_string: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub date_field: Option<String>,
    pub fields: Vec<FieldFilter>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        SearchCriteria::default()
    }

    pub fn search(mut self, term: Option<&str>) -> Self {
        self.search_string = param(term);
        self
    }

    pub fn date_range(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.date_start = param(start).filter(|v| v != "null");
        self.date_end = param(end).filter(|v| v != "null");
        self
    }

    pub fn contains(self, field: &str, term: Option<&str>) -> Self {
        self.field_filter(field, term, MatchMode::Contains)
    }

    pub fn equals(self, field: &str, term: Option<&str>) -> Self {
        self.field_filter(field, term, MatchMode::Equals)
    }

    fn field_filter(mut self, field: &str, term: Option<&str>, mode: MatchMode) -> Self {
        if let Some(term) = param(term) {
            self.fields.push(FieldFilter {
                field: field.to_string(),
                term,
                mode,
            });
        }
        self
    }

    pub fn has_filters(&self) -> bool {
        self.search_string.is_some()
            || self.date_start.is_some()
            || self.date_end.is_some()
            || !self.fields.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && self.matches_dates(record)
            && self.fields.iter().all(|f| field_matches(record, f))
    }

    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        if !self.has_filters() {
            return records;
        }
        let before = records.len();
        let filtered: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        debug!("Filter kept {} of {} records", filtered.len(), before);
        filtered
    }

    fn matches_search(&self, record: &Record) -> bool {
        let Some(term) = &self.search_string else {
            return true;
        };
        let values: Vec<&Value> = record
            .iter()
            .filter(|(k, _)| !SEARCH_EXCLUDED_FIELDS.contains(&k.as_str()))
            .map(|(_, v)| v)
            .collect();
        serde_json::to_string(&values)
            .map(|s| s.to_lowercase().contains(&term.to_lowercase()))
            .unwrap_or(false)
    }

    fn matches_dates(&self, record: &Record) -> bool {
        if self.date_start.is_none() && self.date_end.is_none() {
            return true;
        }
        let field = self.date_field.as_deref().unwrap_or("date");
        let Some(date) = parse_timestamp_str(&field_text(record, field)) else {
            return false;
        };
        let after_start = match self.date_start.as_deref().and_then(parse_timestamp_str) {
            Some(start) => start <= date,
            None => true,
        };
        let before_end = match self.date_end.as_deref().and_then(parse_timestamp_str) {
            Some(end) => date <= end,
            None => true,
        };
        after_start && before_end
    }
}

fn field_matches(record: &Record, filter: &FieldFilter) -> bool {
    let Some(Value::String(value)) = resolve(record, &filter.field) else {
        return false;
    };
    let value = value.to_lowercase();
    let term = filter.term.to_lowercase();
    match filter.mode {
        MatchMode::Contains => value.contains(&term),
        MatchMode::Equals => value == term,
    }
}

//! Comparators for record sorting.
//!
//! Every column type maps to one [`SortStrategy`]. A strategy turns a record
//! into a [`SortKey`]; keys are compared with a direction. Sentinel keys
//! (null, missing, `"null"`, zero, empty) always sort after real values, in
//! both directions.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::column::{Column, ColumnType};
use crate::record::{Record, display_value, parse_timestamp, resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortState {
    pub sorted_by: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn reset(&mut self) {
        *self = SortState::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortStrategy {
    /// Case insensitive text of the field with the tie-break field appended.
    Text,
    /// Parsed timestamps, unparsable values after all valid ones.
    Timestamp,
    /// Text of the column's display field (link text of url columns).
    DisplayLabel,
    Numeric,
}

const STRATEGIES: [(ColumnType, SortStrategy); 6] = [
    (ColumnType::Text, SortStrategy::Text),
    (ColumnType::CustomSelect, SortStrategy::Text),
    (ColumnType::Date, SortStrategy::Timestamp),
    (ColumnType::Url, SortStrategy::DisplayLabel),
    (ColumnType::Number, SortStrategy::Numeric),
    (ColumnType::Currency, SortStrategy::Numeric),
];

impl SortStrategy {
    pub fn for_type(column_type: ColumnType) -> Self {
        STRATEGIES
            .iter()
            .find(|(ct, _)| *ct == column_type)
            .map(|(_, strategy)| *strategy)
            .unwrap_or(SortStrategy::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Time(DateTime<Utc>),
    Number(f64, String),
    Text(String),
    Unparsable(String),
    Missing(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Time(_) | SortKey::Number(..) => 0,
            SortKey::Text(_) => 1,
            SortKey::Unparsable(_) => 2,
            SortKey::Missing(_) => 3,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, SortKey::Missing(_))
    }
}

/// Full description of one sort request.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub strategy: SortStrategy,
    pub tie_break: String,
    pub label_field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Builds the spec for `field`. Without a column definition the column type is
    /// inferred from the field name.
    pub fn new(
        field: &str,
        column: Option<&Column>,
        direction: SortDirection,
        tie_break: &str,
    ) -> Self {
        let column_type = column
            .map(|c| c.column_type)
            .unwrap_or_else(|| ColumnType::infer(field, false));
        let label_field = column
            .and_then(|c| c.label_field.clone())
            .unwrap_or_else(|| tie_break.to_string());
        SortSpec {
            field: field.to_string(),
            strategy: SortStrategy::for_type(column_type),
            tie_break: tie_break.to_string(),
            label_field,
            direction,
        }
    }

    pub fn key(&self, record: &Record) -> SortKey {
        let tie = tie_text(record, &self.tie_break);
        match self.strategy {
            SortStrategy::Timestamp => {
                let value = resolve(record, &self.field);
                if is_sentinel(value) {
                    return SortKey::Missing(String::new());
                }
                match value.and_then(parse_timestamp) {
                    Some(ts) => SortKey::Time(ts),
                    None => SortKey::Unparsable(
                        value.map(display_value).unwrap_or_default().to_lowercase(),
                    ),
                }
            }
            SortStrategy::Numeric => {
                let value = resolve(record, &self.field);
                if is_sentinel(value) {
                    return SortKey::Missing(tie);
                }
                let number = value.and_then(|v| match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                });
                match number {
                    Some(n) if n == 0.0 => SortKey::Missing(tie),
                    Some(n) => SortKey::Number(n, tie),
                    None => text_key(value.map(display_value).unwrap_or_default(), &tie),
                }
            }
            SortStrategy::DisplayLabel => {
                let value = resolve(record, &self.label_field);
                if is_sentinel(value) {
                    return SortKey::Missing(String::new());
                }
                text_key(value.map(display_value).unwrap_or_default(), "")
            }
            SortStrategy::Text => {
                let value = resolve(record, &self.field);
                if is_sentinel(value) {
                    return SortKey::Missing(tie);
                }
                let tie = if self.tie_break == self.field {
                    String::new()
                } else {
                    tie
                };
                text_key(value.map(display_value).unwrap_or_default(), &tie)
            }
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        compare_keys(&self.key(a), &self.key(b), self.direction)
    }
}

fn tie_text(record: &Record, field: &str) -> String {
    resolve(record, field)
        .map(display_value)
        .unwrap_or_default()
        .to_lowercase()
}

// Values that stand for "nothing to sort by".
fn is_sentinel(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() || s == "null",
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

// Composite keys that start with a literal "null" belong with the sentinels.
fn text_key(primary: String, tie: &str) -> SortKey {
    match primary.strip_prefix("null") {
        Some(rest) => SortKey::Missing(format!("{rest}{tie}").to_lowercase()),
        None => SortKey::Text(format!("{primary}{tie}").to_lowercase()),
    }
}

pub fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    match (a.is_sentinel(), b.is_sentinel()) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }
    let ordering = a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
        (SortKey::Time(x), SortKey::Time(y)) => x.cmp(y),
        (SortKey::Number(x, xt), SortKey::Number(y, yt)) => x
            .partial_cmp(y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| xt.cmp(yt)),
        (SortKey::Text(x), SortKey::Text(y))
        | (SortKey::Unparsable(x), SortKey::Unparsable(y))
        | (SortKey::Missing(x), SortKey::Missing(y)) => x.cmp(y),
        _ => Ordering::Equal,
    });
    direction.apply(ordering)
}

/// Stable sort of the whole record set under `spec`.
pub fn sort_records(records: &mut Vec<Record>, spec: &SortSpec) {
    let mut keyed: Vec<(SortKey, Record)> = records.drain(..).map(|r| (spec.key(&r), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, spec.direction));
    records.extend(keyed.into_iter().map(|(_, r)| r));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    fn names(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| crate::record::field_text(r, "name"))
            .collect()
    }

    #[test]
    fn strategy_lookup_covers_every_type() {
        assert_eq!(SortStrategy::for_type(ColumnType::Date), SortStrategy::Timestamp);
        assert_eq!(SortStrategy::for_type(ColumnType::Url), SortStrategy::DisplayLabel);
        assert_eq!(SortStrategy::for_type(ColumnType::Currency), SortStrategy::Numeric);
        assert_eq!(SortStrategy::for_type(ColumnType::CustomSelect), SortStrategy::Text);
    }

    #[test]
    fn text_sort_is_case_insensitive_with_sentinels_last() {
        let mut rs = records(vec![
            json!({"name": "d", "city": null}),
            json!({"name": "a", "city": "boston"}),
            json!({"name": "e", "city": "null"}),
            json!({"name": "b", "city": "Austin"}),
            json!({"name": "f", "city": 0}),
            json!({"name": "c"}),
        ]);
        let spec = SortSpec::new("city", None, SortDirection::Asc, "name");
        sort_records(&mut rs, &spec);
        assert_eq!(names(&rs), vec!["b", "a", "c", "d", "e", "f"]);

        let spec = SortSpec::new("city", None, SortDirection::Desc, "name");
        sort_records(&mut rs, &spec);
        assert_eq!(&names(&rs)[..2], &["a", "b"]);
        assert!(rs[2..].iter().all(|r| spec.key(r).is_sentinel()));
    }

    #[test]
    fn tie_break_orders_equal_primary_keys() {
        let mut rs = records(vec![
            json!({"name": "Zed", "city": "Rome"}),
            json!({"name": "amy", "city": "rome"}),
        ]);
        sort_records(&mut rs, &SortSpec::new("city", None, SortDirection::Asc, "name"));
        assert_eq!(names(&rs), vec!["amy", "Zed"]);
    }

    #[test]
    fn null_prefixed_composites_sort_with_sentinels() {
        let mut rs = records(vec![
            json!({"name": "x", "owner": "null Smith"}),
            json!({"name": "y", "owner": "Jones"}),
        ]);
        sort_records(&mut rs, &SortSpec::new("owner", None, SortDirection::Asc, "name"));
        assert_eq!(names(&rs), vec!["y", "x"]);
    }

    #[test]
    fn date_fields_compare_by_timestamp() {
        let mut rs = records(vec![
            json!({"name": "late", "expDate": "2024-12-01"}),
            json!({"name": "bad", "expDate": "soon"}),
            json!({"name": "none", "expDate": null}),
            json!({"name": "early", "expDate": "2023-01-15T10:00:00Z"}),
        ]);
        let spec = SortSpec::new("expDate", None, SortDirection::Asc, "name");
        sort_records(&mut rs, &spec);
        assert_eq!(names(&rs), vec!["early", "late", "bad", "none"]);

        let spec = SortSpec::new("expDate", None, SortDirection::Desc, "name");
        sort_records(&mut rs, &spec);
        assert_eq!(names(&rs), vec!["bad", "late", "early", "none"]);
    }

    #[test]
    fn url_columns_sort_by_link_text() {
        let column = Column::new("ACCT. NAME", "blUrl")
            .with_column_type(ColumnType::Url)
            .with_label_field("name");
        let mut rs = records(vec![
            json!({"name": "Bravo", "blUrl": "/001"}),
            json!({"name": "alpha", "blUrl": "/002"}),
        ]);
        sort_records(
            &mut rs,
            &SortSpec::new("blUrl", Some(&column), SortDirection::Asc, "name"),
        );
        assert_eq!(names(&rs), vec!["alpha", "Bravo"]);
    }

    #[test]
    fn numeric_columns_compare_numbers() {
        let column = Column::new("Capacity", "capacity").with_column_type(ColumnType::Number);
        let mut rs = records(vec![
            json!({"name": "a", "capacity": 10}),
            json!({"name": "b", "capacity": 9}),
            json!({"name": "c", "capacity": 0}),
            json!({"name": "d", "capacity": "120"}),
        ]);
        sort_records(
            &mut rs,
            &SortSpec::new("capacity", Some(&column), SortDirection::Asc, "name"),
        );
        assert_eq!(names(&rs), vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn ascending_then_descending_reverses_distinct_keys() {
        let mut rs = records(vec![
            json!({"name": "q"}),
            json!({"name": "B"}),
            json!({"name": "m"}),
            json!({"name": "a"}),
        ]);
        sort_records(&mut rs, &SortSpec::new("name", None, SortDirection::Asc, "name"));
        let asc = names(&rs);
        sort_records(&mut rs, &SortSpec::new("name", None, SortDirection::Asc, "name"));
        assert_eq!(names(&rs), asc);
        sort_records(&mut rs, &SortSpec::new("name", None, SortDirection::Desc, "name"));
        let mut desc = names(&rs);
        desc.reverse();
        assert_eq!(desc, asc);
    }
}

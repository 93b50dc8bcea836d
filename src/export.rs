//! Csv export of record sets.
//!
//! The payload is bit exact: a UTF-8 byte order mark, comma separated fields,
//! `\n` between rows and no trailing newline. Fields containing a comma, a
//! quote or a newline are quoted with embedded quotes doubled.

use serde_json::Value;
use tracing::{debug, info};

use crate::column::{Column, ColumnType};
use crate::domain::RVError;
use crate::record::{Record, display_value, parse_timestamp, resolve};
use crate::source::FileSink;

pub const BOM: &str = "\u{FEFF}";
pub const EXPORT_MIME: &str = "text/plain";
pub const DEFAULT_FILENAME: &str = "results.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl ExportPayload {
    pub fn deliver(&self, sink: &mut dyn FileSink) -> Result<(), RVError> {
        info!("Delivering {} bytes as {}", self.bytes.len(), self.filename);
        sink.deliver(&self.bytes, &self.filename)
    }
}

pub fn filename_for(search_type: Option<&str>) -> &'static str {
    match search_type {
        Some("licenseLookup") => "License Lookup.csv",
        Some("underageCompliance") => "Underage Compliance Results.csv",
        Some("deliquencyList") | Some("cureList") => "DelinquencyCure List.csv",
        _ => DEFAULT_FILENAME,
    }
}

pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Escapes and joins one row.
pub fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<String>>()
        .join(",")
}

fn format_value(value: Option<&Value>, column_type: ColumnType) -> String {
    let Some(value) = value else {
        return String::new();
    };
    match (column_type, value) {
        (_, Value::Null) => String::new(),
        (ColumnType::Date, v) => match parse_timestamp(v) {
            Some(ts) => ts.format("%Y-%m-%d").to_string(),
            None => display_value(v),
        },
        (_, v) => display_value(v),
    }
}

pub fn export(records: &[Record], columns: &[Column]) -> Vec<u8> {
    let header: Vec<&str> = columns.iter().map(Column::header).collect();
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(csv_line(&header));
    for record in records {
        let fields: Vec<String> = columns
            .iter()
            .map(|c| format_value(resolve(record, &c.field_name), c.column_type))
            .collect();
        lines.push(csv_line(&fields));
    }
    debug!("Exported {} rows x {} columns", records.len(), columns.len());
    format!("{BOM}{}", lines.join("\n")).into_bytes()
}

pub fn export_payload(
    records: &[Record],
    columns: &[Column],
    search_type: Option<&str>,
) -> ExportPayload {
    ExportPayload {
        bytes: export(records, columns),
        mime: EXPORT_MIME,
        filename: filename_for(search_type).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        match v {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn empty_export_is_the_header_line() {
        let columns = vec![Column::new("Lic, Nbr", "licNumber"), Column::new("", "city")];
        assert_eq!(text(export(&[], &columns)), "\u{FEFF}\"Lic, Nbr\",city");
    }

    #[test]
    fn quotes_only_where_needed() {
        let columns = vec![Column::new("N", "name"), Column::new("O", "other")];
        let records = vec![rec(json!({"name": "a,b", "other": null}))];
        assert_eq!(text(export(&records, &columns)), "\u{FEFF}N,O\n\"a,b\",");
    }

    #[test]
    fn escapes_quotes_and_newlines() {
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape("plain text"), "plain text");
        assert_eq!(csv_line(&["a", "b,c", ""]), "a,\"b,c\",");
    }

    #[test]
    fn formats_dates_and_nested_paths() {
        let columns = vec![
            Column::new("Date", "date").with_column_type(ColumnType::Date),
            Column::new("City", "owner.city"),
            Column::new("Missing", "owner.zip.code"),
            Column::new("Capacity", "capacity").with_column_type(ColumnType::Number),
        ];
        let records = vec![
            rec(json!({"date": "2024-06-30T22:15:00-05:00", "owner": {"city": "Joliet"}, "capacity": 12})),
            rec(json!({"date": "next week", "owner": null, "capacity": 2.5})),
            rec(json!({"date": 86400000})),
        ];
        assert_eq!(
            text(export(&records, &columns)),
            "\u{FEFF}Date,City,Missing,Capacity\n2024-07-01,Joliet,,12\nnext week,,,2.5\n1970-01-02,,,"
        );
    }

    #[test]
    fn payload_carries_filename_and_mime() {
        let payload = export_payload(&[], &[Column::new("Name", "name")], Some("cureList"));
        assert_eq!(payload.filename, "DelinquencyCure List.csv");
        assert_eq!(payload.mime, "text/plain");
        assert_eq!(filename_for(None), "results.csv");
        assert_eq!(filename_for(Some("licenseLookup")), "License Lookup.csv");
    }
}

use derive_setters::Setters;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    #[default]
    Text,
    Date,
    Url,
    Number,
    Currency,
    CustomSelect,
}

impl ColumnType {
    /// Guess a column type for data without a column definition.
    /// Only used when columns are derived from a raw file.
    pub fn infer(field_name: &str, numeric: bool) -> Self {
        if field_name.to_lowercase().contains("date") {
            ColumnType::Date
        } else if field_name.contains("Url") {
            ColumnType::Url
        } else if numeric {
            ColumnType::Number
        } else {
            ColumnType::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Option<String>,
}

impl SelectOption {
    pub fn new(label: &str, value: Option<&str>) -> Self {
        SelectOption {
            label: label.to_string(),
            value: value.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(prefix = "with_", into, strip_option)]
pub struct Column {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub field_name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    /// Display field of url columns, their link text.
    #[serde(default)]
    pub label_field: Option<String>,
}

impl Column {
    pub fn new(label: &str, field_name: &str) -> Self {
        Column {
            label: label.to_string(),
            field_name: field_name.to_string(),
            column_type: ColumnType::Text,
            sortable: true,
            options: Vec::new(),
            label_field: None,
        }
    }

    pub fn inferred(field_name: &str, numeric: bool) -> Self {
        let column_type = ColumnType::infer(field_name, numeric);
        let column = Column::new(field_name, field_name).with_column_type(column_type);
        if column_type == ColumnType::Url {
            column.with_label_field("name")
        } else {
            column
        }
    }

    /// Header text: the label, or the field name for unlabeled columns.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.field_name
        } else {
            &self.label
        }
    }

    pub fn accepts(&self, value: Option<&str>) -> bool {
        self.options.iter().any(|o| o.value.as_deref() == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_column_definitions() {
        let columns: Vec<Column> = serde_json::from_str(
            r#"[
                {"label": "ACCT. NAME", "fieldName": "blUrl", "type": "url", "sortable": true, "labelField": "name"},
                {"label": "Approve/Reject", "fieldName": "ApproveReject", "type": "customSelect",
                 "options": [{"label": "Approve", "value": "APPROVE"}, {"label": " -- Clear -- ", "value": null}]},
                {"fieldName": "city"}
            ]"#,
        )
        .unwrap();
        assert_eq!(columns[0].column_type, ColumnType::Url);
        assert_eq!(columns[0].label_field.as_deref(), Some("name"));
        assert_eq!(columns[1].column_type, ColumnType::CustomSelect);
        assert!(columns[1].accepts(None));
        assert!(columns[1].accepts(Some("APPROVE")));
        assert!(!columns[1].accepts(Some("MAYBE")));
        assert_eq!(columns[2].column_type, ColumnType::Text);
        assert!(!columns[2].sortable);
        assert_eq!(columns[2].header(), "city");
    }

    #[test]
    fn infers_types_from_field_names() {
        assert_eq!(ColumnType::infer("expDate", false), ColumnType::Date);
        assert_eq!(ColumnType::infer("CreatedDate", false), ColumnType::Date);
        assert_eq!(ColumnType::infer("blaUrl", false), ColumnType::Url);
        assert_eq!(ColumnType::infer("Price__c", true), ColumnType::Number);
        assert_eq!(ColumnType::infer("city", false), ColumnType::Text);
        assert_eq!(
            Column::inferred("blUrl", false).label_field.as_deref(),
            Some("name")
        );
    }
}

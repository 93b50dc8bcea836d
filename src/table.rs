use serde_json::Value;
use tracing::{debug, trace};

use crate::column::{Column, ColumnType};
use crate::domain::RVError;
use crate::record::{DEFAULT_KEY_FIELD, Record, record_id, resolve};
use crate::sort::{SortDirection, SortSpec, SortState, sort_records};

/// Numbered buttons shown at most by the pagination control.
pub const MAX_PAGE_BUTTONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        PageState {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
        }
    }

    pub fn total_pages(&self) -> usize {
        std::cmp::max(1, self.total_items.div_ceil(self.page_size))
    }

    fn clamp(&mut self) {
        self.current_page = self.current_page.clamp(1, self.total_pages());
    }

    /// Index range of the visible page inside the full record set.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = std::cmp::min(
            self.current_page.saturating_sub(1) * self.page_size,
            self.total_items,
        );
        let end = std::cmp::min(start + self.page_size, self.total_items);
        start..end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageItem {
    Page { number: usize, current: bool },
    Ellipsis { position: usize },
}

impl PageItem {
    pub fn key(&self) -> String {
        match self {
            PageItem::Page { number, .. } => format!("p-{number}"),
            PageItem::Ellipsis { position } => format!("dots-{position}"),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PageItem::Page { number, .. } => number.to_string(),
            PageItem::Ellipsis { .. } => "…".to_string(),
        }
    }
}

/// Page buttons for `page` out of `total`: at most five numbers with
/// ellipses where consecutive numbers are more than one apart.
pub fn page_items(page: usize, total: usize) -> Vec<PageItem> {
    let total = total.max(1);
    let page = page.clamp(1, total);

    let numbers: Vec<usize> = if total <= MAX_PAGE_BUTTONS {
        (1..=total).collect()
    } else if page <= 3 {
        vec![1, 2, 3, 4, total]
    } else if page >= total - 2 {
        vec![1, total - 3, total - 2, total - 1, total]
    } else {
        vec![1, page - 1, page, page + 1, total]
    };

    let mut items = Vec::with_capacity(numbers.len() + 2);
    for (i, &n) in numbers.iter().enumerate() {
        if i > 0 && n - numbers[i - 1] > 1 {
            items.push(PageItem::Ellipsis { position: i });
        }
        items.push(PageItem::Page {
            number: n,
            current: n == page,
        });
    }
    items
}

/// In-memory table: owns the working record set and derives the visible page.
#[derive(Debug, Clone)]
pub struct PagedSortedTable {
    records: Vec<Record>,
    columns: Vec<Column>,
    page: PageState,
    sort: SortState,
    key_field: String,
    tie_break_field: String,
    total_results: usize,
    visible: std::ops::Range<usize>,
}

impl PagedSortedTable {
    pub fn new(columns: Vec<Column>, page_size: usize) -> Self {
        PagedSortedTable {
            records: Vec::new(),
            columns,
            page: PageState::new(page_size),
            sort: SortState::default(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            tie_break_field: "name".to_string(),
            total_results: 0,
            visible: 0..0,
        }
    }

    pub fn with_key_field(mut self, key_field: &str) -> Self {
        self.key_field = key_field.to_string();
        self
    }

    pub fn with_tie_break_field(mut self, field: &str) -> Self {
        self.tie_break_field = field.to_string();
        self
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.columns = columns;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn page_state(&self) -> PageState {
        self.page
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Replaces the working set. Unless `preserve_view` is set, the table jumps
    /// back to page one and forgets the active sort.
    pub fn set_records(&mut self, records: Vec<Record>, preserve_view: bool) {
        debug!(
            "Set {} records (preserve view: {})",
            records.len(),
            preserve_view
        );
        self.records = records;
        self.page.total_items = self.records.len();
        if !preserve_view {
            self.page.current_page = 1;
            self.sort.reset();
        }
        self.update_visible();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), RVError> {
        if page_size == 0 {
            return Err(RVError::InvalidPageSize(page_size));
        }
        self.page.page_size = page_size;
        self.update_visible();
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) {
        let clamped = page.clamp(1, self.total_pages());
        if clamped != self.page.current_page {
            trace!("Go to page {} -> {}", page, clamped);
            self.page.current_page = clamped;
        }
        self.update_visible();
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.page.current_page.saturating_sub(1));
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.current_page + 1);
    }

    pub fn first_page(&mut self) {
        self.go_to_page(1);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.total_pages());
    }

    /// Sorts the full record set, not only the visible page, and returns to page one.
    pub fn sort(&mut self, field_name: &str, direction: SortDirection) {
        let column = self.columns.iter().find(|c| c.field_name == field_name);
        let spec = SortSpec::new(field_name, column, direction, &self.tie_break_field);
        debug!("Sort by {} {} ({:?})", field_name, direction.as_str(), spec.strategy);
        sort_records(&mut self.records, &spec);
        self.sort.sorted_by = Some(field_name.to_string());
        self.sort.direction = direction;
        self.page.current_page = 1;
        self.update_visible();
    }

    pub fn visible_page(&self) -> &[Record] {
        &self.records[self.visible.clone()]
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        page_items(self.page.current_page, self.total_pages())
    }

    pub fn total_pages(&self) -> usize {
        self.page.total_pages()
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page
    }

    pub fn total_items(&self) -> usize {
        self.page.total_items
    }

    pub fn is_first_page(&self) -> bool {
        self.page.current_page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        self.page.current_page >= self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Size of the unfiltered result the current records were taken from.
    pub fn set_total_results(&mut self, total: usize) {
        self.total_results = total;
    }

    pub fn has_no_filters(&self) -> bool {
        self.total_results == self.records.len()
    }

    pub fn page_info(&self, noun: &str) -> String {
        if self.records.is_empty() {
            return format!("No {noun} found");
        }
        let range = self.page.range();
        format!(
            "Showing {}-{} of {} {}",
            range.start + 1,
            range.end,
            self.records.len(),
            noun
        )
    }

    /// Edits one select cell in place. Page and sort stay where they are.
    pub fn edit_field(
        &mut self,
        id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), RVError> {
        if let Some(column) = self
            .columns
            .iter()
            .find(|c| c.field_name == field && c.column_type == ColumnType::CustomSelect)
            && !column.accepts(value)
        {
            return Err(RVError::InvalidOption {
                field: field.to_string(),
                value: value.unwrap_or("null").to_string(),
            });
        }
        let key_field = self.key_field.clone();
        let record = self
            .records
            .iter_mut()
            .find(|r| record_id(r, &key_field).as_deref() == Some(id))
            .ok_or_else(|| RVError::RecordNotFound(id.to_string()))?;
        record.insert(
            field.to_string(),
            value.map_or(Value::Null, |v| Value::String(v.to_string())),
        );
        trace!("Edited {} of record {}", field, id);
        self.update_visible();
        Ok(())
    }

    /// Records with a value set in `field`, e.g. the rows a user approved or rejected.
    pub fn pending_selections(&self, field: &str) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| !matches!(resolve(r, field), None | Some(Value::Null)))
            .collect()
    }

    fn update_visible(&mut self) {
        self.page.total_items = self.records.len();
        self.page.clamp();
        self.visible = self.page.range();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::SelectOption;
    use crate::presets::SearchType;
    use crate::record::field_text;
    use serde_json::json;

    fn numbered(n: usize) -> Vec<Record> {
        (0..n)
            .filter_map(|i| match json!({"id": i, "name": format!("r{i:03}")}) {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    fn render(items: &[PageItem]) -> String {
        items
            .iter()
            .map(|item| match item {
                PageItem::Page { number, current: true } => format!("[{number}]"),
                other => other.label(),
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    #[test]
    fn total_pages_is_at_least_one() {
        for (items, size, pages) in [(0, 5, 1), (1, 5, 1), (5, 5, 1), (6, 5, 2), (101, 10, 11)] {
            let mut page = PageState::new(size);
            page.total_items = items;
            assert_eq!(page.total_pages(), pages, "{items} items / {size}");
        }
    }

    #[test]
    fn small_totals_show_every_page() {
        for total in 1..=5 {
            for page in 1..=total {
                let items = page_items(page, total);
                assert_eq!(items.len(), total);
                for (i, item) in items.iter().enumerate() {
                    assert_eq!(
                        *item,
                        PageItem::Page {
                            number: i + 1,
                            current: i + 1 == page
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn ten_pages_follow_the_rule_table() {
        assert_eq!(render(&page_items(1, 10)), "[1] 2 3 4 … 10");
        assert_eq!(render(&page_items(3, 10)), "1 2 [3] 4 … 10");
        assert_eq!(render(&page_items(5, 10)), "1 … 4 [5] 6 … 10");
        assert_eq!(render(&page_items(8, 10)), "1 … 7 [8] 9 10");
        assert_eq!(render(&page_items(10, 10)), "1 … 7 8 9 [10]");
    }

    #[test]
    fn ellipsis_keys_are_positional() {
        let keys: Vec<String> = page_items(5, 10).iter().map(PageItem::key).collect();
        assert_eq!(keys, vec!["p-1", "dots-1", "p-4", "p-5", "p-6", "dots-4", "p-10"]);
    }

    #[test]
    fn visible_page_slices_the_record_set() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_records(numbered(25), false);
        assert_eq!(table.total_pages(), 3);
        assert_eq!(table.visible_page().len(), 10);
        table.go_to_page(3);
        assert_eq!(table.visible_page().len(), 5);
        assert_eq!(field_text(&table.visible_page()[0], "name"), "r020");
        assert!(table.is_last_page());
        assert_eq!(table.page_info("records"), "Showing 21-25 of 25 records");
    }

    #[test]
    fn go_to_page_clamps() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_records(numbered(25), false);
        table.go_to_page(0);
        assert_eq!(table.current_page(), 1);
        table.go_to_page(99);
        assert_eq!(table.current_page(), 3);
        table.go_to_page(3);
        assert_eq!(table.current_page(), 3);
        table.next_page();
        assert_eq!(table.current_page(), 3);
        table.first_page();
        table.previous_page();
        assert_eq!(table.current_page(), 1);
    }

    #[test]
    fn page_size_changes_clamp_the_current_page() {
        let mut table = PagedSortedTable::new(Vec::new(), 5);
        table.set_records(numbered(20), false);
        table.last_page();
        assert_eq!(table.current_page(), 4);
        table.set_page_size(10).unwrap();
        assert_eq!(table.current_page(), 2);
        assert_eq!(table.visible_page().len(), 10);
        assert!(matches!(
            table.set_page_size(0),
            Err(RVError::InvalidPageSize(0))
        ));
    }

    #[test]
    fn empty_table_has_one_page() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_records(Vec::new(), false);
        assert_eq!(table.total_pages(), 1);
        assert_eq!(table.current_page(), 1);
        assert!(table.visible_page().is_empty());
        assert_eq!(table.page_info("records"), "No records found");
        assert_eq!(render(&table.page_items()), "[1]");
    }

    #[test]
    fn new_records_reset_page_and_sort_unless_preserved() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_records(numbered(30), false);
        table.sort("name", SortDirection::Desc);
        table.go_to_page(2);

        table.set_records(numbered(30), true);
        assert_eq!(table.current_page(), 2);
        assert_eq!(table.sort_state().sorted_by.as_deref(), Some("name"));

        table.set_records(numbered(12), true);
        assert_eq!(table.current_page(), 2);
        table.set_records(numbered(5), true);
        assert_eq!(table.current_page(), 1);

        table.go_to_page(1);
        table.set_records(numbered(30), false);
        assert_eq!(table.current_page(), 1);
        assert_eq!(*table.sort_state(), SortState::default());
    }

    #[test]
    fn sort_covers_the_full_set_and_resets_the_page() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_records(numbered(25), false);
        table.go_to_page(2);
        table.sort("name", SortDirection::Desc);
        assert_eq!(table.current_page(), 1);
        assert_eq!(field_text(&table.visible_page()[0], "name"), "r024");
        assert_eq!(table.sort_state().direction, SortDirection::Desc);
    }

    #[test]
    fn edit_field_keeps_the_view() {
        let column = Column::new("Approve/Reject", "ApproveReject")
            .with_column_type(ColumnType::CustomSelect)
            .with_options(vec![
                SelectOption::new("Approve", Some("APPROVE")),
                SelectOption::new("Reject", Some("REJECT")),
                SelectOption::new(" -- Clear -- ", None),
            ]);
        let mut table = PagedSortedTable::new(vec![column], 5);
        table.set_records(numbered(12), false);
        table.sort("name", SortDirection::Desc);
        table.go_to_page(2);

        table.edit_field("7", "ApproveReject", Some("APPROVE")).unwrap();
        assert_eq!(table.current_page(), 2);
        assert_eq!(table.sort_state().direction, SortDirection::Desc);
        assert_eq!(field_text(&table.visible_page()[0], "name"), "r006");
        assert_eq!(table.records().len(), 12);
        assert_eq!(table.pending_selections("ApproveReject").len(), 1);

        assert!(matches!(
            table.edit_field("7", "ApproveReject", Some("MAYBE")),
            Err(RVError::InvalidOption { .. })
        ));
        assert!(matches!(
            table.edit_field("99", "ApproveReject", None),
            Err(RVError::RecordNotFound(_))
        ));

        table.edit_field("7", "ApproveReject", None).unwrap();
        assert!(table.pending_selections("ApproveReject").is_empty());
    }

    #[test]
    fn filter_state_compares_against_total_results() {
        let mut table = PagedSortedTable::new(Vec::new(), 10);
        table.set_total_results(25);
        table.set_records(numbered(25), false);
        assert!(table.has_no_filters());
        table.set_records(numbered(3), false);
        assert!(!table.has_no_filters());
    }

    fn dated(values: &[&str]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match json!({"key": i, "name": format!("n{i}"), "expDate": v, "expires": v}) {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    fn column_text(table: &PagedSortedTable, field: &str) -> Vec<String> {
        table.visible_page().iter().map(|r| field_text(r, field)).collect()
    }

    #[test]
    fn preset_date_columns_sort_by_timestamp() {
        let mut table = PagedSortedTable::new(SearchType::LicenseLookup.columns(), 10)
            .with_key_field(SearchType::LicenseLookup.key_field());
        table.set_records(dated(&["12/01/2023", "03/15/2024", "06/30/2022"]), false);
        table.sort("expDate", SortDirection::Asc);
        assert_eq!(
            column_text(&table, "expDate"),
            vec!["06/30/2022", "12/01/2023", "03/15/2024"]
        );
        table.sort("expDate", SortDirection::Desc);
        assert_eq!(
            column_text(&table, "expDate"),
            vec!["03/15/2024", "12/01/2023", "06/30/2022"]
        );
    }

    #[test]
    fn caller_typed_date_columns_sort_by_timestamp() {
        // The field name carries no hint, only the column type does.
        let column = Column::new("Expires", "expires").with_column_type(ColumnType::Date);
        let mut table = PagedSortedTable::new(vec![column], 10);
        table.set_records(dated(&["2024-03-15", "", "12/01/2023", "not a date"]), false);
        table.sort("expires", SortDirection::Asc);
        assert_eq!(
            column_text(&table, "expires"),
            vec!["12/01/2023", "2024-03-15", "not a date", ""]
        );

        let mut untyped = PagedSortedTable::new(vec![Column::new("Expires", "expires")], 10);
        untyped.set_records(dated(&["12/01/2023", "03/15/2024"]), false);
        untyped.sort("expires", SortDirection::Asc);
        assert_eq!(column_text(&untyped, "expires"), vec!["03/15/2024", "12/01/2023"]);
    }

    #[test]
    fn page_range_tolerates_page_zero() {
        let page = PageState {
            current_page: 0,
            page_size: 10,
            total_items: 25,
        };
        assert_eq!(page.range(), 0..10);
    }
}

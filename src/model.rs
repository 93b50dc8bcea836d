use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use recview::board::{BucketSpec, CardView, StatusBoard};
use recview::column::{Column, ColumnType};
use recview::domain::{CMDMode, HELP_TEXT, Message, RVConfig, RVError};
use recview::export::{csv_line, export_payload};
use recview::filter::SearchCriteria;
use recview::loader::LoadedData;
use recview::presets::{SearchType, export_columns_for};
use recview::record::{Record, display_value, field_text, parse_timestamp, record_id, resolve};
use recview::sort::SortDirection;
use recview::source::{
    DataSource, DirectorySink, Navigator, Notifier, Severity, Subscription,
};
use recview::store::MemoryStore;
use recview::table::{PageItem, PagedSortedTable};

use crate::inputter::{InputResult, Inputter};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    BOARD,
    RECORD,
    POPUP,
    CMDINPUT,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum View {
    #[default]
    Table,
    Board,
    Record,
}

/// Last notification, shown in the status line.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub message: String,
    pub severity: Severity,
    pub updated: Instant,
}

impl StatusLine {
    fn new(message: &str) -> Self {
        StatusLine {
            message: message.to_string(),
            severity: Severity::Info,
            updated: Instant::now(),
        }
    }
}

impl Notifier for StatusLine {
    fn notify(&mut self, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!("{}: {}", title, message),
            _ => info!("{}: {}", title, message),
        }
        self.message = format!("{title}: {message}");
        self.severity = severity;
        self.updated = Instant::now();
    }
}

// Remembers which record a card activation asked for.
#[derive(Debug, Default)]
struct RecordOpener {
    requested: Option<String>,
}

impl Navigator for RecordOpener {
    fn navigate_to_record(&mut self, record_id: &str) {
        self.requested = Some(record_id.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub sorted_column: Option<(usize, SortDirection)>,
    pub page_items: Vec<PageItem>,
    pub page_info: String,
}

#[derive(Debug, Clone)]
pub struct BucketData {
    pub label: String,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, Default)]
pub struct BoardData {
    pub buckets: Vec<BucketData>,
    pub selected_bucket: usize,
    pub selected_card: usize,
    pub dragging: Option<String>,
    pub updating: bool,
}

pub struct UIData {
    pub name: String,
    pub view: View,
    pub table: TableData,
    pub board: BoardData,
    pub record: Vec<(String, String)>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status: StatusLine,
    pub last_update: Instant,
}

pub struct Model {
    config: RVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    store: MemoryStore,
    criteria: SearchCriteria,
    subscription: Subscription<SearchCriteria>,
    table: PagedSortedTable,
    board: StatusBoard,
    cursor_row: usize,
    cursor_column: usize,
    board_bucket: usize,
    board_card: usize,
    record: Option<Record>,
    record_return: Modus,
    clipboard: Option<Clipboard>,
    sink: DirectorySink,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_line: StatusLine,
    uidata: UIData,
}

impl Model {
    pub fn init(config: &RVConfig, data: LoadedData) -> Result<Self, RVError> {
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("No clipboard available: {:?}", e);
                None
            }
        };
        Self::build(config, data, clipboard)
    }

    pub(crate) fn build(
        config: &RVConfig,
        data: LoadedData,
        clipboard: Option<Clipboard>,
    ) -> Result<Self, RVError> {
        let preset = config.search_type.as_deref().and_then(SearchType::parse);
        let (columns, key_field) = match preset {
            Some(st) => (st.columns(), st.key_field().to_string()),
            None => (data.columns, config.key_field.clone()),
        };
        let specs = bucket_specs_for(&data.records, &config.status_field);

        let store = MemoryStore::new(data.records)
            .with_key_field(&key_field)
            .with_status_field(&config.status_field)
            .reject_statuses(config.rejected_statuses.clone());
        let mut table = PagedSortedTable::new(columns, config.page_size)
            .with_key_field(&key_field)
            .with_tie_break_field(&config.tie_break_field);
        table.set_page_size(config.page_size)?;
        let board = StatusBoard::new(specs)
            .with_status_field(&config.status_field)
            .with_key_field(&key_field);

        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            name: data.name,
            store,
            criteria: SearchCriteria::new(),
            subscription: Subscription::new(),
            table,
            board,
            cursor_row: 0,
            cursor_column: 0,
            board_bucket: 0,
            board_card: 0,
            record: None,
            record_return: Modus::TABLE,
            clipboard,
            sink: DirectorySink::new(config.export_dir.clone()),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_line: StatusLine::new("Started rv!"),
            uidata: UIData {
                name: String::new(),
                view: View::Table,
                table: TableData::default(),
                board: BoardData::default(),
                record: Vec::new(),
                show_popup: false,
                popup_message: String::new(),
                cmdinput: InputResult::default(),
                cmd_mode: None,
                active_cmdinput: false,
                status: StatusLine::new(""),
                last_update: Instant::now(),
            },
        };
        model.apply_criteria(SearchCriteria::new());
        model
            .board
            .resync(&mut model.store, &model.criteria, &mut model.status_line);
        model.update_uidata();
        Ok(model)
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), RVError> {
        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_row(-1),
                    Message::MoveDown => self.move_row(1),
                    Message::MoveLeft => self.move_column(-1),
                    Message::MoveRight => self.move_column(1),
                    Message::NextPage => self.change_page(|t| t.next_page()),
                    Message::PreviousPage => self.change_page(|t| t.previous_page()),
                    Message::FirstPage => self.change_page(|t| t.first_page()),
                    Message::LastPage => self.change_page(|t| t.last_page()),
                    Message::SortAscending => self.sort_current_column(SortDirection::Asc),
                    Message::SortDescending => self.sort_current_column(SortDirection::Desc),
                    Message::ToggleBoard => self.toggle_board(),
                    Message::Enter => self.open_selected_row(),
                    Message::Export => self.export(),
                    Message::CopyRow => self.copy_table_row(),
                    Message::Reload => self.reload(),
                    Message::ClearFilter => self.apply_criteria(SearchCriteria::new()),
                    Message::Filter => self.enter_cmd_mode(CMDMode::Filter),
                    Message::GoToPage => self.enter_cmd_mode(CMDMode::GoToPage),
                    Message::EnterCommand => self.enter_cmd_mode(CMDMode::Raw),
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::BOARD => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveUp => self.move_card(-1),
                    Message::MoveDown => self.move_card(1),
                    Message::MoveLeft => self.move_bucket(-1),
                    Message::MoveRight => self.move_bucket(1),
                    Message::ToggleBoard | Message::Exit => self.toggle_board(),
                    Message::PickUp | Message::Drop => self.pick_up_or_drop(),
                    Message::Enter => self.open_selected_card(),
                    Message::Reload => self.reload(),
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::RECORD => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Enter => self.modus = self.record_return,
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Enter | Message::Help => {
                        self.modus = self.previous_modus;
                    }
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key)
                    }
                }
            }
        }
        self.update_uidata();
        Ok(())
    }

    // -------------------- Loading ---------------------- //

    fn apply_criteria(&mut self, criteria: SearchCriteria) {
        self.criteria = criteria.clone();
        if let Some(request) = self.subscription.observe(criteria) {
            let result = self.store.fetch_records(&request.params);
            if self.subscription.accept(request.token) {
                self.load_table(result, false);
            }
        }
    }

    fn reload(&mut self) {
        if let Some(request) = self.subscription.refresh() {
            let result = self.store.fetch_records(&request.params);
            if self.subscription.accept(request.token) {
                self.load_table(result, true);
            }
        }
        self.board
            .resync(&mut self.store, &self.criteria, &mut self.status_line);
        self.clamp_board_cursor();
    }

    fn load_table(&mut self, result: Result<Vec<Record>, RVError>, preserve_view: bool) {
        match result {
            Ok(records) => {
                self.table.set_total_results(self.store.records().len());
                self.table.set_records(records, preserve_view);
                if !self.table.has_no_filters() {
                    self.status_line.notify(
                        "Filter",
                        &format!(
                            "{} of {} records match",
                            self.table.total_items(),
                            self.store.records().len()
                        ),
                        Severity::Info,
                    );
                }
            }
            Err(e) => {
                self.table.set_records(Vec::new(), false);
                self.status_line
                    .notify("Error Loading Records", &e.to_string(), Severity::Error);
            }
        }
        self.clamp_cursor();
    }

    // -------------------- Table ---------------------- //

    fn change_page(&mut self, action: impl FnOnce(&mut PagedSortedTable)) {
        action(&mut self.table);
        self.clamp_cursor();
    }

    fn move_row(&mut self, step: isize) {
        let visible = self.table.visible_page().len();
        if visible == 0 {
            return;
        }
        if step < 0 && self.cursor_row == 0 {
            if !self.table.is_first_page() {
                self.table.previous_page();
                self.cursor_row = self.table.visible_page().len().saturating_sub(1);
            }
        } else if step > 0 && self.cursor_row + 1 >= visible {
            if !self.table.is_last_page() {
                self.table.next_page();
                self.cursor_row = 0;
            }
        } else {
            self.cursor_row = self.cursor_row.saturating_add_signed(step);
        }
    }

    fn move_column(&mut self, step: isize) {
        let ncolumns = self.table.columns().len();
        if ncolumns > 0 {
            self.cursor_column = self
                .cursor_column
                .saturating_add_signed(step)
                .min(ncolumns - 1);
        }
    }

    fn clamp_cursor(&mut self) {
        let visible = self.table.visible_page().len();
        self.cursor_row = self.cursor_row.min(visible.saturating_sub(1));
    }

    fn sort_current_column(&mut self, direction: SortDirection) {
        let Some(column) = self.table.columns().get(self.cursor_column).cloned() else {
            return;
        };
        if !column.sortable {
            self.status_line.notify(
                "Sort",
                &format!("{} is not sortable", column.header()),
                Severity::Warning,
            );
            return;
        }
        self.table.sort(&column.field_name, direction);
        self.cursor_row = 0;
    }

    fn selected_record(&self) -> Option<&Record> {
        self.table.visible_page().get(self.cursor_row)
    }

    fn open_selected_row(&mut self) {
        if let Some(record) = self.selected_record().cloned() {
            self.open_record(record);
        }
    }

    fn open_record(&mut self, record: Record) {
        trace!("Open record {:?}", record_id(&record, self.table.key_field()));
        self.record = Some(record);
        self.record_return = self.modus;
        self.modus = Modus::RECORD;
    }

    fn copy_table_row(&mut self) {
        let Some(record) = self.selected_record() else {
            return;
        };
        let cells: Vec<String> = self
            .table
            .columns()
            .iter()
            .map(|c| cell_text(record, c))
            .collect();
        let row_content = csv_line(&cells);

        match self.clipboard.as_mut().map(|c| c.set_text(row_content)) {
            Some(Ok(_)) => trace!("Copied row content to clipboard."),
            Some(Err(e)) => {
                self.status_line
                    .notify("Copy", &format!("{e}"), Severity::Warning)
            }
            None => self
                .status_line
                .notify("Copy", "No clipboard available", Severity::Warning),
        }
    }

    fn export(&mut self) {
        let search_type = self.config.search_type.as_deref();
        let columns = if search_type.and_then(SearchType::parse).is_some() {
            export_columns_for(search_type)
        } else {
            self.table.columns().to_vec()
        };
        let payload = export_payload(self.table.records(), &columns, search_type);
        match payload.deliver(&mut self.sink) {
            Ok(()) => {
                let path = self
                    .sink
                    .last_written()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| payload.filename.clone());
                self.status_line.notify(
                    "Export",
                    &format!("Wrote {} records to {}", self.table.total_items(), path),
                    Severity::Success,
                );
            }
            Err(e) => self
                .status_line
                .notify("Export Failed", &e.to_string(), Severity::Error),
        }
    }

    // -------------------- Board ---------------------- //

    fn toggle_board(&mut self) {
        self.modus = match self.modus {
            Modus::BOARD => {
                self.board.end_drag();
                Modus::TABLE
            }
            _ => Modus::BOARD,
        };
        self.clamp_board_cursor();
    }

    fn move_bucket(&mut self, step: isize) {
        let nbuckets = self.board.buckets().len();
        if nbuckets > 0 {
            self.board_bucket = self
                .board_bucket
                .saturating_add_signed(step)
                .min(nbuckets - 1);
        }
        self.clamp_board_cursor();
    }

    fn move_card(&mut self, step: isize) {
        self.board_card = self.board_card.saturating_add_signed(step);
        self.clamp_board_cursor();
    }

    fn clamp_board_cursor(&mut self) {
        let nbuckets = self.board.buckets().len();
        self.board_bucket = self.board_bucket.min(nbuckets.saturating_sub(1));
        let ncards = self
            .board
            .buckets()
            .get(self.board_bucket)
            .map_or(0, |b| b.records.len());
        self.board_card = self.board_card.min(ncards.saturating_sub(1));
    }

    fn selected_card(&self) -> Option<(String, String)> {
        let bucket = self.board.buckets().get(self.board_bucket)?;
        let record = bucket.records.get(self.board_card)?;
        let id = record_id(record, self.board.key_field())?;
        Some((id, bucket.spec.value.clone()))
    }

    fn pick_up_or_drop(&mut self) {
        if self.board.dragging().is_none() {
            if let Some((id, source)) = self.selected_card() {
                self.board.begin_drag(&id, &source);
            }
            return;
        }
        let Some(target) = self
            .board
            .buckets()
            .get(self.board_bucket)
            .map(|b| b.spec.value.clone())
        else {
            return;
        };
        let moved = self.board.move_record(
            &target,
            &mut self.store,
            &self.criteria,
            &mut self.status_line,
        );
        self.board.end_drag();
        if moved.is_some() {
            // The table shows the same records, pick up the new statuses.
            if let Some(request) = self.subscription.refresh() {
                let result = self.store.fetch_records(&request.params);
                if self.subscription.accept(request.token) {
                    self.load_table(result, true);
                }
            }
        }
        self.clamp_board_cursor();
    }

    fn open_selected_card(&mut self) {
        let Some((id, _)) = self.selected_card() else {
            return;
        };
        let mut opener = RecordOpener::default();
        if self.board.activate(&id, &mut opener)
            && let Some(requested) = opener.requested
        {
            let key_field = self.board.key_field().to_string();
            let record = self
                .store
                .records()
                .iter()
                .find(|r| record_id(r, &key_field).as_deref() == Some(requested.as_str()))
                .cloned();
            if let Some(record) = record {
                self.open_record(record);
            }
        }
    }

    // -------------------- Popup and command line ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.active_cmdinput = false;
        self.modus = self.previous_modus;

        if self.last_input.canceled {
            self.cmd_mode = None;
            return;
        }
        let cmd_input = self.last_input.input.trim().to_string();
        match self.cmd_mode {
            Some(CMDMode::Filter) => {
                let criteria = SearchCriteria::new().search(Some(&cmd_input));
                self.apply_criteria(criteria);
            }
            Some(CMDMode::GoToPage) => match cmd_input.parse::<usize>() {
                Ok(page) => self.change_page(|t| t.go_to_page(page)),
                Err(_) => self.status_line.notify(
                    "Go to page",
                    &format!("\"{cmd_input}\" is not a page number"),
                    Severity::Warning,
                ),
            },
            Some(CMDMode::Raw) => info!("Raw cmd mode {cmd_input}"),
            None => info!("Cmd mode is none!"),
        }
        self.cmd_mode = None;
    }

    // -------------------- UI data ---------------------- //

    fn update_uidata(&mut self) {
        let columns = self.table.columns();
        let sorted_column = self.table.sort_state().sorted_by.as_ref().and_then(|field| {
            columns
                .iter()
                .position(|c| &c.field_name == field)
                .map(|idx| (idx, self.table.sort_state().direction))
        });
        let table = TableData {
            headers: columns.iter().map(|c| c.header().to_string()).collect(),
            rows: self
                .table
                .visible_page()
                .iter()
                .map(|r| columns.iter().map(|c| cell_text(r, c)).collect())
                .collect(),
            selected_row: self.cursor_row,
            selected_column: self.cursor_column,
            sorted_column,
            page_items: self.table.page_items(),
            page_info: self.table.page_info("records"),
        };

        let board = BoardData {
            buckets: self
                .board
                .buckets()
                .iter()
                .map(|b| BucketData {
                    label: b.spec.label.clone(),
                    cards: b.records.iter().map(|r| self.board.card(r)).collect(),
                })
                .collect(),
            selected_bucket: self.board_bucket,
            selected_card: self.board_card,
            dragging: self.board.dragging().map(|d| d.record_id.clone()),
            updating: self.board.is_updating(),
        };

        let record: Vec<(String, String)> = self
            .record
            .as_ref()
            .map(|r| {
                r.iter()
                    .map(|(k, v)| (k.clone(), display_value(v)))
                    .collect()
            })
            .unwrap_or_default();

        let shown = match self.modus {
            Modus::POPUP | Modus::CMDINPUT => self.previous_modus,
            other => other,
        };
        let view = match shown {
            Modus::BOARD => View::Board,
            Modus::RECORD => View::Record,
            _ => View::Table,
        };

        self.uidata = UIData {
            name: self.name.clone(),
            view,
            table,
            board,
            record,
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status: self.status_line.clone(),
            last_update: Instant::now(),
        };
    }
}

/// Text shown for one cell.
fn cell_text(record: &Record, column: &Column) -> String {
    match column.column_type {
        ColumnType::Url => {
            let label = column
                .label_field
                .as_deref()
                .map(|f| field_text(record, f))
                .unwrap_or_default();
            if label.is_empty() {
                field_text(record, &column.field_name)
            } else {
                label
            }
        }
        ColumnType::Date => match resolve(record, &column.field_name) {
            Some(v) => parse_timestamp(v)
                .map(|ts| ts.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| display_value(v)),
            None => String::new(),
        },
        _ => field_text(record, &column.field_name),
    }
}

/// Buckets of the board: the user story statuses when the data uses them,
/// otherwise every status value in order of appearance.
fn bucket_specs_for(records: &[Record], status_field: &str) -> Vec<BucketSpec> {
    let defaults = BucketSpec::user_story_defaults();
    let statuses: Vec<String> = records.iter().map(|r| field_text(r, status_field)).collect();
    if statuses.iter().any(|s| defaults.iter().any(|d| &d.value == s)) {
        return defaults;
    }
    let mut specs: Vec<BucketSpec> = Vec::new();
    for status in statuses {
        if !status.is_empty() && !specs.iter().any(|s| s.value == status) {
            specs.push(BucketSpec::new(&status, &status.replace('_', " ")));
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use serde_json::{Value, json};

    fn data(n: usize) -> LoadedData {
        let statuses = ["Backlog", "In_Progress", "Done"];
        let records: Vec<Record> = (0..n)
            .filter_map(|i| {
                match json!({
                    "id": format!("s{i}"),
                    "name": format!("Story {i:02}"),
                    "status": statuses[i % 3],
                    "createdDate": format!("2025-01-{:02}T08:00:00Z", i % 28 + 1),
                }) {
                    Value::Object(map) => Some(map),
                    _ => None,
                }
            })
            .collect();
        LoadedData {
            name: "stories.json".to_string(),
            columns: vec![
                Column::new("Name", "name"),
                Column::new("Status", "status"),
                Column::new("Created", "createdDate").with_column_type(ColumnType::Date),
            ],
            records,
        }
    }

    fn model(config: RVConfig, n: usize) -> Model {
        Model::build(&config, data(n), None).unwrap()
    }

    fn send(model: &mut Model, messages: Vec<Message>) {
        for m in messages {
            model.update(Some(m)).unwrap();
        }
    }

    fn type_command(model: &mut Model, text: &str) {
        for c in text.chars() {
            send(
                model,
                vec![Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))],
            );
        }
        send(
            model,
            vec![Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))],
        );
    }

    #[test]
    fn pages_through_the_table() {
        let mut model = model(RVConfig::default().page_size(10_usize), 45);
        let ui = model.get_uidata();
        assert_eq!(ui.table.rows.len(), 10);
        assert_eq!(ui.table.page_info, "Showing 1-10 of 45 records");
        send(&mut model, vec![Message::LastPage]);
        assert_eq!(model.get_uidata().table.rows.len(), 5);
        send(&mut model, vec![Message::PreviousPage, Message::PreviousPage]);
        assert_eq!(model.get_uidata().table.page_info, "Showing 21-30 of 45 records");
    }

    #[test]
    fn moving_past_the_page_end_turns_the_page() {
        let mut model = model(RVConfig::default().page_size(2_usize), 5);
        send(&mut model, vec![Message::MoveDown, Message::MoveDown]);
        assert_eq!(model.table.current_page(), 2);
        assert_eq!(model.get_uidata().table.selected_row, 0);
        send(&mut model, vec![Message::MoveUp]);
        assert_eq!(model.table.current_page(), 1);
        assert_eq!(model.get_uidata().table.selected_row, 1);
    }

    #[test]
    fn sorts_the_selected_column() {
        let mut model = model(RVConfig::default(), 12);
        send(&mut model, vec![Message::SortDescending]);
        let ui = model.get_uidata();
        assert_eq!(ui.table.rows[0][0], "Story 11");
        assert_eq!(ui.table.sorted_column, Some((0, SortDirection::Desc)));
    }

    #[test]
    fn filters_through_the_command_line() {
        let mut model = model(RVConfig::default(), 30);
        send(&mut model, vec![Message::Filter]);
        assert!(model.raw_keyevents());
        type_command(&mut model, "story 1");
        assert!(!model.raw_keyevents());
        assert_eq!(model.table.total_items(), 10);
        assert!(!model.table.has_no_filters());
        send(&mut model, vec![Message::ClearFilter]);
        assert_eq!(model.table.total_items(), 30);
    }

    #[test]
    fn goes_to_a_typed_page() {
        let mut model = model(RVConfig::default().page_size(5_usize), 30);
        send(&mut model, vec![Message::GoToPage]);
        type_command(&mut model, "4");
        assert_eq!(model.table.current_page(), 4);
        send(&mut model, vec![Message::GoToPage]);
        type_command(&mut model, "four");
        assert_eq!(model.table.current_page(), 4);
        assert_eq!(model.get_uidata().status.severity, Severity::Warning);
    }

    #[test]
    fn moves_cards_on_the_board() {
        let mut model = model(RVConfig::default(), 6);
        send(&mut model, vec![Message::ToggleBoard]);
        assert_eq!(model.get_uidata().view, View::Board);
        assert_eq!(model.get_uidata().board.buckets.len(), 5);

        // Pick up the first backlog card, drop it on Done.
        send(&mut model, vec![Message::PickUp]);
        assert_eq!(model.get_uidata().board.dragging.as_deref(), Some("s0"));
        send(
            &mut model,
            vec![Message::MoveRight, Message::MoveRight, Message::MoveRight, Message::Drop],
        );
        let ui = model.get_uidata();
        assert!(ui.board.dragging.is_none());
        assert_eq!(ui.board.buckets[0].cards.len(), 1);
        assert!(ui.board.buckets[3].cards.iter().any(|c| c.id == "s0"));
        assert_eq!(ui.status.severity, Severity::Success);
    }

    #[test]
    fn rejected_moves_roll_back() {
        let config = RVConfig::default().rejected_statuses(vec!["Blocked".to_string()]);
        let mut model = model(config, 6);
        send(&mut model, vec![Message::ToggleBoard, Message::PickUp]);
        send(&mut model, vec![Message::MoveRight; 4]);
        send(&mut model, vec![Message::Drop]);
        let ui = model.get_uidata();
        assert_eq!(ui.board.buckets[0].cards.len(), 2);
        assert!(ui.board.buckets[4].cards.is_empty());
        assert_eq!(ui.status.severity, Severity::Error);
    }

    #[test]
    fn opens_cards_and_rows() {
        let mut model = model(RVConfig::default(), 3);
        send(&mut model, vec![Message::Enter]);
        assert_eq!(model.get_uidata().view, View::Record);
        assert!(
            model
                .get_uidata()
                .record
                .iter()
                .any(|(k, v)| k == "name" && v == "Story 00")
        );
        send(&mut model, vec![Message::Exit, Message::ToggleBoard, Message::Enter]);
        assert_eq!(model.get_uidata().view, View::Record);
        send(&mut model, vec![Message::Exit]);
        assert_eq!(model.get_uidata().view, View::Board);
    }

    #[test]
    fn exports_the_record_set() {
        let dir = tempfile::tempdir().unwrap();
        let config = RVConfig::default().export_dir(dir.path().to_path_buf());
        let mut model = model(config, 3);
        send(&mut model, vec![Message::Export]);
        let written = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
        assert!(written.starts_with("\u{FEFF}Name,Status,Created\n"));
        assert_eq!(written.lines().count(), 4);
        assert_eq!(model.get_uidata().status.severity, Severity::Success);
    }

    #[test]
    fn help_popup_returns_to_the_view() {
        let mut model = model(RVConfig::default(), 3);
        send(&mut model, vec![Message::Help]);
        assert!(model.get_uidata().show_popup);
        send(&mut model, vec![Message::Exit]);
        assert!(!model.get_uidata().show_popup);
        send(&mut model, vec![Message::Quit]);
        assert_eq!(model.status, Status::QUITTING);
    }

    #[test]
    fn derives_buckets_from_unknown_statuses() {
        let records: Vec<Record> = [json!({"status": "Open"}), json!({"status": "Closed_Won"})]
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        let specs = bucket_specs_for(&records, "status");
        assert_eq!(specs, vec![BucketSpec::new("Open", "Open"), BucketSpec::new("Closed_Won", "Closed Won")]);
    }
}

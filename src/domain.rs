use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

// Error type shared by the view-models, the loaders and the tui host.
#[derive(Debug)]
pub enum RVError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidPageSize(usize),
    InvalidOption { field: String, value: String },
    RecordNotFound(String),
    Remote(String),
}

impl fmt::Display for RVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RVError::IoError(e) => write!(f, "io error: {e}"),
            RVError::PolarsError(e) => write!(f, "could not read data: {e}"),
            RVError::JsonError(e) => write!(f, "invalid json: {e}"),
            RVError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            RVError::FileNotFound => write!(f, "file not found"),
            RVError::PermissionDenied => write!(f, "permission denied"),
            RVError::UnknownFileType => write!(f, "unknown file type"),
            RVError::InvalidPageSize(n) => write!(f, "invalid page size {n}"),
            RVError::InvalidOption { field, value } => {
                write!(f, "\"{value}\" is not a valid option for {field}")
            }
            RVError::RecordNotFound(id) => write!(f, "record {id} not found"),
            RVError::Remote(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RVError {}

impl From<Error> for RVError {
    fn from(err: Error) -> Self {
        RVError::IoError(err)
    }
}

impl From<PolarsError> for RVError {
    fn from(err: PolarsError) -> Self {
        RVError::PolarsError(err)
    }
}

impl From<serde_json::Error> for RVError {
    fn from(err: serde_json::Error) -> Self {
        RVError::JsonError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct RVConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub max_column_width: usize,
    pub key_field: String,
    pub status_field: String,
    pub tie_break_field: String,
    pub search_type: Option<String>,
    pub export_dir: PathBuf,
    pub rejected_statuses: Vec<String>,
}

impl Default for RVConfig {
    fn default() -> Self {
        RVConfig {
            event_poll_time: 100,
            page_size: 20,
            max_column_width: 30,
            key_field: "id".to_string(),
            status_field: "status".to_string(),
            tie_break_field: "name".to_string(),
            search_type: None,
            export_dir: PathBuf::from("."),
            rejected_statuses: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter,
    GoToPage,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    SortAscending,
    SortDescending,
    ToggleBoard,
    PickUp,
    Drop,
    Enter,
    Exit,
    Export,
    CopyRow,
    Reload,
    ClearFilter,
    Filter,
    GoToPage,
    EnterCommand,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "rv - record viewer

Table
  j / k, arrows      move selection
  h / l              select column
  n / p              next / previous page
  g / G              first / last page
  [ / ]              sort column ascending / descending
  /                  filter records
  :                  go to page
  c                  clear filter
  e                  export records to csv
  y                  copy row
  Enter              show record

Board
  b                  toggle board
  h / l              select bucket
  j / k              select card
  m                  pick up / drop card
  Enter / Space      open card

General
  r                  reload
  ?                  help
  Esc                back
  q                  quit";

//! View-models for record tables: a paged and sortable table, a status board
//! with optimistic moves, and a csv exporter. The `rv` binary hosts them in a
//! terminal.

pub mod board;
pub mod column;
pub mod domain;
pub mod export;
pub mod filter;
pub mod loader;
pub mod presets;
pub mod record;
pub mod sort;
pub mod source;
pub mod store;
pub mod table;

pub use board::{BucketSpec, MoveState, PendingMove, StatusBoard};
pub use column::{Column, ColumnType, SelectOption};
pub use domain::{RVConfig, RVError};
pub use export::{ExportPayload, export, export_payload};
pub use filter::SearchCriteria;
pub use record::Record;
pub use sort::{SortDirection, SortState};
pub use source::{DataSource, FileSink, Navigator, Notifier, Severity, StatusUpdater, Subscription};
pub use table::{PageItem, PageState, PagedSortedTable};

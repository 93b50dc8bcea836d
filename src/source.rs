//! Collaborators the view-models talk to, and fetch bookkeeping.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::domain::RVError;
use crate::filter::SearchCriteria;
use crate::record::Record;
use crate::sort::{SortDirection, SortState};
use crate::table::PageState;

pub trait DataSource {
    fn fetch_records(&mut self, criteria: &SearchCriteria) -> Result<Vec<Record>, RVError>;

    fn fetch_records_by_bucket(
        &mut self,
        criteria: &SearchCriteria,
    ) -> Result<BTreeMap<String, Vec<Record>>, RVError>;
}

pub trait StatusUpdater {
    fn update_status(&mut self, record_id: &str, new_status: &str) -> Result<Record, RVError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

pub trait Notifier {
    fn notify(&mut self, title: &str, message: &str, severity: Severity);
}

pub trait Navigator {
    fn navigate_to_record(&mut self, record_id: &str);
}

pub trait FileSink {
    fn deliver(&mut self, bytes: &[u8], filename: &str) -> Result<(), RVError>;
}

/// Writes delivered files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        DirectorySink {
            dir,
            last_written: None,
        }
    }

    pub fn last_written(&self) -> Option<&PathBuf> {
        self.last_written.as_ref()
    }
}

impl FileSink for DirectorySink {
    fn deliver(&mut self, bytes: &[u8], filename: &str) -> Result<(), RVError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        self.last_written = Some(path);
        Ok(())
    }
}

/// Everything a fetch depends on. Equal params mean the previous response is still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub criteria: SearchCriteria,
    pub page_number: usize,
    pub page_size: usize,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
}

impl FetchParams {
    pub fn derive(criteria: &SearchCriteria, page: &PageState, sort: &SortState) -> Self {
        FetchParams {
            criteria: criteria.clone(),
            page_number: page.current_page,
            page_size: page.page_size,
            sort_by: sort.sorted_by.clone(),
            sort_direction: sort.direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest<P> {
    pub token: RequestToken,
    pub params: P,
}

/// Tracks the inputs of a remote query. A new request is issued only when the
/// params change (or on an explicit refresh) and only the latest request's
/// response is accepted.
#[derive(Debug, Clone)]
pub struct Subscription<P> {
    params: Option<P>,
    issued: u64,
}

impl<P: Clone + PartialEq> Default for Subscription<P> {
    fn default() -> Self {
        Subscription {
            params: None,
            issued: 0,
        }
    }
}

impl<P: Clone + PartialEq> Subscription<P> {
    pub fn new() -> Self {
        Subscription::default()
    }

    pub fn observe(&mut self, params: P) -> Option<FetchRequest<P>> {
        if self.params.as_ref() == Some(&params) {
            trace!("Fetch params unchanged");
            return None;
        }
        self.params = Some(params);
        self.refresh()
    }

    /// Re-issues the current params, e.g. to resync after a mutation.
    pub fn refresh(&mut self) -> Option<FetchRequest<P>> {
        let params = self.params.clone()?;
        self.issued += 1;
        debug!("Issue fetch request {}", self.issued);
        Some(FetchRequest {
            token: RequestToken(self.issued),
            params,
        })
    }

    pub fn accept(&self, token: RequestToken) -> bool {
        let latest = token.0 == self.issued;
        if !latest {
            debug!("Discard stale response {} (latest {})", token.0, self.issued);
        }
        latest
    }

    pub fn params(&self) -> Option<&P> {
        self.params.as_ref()
    }
}

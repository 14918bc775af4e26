//! Dashboard view-state controller.
//!
//! Pure state machine bridging three things that must never drift apart:
//! the requested route (list vs. a specific batch), the asynchronously
//! fetched data, and local selection/filter/sort state. No terminal and no
//! HTTP in here — everything is unit-testable.
//!
//! Invariants enforced by construction:
//! - the view mode always agrees with the route; a route naming a batch
//!   that is not in the loaded list loses, and the controller redirects to
//!   the list
//! - the selected record and the record modal are a single value
//!   (`modal_record`), so "modal open with no record" and "record selected
//!   with modal closed" are unrepresentable
//! - fetch results carry the batch id they were fetched for and are
//!   dropped when the selection has moved on

use std::time::{Duration, Instant};

use reconsole_model::{Batch, BatchStatus, MatchStatus, TxnRecord};

pub(crate) const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    List,
    Details,
}

/// The dashboard's route analogue: what the user asked to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    List,
    Batch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortField {
    Id,
    Status,
    Records,
    BackofficeFile,
    VendorFile,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortDir {
    Asc,
    Desc,
}

/// Outcome of a route/data reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RouteSync {
    InSync,
    /// The route referenced a batch that does not exist; the controller
    /// fell back to the list view and rewrote the route.
    Redirected,
}

/// Async slot: a fetch is running, finished, or failed.
#[derive(Debug)]
pub(crate) enum Load<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Load<T> {
    pub(crate) fn ready(&self) -> Option<&T> {
        match self {
            Load::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn failed(&self) -> Option<&str> {
        match self {
            Load::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self, Load::Loading)
    }
}

/// Coalesce rapid duplicate triggers into one logical action.
#[derive(Debug)]
pub(crate) struct Debounce {
    window: Duration,
    last: Option<Instant>,
}

impl Debounce {
    pub(crate) fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// True when the trigger should fire. Repeat triggers inside the window
    /// are absorbed by the first one.
    pub(crate) fn allow(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.duration_since(prev) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub(crate) struct DashState {
    pub route: Route,
    pub view: View,

    pub batches: Load<Vec<Batch>>,
    pub selected_batch: Option<String>,
    /// For scroll restoration when returning to the list.
    pub last_selected_batch_id: Option<String>,

    pub search: String,
    pub batch_status_filter: Option<BatchStatus>,
    pub record_status_filter: Option<MatchStatus>,
    pub sort: Option<(SortField, SortDir)>,

    /// Fresh single-batch payload for the details view (may land before or
    /// after `records` — order is not guaranteed).
    pub detail: Load<Batch>,
    pub records: Load<Vec<TxnRecord>>,
    /// Server-side per-status counts — usually lands before `records` and
    /// fills the header badges in the meantime.
    pub status_counts: Option<Vec<(String, u64)>>,

    pub list_cursor: usize,
    pub record_cursor: usize,

    /// Selected record id + modal-open flag, fused into one value.
    modal_record: Option<i64>,
    open_debounce: Debounce,

    /// One-line non-blocking notification area.
    pub status_line: Option<String>,
}

impl DashState {
    pub(crate) fn new(route: Route) -> Self {
        let mut state = Self {
            route: Route::List,
            view: View::List,
            batches: Load::Loading,
            selected_batch: None,
            last_selected_batch_id: None,
            search: String::new(),
            batch_status_filter: None,
            record_status_filter: None,
            sort: None,
            detail: Load::Loading,
            records: Load::Loading,
            status_counts: None,
            list_cursor: 0,
            record_cursor: 0,
            modal_record: None,
            open_debounce: Debounce::new(DEBOUNCE_WINDOW),
            status_line: None,
        };
        if let Route::Batch(id) = route {
            // Deep link: trust the route until the batch list proves it wrong.
            state.route = Route::Batch(id.clone());
            state.view = View::Details;
            state.selected_batch = Some(id.clone());
            state.last_selected_batch_id = Some(id);
        }
        state
    }

    // ── Route/view reconciliation ───────────────────────────────────

    /// Re-align view mode, route, and loaded data. The route wins, except
    /// when it names a batch that is not in the loaded list — then the list
    /// view wins and the route is rewritten.
    pub(crate) fn sync_route(&mut self) -> RouteSync {
        let target = match &self.route {
            Route::List => None,
            Route::Batch(id) => Some(id.clone()),
        };
        match target {
            None => {
                self.view = View::List;
                RouteSync::InSync
            }
            Some(id) => {
                if let Some(batches) = self.batches.ready() {
                    if !batches.iter().any(|b| b.id == id) {
                        self.to_list();
                        self.status_line = Some(format!("batch {id} not found"));
                        return RouteSync::Redirected;
                    }
                }
                self.view = View::Details;
                self.selected_batch = Some(id);
                RouteSync::InSync
            }
        }
    }

    /// User picked a batch row ("View Details").
    pub(crate) fn select_batch(&mut self, id: &str) {
        self.route = Route::Batch(id.to_string());
        self.view = View::Details;
        self.selected_batch = Some(id.to_string());
        self.last_selected_batch_id = Some(id.to_string());
        self.detail = Load::Loading;
        self.records = Load::Loading;
        self.status_counts = None;
        self.record_cursor = 0;
        self.record_status_filter = None;
        self.modal_record = None;
    }

    /// User clicked "Back to Batches" (or a redirect fired).
    pub(crate) fn back_to_list(&mut self) {
        self.to_list();
    }

    fn to_list(&mut self) {
        self.modal_record = None;
        self.selected_batch = None;
        self.route = Route::List;
        self.view = View::List;
    }

    // ── Record selection / modal ────────────────────────────────────

    /// Open the record-detail modal. Debounced: repeat calls within the
    /// window collapse into the first. Selecting and opening happen
    /// together, always.
    pub(crate) fn open_record(&mut self, record_id: i64, now: Instant) -> bool {
        if !self.open_debounce.allow(now) {
            return false;
        }
        let exists = self
            .records
            .ready()
            .map(|rs| rs.iter().any(|r| r.id == record_id))
            .unwrap_or(false);
        if !exists {
            return false;
        }
        self.modal_record = Some(record_id);
        true
    }

    pub(crate) fn close_modal(&mut self) {
        self.modal_record = None;
    }

    pub(crate) fn modal_record(&self) -> Option<&TxnRecord> {
        let id = self.modal_record?;
        self.records.ready()?.iter().find(|r| r.id == id)
    }

    pub(crate) fn modal_open(&self) -> bool {
        self.modal_record.is_some()
    }

    // ── Fetch-result application (with liveness guards) ─────────────

    pub(crate) fn apply_batches(&mut self, result: Result<Vec<Batch>, String>) -> RouteSync {
        self.batches = match result {
            Ok(batches) => Load::Ready(batches),
            Err(e) => Load::Failed(e),
        };
        self.clamp_list_cursor();
        self.sync_route()
    }

    pub(crate) fn apply_detail(&mut self, batch_id: &str, result: Result<Batch, String>) {
        if self.selected_batch.as_deref() != Some(batch_id) {
            return; // stale: selection moved on while the fetch was in flight
        }
        self.detail = match result {
            Ok(batch) => Load::Ready(batch),
            Err(e) => Load::Failed(e),
        };
    }

    pub(crate) fn apply_counts(&mut self, batch_id: &str, counts: Vec<(String, u64)>) {
        if self.selected_batch.as_deref() != Some(batch_id) {
            return;
        }
        self.status_counts = Some(counts);
    }

    /// Apply a record-list fetch. The authoritative server copy overwrites
    /// any optimistic local merge unconditionally.
    pub(crate) fn apply_records(&mut self, batch_id: &str, result: Result<Vec<TxnRecord>, String>) {
        if self.selected_batch.as_deref() != Some(batch_id) {
            return;
        }
        self.records = match result {
            Ok(records) => Load::Ready(records),
            Err(e) => Load::Failed(e),
        };
        // If the refetch dropped the record behind the modal, close it.
        if let Some(id) = self.modal_record {
            let still_there = self
                .records
                .ready()
                .map(|rs| rs.iter().any(|r| r.id == id))
                .unwrap_or(false);
            if !still_there {
                self.modal_record = None;
            }
        }
        self.clamp_record_cursor();
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Merge a successful resolve/comment into the currently-selected
    /// record only. The background refetch reconciles everything else.
    pub(crate) fn optimistic_resolve(&mut self, comment: &str, resolve: bool) {
        let Some(id) = self.modal_record else { return };
        if let Load::Ready(records) = &mut self.records {
            if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                record.resolution_comments.push(comment.to_string());
                if resolve {
                    record.resolved = true;
                }
            }
        }
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = Some(message.into());
    }

    // ── Filters and sorting ─────────────────────────────────────────

    pub(crate) fn toggle_sort(&mut self, field: SortField) {
        self.sort = match self.sort {
            Some((current, SortDir::Asc)) if current == field => Some((field, SortDir::Desc)),
            Some((current, SortDir::Desc)) if current == field => Some((field, SortDir::Asc)),
            _ => Some((field, SortDir::Asc)),
        };
    }

    pub(crate) fn cycle_batch_filter(&mut self) {
        self.batch_status_filter = match self.batch_status_filter {
            None => Some(BatchStatus::Pending),
            Some(BatchStatus::Pending) => Some(BatchStatus::Running),
            Some(BatchStatus::Running) => Some(BatchStatus::Done),
            Some(BatchStatus::Done) => Some(BatchStatus::Failed),
            Some(BatchStatus::Failed) => None,
        };
        self.clamp_list_cursor();
    }

    pub(crate) fn cycle_record_filter(&mut self) {
        self.record_status_filter = match self.record_status_filter {
            None => Some(MatchStatus::Matched),
            Some(MatchStatus::Matched) => Some(MatchStatus::Partial),
            Some(MatchStatus::Partial) => Some(MatchStatus::Unmatched),
            Some(MatchStatus::Unmatched) => Some(MatchStatus::Duplicate),
            Some(MatchStatus::Duplicate) => Some(MatchStatus::Missing),
            Some(MatchStatus::Missing) => None,
        };
        self.clamp_record_cursor();
    }

    pub(crate) fn visible_batches(&self) -> Vec<&Batch> {
        let Some(batches) = self.batches.ready() else {
            return Vec::new();
        };
        let mut visible = filter_batches(batches, &self.search, self.batch_status_filter);
        sort_batches(&mut visible, self.sort);
        visible
    }

    pub(crate) fn visible_records(&self) -> Vec<&TxnRecord> {
        let Some(records) = self.records.ready() else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|r| match self.record_status_filter {
                None => true,
                Some(status) => r.status == status,
            })
            .collect()
    }

    pub(crate) fn clamp_list_cursor(&mut self) {
        let len = self.visible_batches().len();
        self.list_cursor = self.list_cursor.min(len.saturating_sub(1));
    }

    pub(crate) fn clamp_record_cursor(&mut self) {
        let len = self.visible_records().len();
        self.record_cursor = self.record_cursor.min(len.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Free functions (shared with the non-interactive commands)
// ---------------------------------------------------------------------------

/// A batch is visible when its id or either file name contains the search
/// term (case-insensitive) AND the status filter is off or matches.
pub(crate) fn filter_batches<'a>(
    batches: &'a [Batch],
    search: &str,
    status: Option<BatchStatus>,
) -> Vec<&'a Batch> {
    let needle = search.to_lowercase();
    batches
        .iter()
        .filter(|b| {
            let text_match = needle.is_empty()
                || b.id.to_lowercase().contains(&needle)
                || b.backoffice_file.to_lowercase().contains(&needle)
                || b.vendor_file.to_lowercase().contains(&needle);
            let status_match = match status {
                None => true,
                Some(s) => b.status == s,
            };
            text_match && status_match
        })
        .collect()
}

/// Sort a filtered batch list. With no explicit choice, most recent first.
/// Chosen fields compare type-aware: strings case-insensitively, counts and
/// timestamps numerically.
pub(crate) fn sort_batches(batches: &mut [&Batch], sort: Option<(SortField, SortDir)>) {
    match sort {
        None => batches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Some((field, dir)) => {
            batches.sort_by(|a, b| {
                let ord = match field {
                    SortField::Id => a.id.to_lowercase().cmp(&b.id.to_lowercase()),
                    SortField::Status => a.status.to_string().cmp(&b.status.to_string()),
                    SortField::Records => a.record_count.cmp(&b.record_count),
                    SortField::BackofficeFile => a
                        .backoffice_file
                        .to_lowercase()
                        .cmp(&b.backoffice_file.to_lowercase()),
                    SortField::VendorFile => {
                        a.vendor_file.to_lowercase().cmp(&b.vendor_file.to_lowercase())
                    }
                    SortField::Created => a.created_at.cmp(&b.created_at),
                };
                match dir {
                    SortDir::Asc => ord,
                    SortDir::Desc => ord.reverse(),
                }
            });
        }
    }
}

/// Trimmed, non-empty comment — or nothing. Validation happens before any
/// network call.
pub(crate) fn validate_comment(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

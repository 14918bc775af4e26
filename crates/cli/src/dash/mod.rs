//! `reconsole dash` — interactive reconciliation dashboard.
//!
//! Two screens: the batch list and a batch's record table, with a record
//! modal on top. All remote data arrives through the [`fetch`] channel and
//! is applied via the [`state`] controller; this module only translates
//! keys into controller calls and draws the result.

pub(crate) mod fetch;
pub(crate) mod state;

use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use reconsole_api_client::ApiClient;
use reconsole_model::{recompute_match_rate, Batch, MatchStatus, TxnRecord};
use reconsole_stats::{direction_summary, format as money_fmt, status_breakdown};

use crate::exit_codes::EXIT_USAGE;
use crate::export;
use crate::util::{pad_right, parse_batch_ref};
use crate::CliError;

use fetch::{FetchEvent, Fetcher};
use state::{DashState, Load, Route, SortDir, SortField, View};

pub(crate) fn cmd_dash(client: ApiClient, batch: Option<String>) -> Result<(), CliError> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(CliError {
            code: EXIT_USAGE,
            message: "the dashboard needs a terminal".into(),
            hint: Some("use `reconsole batches` / `reconsole batch` for scriptable output".into()),
        });
    }

    let route = match batch {
        Some(b) => Route::Batch(format!("RB-{}", parse_batch_ref(&b)?)),
        None => Route::List,
    };

    let (tx, rx) = mpsc::channel();
    let fetcher = Fetcher::new(client, tx);
    fetcher.batches();

    let state = DashState::new(route.clone());
    if let Route::Batch(id) = &route {
        // Deep link: start both fetches immediately; sync_route corrects us
        // if the batch turns out not to exist.
        let raw_id = parse_batch_ref(id)?;
        fetcher.batch_bundle(id, raw_id);
    }

    let app = DashApp {
        state,
        fetcher,
        input: InputMode::Normal,
        should_quit: false,
        show_help: false,
    };
    run_app(app, rx).map_err(CliError::general)
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

enum InputMode {
    Normal,
    Search,
    Comment { resolve: bool, buffer: String },
}

struct DashApp {
    state: DashState,
    fetcher: Fetcher,
    input: InputMode,
    should_quit: bool,
    show_help: bool,
}

impl DashApp {
    // ── Fetch events ────────────────────────────────────────────────

    fn apply(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Batches(result) => {
                self.state.apply_batches(result);
            }
            FetchEvent::Detail { batch_id, result } => {
                self.state.apply_detail(&batch_id, result);
            }
            FetchEvent::Records { batch_id, result, warning_count } => {
                self.state.apply_records(&batch_id, result);
                if warning_count > 0 {
                    self.state.set_status(format!(
                        "{warning_count} record field(s) failed to decode — degraded values shown"
                    ));
                }
            }
            FetchEvent::Counts { batch_id, result } => {
                // Badge data is decorative; failures just leave it blank.
                if let Ok(counts) = result {
                    self.state.apply_counts(&batch_id, counts);
                }
            }
            FetchEvent::Retried { batch_id, result } => match result {
                Ok(()) => self.state.set_status(format!("{batch_id}: retry requested")),
                Err(e) => self.state.set_status(format!("retry failed: {e}")),
            },
            FetchEvent::Resolved { record_id, comment, resolve, result } => match result {
                Ok(()) => {
                    // Optimistic merge into the record behind the modal only;
                    // the refetch already on its way reconciles the rest.
                    if self.state.modal_record().map(|r| r.id) == Some(record_id) {
                        self.state.optimistic_resolve(&comment, resolve);
                    }
                    self.state.set_status(if resolve {
                        format!("record {record_id} resolved")
                    } else {
                        format!("comment added to record {record_id}")
                    });
                }
                Err(e) => self.state.set_status(format!("action failed: {e}")),
            },
        }
    }

    // ── Keys ────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        match std::mem::replace(&mut self.input, InputMode::Normal) {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Search => self.handle_search_key(key),
            InputMode::Comment { resolve, mut buffer } => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => self.submit_comment(&buffer, resolve),
                KeyCode::Backspace => {
                    buffer.pop();
                    self.input = InputMode::Comment { resolve, buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.input = InputMode::Comment { resolve, buffer };
                }
                _ => self.input = InputMode::Comment { resolve, buffer },
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.search.clear();
                self.state.clamp_list_cursor();
            }
            KeyCode::Enter => {}
            KeyCode::Backspace => {
                self.state.search.pop();
                self.state.clamp_list_cursor();
                self.input = InputMode::Search;
            }
            KeyCode::Char(c) => {
                self.state.search.push(c);
                self.state.clamp_list_cursor();
                self.input = InputMode::Search;
            }
            _ => self.input = InputMode::Search,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        if self.state.modal_open() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.state.close_modal(),
                KeyCode::Char('x') => {
                    // Resolved is terminal — only comments remain available.
                    if self.state.modal_record().map(|r| r.resolved).unwrap_or(false) {
                        self.state
                            .set_status("record is already resolved (comments still allowed)");
                    } else {
                        self.input = InputMode::Comment { resolve: true, buffer: String::new() };
                    }
                }
                KeyCode::Char('c') => {
                    self.input = InputMode::Comment { resolve: false, buffer: String::new() };
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            _ => match self.state.view {
                View::List => self.handle_list_key(key),
                View::Details => self.handle_details_key(key),
            },
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.list_cursor = self.state.list_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.state.visible_batches().len();
                if len > 0 && self.state.list_cursor + 1 < len {
                    self.state.list_cursor += 1;
                }
            }
            KeyCode::Enter => self.open_selected_batch(),
            KeyCode::Char('/') => self.input = InputMode::Search,
            KeyCode::Char('f') => self.state.cycle_batch_filter(),
            KeyCode::Char('r') => {
                if self.state.batches.failed().is_some() {
                    self.state.batches = Load::Loading;
                }
                self.fetcher.batches_fresh();
                self.state.set_status("refreshing batches…");
            }
            KeyCode::Char(c @ '1'..='6') => {
                let field = match c {
                    '1' => SortField::Id,
                    '2' => SortField::Status,
                    '3' => SortField::Records,
                    '4' => SortField::BackofficeFile,
                    '5' => SortField::VendorFile,
                    _ => SortField::Created,
                };
                self.state.toggle_sort(field);
                self.state.clamp_list_cursor();
            }
            KeyCode::Char('0') => self.state.sort = None,
            _ => {}
        }
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.record_cursor = self.state.record_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.state.visible_records().len();
                if len > 0 && self.state.record_cursor + 1 < len {
                    self.state.record_cursor += 1;
                }
            }
            KeyCode::Enter => {
                let id = self
                    .state
                    .visible_records()
                    .get(self.state.record_cursor)
                    .map(|r| r.id);
                if let Some(id) = id {
                    self.state.open_record(id, Instant::now());
                }
            }
            KeyCode::Esc | KeyCode::Char('b') => {
                self.state.back_to_list();
                self.restore_list_cursor();
            }
            KeyCode::Char('f') => self.state.cycle_record_filter(),
            KeyCode::Char('R') => self.retry_selected_batch(),
            KeyCode::Char('e') => self.export_issues(),
            KeyCode::Char('r') => self.refresh_selected_batch(),
            _ => {}
        }
    }

    // ── Controller plumbing ─────────────────────────────────────────

    fn open_selected_batch(&mut self) {
        let target = {
            let visible = self.state.visible_batches();
            visible
                .get(self.state.list_cursor)
                .map(|b| (b.id.clone(), b.raw_id))
        };
        if let Some((id, raw_id)) = target {
            self.state.select_batch(&id);
            self.fetcher.batch_bundle(&id, raw_id);
        }
    }

    fn restore_list_cursor(&mut self) {
        let idx = self.state.last_selected_batch_id.clone().and_then(|last| {
            self.state.visible_batches().iter().position(|b| b.id == last)
        });
        if let Some(idx) = idx {
            self.state.list_cursor = idx;
        }
    }

    fn selected_batch_ids(&self) -> Option<(String, i64)> {
        let id = self.state.selected_batch.clone()?;
        let raw_id = parse_batch_ref(&id).ok()?;
        Some((id, raw_id))
    }

    fn retry_selected_batch(&mut self) {
        if let Some((id, raw_id)) = self.selected_batch_ids() {
            self.fetcher.retry(&id, raw_id);
            self.state.set_status(format!("{id}: retrying…"));
        }
    }

    fn refresh_selected_batch(&mut self) {
        if let Some((id, raw_id)) = self.selected_batch_ids() {
            if self.state.detail.failed().is_some() {
                self.state.detail = Load::Loading;
            }
            if self.state.records.failed().is_some() {
                self.state.records = Load::Loading;
            }
            self.fetcher.batch_bundle_fresh(&id, raw_id);
            self.state.set_status(format!("{id}: refreshing…"));
        }
    }

    fn submit_comment(&mut self, input: &str, resolve: bool) {
        // Empty comments never reach the network.
        let Some(comment) = state::validate_comment(input) else {
            self.state.set_status("a non-empty comment is required");
            return;
        };
        let Some(record_id) = self.state.modal_record().map(|r| r.id) else {
            self.state.set_status("no record selected");
            return;
        };
        if let Some((batch_id, raw_id)) = self.selected_batch_ids() {
            self.fetcher.resolve(record_id, comment, resolve, &batch_id, raw_id);
        }
    }

    fn export_issues(&mut self) {
        let Some(batch_id) = self.state.selected_batch.clone() else { return };
        let message = match self.state.records.ready() {
            None => format!("{batch_id}: records still loading"),
            Some(records) => {
                let issues = export::problematic(records);
                if issues.is_empty() {
                    format!("{batch_id}: no problematic records — nothing to export")
                } else {
                    let path = export::issue_filename(&batch_id);
                    match std::fs::File::create(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|f| export::write_issue_csv(&issues, std::io::BufWriter::new(f)))
                    {
                        Ok(()) => {
                            format!("wrote {} problematic records to {path}", issues.len())
                        }
                        Err(e) => format!("export failed: {e}"),
                    }
                }
            }
        };
        self.state.set_status(message);
    }

    // ── Drawing ─────────────────────────────────────────────────────

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        match self.state.view {
            View::List => self.draw_list(frame, chunks[1]),
            View::Details => self.draw_details(frame, chunks[1]),
        }
        self.draw_status(frame, chunks[2]);

        if self.state.modal_open() {
            self.draw_record_modal(frame, area);
        }
        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let title = match self.state.view {
            View::List => {
                let total = self.state.batches.ready().map(|b| b.len()).unwrap_or(0);
                format!(" reconsole | {} batches ", total)
            }
            View::Details => {
                let id = self.state.selected_batch.as_deref().unwrap_or("-");
                match self.state.detail.ready() {
                    Some(batch) => {
                        let rate = self
                            .state
                            .records
                            .ready()
                            .and_then(|rs| recompute_match_rate(rs))
                            .or(batch.match_rate)
                            .map(|r| format!(" | match {r}%"))
                            .unwrap_or_default();
                        format!(" reconsole | {} [{}]{} ", id, batch.status, rate)
                    }
                    None => format!(" reconsole | {} ", id),
                }
            }
        };
        let para = Paragraph::new(Line::from(Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect) {
        match &self.state.batches {
            Load::Loading => {
                frame.render_widget(center_notice("loading batches…"), area);
                return;
            }
            Load::Failed(e) => {
                frame.render_widget(error_pane("batch list failed to load", e, "r"), area);
                return;
            }
            Load::Ready(_) => {}
        }

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

        // Filter line
        let filter_label = match self.state.batch_status_filter {
            None => "ALL".to_string(),
            Some(s) => s.to_string(),
        };
        let sort_label = match self.state.sort {
            None => "date desc (default)".to_string(),
            Some((field, dir)) => format!(
                "{} {}",
                sort_field_label(field),
                if dir == SortDir::Asc { "asc" } else { "desc" }
            ),
        };
        let search_display = if matches!(self.input, InputMode::Search) {
            format!("/{}\u{2588}", self.state.search)
        } else if self.state.search.is_empty() {
            "(press / to search)".to_string()
        } else {
            format!("/{}", self.state.search)
        };
        let filter_line = format!(
            " search: {}   status: {}   sort: {} ",
            search_display, filter_label, sort_label
        );
        frame.render_widget(
            Paragraph::new(filter_line).style(Style::default().fg(Color::Gray)),
            chunks[0],
        );

        // Header
        let header = format!(
            " {} {} {} {} {} {} {}",
            pad_right("ID", 8),
            pad_right("STATUS", 8),
            pad_right("RECORDS", 7),
            pad_right("MATCH", 6),
            pad_right("BACKOFFICE", 22),
            pad_right("VENDOR", 22),
            "CREATED",
        );
        frame.render_widget(
            Paragraph::new(header).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            chunks[1],
        );

        // Rows
        let visible = self.state.visible_batches();
        let height = chunks[2].height as usize;
        let scroll = scroll_window(self.state.list_cursor, visible.len(), height);

        let mut lines: Vec<Line> = Vec::with_capacity(height);
        for (i, batch) in visible.iter().enumerate().skip(scroll).take(height) {
            lines.push(batch_row(batch, i == self.state.list_cursor));
        }
        if visible.is_empty() {
            lines.push(Line::from(Span::styled(
                " no batches match the current filters",
                Style::default().fg(Color::DarkGray),
            )));
        }
        frame.render_widget(Paragraph::new(lines), chunks[2]);
    }

    fn draw_details(&self, frame: &mut Frame, area: Rect) {
        if let Load::Failed(e) = &self.state.detail {
            frame.render_widget(error_pane("batch failed to load", e, "r"), area);
            return;
        }

        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

        // Info block
        let mut info: Vec<Line> = Vec::new();
        match self.state.detail.ready() {
            Some(batch) => {
                info.push(Line::from(format!(
                    " {}  vs  {}",
                    batch.backoffice_file, batch.vendor_file
                )));
                let mut second = format!(" {} records", batch.record_count);
                if let Some(ref t) = batch.processing_time {
                    second.push_str(&format!("  ·  took {t}"));
                }
                info.push(Line::from(second));
                if let Some(ref reason) = batch.failure_reason {
                    info.push(Line::from(Span::styled(
                        format!(" failed: {reason}  (press R to retry)"),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            None => info.push(Line::from(Span::styled(
                " loading batch…",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        frame.render_widget(Paragraph::new(info), chunks[0]);

        // Badge strip: once records are loaded the breakdown is recomputed
        // from them; until then the server-side counts fill in.
        let badges = match self.state.records.ready() {
            Some(records) => {
                let parts: Vec<String> = status_breakdown(records)
                    .iter()
                    .filter(|row| row.label != "TOTAL")
                    .map(|row| format!("{} {} ({})", row.label, row.count, row.percent))
                    .collect();
                format!(" {}", parts.join(" · "))
            }
            None => match &self.state.status_counts {
                Some(counts) if !counts.is_empty() => {
                    let parts: Vec<String> =
                        counts.iter().map(|(k, v)| format!("{k} {v}")).collect();
                    format!(" {}", parts.join(" · "))
                }
                _ => String::new(),
            },
        };
        frame.render_widget(
            Paragraph::new(badges).style(Style::default().fg(Color::Gray)),
            chunks[1],
        );

        // Derived stats once records are loaded
        let stats_line = match self.state.records.ready() {
            Some(records) => {
                let d = direction_summary(records);
                let filter = match self.state.record_status_filter {
                    None => "ALL".to_string(),
                    Some(s) => s.to_string(),
                };
                format!(
                    " debits {} ({})  ·  credits {} ({})  ·  net {}   filter: {}",
                    d.debit.total, d.debit.count, d.credit.total, d.credit.count, d.net_position, filter
                )
            }
            None => String::new(),
        };
        frame.render_widget(
            Paragraph::new(stats_line).style(Style::default().fg(Color::Gray)),
            chunks[2],
        );

        // Records table
        match &self.state.records {
            Load::Loading => {
                frame.render_widget(center_notice("loading records…"), chunks[3]);
            }
            Load::Failed(e) => {
                frame.render_widget(error_pane("records failed to load", e, "r"), chunks[3]);
            }
            Load::Ready(_) => {
                let visible = self.state.visible_records();
                let height = (chunks[3].height as usize).saturating_sub(1);
                let scroll = scroll_window(self.state.record_cursor, visible.len(), height);

                let header = format!(
                    " {} {} {} {} {} {} {}",
                    pad_right("TXN", 14),
                    pad_right("STATUS", 10),
                    pad_right("AMOUNT", 12),
                    pad_right("DATE", 10),
                    pad_right("DIR", 7),
                    pad_right("CONF", 5),
                    "DESCRIPTION",
                );
                let mut lines = vec![Line::from(Span::styled(
                    header,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))];
                for (i, record) in visible.iter().enumerate().skip(scroll).take(height) {
                    lines.push(record_row(record, i == self.state.record_cursor));
                }
                if visible.is_empty() {
                    lines.push(Line::from(Span::styled(
                        " no records match the current filter",
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                frame.render_widget(Paragraph::new(lines), chunks[3]);
            }
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.input {
            InputMode::Comment { resolve, buffer } => format!(
                " {}: {}\u{2588}  (Enter to submit, Esc to cancel)",
                if *resolve { "resolve comment" } else { "comment" },
                buffer
            ),
            InputMode::Search => " typing search — Enter to keep, Esc to clear ".to_string(),
            InputMode::Normal => match &self.state.status_line {
                Some(msg) => format!(" {msg}"),
                None => match self.state.view {
                    View::List => {
                        " Enter open · / search · f filter · 1-6 sort · r refresh · ? help · q quit "
                            .to_string()
                    }
                    View::Details => {
                        " Enter record · f filter · x resolve · c comment · e export · R retry · b back · ? help "
                            .to_string()
                    }
                },
            },
        };
        let para = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_record_modal(&self, frame: &mut Frame, area: Rect) {
        let Some(record) = self.state.modal_record() else {
            return;
        };

        let mut lines: Vec<Line> = vec![
            Line::from(format!(" transaction  {}", record.transaction_id)),
            Line::from(format!(" description  {}", record.description)),
            Line::from(format!(
                " amount       {}",
                money_fmt::usd_cents(record.amount_cents)
            )),
            Line::from(format!(" date         {}", record.date)),
            Line::from(format!(
                " status       {}   confidence {}",
                record.status,
                match record.confidence {
                    Some(c) => format!("{:.0}%", c * 100.0),
                    None => "N/A".to_string(),
                }
            )),
            Line::from(format!(" direction    {}", record.direction)),
        ];

        if !record.field_flags.is_empty() {
            lines.push(Line::from(format!(
                " flags        {}",
                record.field_flags.join(", ")
            )));
        }
        if !record.ai_reasoning.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " discrepancies",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for phrase in record.ai_reasoning.split("; ") {
                lines.push(Line::from(format!("   - {phrase}")));
            }
        }

        lines.push(Line::from(""));
        match &record.bank_record {
            Some(bank) => {
                lines.push(Line::from(Span::styled(
                    " bank side",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "   {}  {}  {}  {}",
                    bank.id,
                    bank.reference,
                    money_fmt::usd_cents(bank.amount_cents),
                    bank.date,
                )));
            }
            None => lines.push(Line::from(Span::styled(
                " no bank-side record",
                Style::default().fg(Color::Yellow),
            ))),
        }
        lines.push(Line::from(Span::styled(
            " vendor side",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!(
            "   {}  {}  {}  {}",
            record.vendor_record.id,
            record.vendor_record.reference,
            money_fmt::usd_cents(record.vendor_record.amount_cents),
            record.vendor_record.date,
        )));

        if !record.resolution_comments.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " comments",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for comment in &record.resolution_comments {
                lines.push(Line::from(format!("   - {comment}")));
            }
        }

        let title = if record.resolved {
            format!(" {} [resolved] ", record.transaction_id)
        } else {
            format!(" {} ", record.transaction_id)
        };

        let width = 72.min(area.width.saturating_sub(2));
        let height = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
        let popup = centered_rect(area, width, height);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            popup,
        );
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Batch list",
            "  ----------",
            "  arrows / jk       Move cursor",
            "  Enter             Open batch",
            "  /                 Search (id + file names)",
            "  f                 Cycle status filter",
            "  1-6               Sort by column (repeat to flip)",
            "  0                 Default order (newest first)",
            "  r                 Refresh",
            "",
            "  Batch details",
            "  -------------",
            "  Enter             Open record",
            "  f                 Cycle record filter",
            "  x                 Resolve (with comment)",
            "  c                 Comment only",
            "  e                 Export problematic records",
            "  R                 Retry batch",
            "  b / Esc           Back to list",
            "",
            "  q                 Quit",
            "",
        ];

        let width: u16 = 48;
        let height = help_lines.len() as u16;
        let popup = centered_rect(area, width.min(area.width), height.min(area.height));

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

fn run_app(mut app: DashApp, rx: mpsc::Receiver<FetchEvent>) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {e}"))?;

    loop {
        while let Ok(event) = rx.try_recv() {
            app.apply(event);
        }

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {e}"))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("event poll error: {e}"))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {e}"))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Row / widget builders
// ---------------------------------------------------------------------------

fn batch_row(batch: &Batch, selected: bool) -> Line<'static> {
    let rate = batch
        .display_match_rate()
        .map(|r| format!("{r}%"))
        .unwrap_or_else(|| "-".to_string());
    let text = format!(
        " {} {} {} {} {} {} {}",
        pad_right(&batch.id, 8),
        pad_right(&batch.status.to_string(), 8),
        pad_right(&batch.record_count.to_string(), 7),
        pad_right(&rate, 6),
        pad_right(&batch.backoffice_file, 22),
        pad_right(&batch.vendor_file, 22),
        batch.created_at.format("%Y-%m-%d %H:%M"),
    );
    let style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(batch_status_color(batch))
    };
    Line::from(Span::styled(text, style))
}

fn batch_status_color(batch: &Batch) -> Color {
    use reconsole_model::BatchStatus;
    match batch.status {
        BatchStatus::Done => Color::Gray,
        BatchStatus::Running => Color::Cyan,
        BatchStatus::Pending => Color::DarkGray,
        BatchStatus::Failed => Color::Red,
    }
}

fn record_row(record: &TxnRecord, selected: bool) -> Line<'static> {
    let conf = match record.confidence {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "-".to_string(),
    };
    let mut description = record.description.clone();
    if record.resolved {
        description.push_str("  [resolved]");
    }
    let text = format!(
        " {} {} {} {} {} {} {}",
        pad_right(&record.transaction_id, 14),
        pad_right(&record.status.to_string(), 10),
        pad_right(&money_fmt::usd_cents(record.amount_cents), 12),
        pad_right(&record.date.to_string(), 10),
        pad_right(&record.direction, 7),
        pad_right(&conf, 5),
        description,
    );
    let style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(match_status_color(record.status))
    };
    Line::from(Span::styled(text, style))
}

fn match_status_color(status: MatchStatus) -> Color {
    match status {
        MatchStatus::Matched => Color::Green,
        MatchStatus::Partial => Color::Yellow,
        MatchStatus::Unmatched => Color::Red,
        MatchStatus::Duplicate => Color::Magenta,
        MatchStatus::Missing => Color::LightRed,
    }
}

fn sort_field_label(field: SortField) -> &'static str {
    match field {
        SortField::Id => "id",
        SortField::Status => "status",
        SortField::Records => "records",
        SortField::BackofficeFile => "backoffice",
        SortField::VendorFile => "vendor",
        SortField::Created => "date",
    }
}

/// First visible row index so the cursor stays on screen.
fn scroll_window(cursor: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    if cursor + 1 > height {
        (cursor + 1 - height).min(len - height)
    } else {
        0
    }
}

fn center_notice(message: &str) -> Paragraph<'static> {
    Paragraph::new(format!("\n\n  {message}")).style(Style::default().fg(Color::DarkGray))
}

fn error_pane(label: &str, detail: &str, retry_key: &str) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {label}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  {detail}")),
        Line::from(""),
        Line::from(Span::styled(
            format!("  press {retry_key} to retry"),
            Style::default().fg(Color::Gray),
        )),
    ])
    .wrap(Wrap { trim: false })
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect::new(area.x + x, area.y + y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_window_keeps_cursor_visible() {
        assert_eq!(scroll_window(0, 100, 10), 0);
        assert_eq!(scroll_window(9, 100, 10), 0);
        assert_eq!(scroll_window(10, 100, 10), 1);
        assert_eq!(scroll_window(99, 100, 10), 90);
        // Short lists never scroll
        assert_eq!(scroll_window(3, 4, 10), 0);
        assert_eq!(scroll_window(5, 10, 0), 0);
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 80, 24);
        let popup = centered_rect(area, 72, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod details;
pub mod table;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use patio_app::{
    AppCommand, AppEvent, AppState, DateField, DateInputs, DateShortcut, Debouncer, FilterKey,
    FilterOptions, FilterTarget, LONG_TEXT_FIELDS, PAGE_SIZE_OPTIONS, Statistics, StoredColumns,
    Suggestion, Vehicle, VehicleId, VehiclePage, VehicleQuery, mask_date_input,
    schedule_autocomplete,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use time::{Date, OffsetDateTime};

use crate::details::detail_sections;
use crate::table::{pagination_footer, project};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);
const DATE_ERROR_CLEAR_DELAY: Duration = Duration::from_millis(2000);
const CURSOR_MARK: &str = "›";
const ALL_OPTION_LABEL: &str = "(todos)";
const PRIMARY_HINTS: &str =
    "/ busca | f filtros | c colunas | s ordenar | [ ] página | + - por página | ? ajuda | q sair";

/// Backend and persistence seam of the event loop. Secondary lookups
/// degrade to empty values instead of failing.
pub trait AppRuntime {
    fn fetch_vehicles(&mut self, query: &VehicleQuery) -> Result<VehiclePage>;
    fn fetch_vehicle(&mut self, id: VehicleId) -> Result<Vehicle>;
    fn autocomplete(&mut self, query: &str) -> Vec<Suggestion>;
    fn filter_options(&mut self) -> FilterOptions;
    fn statistics(&mut self) -> Option<Statistics>;
    fn save_columns(&mut self, columns: &StoredColumns) -> Result<()>;
    fn save_recent_searches(&mut self, entries: &[String]) -> Result<()>;

    /// Runs the list fetch and reports through `tx`. The default runs it
    /// inline; runtimes backed by a network move it to a worker thread.
    fn spawn_fetch(
        &mut self,
        request_id: u64,
        query: &VehicleQuery,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.fetch_vehicles(query) {
            Ok(page) => FetchEvent::Loaded { request_id, page },
            Err(error) => FetchEvent::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        };
        tx.send(InternalEvent::Fetch(event))
            .map_err(|_| anyhow::anyhow!("fetch event channel closed"))?;
        Ok(())
    }

    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Loaded { request_id: u64, page: VehiclePage },
    Failed { request_id: u64, error: String },
}

impl FetchEvent {
    const fn request_id(&self) -> u64 {
        match self {
            Self::Loaded { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    ClearDateError { token: u64 },
    Fetch(FetchEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Overlay {
    #[default]
    Closed,
    Search,
    Filters,
    Columns,
    Details,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchEntry {
    Suggestion(Suggestion),
    Recent(String),
}

impl SearchEntry {
    fn value(&self) -> &str {
        match self {
            Self::Suggestion(suggestion) => &suggestion.value,
            Self::Recent(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
struct SearchUiState {
    input: String,
    suggestions: Vec<Suggestion>,
    cursor: Option<usize>,
    debouncer: Debouncer<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterRow {
    Select(FilterKey),
    Tipo,
    Date(DateField),
    Shortcut,
}

impl FilterRow {
    const ALL: [Self; 7] = [
        Self::Select(FilterKey::Status),
        Self::Select(FilterKey::Patio),
        Self::Select(FilterKey::Circunscricao),
        Self::Tipo,
        Self::Date(DateField::From),
        Self::Date(DateField::To),
        Self::Shortcut,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FilterUiState {
    row: usize,
    tipo_cursor: usize,
    shortcut_cursor: usize,
    dates: DateInputs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnEntry {
    key: String,
    title: String,
    visible: bool,
    group_index: usize,
    group_len: usize,
}

#[derive(Debug, Clone)]
struct ViewData {
    page: VehiclePage,
    loading: bool,
    latest_request: u64,
    error_banner: Option<String>,
    selected_row: usize,
    selected_col: usize,
    overlay: Overlay,
    search: SearchUiState,
    filters: FilterUiState,
    column_cursor: usize,
    details: Option<Vehicle>,
    details_scroll: u16,
    filter_options: FilterOptions,
    statistics: Option<Statistics>,
    status_token: u64,
    date_error_token: u64,
}

impl ViewData {
    fn new(search_debounce: Duration) -> Self {
        Self {
            page: VehiclePage::default(),
            loading: false,
            latest_request: 0,
            error_banner: None,
            selected_row: 0,
            selected_col: 0,
            overlay: Overlay::Closed,
            search: SearchUiState {
                input: String::new(),
                suggestions: Vec::new(),
                cursor: None,
                debouncer: Debouncer::new(search_debounce),
            },
            filters: FilterUiState::default(),
            column_cursor: 0,
            details: None,
            details_scroll: 0,
            filter_options: FilterOptions::default(),
            statistics: None,
            status_token: 0,
            date_error_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(state.search_settings.debounce);
    let (internal_tx, internal_rx) = mpsc::channel();

    load_reference_data(runtime, &mut view_data);
    dispatch(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        AppCommand::Refresh,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        poll_autocomplete(runtime, &mut view_data, Instant::now());

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let timeout = next_poll_timeout(&view_data, Instant::now());
        let has_event = match event::poll(timeout).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn load_reference_data<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) {
    view_data.filter_options = runtime.filter_options();
    view_data.statistics = runtime.statistics();
}

fn next_poll_timeout(view_data: &ViewData, now: Instant) -> Duration {
    view_data
        .search
        .debouncer
        .deadline()
        .map_or(POLL_INTERVAL, |deadline| {
            deadline.saturating_duration_since(now).min(POLL_INTERVAL)
        })
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::ClearDateError { token } if token == view_data.date_error_token => {
                state.dispatch(AppCommand::ClearDateError);
            }
            InternalEvent::ClearDateError { .. } => {}
            InternalEvent::Fetch(event) => handle_fetch_event(state, view_data, event),
        }
    }
}

/// Only the most recent request may update the table; anything older was
/// superseded by a later filter change.
fn handle_fetch_event(state: &AppState, view_data: &mut ViewData, event: FetchEvent) {
    if event.request_id() != view_data.latest_request {
        tracing::debug!(
            request_id = event.request_id(),
            latest = view_data.latest_request,
            "dropping stale fetch result"
        );
        return;
    }

    view_data.loading = false;
    match event {
        FetchEvent::Loaded { page, .. } => {
            if let Some(error) = &page.error {
                tracing::warn!(%error, "backend reported an error");
                view_data.error_banner = Some(error.clone());
                clear_rows(view_data);
                return;
            }
            tracing::info!(
                rows = page.vehicles.len(),
                total = page.pagination.total,
                page = page.pagination.page,
                "vehicles loaded"
            );
            view_data.error_banner = None;
            view_data.page = page;
            clamp_selection(state, view_data);
        }
        FetchEvent::Failed { error, .. } => {
            tracing::warn!(%error, "vehicle fetch failed");
            view_data.error_banner = Some(error);
            clear_rows(view_data);
        }
    }
}

/// Rows from an earlier query no longer match the active filters once a
/// fetch fails, so they are not shown or selectable under the banner.
fn clear_rows(view_data: &mut ViewData) {
    view_data.page = VehiclePage {
        pagination: view_data.page.pagination,
        ..VehiclePage::default()
    };
    view_data.selected_row = 0;
}

fn start_fetch<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    query: &VehicleQuery,
) {
    view_data.latest_request = view_data.latest_request.saturating_add(1);
    view_data.loading = true;
    let request_id = view_data.latest_request;
    tracing::debug!(request_id, query = %query.to_query_string(), "fetching vehicles");
    if let Err(error) = runtime.spawn_fetch(request_id, query, tx.clone()) {
        view_data.loading = false;
        view_data.error_banner = Some(format!("{error:#}"));
    }
}

fn dispatch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        handle_app_event(state, runtime, view_data, tx, event);
    }
}

fn handle_app_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: AppEvent,
) {
    match event {
        AppEvent::FetchRequested(query) => start_fetch(runtime, view_data, tx, &query),
        AppEvent::BadgesChanged(badges) => {
            tracing::debug!(count = badges.len(), "filter badges changed");
        }
        AppEvent::DateRejected { field, error } => {
            view_data.date_error_token = view_data.date_error_token.saturating_add(1);
            schedule_clear(
                tx,
                DATE_ERROR_CLEAR_DELAY,
                InternalEvent::ClearDateError {
                    token: view_data.date_error_token,
                },
            );
            emit_status(
                state,
                runtime,
                view_data,
                tx,
                format!("data inválida em {}: {error}", field.key().label()),
            );
        }
        AppEvent::DateErrorCleared | AppEvent::StatusCleared => {}
        AppEvent::ColumnsChanged(stored) => {
            clamp_selection(state, view_data);
            if let Err(error) = runtime.save_columns(&stored) {
                tracing::warn!(error = %format!("{error:#}"), "save column layout");
                emit_status(
                    state,
                    runtime,
                    view_data,
                    tx,
                    format!("falha ao salvar colunas: {error}"),
                );
            }
        }
        AppEvent::RecentSearchesChanged(entries) => {
            if let Err(error) = runtime.save_recent_searches(&entries) {
                tracing::warn!(error = %format!("{error:#}"), "save recent searches");
                emit_status(
                    state,
                    runtime,
                    view_data,
                    tx,
                    format!("falha ao salvar buscas recentes: {error}"),
                );
            }
        }
        AppEvent::StatusUpdated(_) => {
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_clear(
                tx,
                STATUS_CLEAR_DELAY,
                InternalEvent::ClearStatus {
                    token: view_data.status_token,
                },
            );
        }
    }
}

fn schedule_clear(internal_tx: &Sender<InternalEvent>, delay: Duration, event: InternalEvent) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(event);
    });
}

fn emit_status<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(
        state,
        runtime,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn poll_autocomplete<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    now: Instant,
) -> bool {
    if view_data.overlay != Overlay::Search {
        view_data.search.debouncer.cancel();
        return false;
    }
    let Some(query) = view_data.search.debouncer.poll(now) else {
        return false;
    };
    view_data.search.suggestions = runtime.autocomplete(&query);
    view_data.search.cursor = None;
    true
}

fn clamp_selection(state: &AppState, view_data: &mut ViewData) {
    let rows = view_data.page.vehicles.len();
    let columns = state.columns.visible_keys().len();
    view_data.selected_row = view_data.selected_row.min(rows.saturating_sub(1));
    view_data.selected_col = view_data.selected_col.min(columns.saturating_sub(1));
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return true;
    }

    match view_data.overlay {
        Overlay::Closed => return handle_main_key(state, runtime, view_data, internal_tx, key),
        Overlay::Search => {
            handle_search_key(state, runtime, view_data, internal_tx, key, Instant::now());
        }
        Overlay::Filters => handle_filters_key(state, runtime, view_data, internal_tx, key),
        Overlay::Columns => handle_columns_key(state, runtime, view_data, internal_tx, key),
        Overlay::Details => handle_details_key(view_data, key),
        Overlay::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                view_data.overlay = Overlay::Closed;
            }
        }
    }
    false
}

fn handle_main_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let rows = view_data.page.vehicles.len();
    let columns = state.columns.visible_keys().len();
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.selected_row = step_index(view_data.selected_row, 1, rows);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.selected_row = step_index(view_data.selected_row, -1, rows);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.selected_col = step_index(view_data.selected_col, 1, columns);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.selected_col = step_index(view_data.selected_col, -1, columns);
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.selected_row = 0,
        KeyCode::Char('G') | KeyCode::End => view_data.selected_row = rows.saturating_sub(1),
        KeyCode::Char('s') => {
            let column = state
                .columns
                .visible_keys()
                .get(view_data.selected_col)
                .map(|key| (*key).to_owned());
            if let Some(column) = column {
                dispatch(state, runtime, view_data, tx, AppCommand::SortBy(column));
            }
        }
        KeyCode::Char(']') | KeyCode::PageDown => {
            if view_data.page.pagination.has_next {
                let next = state.filters.page().saturating_add(1);
                dispatch(state, runtime, view_data, tx, AppCommand::ChangePage(next));
            }
        }
        KeyCode::Char('[') | KeyCode::PageUp => {
            if view_data.page.pagination.has_prev {
                let prev = state.filters.page().saturating_sub(1);
                dispatch(state, runtime, view_data, tx, AppCommand::ChangePage(prev));
            }
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            if let Some(per_page) = step_per_page(state.filters.per_page(), 1) {
                dispatch(state, runtime, view_data, tx, AppCommand::ChangePerPage(per_page));
            }
        }
        KeyCode::Char('-') => {
            if let Some(per_page) = step_per_page(state.filters.per_page(), -1) {
                dispatch(state, runtime, view_data, tx, AppCommand::ChangePerPage(per_page));
            }
        }
        KeyCode::Enter => open_details(state, runtime, view_data, tx),
        KeyCode::Char('/') => open_search(state, view_data),
        KeyCode::Char('f') => open_filters(state, view_data),
        KeyCode::Char('c') => {
            view_data.column_cursor = 0;
            view_data.overlay = Overlay::Columns;
        }
        KeyCode::Char('?') => view_data.overlay = Overlay::Help,
        KeyCode::Char('x') => dispatch(state, runtime, view_data, tx, AppCommand::ClearFilters),
        KeyCode::Char('r') => dispatch(state, runtime, view_data, tx, AppCommand::Refresh),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            let target = state.filters.badges().get(index).map(|badge| badge.target);
            if let Some(target) = target {
                dispatch(state, runtime, view_data, tx, AppCommand::RemoveBadge(target));
            }
        }
        KeyCode::Esc => view_data.error_banner = None,
        _ => {}
    }
    false
}

fn step_index(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn step_per_page(current: u32, delta: isize) -> Option<u32> {
    let index = PAGE_SIZE_OPTIONS.iter().position(|size| *size == current)?;
    let next = index.checked_add_signed(delta)?;
    PAGE_SIZE_OPTIONS.get(next).copied()
}

fn open_details<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(id) = view_data
        .page
        .vehicles
        .get(view_data.selected_row)
        .map(|vehicle| vehicle.id)
    else {
        return;
    };
    match runtime.fetch_vehicle(id) {
        Ok(vehicle) => {
            view_data.details = Some(vehicle);
            view_data.details_scroll = 0;
            view_data.overlay = Overlay::Details;
        }
        Err(error) => {
            tracing::warn!(%id, error = %format!("{error:#}"), "load vehicle details");
            emit_status(
                state,
                runtime,
                view_data,
                tx,
                format!("falha ao carregar veículo {id}: {error}"),
            );
        }
    }
}

fn handle_details_key(view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
            view_data.overlay = Overlay::Closed;
            view_data.details = None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.details_scroll = view_data.details_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.details_scroll = view_data.details_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn open_search(state: &AppState, view_data: &mut ViewData) {
    view_data.overlay = Overlay::Search;
    view_data.search.input = state.filters.search().to_owned();
    view_data.search.suggestions.clear();
    view_data.search.cursor = None;
    view_data.search.debouncer.cancel();
}

fn close_search(view_data: &mut ViewData) {
    view_data.overlay = Overlay::Closed;
    view_data.search.suggestions.clear();
    view_data.search.cursor = None;
    view_data.search.debouncer.cancel();
}

/// Suggestions while the backend has some for the current input, otherwise
/// the recent searches.
fn search_entries(state: &AppState, view_data: &ViewData) -> Vec<SearchEntry> {
    if view_data.search.suggestions.is_empty() {
        state
            .recent_searches
            .entries()
            .iter()
            .cloned()
            .map(SearchEntry::Recent)
            .collect()
    } else {
        view_data
            .search
            .suggestions
            .iter()
            .cloned()
            .map(SearchEntry::Suggestion)
            .collect()
    }
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) {
    let entries = search_entries(state, view_data);
    match key.code {
        KeyCode::Esc => close_search(view_data),
        KeyCode::Enter => {
            let value = view_data
                .search
                .cursor
                .and_then(|index| entries.get(index))
                .map_or_else(
                    || view_data.search.input.trim().to_owned(),
                    |entry| entry.value().to_owned(),
                );
            close_search(view_data);
            let command = if value.is_empty() {
                AppCommand::ClearSearch
            } else {
                AppCommand::SubmitSearch(value)
            };
            dispatch(state, runtime, view_data, tx, command);
        }
        KeyCode::Down | KeyCode::Tab => {
            if !entries.is_empty() {
                let next = view_data
                    .search
                    .cursor
                    .map_or(0, |index| step_index(index, 1, entries.len()));
                view_data.search.cursor = Some(next);
            }
        }
        KeyCode::Up | KeyCode::BackTab => {
            view_data.search.cursor = match view_data.search.cursor {
                Some(0) | None => None,
                Some(index) => Some(index - 1),
            };
        }
        KeyCode::Delete => {
            let recent = view_data
                .search
                .cursor
                .and_then(|index| entries.get(index))
                .and_then(|entry| match entry {
                    SearchEntry::Recent(value) => Some(value.clone()),
                    SearchEntry::Suggestion(_) => None,
                });
            if let Some(value) = recent {
                dispatch(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::RemoveRecentSearch(value),
                );
                let remaining = search_entries(state, view_data).len();
                view_data.search.cursor = view_data
                    .search
                    .cursor
                    .filter(|_| remaining > 0)
                    .map(|index| index.min(remaining - 1));
            }
        }
        KeyCode::Backspace => {
            view_data.search.input.pop();
            search_input_changed(state, view_data, now);
        }
        KeyCode::Char(ch) => {
            view_data.search.input.push(ch);
            search_input_changed(state, view_data, now);
        }
        _ => {}
    }
}

fn search_input_changed(state: &AppState, view_data: &mut ViewData, now: Instant) {
    view_data.search.cursor = None;
    let scheduled = schedule_autocomplete(
        &mut view_data.search.debouncer,
        &state.search_settings,
        &view_data.search.input,
        now,
    );
    if !scheduled {
        view_data.search.suggestions.clear();
    }
}

fn open_filters(state: &AppState, view_data: &mut ViewData) {
    view_data.overlay = Overlay::Filters;
    view_data.filters.dates = state.filters.date_inputs().clone();
}

fn sync_date_buffers(state: &AppState, view_data: &mut ViewData) {
    view_data.filters.dates = state.filters.date_inputs().clone();
}

fn date_buffer_mut(inputs: &mut DateInputs, field: DateField) -> &mut String {
    match field {
        DateField::From => &mut inputs.from,
        DateField::To => &mut inputs.to,
    }
}

fn options_for(options: &FilterOptions, key: FilterKey) -> &[String] {
    match key {
        FilterKey::Status => &options.status,
        FilterKey::Patio => &options.patio,
        FilterKey::Circunscricao => &options.circunscricao,
        FilterKey::Tipo => &options.tipo,
        FilterKey::DateFrom | FilterKey::DateTo => &[],
    }
}

/// Cycles a select through `(todos)` followed by the backend's options.
fn cycle_select_value(
    options: &[String],
    current: Option<&str>,
    delta: isize,
) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let slots = options.len() + 1;
    let position = current
        .and_then(|value| options.iter().position(|option| option == value))
        .map_or(0, |index| index + 1);
    let next = (position as isize + delta).rem_euclid(slots as isize) as usize;
    Some(if next == 0 {
        String::new()
    } else {
        options[next - 1].clone()
    })
}

fn handle_filters_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let row = FilterRow::ALL[view_data.filters.row.min(FilterRow::ALL.len() - 1)];

    if let FilterRow::Date(field) = row {
        match key.code {
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                let buffer = date_buffer_mut(&mut view_data.filters.dates, field);
                buffer.push(ch);
                let masked = mask_date_input(buffer);
                *buffer = masked;
                return;
            }
            KeyCode::Backspace => {
                let buffer = date_buffer_mut(&mut view_data.filters.dates, field);
                buffer.pop();
                if buffer.ends_with('/') {
                    buffer.pop();
                }
                return;
            }
            KeyCode::Enter => {
                let text = view_data.filters.dates.get(field).to_owned();
                dispatch(state, runtime, view_data, tx, AppCommand::EditDate(field, text));
                sync_date_buffers(state, view_data);
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('f') => view_data.overlay = Overlay::Closed,
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.filters.row = step_index(view_data.filters.row, -1, FilterRow::ALL.len());
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.filters.row = step_index(view_data.filters.row, 1, FilterRow::ALL.len());
        }
        KeyCode::Left | KeyCode::Char('h') => {
            cycle_filter_row(state, runtime, view_data, tx, row, -1);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            cycle_filter_row(state, runtime, view_data, tx, row, 1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => match row {
            FilterRow::Tipo => {
                let value = view_data
                    .filter_options
                    .tipo
                    .get(view_data.filters.tipo_cursor)
                    .cloned();
                if let Some(value) = value {
                    dispatch(state, runtime, view_data, tx, AppCommand::ToggleType(value));
                }
            }
            FilterRow::Shortcut => {
                let shortcut = DateShortcut::ALL
                    [view_data.filters.shortcut_cursor.min(DateShortcut::ALL.len() - 1)];
                let today = runtime.today();
                dispatch(
                    state,
                    runtime,
                    view_data,
                    tx,
                    AppCommand::ApplyShortcut(shortcut, today),
                );
                sync_date_buffers(state, view_data);
            }
            FilterRow::Select(_) | FilterRow::Date(_) => {}
        },
        KeyCode::Delete | KeyCode::Backspace => {
            let target = match row {
                FilterRow::Select(key) => FilterTarget::Key(key),
                FilterRow::Tipo => FilterTarget::Key(FilterKey::Tipo),
                FilterRow::Date(field) => FilterTarget::Key(field.key()),
                FilterRow::Shortcut => FilterTarget::DateShortcut,
            };
            dispatch(state, runtime, view_data, tx, AppCommand::RemoveFilter(target));
            sync_date_buffers(state, view_data);
        }
        KeyCode::Char('x') => {
            dispatch(state, runtime, view_data, tx, AppCommand::ClearFilters);
            sync_date_buffers(state, view_data);
        }
        _ => {}
    }
}

fn cycle_filter_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    row: FilterRow,
    delta: isize,
) {
    match row {
        FilterRow::Select(key) => {
            let value = cycle_select_value(
                options_for(&view_data.filter_options, key),
                state.filters.criteria().text(key),
                delta,
            );
            if let Some(value) = value {
                dispatch(state, runtime, view_data, tx, AppCommand::SetFilter(key, value));
            }
        }
        FilterRow::Tipo => {
            view_data.filters.tipo_cursor = step_index(
                view_data.filters.tipo_cursor,
                delta,
                view_data.filter_options.tipo.len(),
            );
        }
        FilterRow::Shortcut => {
            view_data.filters.shortcut_cursor = step_index(
                view_data.filters.shortcut_cursor,
                delta,
                DateShortcut::ALL.len(),
            );
        }
        FilterRow::Date(_) => {}
    }
}

/// Visible group first, then hidden, each in layout order.
fn column_entries(state: &AppState) -> Vec<ColumnEntry> {
    let visible = state.columns.visible_columns();
    let hidden = state.columns.hidden_columns();
    let mut entries = Vec::with_capacity(visible.len() + hidden.len());
    for (group, is_visible) in [(visible, true), (hidden, false)] {
        let group_len = group.len();
        entries.extend(
            group
                .into_iter()
                .enumerate()
                .map(|(group_index, column)| ColumnEntry {
                    key: column.key.clone(),
                    title: column.title.clone(),
                    visible: is_visible,
                    group_index,
                    group_len,
                }),
        );
    }
    entries
}

fn handle_columns_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let entries = column_entries(state);
    let Some(entry) = entries
        .get(view_data.column_cursor.min(entries.len().saturating_sub(1)))
        .cloned()
    else {
        return;
    };

    let command = match key.code {
        KeyCode::Esc | KeyCode::Char('c') => {
            view_data.overlay = Overlay::Closed;
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_data.column_cursor = step_index(view_data.column_cursor, -1, entries.len());
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view_data.column_cursor = step_index(view_data.column_cursor, 1, entries.len());
            None
        }
        KeyCode::Char(' ') | KeyCode::Enter => Some(AppCommand::ToggleColumn(entry.key.clone())),
        KeyCode::Char('K') if entry.group_index > 0 => Some(AppCommand::ReorderColumn {
            key: entry.key.clone(),
            target_index: entry.group_index - 1,
            visible: entry.visible,
        }),
        KeyCode::Char('J') if entry.group_index + 1 < entry.group_len => {
            Some(AppCommand::ReorderColumn {
                key: entry.key.clone(),
                target_index: entry.group_index + 1,
                visible: entry.visible,
            })
        }
        KeyCode::Char('a') => Some(AppCommand::ToggleAllColumns(true)),
        KeyCode::Char('n') => Some(AppCommand::ToggleAllColumns(false)),
        KeyCode::Char('R') => Some(AppCommand::ResetColumns),
        _ => None,
    };

    if let Some(command) = command {
        dispatch(state, runtime, view_data, tx, command);
        view_data.column_cursor = column_entries(state)
            .iter()
            .position(|candidate| candidate.key == entry.key)
            .unwrap_or(0);
    }
}

fn status_color(status_class: &str) -> Color {
    match status_class {
        "apreendido" => Color::Yellow,
        "liberado" | "restituido" => Color::Green,
        "em_pericia" | "pericia" => Color::Magenta,
        "aguardando_leilao" | "leiloado" => Color::LightBlue,
        _ => Color::White,
    }
}

fn column_width(key: &str) -> Constraint {
    if LONG_TEXT_FIELDS.contains(&key) {
        Constraint::Min(24)
    } else {
        Constraint::Min(8)
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state, view_data))
        .block(Block::default().title("patio").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    render_table(frame, layout[1], state, view_data);

    let footer = Paragraph::new(pagination_footer(
        &view_data.page.pagination,
        state.filters.per_page(),
    ))
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, layout[2]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[3]);

    let overlay = match view_data.overlay {
        Overlay::Closed => None,
        Overlay::Search => Some((
            "busca",
            (60, 50),
            render_search_overlay_text(state, view_data),
        )),
        Overlay::Filters => Some((
            "filtros",
            (70, 60),
            render_filters_overlay_text(state, view_data),
        )),
        Overlay::Columns => Some((
            "colunas",
            (50, 80),
            render_columns_overlay_text(state, view_data),
        )),
        Overlay::Details => view_data
            .details
            .as_ref()
            .map(|vehicle| ("detalhes", (80, 85), render_details_overlay_text(vehicle))),
        Overlay::Help => Some(("ajuda", (80, 60), help_overlay_text().to_owned())),
    };

    if let Some((title, (percent_x, percent_y), text)) = overlay {
        let area = centered_rect(percent_x, percent_y, frame.area());
        frame.render_widget(Clear, area);
        let scroll = if view_data.overlay == Overlay::Details {
            view_data.details_scroll
        } else {
            0
        };
        let widget = Paragraph::new(text).scroll((scroll, 0)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(widget, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let area = match &view_data.error_banner {
        Some(error) => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)])
                .split(area);
            let banner = Paragraph::new(format!("erro ao carregar veículos: {error}")).style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            );
            frame.render_widget(banner, parts[0]);
            parts[1]
        }
        None => area,
    };

    let block = Block::default()
        .title(table_title(view_data))
        .borders(Borders::ALL);

    if view_data.page.vehicles.is_empty() {
        let message = if view_data.loading || view_data.error_banner.is_some() {
            ""
        } else {
            "Nenhum veículo encontrado"
        };
        frame.render_widget(Paragraph::new(message).block(block), area);
        return;
    }

    let columns = state.columns.visible_columns();
    let projection = project(&columns, &view_data.page.vehicles, state.filters.sort());
    let widths = columns
        .iter()
        .map(|column| column_width(&column.key))
        .collect::<Vec<_>>();
    let status_index = projection
        .headers
        .iter()
        .position(|header| header.key == "status");

    let header = Row::new(projection.headers.iter().map(|header| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if header.sorted.is_some() {
            style = style.fg(Color::Cyan);
        }
        Cell::from(header.label.clone()).style(style)
    }));

    let rows = projection.rows.iter().enumerate().map(|(row_index, row)| {
        let selected_row = row_index == view_data.selected_row;
        let cells = row
            .cells
            .iter()
            .enumerate()
            .map(|(column_index, text)| {
                let mut style = Style::default();
                if Some(column_index) == status_index {
                    style = style.fg(status_color(&row.status_class));
                }
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == view_data.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(text.clone()).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn table_title(view_data: &ViewData) -> String {
    if view_data.loading {
        "veículos (carregando...)".to_owned()
    } else {
        "veículos".to_owned()
    }
}

fn header_text(state: &AppState, view_data: &ViewData) -> String {
    let badges = state.filters.badges();
    let filters = if badges.is_empty() {
        "sem filtros ativos".to_owned()
    } else {
        badges
            .iter()
            .enumerate()
            .map(|(index, badge)| format!("[{}] {}", index + 1, badge.label))
            .collect::<Vec<_>>()
            .join("  ")
    };
    match &view_data.statistics {
        Some(statistics) => format!(
            "{filters} | total: {} | recentes: {}",
            statistics.total_vehicles, statistics.recent_vehicles
        ),
        None => filters,
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(message) = &state.status_line {
        return message.clone();
    }
    match view_data.overlay {
        Overlay::Closed => PRIMARY_HINTS.to_owned(),
        _ => "esc fechar".to_owned(),
    }
}

fn render_search_overlay_text(state: &AppState, view_data: &ViewData) -> String {
    let search = &view_data.search;
    let mut lines = vec![format!("> {}_", search.input)];

    let trimmed = search.input.trim();
    if !trimmed.is_empty() && !state.search_settings.accepts(trimmed) {
        lines.push(format!(
            "digite ao menos {} caracteres para sugestões",
            state.search_settings.min_query_length
        ));
    }

    let entries = search_entries(state, view_data);
    if !entries.is_empty() {
        lines.push(String::new());
        lines.push(if search.suggestions.is_empty() {
            "buscas recentes:".to_owned()
        } else {
            "sugestões:".to_owned()
        });
        for (index, entry) in entries.iter().enumerate() {
            let marker = if search.cursor == Some(index) {
                CURSOR_MARK
            } else {
                " "
            };
            let line = match entry {
                SearchEntry::Suggestion(suggestion) if !suggestion.kind.is_empty() => {
                    format!("{marker} {} ({})", suggestion.value, suggestion.kind)
                }
                other => format!("{marker} {}", other.value()),
            };
            lines.push(line);
        }
    }

    lines.push(String::new());
    lines.push("enter buscar | up/down escolher | del remover recente | esc fechar".to_owned());
    lines.join("\n")
}

fn render_filters_overlay_text(state: &AppState, view_data: &ViewData) -> String {
    let criteria = state.filters.criteria();
    let mut lines = Vec::with_capacity(FilterRow::ALL.len() + 2);
    for (index, row) in FilterRow::ALL.iter().enumerate() {
        let marker = if index == view_data.filters.row {
            CURSOR_MARK
        } else {
            " "
        };
        let body = match row {
            FilterRow::Select(key) => format!(
                "{}: ‹ {} ›",
                key.label(),
                criteria.text(*key).unwrap_or(ALL_OPTION_LABEL)
            ),
            FilterRow::Tipo => {
                let options = view_data
                    .filter_options
                    .tipo
                    .iter()
                    .enumerate()
                    .map(|(option_index, option)| {
                        let check = if criteria.tipo.contains(option) {
                            "[x]"
                        } else {
                            "[ ]"
                        };
                        let focus = if index == view_data.filters.row
                            && option_index == view_data.filters.tipo_cursor
                        {
                            CURSOR_MARK
                        } else {
                            ""
                        };
                        format!("{focus}{check} {option}")
                    })
                    .collect::<Vec<_>>()
                    .join("  ");
                format!("{}: {options}", FilterKey::Tipo.label())
            }
            FilterRow::Date(field) => {
                let mut text = format!(
                    "{}: {}",
                    field.key().label(),
                    view_data.filters.dates.get(*field)
                );
                if state.filters.date_error() == Some(*field) {
                    text.push_str("  (data inválida)");
                }
                text
            }
            FilterRow::Shortcut => {
                let shortcut = DateShortcut::ALL
                    [view_data.filters.shortcut_cursor.min(DateShortcut::ALL.len() - 1)];
                let active = if state.filters.shortcut() == Some(shortcut) {
                    " (ativo)"
                } else {
                    ""
                };
                format!("Período: ‹ {} ›{active}", shortcut.label())
            }
        };
        lines.push(format!("{marker} {body}"));
    }
    lines.push(String::new());
    lines.push(
        "up/down campo | left/right valor | espaço marcar | enter aplicar | del remover | x limpar | esc fechar"
            .to_owned(),
    );
    lines.join("\n")
}

fn render_columns_overlay_text(state: &AppState, view_data: &ViewData) -> String {
    let entries = column_entries(state);
    let mut lines = Vec::with_capacity(entries.len() + 4);
    let mut current_group = None;
    for (index, entry) in entries.iter().enumerate() {
        if current_group != Some(entry.visible) {
            current_group = Some(entry.visible);
            lines.push(if entry.visible {
                "visíveis:".to_owned()
            } else {
                "ocultas:".to_owned()
            });
        }
        let marker = if index == view_data.column_cursor {
            CURSOR_MARK
        } else {
            " "
        };
        let check = if entry.visible { "[x]" } else { "[ ]" };
        lines.push(format!("{marker} {check} {}", entry.title));
    }
    lines.push(String::new());
    lines.push(
        "espaço mostrar/ocultar | J/K mover | a todas | n nenhuma | R restaurar | esc fechar"
            .to_owned(),
    );
    lines.join("\n")
}

fn render_details_overlay_text(vehicle: &Vehicle) -> String {
    let mut lines = vec![format!("veículo {}", vehicle.id)];
    for section in detail_sections(vehicle) {
        lines.push(String::new());
        lines.push(section.title.to_owned());
        for field in section.fields {
            lines.push(format!("  {}: {}", field.label, field.value));
        }
    }
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q/ctrl+c sair\n\
tabela: j/k/h/l mover | g/G início/fim | enter detalhes | s ordenar pela coluna\n\
páginas: [ ] ou pgup/pgdn anterior/próxima | + - por página\n\
filtros: / busca | f filtros | 1-9 remover filtro | x limpar filtros | r recarregar\n\
colunas: c gerenciar | espaço mostrar/ocultar | J/K mover | a/n todas/nenhuma | R restaurar\n\
busca: digite | up/down sugestões | enter buscar | del remover recente | esc fechar\n\
datas: dd/mm/aaaa e enter aplica | left/right período | enter aplica período"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

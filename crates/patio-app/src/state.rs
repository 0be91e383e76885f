// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::columns::{ColumnLayout, StoredColumns};
use crate::dates::DateError;
use crate::filters::{
    Badge, BadgeTarget, DateField, DateShortcut, FilterEvent, FilterKey, FilterState,
    FilterTarget,
};
use crate::query::VehicleQuery;
use crate::search::{RecentSearches, SearchSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub filters: FilterState,
    pub columns: ColumnLayout,
    pub recent_searches: RecentSearches,
    pub search_settings: SearchSettings,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        let search_settings = SearchSettings::default();
        Self {
            filters: FilterState::default(),
            columns: ColumnLayout::default(),
            recent_searches: RecentSearches::new(search_settings.max_recent),
            search_settings,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SetFilter(FilterKey, String),
    SetTypeFilter(Vec<String>),
    ToggleType(String),
    SetDateRange(Option<Date>, Option<Date>),
    EditDate(DateField, String),
    ApplyShortcut(DateShortcut, Date),
    ClearDateError,
    ClearFilters,
    RemoveFilter(FilterTarget),
    RemoveBadge(BadgeTarget),
    SubmitSearch(String),
    ClearSearch,
    RemoveRecentSearch(String),
    SortBy(String),
    ChangePage(u32),
    ChangePerPage(u32),
    ToggleColumn(String),
    ReorderColumn {
        key: String,
        target_index: usize,
        visible: bool,
    },
    ToggleAllColumns(bool),
    ResetColumns,
    Refresh,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FetchRequested(VehicleQuery),
    BadgesChanged(Vec<Badge>),
    DateRejected { field: DateField, error: DateError },
    DateErrorCleared,
    ColumnsChanged(StoredColumns),
    RecentSearchesChanged(Vec<String>),
    StatusUpdated(String),
    StatusCleared,
}

impl From<FilterEvent> for AppEvent {
    fn from(event: FilterEvent) -> Self {
        match event {
            FilterEvent::FetchRequested(query) => Self::FetchRequested(query),
            FilterEvent::BadgesChanged(badges) => Self::BadgesChanged(badges),
            FilterEvent::DateRejected { field, error } => Self::DateRejected { field, error },
        }
    }
}

impl AppState {
    pub fn new(
        filters: FilterState,
        columns: ColumnLayout,
        recent_searches: RecentSearches,
        search_settings: SearchSettings,
    ) -> Self {
        Self {
            filters,
            columns,
            recent_searches,
            search_settings,
            status_line: None,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SetFilter(key, value) => lift(self.filters.set_filter(key, &value)),
            AppCommand::SetTypeFilter(values) => lift(self.filters.set_type_filter(values)),
            AppCommand::ToggleType(value) => lift(self.filters.toggle_type(&value)),
            AppCommand::SetDateRange(from, to) => lift(self.filters.set_date_range(from, to)),
            AppCommand::EditDate(field, text) => lift(self.filters.edit_date(field, &text)),
            AppCommand::ApplyShortcut(shortcut, today) => {
                lift(self.filters.apply_shortcut(shortcut, today))
            }
            AppCommand::ClearDateError => {
                if self.filters.clear_date_error() {
                    vec![AppEvent::DateErrorCleared]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ClearFilters => lift(self.filters.clear_all()),
            AppCommand::RemoveFilter(target) => lift(self.filters.remove_filter(target)),
            AppCommand::RemoveBadge(target) => lift(self.filters.remove_badge(target)),
            AppCommand::SubmitSearch(query) => self.submit_search(&query),
            AppCommand::ClearSearch => lift(self.filters.clear_search()),
            AppCommand::RemoveRecentSearch(query) => self.remove_recent_search(&query),
            AppCommand::SortBy(column) => {
                if self.columns.catalog().contains(&column) {
                    lift(self.filters.sort_by(&column))
                } else {
                    vec![self.set_status(&format!("unknown column `{column}`"))]
                }
            }
            AppCommand::ChangePage(page) => lift(self.filters.change_page(page)),
            AppCommand::ChangePerPage(per_page) => match self.filters.change_per_page(per_page) {
                Ok(events) => lift(events),
                Err(error) => vec![self.set_status(&error.to_string())],
            },
            AppCommand::ToggleColumn(key) => match self.columns.toggle(&key) {
                Ok(_) => self.columns_changed(),
                Err(error) => vec![self.set_status(&error.to_string())],
            },
            AppCommand::ReorderColumn {
                key,
                target_index,
                visible,
            } => match self.columns.reorder(&key, target_index, visible) {
                Ok(()) => self.columns_changed(),
                Err(error) => vec![self.set_status(&error.to_string())],
            },
            AppCommand::ToggleAllColumns(show) => {
                self.columns.set_all_visible(show);
                self.columns_changed()
            }
            AppCommand::ResetColumns => {
                self.columns.reset_to_default();
                let mut events = self.columns_changed();
                events.push(self.set_status("colunas restauradas"));
                events
            }
            AppCommand::Refresh => lift(self.filters.refresh()),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn submit_search(&mut self, query: &str) -> Vec<AppEvent> {
        let mut events = lift(self.filters.submit_search(query));
        if self.recent_searches.record(query) {
            events.push(AppEvent::RecentSearchesChanged(self.recent_searches.to_vec()));
        }
        events
    }

    fn remove_recent_search(&mut self, query: &str) -> Vec<AppEvent> {
        if !self.recent_searches.remove(query) {
            return Vec::new();
        }
        let mut events = vec![AppEvent::RecentSearchesChanged(
            self.recent_searches.to_vec(),
        )];
        if self.filters.search() == query {
            events.extend(lift(self.filters.clear_search()));
        }
        events
    }

    fn columns_changed(&self) -> Vec<AppEvent> {
        tracing::debug!(visible = ?self.columns.visible_keys(), "column layout changed");
        vec![AppEvent::ColumnsChanged(self.columns.stored())]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

fn lift(events: Vec<FilterEvent>) -> Vec<AppEvent> {
    events.into_iter().map(AppEvent::from).collect()
}

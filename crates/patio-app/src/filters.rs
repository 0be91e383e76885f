// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, Duration};

use crate::dates::{DateError, format_brazilian_date, parse_brazilian_date, parse_iso_date};
use crate::model::{DEFAULT_PER_PAGE, PAGE_SIZE_OPTIONS, SortSpec, is_allowed_page_size};
use crate::query::VehicleQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Status,
    Patio,
    Circunscricao,
    Tipo,
    DateFrom,
    DateTo,
}

impl FilterKey {
    pub const ALL: [Self; 6] = [
        Self::Status,
        Self::Patio,
        Self::Circunscricao,
        Self::Tipo,
        Self::DateFrom,
        Self::DateTo,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Patio => "patio",
            Self::Circunscricao => "circunscricao",
            Self::Tipo => "tipo",
            Self::DateFrom => "date_from",
            Self::DateTo => "date_to",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Patio => "Pátio",
            Self::Circunscricao => "Circunscrição",
            Self::Tipo => "Tipo",
            Self::DateFrom => "De",
            Self::DateTo => "Até",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub const fn is_date(self) -> bool {
        matches!(self, Self::DateFrom | Self::DateTo)
    }
}

/// Anything a badge or a remove request can point at: a real filter key or
/// the `date_shortcut` pseudo-key covering both date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTarget {
    Key(FilterKey),
    DateShortcut,
}

impl FilterTarget {
    pub fn parse(value: &str) -> Option<Self> {
        if value == "date_shortcut" {
            return Some(Self::DateShortcut);
        }
        FilterKey::parse(value).map(Self::Key)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Key(key) => key.as_str(),
            Self::DateShortcut => "date_shortcut",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateShortcut {
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl DateShortcut {
    pub const ALL: [Self; 4] = [
        Self::Today,
        Self::Last7Days,
        Self::Last30Days,
        Self::Last90Days,
    ];

    pub const fn days(self) -> i64 {
        match self {
            Self::Today => 0,
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::Last90Days => 90,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Hoje",
            Self::Last7Days => "Últimos 7 dias",
            Self::Last30Days => "Últimos 30 dias",
            Self::Last90Days => "Últimos 90 dias",
        }
    }

    pub fn range(self, today: Date) -> (Date, Date) {
        let from = today
            .checked_sub(Duration::days(self.days()))
            .unwrap_or(Date::MIN);
        (from, today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    From,
    To,
}

impl DateField {
    pub const fn key(self) -> FilterKey {
        match self {
            Self::From => FilterKey::DateFrom,
            Self::To => FilterKey::DateTo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub status: Option<String>,
    pub patio: Option<String>,
    pub circunscricao: Option<String>,
    pub tipo: BTreeSet<String>,
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        FilterKey::ALL.into_iter().all(|key| !self.has(key))
    }

    pub fn has(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Status => self.status.is_some(),
            FilterKey::Patio => self.patio.is_some(),
            FilterKey::Circunscricao => self.circunscricao.is_some(),
            FilterKey::Tipo => !self.tipo.is_empty(),
            FilterKey::DateFrom => self.date_from.is_some(),
            FilterKey::DateTo => self.date_to.is_some(),
        }
    }

    pub fn text(&self, key: FilterKey) -> Option<&str> {
        match key {
            FilterKey::Status => self.status.as_deref(),
            FilterKey::Patio => self.patio.as_deref(),
            FilterKey::Circunscricao => self.circunscricao.as_deref(),
            FilterKey::Tipo | FilterKey::DateFrom | FilterKey::DateTo => None,
        }
    }

    pub fn date(&self, field: DateField) -> Option<Date> {
        match field {
            DateField::From => self.date_from,
            DateField::To => self.date_to,
        }
    }

    fn text_slot(&mut self, key: FilterKey) -> Option<&mut Option<String>> {
        match key {
            FilterKey::Status => Some(&mut self.status),
            FilterKey::Patio => Some(&mut self.patio),
            FilterKey::Circunscricao => Some(&mut self.circunscricao),
            FilterKey::Tipo | FilterKey::DateFrom | FilterKey::DateTo => None,
        }
    }

    fn date_slot(&mut self, field: DateField) -> &mut Option<Date> {
        match field {
            DateField::From => &mut self.date_from,
            DateField::To => &mut self.date_to,
        }
    }

    fn clear(&mut self, key: FilterKey) {
        match key {
            FilterKey::Tipo => self.tipo.clear(),
            FilterKey::DateFrom => self.date_from = None,
            FilterKey::DateTo => self.date_to = None,
            other => {
                if let Some(slot) = self.text_slot(other) {
                    *slot = None;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeTarget {
    Search,
    Filter(FilterTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub target: BadgeTarget,
    pub label: String,
}

/// Raw text of the two date inputs, kept so the UI can redisplay what the
/// user typed after a rejected edit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateInputs {
    pub from: String,
    pub to: String,
}

impl DateInputs {
    pub fn get(&self, field: DateField) -> &str {
        match field {
            DateField::From => &self.from,
            DateField::To => &self.to,
        }
    }

    fn slot(&mut self, field: DateField) -> &mut String {
        match field {
            DateField::From => &mut self.from,
            DateField::To => &mut self.to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    FetchRequested(VehicleQuery),
    BadgesChanged(Vec<Badge>),
    DateRejected { field: DateField, error: DateError },
}

/// Owns search, filters, sort and paging. Every mutation funnels through
/// [`FilterState::apply_filters`], which snapshots the query, rebuilds the
/// badges, and requests exactly one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    criteria: FilterCriteria,
    search: String,
    sort: SortSpec,
    page: u32,
    per_page: u32,
    shortcut: Option<DateShortcut>,
    date_inputs: DateInputs,
    date_error: Option<DateField>,
    snapshot: Option<VehicleQuery>,
    badges: Vec<Badge>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl FilterState {
    pub fn new(per_page: u32) -> Self {
        let per_page = if is_allowed_page_size(per_page) {
            per_page
        } else {
            DEFAULT_PER_PAGE
        };
        Self {
            criteria: FilterCriteria::default(),
            search: String::new(),
            sort: SortSpec::default(),
            page: 1,
            per_page,
            shortcut: None,
            date_inputs: DateInputs::default(),
            date_error: None,
            snapshot: None,
            badges: Vec::new(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn shortcut(&self) -> Option<DateShortcut> {
        self.shortcut
    }

    pub fn date_inputs(&self) -> &DateInputs {
        &self.date_inputs
    }

    pub fn date_error(&self) -> Option<DateField> {
        self.date_error
    }

    /// The query most recently handed to the fetcher.
    pub fn snapshot(&self) -> Option<&VehicleQuery> {
        self.snapshot.as_ref()
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn current_query(&self) -> VehicleQuery {
        let search = self.search.trim();
        VehicleQuery {
            search: (!search.is_empty()).then(|| search.to_owned()),
            filters: self.criteria.clone(),
            sort: self.sort.clone(),
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// Empty value removes the key. Date keys take ISO text.
    pub fn set_filter(&mut self, key: FilterKey, value: &str) -> Vec<FilterEvent> {
        let value = value.trim();
        match key {
            FilterKey::Tipo => {
                return self.set_type_filter((!value.is_empty()).then(|| value.to_owned()));
            }
            FilterKey::DateFrom | FilterKey::DateTo => {
                let field = if key == FilterKey::DateFrom {
                    DateField::From
                } else {
                    DateField::To
                };
                let parsed = if value.is_empty() {
                    None
                } else {
                    match parse_iso_date(value) {
                        Ok(date) => Some(date),
                        Err(error) => return self.reject_date(field, error),
                    }
                };
                self.store_date(field, parsed);
            }
            text_key => {
                if let Some(slot) = self.criteria.text_slot(text_key) {
                    *slot = (!value.is_empty()).then(|| value.to_owned());
                }
            }
        }
        self.page = 1;
        self.apply_filters()
    }

    /// Replaces the whole type selection.
    pub fn set_type_filter(
        &mut self,
        values: impl IntoIterator<Item = String>,
    ) -> Vec<FilterEvent> {
        self.criteria.tipo = values
            .into_iter()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .collect();
        self.page = 1;
        self.apply_filters()
    }

    pub fn toggle_type(&mut self, value: &str) -> Vec<FilterEvent> {
        let mut selected = self.criteria.tipo.clone();
        if !selected.remove(value) {
            selected.insert(value.to_owned());
        }
        self.set_type_filter(selected)
    }

    /// Sets both bounds at once from a manual range.
    pub fn set_date_range(&mut self, from: Option<Date>, to: Option<Date>) -> Vec<FilterEvent> {
        self.store_date(DateField::From, from);
        self.store_date(DateField::To, to);
        self.page = 1;
        self.apply_filters()
    }

    pub fn apply_shortcut(&mut self, shortcut: DateShortcut, today: Date) -> Vec<FilterEvent> {
        let (from, to) = shortcut.range(today);
        self.store_date(DateField::From, Some(from));
        self.store_date(DateField::To, Some(to));
        self.shortcut = Some(shortcut);
        self.page = 1;
        self.apply_filters()
    }

    /// Manual edit of one date input in `dd/mm/yyyy`. Invalid text leaves the
    /// filter untouched and does not fetch.
    pub fn edit_date(&mut self, field: DateField, text: &str) -> Vec<FilterEvent> {
        *self.date_inputs.slot(field) = text.to_owned();
        let parsed = if text.trim().is_empty() {
            None
        } else {
            match parse_brazilian_date(text) {
                Ok(date) => Some(date),
                Err(error) => return self.reject_date(field, error),
            }
        };
        self.store_date(field, parsed);
        self.page = 1;
        self.apply_filters()
    }

    pub fn clear_date_error(&mut self) -> bool {
        self.date_error.take().is_some()
    }

    /// Resets every filter and control, leaving the search alone.
    pub fn clear_all(&mut self) -> Vec<FilterEvent> {
        self.criteria = FilterCriteria::default();
        self.shortcut = None;
        self.date_inputs = DateInputs::default();
        self.date_error = None;
        self.page = 1;
        self.apply_filters()
    }

    pub fn remove_filter(&mut self, target: FilterTarget) -> Vec<FilterEvent> {
        match target {
            FilterTarget::DateShortcut => {
                self.store_date(DateField::From, None);
                self.store_date(DateField::To, None);
            }
            FilterTarget::Key(FilterKey::DateFrom) => self.store_date(DateField::From, None),
            FilterTarget::Key(FilterKey::DateTo) => self.store_date(DateField::To, None),
            FilterTarget::Key(key) => self.criteria.clear(key),
        }
        self.page = 1;
        self.apply_filters()
    }

    pub fn remove_badge(&mut self, target: BadgeTarget) -> Vec<FilterEvent> {
        match target {
            BadgeTarget::Search => self.clear_search(),
            BadgeTarget::Filter(filter) => self.remove_filter(filter),
        }
    }

    pub fn submit_search(&mut self, query: &str) -> Vec<FilterEvent> {
        query.trim().clone_into(&mut self.search);
        self.page = 1;
        self.apply_filters()
    }

    pub fn clear_search(&mut self) -> Vec<FilterEvent> {
        self.search.clear();
        self.page = 1;
        self.apply_filters()
    }

    /// Same column flips direction; a new column sorts descending.
    pub fn sort_by(&mut self, column: &str) -> Vec<FilterEvent> {
        self.sort = self.sort.toggled_for(column);
        self.page = 1;
        self.apply_filters()
    }

    pub fn change_page(&mut self, page: u32) -> Vec<FilterEvent> {
        self.page = page.max(1);
        self.apply_filters()
    }

    pub fn change_per_page(&mut self, per_page: u32) -> Result<Vec<FilterEvent>> {
        if !is_allowed_page_size(per_page) {
            bail!(
                "page size {per_page} is not allowed; choose one of {}",
                PAGE_SIZE_OPTIONS
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        self.per_page = per_page;
        self.page = 1;
        Ok(self.apply_filters())
    }

    /// Re-issues the current query without changing anything.
    pub fn refresh(&mut self) -> Vec<FilterEvent> {
        self.apply_filters()
    }

    pub fn apply_filters(&mut self) -> Vec<FilterEvent> {
        let query = self.current_query();
        self.snapshot = Some(query.clone());
        self.badges = self.compute_badges();
        tracing::debug!(query = %query.to_query_string(), "applying filters");
        vec![
            FilterEvent::BadgesChanged(self.badges.clone()),
            FilterEvent::FetchRequested(query),
        ]
    }

    fn store_date(&mut self, field: DateField, value: Option<Date>) {
        *self.criteria.date_slot(field) = value;
        *self.date_inputs.slot(field) = value.map(format_brazilian_date).unwrap_or_default();
        self.shortcut = None;
        if self.date_error == Some(field) {
            self.date_error = None;
        }
    }

    fn reject_date(&mut self, field: DateField, error: DateError) -> Vec<FilterEvent> {
        tracing::debug!(field = field.key().as_str(), %error, "rejected date input");
        self.date_error = Some(field);
        vec![FilterEvent::DateRejected { field, error }]
    }

    fn compute_badges(&self) -> Vec<Badge> {
        let mut badges = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            badges.push(Badge {
                target: BadgeTarget::Search,
                label: format!("Busca: {search}"),
            });
        }
        for key in [FilterKey::Status, FilterKey::Patio, FilterKey::Circunscricao] {
            if let Some(value) = self.criteria.text(key) {
                badges.push(filter_badge(key, value));
            }
        }
        if !self.criteria.tipo.is_empty() {
            let joined = self
                .criteria
                .tipo
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            badges.push(filter_badge(FilterKey::Tipo, &joined));
        }
        match self.shortcut {
            Some(shortcut) => badges.push(Badge {
                target: BadgeTarget::Filter(FilterTarget::DateShortcut),
                label: shortcut.label().to_owned(),
            }),
            None => {
                for field in [DateField::From, DateField::To] {
                    if let Some(date) = self.criteria.date(field) {
                        badges.push(filter_badge(field.key(), &format_brazilian_date(date)));
                    }
                }
            }
        }
        badges
    }
}

fn filter_badge(key: FilterKey, value: &str) -> Badge {
    Badge {
        target: BadgeTarget::Filter(FilterTarget::Key(key)),
        label: format!("{}: {value}", key.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BadgeTarget, DateField, DateShortcut, FilterEvent, FilterKey, FilterState, FilterTarget,
    };
    use crate::dates::DateError;
    use crate::model::SortDirection;
    use anyhow::Result;
    use time::macros::date;

    fn labels(state: &FilterState) -> Vec<&str> {
        state
            .badges()
            .iter()
            .map(|badge| badge.label.as_str())
            .collect()
    }

    fn fetches(events: &[FilterEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, FilterEvent::FetchRequested(_)))
            .count()
    }

    #[test]
    fn every_mutation_requests_exactly_one_fetch() -> Result<()> {
        let mut state = FilterState::default();
        assert_eq!(fetches(&state.set_filter(FilterKey::Status, "Apreendido")), 1);
        assert_eq!(fetches(&state.set_type_filter(["Moto".to_owned()])), 1);
        assert_eq!(fetches(&state.submit_search("abc")), 1);
        assert_eq!(fetches(&state.sort_by("spj")), 1);
        assert_eq!(fetches(&state.change_page(3)), 1);
        assert_eq!(fetches(&state.change_per_page(25)?), 1);
        assert_eq!(fetches(&state.clear_all()), 1);
        Ok(())
    }

    #[test]
    fn set_then_remove_restores_prior_criteria() {
        let mut state = FilterState::default();
        state.set_filter(FilterKey::Patio, "Central");
        let before = state.criteria().clone();

        state.set_filter(FilterKey::Status, "Apreendido");
        state.set_filter(FilterKey::Circunscricao, "1ª DP");
        state.set_filter(FilterKey::DateFrom, "2024-01-10");
        state.remove_filter(FilterTarget::Key(FilterKey::DateFrom));
        state.remove_filter(FilterTarget::Key(FilterKey::Circunscricao));
        state.remove_filter(FilterTarget::Key(FilterKey::Status));

        assert_eq!(state.criteria(), &before);
    }

    #[test]
    fn empty_value_removes_key() {
        let mut state = FilterState::default();
        state.set_filter(FilterKey::Status, "Apreendido");
        state.set_filter(FilterKey::Status, "   ");
        assert!(state.criteria().is_empty());
        assert!(state.badges().is_empty());
    }

    #[test]
    fn mutations_reset_page_to_one() -> Result<()> {
        let mut state = FilterState::default();
        state.change_page(4);
        assert_eq!(state.page(), 4);
        state.set_filter(FilterKey::Patio, "Norte");
        assert_eq!(state.page(), 1);

        state.change_page(2);
        state.sort_by("spj");
        assert_eq!(state.page(), 1);

        state.change_page(2);
        state.change_per_page(50)?;
        assert_eq!(state.page(), 1);
        assert_eq!(state.per_page(), 50);

        state.change_page(0);
        assert_eq!(state.page(), 1);
        Ok(())
    }

    #[test]
    fn disallowed_page_size_is_rejected() {
        let mut state = FilterState::default();
        let error = state.change_per_page(20).expect_err("20 is not a page size");
        assert!(error.to_string().contains("5, 10, 25, 50"));
        assert_eq!(state.per_page(), 5);
        assert!(state.snapshot().is_none());
    }

    #[test]
    fn sort_flips_same_column_and_starts_new_column_desc() {
        let mut state = FilterState::default();
        state.sort_by("data_apreensao");
        assert_eq!(state.sort().direction, SortDirection::Asc);
        state.sort_by("data_apreensao");
        assert_eq!(state.sort().direction, SortDirection::Desc);
        state.sort_by("modelo");
        assert_eq!(state.sort().column, "modelo");
        assert_eq!(state.sort().direction, SortDirection::Desc);
    }

    #[test]
    fn shortcut_collapses_date_badges() {
        let mut state = FilterState::default();
        state.set_filter(FilterKey::Status, "Apreendido");
        state.apply_shortcut(DateShortcut::Last7Days, date!(2024 - 03 - 15));

        assert_eq!(labels(&state), vec!["Status: Apreendido", "Últimos 7 dias"]);
        assert_eq!(state.criteria().date_from, Some(date!(2024 - 03 - 08)));
        assert_eq!(state.criteria().date_to, Some(date!(2024 - 03 - 15)));
        let query = state.snapshot().expect("snapshot after shortcut");
        assert!(query.to_query_string().contains("date_from=2024-03-08"));
        assert!(query.to_query_string().contains("date_to=2024-03-15"));
    }

    #[test]
    fn manual_date_edit_clears_shortcut_and_restores_individual_badges() {
        let mut state = FilterState::default();
        state.apply_shortcut(DateShortcut::Last30Days, date!(2024 - 03 - 31));
        assert_eq!(labels(&state), vec!["Últimos 30 dias"]);

        state.edit_date(DateField::To, "20/03/2024");
        assert_eq!(state.shortcut(), None);
        assert_eq!(labels(&state), vec!["De: 01/03/2024", "Até: 20/03/2024"]);
    }

    #[test]
    fn date_range_sets_both_bounds_and_drops_shortcut() -> Result<()> {
        let mut state = FilterState::default();
        state.apply_shortcut(DateShortcut::Last7Days, date!(2024 - 03 - 15));
        state.change_page(4);
        assert_eq!(state.shortcut(), Some(DateShortcut::Last7Days));

        let events =
            state.set_date_range(Some(date!(2024 - 01 - 10)), Some(date!(2024 - 02 - 20)));
        assert_eq!(fetches(&events), 1);
        assert_eq!(state.shortcut(), None);
        assert_eq!(state.page(), 1);
        assert_eq!(state.criteria().date_from, Some(date!(2024 - 01 - 10)));
        assert_eq!(state.criteria().date_to, Some(date!(2024 - 02 - 20)));
        assert_eq!(state.date_inputs().from, "10/01/2024");
        assert_eq!(state.date_inputs().to, "20/02/2024");
        assert_eq!(labels(&state), vec!["De: 10/01/2024", "Até: 20/02/2024"]);

        let query = events
            .into_iter()
            .find_map(|event| match event {
                FilterEvent::FetchRequested(query) => Some(query),
                _ => None,
            })
            .ok_or_else(|| anyhow::anyhow!("date range should request a fetch"))?;
        assert_eq!(query.page, 1);
        let encoded = query.to_query_string();
        assert!(encoded.contains("date_from=2024-01-10"), "{encoded}");
        assert!(encoded.contains("date_to=2024-02-20"), "{encoded}");

        state.set_date_range(None, Some(date!(2024 - 02 - 21)));
        assert_eq!(state.criteria().date_from, None);
        assert_eq!(labels(&state), vec!["Até: 21/02/2024"]);
        Ok(())
    }

    #[test]
    fn removing_shortcut_clears_both_bounds() {
        let mut state = FilterState::default();
        state.apply_shortcut(DateShortcut::Today, date!(2024 - 03 - 15));
        assert_eq!(labels(&state), vec!["Hoje"]);
        state.remove_filter(FilterTarget::DateShortcut);
        assert!(state.criteria().is_empty());
        assert_eq!(state.shortcut(), None);
        assert!(state.badges().is_empty());
    }

    #[test]
    fn removing_one_bound_under_shortcut_clears_marker() {
        let mut state = FilterState::default();
        state.apply_shortcut(DateShortcut::Last90Days, date!(2024 - 03 - 31));
        state.remove_filter(FilterTarget::Key(FilterKey::DateFrom));
        assert_eq!(state.shortcut(), None);
        assert_eq!(labels(&state), vec!["Até: 31/03/2024"]);
    }

    #[test]
    fn invalid_date_edit_is_rejected_without_fetch() {
        let mut state = FilterState::default();
        state.edit_date(DateField::From, "10/01/2024");
        let before = state.snapshot().cloned();

        let events = state.edit_date(DateField::From, "31/02/2024");
        assert_eq!(
            events,
            vec![FilterEvent::DateRejected {
                field: DateField::From,
                error: DateError::InvalidCalendarDate,
            }]
        );
        assert_eq!(state.criteria().date_from, Some(date!(2024 - 01 - 10)));
        assert_eq!(state.snapshot().cloned(), before);
        assert_eq!(state.date_error(), Some(DateField::From));
        assert_eq!(state.date_inputs().from, "31/02/2024");

        state.edit_date(DateField::From, "11/01/2024");
        assert_eq!(state.date_error(), None);
    }

    #[test]
    fn empty_date_edit_removes_bound() {
        let mut state = FilterState::default();
        state.edit_date(DateField::To, "05/05/2023");
        state.edit_date(DateField::To, "");
        assert!(state.criteria().date_to.is_none());
        assert!(state.badges().is_empty());
    }

    #[test]
    fn invalid_iso_set_filter_is_rejected() {
        let mut state = FilterState::default();
        let events = state.set_filter(FilterKey::DateTo, "2024-02-30");
        assert_eq!(fetches(&events), 0);
        assert!(state.criteria().date_to.is_none());
    }

    #[test]
    fn clear_all_keeps_search() {
        let mut state = FilterState::default();
        state.submit_search("ABC1234");
        state.set_filter(FilterKey::Patio, "Sul");
        state.set_type_filter(["Carro".to_owned()]);
        state.apply_shortcut(DateShortcut::Today, date!(2024 - 01 - 01));
        state.clear_all();

        assert!(state.criteria().is_empty());
        assert_eq!(state.shortcut(), None);
        assert_eq!(state.date_inputs().from, "");
        assert_eq!(state.search(), "ABC1234");
        assert_eq!(labels(&state), vec!["Busca: ABC1234"]);
    }

    #[test]
    fn search_badge_removal_clears_search() {
        let mut state = FilterState::default();
        state.submit_search("  fiat ");
        assert_eq!(labels(&state), vec!["Busca: fiat"]);
        state.remove_badge(BadgeTarget::Search);
        assert_eq!(state.search(), "");
        assert!(state.badges().is_empty());
        assert_eq!(state.snapshot().and_then(|query| query.search.clone()), None);
    }

    #[test]
    fn type_filter_is_multi_valued() {
        let mut state = FilterState::default();
        state.toggle_type("Moto");
        state.toggle_type("Carro");
        assert_eq!(labels(&state), vec!["Tipo: Carro, Moto"]);
        state.toggle_type("Moto");
        assert_eq!(labels(&state), vec!["Tipo: Carro"]);
        state.set_type_filter(Vec::new());
        assert!(!state.criteria().has(FilterKey::Tipo));
    }

    #[test]
    fn status_and_type_produce_expected_query_and_badges() -> Result<()> {
        let mut state = FilterState::default();
        state.change_per_page(10)?;
        state.set_filter(FilterKey::Status, "Apreendido");
        let events = state.set_type_filter(["Moto".to_owned()]);

        let Some(FilterEvent::FetchRequested(query)) = events.last() else {
            panic!("expected a fetch request, got {events:?}");
        };
        assert_eq!(
            query.to_query_string(),
            "status=Apreendido&tipo=Moto&sort_by=data_apreensao&sort_order=desc&page=1&per_page=10"
        );
        assert_eq!(labels(&state), vec!["Status: Apreendido", "Tipo: Moto"]);
        Ok(())
    }

    #[test]
    fn filter_target_parses_pseudo_key() {
        assert_eq!(
            FilterTarget::parse("date_shortcut"),
            Some(FilterTarget::DateShortcut)
        );
        assert_eq!(
            FilterTarget::parse("patio"),
            Some(FilterTarget::Key(FilterKey::Patio))
        );
        assert_eq!(FilterTarget::parse("bogus"), None);
    }
}

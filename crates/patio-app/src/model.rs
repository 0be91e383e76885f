// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ids::VehicleId;

pub const PAGE_SIZE_OPTIONS: [u32; 4] = [5, 10, 25, 50];
pub const DEFAULT_PER_PAGE: u32 = 5;
pub const DEFAULT_SORT_COLUMN: &str = "data_apreensao";

pub const DATE_FIELDS: [&str; 2] = ["data_apreensao", "ultima_movimentacao"];
pub const INTEGER_FIELDS: [&str; 3] = ["protocolo", "numero_laudo", "num_procedimento"];
pub const LONG_TEXT_FIELDS: [&str; 5] = [
    "modelo",
    "proprietario",
    "pessoa_relacionada",
    "obs1",
    "obs2",
];

pub fn is_allowed_page_size(value: u32) -> bool {
    PAGE_SIZE_OPTIONS.contains(&value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Same column flips direction; any other column starts descending.
    pub fn toggled_for(&self, column: &str) -> Self {
        if self.column == column {
            Self::new(column, self.direction.flipped())
        } else {
            Self::new(column, SortDirection::Desc)
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_COLUMN, SortDirection::Desc)
    }
}

/// A vehicle row as returned by the backend: an id plus a flat field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Vehicle {
    pub fn new(id: VehicleId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(value)) => value.clone(),
            Some(Value::Number(value)) => value.to_string(),
            Some(Value::Bool(value)) => value.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn status_class(&self) -> String {
        let explicit = self.field("status_class");
        if !explicit.trim().is_empty() {
            return explicit;
        }
        status_class_for(&self.field("status"))
    }
}

/// Lowercases, folds Portuguese accents, joins words with `_`, and drops
/// anything outside `[a-z0-9_]`.
pub fn status_class_for(status: &str) -> String {
    let mut out = String::with_capacity(status.len());
    let mut pending_separator = false;
    for ch in status.trim().chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('_');
        }
        pending_separator = false;
        for lower in ch.to_lowercase() {
            let folded = fold_accent(lower);
            if folded.is_ascii_lowercase() || folded.is_ascii_digit() || folded == '_' {
                out.push(folded);
            }
        }
    }
    out
}

fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub per_page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            pages: 0,
            total: 0,
            per_page: DEFAULT_PER_PAGE,
            has_prev: false,
            has_next: false,
        }
    }
}

impl Pagination {
    /// 1-based inclusive range of rows shown on this page, `None` when empty.
    pub fn row_range(&self) -> Option<(u64, u64)> {
        if self.total == 0 || self.page == 0 {
            return None;
        }
        let per_page = u64::from(self.per_page.max(1));
        let first = (u64::from(self.page) - 1) * per_page + 1;
        let last = (u64::from(self.page) * per_page).min(self.total);
        if first > last {
            return None;
        }
        Some((first, last))
    }

    pub fn summary(&self) -> String {
        match self.row_range() {
            Some((first, last)) => {
                format!("Mostrando {first}-{last} de {} resultados", self.total)
            }
            None => "Nenhum resultado".to_owned(),
        }
    }

    /// Up to `max_visible` page numbers, centred on the current page.
    pub fn page_window(&self, max_visible: u32) -> Vec<u32> {
        if self.pages == 0 || max_visible == 0 {
            return Vec::new();
        }
        let current = self.page.clamp(1, self.pages);
        let mut start = current.saturating_sub(max_visible / 2).max(1);
        let end = start.saturating_add(max_visible - 1).min(self.pages);
        if end - start < max_visible - 1 {
            start = end.saturating_sub(max_visible - 1).max(1);
        }
        (start..=end).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehiclePage {
    pub vehicles: Vec<Vehicle>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub status: Vec<String>,
    pub patio: Vec<String>,
    pub circunscricao: Vec<String>,
    pub tipo: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_vehicles: u64,
    pub status_distribution: BTreeMap<String, u64>,
    pub type_distribution: BTreeMap<String, u64>,
    pub recent_vehicles: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: String,
    pub raw_count: Option<u64>,
    pub model_count: Option<u64>,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status == "success"
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const VEHICLE_COLUMNS: [(&str, &str); 30] = [
    ("spj", "SPJ"),
    ("ano", "ANO"),
    ("natureza", "NATUREZA"),
    ("procedimento", "PROCEDIMENTO"),
    ("equipe", "EQUIPE"),
    ("num_procedimento", "Nº PROC."),
    ("status", "STATUS"),
    ("chave", "CHAVE"),
    ("circunscricao", "CIRCUNSCRIÇÃO"),
    ("patio", "PÁTIO"),
    ("data_apreensao", "DATA APREENSÃO"),
    ("ultima_movimentacao", "ÚLTIMA MOVIM."),
    ("tipo", "TIPO"),
    ("modelo", "MODELO"),
    ("cor", "COR"),
    ("ano_fabricacao", "ANO FAB."),
    ("ano_modelo", "ANO MOD."),
    ("placa_original", "PLACA ORIG."),
    ("placa_ostentada", "PLACA OST."),
    ("chassi", "CHASSI"),
    ("proprietario", "PROPRIETÁRIO"),
    ("pessoa_relacionada", "PESSOA REL."),
    ("pericia", "PERÍCIA"),
    ("protocolo", "PROTOCOLO"),
    ("status_pericia", "STATUS PER."),
    ("numero_laudo", "Nº LAUDO"),
    ("resultado_laudo", "RESULTADO"),
    ("afis", "AFIS"),
    ("obs1", "OBS1"),
    ("obs2", "OBS2"),
];

const VEHICLE_DEFAULT_VISIBLE: [&str; 8] = [
    "spj",
    "status",
    "tipo",
    "modelo",
    "placa_original",
    "data_apreensao",
    "patio",
    "circunscricao",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub key: String,
    pub title: String,
}

/// Immutable ordered catalog of columns plus the default visible set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCatalog {
    columns: Vec<ColumnDef>,
    default_visible: BTreeSet<String>,
}

impl ColumnCatalog {
    pub fn new<K, T>(
        columns: impl IntoIterator<Item = (K, T)>,
        default_visible: &[&str],
    ) -> Result<Self>
    where
        K: Into<String>,
        T: Into<String>,
    {
        let columns: Vec<ColumnDef> = columns
            .into_iter()
            .map(|(key, title)| ColumnDef {
                key: key.into(),
                title: title.into(),
            })
            .collect();
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                bail!("column `{}` is declared twice", column.key);
            }
        }
        for key in default_visible {
            if !seen.contains(key) {
                bail!("default visible column `{key}` is not in the catalog");
            }
        }
        Ok(Self {
            columns,
            default_visible: default_visible.iter().map(|key| (*key).to_owned()).collect(),
        })
    }

    /// The 30 seized-vehicle fields.
    pub fn vehicles() -> Self {
        Self {
            columns: VEHICLE_COLUMNS
                .iter()
                .map(|(key, title)| ColumnDef {
                    key: (*key).to_owned(),
                    title: (*title).to_owned(),
                })
                .collect(),
            default_visible: VEHICLE_DEFAULT_VISIBLE
                .iter()
                .map(|key| (*key).to_owned())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.key == key)
    }

    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |column| column.title.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_default_visible(&self, key: &str) -> bool {
        self.default_visible.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.key.as_str())
    }
}

impl Default for ColumnCatalog {
    fn default() -> Self {
        Self::vehicles()
    }
}

/// Column settings as persisted in the local store. Either half may be
/// missing or stale; [`ColumnLayout::from_stored`] repairs them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredColumns {
    pub visibility: Option<BTreeMap<String, bool>>,
    pub order: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    catalog: ColumnCatalog,
    visibility: BTreeMap<String, bool>,
    order: Vec<String>,
}

impl ColumnLayout {
    pub fn new(catalog: ColumnCatalog) -> Self {
        let visibility = default_visibility(&catalog);
        let order = catalog.keys().map(str::to_owned).collect();
        Self {
            catalog,
            visibility,
            order,
        }
    }

    /// Unknown keys are dropped, missing keys appended in catalog order, and
    /// duplicates keep their first occurrence.
    pub fn from_stored(catalog: ColumnCatalog, stored: StoredColumns) -> Self {
        let mut layout = Self::new(catalog);

        if let Some(stored_visibility) = stored.visibility {
            for (key, visible) in stored_visibility {
                if let Some(slot) = layout.visibility.get_mut(&key) {
                    *slot = visible;
                } else {
                    tracing::debug!(column = %key, "dropping unknown stored column visibility");
                }
            }
        }

        if let Some(stored_order) = stored.order {
            let mut seen = BTreeSet::new();
            let mut order = Vec::with_capacity(layout.order.len());
            for key in stored_order {
                if !layout.catalog.contains(&key) {
                    tracing::debug!(column = %key, "dropping unknown stored column");
                    continue;
                }
                if seen.insert(key.clone()) {
                    order.push(key);
                }
            }
            for key in layout.catalog.keys() {
                if !seen.contains(key) {
                    order.push(key.to_owned());
                }
            }
            layout.order = order;
        }

        layout.check_invariant();
        layout
    }

    pub fn stored(&self) -> StoredColumns {
        StoredColumns {
            visibility: Some(self.visibility.clone()),
            order: Some(self.order.clone()),
        }
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visibility.get(key).copied().unwrap_or(false)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns_where(true)
    }

    pub fn hidden_columns(&self) -> Vec<&ColumnDef> {
        self.columns_where(false)
    }

    pub fn visible_keys(&self) -> Vec<&str> {
        self.visible_columns()
            .into_iter()
            .map(|column| column.key.as_str())
            .collect()
    }

    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        let slot = self
            .visibility
            .get_mut(key)
            .ok_or_else(|| anyhow!("unknown column `{key}`"))?;
        *slot = !*slot;
        let visible = *slot;
        self.check_invariant();
        Ok(visible)
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for slot in self.visibility.values_mut() {
            *slot = visible;
        }
        self.check_invariant();
    }

    pub fn reset_to_default(&mut self) {
        self.visibility = default_visibility(&self.catalog);
        self.order = self.catalog.keys().map(str::to_owned).collect();
        self.check_invariant();
    }

    /// Moves `key` into the visible or hidden group at `target_index` within
    /// that group. Items not being moved keep their relative order. An index
    /// past the end of the group appends after its last member.
    pub fn reorder(&mut self, key: &str, target_index: usize, visible: bool) -> Result<()> {
        let position = self
            .order
            .iter()
            .position(|candidate| candidate == key)
            .ok_or_else(|| anyhow!("unknown column `{key}`"))?;
        let moved = self.order.remove(position);
        if let Some(slot) = self.visibility.get_mut(&moved) {
            *slot = visible;
        }

        let group: Vec<usize> = self
            .order
            .iter()
            .enumerate()
            .filter(|(_, candidate)| self.is_visible(candidate) == visible)
            .map(|(index, _)| index)
            .collect();
        let insert_at = match group.get(target_index) {
            Some(index) => *index,
            None => group.last().map_or(self.order.len(), |last| last + 1),
        };
        self.order.insert(insert_at, moved);
        self.check_invariant();
        Ok(())
    }

    /// Order is a permutation of the catalog keys and every key has a
    /// visibility entry.
    pub fn is_consistent(&self) -> bool {
        if self.order.len() != self.catalog.columns.len()
            || self.visibility.len() != self.catalog.columns.len()
        {
            return false;
        }
        let ordered: BTreeSet<&str> = self.order.iter().map(String::as_str).collect();
        let catalog: BTreeSet<&str> = self.catalog.keys().collect();
        ordered.len() == self.order.len()
            && ordered == catalog
            && self.visibility.keys().all(|key| catalog.contains(key.as_str()))
    }

    fn columns_where(&self, visible: bool) -> Vec<&ColumnDef> {
        self.order
            .iter()
            .filter(|key| self.is_visible(key) == visible)
            .filter_map(|key| self.catalog.get(key))
            .collect()
    }

    fn check_invariant(&self) {
        debug_assert!(self.is_consistent(), "column order drifted from catalog");
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::new(ColumnCatalog::vehicles())
    }
}

fn default_visibility(catalog: &ColumnCatalog) -> BTreeMap<String, bool> {
    catalog
        .keys()
        .map(|key| (key.to_owned(), catalog.is_default_visible(key)))
        .collect()
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use url::form_urlencoded;

use crate::dates::format_iso_date;
use crate::filters::FilterCriteria;
use crate::model::SortSpec;

/// Everything the backend needs to produce one page of vehicles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleQuery {
    pub search: Option<String>,
    pub filters: FilterCriteria,
    pub sort: SortSpec,
    pub page: u32,
    pub per_page: u32,
}

impl VehicleQuery {
    /// Parameters in wire order. `tipo` repeats once per selected type.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|value| !value.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        for (name, value) in [
            ("status", &self.filters.status),
            ("patio", &self.filters.patio),
            ("circunscricao", &self.filters.circunscricao),
        ] {
            if let Some(value) = value {
                pairs.push((name, value.clone()));
            }
        }
        for tipo in &self.filters.tipo {
            pairs.push(("tipo", tipo.clone()));
        }
        if let Some(from) = self.filters.date_from {
            pairs.push(("date_from", format_iso_date(from)));
        }
        if let Some(to) = self.filters.date_to {
            pairs.push(("date_to", format_iso_date(to)));
        }
        pairs.push(("sort_by", self.sort.column.clone()));
        pairs.push(("sort_order", self.sort.direction.as_str().to_owned()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("per_page", self.per_page.to_string()));
        pairs
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }
}

impl Default for VehicleQuery {
    fn default() -> Self {
        Self {
            search: None,
            filters: FilterCriteria::default(),
            sort: SortSpec::default(),
            page: 1,
            per_page: crate::model::DEFAULT_PER_PAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VehicleQuery;
    use crate::model::{SortDirection, SortSpec};
    use time::macros::date;

    #[test]
    fn default_query_only_carries_sort_and_paging() {
        assert_eq!(
            VehicleQuery::default().to_query_string(),
            "sort_by=data_apreensao&sort_order=desc&page=1&per_page=5"
        );
    }

    #[test]
    fn types_repeat_instead_of_joining() {
        let mut query = VehicleQuery::default();
        query.filters.tipo.insert("Moto".to_owned());
        query.filters.tipo.insert("Carro".to_owned());
        let tipos: Vec<String> = query
            .query_pairs()
            .into_iter()
            .filter(|(name, _)| *name == "tipo")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(tipos.len(), 2);
        assert!(tipos.contains(&"Moto".to_owned()));
        assert!(tipos.contains(&"Carro".to_owned()));
        assert!(!query.to_query_string().contains("%2C"));
    }

    #[test]
    fn full_query_follows_wire_order_and_encodes_values() {
        let mut query = VehicleQuery {
            search: Some("gol preto".to_owned()),
            sort: SortSpec::new("spj", SortDirection::Asc),
            page: 3,
            per_page: 25,
            ..VehicleQuery::default()
        };
        query.filters.status = Some("Em Perícia".to_owned());
        query.filters.patio = Some("Central".to_owned());
        query.filters.circunscricao = Some("1ª DP".to_owned());
        query.filters.tipo.insert("Moto".to_owned());
        query.filters.date_from = Some(date!(2024 - 01 - 01));
        query.filters.date_to = Some(date!(2024 - 01 - 31));

        let names: Vec<&str> = query.query_pairs().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "search",
                "status",
                "patio",
                "circunscricao",
                "tipo",
                "date_from",
                "date_to",
                "sort_by",
                "sort_order",
                "page",
                "per_page",
            ]
        );
        let encoded = query.to_query_string();
        assert!(encoded.starts_with("search=gol+preto&status=Em+Per%C3%ADcia&"));
        assert!(encoded.contains("date_from=2024-01-01&date_to=2024-01-31"));
        assert!(encoded.ends_with("sort_by=spj&sort_order=asc&page=3&per_page=25"));
    }
}

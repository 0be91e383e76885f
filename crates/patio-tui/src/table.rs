// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use patio_app::{
    ColumnDef, DATE_FIELDS, INTEGER_FIELDS, PAGE_SIZE_OPTIONS, Pagination, SortDirection,
    SortSpec, Vehicle, VehicleId, format_integer, format_table_date,
};

pub const SORT_MARK_ASC: &str = "▲";
pub const SORT_MARK_DESC: &str = "▼";
pub const PAGE_WINDOW: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sorted: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowProjection {
    pub id: VehicleId,
    pub cells: Vec<String>,
    pub status_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProjection {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<RowProjection>,
}

/// Pure projection of the visible columns and the current page.
pub fn project(columns: &[&ColumnDef], vehicles: &[Vehicle], sort: &SortSpec) -> TableProjection {
    let headers = columns
        .iter()
        .map(|column| header_cell(column, sort))
        .collect();
    let rows = vehicles
        .iter()
        .map(|vehicle| RowProjection {
            id: vehicle.id,
            cells: columns
                .iter()
                .map(|column| format_cell(vehicle, &column.key))
                .collect(),
            status_class: vehicle.status_class(),
        })
        .collect();
    TableProjection { headers, rows }
}

fn header_cell(column: &ColumnDef, sort: &SortSpec) -> HeaderCell {
    let sorted = (sort.column == column.key).then_some(sort.direction);
    let label = match sorted {
        Some(SortDirection::Asc) => format!("{} {SORT_MARK_ASC}", column.title),
        Some(SortDirection::Desc) => format!("{} {SORT_MARK_DESC}", column.title),
        None => column.title.clone(),
    };
    HeaderCell {
        key: column.key.clone(),
        label,
        sorted,
    }
}

pub fn format_cell(vehicle: &Vehicle, key: &str) -> String {
    let raw = vehicle.field(key);
    if DATE_FIELDS.contains(&key) {
        format_table_date(&raw)
    } else if INTEGER_FIELDS.contains(&key) {
        format_integer(&raw)
    } else {
        raw
    }
}

/// `Mostrando a-b de N resultados | ‹ 1 [2] 3 › | por página: [5] 10 25 50`
pub fn pagination_footer(pagination: &Pagination, per_page: u32) -> String {
    let mut parts = vec![pagination.summary()];

    let window = pagination.page_window(PAGE_WINDOW);
    if !window.is_empty() {
        let prev = if pagination.has_prev { "‹" } else { " " };
        let next = if pagination.has_next { "›" } else { " " };
        let pages = window
            .iter()
            .map(|page| {
                if *page == pagination.page {
                    format!("[{page}]")
                } else {
                    page.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        parts.push(format!("{prev} {pages} {next}"));
    }

    let sizes = PAGE_SIZE_OPTIONS
        .iter()
        .map(|size| {
            if *size == per_page {
                format!("[{size}]")
            } else {
                size.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    parts.push(format!("por página: {sizes}"));
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::{format_cell, pagination_footer, project};
    use patio_app::{
        ColumnLayout, Pagination, SortDirection, SortSpec, Vehicle, VehicleId,
    };

    fn sample() -> Vehicle {
        Vehicle::new(VehicleId::new(9))
            .with_field("spj", "55/2024")
            .with_field("status", "Em Perícia")
            .with_field("data_apreensao", "2024-03-15T08:00:00")
            .with_field("ultima_movimentacao", 1_710_460_800_000_i64)
            .with_field("protocolo", 4512.0)
            .with_field("num_procedimento", "778.0")
            .with_field("ano", "2024")
    }

    #[test]
    fn cells_use_field_formatters() {
        let vehicle = sample();
        assert_eq!(format_cell(&vehicle, "data_apreensao"), "15/03/2024");
        assert_eq!(format_cell(&vehicle, "ultima_movimentacao"), "15/03/2024");
        assert_eq!(format_cell(&vehicle, "protocolo"), "4512");
        assert_eq!(format_cell(&vehicle, "num_procedimento"), "778");
        assert_eq!(format_cell(&vehicle, "ano"), "2024");
        assert_eq!(format_cell(&vehicle, "obs1"), "");
    }

    #[test]
    fn projection_follows_visible_order_and_marks_sort() {
        let mut layout = ColumnLayout::default();
        layout
            .reorder("data_apreensao", 0, true)
            .expect("reorder should succeed");
        let columns = layout.visible_columns();
        let projection = project(&columns, &[sample()], &SortSpec::default());

        assert_eq!(projection.headers.len(), 8);
        assert_eq!(projection.headers[0].label, "DATA APREENSÃO ▼");
        assert_eq!(projection.headers[0].sorted, Some(SortDirection::Desc));
        assert!(projection.headers[1..].iter().all(|header| header.sorted.is_none()));
        assert_eq!(projection.headers[1].key, "spj");

        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.rows[0].cells[0], "15/03/2024");
        assert_eq!(projection.rows[0].status_class, "em_pericia");
        assert_eq!(projection.rows[0].id, VehicleId::new(9));

        let ascending = project(&columns, &[], &SortSpec::new("spj", SortDirection::Asc));
        assert_eq!(ascending.headers[1].label, "SPJ ▲");
        assert_eq!(ascending.headers[0].label, "DATA APREENSÃO");
    }

    #[test]
    fn footer_shows_range_pages_and_sizes() {
        let pagination = Pagination {
            page: 2,
            pages: 9,
            total: 42,
            per_page: 5,
            has_prev: true,
            has_next: true,
        };
        assert_eq!(
            pagination_footer(&pagination, 5),
            "Mostrando 6-10 de 42 resultados | ‹ 1 [2] 3 4 5 › | por página: [5] 10 25 50"
        );

        let empty = Pagination::default();
        assert_eq!(
            pagination_footer(&empty, 10),
            "Nenhum resultado | por página: 5 [10] 25 50"
        );
    }
}

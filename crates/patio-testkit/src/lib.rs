// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use patio_app::{
    Pagination, SortDirection, Vehicle, VehicleId, VehiclePage, VehicleQuery, format_iso_date,
    parse_iso_date,
};
use std::cmp::Ordering;
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime};

const STATUSES: [&str; 5] = [
    "Apreendido",
    "Em Perícia",
    "Liberado",
    "Aguardando Leilão",
    "Restituído",
];

const PATIOS: [&str; 4] = ["Central", "Norte", "Sul", "Leste"];

const CIRCUNSCRICOES: [&str; 6] = ["1ª DP", "2ª DP", "5ª DP", "9ª DP", "DEFUR", "DRFV"];

const TIPOS: [&str; 5] = ["Carro", "Moto", "Caminhão", "Ônibus", "Reboque"];

const MODELOS: [&str; 12] = [
    "VW GOL",
    "FIAT UNO",
    "FIAT PALIO",
    "CHEVROLET ONIX",
    "HONDA CG 160",
    "YAMAHA FACTOR",
    "FORD KA",
    "RENAULT SANDERO",
    "HYUNDAI HB20",
    "TOYOTA COROLLA",
    "VOLVO FH 540",
    "MERCEDES-BENZ OF 1721",
];

const CORES: [&str; 8] = [
    "PRETA", "BRANCA", "PRATA", "CINZA", "VERMELHA", "AZUL", "VERDE", "AMARELA",
];

const NATUREZAS: [&str; 5] = [
    "Roubo",
    "Furto",
    "Adulteração de sinal",
    "Receptação",
    "Abandono",
];

const PROCEDIMENTOS: [&str; 3] = ["IP", "TCO", "BO"];

const FIRST_NAMES: [&str; 12] = [
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fábio", "Gabriela", "Heitor", "Isabela",
    "João", "Larissa", "Marcos",
];
const LAST_NAMES: [&str; 12] = [
    "Silva", "Santos", "Oliveira", "Souza", "Lima", "Pereira", "Costa", "Almeida", "Ribeiro",
    "Carvalho", "Gomes", "Martins",
];

const PLATE_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const VIN_CHARS: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ0123456789";

/// Fields matched by free-text search in [`page_vehicles`].
pub const SEARCH_FIELDS: [&str; 6] = [
    "spj",
    "placa_original",
    "placa_ostentada",
    "chassi",
    "modelo",
    "proprietario",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of seized-vehicle rows shaped like backend payloads.
#[derive(Debug, Clone)]
pub struct VehicleFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl VehicleFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn vehicle(&mut self) -> Vehicle {
        let id = VehicleId::new(self.next_id);
        self.next_id += 1;

        let seized = self.date_between(2022, 2025);
        let moved = seized + Duration::days(self.int_range(0, 120));
        let year = seized.year();
        let fabricacao = self.int_range(1998, i64::from(year));
        let pericia = self.rng.bool();

        let mut vehicle = Vehicle::new(id)
            .with_field("spj", format!("{}/{year}", self.int_range(1, 9999)))
            .with_field("ano", year)
            .with_field("natureza", self.pick(&NATUREZAS))
            .with_field("procedimento", self.pick(&PROCEDIMENTOS))
            .with_field("equipe", format!("Equipe {}", self.int_range(1, 8)))
            .with_field("num_procedimento", self.int_range(100, 99_999) as f64)
            .with_field("status", self.pick(&STATUSES))
            .with_field("chave", if self.rng.bool() { "Sim" } else { "Não" })
            .with_field("circunscricao", self.pick(&CIRCUNSCRICOES))
            .with_field("patio", self.pick(&PATIOS))
            .with_field("data_apreensao", format_iso_date(seized))
            .with_field("ultima_movimentacao", epoch_millis(moved))
            .with_field("tipo", self.pick(&TIPOS))
            .with_field("modelo", self.pick(&MODELOS))
            .with_field("cor", self.pick(&CORES))
            .with_field("ano_fabricacao", fabricacao)
            .with_field("ano_modelo", fabricacao + self.int_range(0, 1))
            .with_field("placa_original", self.plate())
            .with_field("chassi", self.vin())
            .with_field("proprietario", self.person())
            .with_field("pericia", if pericia { "Sim" } else { "Não" });

        if self.rng.bool() {
            let plate = self.plate();
            vehicle = vehicle.with_field("placa_ostentada", plate);
        }
        if self.int_range(0, 3) == 0 {
            let person = self.person();
            vehicle = vehicle.with_field("pessoa_relacionada", person);
        }
        if pericia {
            vehicle = vehicle
                .with_field("protocolo", self.int_range(1000, 99_999) as f64)
                .with_field(
                    "status_pericia",
                    if self.rng.bool() { "Concluída" } else { "Pendente" },
                )
                .with_field("numero_laudo", self.int_range(1, 9999) as f64)
                .with_field(
                    "resultado_laudo",
                    if self.rng.bool() { "Adulterado" } else { "Original" },
                )
                .with_field("afis", if self.rng.bool() { "Positivo" } else { "Negativo" });
        }
        if self.rng.bool() {
            vehicle = vehicle.with_field("obs1", "Veículo com avarias na lataria.");
        }
        vehicle
    }

    pub fn vehicles(&mut self, count: usize) -> Vec<Vehicle> {
        (0..count).map(|_| self.vehicle()).collect()
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn date_between(&mut self, from_year: i32, to_year: i32) -> Date {
        let start = Date::from_calendar_date(from_year, Month::January, 1).unwrap_or(Date::MIN);
        let end = Date::from_calendar_date(to_year, Month::December, 31).unwrap_or(start);
        let span = (end - start).whole_days();
        start + Duration::days(self.int_range(0, span))
    }

    fn plate(&mut self) -> String {
        let mut plate = String::with_capacity(7);
        for _ in 0..3 {
            plate.push(char::from(PLATE_LETTERS[self.rng.int_n(PLATE_LETTERS.len())]));
        }
        plate.push(char::from(b'0' + self.rng.int_n(10) as u8));
        plate.push(char::from(PLATE_LETTERS[self.rng.int_n(PLATE_LETTERS.len())]));
        for _ in 0..2 {
            plate.push(char::from(b'0' + self.rng.int_n(10) as u8));
        }
        plate
    }

    fn vin(&mut self) -> String {
        (0..17)
            .map(|_| char::from(VIN_CHARS[self.rng.int_n(VIN_CHARS.len())]))
            .collect()
    }

    fn person(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }
}

/// Filters, sorts and slices fixture rows the way the backend does, so
/// tests can serve realistic pages without a server.
pub fn page_vehicles(rows: &[Vehicle], query: &VehicleQuery) -> VehiclePage {
    let mut matched: Vec<&Vehicle> = rows.iter().filter(|row| matches(row, query)).collect();
    matched.sort_by(|left, right| {
        let ordering = compare_fields(
            &left.field(&query.sort.column),
            &right.field(&query.sort.column),
        )
        .then_with(|| left.id.cmp(&right.id));
        match query.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let per_page = query.per_page.max(1);
    let total = matched.len() as u64;
    let pages = u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);
    let page = query.page.max(1);
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let vehicles = matched
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .cloned()
        .collect();

    VehiclePage {
        vehicles,
        pagination: Pagination {
            page,
            pages,
            total,
            per_page,
            has_prev: page > 1,
            has_next: page < pages,
        },
        error: None,
    }
}

fn matches(row: &Vehicle, query: &VehicleQuery) -> bool {
    if let Some(search) = query.search.as_deref() {
        let needle = search.to_lowercase();
        if !SEARCH_FIELDS
            .iter()
            .any(|field| row.field(field).to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    let filters = &query.filters;
    for (field, wanted) in [
        ("status", &filters.status),
        ("patio", &filters.patio),
        ("circunscricao", &filters.circunscricao),
    ] {
        if let Some(wanted) = wanted
            && row.field(field) != *wanted
        {
            return false;
        }
    }
    if !filters.tipo.is_empty() && !filters.tipo.contains(&row.field("tipo")) {
        return false;
    }
    if filters.date_from.is_some() || filters.date_to.is_some() {
        let raw = row.field("data_apreensao");
        let Some(seized) = raw.get(..10).and_then(|prefix| parse_iso_date(prefix).ok()) else {
            return false;
        };
        if filters.date_from.is_some_and(|from| seized < from)
            || filters.date_to.is_some_and(|to| seized > to)
        {
            return false;
        }
    }
    true
}

fn compare_fields(left: &str, right: &str) -> Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn epoch_millis(date: Date) -> i64 {
    let noon = date.midnight().assume_utc() + Duration::hours(12);
    noon.unix_timestamp() * 1000
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("patio.db");
    Ok((dir, db_path))
}

pub fn reference_today() -> Date {
    OffsetDateTime::UNIX_EPOCH.date() + Duration::days(19_797)
}

pub fn statuses() -> &'static [&'static str] {
    &STATUSES
}

pub fn tipos() -> &'static [&'static str] {
    &TIPOS
}

#[cfg(test)]
mod tests {
    use super::{VehicleFaker, page_vehicles, reference_today, statuses, tipos};
    use patio_app::{
        ColumnCatalog, FilterState, FilterKey, SortDirection, SortSpec, VehicleQuery,
        format_table_date,
    };
    use std::collections::BTreeSet;
    use time::macros::date;

    #[test]
    fn same_seed_same_rows() {
        let left = VehicleFaker::new(42).vehicles(5);
        let right = VehicleFaker::new(42).vehicles(5);
        assert_eq!(left, right);
        assert_ne!(left, VehicleFaker::new(43).vehicles(5));
    }

    #[test]
    fn rows_only_use_catalog_fields() {
        let catalog = ColumnCatalog::vehicles();
        for vehicle in VehicleFaker::new(7).vehicles(50) {
            for key in vehicle.fields.keys() {
                assert!(catalog.contains(key), "unexpected field {key}");
            }
            assert!(statuses().contains(&vehicle.field("status").as_str()));
            assert!(tipos().contains(&vehicle.field("tipo").as_str()));
            assert_eq!(vehicle.field("placa_original").len(), 7);
            assert_eq!(format_table_date(&vehicle.field("data_apreensao")).len(), 10);
            assert_eq!(
                format_table_date(&vehicle.field("ultima_movimentacao")).len(),
                10
            );
        }
    }

    #[test]
    fn ids_are_sequential_and_unique() {
        let rows = VehicleFaker::new(3).vehicles(20);
        let ids: BTreeSet<i64> = rows.iter().map(|row| row.id.get()).collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn pages_are_sliced_with_server_flags() {
        let rows = VehicleFaker::new(11).vehicles(23);
        let query = VehicleQuery {
            page: 3,
            per_page: 10,
            ..VehicleQuery::default()
        };
        let page = page_vehicles(&rows, &query);
        assert_eq!(page.vehicles.len(), 3);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.pagination.total, 23);
        assert!(page.pagination.has_prev);
        assert!(!page.pagination.has_next);
    }

    #[test]
    fn default_sort_is_newest_seizure_first() {
        let rows = VehicleFaker::new(5).vehicles(30);
        let query = VehicleQuery {
            per_page: 50,
            ..VehicleQuery::default()
        };
        let page = page_vehicles(&rows, &query);
        let dates: Vec<String> = page
            .vehicles
            .iter()
            .map(|row| row.field("data_apreensao"))
            .collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.reverse();
        assert_eq!(dates, sorted);

        let ascending = VehicleQuery {
            sort: SortSpec::new("data_apreensao", SortDirection::Asc),
            ..query
        };
        let first = page_vehicles(&rows, &ascending).vehicles[0].field("data_apreensao");
        assert_eq!(Some(&first), dates.last());
    }

    #[test]
    fn filters_narrow_rows() {
        let rows = VehicleFaker::new(9).vehicles(80);
        let mut state = FilterState::new(50);
        state.set_filter(FilterKey::Status, "Apreendido");
        state.set_type_filter(["Moto".to_owned(), "Carro".to_owned()]);
        state.set_date_range(Some(date!(2023 - 01 - 01)), Some(date!(2024 - 12 - 31)));
        let page = page_vehicles(&rows, &state.current_query());
        for row in &page.vehicles {
            assert_eq!(row.field("status"), "Apreendido");
            assert!(["Moto", "Carro"].contains(&row.field("tipo").as_str()));
            let seized = row.field("data_apreensao");
            assert!(seized.as_str() >= "2023-01-01" && seized.as_str() <= "2024-12-31");
        }
    }

    #[test]
    fn search_matches_plates_case_insensitively() {
        let rows = VehicleFaker::new(13).vehicles(10);
        let plate = rows[4].field("placa_original");
        let query = VehicleQuery {
            search: Some(plate.to_lowercase()),
            ..VehicleQuery::default()
        };
        let page = page_vehicles(&rows, &query);
        assert!(page.vehicles.iter().any(|row| row.id == rows[4].id));
    }

    #[test]
    fn reference_today_is_stable() {
        assert_eq!(reference_today(), date!(2024 - 03 - 15));
    }
}

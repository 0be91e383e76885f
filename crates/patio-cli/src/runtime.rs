// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use patio_api::Client;
use patio_app::{
    FilterOptions, Statistics, StoredColumns, Suggestion, Vehicle, VehicleId, VehiclePage,
    VehicleQuery,
};
use patio_store::Store;
use patio_tui::{FetchEvent, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

pub struct ApiRuntime<'a> {
    client: Client,
    store: &'a Store,
}

impl<'a> ApiRuntime<'a> {
    pub fn new(client: Client, store: &'a Store) -> Self {
        Self { client, store }
    }
}

impl patio_tui::AppRuntime for ApiRuntime<'_> {
    fn fetch_vehicles(&mut self, query: &VehicleQuery) -> Result<VehiclePage> {
        self.client.fetch_vehicles(query)
    }

    fn fetch_vehicle(&mut self, id: VehicleId) -> Result<Vehicle> {
        self.client.fetch_vehicle(id)
    }

    fn autocomplete(&mut self, query: &str) -> Vec<Suggestion> {
        self.client.autocomplete(query)
    }

    fn filter_options(&mut self) -> FilterOptions {
        self.client.filter_options()
    }

    fn statistics(&mut self) -> Option<Statistics> {
        self.client.statistics()
    }

    fn save_columns(&mut self, columns: &StoredColumns) -> Result<()> {
        self.store.save_columns(columns)
    }

    fn save_recent_searches(&mut self, entries: &[String]) -> Result<()> {
        self.store.save_recent_searches(entries)
    }

    fn spawn_fetch(
        &mut self,
        request_id: u64,
        query: &VehicleQuery,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let query = query.clone();
        thread::Builder::new()
            .name(format!("patio-fetch-{request_id}"))
            .spawn(move || {
                let event = match client.fetch_vehicles(&query) {
                    Ok(page) => FetchEvent::Loaded { request_id, page },
                    Err(error) => FetchEvent::Failed {
                        request_id,
                        error: format!("{error:#}"),
                    },
                };
                // The loop may already be gone on quit.
                let _ = tx.send(InternalEvent::Fetch(event));
            })
            .context("spawn vehicle fetch worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::{Result, anyhow};
    use patio_api::Client;
    use patio_app::{ColumnCatalog, ColumnLayout, VehicleQuery};
    use patio_store::Store;
    use patio_tui::{AppRuntime, FetchEvent, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    fn store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        Ok(store)
    }

    #[test]
    fn spawn_fetch_reports_page_from_worker_thread() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}/api", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let body = r#"{"vehicles": [{"id": 7, "spj": "7/2024"}], "pagination": {"page": 1, "pages": 1, "total": 1, "per_page": 5, "has_prev": false, "has_next": false}}"#;
            request
                .respond(Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                ))
                .expect("response should succeed");
        });

        let store = store()?;
        let mut runtime = ApiRuntime::new(Client::new(&addr, Duration::from_secs(2))?, &store);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(41, &VehicleQuery::default(), tx)?;

        let event = rx.recv_timeout(Duration::from_secs(5))?;
        handle.join().expect("server thread should join");
        match event {
            InternalEvent::Fetch(FetchEvent::Loaded { request_id, page }) => {
                assert_eq!(request_id, 41);
                assert_eq!(page.vehicles.len(), 1);
                assert_eq!(page.vehicles[0].field("spj"), "7/2024");
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn spawn_fetch_reports_unreachable_backend_as_failure() -> Result<()> {
        let store = store()?;
        let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(50))?;
        let mut runtime = ApiRuntime::new(client, &store);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(3, &VehicleQuery::default(), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::Fetch(FetchEvent::Failed { request_id, error }) => {
                assert_eq!(request_id, 3);
                assert!(error.contains("[api]"), "{error}");
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn preferences_are_written_to_the_store() -> Result<()> {
        let store = store()?;
        let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(50))?;
        let mut runtime = ApiRuntime::new(client, &store);

        let mut layout = ColumnLayout::default();
        layout.toggle("chassi")?;
        runtime.save_columns(&layout.stored())?;
        runtime.save_recent_searches(&["gol".to_owned(), "ABC1234".to_owned()])?;

        let restored = ColumnLayout::from_stored(ColumnCatalog::vehicles(), store.load_columns()?);
        assert_eq!(restored, layout);
        assert_eq!(store.load_recent_searches(5)?.entries(), ["gol", "ABC1234"]);
        Ok(())
    }

    #[test]
    fn secondary_lookups_degrade_when_backend_is_down() -> Result<()> {
        let store = store()?;
        let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(50))?;
        let mut runtime = ApiRuntime::new(client, &store);
        assert!(runtime.autocomplete("gol").is_empty());
        assert!(runtime.statistics().is_none());
        assert!(runtime.filter_options().status.is_empty());
        Ok(())
    }
}

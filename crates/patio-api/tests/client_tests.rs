// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use patio_api::Client;
use patio_app::{FilterKey, FilterState, FilterEvent, VehicleId};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn mock_server() -> Result<(Server, String)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api", server.server_addr());
    Ok((server, addr))
}

#[test]
fn unreachable_backend_error_names_the_config_key() {
    let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(50))
        .expect("client should initialize");
    let error = client
        .health_check()
        .expect_err("health check should fail for unreachable endpoint");
    let message = format!("{error:#}");
    assert!(message.contains("[api]"), "{message}");
}

#[test]
fn fetch_vehicles_sends_filter_query_and_decodes_page() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let url = request.url().to_owned();
        let body = r#"{
            "vehicles": [
                {"id": 1, "spj": "100/2024", "status": "Apreendido", "tipo": "Moto"},
                {"id": 2, "spj": "101/2024", "status": "Apreendido", "tipo": "Carro"}
            ],
            "pagination": {"page": 1, "pages": 1, "total": 2, "per_page": 10, "has_prev": false, "has_next": false}
        }"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
        url
    });

    let mut state = FilterState::new(10);
    state.set_filter(FilterKey::Status, "Apreendido");
    state.set_type_filter(["Moto".to_owned(), "Carro".to_owned()]);
    let query = state
        .apply_filters()
        .into_iter()
        .find_map(|event| match event {
            FilterEvent::FetchRequested(query) => Some(query),
            _ => None,
        })
        .ok_or_else(|| anyhow!("apply_filters should request a fetch"))?;

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let page = client.fetch_vehicles(&query)?;
    assert_eq!(page.vehicles.len(), 2);
    assert_eq!(page.pagination.total, 2);
    assert_eq!(page.vehicles[1].field("tipo"), "Carro");

    let url = handle.join().expect("server thread should join");
    assert_eq!(
        url,
        "/api/vehicles?status=Apreendido&tipo=Carro&tipo=Moto&sort_by=data_apreensao&sort_order=desc&page=1&per_page=10"
    );
    Ok(())
}

#[test]
fn fetch_vehicles_surfaces_server_errors() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"database offline"}"#, 500))
            .expect("response should succeed");
        let request = server.recv().expect("second request expected");
        let body = r#"{"vehicles": [], "pagination": {"page": 1, "pages": 0, "total": 0}, "error": "bad filter"}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let query = patio_app::VehicleQuery::default();

    let error = client
        .fetch_vehicles(&query)
        .expect_err("500 should surface as an error");
    assert!(format!("{error:#}").contains("database offline"));

    let error = client
        .fetch_vehicles(&query)
        .expect_err("payload error should surface");
    assert!(format!("{error:#}").contains("bad filter"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_vehicle_uses_id_path() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/vehicle/42");
        request
            .respond(json_response(
                r#"{"id": 42, "placa_original": "ABC1D23", "obs1": null}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let vehicle = client.fetch_vehicle(VehicleId::new(42))?;
    assert_eq!(vehicle.id, VehicleId::new(42));
    assert_eq!(vehicle.field("placa_original"), "ABC1D23");
    assert_eq!(vehicle.field("obs1"), "");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn autocomplete_skips_short_queries_and_encodes_long_ones() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/search/autocomplete?q=gol+g");
        request
            .respond(json_response(
                r#"[{"value": "GOL G5", "type": "modelo"}, {"value": "GOL G6", "type": "modelo"}]"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?.with_min_query_length(3);
    assert!(client.autocomplete("go").is_empty());
    let suggestions = client.autocomplete(" gol g ");
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].value, "GOL G5");
    assert_eq!(suggestions[0].kind, "modelo");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn secondary_calls_degrade_to_empty_values() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        for _ in 0..3 {
            let request = server.recv().expect("request expected");
            request
                .respond(json_response("oops", 503))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert!(client.autocomplete("fiat").is_empty());
    assert_eq!(client.filter_options(), patio_app::FilterOptions::default());
    assert!(client.statistics().is_none());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn filter_options_statistics_and_health_decode() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let responses = [
            (
                "/api/filters/options",
                r#"{"status": ["Apreendido", "Liberado"], "patio": ["Central"], "circunscricao": [], "tipo": ["Moto"]}"#,
            ),
            (
                "/api/statistics",
                r#"{"total_vehicles": 12, "status_distribution": {"Apreendido": 10, "Liberado": 2}, "type_distribution": {"Moto": 12}, "recent_vehicles": 3}"#,
            ),
            (
                "/api/test",
                r#"{"status": "success", "raw_count": 12, "model_count": 12}"#,
            ),
        ];
        for (path, body) in responses {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), path);
            request
                .respond(json_response(body, 200))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let options = client.filter_options();
    assert_eq!(options.status, vec!["Apreendido", "Liberado"]);
    assert!(options.circunscricao.is_empty());

    let statistics = client
        .statistics()
        .ok_or_else(|| anyhow!("statistics should decode"))?;
    assert_eq!(statistics.total_vehicles, 12);
    assert_eq!(statistics.status_distribution.get("Liberado"), Some(&2));

    let report = client.health_check()?;
    assert_eq!(report.model_count, Some(12));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn unhealthy_backend_is_an_error() -> Result<()> {
    let (server, addr) = mock_server()?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(
                r#"{"status": "error", "error": "no such table"}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client.health_check().expect_err("unhealthy report");
    assert!(error.to_string().contains("no such table"));

    handle.join().expect("server thread should join");
    Ok(())
}

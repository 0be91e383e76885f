// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use patio_app::{
    DEFAULT_MIN_QUERY_LENGTH, FilterOptions, HealthReport, Statistics, Suggestion, Vehicle,
    VehicleId, VehiclePage, VehicleQuery,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::form_urlencoded;

/// Blocking client for the vehicle backend. Primary calls return errors;
/// secondary lookups degrade to empty values and only log.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    min_query_length: usize,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        url::Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            http,
        })
    }

    pub fn with_min_query_length(mut self, min_query_length: usize) -> Self {
        self.min_query_length = min_query_length.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn vehicles_url(&self, query: &VehicleQuery) -> String {
        format!("{}/vehicles?{}", self.base_url, query.to_query_string())
    }

    pub fn fetch_vehicles(&self, query: &VehicleQuery) -> Result<VehiclePage> {
        let url = self.vehicles_url(query);
        tracing::debug!(%url, "fetching vehicles");
        let page: VehiclePage = self.get_json(&url).context("load vehicles")?;
        if let Some(error) = page.error.as_deref().filter(|error| !error.is_empty()) {
            bail!("server reported: {error}");
        }
        tracing::debug!(
            rows = page.vehicles.len(),
            total = page.pagination.total,
            "vehicles loaded"
        );
        Ok(page)
    }

    pub fn fetch_vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        self.get_json(&format!("{}/vehicle/{id}", self.base_url))
            .with_context(|| format!("load vehicle {id}"))
    }

    /// Empty when the query is shorter than the minimum or the call fails.
    pub fn autocomplete(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < self.min_query_length {
            return Vec::new();
        }
        let encoded: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .finish();
        let url = format!("{}/search/autocomplete?{encoded}", self.base_url);
        self.get_json(&url).unwrap_or_else(|error| {
            tracing::warn!(error = %format!("{error:#}"), "autocomplete unavailable");
            Vec::new()
        })
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.get_json(&format!("{}/filters/options", self.base_url))
            .unwrap_or_else(|error| {
                tracing::warn!(error = %format!("{error:#}"), "filter options unavailable");
                FilterOptions::default()
            })
    }

    pub fn statistics(&self) -> Option<Statistics> {
        match self.get_json(&format!("{}/statistics", self.base_url)) {
            Ok(statistics) => Some(statistics),
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "statistics unavailable");
                None
            }
        }
    }

    pub fn health_check(&self) -> Result<HealthReport> {
        let report: HealthReport = self
            .get_json(&format!("{}/test", self.base_url))
            .context("backend health check")?;
        if !report.is_ok() {
            let detail = report.error.as_deref().unwrap_or("no detail");
            bail!(
                "backend at {} is unhealthy (status {:?}): {detail}",
                self.base_url,
                report.status
            );
        }
        Ok(report)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    response.json().context("decode response body")
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out -- raise [api] timeout or check the server");
    }
    anyhow!("cannot reach {base_url} -- check [api] base_url and that the server is running ({error})")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('<') && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

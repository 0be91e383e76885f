// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use patio_app::{
    DEFAULT_MAX_RECENT_SEARCHES, DEFAULT_MIN_QUERY_LENGTH, DEFAULT_PER_PAGE, PAGE_SIZE_OPTIONS,
    SearchSettings, is_allowed_page_size,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_API_TIMEOUT: &str = "5s";
const DEFAULT_SEARCH_DEBOUNCE: &str = "300ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            storage: Storage::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub per_page: Option<u32>,
    pub search_debounce: Option<String>,
    pub min_query_length: Option<usize>,
    pub max_recent_searches: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            per_page: Some(DEFAULT_PER_PAGE),
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
            min_query_length: Some(DEFAULT_MIN_QUERY_LENGTH),
            max_recent_searches: Some(DEFAULT_MAX_RECENT_SEARCHES),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PATIO_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set PATIO_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(patio_store::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [ui], [storage] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            patio_store::validate_db_path(db_path)?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(per_page) = self.ui.per_page
            && !is_allowed_page_size(per_page)
        {
            bail!(
                "ui.per_page in {} must be one of {}, got {}",
                path.display(),
                PAGE_SIZE_OPTIONS
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                per_page
            );
        }

        if let Some(debounce) = &self.ui.search_debounce {
            parse_duration(debounce)
                .with_context(|| format!("ui.search_debounce in {}", path.display()))?;
        }

        if self.ui.min_query_length == Some(0) {
            bail!(
                "ui.min_query_length in {} must be at least 1",
                path.display()
            );
        }

        if self.ui.max_recent_searches == Some(0) {
            bail!(
                "ui.max_recent_searches in {} must be at least 1",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn per_page(&self) -> u32 {
        self.ui.per_page.unwrap_or(DEFAULT_PER_PAGE)
    }

    pub fn search_settings(&self) -> Result<SearchSettings> {
        Ok(SearchSettings {
            min_query_length: self
                .ui
                .min_query_length
                .unwrap_or(DEFAULT_MIN_QUERY_LENGTH),
            debounce: parse_duration(
                self.ui
                    .search_debounce
                    .as_deref()
                    .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
            )?,
            max_recent: self
                .ui
                .max_recent_searches
                .unwrap_or(DEFAULT_MAX_RECENT_SEARCHES),
        })
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => patio_store::default_db_path(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.file {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to a writable log path")
        })?;
        Ok(data_root.join(patio_store::APP_NAME).join("patio.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# patio config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\n# One of 5, 10, 25, 50\nper_page = {}\nsearch_debounce = \"{}\"\nmin_query_length = {}\nmax_recent_searches = {}\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/patio/patio.db)\n# db_path = \"/absolute/path/to/patio.db\"\n\n[log]\n# PATIO_LOG overrides this when set\nlevel = \"{}\"\n# file = \"/absolute/path/to/patio.log\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
            DEFAULT_PER_PAGE,
            DEFAULT_SEARCH_DEBOUNCE,
            DEFAULT_MIN_QUERY_LENGTH,
            DEFAULT_MAX_RECENT_SEARCHES,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 300ms or 5s)")
}

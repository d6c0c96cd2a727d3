// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use dealdesk_app::{DealViewMode, TabKind};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "dealdesk";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_DEBOUNCE_MS: u64 = dealdesk_view::filter::DEFAULT_DEBOUNCE.as_millis() as u64;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub mock: Option<bool>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            mock: Some(false),
            timeout: Some("10s".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub debounce_ms: Option<u64>,
    pub start_tab: Option<String>,
    pub deal_view: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            debounce_ms: Some(DEFAULT_DEBOUNCE_MS),
            start_tab: Some("dashboard".to_owned()),
            deal_view: Some("board".to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DEALDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DEALDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
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
                    "config file {} is not versioned. Add `version = 1` and place values under [api] and [ui]",
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
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!("api.base_url in {} must not be empty", path.display());
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

        if let Some(tab) = &self.ui.start_tab
            && TabKind::parse(tab).is_none()
        {
            bail!(
                "ui.start_tab in {} must be one of dashboard, customers, deals, tasks, analytics; got {:?}",
                path.display(),
                tab
            );
        }

        if let Some(view) = &self.ui.deal_view
            && !matches!(view.as_str(), "board" | "list")
        {
            bail!(
                "ui.deal_view in {} must be \"board\" or \"list\", got {:?}",
                path.display(),
                view
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

    pub fn api_mock(&self) -> bool {
        self.api.mock.unwrap_or(false)
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or("10s"))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.ui.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn start_tab(&self) -> TabKind {
        self.ui
            .start_tab
            .as_deref()
            .and_then(TabKind::parse)
            .unwrap_or(TabKind::Dashboard)
    }

    pub fn deal_view(&self) -> DealViewMode {
        match self.ui.deal_view.as_deref() {
            Some("list") => DealViewMode::List,
            _ => DealViewMode::Kanban,
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# dealdesk config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\n# Run entirely against seeded in-memory data, no backend needed\nmock = false\ntimeout = \"10s\"\n\n[ui]\ndebounce_ms = {}\n# dashboard, customers, deals, tasks, or analytics\nstart_tab = \"dashboard\"\n# board or list\ndeal_view = \"board\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_DEBOUNCE_MS,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use dealdesk_app::{DealViewMode, TabKind};
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.api_base_url(), "http://localhost:8080/api");
        assert!(!config.api_mock());
        // The fallback tracks the engine's own debounce default.
        assert_eq!(config.debounce(), dealdesk_view::filter::DEFAULT_DEBOUNCE);
        assert_eq!(config.start_tab(), TabKind::Dashboard);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nmock = true\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api] and [ui]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"http://crm.internal/api/\"\nmock = true\ntimeout = \"2s\"\n[ui]\ndebounce_ms = 150\nstart_tab = \"deals\"\ndeal_view = \"list\"\n",
        )?;

        let config = Config::load(&path)?;
        // Trailing slash is trimmed so endpoint joins stay clean.
        assert_eq!(config.api_base_url(), "http://crm.internal/api");
        assert!(config.api_mock());
        assert_eq!(config.api_timeout()?, Duration::from_secs(2));
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.start_tab(), TabKind::Deals);
        assert_eq!(config.deal_view(), DealViewMode::List);
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 7\n")?;
        let error = Config::load(&path).expect_err("v7 config should fail");
        assert!(error.to_string().contains("unsupported config version 7"));
        Ok(())
    }

    #[test]
    fn empty_base_url_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[api]\nbase_url = \"  \"\n")?;
        let error = Config::load(&path).expect_err("blank base_url should fail");
        assert!(error.to_string().contains("api.base_url"));
        Ok(())
    }

    #[test]
    fn unknown_start_tab_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nstart_tab = \"kanban\"\n")?;
        let error = Config::load(&path).expect_err("bad tab should fail");
        assert!(error.to_string().contains("ui.start_tab"));
        Ok(())
    }

    #[test]
    fn unknown_deal_view_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\ndeal_view = \"cards\"\n")?;
        let error = Config::load(&path).expect_err("bad view should fail");
        assert!(error.to_string().contains("ui.deal_view"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("DEALDESK_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("DEALDESK_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("DEALDESK_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("config.toml"));
        Ok(())
    }

    #[test]
    fn parse_duration_accepts_all_suffixes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("10s")?, Duration::from_secs(10));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("fast").is_err());
        Ok(())
    }
}

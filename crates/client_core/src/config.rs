use std::{collections::HashMap, fs, time::Duration};

use shared::domain::Gateway;
use tracing::warn;

use crate::DEFAULT_PAGE_SIZE;

pub const SETTINGS_FILE: &str = "player_client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub gateway: Gateway,
    pub page_size: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://website-backend.w3champions.com/api/".into(),
            gateway: Gateway::Europe,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 15,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then `player_client.toml` in the working directory, then the environment.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    layered_settings(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn layered_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_base_url") {
                    settings.api_base_url = v.clone();
                }
                if let Some(v) = file_cfg.get("gateway") {
                    apply_gateway(&mut settings, v);
                }
                if let Some(v) = file_cfg.get("page_size") {
                    apply_page_size(&mut settings, v);
                }
                if let Some(v) = file_cfg.get("request_timeout_secs") {
                    apply_timeout(&mut settings, v);
                }
            }
            Err(err) => warn!("config: ignoring unreadable {SETTINGS_FILE}: {err}"),
        }
    }

    if let Some(v) = env("PLAYER_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("PLAYER_GATEWAY") {
        apply_gateway(&mut settings, &v);
    }
    if let Some(v) = env("APP__GATEWAY") {
        apply_gateway(&mut settings, &v);
    }

    if let Some(v) = env("PLAYER_PAGE_SIZE") {
        apply_page_size(&mut settings, &v);
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        apply_page_size(&mut settings, &v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }

    settings.api_base_url = normalize_api_base_url(&settings.api_base_url);
    settings
}

fn apply_gateway(settings: &mut Settings, raw: &str) {
    if let Some(gateway) = Gateway::parse(raw) {
        settings.gateway = gateway;
    }
}

fn apply_page_size(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<usize>() {
        if parsed > 0 {
            settings.page_size = parsed;
        }
    }
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<u64>() {
        settings.request_timeout_secs = parsed;
    }
}

/// Base URLs are joined with relative paths, so they must end in `/`.
pub fn normalize_api_base_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().api_base_url;
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    if with_scheme.ends_with('/') {
        with_scheme
    } else {
        format!("{with_scheme}/")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

//! Configuration parsing – reads a KEY=VALUE file (`tracker.conf`).
//!
//! The same file feeds the headless client and, serialised to JSON, the
//! browser bundle; each ignores fields it does not need.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::protocol::VehicleId;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ── realtime channel ─────────────────────────────────────────────
    /// Websocket endpoint pushing vehicle events.
    pub ws_url: String,
    /// Fixed delay between reconnect attempts (milliseconds).
    pub reconnect_delay_ms: u64,

    // ── HTTP side-channel ────────────────────────────────────────────
    /// Base URL for the `/api/vehicle/...` actions.
    pub api_base_url: String,
    pub http_timeout_secs: u64,

    // ── page ─────────────────────────────────────────────────────────
    /// Vehicle joined at startup and shown in the detail view.
    pub vehicle_id: Option<VehicleId>,
    /// Vehicles that have a card on the dashboard.
    pub dashboard_vehicles: Vec<VehicleId>,

    // ── notifications ────────────────────────────────────────────────
    pub notification_container: String,
    pub notify_display_ms: u64,
    pub notify_exit_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ws_url: "ws://127.0.0.1:8000/ws/tracker/".into(),
            reconnect_delay_ms: 2000,
            api_base_url: "http://127.0.0.1:8000".into(),
            http_timeout_secs: 10,
            vehicle_id: None,
            dashboard_vehicles: Vec::new(),
            notification_container: "notification-container".into(),
            notify_display_ms: 5000,
            notify_exit_ms: 500,
        }
    }
}

impl Config {
    /// Default config path.
    pub fn default_path() -> &'static str {
        "/etc/tracker/tracker.conf"
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn notify_display(&self) -> Duration {
        Duration::from_millis(self.notify_display_ms)
    }

    pub fn notify_exit(&self) -> Duration {
        Duration::from_millis(self.notify_exit_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Load a `KEY=VALUE` configuration file.
pub fn load(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config: {}", path.display()))?;

    let config = from_text(&text);
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Build a [`Config`] from file contents. Missing or unparsable values
/// fall back to [`Config::default`].
pub fn from_text(text: &str) -> Config {
    let map = parse_conf(text);
    let defaults = Config::default();

    let get = |key: &str| -> Option<String> { map.get(key).cloned() };
    let get_u64 = |key: &str, default: u64| -> u64 {
        match get(key).map(|v| v.parse::<u64>()) {
            None => default,
            Some(Ok(v)) => v,
            Some(Err(e)) => {
                warn!("{key}: {e}; using default {default}");
                default
            }
        }
    };

    let dashboard_vehicles: Vec<VehicleId> = get("DASHBOARD_VEHICLES")
        .map(|s| s.split(',').filter_map(VehicleId::parse).collect())
        .unwrap_or_default();

    Config {
        ws_url: get("WS_URL").unwrap_or(defaults.ws_url),
        reconnect_delay_ms: get_u64("RECONNECT_DELAY_MS", defaults.reconnect_delay_ms),
        api_base_url: get("API_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url),
        http_timeout_secs: get_u64("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        vehicle_id: get("VEHICLE_ID").as_deref().and_then(VehicleId::parse),
        dashboard_vehicles,
        notification_container: get("NOTIFICATION_CONTAINER")
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.notification_container),
        notify_display_ms: get_u64("NOTIFY_DISPLAY_MS", defaults.notify_display_ms),
        notify_exit_ms: get_u64("NOTIFY_EXIT_MS", defaults.notify_exit_ms),
    }
}

/// Parse `KEY=VALUE` lines into a map, stripping optional double-quotes.
fn parse_conf(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim();
            let val = val.trim().trim_matches('"');
            map.insert(key.to_string(), val.to_string());
        }
    }
    map
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conf() {
        let text = r#"
# comment
WS_URL="wss://tracker.example/ws/tracker/"
VEHICLE_ID=42
RECONNECT_DELAY_MS=250
"#;
        let map = parse_conf(text);
        assert_eq!(map["WS_URL"], "wss://tracker.example/ws/tracker/");
        assert_eq!(map["VEHICLE_ID"], "42");
        assert_eq!(map["RECONNECT_DELAY_MS"], "250");
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = from_text("");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(config.notify_display(), Duration::from_secs(5));
        assert_eq!(config.notify_exit(), Duration::from_millis(500));
        assert_eq!(config.notification_container, "notification-container");
        assert!(config.vehicle_id.is_none());
    }

    #[test]
    fn test_vehicle_lists() {
        let config = from_text(
            "VEHICLE_ID= 7 \nDASHBOARD_VEHICLES=\"7, 12,,30\"\nAPI_BASE_URL=http://h:9/\n",
        );
        assert_eq!(config.vehicle_id, VehicleId::parse("7"));
        let cards: Vec<&str> = config.dashboard_vehicles.iter().map(|v| v.as_str()).collect();
        assert_eq!(cards, ["7", "12", "30"]);
        assert_eq!(config.api_base_url, "http://h:9");
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = from_text("RECONNECT_DELAY_MS=soon\nNOTIFY_EXIT_MS=-3\n");
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(config.notify_exit_ms, 500);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("tracker_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.conf");
        std::fs::write(&path, "HTTP_TIMEOUT_SECS=3\n").unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.http_timeout(), Duration::from_secs(3));
    }
}

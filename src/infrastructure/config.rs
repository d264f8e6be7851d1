// Configuration loading - Defaults, optional file and environment overrides
use crate::application::scheduler::DEFAULT_POLL_INTERVAL;
use crate::application::telemetry_client::DEFAULT_REQUEST_TIMEOUT;
use crate::domain::component::{ComponentName, UnknownComponent};
use crate::domain::history::{GapPolicy, HISTORY_CAPACITY};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
/// Single-variable override for the backend address.
pub const BASE_URL_ENV: &str = "FLEXO_API_BASE_URL";

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub api: ApiSettings,
    pub poll: PollSettings,
    pub server: ServerSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub history_capacity: usize,
    pub gap_policy: GapPolicy,
    pub components: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub path: String,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn component_names(&self) -> Result<Vec<ComponentName>, UnknownComponent> {
        self.components.iter().map(|c| c.parse()).collect()
    }
}

fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    let components: Vec<&str> = ComponentName::ALL.iter().map(|c| c.as_str()).collect();

    config::Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)?
        .set_default("poll.interval_ms", DEFAULT_POLL_INTERVAL.as_millis() as u64)?
        .set_default("poll.history_capacity", HISTORY_CAPACITY as u64)?
        .set_default("poll.gap_policy", "carry_forward")?
        .set_default("poll.components", components)?
        .set_default("server.listen", "0.0.0.0:8080")?
        .set_default("store.path", "flexo-monitor.toml")
}

/// Defaults, then `config/monitor.toml` if present, then `FLEXO__*` variables,
/// then `FLEXO_API_BASE_URL`.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(
            config::Environment::with_prefix("FLEXO")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override_option("api.base_url", std::env::var(BASE_URL_ENV).ok())?
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Parse a TOML document layered over the defaults.
#[cfg(test)]
pub fn parse_monitor_config(toml: &str) -> anyhow::Result<MonitorConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_monitor_config("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.poll.interval(), Duration::from_millis(5000));
        assert_eq!(config.poll.history_capacity, 50);
        assert_eq!(config.poll.gap_policy, GapPolicy::CarryForward);
        assert_eq!(config.poll.component_names().unwrap(), ComponentName::ALL.to_vec());
        assert_eq!(config.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = parse_monitor_config(
            r#"
            [api]
            base_url = "http://10.0.0.5:5000/api"

            [poll]
            interval_ms = 2000
            gap_policy = "skip"
            components = ["Printing", "Slotter"]
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:5000/api");
        assert_eq!(config.api.request_timeout_ms, 10_000);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.gap_policy, GapPolicy::Skip);
        assert_eq!(
            config.poll.component_names().unwrap(),
            vec![ComponentName::Printing, ComponentName::Slotter]
        );
    }

    #[test]
    fn test_unknown_component_is_rejected() {
        let config = parse_monitor_config(
            r#"
            [poll]
            components = ["Printing", "Laminator"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.poll.component_names(),
            Err(UnknownComponent("Laminator".to_string()))
        );
    }

    #[test]
    fn test_invalid_gap_policy_fails() {
        assert!(parse_monitor_config("[poll]\ngap_policy = \"interpolate\"").is_err());
    }
}

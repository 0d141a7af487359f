use crate::app::AppError;
use crate::domain::endpoint::{DEFAULT_HTTP_PORT, Endpoint};

const DEFAULT_ESP_IP: &str = "192.168.0.145";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: Endpoint,
    pub push_interval_ms: u64,
    pub power_supply_dir: String,
    pub http_bind: String,
    pub autostart: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let esp_ip = non_empty(&lookup, "ESP_IP").unwrap_or_else(|| DEFAULT_ESP_IP.to_string());
        let esp_port = parse_or_default(&lookup, "ESP_PORT", DEFAULT_HTTP_PORT)?;
        let endpoint = Endpoint::parse(&esp_ip)
            .map_err(|error| AppError::config(format!("ESP_IP: {error}")))?
            .with_port(esp_port);

        let push_interval_ms = parse_or_default(&lookup, "PUSH_INTERVAL_MS", 2000_u64)?;
        if push_interval_ms == 0 {
            return Err(AppError::config("PUSH_INTERVAL_MS must be greater than zero"));
        }

        Ok(Self {
            endpoint,
            push_interval_ms,
            power_supply_dir: non_empty(&lookup, "POWER_SUPPLY_DIR")
                .unwrap_or_else(|| "/sys/class/power_supply/BAT0".to_string()),
            http_bind: non_empty(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            autostart: parse_bool_or_default(&lookup, "AUTOSTART", true)?,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

fn parse_bool_or_default<F>(lookup: &F, key: &str, default: bool) -> Result<bool, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(value) => match value.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!("{key} must be a boolean"))),
        },
    }
}

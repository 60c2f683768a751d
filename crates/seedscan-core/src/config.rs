use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable consulted when no config file is given.
pub const API_BASE_ENV: &str = "SEEDSCAN_API_BASE";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_mock_latency_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Artificial delay of the offline mock, so demo mode feels like a
    /// real round trip.
    #[serde(default = "default_mock_latency_ms")]
    pub mock_latency_ms: u64,
    /// Fixed seed for the mock's randomness; unset means per-process
    /// entropy.
    #[serde(default)]
    pub mock_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            mock_latency_ms: default_mock_latency_ms(),
            mock_seed: None,
        }
    }
}

/// Loads configuration from a YAML file, or falls back to defaults with
/// the `SEEDSCAN_API_BASE` environment override. `${VAR}` placeholders in
/// `api_base` resolve from the environment either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            serde_yaml::from_str::<AppConfig>(&content)
                .with_context(|| format!("failed to parse yaml file: {}", path.display()))?
        }
        None => {
            let mut config = AppConfig::default();
            if let Ok(base) = std::env::var(API_BASE_ENV) {
                if !base.is_empty() {
                    config.api_base = base;
                }
            }
            config
        }
    };

    config.api_base = resolve_env_var(&config.api_base);
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<()> {
    let url = Url::parse(&config.api_base)
        .with_context(|| format!("api_base is not a valid URL: {}", config.api_base))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("api_base must be an http(s) URL, got {}", config.api_base);
    }
    if config.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be positive");
    }
    Ok(())
}

/// Replaces each `${VAR}` with the variable's value (empty when unset).
/// An unclosed placeholder is kept verbatim.
pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some((head, tail)) = rest.split_once("${") {
        output.push_str(head);
        match tail.split_once('}') {
            Some((key, after)) => {
                output.push_str(&std::env::var(key).unwrap_or_default());
                rest = after;
            }
            None => {
                output.push_str("${");
                output.push_str(tail);
                return output;
            }
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_when_no_file_given() {
        let config = load_config(None).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.mock_latency_ms, 2000);
        assert_eq!(config.mock_seed, None);
    }

    #[test]
    fn loads_yaml_with_partial_fields() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "api_base: http://api.example.com:9000/").unwrap();
        writeln!(file, "mock_seed: 42").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.api_base, "http://api.example.com:9000/");
        assert_eq!(config.mock_seed, Some(42));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_non_http_api_base() {
        let config = AppConfig {
            api_base: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn rejects_unparseable_api_base() {
        let config = AppConfig {
            api_base: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn resolve_env_var_replaces_placeholder() {
        let expected = std::env::var("PATH").unwrap();
        assert_eq!(resolve_env_var("${PATH}"), expected);
    }

    #[test]
    fn resolve_env_var_passthrough_and_edge_cases() {
        assert_eq!(resolve_env_var("http://localhost:8000"), "http://localhost:8000");
        assert_eq!(resolve_env_var("prefix_${UNCLOSED"), "prefix_${UNCLOSED");
        assert_eq!(resolve_env_var(""), "");
        assert_eq!(
            resolve_env_var("x=${SEEDSCAN_DOES_NOT_EXIST_XYZ}"),
            "x="
        );
    }
}

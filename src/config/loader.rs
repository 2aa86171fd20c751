//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Primary environment variable naming the upstream.
pub const UPSTREAM_URL_VAR: &str = "UPSTREAM_URL";
/// Legacy name still honoured by existing deployments.
pub const UPSTREAM_URL_ALIAS: &str = "CLOUDFLARED_TUNNEL_URL";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("upstream URL is not set (expected UPSTREAM_URL)")]
    MissingUpstream,

    #[error("invalid upstream URL: {0}")]
    InvalidUpstream(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts `std::env::var` so callers (and tests) can supply
/// their own source. Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(UPSTREAM_URL_VAR).or_else(|| get(UPSTREAM_URL_ALIAS)) {
        config.upstream_url = Some(url.trim().to_string());
    }
    if let Some(host) = get("BIND_HOST") {
        config.listener.bind_host = host;
    }
    if let Some(port) = parse_var(get("PORT"), "PORT")? {
        config.listener.port = port;
    }
    if let Some(secs) = parse_var(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS")? {
        config.timeouts.request_secs = secs;
    }
    if let Some(secs) = parse_var(get("PROBE_TIMEOUT_SECS"), "PROBE_TIMEOUT_SECS")? {
        config.timeouts.probe_secs = secs;
    }
    if let Some(secs) = parse_var(get("PROBE_INTERVAL_SECS"), "PROBE_INTERVAL_SECS")? {
        config.timeouts.probe_interval_secs = secs;
    }
    if let Some(path) = get("HEALTH_PROBE_PATH") {
        config.health.probe_path = path;
    }
    if let Some(bytes) = parse_var(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES")? {
        config.limits.max_body_bytes = bytes;
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(env) = get("RELAY_ENV") {
        config.environment = env;
    }

    Ok(())
}

fn parse_var<T: FromStr>(raw: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value })
    })
    .transpose()
}

/// Build a configuration from an optional file plus a key lookup, then validate it.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from the process environment.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

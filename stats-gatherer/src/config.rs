//! # Configuration Module
//!
//! Layers the gatherer settings, lowest precedence first:
//!
//! 1. the built-in `default-config.yaml`
//! 2. an optional YAML file (`--config`)
//! 3. command line flags and environment variables ([`ConfigOverrides`])
//!
//! The merged values are validated into a [`Config`] before any request is made. `graphite_url` has no default, a run
//! without it is a configuration error.

use crate::{
    collectors::WalkSettings,
    error::{
        GatherError,
        Result,
    },
};
use serde::Deserialize;
use std::{
    path::Path,
    time::Duration,
};
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

/// Values given on the command line (or through their environment variables). `None` keeps the layer below.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub graphite_url: Option<String>,
    pub root_prefix: Option<String>,
    pub metrics_dir: Option<String>,
    pub lookback: Option<String>,
    pub request_timeout: Option<String>,
    pub max_concurrent_requests: Option<u64>,
}

/// Merged but unvalidated settings
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    graphite_url: Option<String>,
    root_prefix: String,
    metrics_dir: String,
    lookback: String,
    request_timeout: String,
    max_concurrent_requests: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub graphite_url: Url,
    /// Graphite path whose children are the servers
    pub root_prefix: String,
    /// Path segment between a server and its metrics
    pub metrics_dir: String,
    pub lookback: Duration,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl Config {
    pub fn load(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }

        let raw = builder
            .set_override_option("graphite_url", overrides.graphite_url)
            .and_then(|b| b.set_override_option("root_prefix", overrides.root_prefix))
            .and_then(|b| b.set_override_option("metrics_dir", overrides.metrics_dir))
            .and_then(|b| b.set_override_option("lookback", overrides.lookback))
            .and_then(|b| b.set_override_option("request_timeout", overrides.request_timeout))
            .and_then(|b| b.set_override_option("max_concurrent_requests", overrides.max_concurrent_requests))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize::<RawConfig>())
            .map_err(|e| GatherError::Configuration(e.to_string()))?;

        Self::try_from(raw)
    }

    pub fn walk_settings(&self) -> WalkSettings {
        WalkSettings {
            root_prefix: self.root_prefix.clone(),
            lookback: self.lookback,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = GatherError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let graphite_url = match raw.graphite_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Url::parse(url)
                .map_err(|e| GatherError::Configuration(format!("invalid graphite_url '{url}': {e}")))?,
            _ => {
                return Err(GatherError::Configuration(
                    "graphite_url is not set (use --graphite-url or GRAPHITE_URL)".to_string(),
                ))
            }
        };
        if graphite_url.cannot_be_a_base() {
            return Err(GatherError::Configuration(format!(
                "graphite_url '{graphite_url}' is not a base URL"
            )));
        }

        let lookback = parse_duration("lookback", &raw.lookback)?;
        // Graphite offsets have whole-second resolution.
        if lookback.as_secs() == 0 || lookback.subsec_nanos() != 0 {
            return Err(GatherError::Configuration(format!(
                "lookback '{}' must be a whole number of seconds, at least 1s",
                raw.lookback
            )));
        }
        let request_timeout = parse_duration("request_timeout", &raw.request_timeout)?;

        if raw.max_concurrent_requests == 0 {
            return Err(GatherError::Configuration(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            graphite_url,
            root_prefix: raw.root_prefix,
            metrics_dir: raw.metrics_dir,
            lookback,
            request_timeout,
            max_concurrent_requests: raw.max_concurrent_requests,
        })
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| GatherError::Configuration(format!("invalid {key} '{value}': {e}")))
}

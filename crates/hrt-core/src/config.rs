use anyhow::Result;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::retry::backoff::{Constant, Exponential, ExponentialJitter, Linear, LinearJitter};
use crate::retry::classify::{self, AnyError, ServerErrorOrWorse, TransientFailure};
use crate::retry::RetryOptions;
use crate::sender::CurlOptions;

/// Rejected values in an otherwise well-formed config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid HTTP method {0:?} in [retry] methods")]
    InvalidMethod(String),
    #[error("invalid backoff factor {0} (must be finite and positive)")]
    InvalidFactor(f64),
}

/// Which built-in classifier to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    AnyError,
    ServerError,
    #[serde(rename = "error-or-5xx")]
    ErrorOr5xx,
    Transient,
}

/// Backoff curve, tagged by `kind`. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackoffConfig {
    Constant { delay_ms: u64 },
    Linear { step_ms: u64, max_ms: u64 },
    LinearJitter { step_ms: u64, max_ms: u64 },
    Exponential { min_ms: u64, max_ms: u64, factor: f64 },
    ExponentialJitter { min_ms: u64, max_ms: u64, factor: f64 },
}

/// Retry policy overrides (optional section in config.toml).
/// Anything left out falls back to the library defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Total time budget per call in seconds (0 = library default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_secs: Option<u64>,
    /// HTTP methods that may be retried, e.g. `["GET", "PUT"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff: Option<BackoffConfig>,
}

impl RetryConfig {
    /// Convert into typed options for a transport.
    pub fn to_options(&self) -> Result<RetryOptions, ConfigError> {
        let mut opts = RetryOptions::new();
        if let Some(n) = self.max_attempts {
            opts = opts.times(n);
        }
        if let Some(secs) = self.max_duration_secs {
            opts = opts.max_duration(Duration::from_secs(secs));
        }
        if let Some(names) = &self.methods {
            let methods = names
                .iter()
                .map(|name| parse_method(name))
                .collect::<Result<Vec<_>, _>>()?;
            opts = opts.methods(methods);
        }
        opts = match self.classifier {
            Some(ClassifierKind::AnyError) => opts.classifier(AnyError),
            Some(ClassifierKind::ServerError) => opts.classifier(ServerErrorOrWorse),
            Some(ClassifierKind::ErrorOr5xx) => opts.classifier(classify::error_or_5xx()),
            Some(ClassifierKind::Transient) => opts.classifier(TransientFailure),
            None => opts,
        };
        opts = match self.backoff {
            Some(ref b) => apply_backoff(opts, b)?,
            None => opts,
        };
        Ok(opts)
    }
}

fn parse_method(name: &str) -> Result<Method, ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidMethod(name.to_string()));
    }
    Method::from_str(&trimmed.to_ascii_uppercase())
        .map_err(|_| ConfigError::InvalidMethod(name.to_string()))
}

fn check_factor(factor: f64) -> Result<f64, ConfigError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(ConfigError::InvalidFactor(factor))
    }
}

fn apply_backoff(opts: RetryOptions, cfg: &BackoffConfig) -> Result<RetryOptions, ConfigError> {
    let ms = Duration::from_millis;
    Ok(match *cfg {
        BackoffConfig::Constant { delay_ms } => opts.backoff(Constant(ms(delay_ms))),
        BackoffConfig::Linear { step_ms, max_ms } => {
            opts.backoff(Linear::new(ms(step_ms), ms(max_ms)))
        }
        BackoffConfig::LinearJitter { step_ms, max_ms } => {
            opts.backoff(LinearJitter::new(ms(step_ms), ms(max_ms)))
        }
        BackoffConfig::Exponential {
            min_ms,
            max_ms,
            factor,
        } => opts.backoff(Exponential::new(ms(min_ms), ms(max_ms), check_factor(factor)?)),
        BackoffConfig::ExponentialJitter {
            min_ms,
            max_ms,
            factor,
        } => opts.backoff(ExponentialJitter::new(
            ms(min_ms),
            ms(max_ms),
            check_factor(factor)?,
        )),
    })
}

/// Global configuration loaded from `~/.config/hrt/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrtConfig {
    /// Connection phase timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Timeout for a whole exchange in seconds.
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl Default for HrtConfig {
    fn default() -> Self {
        let curl = CurlOptions::default();
        Self {
            connect_timeout_secs: curl.connect_timeout.as_secs(),
            timeout_secs: curl.timeout.as_secs(),
            follow_redirects: curl.follow_redirects,
            retry: None,
        }
    }
}

impl HrtConfig {
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            follow_redirects: self.follow_redirects,
            ..CurlOptions::default()
        }
    }

    /// Retry options from the `[retry]` section, or empty options (all defaults).
    pub fn retry_options(&self) -> Result<RetryOptions, ConfigError> {
        match &self.retry {
            Some(r) => r.to_options(),
            None => Ok(RetryOptions::new()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hrt")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HrtConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<HrtConfig> {
    if !path.exists() {
        let default_cfg = HrtConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: HrtConfig = toml::from_str(&data)?;
    Ok(cfg)
}

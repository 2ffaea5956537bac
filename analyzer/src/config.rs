//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or
//! `ANALYZER_CONFIG` environment variable. A missing file is not an error: every field has a
//! default.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ANALYZER_` override YAML values
//! 3. **ALLOWED_ORIGINS** - Special case: a comma-separated list that replaces
//!    `cors.allowed_origins` if set and not blank
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ANALYZER_LIMITS__MAX_UPLOAD_SIZE=1048576` sets the `limits.max_upload_size` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! ANALYZER_PORT=8080
//!
//! # Allow two frontends
//! ALLOWED_ORIGINS="https://app.example.com,http://localhost:3000"
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

use crate::errors::Error;

/// Environment variable holding the comma-separated CORS allow-list
pub static ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ANALYZER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded once at startup and treated as immutable afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Cross-origin policy for browser clients
    pub cors: CorsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size in bytes of an `/analyze` request body, all files included
    pub max_upload_size: usize,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

impl CorsOrigin {
    /// The value browsers send in the `Origin` header: scheme, host and port, no trailing slash.
    pub fn header_value(&self) -> String {
        match self {
            CorsOrigin::Wildcard => "*".to_string(),
            CorsOrigin::Url(url) => url.origin().ascii_serialization(),
        }
    }
}

impl FromStr for CorsOrigin {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            Ok(CorsOrigin::Wildcard)
        } else {
            Url::parse(s).map(CorsOrigin::Url)
        }
    }
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Parse a comma-separated origin list; blank entries are skipped.
pub fn parse_origin_list(value: &str) -> Result<Vec<CorsOrigin>, Error> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            origin.parse::<CorsOrigin>().map_err(|e| Error::InvalidConfig {
                message: format!("{ALLOWED_ORIGINS_ENV} entry '{origin}' is not a valid origin: {e}"),
            })
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                CorsOrigin::Url(Url::parse("http://localhost:3000").expect("static origin is a valid URL")), // Development frontend
            ],
            allow_credentials: true,
            max_age: Some(600),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // The allow-list env var is a plain comma-separated string, which figment would read as a
        // single value. A blank list counts as unset.
        if let Ok(origins) = std::env::var(ALLOWED_ORIGINS_ENV) {
            let origins = parse_origin_list(&origins).map_err(|e| figment::Error::from(e.to_string()))?;
            if !origins.is_empty() {
                config.cors.allowed_origins = origins;
            }
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::InvalidConfig {
                message: "CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::InvalidConfig {
                message: "CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins.".to_string(),
            });
        }

        if self.limits.max_upload_size == 0 {
            return Err(Error::InvalidConfig {
                message: "limits.max_upload_size cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values; ANALYZER_CONFIG names the
            // file itself
            .merge(Env::prefixed("ANALYZER_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

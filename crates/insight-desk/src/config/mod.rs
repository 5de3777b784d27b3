use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use url::Url;

use crate::workflows::editorial::placeholders::{MapAvailability, ScanOptions};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub review: ReviewConfig,
    pub maps: MapAvailability,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let storage = StorageConfig {
            drafts_dir: PathBuf::from(var_or("INSIGHTS_DRAFTS_DIR", "src/content/insights/drafts")),
            published_dir: PathBuf::from(var_or(
                "INSIGHTS_PUBLISHED_DIR",
                "src/content/insights/published",
            )),
            registry_path: PathBuf::from(var_or(
                "INSIGHTS_REGISTRY_PATH",
                "src/lib/insights/registry.json",
            )),
        };

        let raw_base = var_or("INSIGHTS_BASE_URL", "http://localhost:3000");
        let base_url = Url::parse(&raw_base).map_err(|source| ConfigError::InvalidBaseUrl {
            value: raw_base.clone(),
            source,
        })?;

        let review = ReviewConfig {
            base_url,
            resend_api_key: env::var("RESEND_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            review_email: var_or("REVIEW_EMAIL", "editor@localhost"),
            review_sender: var_or("REVIEW_SENDER", "Insight Desk <noreply@localhost>"),
        };

        let maps = match env::var("MAPBOX_TOKEN") {
            Ok(token) if !token.trim().is_empty() => MapAvailability::Configured,
            _ => MapAvailability::Unconfigured,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage,
            review,
            maps,
        })
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::with_maps(self.maps)
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of draft records, published snapshots and the registry.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub drafts_dir: PathBuf,
    pub published_dir: PathBuf,
    pub registry_path: PathBuf,
}

/// Reviewer notification settings.
#[derive(Clone)]
pub struct ReviewConfig {
    pub base_url: Url,
    pub resend_api_key: Option<String>,
    pub review_email: String,
    pub review_sender: String,
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("base_url", &self.base_url.as_str())
            .field("resend_configured", &self.resend_api_key.is_some())
            .field("review_email", &self.review_email)
            .field("review_sender", &self.review_sender)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBaseUrl { value: String, source: url::ParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl { value, .. } => {
                write!(f, "INSIGHTS_BASE_URL '{value}' is not an absolute URL")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidBaseUrl { source, .. } => Some(source),
        }
    }
}

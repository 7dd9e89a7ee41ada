use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the telemetry section in `app.toml`.
pub const SECTION_NAME: &str = "OpenTelemetry";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "OpenTelemetry")]
    open_telemetry: Option<OpenTelemetryOptions>,
}

/// Required OTLP export settings. There are no defaults: a missing or blank
/// value would silently misroute telemetry, so every field must be present.
#[derive(Clone, Debug, Deserialize)]
pub struct OpenTelemetryOptions {
    #[serde(rename = "OtlpEndpoint", default)]
    pub otlp_endpoint: String,
    #[serde(rename = "ServiceName", default)]
    pub service_name: String,
    #[serde(rename = "ServiceVersion", default)]
    pub service_version: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("configuration section '{SECTION_NAME}' is missing")]
    MissingSection,
    #[error("required configuration values are missing or blank: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl AppConfig {
    /// Reads, parses and validates the configuration file. Any failure is
    /// fatal at startup; the caller must not bind a socket on error.
    pub fn load(path: &Path) -> Result<OpenTelemetryOptions, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<OpenTelemetryOptions, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        let options = config.open_telemetry.ok_or(ConfigError::MissingSection)?;
        options.validate()?;
        Ok(options)
    }
}

impl OpenTelemetryOptions {
    /// Collects every missing or whitespace-only field so a single error names
    /// all of them, rather than failing on the first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.otlp_endpoint.trim().is_empty() {
            missing.push("OpenTelemetry:OtlpEndpoint");
        }
        if self.service_name.trim().is_empty() {
            missing.push("OpenTelemetry:ServiceName");
        }
        if self.service_version.trim().is_empty() {
            missing.push("OpenTelemetry:ServiceVersion");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields(missing))
        }
    }
}

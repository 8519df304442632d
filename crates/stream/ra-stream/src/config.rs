//! Stream factory configuration.

use ra_error::{RaError, Result};
use ra_logical::LogicalIoConfig;
use ra_physical::PhysicalIoConfig;
use ra_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration bundle for a [`crate::SeekableStreamFactory`].
///
/// Every section and field is optional when deserialized; missing values
/// take their defaults.
///
/// ```
/// use ra_stream::StreamConfig;
///
/// let config = StreamConfig::from_json(r#"{
///     "physical": { "max_range_size": 4194304 },
///     "logical": { "sequential_patterns": ["*.log"] }
/// }"#).unwrap();
///
/// assert_eq!(config.physical.max_range_size, 4 * 1024 * 1024);
/// assert!(config.logical.format_specific_io);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Range splitting.
    pub physical: PhysicalIoConfig,

    /// Format detection and prefetching.
    pub logical: LogicalIoConfig,

    /// Metrics export.
    pub telemetry: TelemetryConfig,
}

impl StreamConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_physical(mut self, physical: PhysicalIoConfig) -> Self {
        self.physical = physical;
        self
    }

    pub fn with_logical(mut self, logical: LogicalIoConfig) -> Self {
        self.logical = logical;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RaError::Config(format!("Invalid stream configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            RaError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.physical.validate()?;
        self.logical.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

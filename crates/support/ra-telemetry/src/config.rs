//! Telemetry configuration.

use ra_error::{RaError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for metrics collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Record metrics. When false, operations are only logged.
    pub enabled: bool,

    /// Service name for metrics attribution.
    pub service_name: String,

    /// OTLP endpoint for exporting metrics (optional).
    /// If not set, metrics go to the global meter provider, if any.
    pub otlp_endpoint: Option<String>,

    /// Export interval in seconds.
    pub export_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "read-accelerator".to_string(),
            otlp_endpoint: None,
            export_interval_secs: 10,
        }
    }
}

impl TelemetryConfig {
    /// Create a new telemetry configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable metrics.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the service name.
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the OTLP endpoint for metric export.
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Set the export interval in seconds.
    pub fn with_export_interval(mut self, interval_secs: u64) -> Self {
        self.export_interval_secs = interval_secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.export_interval_secs == 0 {
            return Err(RaError::Config(
                "export_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.service_name.is_empty() {
            return Err(RaError::Config("service_name must not be empty".to_string()));
        }
        Ok(())
    }
}

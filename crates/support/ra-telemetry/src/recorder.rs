//! Scoped operation recorder.

use crate::{Operation, TelemetryConfig};
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{MeterProviderBuilder, PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::runtime;
use ra_error::{RaError, Result, classify_error};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Handle used by every layer to record operations.
///
/// Cloning is cheap; all clones share the same instruments.
#[derive(Clone, Default)]
pub struct Telemetry {
    instruments: Option<Arc<Instruments>>,
}

struct Instruments {
    /// Common attributes for all metrics.
    common_attributes: Vec<KeyValue>,

    /// Counter for completed operations.
    operations: Counter<u64>,

    /// Histogram for operation duration in milliseconds.
    operation_duration_ms: Histogram<f64>,

    /// Counter for bytes fetched from the transport.
    bytes_fetched: Counter<u64>,

    /// Meter provider (kept alive for the duration of metrics collection).
    meter_provider: Option<SdkMeterProvider>,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Telemetry {
    /// Create a telemetry handle from configuration.
    ///
    /// With metrics disabled this is equivalent to [`Telemetry::noop`]. If an
    /// OTLP endpoint is configured, metrics are exported periodically.
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        config.validate()?;
        if !config.enabled {
            debug!("Metrics disabled, operations will only be logged");
            return Ok(Self::noop());
        }

        info!(
            service_name = %config.service_name,
            otlp_endpoint = ?config.otlp_endpoint,
            "Initializing telemetry"
        );

        let meter_provider = if let Some(endpoint) = &config.otlp_endpoint {
            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| {
                    RaError::Config(format!("Failed to build OTLP exporter for '{}': {}", endpoint, e))
                })?;

            let reader = PeriodicReader::builder(exporter, runtime::Tokio)
                .with_interval(Duration::from_secs(config.export_interval_secs))
                .build();

            let provider = MeterProviderBuilder::default()
                .with_resource(Resource::new(vec![KeyValue::new(
                    "service.name",
                    config.service_name.clone(),
                )]))
                .with_reader(reader)
                .build();

            global::set_meter_provider(provider.clone());

            Some(provider)
        } else {
            debug!("No OTLP endpoint configured, using the global meter provider");
            None
        };

        let meter = global::meter("read-accelerator");

        let operations = meter
            .u64_counter("readaccel.operation.count")
            .with_description("Completed operations by name and outcome")
            .with_unit("operations")
            .build();

        let operation_duration_ms = meter
            .f64_histogram("readaccel.operation.duration")
            .with_description("Operation duration in milliseconds")
            .with_unit("ms")
            .build();

        let bytes_fetched = meter
            .u64_counter("readaccel.bytes.fetched")
            .with_description("Bytes fetched from the object store")
            .with_unit("bytes")
            .build();

        Ok(Self {
            instruments: Some(Arc::new(Instruments {
                common_attributes: vec![KeyValue::new("service", config.service_name)],
                operations,
                operation_duration_ms,
                bytes_fetched,
                meter_provider,
            })),
        })
    }

    /// A handle that records nothing.
    pub fn noop() -> Self {
        Self { instruments: None }
    }

    /// Whether metrics are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.instruments.is_some()
    }

    /// Run `future` as `operation`, recording start, outcome and duration.
    ///
    /// The future's result, success or failure, is returned unchanged.
    pub async fn measure<T, F>(&self, operation: Operation, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        trace!(operation = %operation, "Operation started");
        let start = Instant::now();

        let result = future.await;

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => debug!(operation = %operation, duration_ms, "Operation succeeded"),
            Err(e) => debug!(
                operation = %operation,
                duration_ms,
                error = %e,
                "Operation failed"
            ),
        }

        if let Some(instruments) = &self.instruments {
            let mut attributes = instruments.common_attributes.clone();
            attributes.push(KeyValue::new("operation", operation.name()));
            match &result {
                Ok(_) => attributes.push(KeyValue::new("outcome", "success")),
                Err(e) => {
                    attributes.push(KeyValue::new("outcome", "failure"));
                    attributes.push(KeyValue::new("error.kind", e.root_cause().kind()));
                    attributes.push(KeyValue::new(
                        "error.category",
                        classify_error(e).to_string(),
                    ));
                }
            }
            instruments.operations.add(1, &attributes);
            instruments
                .operation_duration_ms
                .record(duration_ms, &attributes);
        }

        result
    }

    /// Record bytes fetched from the transport.
    pub fn record_bytes_fetched(&self, bytes: u64) {
        if let Some(instruments) = &self.instruments {
            instruments
                .bytes_fetched
                .add(bytes, &instruments.common_attributes);
        }
    }

    /// Flush pending exports and stop the meter provider, if this handle owns one.
    pub fn shutdown(&self) {
        if let Some(provider) = self
            .instruments
            .as_ref()
            .and_then(|i| i.meter_provider.as_ref())
        {
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "Error shutting down meter provider");
            }
            info!("Telemetry shutdown complete");
        }
    }
}

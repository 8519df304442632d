//! ra-telemetry - Operation telemetry for the read accelerator.
//!
//! Every cache-miss fetch and prefetch task runs inside
//! [`Telemetry::measure`], which logs the operation, records its duration
//! and outcome as OpenTelemetry metrics, and hands back the wrapped result
//! untouched. A [`Telemetry::noop`] handle skips the metrics but behaves the
//! same otherwise.
//!
//! # Example
//!
//! ```ignore
//! use ra_telemetry::{Operation, Telemetry, TelemetryConfig, names};
//!
//! let telemetry = Telemetry::new(TelemetryConfig::new().with_enabled(true))?;
//! let bytes = telemetry
//!     .measure(
//!         Operation::new(names::BLOCK_GET).with_attribute("range", "0-1023"),
//!         client.get_object_range(&uri, range),
//!     )
//!     .await?;
//! ```

pub mod config;
pub mod logging;
pub mod operation;
mod recorder;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use operation::{Operation, names};
pub use recorder::Telemetry;

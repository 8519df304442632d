//! Configuration for the logical I/O layer.

use glob::Pattern;
use ra_error::{RaError, Result};
use ra_types::ONE_MB;
use serde::{Deserialize, Serialize};

/// Default size of the tail fetched on parquet open (1MB).
pub const DEFAULT_FOOTER_CACHING_SIZE: u64 = ONE_MB;

/// Objects up to this size are fetched whole on parquet open (3MB).
pub const DEFAULT_SMALL_OBJECT_SIZE_THRESHOLD: u64 = 3 * ONE_MB;

/// Default number of objects with parsed column metadata kept per factory.
pub const DEFAULT_COLUMN_PREFETCH_STORE_CAPACITY: usize = 45;

/// Default first read-ahead window for sequential objects (2MB).
pub const DEFAULT_SEQUENTIAL_PREFETCH_BASE: u64 = 2 * ONE_MB;

/// Default largest read-ahead window for sequential objects (16MB).
pub const DEFAULT_SEQUENTIAL_PREFETCH_MAX: u64 = 16 * ONE_MB;

/// Configuration for logical I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalIoConfig {
    /// Enable format-aware strategies. When off every object is read plainly.
    pub format_specific_io: bool,

    /// Glob patterns (matched against the file name) identifying parquet objects.
    pub parquet_patterns: Vec<String>,

    /// Glob patterns identifying objects read front to back.
    pub sequential_patterns: Vec<String>,

    /// Prefetch the object tail when a parquet stream is opened.
    pub footer_caching_enabled: bool,

    /// Size of the tail prefetched on open.
    pub footer_caching_size: u64,

    /// Prefetch small parquet objects whole on open.
    pub small_object_prefetching_enabled: bool,

    /// Largest object considered small.
    pub small_object_size_threshold: u64,

    /// Objects with parsed column metadata kept at once.
    pub column_prefetch_store_capacity: usize,

    /// Prefetch the rest of a column chunk after a partial read into it.
    pub remaining_column_prefetch_enabled: bool,

    /// First read-ahead window for sequential objects.
    pub sequential_prefetch_base: u64,

    /// Largest read-ahead window for sequential objects.
    pub sequential_prefetch_max: u64,
}

impl Default for LogicalIoConfig {
    fn default() -> Self {
        Self {
            format_specific_io: true,
            parquet_patterns: vec!["*.parquet".to_string(), "*.par".to_string()],
            sequential_patterns: vec![
                "*.csv".to_string(),
                "*.json".to_string(),
                "*.ndjson".to_string(),
                "*.jsonl".to_string(),
                "*.txt".to_string(),
            ],
            footer_caching_enabled: true,
            footer_caching_size: DEFAULT_FOOTER_CACHING_SIZE,
            small_object_prefetching_enabled: true,
            small_object_size_threshold: DEFAULT_SMALL_OBJECT_SIZE_THRESHOLD,
            column_prefetch_store_capacity: DEFAULT_COLUMN_PREFETCH_STORE_CAPACITY,
            remaining_column_prefetch_enabled: true,
            sequential_prefetch_base: DEFAULT_SEQUENTIAL_PREFETCH_BASE,
            sequential_prefetch_max: DEFAULT_SEQUENTIAL_PREFETCH_MAX,
        }
    }
}

impl LogicalIoConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable format-aware strategies.
    pub fn with_format_specific_io(mut self, enabled: bool) -> Self {
        self.format_specific_io = enabled;
        self
    }

    /// Replace the parquet patterns.
    pub fn with_parquet_patterns(mut self, patterns: Vec<String>) -> Self {
        self.parquet_patterns = patterns;
        self
    }

    /// Replace the sequential patterns.
    pub fn with_sequential_patterns(mut self, patterns: Vec<String>) -> Self {
        self.sequential_patterns = patterns;
        self
    }

    /// Configure tail prefetch on parquet open.
    pub fn with_footer_caching(mut self, enabled: bool, size: u64) -> Self {
        self.footer_caching_enabled = enabled;
        self.footer_caching_size = size;
        self
    }

    /// Configure whole-object prefetch for small parquet objects.
    pub fn with_small_object_prefetching(mut self, enabled: bool, threshold: u64) -> Self {
        self.small_object_prefetching_enabled = enabled;
        self.small_object_size_threshold = threshold;
        self
    }

    /// Set the column prefetch store capacity.
    pub fn with_column_prefetch_store_capacity(mut self, capacity: usize) -> Self {
        self.column_prefetch_store_capacity = capacity;
        self
    }

    /// Enable or disable remaining column prefetch.
    pub fn with_remaining_column_prefetch(mut self, enabled: bool) -> Self {
        self.remaining_column_prefetch_enabled = enabled;
        self
    }

    /// Set the sequential read-ahead window bounds.
    pub fn with_sequential_prefetch(mut self, base: u64, max: u64) -> Self {
        self.sequential_prefetch_base = base;
        self.sequential_prefetch_max = max;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.footer_caching_size == 0 {
            return Err(RaError::Config(
                "footer_caching_size must be at least 1".to_string(),
            ));
        }
        if self.column_prefetch_store_capacity == 0 {
            return Err(RaError::Config(
                "column_prefetch_store_capacity must be at least 1".to_string(),
            ));
        }
        if self.sequential_prefetch_base == 0 {
            return Err(RaError::Config(
                "sequential_prefetch_base must be at least 1".to_string(),
            ));
        }
        if self.sequential_prefetch_max < self.sequential_prefetch_base {
            return Err(RaError::Config(format!(
                "sequential_prefetch_max ({}) must not be less than sequential_prefetch_base ({})",
                self.sequential_prefetch_max, self.sequential_prefetch_base
            )));
        }
        for pattern in self.parquet_patterns.iter().chain(&self.sequential_patterns) {
            compile(pattern)?;
        }
        Ok(())
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| RaError::Config(format!("Invalid glob pattern '{pattern}': {e}")))
}

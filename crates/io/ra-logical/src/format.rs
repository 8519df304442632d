//! Object format classification.

use crate::LogicalIoConfig;
use crate::config::compile;
use glob::{MatchOptions, Pattern};
use ra_error::Result;
use ra_types::{ObjectFormat, ObjectUri, ReadPolicy};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Chooses the read strategy for an object from its key and the caller's hint.
///
/// Patterns are compiled once; [`FormatSelector::classify`] is a pure function
/// of its inputs. Patterns are matched case-insensitively against the file
/// name, so `*.parquet` matches `warehouse/sales/part-0.PARQUET`.
#[derive(Debug, Clone)]
pub struct FormatSelector {
    enabled: bool,
    parquet: Vec<Pattern>,
    sequential: Vec<Pattern>,
}

impl FormatSelector {
    /// Compile the configured patterns.
    ///
    /// # Returns
    ///
    /// Returns a config error if any pattern is invalid.
    pub fn new(config: &LogicalIoConfig) -> Result<Self> {
        Ok(Self {
            enabled: config.format_specific_io,
            parquet: config
                .parquet_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_>>()?,
            sequential: config
                .sequential_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_>>()?,
        })
    }

    /// Classify `uri`.
    ///
    /// A sequential hint or key wins over parquet detection.
    pub fn classify(&self, uri: &ObjectUri, policy: Option<ReadPolicy>) -> ObjectFormat {
        if !self.enabled {
            return ObjectFormat::Default;
        }

        let name = uri.file_name();
        if policy == Some(ReadPolicy::Sequential) || matches_any(&self.sequential, name) {
            ObjectFormat::Sequential
        } else if matches_any(&self.parquet, name) {
            ObjectFormat::ColumnarParquet
        } else {
            ObjectFormat::Default
        }
    }
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(name, MATCH_OPTIONS))
}

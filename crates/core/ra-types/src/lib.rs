//! Core types for the read accelerator.
//!
//! This crate provides the value types shared by every layer:
//! - [`ObjectUri`] - Identity of a remote immutable object
//! - [`Range`] - Inclusive byte interval within an object
//! - [`IoPlan`] - Ordered set of ranges fetched together
//! - [`ObjectMetadata`] - Cached facts about an object
//! - [`ObjectFormat`], [`ReadPolicy`], [`OpenOptions`] - Stream open inputs

pub mod format;
pub mod metadata;
pub mod plan;
pub mod range;
pub mod uri;

pub use format::*;
pub use metadata::*;
pub use plan::*;
pub use range::*;
pub use uri::*;

/// One kibibyte.
pub const ONE_KB: u64 = 1024;

/// One mebibyte.
pub const ONE_MB: u64 = 1024 * ONE_KB;

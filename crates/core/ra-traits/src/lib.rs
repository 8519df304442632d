//! Collaborator traits for the read accelerator.
//!
//! - [`ObjectClient`] - Transport that performs HEAD and ranged GET calls

pub mod client;

pub use client::*;

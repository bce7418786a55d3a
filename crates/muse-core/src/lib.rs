//! Muse Core - Foundational types for the Muse asset pipeline
//!
//! This crate provides the types that the pipeline and CLI crates depend on:
//! - `MuseError` and the `Result` alias
//! - Canonical asset naming and ordinal extraction
//! - ISO 8601 timestamp helper

mod error;
mod naming;
mod time;

pub use error::{MuseError, Result};
pub use naming::{extract_ordinal, make_name, slugify};
pub use time::now_iso8601;

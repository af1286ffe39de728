//! Error types for Trellis operations.
//!
//! This module provides the main error type [`LayoutError`] which wraps
//! the error conditions that can surface at the crate boundary.

use thiserror::Error;

/// The main error type for Trellis operations.
///
/// Configuration errors are raised eagerly by the config setters, before any
/// layout runs. Graph errors are raised while a host collection is being
/// assembled. Topological oddities in otherwise well-formed input (empty
/// collections, dangling links, degenerate rectangles) are not errors; the
/// engines absorb them and produce a best-effort layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(String),
}

impl LayoutError {
    /// Create a `Config` error for a rejected property value.
    pub fn new_config_error(property: &str, detail: impl std::fmt::Display) -> Self {
        Self::Config(format!("{property}: {detail}"))
    }
}

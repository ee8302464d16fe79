//! Errors raised at the fallible edges of the simulation API.
//!
//! The per-tick path never fails: bad cell values are reset and failed
//! searches are retried next tick. Only configuration and externally supplied
//! buffers are validated here.

use thiserror::Error;

/// Errors emitted when configuring or feeding the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// An external height override whose size does not match the grid.
    #[error("height override has {actual} cells, expected {expected}")]
    OverrideSize { expected: usize, actual: usize },

    /// A land array whose length is not `resolution * resolution`.
    #[error("land data has {actual} cells, expected {expected}")]
    LandSize { expected: usize, actual: usize },

    /// Reading or writing a config file failed.
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be parsed or written as JSON.
    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

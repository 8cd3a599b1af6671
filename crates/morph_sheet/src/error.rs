//! Error types for morph_sheet
//!
//! Gestures and animations never fail: cancellation and no-op guards are
//! absorbed into animation state. Only building a sheet and loading its
//! configuration can go wrong.

use thiserror::Error;

/// Errors raised while configuring or constructing a sheet
#[derive(Error, Debug)]
pub enum SheetError {
    /// The configuration could not be parsed or failed validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sheet was created outside a tokio runtime
    #[error("no tokio runtime available to drive animations")]
    NoRuntime,

    /// Layout geometry that no sheet can be built from
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl From<toml::de::Error> for SheetError {
    fn from(err: toml::de::Error) -> Self {
        SheetError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SheetError {
    fn from(err: toml::ser::Error) -> Self {
        SheetError::Config(err.to_string())
    }
}

/// Result type for sheet operations
pub type Result<T> = std::result::Result<T, SheetError>;

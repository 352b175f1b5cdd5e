//! # Coordinator Error Types
//!
//! Two recoverability classes:
//!
//! - [`ConfigError`]: rejected before use, aborts startup.
//! - [`DomainError`]: a single bad coordinate, the caller discards the
//!   offending input event and carries on.
//!
//! Programmer errors (duplicate layer registration, scheduling an
//! unregistered layer) are not represented here: they panic.

use std::fmt;

use thiserror::Error;

/// Errors raised while building or loading configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A size was zero, negative or not finite.
    #[error("{field} must be finite and strictly positive, got {width}x{height}")]
    NonPositiveSize {
        /// Which size was rejected.
        field: &'static str,
        /// Rejected width.
        width: f64,
        /// Rejected height.
        height: f64,
    },

    /// A scalar was zero, negative or not finite.
    #[error("{field} must be finite and strictly positive, got {value}")]
    NonPositiveValue {
        /// Which value was rejected.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A value that may be negative was NaN or infinite.
    #[error("{field} must be finite")]
    NonFinite {
        /// Which value was rejected.
        field: &'static str,
    },

    /// The puzzle grid has no cells.
    #[error("grid must have at least one column and one row, got {cols}x{rows}")]
    EmptyGrid {
        /// Requested columns.
        cols: u32,
        /// Requested rows.
        rows: u32,
    },

    /// A threshold or limit is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {reason}")]
    Io {
        /// File that failed.
        path: String,
        /// OS error text.
        reason: String,
    },
}

/// Coordinate space named in a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSpace {
    /// Device-pixel input space.
    Screen,
    /// Logical drawing surface.
    Canvas,
    /// Zoom/pan workspace.
    Workspace,
}

impl fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Screen => "screen",
            Self::Canvas => "canvas",
            Self::Workspace => "workspace",
        })
    }
}

/// Errors raised by coordinate transforms.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DomainError {
    /// A NaN or infinite coordinate reached a transform.
    #[error("non-finite {space} coordinate ({x}, {y})")]
    NonFiniteCoordinate {
        /// Space of the rejected point.
        space: CoordinateSpace,
        /// Rejected x.
        x: f64,
        /// Rejected y.
        y: f64,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for coordinate transforms.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = ConfigError::NonPositiveSize {
            field: "screen_size",
            width: 0.0,
            height: 600.0,
        };
        assert_eq!(
            e.to_string(),
            "screen_size must be finite and strictly positive, got 0x600"
        );

        let d = DomainError::NonFiniteCoordinate {
            space: CoordinateSpace::Screen,
            x: f64::NAN,
            y: 1.0,
        };
        assert!(d.to_string().starts_with("non-finite screen coordinate"));
    }
}

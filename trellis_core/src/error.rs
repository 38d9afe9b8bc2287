// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable errors.
//!
//! Only loading operations can fail recoverably. Invalid cell handles are
//! programming errors and panic at the call site; rejected structural moves
//! are reported as `false` return values.

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading configuration or stylesheets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input was not well-formed JSON, or did not match the expected shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A stylesheet document was not a JSON object of style objects.
    #[error("stylesheet entry `{name}` must be a JSON object")]
    StyleNotObject {
        /// Name of the offending style.
        name: String,
    },

    /// A style property held a value other than a string, number, or boolean.
    #[error("style `{name}` has unsupported value for key `{key}`")]
    UnsupportedStyleValue {
        /// Name of the style containing the property.
        name: String,
        /// The property key.
        key: String,
    },

    /// A configuration value was outside its valid range.
    #[error("invalid view configuration: {message}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        message: String,
    },
}

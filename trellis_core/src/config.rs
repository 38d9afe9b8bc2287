// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunables for a [`GraphView`](crate::view::GraphView).
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use trellis_core::config::ViewConfig;
///
/// let config = ViewConfig::from_json(r#"{ "change_threshold": 50 }"#).unwrap();
/// assert_eq!(config.change_threshold, 50);
/// assert!(config.reset_view_on_root_change);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Change logs longer than this skip per-record dirty tracking and
    /// report the whole graph bounds instead.
    pub change_threshold: usize,
    /// Whether replacing the model root resets scale and translate to their
    /// initial values.
    pub reset_view_on_root_change: bool,
    /// Scale applied to every state when the view is created or reset.
    pub initial_scale: f64,
    /// Translation applied to every state when the view is created or reset.
    pub initial_translate: [f64; 2],
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            change_threshold: 1000,
            reset_view_on_root_change: true,
            initial_scale: 1.0,
            initial_translate: [0.0, 0.0],
        }
    }
}

impl ViewConfig {
    /// Parses a configuration from JSON and checks its ranges.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<()> {
        if !(self.initial_scale.is_finite() && self.initial_scale > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("initial_scale must be positive, got {}", self.initial_scale),
            });
        }
        if !self.initial_translate.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidConfig {
                message: "initial_translate must be finite".into(),
            });
        }
        Ok(())
    }
}

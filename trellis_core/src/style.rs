// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style strings and the stylesheet registry.
//!
//! A cell's style is a semicolon-separated list of tokens. A token without
//! `=` names a style registered in the [`Stylesheet`]; a `key=value` token
//! sets one property, and `key=none` removes it. Tokens apply left to right
//! on top of the type default (`defaultVertex` or `defaultEdge`), unless the
//! string starts with `;`, which skips the default.
//!
//! ```
//! use trellis_core::style::{StyleValue, Stylesheet};
//!
//! let sheet = Stylesheet::new();
//! let style = sheet.resolve("rounded=1;fontColor=red", false);
//! assert_eq!(style.get("rounded"), Some(&StyleValue::Number(1.0)));
//! assert_eq!(style.get_str("shape"), Some("rectangle"));
//! ```
//!
//! Unknown keys are kept verbatim for renderers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::{DEFAULT_EDGE_STYLE, DEFAULT_VERTEX_STYLE, NONE, PERIMETER, SHAPE};
use crate::error::{Error, Result};

/// A single style property value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// Free-form text.
    String(String),
    /// Any numeric value.
    Number(f64),
    /// `true` or `false`.
    Bool(bool),
}

impl StyleValue {
    /// Parses an inline value: number first, then boolean, then text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<f64>() {
            Self::Number(n)
        } else if let Ok(b) = raw.parse::<bool>() {
            Self::Bool(b)
        } else {
            Self::String(raw.to_owned())
        }
    }

    /// Returns the value as a number, if it is one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interprets the value as a flag: non-zero numbers and `true` are set.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::String(s) => s == "true",
        }
    }

    /// Returns the value as text, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A resolved, flat style mapping.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Style {
    entries: BTreeMap<String, StyleValue>,
}

impl Style {
    /// Creates an empty style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: StyleValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets a property.
    pub fn insert(&mut self, key: impl Into<String>, value: StyleValue) {
        self.entries.insert(key.into(), value);
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.entries.remove(key)
    }

    /// Returns a property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.get(key)
    }

    /// Returns a numeric property, or `default` if missing or not a number.
    #[must_use]
    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(StyleValue::as_number)
            .unwrap_or(default)
    }

    /// Returns a numeric property if present.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(StyleValue::as_number)
    }

    /// Returns a flag property, or `default` if missing.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).map_or(default, StyleValue::as_bool)
    }

    /// Returns a text property.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StyleValue::as_str)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn merge(&mut self, other: &Self) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }
}

/// Registry of named styles, owned by the [`Graph`](crate::graph::Graph).
#[derive(Clone, Debug, PartialEq)]
pub struct Stylesheet {
    styles: BTreeMap<String, Style>,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Stylesheet {
    /// Creates a stylesheet holding only the vertex and edge defaults.
    #[must_use]
    pub fn new() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(
            DEFAULT_VERTEX_STYLE.to_owned(),
            Style::new()
                .with(SHAPE, StyleValue::String("rectangle".into()))
                .with(PERIMETER, StyleValue::String("rectangle".into())),
        );
        styles.insert(
            DEFAULT_EDGE_STYLE.to_owned(),
            Style::new().with(SHAPE, StyleValue::String("connector".into())),
        );
        Self { styles }
    }

    /// Parses `{ "name": { "key": value, ... }, ... }` on top of the defaults.
    ///
    /// Entries with a default's name replace that default.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(entries) = doc else {
            return Err(Error::StyleNotObject {
                name: String::from("<root>"),
            });
        };
        let mut sheet = Self::new();
        for (name, body) in entries {
            let serde_json::Value::Object(props) = body else {
                return Err(Error::StyleNotObject { name });
            };
            let mut style = Style::new();
            for (key, value) in props {
                let value = match value {
                    serde_json::Value::String(s) => StyleValue::String(s),
                    serde_json::Value::Bool(b) => StyleValue::Bool(b),
                    serde_json::Value::Number(n) => match n.as_f64() {
                        Some(f) => StyleValue::Number(f),
                        None => return Err(Error::UnsupportedStyleValue { name, key }),
                    },
                    _ => return Err(Error::UnsupportedStyleValue { name, key }),
                };
                style.insert(key, value);
            }
            sheet.put_style(name, style);
        }
        Ok(sheet)
    }

    /// Registers or replaces a named style.
    pub fn put_style(&mut self, name: impl Into<String>, style: Style) {
        self.styles.insert(name.into(), style);
    }

    /// Returns a named style.
    #[must_use]
    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Returns the default style for vertices or edges.
    #[must_use]
    pub fn default_style(&self, is_edge: bool) -> Option<&Style> {
        self.style(if is_edge {
            DEFAULT_EDGE_STYLE
        } else {
            DEFAULT_VERTEX_STYLE
        })
    }

    /// Resolves a style string to a flat mapping.
    ///
    /// Unknown named styles are ignored.
    #[must_use]
    pub fn resolve(&self, style: &str, is_edge: bool) -> Style {
        let mut out = if style.starts_with(';') {
            Style::new()
        } else {
            self.default_style(is_edge).cloned().unwrap_or_default()
        };
        for token in style.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((key, value)) if value == NONE => {
                    out.remove(key);
                }
                Some((key, value)) => out.insert(key, StyleValue::parse(value)),
                None => {
                    if let Some(named) = self.styles.get(token) {
                        out.merge(named);
                    }
                }
            }
        }
        out
    }
}

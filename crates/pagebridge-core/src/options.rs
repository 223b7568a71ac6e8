//! Typed configuration surface for the bridge.
//!
//! The emulator accepts a flat set of options (bindings, compatibility
//! settings, log verbosity). They arrive here already schema-validated by
//! serde; [`BridgeOptions::validate`] adds the checks serde cannot express.
//! [`BridgeOptions::option_mapping`] lowers the typed struct into the
//! ordered `(name, OptionValue)` pairs consumed by the argument translator,
//! so the translator never has to re-inspect runtime value shapes.

use chrono::{NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A single configuration value, tagged by shape.
///
/// Decided once at the configuration boundary; downstream code matches on
/// the variant instead of inspecting dynamic types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A bare flag. `true` emits the flag, `false` emits nothing.
    Bool(bool),
    /// A scalar. The empty string emits nothing.
    Str(String),
    /// Repeated values, one argument per element.
    List(Vec<String>),
    /// Key/value pairs, one argument per entry, in iteration order.
    Map(IndexMap<String, String>),
}

/// Emulator log verbosity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Log,
    Warn,
    Error,
    None,
}

impl LogLevel {
    /// The wire form passed to the emulator CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::None => "none",
        }
    }

    /// Whether informational output (such as per-route install lines)
    /// should be emitted at this level.
    pub fn is_log(self) -> bool {
        matches!(self, Self::Debug | Self::Info | Self::Log)
    }
}

/// One binding name or a list of them.
///
/// The config file accepts both `"kv": "SESSIONS"` and
/// `"kv": ["SESSIONS", "CACHE"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// View the value as a slice of binding names.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// Whether no binding names were given.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(value) => value.is_empty(),
            Self::Many(values) => values.is_empty(),
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Options forwarded to the functions emulator.
///
/// Field names mirror the emulator's mixed-case option names; snake_case
/// aliases keep environment-variable overrides working.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BridgeOptions {
    /// Environment variables and secrets to bind, in declaration order.
    pub binding: IndexMap<String, String>,

    /// Binding names of KV namespaces.
    pub kv: OneOrMany,

    /// Binding names of R2 buckets.
    pub r2: OneOrMany,

    /// Binding names of D1 databases.
    pub d1: OneOrMany,

    /// Binding names of Durable Objects.
    #[serde(rename = "do", alias = "durable_object")]
    pub durable_object: OneOrMany,

    /// Binding names of AI bindings.
    pub ai: OneOrMany,

    /// Runtime compatibility flags to apply.
    #[serde(alias = "compatibility_flag")]
    pub compatibility_flag: Vec<String>,

    /// Runtime compatibility date (`YYYY-MM-DD`). Defaults to today.
    #[serde(alias = "compatibility_date")]
    pub compatibility_date: Option<String>,

    /// Emulator log verbosity.
    #[serde(alias = "log_level")]
    pub log_level: LogLevel,
}

impl BridgeOptions {
    /// Validate the checks serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOption`] if the compatibility date is
    /// not a valid ISO date or lies in the future.
    pub fn validate(&self) -> Result<()> {
        if let Some(date) = &self.compatibility_date {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                CoreError::InvalidOption {
                    field: "compatibilityDate".to_string(),
                    value: date.clone(),
                    hint: "Use an ISO date of the form YYYY-MM-DD".to_string(),
                }
            })?;
            if parsed > Utc::now().date_naive() {
                return Err(CoreError::InvalidOption {
                    field: "compatibilityDate".to_string(),
                    value: date.clone(),
                    hint: "The compatibility date must not be a future date".to_string(),
                });
            }
        }
        Ok(())
    }

    /// The compatibility date that will be passed to the emulator:
    /// the configured one, or today when unset.
    pub fn effective_compatibility_date(&self) -> String {
        self.compatibility_date
            .clone()
            .unwrap_or_else(|| Utc::now().date_naive().format("%Y-%m-%d").to_string())
    }

    /// Lower the typed options into the ordered option mapping consumed by
    /// [`crate::args::to_cli_args`]. Empty values are omitted.
    pub fn option_mapping(&self) -> Vec<(String, OptionValue)> {
        let mut mapping = Vec::new();

        if !self.binding.is_empty() {
            mapping.push(("binding".to_string(), OptionValue::Map(self.binding.clone())));
        }
        for (name, value) in [
            ("kv", &self.kv),
            ("r2", &self.r2),
            ("d1", &self.d1),
            ("do", &self.durable_object),
            ("ai", &self.ai),
        ] {
            if !value.is_empty() {
                mapping.push((name.to_string(), OptionValue::List(value.as_slice().to_vec())));
            }
        }
        if !self.compatibility_flag.is_empty() {
            mapping.push((
                "compatibilityFlag".to_string(),
                OptionValue::List(self.compatibility_flag.clone()),
            ));
        }
        mapping.push((
            "compatibilityDate".to_string(),
            OptionValue::Str(self.effective_compatibility_date()),
        ));
        mapping.push((
            "logLevel".to_string(),
            OptionValue::Str(self.log_level.as_str().to_string()),
        ));

        mapping
    }
}

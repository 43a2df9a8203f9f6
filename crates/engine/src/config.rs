use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Resolution classes
// ---------------------------------------------------------------------------

/// Named policy governing how a field's conflicting values across sources
/// are reduced to one. Fixed enumeration; per-field dispatch is a lookup in
/// the config table, never open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionClass {
    /// Any authoritative-source value beats all ordinary ones. Ties among
    /// authoritative sources are unresolved conflicts.
    TrustAuthoritative,
    /// Most frequent value wins; a strict tie among the top values is an
    /// unresolved conflict (first-seen among the tied kept as default).
    MostCommon,
    /// Chronologically latest record with the field populated wins.
    LatestNonEmpty,
    /// Numeric values within `epsilon` are one value; outside is a conflict.
    NumericHarmonize,
    /// Earliest record with the field populated wins.
    FirstNonEmpty,
}

impl fmt::Display for ResolutionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrustAuthoritative => write!(f, "trust_authoritative"),
            Self::MostCommon => write!(f, "most_common"),
            Self::LatestNonEmpty => write!(f, "latest_non_empty"),
            Self::NumericHarmonize => write!(f, "numeric_harmonize"),
            Self::FirstNonEmpty => write!(f, "first_non_empty"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// Time-proximity window for chain clustering, in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: i64,

    /// Numeric harmonization tolerance (e.g. for FREQ).
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Optional safety cap on the total span of a chained group. Chain
    /// linking can merge arbitrarily long runs on busy band/call pairs;
    /// the cap closes a group once first-to-last exceeds it.
    #[serde(default)]
    pub max_group_span_seconds: Option<i64>,

    /// Case-insensitive substrings marking a source file name as
    /// authoritative (LoTW-style confirmation services).
    #[serde(default = "default_markers")]
    pub authoritative_markers: Vec<String>,

    /// Class applied to fields with no per-field override and no built-in.
    #[serde(default = "default_class")]
    pub default_class: ResolutionClass,

    /// Per-field overrides, field name -> class. Layered over the built-in
    /// table, which is layered over `default_class`.
    #[serde(default)]
    pub classes: BTreeMap<String, ResolutionClass>,
}

fn default_window() -> i64 {
    90
}

fn default_epsilon() -> f64 {
    1e-4
}

fn default_markers() -> Vec<String> {
    vec!["lotw".to_string()]
}

fn default_class() -> ResolutionClass {
    ResolutionClass::MostCommon
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window(),
            epsilon: default_epsilon(),
            max_group_span_seconds: None,
            authoritative_markers: default_markers(),
            default_class: default_class(),
            classes: BTreeMap::new(),
        }
    }
}

/// Built-in per-field classes, tuned for the common WSJT-X / LoTW / eQSL
/// merge case. User `[classes]` entries override these.
fn builtin_class(field: &str) -> Option<ResolutionClass> {
    use ResolutionClass::*;
    match field {
        "FREQ" | "FREQ_RX" => Some(NumericHarmonize),
        "COMMENT" | "NAME" => Some(LatestNonEmpty),
        "GRIDSQUARE" | "DXCC" | "COUNTRY" | "CQZ" | "ITUZ" | "QSL_RCVD" => {
            Some(TrustAuthoritative)
        }
        "STATION_CALLSIGN" | "MY_GRIDSQUARE" => Some(FirstNonEmpty),
        // Time fields differ across sources inside one group as a matter of
        // course; the earliest report wins, matching the merged timestamp.
        "QSO_DATE" | "TIME_ON" | "QSO_DATE_OFF" | "TIME_OFF" => Some(FirstNonEmpty),
        _ => None,
    }
}

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolution class for a field: user override, then built-in table,
    /// then the default class.
    pub fn class_for(&self, field: &str) -> ResolutionClass {
        self.classes
            .get(field)
            .copied()
            .or_else(|| builtin_class(field))
            .unwrap_or(self.default_class)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.window_seconds < 0 {
            return Err(MergeError::ConfigValidation(format!(
                "window_seconds must be non-negative, got {}",
                self.window_seconds
            )));
        }

        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(MergeError::ConfigValidation(format!(
                "epsilon must be a non-negative finite number, got {}",
                self.epsilon
            )));
        }

        if let Some(cap) = self.max_group_span_seconds {
            if cap <= 0 {
                return Err(MergeError::ConfigValidation(format!(
                    "max_group_span_seconds must be positive, got {cap}"
                )));
            }
        }

        if self.authoritative_markers.iter().any(|m| m.is_empty()) {
            return Err(MergeError::ConfigValidation(
                "authoritative_markers must not contain empty strings".into(),
            ));
        }

        if self.classes.keys().any(|k| k.trim().is_empty()) {
            return Err(MergeError::ConfigValidation(
                "classes table contains an empty field name".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

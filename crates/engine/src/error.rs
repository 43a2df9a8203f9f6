use std::fmt;

#[derive(Debug)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (negative window, bad epsilon, etc.).
    ConfigValidation(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for MergeError {}

/// A record that lacks the fields needed to derive a match key or timestamp.
///
/// Such records are excluded from grouping, counted, and surfaced as a
/// per-file diagnostic. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    pub source: String,
    pub field: String,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record from '{}': missing or invalid {}",
            self.source, self.field
        )
    }
}

impl std::error::Error for MalformedRecord {}

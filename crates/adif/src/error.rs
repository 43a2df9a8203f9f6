use std::fmt;

#[derive(Debug)]
pub enum AdifError {
    /// Malformed tag (unterminated, bad length specifier).
    Tag(String),
    /// Field data shorter than its declared length.
    Truncated { field: String },
    /// CSV writer error.
    Csv(String),
}

impl fmt::Display for AdifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(msg) => write!(f, "malformed ADIF tag: {msg}"),
            Self::Truncated { field } => {
                write!(f, "field '{field}': data shorter than declared length")
            }
            Self::Csv(msg) => write!(f, "CSV write error: {msg}"),
        }
    }
}

impl std::error::Error for AdifError {}

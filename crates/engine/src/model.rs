use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::MalformedRecord;
use crate::report::ProblemReport;

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A typed ADIF field value. The codec coerces integer and number fields;
/// everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl FieldValue {
    /// Canonical rendering, used both for output and for counting distinct
    /// values during resolution.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Numeric view for `numeric_harmonize` comparison. Text parses when it
    /// looks like a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            Self::Integer(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
        }
    }

    /// Present-but-empty, as distinct from absent. Only text can be empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

// ---------------------------------------------------------------------------
// Sources + trust
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTag {
    Authoritative,
    Ordinary,
}

impl TrustTag {
    /// Classify a source file name against case-insensitive marker
    /// substrings (e.g. "lotw"). The engine itself never inspects names;
    /// only the resulting tag flows in.
    pub fn classify(name: &str, markers: &[String]) -> TrustTag {
        let folded = name.to_lowercase();
        let hit = markers
            .iter()
            .any(|m| !m.is_empty() && folded.contains(&m.to_lowercase()));
        if hit {
            Self::Authoritative
        } else {
            Self::Ordinary
        }
    }
}

impl fmt::Display for TrustTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authoritative => write!(f, "authoritative"),
            Self::Ordinary => write!(f, "ordinary"),
        }
    }
}

/// Originating file for a record, with its derived trust tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    pub trust: TrustTag,
}

// ---------------------------------------------------------------------------
// Match key
// ---------------------------------------------------------------------------

/// (call, band, mode), case/whitespace folded. Two records can only describe
/// the same QSO when all three normalize identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey {
    pub call: String,
    pub band: String,
    pub mode: String,
}

impl MatchKey {
    pub fn new(call: &str, band: &str, mode: &str) -> Self {
        Self {
            call: fold(call),
            band: fold(band),
            mode: fold(mode),
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.call, self.band, self.mode)
    }
}

fn fold(s: &str) -> String {
    s.split_whitespace().collect::<String>().to_uppercase()
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One QSO observation from one source. Immutable once built.
#[derive(Debug, Clone)]
pub struct Record {
    pub fields: BTreeMap<String, FieldValue>,
    pub key: MatchKey,
    pub ts: NaiveDateTime,
    pub source: Source,
}

impl Record {
    /// Build a record from a flat field map. Fails when the fields needed
    /// for the match key (CALL, BAND, MODE) or the timestamp (QSO_DATE,
    /// TIME_ON) are missing or unparseable.
    pub fn new(
        fields: BTreeMap<String, FieldValue>,
        source: Source,
    ) -> Result<Record, MalformedRecord> {
        let text = |name: &str| -> Result<String, MalformedRecord> {
            match fields.get(name) {
                Some(v) if !v.is_empty() => Ok(v.render()),
                _ => Err(MalformedRecord {
                    source: source.name.clone(),
                    field: name.to_string(),
                }),
            }
        };

        let key = MatchKey::new(&text("CALL")?, &text("BAND")?, &text("MODE")?);

        let date = text("QSO_DATE")?;
        let time = text("TIME_ON")?;
        let ts = parse_timestamp(&date, &time).ok_or_else(|| MalformedRecord {
            source: source.name.clone(),
            field: "QSO_DATE/TIME_ON".to_string(),
        })?;

        Ok(Record {
            fields,
            key,
            ts,
            source,
        })
    }
}

/// ADIF timestamps: QSO_DATE is YYYYMMDD, TIME_ON is HHMM or HHMMSS.
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y%m%d").ok()?;
    let time = time.trim();
    let time = match time.len() {
        4 => NaiveTime::parse_from_str(time, "%H%M").ok()?,
        6 => NaiveTime::parse_from_str(time, "%H%M%S").ok()?,
        _ => return None,
    };
    Some(date.and_time(time))
}

// ---------------------------------------------------------------------------
// Merge output
// ---------------------------------------------------------------------------

/// One resolved record per QSO group: one value per field name seen across
/// the group, plus the contributing sources for audit.
#[derive(Debug, Clone, Serialize)]
pub struct MergedRecord {
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(skip)]
    pub key: MatchKey,
    pub ts: NaiveDateTime,
    pub sources: Vec<String>,
}

impl MergedRecord {
    /// Stable QSO identity used to index the problem report.
    pub fn qso_id(&self) -> String {
        format!("{}_{}", self.key, self.ts.format("%Y%m%d_%H%M%S"))
    }
}

/// A field whose values disagreed and the resolution class could not pick a
/// winner with full confidence. Ambiguity is data, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictEntry {
    pub field: String,
    pub qso_id: String,
    pub candidates: Vec<Candidate>,
    /// The value kept in the merged output despite the conflict.
    pub selected: FieldValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub source: String,
    pub value: FieldValue,
}

// ---------------------------------------------------------------------------
// Engine input / output
// ---------------------------------------------------------------------------

/// Pre-parsed records for one source file, in input order.
pub struct SourceRecords {
    pub source: Source,
    pub records: Vec<Record>,
}

/// Ordered sequence of per-source record lists (all sources, all files).
pub struct MergeInput {
    pub sources: Vec<SourceRecords>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub records: usize,
    pub sources: usize,
    pub groups: usize,
    pub merged: usize,
    /// Field names with at least one unresolved conflict.
    pub conflicted_fields: usize,
    /// Total unresolved conflict entries across all groups.
    pub conflicts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeMeta {
    pub engine_version: String,
    pub run_at: String,
    pub window_seconds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub meta: MergeMeta,
    pub summary: MergeSummary,
    pub merged: Vec<MergedRecord>,
    pub problems: ProblemReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    fn src(name: &str) -> Source {
        Source {
            name: name.into(),
            trust: TrustTag::Ordinary,
        }
    }

    #[test]
    fn match_key_folds_case_and_whitespace() {
        let a = MatchKey::new(" w1aw ", "20m", "ft8");
        let b = MatchKey::new("W1AW", "20M", "FT8");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "W1AW_20M_FT8");
    }

    #[test]
    fn record_derives_key_and_timestamp() {
        let r = Record::new(
            fields(&[
                ("CALL", "w1aw"),
                ("BAND", "20m"),
                ("MODE", "FT8"),
                ("QSO_DATE", "20240301"),
                ("TIME_ON", "1234"),
            ]),
            src("wsjtx.adi"),
        )
        .unwrap();
        assert_eq!(r.key, MatchKey::new("W1AW", "20M", "FT8"));
        assert_eq!(r.ts.format("%Y%m%d %H%M%S").to_string(), "20240301 123400");
    }

    #[test]
    fn record_accepts_six_digit_time() {
        let r = Record::new(
            fields(&[
                ("CALL", "W1AW"),
                ("BAND", "20M"),
                ("MODE", "FT8"),
                ("QSO_DATE", "20240301"),
                ("TIME_ON", "123456"),
            ]),
            src("log.adi"),
        )
        .unwrap();
        assert_eq!(r.ts.format("%H%M%S").to_string(), "123456");
    }

    #[test]
    fn record_missing_band_is_malformed() {
        let err = Record::new(
            fields(&[
                ("CALL", "W1AW"),
                ("MODE", "FT8"),
                ("QSO_DATE", "20240301"),
                ("TIME_ON", "1234"),
            ]),
            src("log.adi"),
        )
        .unwrap_err();
        assert_eq!(err.field, "BAND");
        assert_eq!(err.source, "log.adi");
    }

    #[test]
    fn record_bad_time_is_malformed() {
        let err = Record::new(
            fields(&[
                ("CALL", "W1AW"),
                ("BAND", "20M"),
                ("MODE", "FT8"),
                ("QSO_DATE", "20240301"),
                ("TIME_ON", "12345"),
            ]),
            src("log.adi"),
        )
        .unwrap_err();
        assert_eq!(err.field, "QSO_DATE/TIME_ON");
    }

    #[test]
    fn trust_classification_is_case_insensitive() {
        let markers = vec!["lotw".to_string()];
        assert_eq!(
            TrustTag::classify("LoTW-download.adi", &markers),
            TrustTag::Authoritative
        );
        assert_eq!(
            TrustTag::classify("wsjtx_log.adi", &markers),
            TrustTag::Ordinary
        );
    }

    #[test]
    fn empty_marker_never_matches() {
        let markers = vec![String::new()];
        assert_eq!(TrustTag::classify("any.adi", &markers), TrustTag::Ordinary);
    }

    #[test]
    fn field_value_numeric_views() {
        assert_eq!(FieldValue::Text("14.0745".into()).as_number(), Some(14.0745));
        assert_eq!(FieldValue::Integer(5).as_number(), Some(5.0));
        assert_eq!(FieldValue::Text("20m".into()).as_number(), None);
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(!FieldValue::Integer(0).is_empty());
    }
}

use std::collections::BTreeMap;

use crate::config::{MergeConfig, ResolutionClass};
use crate::model::{Candidate, ConflictEntry, FieldValue, MergedRecord, Record, TrustTag};

/// Reduce one QSO group to a single merged record, emitting a conflict
/// entry for every field whose values disagree and whose resolution class
/// could not pick a winner with full confidence. Pure reduction; the group
/// must be non-empty and in (key, timestamp) order as produced by grouping.
pub fn resolve_group(group: &[Record], config: &MergeConfig) -> (MergedRecord, Vec<ConflictEntry>) {
    let first = &group[0];

    let mut sources: Vec<String> = Vec::new();
    for record in group {
        if !sources.contains(&record.source.name) {
            sources.push(record.source.name.clone());
        }
    }

    let mut field_names: Vec<&str> = Vec::new();
    for record in group {
        for name in record.fields.keys() {
            if !field_names.contains(&name.as_str()) {
                field_names.push(name);
            }
        }
    }
    field_names.sort_unstable();

    // Disagreement needs at least two sources; a group fed by one file can
    // only restate itself, so nothing it says is reportable ambiguity.
    let single_source = sources.len() == 1;

    let mut merged = MergedRecord {
        fields: BTreeMap::new(),
        key: first.key.clone(),
        ts: first.ts,
        sources,
    };
    let qso_id = merged.qso_id();
    let mut conflicts = Vec::new();

    for name in field_names {
        // (record, value) pairs in group order; group order is the stable
        // sort order, which makes every first-seen tie-break deterministic.
        let pairs: Vec<(&Record, &FieldValue)> = group
            .iter()
            .filter_map(|r| r.fields.get(name).map(|v| (r, v)))
            .collect();

        let mut distinct: Vec<&FieldValue> = Vec::new();
        for (_, value) in &pairs {
            if !distinct.iter().any(|d| d.render() == value.render()) {
                distinct.push(value);
            }
        }

        let resolution = if distinct.len() == 1 {
            Resolution::clean(distinct[0].clone())
        } else {
            apply_class(config.class_for(name), &pairs, config.epsilon)
        };

        if resolution.conflict && !single_source {
            conflicts.push(ConflictEntry {
                field: name.to_string(),
                qso_id: qso_id.clone(),
                candidates: pairs
                    .iter()
                    .map(|(r, v)| Candidate {
                        source: r.source.name.clone(),
                        value: (*v).clone(),
                    })
                    .collect(),
                selected: resolution.value.clone(),
            });
        }

        merged.fields.insert(name.to_string(), resolution.value);
    }

    (merged, conflicts)
}

struct Resolution {
    value: FieldValue,
    conflict: bool,
}

impl Resolution {
    fn clean(value: FieldValue) -> Self {
        Self {
            value,
            conflict: false,
        }
    }

    fn conflicted(value: FieldValue) -> Self {
        Self {
            value,
            conflict: true,
        }
    }
}

/// Apply a resolution class to a field with two or more distinct values.
fn apply_class(
    class: ResolutionClass,
    pairs: &[(&Record, &FieldValue)],
    epsilon: f64,
) -> Resolution {
    match class {
        ResolutionClass::TrustAuthoritative => trust_authoritative(pairs),
        ResolutionClass::MostCommon => most_common(pairs),
        ResolutionClass::LatestNonEmpty => latest_non_empty(pairs),
        ResolutionClass::NumericHarmonize => numeric_harmonize(pairs, epsilon),
        ResolutionClass::FirstNonEmpty => first_non_empty(pairs),
    }
}

fn trust_authoritative(pairs: &[(&Record, &FieldValue)]) -> Resolution {
    let auth: Vec<&FieldValue> = pairs
        .iter()
        .filter(|(r, _)| r.source.trust == TrustTag::Authoritative)
        .map(|(_, v)| *v)
        .collect();

    let mut distinct_auth: Vec<&FieldValue> = Vec::new();
    for value in &auth {
        if !distinct_auth.iter().any(|d| d.render() == value.render()) {
            distinct_auth.push(value);
        }
    }

    match distinct_auth.len() {
        // No authoritative source contributes; trust elevates nothing here,
        // so fall back to frequency.
        0 => most_common(pairs),
        1 => Resolution::clean(distinct_auth[0].clone()),
        // Authoritative sources disagree among themselves.
        _ => Resolution::conflicted(distinct_auth[0].clone()),
    }
}

fn most_common(pairs: &[(&Record, &FieldValue)]) -> Resolution {
    // Counts keyed by rendering, in first-seen order.
    let mut counts: Vec<(&FieldValue, usize)> = Vec::new();
    for (_, value) in pairs {
        match counts.iter_mut().find(|(v, _)| v.render() == value.render()) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let top = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let leaders: Vec<&FieldValue> = counts
        .iter()
        .filter(|(_, n)| *n == top)
        .map(|(v, _)| *v)
        .collect();

    if leaders.len() == 1 {
        Resolution::clean(leaders[0].clone())
    } else {
        // Strict tie: keep the first-seen leader but report it.
        Resolution::conflicted(leaders[0].clone())
    }
}

fn latest_non_empty(pairs: &[(&Record, &FieldValue)]) -> Resolution {
    // Group order is timestamp order, so the last non-empty pair is the
    // chronologically latest one.
    let pick = pairs
        .iter()
        .rev()
        .find(|(_, v)| !v.is_empty())
        .or_else(|| pairs.first());
    Resolution::clean(pick.map(|(_, v)| (*v).clone()).unwrap_or_else(empty_text))
}

fn first_non_empty(pairs: &[(&Record, &FieldValue)]) -> Resolution {
    let pick = pairs.iter().find(|(_, v)| !v.is_empty()).or_else(|| pairs.first());
    Resolution::clean(pick.map(|(_, v)| (*v).clone()).unwrap_or_else(empty_text))
}

fn empty_text() -> FieldValue {
    FieldValue::Text(String::new())
}

fn numeric_harmonize(pairs: &[(&Record, &FieldValue)], epsilon: f64) -> Resolution {
    let first = pairs[0].1;
    let Some(base) = first.as_number() else {
        return Resolution::conflicted(first.clone());
    };

    for (_, value) in &pairs[1..] {
        match value.as_number() {
            Some(n) if (n - base).abs() <= epsilon => {}
            _ => return Resolution::conflicted(first.clone()),
        }
    }

    Resolution::clean(first.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchKey, Source};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn record(file: &str, trust: TrustTag, secs: i64, extra: &[(&str, FieldValue)]) -> Record {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(secs);
        let mut fields = BTreeMap::new();
        fields.insert("CALL".into(), FieldValue::Text("W1AW".into()));
        fields.insert("BAND".into(), FieldValue::Text("20M".into()));
        fields.insert("MODE".into(), FieldValue::Text("FT8".into()));
        fields.insert(
            "QSO_DATE".into(),
            FieldValue::Text(ts.format("%Y%m%d").to_string()),
        );
        fields.insert(
            "TIME_ON".into(),
            FieldValue::Text(ts.format("%H%M%S").to_string()),
        );
        for (k, v) in extra {
            fields.insert(k.to_string(), v.clone());
        }
        Record::new(
            fields,
            Source {
                name: file.into(),
                trust,
            },
        )
        .unwrap()
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.into())
    }

    #[test]
    fn single_record_merges_cleanly() {
        let group = vec![record("a.adi", TrustTag::Ordinary, 0, &[("RST_SENT", text("-10"))])];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["RST_SENT"], text("-10"));
        assert_eq!(merged.key, MatchKey::new("W1AW", "20M", "FT8"));
        assert_eq!(merged.sources, vec!["a.adi"]);
    }

    #[test]
    fn identical_values_never_conflict() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("GRIDSQUARE", text("FN31"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("GRIDSQUARE", text("FN31"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["GRIDSQUARE"], text("FN31"));
        assert_eq!(merged.sources, vec!["a.adi", "b.adi"]);
    }

    #[test]
    fn absent_field_is_not_a_conflict() {
        // Field present in only one member: adopted as-is.
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("NAME", text("Hiram"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["NAME"], text("Hiram"));
    }

    #[test]
    fn trust_authoritative_wins_without_conflict() {
        let group = vec![
            record("wsjtx.adi", TrustTag::Ordinary, 0, &[("GRIDSQUARE", text("FN31"))]),
            record("lotw.adi", TrustTag::Authoritative, 10, &[("GRIDSQUARE", text("FN32"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["GRIDSQUARE"], text("FN32"));
    }

    #[test]
    fn authoritative_tie_is_reported() {
        let group = vec![
            record("lotw1.adi", TrustTag::Authoritative, 0, &[("GRIDSQUARE", text("FN31"))]),
            record("lotw2.adi", TrustTag::Authoritative, 10, &[("GRIDSQUARE", text("FN32"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert_eq!(conflicts.len(), 1);
        let c = &conflicts[0];
        assert_eq!(c.field, "GRIDSQUARE");
        assert_eq!(c.candidates.len(), 2);
        assert_eq!(c.selected, text("FN31"));
        assert_eq!(merged.fields["GRIDSQUARE"], text("FN31"));
    }

    #[test]
    fn trust_falls_back_to_frequency_without_authoritative() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("GRIDSQUARE", text("FN31"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("GRIDSQUARE", text("FN32"))]),
            record("c.adi", TrustTag::Ordinary, 20, &[("GRIDSQUARE", text("FN32"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["GRIDSQUARE"], text("FN32"));
    }

    #[test]
    fn most_common_majority_wins() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("RST_SENT", text("-10"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("RST_SENT", text("-11"))]),
            record("c.adi", TrustTag::Ordinary, 20, &[("RST_SENT", text("-10"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["RST_SENT"], text("-10"));
    }

    #[test]
    fn most_common_tie_keeps_first_seen_and_reports() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("RST_SENT", text("-10"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("RST_SENT", text("-11"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].selected, text("-10"));
        assert_eq!(merged.fields["RST_SENT"], text("-10"));
    }

    #[test]
    fn latest_non_empty_takes_chronologically_last() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("COMMENT", text("first"))]),
            record("b.adi", TrustTag::Ordinary, 30, &[("COMMENT", text("corrected"))]),
            record("c.adi", TrustTag::Ordinary, 60, &[("COMMENT", text(""))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["COMMENT"], text("corrected"));
    }

    #[test]
    fn first_non_empty_takes_earliest() {
        let mut config = MergeConfig::default();
        config
            .classes
            .insert("NAME".into(), ResolutionClass::FirstNonEmpty);
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("NAME", text(""))]),
            record("b.adi", TrustTag::Ordinary, 30, &[("NAME", text("Hiram"))]),
            record("c.adi", TrustTag::Ordinary, 60, &[("NAME", text("H. P. Maxim"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &config);
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["NAME"], text("Hiram"));
    }

    #[test]
    fn numeric_harmonize_within_epsilon() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("FREQ", FieldValue::Number(14.0745))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("FREQ", FieldValue::Number(14.07450001))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.fields["FREQ"], FieldValue::Number(14.0745));
    }

    #[test]
    fn numeric_harmonize_outside_epsilon_conflicts() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("FREQ", FieldValue::Number(14.0745))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("FREQ", FieldValue::Number(14.080))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].field, "FREQ");
        assert_eq!(merged.fields["FREQ"], FieldValue::Number(14.0745));
    }

    #[test]
    fn numeric_harmonize_non_numeric_conflicts() {
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("FREQ", text("14.0745"))]),
            record("b.adi", TrustTag::Ordinary, 10, &[("FREQ", text("unknown"))]),
        ];
        let (_, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn single_source_groups_never_conflict() {
        // Even disagreeing values within one file are not reportable
        // ambiguity; the class default is kept silently.
        let group = vec![
            record("a.adi", TrustTag::Ordinary, 0, &[("RST_SENT", text("-10"))]),
            record("a.adi", TrustTag::Ordinary, 30, &[("RST_SENT", text("-11"))]),
        ];
        let (merged, conflicts) = resolve_group(&group, &MergeConfig::default());
        assert!(conflicts.is_empty());
        assert_eq!(merged.sources, vec!["a.adi"]);
        assert_eq!(merged.fields["RST_SENT"], text("-10"));
    }
}

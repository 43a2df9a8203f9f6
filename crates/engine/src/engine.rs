use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::group::group_records;
use crate::model::{MergeInput, MergeMeta, MergeResult, MergeSummary, Record};
use crate::report::ProblemReport;
use crate::resolve::resolve_group;

/// Run the merge per config. Returns merged records in group-timestamp
/// order plus the problem report. Total for well-formed records; only an
/// invalid config can fail, and it fails before any group is processed.
pub fn run(config: &MergeConfig, input: &MergeInput) -> Result<MergeResult, MergeError> {
    config.validate()?;

    let records: Vec<Record> = input
        .sources
        .iter()
        .flat_map(|s| s.records.iter().cloned())
        .collect();
    let record_count = records.len();

    let groups = group_records(records, config);
    let group_count = groups.len();

    let mut merged = Vec::with_capacity(group_count);
    let mut problems = ProblemReport::default();
    let mut conflicts = 0;

    for group in &groups {
        let (record, entries) = resolve_group(group, config);
        conflicts += entries.len();
        for entry in entries {
            problems.push(entry);
        }
        merged.push(record);
    }

    // Output order is by representative timestamp; the sort is stable so
    // same-instant groups keep their (key-sorted) order.
    merged.sort_by(|a, b| a.ts.cmp(&b.ts));

    Ok(MergeResult {
        meta: MergeMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            window_seconds: config.window_seconds,
        },
        summary: MergeSummary {
            records: record_count,
            sources: input.sources.len(),
            groups: group_count,
            merged: merged.len(),
            conflicted_fields: problems.fields().count(),
            conflicts,
        },
        merged,
        problems,
    })
}

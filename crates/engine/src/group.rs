use crate::config::MergeConfig;
use crate::model::Record;

/// Partition the combined record list into candidate-same-QSO groups.
///
/// Records are stable-sorted by (match key, timestamp) so same-key records
/// are contiguous and exact ties keep their input order, then each key run
/// is chain-clustered: a record joins the current group when its gap to the
/// previous member is within the window, otherwise it starts a new group.
/// Chaining is transitive: A and C can share a group via B even
/// when |A-C| exceeds the window. `max_group_span_seconds` optionally closes
/// a group once its first-to-last span would exceed the cap.
pub fn group_records(mut records: Vec<Record>, config: &MergeConfig) -> Vec<Vec<Record>> {
    // sort_by is stable; input order breaks exact (key, ts) ties.
    records.sort_by(|a, b| a.key.cmp(&b.key).then(a.ts.cmp(&b.ts)));

    let mut groups: Vec<Vec<Record>> = Vec::new();
    let mut current: Vec<Record> = Vec::new();

    for record in records {
        let split = match current.last() {
            None => false,
            Some(prev) => {
                prev.key != record.key
                    || (record.ts - prev.ts).num_seconds() > config.window_seconds
                    || config.max_group_span_seconds.is_some_and(|cap| {
                        (record.ts - current[0].ts).num_seconds() > cap
                    })
            }
        };
        if split {
            groups.push(std::mem::take(&mut current));
        }
        current.push(record);
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

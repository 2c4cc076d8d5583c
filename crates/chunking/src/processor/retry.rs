use super::ProcessedChunk;
use std::collections::{HashMap, VecDeque};

/// Replace failed entries of `current` with retried outcomes for the same
/// chunk id.
///
/// Entries that succeeded earlier are never touched, and positions stay in
/// input order. Duplicate ids are matched in order of appearance.
pub fn splice_retries<T>(
    current: Vec<ProcessedChunk<T>>,
    retried: Vec<ProcessedChunk<T>>,
) -> Vec<ProcessedChunk<T>> {
    let mut by_id: HashMap<String, VecDeque<ProcessedChunk<T>>> = HashMap::new();
    for outcome in retried {
        by_id
            .entry(outcome.chunk_id().to_string())
            .or_default()
            .push_back(outcome);
    }

    current
        .into_iter()
        .map(|outcome| {
            if outcome.success {
                return outcome;
            }
            by_id
                .get_mut(outcome.chunk_id())
                .and_then(VecDeque::pop_front)
                .unwrap_or(outcome)
        })
        .collect()
}

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::Candidate;

/// Merges strategy outputs into a single ranked, deduplicated list
///
/// Candidates are keyed by book id; when several strategies propose the same
/// book, the one with the higher score wins (max-wins, not last-writer).
/// The merged set is sorted by score descending with a stable sort, so ties
/// keep their original insertion order, then truncated to the caller's
/// limit. The output never contains two entries for the same book.
pub fn merge_candidates(candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    let mut insertion_order: Vec<Uuid> = Vec::new();
    let mut best: HashMap<Uuid, Candidate> = HashMap::new();

    for candidate in candidates {
        match best.entry(candidate.book_id) {
            Entry::Vacant(slot) => {
                insertion_order.push(candidate.book_id);
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if candidate.score > slot.get().score {
                    slot.insert(candidate);
                }
            }
        }
    }

    let mut merged: Vec<Candidate> = insertion_order
        .into_iter()
        .filter_map(|book_id| best.remove(&book_id))
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(limit);

    merged
}

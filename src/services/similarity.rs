use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::LoanRecord;

/// The distinct book ids a set of loans covers
pub fn borrowed_book_ids(loans: &[LoanRecord]) -> HashSet<Uuid> {
    loans.iter().map(|loan| loan.book_id).collect()
}

/// Reduces grouped loan history to per-borrower book-id sets, dropping the
/// target user so they never match themselves.
pub fn books_by_borrower(
    grouped: &HashMap<String, Vec<LoanRecord>>,
    exclude_user: &str,
) -> HashMap<String, HashSet<Uuid>> {
    grouped
        .iter()
        .filter(|(borrower, _)| borrower.as_str() != exclude_user)
        .map(|(borrower, loans)| (borrower.clone(), borrowed_book_ids(loans)))
        .collect()
}

/// Finds borrowers whose history overlaps the target's
///
/// Similarity is the raw intersection size between borrowed-book-id sets,
/// deliberately not Jaccard-normalized: a borrower sharing five books with
/// the target is a stronger signal than one sharing two out of two. Only
/// borrowers at or above the minimum-overlap threshold are retained.
///
/// An empty target set yields an empty map; no similarity is defined
/// without shared signal.
pub fn find_similar_borrowers(
    target_books: &HashSet<Uuid>,
    others: &HashMap<String, HashSet<Uuid>>,
    min_overlap: usize,
) -> HashMap<String, usize> {
    if target_books.is_empty() {
        return HashMap::new();
    }

    others
        .iter()
        .filter_map(|(borrower, books)| {
            let shared = books.intersection(target_books).count();
            if shared >= min_overlap {
                Some((borrower.clone(), shared))
            } else {
                None
            }
        })
        .collect()
}

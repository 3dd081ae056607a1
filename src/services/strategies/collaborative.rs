use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::config::EngineTuning;
use crate::error::AppResult;
use crate::models::{Candidate, RecommendationType};
use crate::stores::CatalogStore;

const REASON: &str = "Users with similar reading preferences also borrowed this book";

/// Scores books borrowed by similar readers that the target has not touched
///
/// Each similar borrower contributes
/// `min(similarity * 0.7 + their_total_books * 0.01, 1.0)` to every book of
/// theirs the target has not borrowed; contributions from several similar
/// borrowers add up, and the accumulated per-book score is clamped to 1.0
/// when the candidate is built.
pub async fn score(
    catalog: &dyn CatalogStore,
    user_books: &HashSet<Uuid>,
    similar: &HashMap<String, usize>,
    books_by_borrower: &HashMap<String, HashSet<Uuid>>,
    tuning: &EngineTuning,
    limit: usize,
) -> AppResult<Vec<Candidate>> {
    if user_books.is_empty() || similar.is_empty() {
        return Ok(Vec::new());
    }

    let mut book_scores: HashMap<Uuid, f64> = HashMap::new();

    // Walk borrowers in sorted order so float accumulation is reproducible
    let mut borrowers: Vec<&String> = similar.keys().collect();
    borrowers.sort();

    for borrower in borrowers {
        let similarity = similar[borrower];
        let Some(their_books) = books_by_borrower.get(borrower) else {
            continue;
        };

        let contribution = (similarity as f64 * tuning.collaborative_similarity_weight
            + their_books.len() as f64 * tuning.collaborative_breadth_weight)
            .min(1.0);

        let mut unseen: Vec<Uuid> = their_books
            .iter()
            .filter(|book_id| !user_books.contains(book_id))
            .copied()
            .collect();
        unseen.sort();

        for book_id in unseen {
            *book_scores.entry(book_id).or_default() += contribution;
        }
    }

    let mut ranked: Vec<(Uuid, f64)> = book_scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(limit);

    let mut candidates = Vec::with_capacity(ranked.len());
    for (book_id, score) in ranked {
        // A book deleted since the loans were recorded is silently skipped
        if catalog.book_by_id(book_id).await?.is_some() {
            candidates.push(Candidate::clamped(
                book_id,
                score,
                REASON,
                RecommendationType::Collaborative,
            ));
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;
    use crate::stores::MockCatalogStore;

    fn catalog_with_all_books() -> MockCatalogStore {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_book_by_id().returning(|id| {
            Ok(Some(Book {
                id,
                title: "any".to_string(),
                genre: None,
                author_ids: vec![],
            }))
        });
        catalog
    }

    fn set(ids: &[Uuid]) -> HashSet<Uuid> {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_empty_similarity_yields_no_candidates() {
        let catalog = catalog_with_all_books();
        let user_books = set(&[Uuid::new_v4()]);

        let candidates = score(
            &catalog,
            &user_books,
            &HashMap::new(),
            &HashMap::new(),
            &EngineTuning::default(),
            10,
        )
        .await
        .unwrap();

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_already_borrowed_books_are_excluded() {
        let catalog = catalog_with_all_books();
        let shared = [Uuid::new_v4(), Uuid::new_v4()];
        let fresh = Uuid::new_v4();

        let user_books = set(&shared);
        let mut similar = HashMap::new();
        similar.insert("bob".to_string(), 2);
        let mut by_borrower = HashMap::new();
        by_borrower.insert("bob".to_string(), set(&[shared[0], shared[1], fresh]));

        let candidates = score(
            &catalog,
            &user_books,
            &similar,
            &by_borrower,
            &EngineTuning::default(),
            10,
        )
        .await
        .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].book_id, fresh);
        assert_eq!(candidates[0].rec_type, RecommendationType::Collaborative);
    }

    #[tokio::test]
    async fn test_contribution_formula_and_clamp() {
        let catalog = catalog_with_all_books();
        let shared = [Uuid::new_v4(), Uuid::new_v4()];
        let fresh = Uuid::new_v4();

        let user_books = set(&shared);
        // One similar borrower: similarity 2, 3 total books
        // contribution = min(2*0.7 + 3*0.01, 1.0) = 1.0
        let mut similar = HashMap::new();
        similar.insert("bob".to_string(), 2);
        let mut by_borrower = HashMap::new();
        by_borrower.insert("bob".to_string(), set(&[shared[0], shared[1], fresh]));

        let candidates = score(
            &catalog,
            &user_books,
            &similar,
            &by_borrower,
            &EngineTuning::default(),
            10,
        )
        .await
        .unwrap();

        assert_eq!(candidates[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_multiple_borrowers_accumulate_then_clamp() {
        let catalog = catalog_with_all_books();
        let shared = [Uuid::new_v4(), Uuid::new_v4()];
        let fresh = Uuid::new_v4();
        let user_books = set(&shared);

        let mut similar = HashMap::new();
        let mut by_borrower = HashMap::new();
        for name in ["bob", "carol"] {
            similar.insert(name.to_string(), 2);
            by_borrower.insert(name.to_string(), set(&[shared[0], shared[1], fresh]));
        }

        let candidates = score(
            &catalog,
            &user_books,
            &similar,
            &by_borrower,
            &EngineTuning::default(),
            10,
        )
        .await
        .unwrap();

        // Two contributions of 1.43 each would sum past 1.0; clamp holds
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_deleted_book_is_skipped() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_book_by_id().returning(|_| Ok(None));

        let shared = [Uuid::new_v4(), Uuid::new_v4()];
        let fresh = Uuid::new_v4();
        let user_books = set(&shared);
        let mut similar = HashMap::new();
        similar.insert("bob".to_string(), 2);
        let mut by_borrower = HashMap::new();
        by_borrower.insert("bob".to_string(), set(&[shared[0], shared[1], fresh]));

        let candidates = score(
            &catalog,
            &user_books,
            &similar,
            &by_borrower,
            &EngineTuning::default(),
            10,
        )
        .await
        .unwrap();

        assert!(candidates.is_empty());
    }
}

use crate::models::{Candidate, Recommendation};
use crate::stores::RecommendationStore;

/// Persists a batch of candidates under max-score-wins semantics
///
/// Personalized candidates are attached to the user; global ones
/// (POPULAR/TRENDING) are stored without a user id. The store's upsert keeps
/// the higher of the stored and incoming score for each (user, book) pair.
///
/// Best-effort batch semantics: a failure on one candidate is logged and
/// skipped, never aborting the rest. The caller receives exactly the rows
/// that are now effective in storage.
pub async fn persist_candidates(
    store: &dyn RecommendationStore,
    user_id: &str,
    candidates: &[Candidate],
) -> Vec<Recommendation> {
    let mut persisted = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let recommendation = Recommendation::from_candidate(candidate.clone(), user_id);
        match store.upsert(&recommendation).await {
            Ok(effective) => persisted.push(effective),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    book_id = %candidate.book_id,
                    "Failed to persist recommendation, continuing batch"
                );
            }
        }
    }

    tracing::debug!(
        requested = candidates.len(),
        persisted = persisted.len(),
        user_id = %user_id,
        "Recommendation batch persisted"
    );

    persisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::RecommendationType;
    use crate::stores::MockRecommendationStore;
    use uuid::Uuid;

    fn candidate(score: f64, rec_type: RecommendationType) -> Candidate {
        Candidate::clamped(Uuid::new_v4(), score, "r", rec_type)
    }

    #[tokio::test]
    async fn test_personalized_rows_carry_user_id() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_upsert()
            .withf(|rec| rec.user_id.as_deref() == Some("alice"))
            .returning(|rec| Ok(rec.clone()));

        let saved = persist_candidates(
            &store,
            "alice",
            &[candidate(0.5, RecommendationType::ContentBased)],
        )
        .await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].user_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_global_rows_carry_no_user_id() {
        let mut store = MockRecommendationStore::new();
        store
            .expect_upsert()
            .withf(|rec| rec.user_id.is_none())
            .returning(|rec| Ok(rec.clone()));

        let saved = persist_candidates(
            &store,
            "alice",
            &[
                candidate(0.8, RecommendationType::Popular),
                candidate(0.6, RecommendationType::Trending),
            ],
        )
        .await;
        assert_eq!(saved.len(), 2);
        assert!(saved.iter().all(|rec| rec.user_id.is_none()));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_batch() {
        let mut store = MockRecommendationStore::new();
        let mut calls = 0;
        store.expect_upsert().returning_st(move |rec| {
            calls += 1;
            if calls == 1 {
                Err(AppError::Internal("write failed".to_string()))
            } else {
                Ok(rec.clone())
            }
        });

        let saved = persist_candidates(
            &store,
            "alice",
            &[
                candidate(0.9, RecommendationType::Collaborative),
                candidate(0.5, RecommendationType::ContentBased),
                candidate(0.4, RecommendationType::ContentBased),
            ],
        )
        .await;

        // First upsert failed; the remaining two still went through
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn test_returns_effective_rows_from_store() {
        // The store keeps a higher previously stored score; the caller gets
        // that effective row back, not the losing candidate.
        let mut store = MockRecommendationStore::new();
        store.expect_upsert().returning(|rec| {
            Ok(Recommendation {
                score: 0.95,
                reason: "previously stored".to_string(),
                ..rec.clone()
            })
        });

        let saved = persist_candidates(
            &store,
            "alice",
            &[candidate(0.3, RecommendationType::Collaborative)],
        )
        .await;
        assert_eq!(saved[0].score, 0.95);
        assert_eq!(saved[0].reason, "previously stored");
    }
}

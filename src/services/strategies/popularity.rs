use crate::config::EngineTuning;
use crate::error::AppResult;
use crate::models::{Candidate, RecommendationType};
use crate::stores::LoanStore;

/// Scores the globally most-borrowed books
///
/// `score = min(loan_count / 10.0, 1.0)`; anything under the 0.1 floor is
/// dropped. Results are global (no user id) and the reason carries the
/// literal loan count.
pub async fn score(
    loans: &dyn LoanStore,
    tuning: &EngineTuning,
    limit: usize,
) -> AppResult<Vec<Candidate>> {
    // Over-fetch so that floor-dropped entries do not shrink the output
    let ranking = loans.most_borrowed_books(limit * 2).await?;

    let mut candidates = Vec::new();
    for entry in ranking {
        let score = (entry.loan_count as f64 / tuning.popularity_divisor).min(1.0);
        if score >= tuning.min_score_threshold {
            candidates.push(Candidate::clamped(
                entry.book_id,
                score,
                format!("Popular book borrowed {} times", entry.loan_count),
                RecommendationType::Popular,
            ));
        }

        if candidates.len() >= limit {
            break;
        }
    }

    Ok(candidates)
}

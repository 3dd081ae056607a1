use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::EngineTuning;
use crate::error::AppResult;
use crate::models::{Candidate, RecommendationType};
use crate::stores::LoanStore;

/// Scores books by loan velocity inside a fixed lookback window
///
/// Counts loans from the last 30 days, independent of total history;
/// `score = min(recent_count / 5.0, 1.0)` with the same 0.1 floor as
/// popularity. Results are global (no user id).
///
/// `now` is passed in rather than sampled here so two runs over the same
/// loan data rank identically.
pub async fn score(
    loans: &dyn LoanStore,
    tuning: &EngineTuning,
    limit: usize,
    now: DateTime<Utc>,
) -> AppResult<Vec<Candidate>> {
    let cutoff = now - Duration::days(tuning.trending_days_lookback);
    let recent = loans.recent_loans(cutoff).await?;

    let mut recent_counts: HashMap<Uuid, usize> = HashMap::new();
    for loan in recent {
        if loan.created_at >= cutoff {
            *recent_counts.entry(loan.book_id).or_default() += 1;
        }
    }

    let mut ranked: Vec<(Uuid, usize)> = recent_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);

    let candidates = ranked
        .into_iter()
        .filter_map(|(book_id, count)| {
            let score = (count as f64 / tuning.trending_divisor).min(1.0);
            if score >= tuning.min_score_threshold {
                Some(Candidate::clamped(
                    book_id,
                    score,
                    format!("Trending book with {} recent loans", count),
                    RecommendationType::Trending,
                ))
            } else {
                None
            }
        })
        .collect();

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanRecord;
    use crate::stores::MockLoanStore;

    fn loan(book_id: Uuid, days_ago: i64, now: DateTime<Utc>) -> LoanRecord {
        LoanRecord {
            book_id,
            borrower_id: None,
            genre: None,
            author_ids: vec![],
            created_at: now - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn test_five_recent_loans_saturate_at_one() {
        let now = Utc::now();
        let book = Uuid::new_v4();
        let mut loans = MockLoanStore::new();
        loans.expect_recent_loans().returning(move |_| {
            Ok((0..5).map(|d| loan(book, d, now)).collect())
        });

        let candidates = score(&loans, &EngineTuning::default(), 10, now)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 1.0);
        assert_eq!(candidates[0].reason, "Trending book with 5 recent loans");
        assert_eq!(candidates[0].rec_type, RecommendationType::Trending);
    }

    #[tokio::test]
    async fn test_loans_outside_window_are_ignored() {
        let now = Utc::now();
        let book = Uuid::new_v4();
        let mut loans = MockLoanStore::new();
        // Store over-returns: one loan inside the window, two stale ones
        loans.expect_recent_loans().returning(move |_| {
            Ok(vec![
                loan(book, 3, now),
                loan(book, 45, now),
                loan(book, 90, now),
            ])
        });

        let candidates = score(&loans, &EngineTuning::default(), 10, now)
            .await
            .unwrap();
        // One in-window loan scores 0.2, stale loans did not count
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_books_ranked_by_recent_count() {
        let now = Utc::now();
        let hot = Uuid::new_v4();
        let warm = Uuid::new_v4();
        let mut loans = MockLoanStore::new();
        loans.expect_recent_loans().returning(move |_| {
            let mut all: Vec<LoanRecord> = (0..4).map(|d| loan(hot, d, now)).collect();
            all.push(loan(warm, 1, now));
            Ok(all)
        });

        let candidates = score(&loans, &EngineTuning::default(), 10, now)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].book_id, hot);
        assert!((candidates[0].score - 0.8).abs() < 1e-9);
        assert_eq!(candidates[1].book_id, warm);
    }

    #[tokio::test]
    async fn test_no_recent_loans_yields_empty() {
        let now = Utc::now();
        let mut loans = MockLoanStore::new();
        loans.expect_recent_loans().returning(|_| Ok(vec![]));

        let candidates = score(&loans, &EngineTuning::default(), 10, now)
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }
}

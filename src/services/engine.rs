use chrono::Utc;
use std::sync::Arc;

use crate::config::EngineTuning;
use crate::error::AppResult;
use crate::models::Candidate;
use crate::services::{aggregate, preferences, similarity, strategies};
use crate::stores::{CatalogStore, LoanStore};

/// Orchestrates the scoring pipeline for one recommendation request
///
/// Generation is a pure read-only computation over a snapshot of loan and
/// catalog data: the engine holds only store handles and tuning constants,
/// so concurrent requests for different users share no mutable state.
pub struct RecommendationEngine {
    loans: Arc<dyn LoanStore>,
    catalog: Arc<dyn CatalogStore>,
    tuning: EngineTuning,
}

impl RecommendationEngine {
    pub fn new(
        loans: Arc<dyn LoanStore>,
        catalog: Arc<dyn CatalogStore>,
        tuning: EngineTuning,
    ) -> Self {
        Self {
            loans,
            catalog,
            tuning,
        }
    }

    /// Resolves the caller's requested limit
    ///
    /// A missing limit falls back to the default; non-positive limits
    /// degrade to zero (an empty result, never an error) and anything above
    /// the cap is clamped down.
    pub fn clamp_limit(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.tuning.default_limit,
            Some(n) if n <= 0 => 0,
            Some(n) => (n as usize).min(self.tuning.max_limit),
        }
    }

    /// Generates up to `limit` recommendations for one user
    ///
    /// Users with loan history get collaborative + content-based + popular
    /// candidates; cold users fall back to popular + trending only. Each
    /// strategy is allotted a share of the limit before the merge; the
    /// aggregator deduplicates by book under max-score-wins and truncates.
    ///
    /// A failing strategy degrades to an empty contribution rather than
    /// failing the request, so a partial result always beats a broken one.
    pub async fn recommend(&self, user_id: &str, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let user_loans = match self.loans.loans_by_user(user_id).await {
            Ok(loans) => loans,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to load loan history, falling back to global strategies");
                Vec::new()
            }
        };

        let mut collected = Vec::new();

        if user_loans.is_empty() {
            // Cold user: no personal signal to score against
            let per_strategy = (limit / 2).max(1);
            let (popular, trending) = tokio::join!(
                self.popular(per_strategy),
                self.trending(per_strategy)
            );
            collected.extend(Self::or_degraded("popularity", popular));
            collected.extend(Self::or_degraded("trending", trending));
        } else {
            let per_strategy = (limit / 3).max(1);
            let user_books = similarity::borrowed_book_ids(&user_loans);
            let prefs = preferences::extract(&user_loans);

            let (collaborative, content, popular) = tokio::join!(
                self.collaborative(user_id, &user_books, per_strategy),
                strategies::content_based::score(
                    self.catalog.as_ref(),
                    &prefs,
                    &user_books,
                    &self.tuning,
                    per_strategy,
                ),
                self.popular(per_strategy)
            );
            collected.extend(Self::or_degraded("collaborative", collaborative));
            collected.extend(Self::or_degraded("content-based", content));
            collected.extend(Self::or_degraded("popularity", popular));
        }

        let merged = aggregate::merge_candidates(collected, limit);

        tracing::debug!(
            user_id = %user_id,
            limit,
            produced = merged.len(),
            "Recommendation pipeline finished"
        );

        Ok(merged)
    }

    /// Global popularity ranking, not tied to any user
    pub async fn popular(&self, limit: usize) -> AppResult<Vec<Candidate>> {
        strategies::popularity::score(self.loans.as_ref(), &self.tuning, limit).await
    }

    /// Global trending ranking over the lookback window
    pub async fn trending(&self, limit: usize) -> AppResult<Vec<Candidate>> {
        strategies::trending::score(self.loans.as_ref(), &self.tuning, limit, Utc::now()).await
    }

    async fn collaborative(
        &self,
        user_id: &str,
        user_books: &std::collections::HashSet<uuid::Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Candidate>> {
        if user_books.is_empty() {
            return Ok(Vec::new());
        }

        let grouped = self.loans.loans_grouped_by_borrower().await?;
        let by_borrower = similarity::books_by_borrower(&grouped, user_id);
        let similar = similarity::find_similar_borrowers(
            user_books,
            &by_borrower,
            self.tuning.similarity_threshold,
        );

        strategies::collaborative::score(
            self.catalog.as_ref(),
            user_books,
            &similar,
            &by_borrower,
            &self.tuning,
            limit,
        )
        .await
    }

    fn or_degraded(strategy: &str, result: AppResult<Vec<Candidate>>) -> Vec<Candidate> {
        match result {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, strategy, "Strategy failed, contributing nothing");
                Vec::new()
            }
        }
    }
}

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Author, Book, BookLoanCount, LoanRecord, Recommendation};

pub mod catalog;
pub mod loans;
pub mod recommendations;

pub use catalog::PgCatalogStore;
pub use loans::PgLoanStore;
pub use recommendations::PgRecommendationStore;

/// Read-only access to loan history
///
/// The engine consumes loans purely as scoring signal; loan CRUD and
/// ownership live elsewhere. Handles are passed explicitly into each
/// component at construction, so there is no ambient repository state.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LoanStore: Send + Sync {
    /// All loans taken out by one user, oldest first
    async fn loans_by_user(&self, user_id: &str) -> AppResult<Vec<LoanRecord>>;

    /// The entire loan history, grouped by borrower (anonymous loans omitted)
    async fn loans_grouped_by_borrower(&self) -> AppResult<HashMap<String, Vec<LoanRecord>>>;

    /// Global loan-count ranking, pre-sorted descending
    async fn most_borrowed_books(&self, limit: usize) -> AppResult<Vec<BookLoanCount>>;

    /// Loans created at or after the given instant
    async fn recent_loans(&self, since: DateTime<Utc>) -> AppResult<Vec<LoanRecord>>;
}

/// Read-only access to the book/author catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up a single book; `None` if it was deleted mid-computation
    async fn book_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// All books of a genre, matched case-insensitively
    async fn books_by_genre(&self, genre: &str) -> AppResult<Vec<Book>>;

    /// Looks up an author together with their owned book ids
    async fn author_by_id(&self, id: Uuid) -> AppResult<Option<Author>>;
}

/// Durable storage for recommendation rows
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// The effective stored row for a (user, book) pair, if any
    async fn find_by_user_and_book(
        &self,
        user_id: &str,
        book_id: Uuid,
    ) -> AppResult<Option<Recommendation>>;

    /// Stores one recommendation under max-score-wins semantics
    ///
    /// For a personalized row: inserts when no row exists for the
    /// (user, book) pair, overwrites score/reason/type when the new score is
    /// strictly greater, and otherwise leaves the stored row untouched.
    /// Returns the effective row either way. Global rows (no user id) are
    /// appended unconditionally. Implementations must serialize concurrent
    /// upserts for the same pair so a lower score can never win a race.
    async fn upsert(&self, recommendation: &Recommendation) -> AppResult<Recommendation>;
}

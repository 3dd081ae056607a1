use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod preferences;

pub use preferences::PreferenceVector;

/// A book in the catalog, as read by the recommendation engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub genre: Option<String>,
    pub author_ids: Vec<Uuid>,
}

/// An author with the ids of the books they wrote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub book_ids: Vec<Uuid>,
}

/// A single loan event, read-only signal for scoring
///
/// `borrower_id` is nullable: walk-in loans are recorded without an account
/// and contribute to popularity/trending counts but not to any user profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanRecord {
    pub book_id: Uuid,
    pub borrower_id: Option<String>,
    pub genre: Option<String>,
    pub author_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Which strategy produced a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Collaborative,
    ContentBased,
    Popular,
    Trending,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Collaborative => "COLLABORATIVE",
            RecommendationType::ContentBased => "CONTENT_BASED",
            RecommendationType::Popular => "POPULAR",
            RecommendationType::Trending => "TRENDING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COLLABORATIVE" => Some(RecommendationType::Collaborative),
            "CONTENT_BASED" => Some(RecommendationType::ContentBased),
            "POPULAR" => Some(RecommendationType::Popular),
            "TRENDING" => Some(RecommendationType::Trending),
            _ => None,
        }
    }

    /// Popular and Trending results are global: they carry no user id.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            RecommendationType::Popular | RecommendationType::Trending
        )
    }
}

/// An unpersisted scoring result produced by a single strategy
///
/// Candidates carry no id or timestamp so that two runs over the same input
/// data produce identical lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub book_id: Uuid,
    pub score: f64,
    pub reason: String,
    #[serde(rename = "type")]
    pub rec_type: RecommendationType,
}

impl Candidate {
    /// Creates a candidate with the score clamped into [0.0, 1.0]
    ///
    /// Clamping happens here, at generation time; stored rows are never
    /// re-clamped.
    pub fn clamped(
        book_id: Uuid,
        score: f64,
        reason: impl Into<String>,
        rec_type: RecommendationType,
    ) -> Self {
        Self {
            book_id,
            score: score.clamp(0.0, 1.0),
            reason: reason.into(),
            rec_type,
        }
    }
}

/// A persisted recommendation row
///
/// `user_id` is `None` exactly when the type is global (POPULAR/TRENDING).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub book_id: Uuid,
    pub score: f64,
    pub reason: String,
    #[serde(rename = "type")]
    pub rec_type: RecommendationType,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    /// Builds a fresh row from a candidate, attaching the user for
    /// personalized types and leaving global types unattached.
    pub fn from_candidate(candidate: Candidate, user_id: &str) -> Self {
        let user_id = if candidate.rec_type.is_global() {
            None
        } else {
            Some(user_id.to_string())
        };

        Self {
            id: Uuid::new_v4(),
            user_id,
            book_id: candidate.book_id,
            score: candidate.score,
            reason: candidate.reason,
            rec_type: candidate.rec_type,
            created_at: Utc::now(),
        }
    }
}

/// One entry of the global loan-count ranking, pre-sorted by the Loan Store
#[derive(Debug, Clone, PartialEq)]
pub struct BookLoanCount {
    pub book_id: Uuid,
    pub title: String,
    pub loan_count: i64,
}

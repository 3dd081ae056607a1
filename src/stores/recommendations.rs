use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Recommendation, RecommendationType};
use crate::stores::RecommendationStore;

/// Postgres-backed recommendation storage
///
/// Max-score-wins is enforced here with a transaction-scoped advisory lock
/// on the (user, book) pair rather than a uniqueness constraint. A row lock
/// alone would not do: two first-time upserts for the same pair would both
/// see no row, both insert, and the lower score could end up as the
/// effective row. The advisory lock serializes the whole lookup-then-write,
/// inserts included.
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn recommendation_from_row(row: &PgRow) -> AppResult<Recommendation> {
    let type_str: String = row.try_get("type").map_err(AppError::Database)?;
    let rec_type = RecommendationType::from_str(&type_str)
        .ok_or_else(|| AppError::Internal(format!("Unknown recommendation type: {}", type_str)))?;

    Ok(Recommendation {
        id: row.try_get("id").map_err(AppError::Database)?,
        user_id: row.try_get("user_id").map_err(AppError::Database)?,
        book_id: row.try_get("book_id").map_err(AppError::Database)?,
        score: row.try_get("score").map_err(AppError::Database)?,
        reason: row.try_get("reason").map_err(AppError::Database)?,
        rec_type,
        created_at: row.try_get("created_at").map_err(AppError::Database)?,
    })
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn find_by_user_and_book(
        &self,
        user_id: &str,
        book_id: Uuid,
    ) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, score, reason, type, created_at
            FROM recommendations
            WHERE user_id = $1 AND book_id = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(recommendation_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, recommendation: &Recommendation) -> AppResult<Recommendation> {
        let Some(user_id) = &recommendation.user_id else {
            // Global rows are append-only snapshots, no dedup lookup
            sqlx::query(
                r#"
                INSERT INTO recommendations (id, user_id, book_id, score, reason, type, created_at)
                VALUES ($1, NULL, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(recommendation.id)
            .bind(recommendation.book_id)
            .bind(recommendation.score)
            .bind(&recommendation.reason)
            .bind(recommendation.rec_type.as_str())
            .bind(recommendation.created_at)
            .execute(&self.pool)
            .await?;

            return Ok(recommendation.clone());
        };

        let mut tx = self.pool.begin().await?;

        // Serialize concurrent upserts for this pair before the lookup. The
        // lock is released at commit/rollback and, unlike FOR UPDATE, also
        // covers the case where no row exists yet.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{}:{}", user_id, recommendation.book_id))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query(
            r#"
            SELECT id, user_id, book_id, score, reason, type, created_at
            FROM recommendations
            WHERE user_id = $1 AND book_id = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(recommendation.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let effective = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO recommendations (id, user_id, book_id, score, reason, type, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(recommendation.id)
                .bind(user_id)
                .bind(recommendation.book_id)
                .bind(recommendation.score)
                .bind(&recommendation.reason)
                .bind(recommendation.rec_type.as_str())
                .bind(recommendation.created_at)
                .execute(&mut *tx)
                .await?;

                recommendation.clone()
            }
            Some(row) => {
                let stored = recommendation_from_row(&row)?;
                if recommendation.score > stored.score {
                    // created_at stays as originally set
                    sqlx::query(
                        r#"
                        UPDATE recommendations
                        SET score = $1, reason = $2, type = $3
                        WHERE id = $4
                        "#,
                    )
                    .bind(recommendation.score)
                    .bind(&recommendation.reason)
                    .bind(recommendation.rec_type.as_str())
                    .bind(stored.id)
                    .execute(&mut *tx)
                    .await?;

                    Recommendation {
                        score: recommendation.score,
                        reason: recommendation.reason.clone(),
                        rec_type: recommendation.rec_type,
                        ..stored
                    }
                } else {
                    stored
                }
            }
        };

        tx.commit().await?;
        Ok(effective)
    }
}

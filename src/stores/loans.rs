use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::{BookLoanCount, LoanRecord};
use crate::stores::LoanStore;

/// Postgres-backed loan history reader
pub struct PgLoanStore {
    pool: PgPool,
}

impl PgLoanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn loan_from_row(row: &PgRow) -> Result<LoanRecord, sqlx::Error> {
    Ok(LoanRecord {
        book_id: row.try_get("book_id")?,
        borrower_id: row.try_get("borrower_id")?,
        genre: row.try_get("genre")?,
        author_ids: row.try_get("author_ids")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait::async_trait]
impl LoanStore for PgLoanStore {
    async fn loans_by_user(&self, user_id: &str) -> AppResult<Vec<LoanRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT l.book_id, l.borrower_id, b.genre,
                   array_remove(array_agg(ba.author_id), NULL) AS author_ids,
                   l.created_at
            FROM loans l
            JOIN books b ON b.id = l.book_id
            LEFT JOIN book_authors ba ON ba.book_id = l.book_id
            WHERE l.borrower_id = $1
            GROUP BY l.id, l.book_id, l.borrower_id, b.genre, l.created_at
            ORDER BY l.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let loans = rows
            .iter()
            .map(loan_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(loans)
    }

    async fn loans_grouped_by_borrower(&self) -> AppResult<HashMap<String, Vec<LoanRecord>>> {
        let rows = sqlx::query(
            r#"
            SELECT l.book_id, l.borrower_id, b.genre,
                   array_remove(array_agg(ba.author_id), NULL) AS author_ids,
                   l.created_at
            FROM loans l
            JOIN books b ON b.id = l.book_id
            LEFT JOIN book_authors ba ON ba.book_id = l.book_id
            WHERE l.borrower_id IS NOT NULL
            GROUP BY l.id, l.book_id, l.borrower_id, b.genre, l.created_at
            ORDER BY l.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<LoanRecord>> = HashMap::new();
        for row in &rows {
            let loan = loan_from_row(row)?;
            if let Some(borrower) = loan.borrower_id.clone() {
                grouped.entry(borrower).or_default().push(loan);
            }
        }

        Ok(grouped)
    }

    async fn most_borrowed_books(&self, limit: usize) -> AppResult<Vec<BookLoanCount>> {
        let rows = sqlx::query(
            r#"
            SELECT l.book_id, b.title, COUNT(*) AS loan_count
            FROM loans l
            JOIN books b ON b.id = l.book_id
            GROUP BY l.book_id, b.title
            ORDER BY loan_count DESC, b.title
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let ranking = rows
            .iter()
            .map(|row| {
                Ok(BookLoanCount {
                    book_id: row.try_get("book_id")?,
                    title: row.try_get("title")?,
                    loan_count: row.try_get("loan_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(ranking)
    }

    async fn recent_loans(&self, since: DateTime<Utc>) -> AppResult<Vec<LoanRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT l.book_id, l.borrower_id, b.genre,
                   array_remove(array_agg(ba.author_id), NULL) AS author_ids,
                   l.created_at
            FROM loans l
            JOIN books b ON b.id = l.book_id
            LEFT JOIN book_authors ba ON ba.book_id = l.book_id
            WHERE l.created_at >= $1
            GROUP BY l.id, l.book_id, l.borrower_id, b.genre, l.created_at
            ORDER BY l.created_at
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let loans = rows
            .iter()
            .map(loan_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(loans)
    }
}

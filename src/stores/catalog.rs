use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Author, Book};
use crate::stores::CatalogStore;

/// Postgres-backed catalog reader
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        author_ids: row.try_get("author_ids")?,
    })
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn book_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT b.id, b.title, b.genre,
                   array_remove(array_agg(ba.author_id), NULL) AS author_ids
            FROM books b
            LEFT JOIN book_authors ba ON ba.book_id = b.id
            WHERE b.id = $1
            GROUP BY b.id, b.title, b.genre
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(book_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn books_by_genre(&self, genre: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.title, b.genre,
                   array_remove(array_agg(ba.author_id), NULL) AS author_ids
            FROM books b
            LEFT JOIN book_authors ba ON ba.book_id = b.id
            WHERE lower(b.genre) = lower($1)
            GROUP BY b.id, b.title, b.genre
            ORDER BY b.title
            "#,
        )
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;

        let books = rows
            .iter()
            .map(book_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn author_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.name,
                   array_remove(array_agg(ba.book_id), NULL) AS book_ids
            FROM authors a
            LEFT JOIN book_authors ba ON ba.author_id = a.id
            WHERE a.id = $1
            GROUP BY a.id, a.name
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Author {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                book_ids: row.try_get("book_ids")?,
            })),
            None => Ok(None),
        }
    }
}

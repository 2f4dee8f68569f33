//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookField, CreateBook, QuantityUpdate, UpdateBook},
};

/// Book collection of the credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// All books in insertion order
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// First book (insertion order) whose `field` equals `value` exactly
    async fn find_one(&self, field: BookField, value: &str) -> AppResult<Option<Book>>;

    /// Insert a book; an ISBN already present yields `AppError::Conflict`
    async fn create(&self, book: &CreateBook) -> AppResult<Book>;

    /// Apply a partial update to the book matching `isbn`
    async fn update_by_isbn(&self, isbn: &str, patch: &UpdateBook) -> AppResult<Option<Book>>;

    /// Returns false when no book matched
    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool>;

    /// Add `delta` to the quantity of book `id` in a single conditional write.
    ///
    /// The write only applies when the resulting quantity stays non-negative;
    /// otherwise [`QuantityUpdate::Insufficient`] is reported and nothing changes.
    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<QuantityUpdate>;
}

pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, isbn, title, author, published_year, quantity FROM books ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, isbn, title, author, published_year, quantity FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_one(&self, field: BookField, value: &str) -> AppResult<Option<Book>> {
        let sql = format!(
            "SELECT id, isbn, title, author, published_year, quantity FROM books \
             WHERE {} = $1 ORDER BY created_at, id LIMIT 1",
            field.column()
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, isbn, title, author, published_year, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, isbn, title, author, published_year, quantity
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.published_year)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Book with this ISBN already exists"))
    }

    async fn update_by_isbn(&self, isbn: &str, patch: &UpdateBook) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                isbn = COALESCE($2, isbn),
                title = COALESCE($3, title),
                author = COALESCE($4, author),
                published_year = COALESCE($5, published_year),
                quantity = COALESCE($6, quantity)
            WHERE isbn = $1
            RETURNING id, isbn, title, author, published_year, quantity
            "#,
        )
        .bind(isbn)
        .bind(&patch.isbn)
        .bind(&patch.title)
        .bind(&patch.author)
        .bind(patch.published_year)
        .bind(patch.quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Book with this ISBN already exists"))
    }

    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<QuantityUpdate> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET quantity = quantity + $2
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING id, isbn, title, author, published_year, quantity
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(book) = updated {
            return Ok(QuantityUpdate::Updated(book));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists {
            QuantityUpdate::Insufficient
        } else {
            QuantityUpdate::Missing
        })
    }
}

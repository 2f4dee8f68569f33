//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserRow},
};

use super::books::unique_violation;

/// User collection of the credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a new user document; a taken email yields `AppError::Conflict`
    async fn create(&self, user: &User) -> AppResult<User>;

    /// Overwrite the stored document with `user` (last write wins)
    async fn save(&self, user: &User) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password, borrowed_books, returned_books
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password, borrowed_books, returned_books
            FROM users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password, borrowed_books, returned_books)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password, borrowed_books, returned_books
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(Json(&user.borrowed_books))
        .bind(Json(&user.returned_books))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "User already exists. Please log in."))?;

        Ok(row.into())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                password = $4,
                borrowed_books = $5,
                returned_books = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(Json(&user.borrowed_books))
        .bind(Json(&user.returned_books))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

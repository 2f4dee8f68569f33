//! User model, loan entries and access token claims

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Upper bound on simultaneously borrowed books per user
pub const MAX_BORROWED_BOOKS: usize = 3;

/// Active loan as recorded on the user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub book_id: Uuid,
    pub book_title: String,
    pub borrow_time: DateTime<Utc>,
}

/// Loan history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedBook {
    pub book_id: Uuid,
    pub book_title: String,
    pub return_time: DateTime<Utc>,
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    borrowed_books: Json<Vec<BorrowedBook>>,
    returned_books: Json<Vec<ReturnedBook>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            borrowed_books: row.borrowed_books.0,
            returned_books: row.returned_books.0,
        }
    }
}

/// Full user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub borrowed_books: Vec<BorrowedBook>,
    pub returned_books: Vec<ReturnedBook>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password: password_hash,
            borrowed_books: Vec::new(),
            returned_books: Vec::new(),
        }
    }

    pub fn has_borrowed(&self, book_id: Uuid) -> bool {
        self.borrowed_books.iter().any(|b| b.book_id == book_id)
    }

    pub fn at_borrow_limit(&self) -> bool {
        self.borrowed_books.len() >= MAX_BORROWED_BOOKS
    }
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// JWT claims for an access token; `sub` is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl AccessClaims {
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token; expired tokens are rejected without leeway
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}

//! In-memory store adapter
//!
//! Keeps both collections in insertion-ordered maps so that "first match"
//! lookups behave like a natural-order scan of a document collection. Each
//! method holds the collection lock for its whole read-modify-write, which
//! gives the same single-document atomicity as the database adapter.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookField, CreateBook, QuantityUpdate, UpdateBook},
        user::User,
    },
};

use super::{books::BooksRepository, users::UsersRepository};

#[derive(Default)]
pub struct MemoryStore {
    books: RwLock<IndexMap<Uuid, Book>>,
    users: RwLock<IndexMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn find_one(&self, field: BookField, value: &str) -> AppResult<Option<Book>> {
        Ok(self
            .books
            .read()
            .await
            .values()
            .find(|book| field.value_of(book) == value)
            .cloned())
    }

    async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut books = self.books.write().await;
        if books.values().any(|b| b.isbn == book.isbn) {
            return Err(AppError::Conflict(
                "Book with this ISBN already exists".to_string(),
            ));
        }
        let created = Book {
            id: Uuid::new_v4(),
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            published_year: book.published_year,
            quantity: book.quantity,
        };
        books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_by_isbn(&self, isbn: &str, patch: &UpdateBook) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(id) = books.values().find(|b| b.isbn == isbn).map(|b| b.id) else {
            return Ok(None);
        };
        if let Some(ref new_isbn) = patch.isbn {
            if books.values().any(|b| b.isbn == *new_isbn && b.id != id) {
                return Err(AppError::Conflict(
                    "Book with this ISBN already exists".to_string(),
                ));
            }
        }
        Ok(books.get_mut(&id).map(|book| {
            patch.apply_to(book);
            book.clone()
        }))
    }

    async fn delete_by_isbn(&self, isbn: &str) -> AppResult<bool> {
        let mut books = self.books.write().await;
        let id = books.values().find(|b| b.isbn == isbn).map(|b| b.id);
        Ok(id.and_then(|id| books.shift_remove(&id)).is_some())
    }

    async fn adjust_quantity(&self, id: Uuid, delta: i32) -> AppResult<QuantityUpdate> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(&id) else {
            return Ok(QuantityUpdate::Missing);
        };
        match book.quantity.checked_add(delta) {
            Some(quantity) if quantity >= 0 => {
                book.quantity = quantity;
                Ok(QuantityUpdate::Updated(book.clone()))
            }
            _ => Ok(QuantityUpdate::Insufficient),
        }
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict(
                "User already exists. Please log in.".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        match self.users.write().await.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }
}

//! Circulation service: borrowing and returning books
//!
//! A loan is not stored on its own. It exists as an entry in the user's
//! `borrowed_books` list plus one missing copy in the book's `quantity`, and
//! the two documents are written one after the other, user first. If the
//! process stops between the two writes the user side is ahead of the book
//! side. Quantity changes themselves are atomic and never go below zero.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, QuantityUpdate},
        user::{BorrowedBook, ReturnedBook, User},
        Outcome,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn load_book(&self, book_id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    async fn load_user(&self, user_id: Uuid) -> AppResult<User> {
        self.repository
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Borrow one copy of `book_id` for `user_id`
    pub async fn borrow(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Outcome> {
        let book = self.load_book(book_id).await?;
        if book.quantity <= 0 {
            return Ok(Outcome::Unavailable);
        }

        let mut user = self.load_user(user_id).await?;
        if user.at_borrow_limit() {
            return Ok(Outcome::LimitReached);
        }
        if user.has_borrowed(book_id) {
            return Ok(Outcome::AlreadyBorrowed);
        }

        user.borrowed_books.push(BorrowedBook {
            book_id,
            book_title: book.title.clone(),
            borrow_time: Utc::now(),
        });
        self.repository.users.save(&user).await?;

        match self.repository.books.adjust_quantity(book_id, -1).await? {
            QuantityUpdate::Updated(book) => {
                tracing::info!(
                    "Borrow: user={} book={} remaining={}",
                    user_id, book_id, book.quantity
                );
                Ok(Outcome::Borrowed)
            }
            QuantityUpdate::Missing => {
                tracing::warn!(
                    "Borrow: book {} vanished after user {} was updated; loan entry kept",
                    book_id, user_id
                );
                Err(AppError::NotFound("Book not found".to_string()))
            }
            QuantityUpdate::Insufficient => {
                // Another borrower took the last copy after our availability check
                user.borrowed_books.retain(|entry| entry.book_id != book_id);
                self.repository.users.save(&user).await?;
                tracing::info!(
                    "Borrow: book {} ran out while user {} was borrowing it",
                    book_id, user_id
                );
                Ok(Outcome::Unavailable)
            }
        }
    }

    /// Return a borrowed copy of `book_id` for `user_id`
    pub async fn return_book(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Outcome> {
        let book = self.load_book(book_id).await?;
        let mut user = self.load_user(user_id).await?;

        let index = user
            .borrowed_books
            .iter()
            .position(|entry| entry.book_id == book_id)
            .ok_or_else(|| AppError::NotFound("Book is not borrowed by the user".to_string()))?;

        user.borrowed_books.remove(index);
        user.returned_books.push(ReturnedBook {
            book_id,
            book_title: book.title,
            return_time: Utc::now(),
        });
        self.repository.users.save(&user).await?;

        match self.repository.books.adjust_quantity(book_id, 1).await? {
            QuantityUpdate::Updated(book) => {
                tracing::info!(
                    "Return: user={} book={} remaining={}",
                    user_id, book_id, book.quantity
                );
                Ok(Outcome::Returned)
            }
            QuantityUpdate::Missing => {
                tracing::warn!(
                    "Return: book {} vanished after user {} was updated; history entry kept",
                    book_id, user_id
                );
                Err(AppError::NotFound("Book not found".to_string()))
            }
            QuantityUpdate::Insufficient => Err(AppError::Internal(format!(
                "Quantity of book {} cannot be incremented",
                book_id
            ))),
        }
    }
}

//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{is_valid_isbn, Book, BookField, CreateBook, UpdateBook, INVALID_ISBN_MESSAGE},
        Outcome,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List every book
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Add a book. A second book with the same ISBN is a soft denial, not an error.
    pub async fn add_book(&self, book: CreateBook) -> AppResult<Outcome> {
        if !is_valid_isbn(&book.isbn) {
            return Err(AppError::Validation(INVALID_ISBN_MESSAGE.to_string()));
        }
        book.validate()?;

        if self
            .repository
            .books
            .find_one(BookField::Isbn, &book.isbn)
            .await?
            .is_some()
        {
            tracing::info!("Catalog add: ISBN {} already present", book.isbn);
            return Ok(Outcome::BookAlreadyAvailable);
        }

        match self.repository.books.create(&book).await {
            Ok(created) => {
                tracing::info!("Catalog add: stored book id={} isbn={}", created.id, created.isbn);
                Ok(Outcome::BookStored)
            }
            // Lost an insert race against the same ISBN
            Err(AppError::Conflict(_)) => Ok(Outcome::BookAlreadyAvailable),
            Err(e) => Err(e),
        }
    }

    /// Apply a partial update to the book identified by `isbn`
    pub async fn update_book(&self, isbn: &str, patch: UpdateBook) -> AppResult<Book> {
        if let Some(ref new_isbn) = patch.isbn {
            if !is_valid_isbn(new_isbn) {
                return Err(AppError::Validation(INVALID_ISBN_MESSAGE.to_string()));
            }
        }
        patch.validate()?;

        self.repository
            .books
            .update_by_isbn(isbn, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Delete the book identified by `isbn`
    pub async fn delete_book(&self, isbn: &str) -> AppResult<()> {
        if !self.repository.books.delete_by_isbn(isbn).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        tracing::info!("Catalog delete: removed isbn={}", isbn);
        Ok(())
    }

    /// Exact-match lookup: title first, then author, then ISBN
    pub async fn search_books(&self, query: &str) -> AppResult<Book> {
        for field in BookField::SEARCH_ORDER {
            if let Some(book) = self.repository.books.find_one(field, query).await? {
                return Ok(book);
            }
        }
        Err(AppError::NotFound(
            "Book is not available in database".to_string(),
        ))
    }
}

//! Book (catalog record) model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Accepted ISBN layout: 978-NN-NNNNN-NN-N
static ISBN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^978-[0-9]{2}-[0-9]{5}-[0-9]{2}-[0-9]$").expect("ISBN pattern is valid")
});

pub const INVALID_ISBN_MESSAGE: &str =
    "Invalid ISBN number, the format should be like 978-XX-XXXXX-XX-X";

/// Check an ISBN against the catalog format
pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_PATTERN.is_match(isbn)
}

/// Book record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub published_year: i32,
    /// Copies currently on the shelf
    pub quantity: i32,
}

/// Add book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[serde(rename = "ISBN", alias = "isbn")]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub published_year: i32,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

/// Partial update of a book; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[serde(rename = "ISBN", alias = "isbn")]
    pub isbn: Option<String>,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    pub published_year: Option<i32>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
}

impl UpdateBook {
    /// Apply the present fields onto a stored record
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref author) = self.author {
            book.author = author.clone();
        }
        if let Some(year) = self.published_year {
            book.published_year = year;
        }
        if let Some(quantity) = self.quantity {
            book.quantity = quantity;
        }
    }
}

/// Searchable book fields, probed in this order by catalog search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Isbn,
}

impl BookField {
    pub const SEARCH_ORDER: [BookField; 3] = [BookField::Title, BookField::Author, BookField::Isbn];

    pub fn column(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Isbn => "isbn",
        }
    }

    pub fn value_of<'a>(&self, book: &'a Book) -> &'a str {
        match self {
            BookField::Title => &book.title,
            BookField::Author => &book.author,
            BookField::Isbn => &book.isbn,
        }
    }
}

/// Book search query
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookSearchQuery {
    /// Exact title, author or ISBN
    #[serde(default)]
    pub data: String,
}

/// Result of an atomic quantity adjustment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated(Book),
    /// The book exists but the change would drive quantity below zero
    Insufficient,
    Missing,
}

//! Data models for Libris

pub mod book;
pub mod outcome;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookField, CreateBook, QuantityUpdate, UpdateBook};
pub use outcome::{MessageResponse, Outcome};
pub use user::{AccessClaims, BorrowedBook, ReturnedBook, User};

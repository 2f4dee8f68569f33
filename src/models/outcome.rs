//! Successful operation outcomes, including soft denials
//!
//! A soft denial is a business-rule refusal that is answered with HTTP 200
//! and an explanatory message rather than with an error status.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    BookStored,
    BookAlreadyAvailable,
    Borrowed,
    Returned,
    Unavailable,
    LimitReached,
    AlreadyBorrowed,
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::BookStored => "Book data stored successfully",
            Outcome::BookAlreadyAvailable => "Book already available in library data",
            Outcome::Borrowed => "Book borrowed",
            Outcome::Returned => "Book returned",
            Outcome::Unavailable => "Book is unavailable right now, please come back later",
            Outcome::LimitReached => {
                "You have borrowed the maximum number of books, please return some to borrow more"
            }
            Outcome::AlreadyBorrowed => "Book is already borrowed by the user",
        }
    }

    /// True when the request was refused without touching any document
    pub fn is_soft_denial(&self) -> bool {
        matches!(
            self,
            Outcome::BookAlreadyAvailable
                | Outcome::Unavailable
                | Outcome::LimitReached
                | Outcome::AlreadyBorrowed
        )
    }
}

/// Plain message body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub msg: String,
}

impl From<Outcome> for MessageResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            msg: outcome.message().to_string(),
        }
    }
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

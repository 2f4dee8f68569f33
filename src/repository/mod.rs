//! Repository layer for the credential store
//!
//! Each collection is reached through a trait object so services receive the
//! store handle explicitly and tests can swap adapters.

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::BooksRepository;
pub use users::UsersRepository;

/// Store handle holding one repository per collection
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            books: store.clone(),
            users: store,
        }
    }

    pub fn from_parts(books: Arc<dyn BooksRepository>, users: Arc<dyn UsersRepository>) -> Self {
        Self { books, users }
    }
}

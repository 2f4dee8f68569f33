//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookSearchQuery, CreateBook, UpdateBook},
        MessageResponse,
    },
};

use super::{outcome_response, AppJson, AuthenticatedUser};

/// Book list wrapper
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<Book>,
}

/// List every book
#[utoipa::path(
    get,
    path = "/books/getBook",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of books", body = BookListResponse),
        (status = 401, description = "Token missing, invalid or expired")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<BookListResponse>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(BookListResponse { books }))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books/addBook",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 200, description = "Book stored, or already available", body = MessageResponse),
        (status = 400, description = "Invalid ISBN or fields"),
        (status = 401, description = "Token missing, invalid or expired")
    )
)]
pub async fn add_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    AppJson(book): AppJson<CreateBook>,
) -> AppResult<Json<MessageResponse>> {
    let outcome = state.services.catalog.add_book(book).await?;
    Ok(outcome_response("Add book", outcome))
}

/// Update a book identified by ISBN
#[utoipa::path(
    patch,
    path = "/books/updateBook/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "ISBN of the book to update")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN used by another book")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(isbn): Path<String>,
    AppJson(patch): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state.services.catalog.update_book(&isbn, patch).await?;
    Ok(Json(updated))
}

/// Delete a book identified by ISBN
#[utoipa::path(
    delete,
    path = "/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "ISBN of the book to delete")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(&isbn).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}

/// Find a book by exact title, author or ISBN
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookSearchQuery),
    responses(
        (status = 200, description = "First matching book", body = Book),
        (status = 400, description = "No book matches")
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<Book>> {
    // A miss is reported as a bad request on this endpoint
    let book = state
        .services
        .catalog
        .search_books(&query.data)
        .await
        .map_err(|e| match e {
            AppError::NotFound(msg) => AppError::BadRequest(msg),
            other => other,
        })?;
    Ok(Json(book))
}

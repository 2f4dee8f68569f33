//! Membership and circulation endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{AccessClaims, CreateUser, User},
        MessageResponse,
    },
};

use super::{outcome_response, parse_id, AppJson, AuthenticatedUser};

/// Signup response
#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub msg: String,
    pub user: User,
}

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response carrying the access token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub msg: String,
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Borrow/return request body
#[derive(Deserialize, ToSchema)]
pub struct LoanRequest {
    /// Borrowing user; defaults to the token subject
    pub userid: Option<String>,
}

/// Resolve the user a loan request acts on.
///
/// An empty body means the token subject. Anything else must be a JSON
/// `LoanRequest`; an omitted or null `userid` also means the token subject.
fn loan_user(headers: &HeaderMap, body: &Bytes, claims: &AccessClaims) -> AppResult<Uuid> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(claims.sub);
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(AppError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    let Json(request) = Json::<LoanRequest>::from_bytes(body)?;
    match request.userid {
        Some(raw) => parse_id(&raw, "user"),
        None => Ok(claims.sub),
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/signup",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered", body = SignupResponse),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<CreateUser>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user = state.services.users.signup(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            msg: "New user has been registered".to_string(),
            user,
        }),
    ))
}

/// Log in and receive an access token
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Password is incorrect"),
        (status = 404, description = "Email does not exist")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = state
        .services
        .users
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        msg: "Login successful".to_string(),
        access_token: token.token,
        token_type: "Bearer".to_string(),
        expires_in: token.expires_in,
    }))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/users/borrowBook/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Id of the book to borrow")
    ),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Book borrowed, or refused with an explanatory message", body = MessageResponse),
        (status = 400, description = "Malformed id or request body"),
        (status = 404, description = "Book or user not found")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let book_id = parse_id(&book_id, "book")?;
    let user_id = loan_user(&headers, &body, &claims)?;

    let outcome = state.services.loans.borrow(user_id, book_id).await?;
    Ok(outcome_response("Borrow", outcome))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/users/returnBook/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Id of the book to return")
    ),
    request_body = LoanRequest,
    responses(
        (status = 200, description = "Book returned", body = MessageResponse),
        (status = 400, description = "Malformed id or request body"),
        (status = 404, description = "Book, user or loan not found")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let book_id = parse_id(&book_id, "book")?;
    let user_id = loan_user(&headers, &body, &claims)?;

    let outcome = state.services.loans.return_book(user_id, book_id).await?;
    Ok(outcome_response("Return", outcome))
}

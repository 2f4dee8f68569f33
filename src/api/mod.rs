//! API handlers for Libris REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{user::AccessClaims, MessageResponse, Outcome},
    AppState,
};

/// Extractor for the caller identity carried by a bearer token
pub struct AuthenticatedUser(pub AccessClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = AccessClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;
        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body extractor whose rejections render as [`AppError`]
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Parse a document id taken from a path or body
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {} id: {}", what, raw)))
}

/// Render an operation outcome as a `{msg}` body, noting refusals in the log
pub(crate) fn outcome_response(operation: &str, outcome: Outcome) -> Json<MessageResponse> {
    if outcome.is_soft_denial() {
        tracing::info!("{} refused: {}", operation, outcome.message());
    }
    Json(outcome.into())
}

/// Build the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let book_routes = Router::new()
        .route("/getBook", get(books::list_books))
        .route("/addBook", post(books::add_book))
        .route("/updateBook/:isbn", patch(books::update_book))
        .route("/search", get(books::search_books))
        .route("/:isbn", delete(books::delete_book));

    let user_routes = Router::new()
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/borrowBook/:id", post(users::borrow_book))
        .route("/returnBook/:id", post(users::return_book));

    Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health_check))
        .nest("/books", book_routes)
        .nest("/users", user_routes)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

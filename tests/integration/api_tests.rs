//! API integration tests, driven in-process over the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use libris_server::{
    api, config::AppConfig, models::AccessClaims, repository::Repository, services::Services,
    AppState,
};

fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.password_memory_kib = 1024;
    config.auth.password_iterations = 1;

    let services = Services::new(Repository::in_memory(), config.auth.clone())
        .expect("services build with test parameters");

    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// Register a user, log in and return (user id, token)
async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/users/signup",
        None,
        Some(json!({"name": "Ada", "email": email, "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": email, "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (id, body["access_token"].as_str().unwrap().to_string())
}

async fn add_book(app: &Router, token: &str, isbn: &str, title: &str, quantity: i32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/books/addBook",
        Some(token),
        Some(json!({
            "ISBN": isbn,
            "title": title,
            "author": "Frank Herbert",
            "publishedYear": 1965,
            "quantity": quantity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book data stored successfully");

    let (_, list) = send(app, Method::GET, "/books/getBook", Some(token), None).await;
    list["books"]
        .as_array()
        .unwrap()
        .iter()
        .find(|book| book["ISBN"] == isbn)
        .and_then(|book| book["id"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_welcome_and_health() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().starts_with("Welcome"));

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_signup_and_login() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    assert!(!token.is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/signup",
        None,
        Some(json!({"name": "Ada", "email": "ADA@example.com", "password": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists. Please log in.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password is incorrect");

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({"email": "nobody@example.com", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Email does not exist");
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/users/signup",
        None,
        Some(json!({"name": "Ada", "email": "not-an-email", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/books/getBook", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&app, Method::GET, "/books/getBook", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Checked against the configured secret
    let forged = AccessClaims::new(uuid::Uuid::new_v4(), chrono::Duration::minutes(5))
        .create_token("some-other-secret")
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/books/getBook", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signed = AccessClaims::new(uuid::Uuid::new_v4(), chrono::Duration::minutes(5))
        .create_token("integration-secret")
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/books/getBook", Some(&signed), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_lifecycle() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    let token = token.as_str();

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/addBook",
        Some(token),
        Some(json!({
            "ISBN": "12345",
            "title": "Dune",
            "author": "Frank Herbert",
            "publishedYear": 1965,
            "quantity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid ISBN"));

    add_book(&app, token, "978-01-23456-78-9", "Dune", 2).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/addBook",
        Some(token),
        Some(json!({
            "ISBN": "978-01-23456-78-9",
            "title": "Dune again",
            "author": "Frank Herbert",
            "publishedYear": 1965,
            "quantity": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book already available in library data");

    let (status, body) = send(&app, Method::GET, "/books/search?data=Frank%20Herbert", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["quantity"], 2);

    let (status, _) = send(&app, Method::GET, "/books/search?data=Dun", Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/books/updateBook/978-01-23456-78-9",
        Some(token),
        Some(json!({"quantity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["title"], "Dune");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/books/updateBook/978-99-99999-99-9",
        Some(token),
        Some(json!({"quantity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/books/978-01-23456-78-9", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book deleted successfully");

    let (_, list) = send(&app, Method::GET, "/books/getBook", Some(token), None).await;
    assert!(list["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app();
    let (user_id, token) = register(&app, "ada@example.com").await;
    let token = token.as_str();
    let book_id = add_book(&app, token, "978-01-23456-78-9", "Dune", 1).await;

    let uri = format!("/users/borrowBook/{}", book_id);
    let (status, body) = send(&app, Method::POST, &uri, Some(token), Some(json!({"userid": user_id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book borrowed");

    // Last copy is out
    let (status, body) = send(&app, Method::POST, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book is unavailable right now, please come back later");

    let (_, book) = send(&app, Method::GET, "/books/search?data=Dune", Some(token), None).await;
    assert_eq!(book["quantity"], 0);

    let uri = format!("/users/returnBook/{}", book_id);
    let (status, body) = send(&app, Method::POST, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book returned");

    let (status, body) = send(&app, Method::POST, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Book is not borrowed by the user");

    let (_, book) = send(&app, Method::GET, "/books/search?data=Dune", Some(token), None).await;
    assert_eq!(book["quantity"], 1);
}

#[tokio::test]
async fn test_borrow_limit_is_a_soft_denial() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    let token = token.as_str();

    let isbns = [
        "978-01-00000-00-1",
        "978-01-00000-00-2",
        "978-01-00000-00-3",
        "978-01-00000-00-4",
    ];
    let mut ids = Vec::new();
    for (n, isbn) in isbns.iter().enumerate() {
        ids.push(add_book(&app, token, isbn, &format!("Volume {}", n + 1), 1).await);
    }

    for id in &ids[..3] {
        let (_, body) = send(&app, Method::POST, &format!("/users/borrowBook/{}", id), Some(token), None).await;
        assert_eq!(body["msg"], "Book borrowed");
    }

    let (status, body) = send(&app, Method::POST, &format!("/users/borrowBook/{}", ids[3]), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["msg"],
        "You have borrowed the maximum number of books, please return some to borrow more"
    );

    let (_, book) = send(&app, Method::GET, "/books/search?data=Volume%204", Some(token), None).await;
    assert_eq!(book["quantity"], 1);
}

#[tokio::test]
async fn test_borrow_rejects_malformed_ids() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    let token = token.as_str();
    let book_id = add_book(&app, token, "978-01-23456-78-9", "Dune", 1).await;

    let (status, _) = send(&app, Method::POST, "/users/borrowBook/not-a-uuid", Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/borrowBook/{}", book_id),
        Some(token),
        Some(json!({"userid": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/borrowBook/{}", uuid::Uuid::new_v4()),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/users/borrowBook/{id}"].is_object());
}

#[tokio::test]
async fn test_loan_body_must_be_well_formed() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    let (bob_id, _) = register(&app, "bob@example.com").await;
    let token = token.as_str();
    let book_id = add_book(&app, token, "978-01-23456-78-9", "Dune", 2).await;
    let uri = format!("/users/borrowBook/{}", book_id);

    let (status, _) = send(&app, Method::POST, &uri, Some(token), Some(json!({"userid": 42}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A body without a JSON content type is not silently ignored
    let request = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(json!({"userid": bob_id}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was charged to anyone
    let (_, book) = send(&app, Method::GET, "/books/search?data=Dune", Some(token), None).await;
    assert_eq!(book["quantity"], 2);
}

#[tokio::test]
async fn test_loan_body_selects_the_borrower() {
    let app = app();
    let (_, token) = register(&app, "ada@example.com").await;
    let (bob_id, _) = register(&app, "bob@example.com").await;
    let token = token.as_str();
    let book_id = add_book(&app, token, "978-01-23456-78-9", "Dune", 2).await;
    let uri = format!("/users/borrowBook/{}", book_id);

    let (status, body) = send(&app, Method::POST, &uri, Some(token), Some(json!({"userid": bob_id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book borrowed");

    // Bob now holds it, the token holder does not
    let (_, body) = send(&app, Method::POST, &uri, Some(token), Some(json!({"userid": bob_id}))).await;
    assert_eq!(body["msg"], "Book is already borrowed by the user");

    let (status, body) = send(&app, Method::POST, &uri, Some(token), Some(json!({"userid": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Book borrowed");

    let (_, book) = send(&app, Method::GET, "/books/search?data=Dune", Some(token), None).await;
    assert_eq!(book["quantity"], 0);
}

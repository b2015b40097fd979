//! API integration tests against the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use libreria_server::{
    api::create_router, repository::MemoryBookRepository, services::Services, AppConfig,
    AppState,
};

fn app() -> Router {
    let state = AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(Services::new(Arc::new(MemoryBookRepository::new()))),
    };
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn book(name: &str, author: &str, publish_date: &str) -> Value {
    json!({
        "name": name,
        "author": author,
        "publisher": "Penguin",
        "publish_date": publish_date,
    })
}

async fn add(app: &Router, name: &str, author: &str, publish_date: &str) -> i64 {
    let (status, body) = send(app, Method::POST, "/books", Some(book(name, author, publish_date))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_create_then_get() {
    let app = app();
    let id = add(&app, "Dune", "Frank Herbert", "1965-08-01T00:00:00Z").await;

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Dune");
    assert_eq!(body["author"], "Frank Herbert");
    assert_eq!(body["publisher"], "Penguin");
    assert_eq!(body["status"], "CheckedIn");
    assert!(body.get("rating").is_none());
}

#[tokio::test]
async fn test_create_rejects_invalid_body() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/books", Some(json!({ "author": "Nobody" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert!(!body["errors"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::POST,
        "/books",
        Some(book("Later", "Someone", "2999-01-01T00:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = send(&app, Method::GET, "/books", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_twice() {
    let app = app();
    let id = add(&app, "Emma", "Jane Austen", "1815-12-23T00:00:00Z").await;

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, _) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, Method::GET, "/books", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters() {
    let app = app();
    add(&app, "Dune", "Frank Herbert", "1965-08-01T00:00:00Z").await;
    add(&app, "Dune Messiah", "Frank Herbert", "1969-10-15T00:00:00Z").await;
    add(&app, "Emma", "Jane Austen", "1815-12-23T00:00:00Z").await;

    let (status, body) = send(&app, Method::GET, "/books?title=Dune", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Dune", "Dune Messiah"]);

    let (_, body) = send(&app, Method::GET, "/books?publish_date=gt%201965-08-01", None).await;
    assert_eq!(names(&body), vec!["Dune Messiah"]);

    let (_, body) = send(&app, Method::GET, "/books?author=Austen&publish_date=lt%201900-01-01", None).await;
    assert_eq!(names(&body), vec!["Emma"]);

    let (_, body) = send(&app, Method::GET, "/books?limit=1&offset=1", None).await;
    assert_eq!(names(&body), vec!["Dune Messiah"]);

    let (status, body) = send(&app, Method::GET, "/books?publish_date=after%202000-01-01", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("publish_date"));
}

#[tokio::test]
async fn test_check_out_then_in() {
    let app = app();
    let id = add(&app, "Dune", "Frank Herbert", "1965-08-01T00:00:00Z").await;

    let (status, _) = send(&app, Method::PATCH, &format!("/books/{}/out", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(body["status"], "CheckedOut");

    let (_, body) = send(&app, Method::GET, "/books?status=checkedOut", None).await;
    assert_eq!(names(&body), vec!["Dune"]);

    let (status, _) = send(&app, Method::PATCH, &format!("/books/{}/in", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(body["status"], "CheckedIn");
}

#[tokio::test]
async fn test_rating_sequence() {
    let app = app();
    let id = add(&app, "Dune", "Frank Herbert", "1965-08-01T00:00:00Z").await;
    let rate_uri = format!("/books/{}/rate", id);
    let get_uri = format!("/books/{}", id);

    let (status, _) = send(&app, Method::PATCH, &rate_uri, Some(json!({ "rating": 2 }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, Method::GET, &get_uri, None).await;
    assert_eq!(body["rating"], 3.0);

    send(&app, Method::PATCH, &rate_uri, Some(json!({ "rating": 2 }))).await;
    let (_, body) = send(&app, Method::GET, &get_uri, None).await;
    assert_eq!(body["rating"], 2.5);

    send(&app, Method::PATCH, &rate_uri, Some(json!({ "rating": 2 }))).await;
    let (_, body) = send(&app, Method::GET, &get_uri, None).await;
    assert_eq!(body["rating"], 2.25);

    send(&app, Method::PATCH, &rate_uri, Some(json!({ "rating": 3 }))).await;
    let (_, body) = send(&app, Method::GET, &get_uri, None).await;
    assert_eq!(body["rating"], 2.63);

    let (status, _) = send(&app, Method::PATCH, &rate_uri, Some(json!({ "rating": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = send(&app, Method::GET, &get_uri, None).await;
    assert_eq!(body["rating"], 2.63);
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let app = app();
    let id = add(&app, "Dune", "Frank Herbert", "1965-08-01T00:00:00Z").await;
    send(&app, Method::PATCH, &format!("/books/{}/out", id), None).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/books/{}", id),
        Some(book("Dune (Deluxe)", "F. Herbert", "2005-08-02T00:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(body["name"], "Dune (Deluxe)");
    assert_eq!(body["author"], "F. Herbert");
    assert_eq!(body["status"], "CheckedOut");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/books/999",
        Some(book("Ghost", "Nobody", "2005-08-02T00:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let app = app();
    for (method, uri) in [
        (Method::GET, "/books/abc"),
        (Method::DELETE, "/books/abc"),
        (Method::PATCH, "/books/abc/in"),
        (Method::PATCH, "/books/abc/out"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], "invalid book id");
    }
}

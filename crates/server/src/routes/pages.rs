//! Placeholder page endpoints for the shop front end.

use axum::Json;
use serde_json::{Value, json};

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

/// `GET /`
pub async fn home() -> Json<Value> {
    message("This is Home Page")
}

/// `GET /shop`
pub async fn shop() -> Json<Value> {
    message("This is Shop Page")
}

/// `GET /blog`
pub async fn blog() -> Json<Value> {
    message("This is Blog Page")
}

/// `GET /contacts`
pub async fn contacts() -> Json<Value> {
    message("This is Contact Page")
}

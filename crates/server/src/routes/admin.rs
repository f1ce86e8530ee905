//! Admin handlers. Every handler requires an admin bearer token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

use tidewear_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// `POST /admin`
pub async fn welcome(RequireAdmin(user): RequireAdmin) -> Json<Value> {
    tracing::debug!(user_id = %user.id, "admin check passed");
    Json(json!({ "message": "Welcome Admin" }))
}

/// `GET /admin/products`
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().all().await?))
}

/// `POST /admin/products`
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(input) = body?;
    let product = state.catalog().create(input.into_new_product()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /admin/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: std::result::Result<Path<ProductId>, PathRejection>,
    body: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let product = state.catalog().update(id, input.into_changes()?).await?;
    Ok(Json(product))
}

/// `DELETE /admin/products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    state.catalog().delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}

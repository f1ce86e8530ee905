//! Public catalog handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

use crate::error::Result;
use crate::models::Product;
use crate::services::catalog::{CatalogPage, CatalogParams, CatalogQuery};
use crate::state::AppState;

/// `GET /products?category&sort&priceRange&page&limit`
pub async fn index(
    State(state): State<AppState>,
    params: std::result::Result<Query<CatalogParams>, QueryRejection>,
) -> Result<Json<CatalogPage>> {
    let Query(params) = params?;
    let query = CatalogQuery::parse(&params)?;
    Ok(Json(state.catalog().browse(&query).await?))
}

/// `GET /products/home`
pub async fn home(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().home().await?))
}

/// `GET /products/categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.catalog().categories().await?))
}

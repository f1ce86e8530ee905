//! Checkout and order history handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetail, OrderInput};
use crate::services::orders::CheckoutRequest;
use crate::state::AppState;

/// `POST /orders`
///
/// Authentication is checked before the body is parsed.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: std::result::Result<Json<OrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>)> {
    let Json(input) = body?;
    let request = CheckoutRequest::from_input(input)?;
    let order = state.ordering().place_order(&user, request).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders/my-orders`
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(state.ordering().orders_for(&user).await?))
}

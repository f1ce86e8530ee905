//! Registration and login handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use tidewear_core::{Email, UserId};

use crate::error::Result;
use crate::state::AppState;

/// Registration form.
///
/// Missing fields deserialize as empty and are rejected by validation, so the
/// client gets a field-specific message instead of a serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response to a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub token: String,
}

/// Response to a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub is_admin: bool,
    pub token: String,
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(form) = body?;
    let session = state
        .auth()
        .register(&form.name, &form.email, &form.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: session.user.id,
            name: session.user.name,
            email: session.user.email,
            token: session.token,
        }),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(form) = body?;
    let session = state.auth().login(&form.email, &form.password).await?;

    Ok(Json(LoginResponse {
        id: session.user.id,
        name: session.user.name,
        email: session.user.email,
        is_admin: session.user.is_admin,
        token: session.token,
    }))
}

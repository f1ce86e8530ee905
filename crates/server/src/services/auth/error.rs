//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tidewear_core::EmailError),

    /// Registration without a display name.
    #[error("name is required")]
    MissingName,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No bearer token on a request that needs one.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// The token is valid but its user no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// The user is authenticated but not an admin.
    #[error("admin access required")]
    AdminRequired,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

//! API error type and its JSON responses.
//!
//! Handlers return [`Result`]; storage failures are reported to Sentry
//! before the client sees a generic message.
//!
//! Every error is classified into an [`ErrorKind`], which decides the status
//! code. Bodies are always JSON: `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ProductValidationError;
use crate::services::{AuthError, CatalogError, OrderError};

/// Broad classes of failure, each mapped to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request is malformed or breaks a field rule.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request collides with existing data.
    Conflict,
    /// A product cannot cover the requested quantity.
    InsufficientStock,
    /// Missing or bad credentials.
    Authentication,
    /// Authenticated, but not allowed.
    Authorization,
    /// The backing store or another internal dependency failed.
    Storage,
}

impl ErrorKind {
    /// HTTP status for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation | Self::InsufficientStock => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(_) => ErrorKind::Storage,
            Self::BadRequest(_) => ErrorKind::Validation,
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::MissingName
                | AuthError::WeakPassword(_) => ErrorKind::Validation,
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken(_)
                | AuthError::UserNotFound => ErrorKind::Authentication,
                AuthError::AdminRequired => ErrorKind::Authorization,
                AuthError::UserAlreadyExists => ErrorKind::Conflict,
                AuthError::Repository(_) | AuthError::PasswordHash => ErrorKind::Storage,
            },
            Self::Catalog(err) => match err {
                CatalogError::InvalidQuery(_) => ErrorKind::Validation,
                CatalogError::ProductNotFound(_) => ErrorKind::NotFound,
                CatalogError::Repository(_) => ErrorKind::Storage,
            },
            Self::Order(err) => match err {
                OrderError::EmptyOrder | OrderError::InvalidLineItem { .. } => {
                    ErrorKind::Validation
                }
                OrderError::ProductNotFound(_) => ErrorKind::NotFound,
                OrderError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                OrderError::Repository(_) => ErrorKind::Storage,
            },
        }
    }

    /// The message shown to the client.
    fn client_message(&self) -> String {
        // Don't expose internal error details to clients
        if self.kind() == ErrorKind::Storage {
            return "Internal server error".to_string();
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::MissingName => "Name is required".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => "User already exists".to_string(),
                AuthError::MissingToken => "Not authorized, no token".to_string(),
                AuthError::InvalidToken(_) => "Not authorized, token failed".to_string(),
                AuthError::UserNotFound => "Invalid token, user not found".to_string(),
                AuthError::AdminRequired => "Not authorized as admin".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Catalog(CatalogError::InvalidQuery(msg)) => msg.clone(),
            Self::Catalog(CatalogError::ProductNotFound(_)) => "Product not found".to_string(),
            Self::Order(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Capture server errors to Sentry
        if kind == ErrorKind::Storage {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, ?kind, "Request rejected");
        }

        let body = Json(json!({ "message": self.client_message() }));
        (kind.status(), body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ProductValidationError> for AppError {
    fn from(err: ProductValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tidewear_core::ProductId;

    use super::*;
    use crate::services::auth::TokenError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes_by_kind() {
        assert_eq!(
            status_of(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AuthError::InvalidToken(TokenError::Expired).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::AdminRequired.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AuthError::WeakPassword("too short".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrderError::ProductNotFound(ProductId::generate()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(
                OrderError::InsufficientStock {
                    product: ProductId::generate(),
                    name: "Cap".to_string(),
                    requested: 2,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CatalogError::InvalidQuery("page".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::NotFound.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let err: AppError = RepositoryError::DataCorruption("secret detail".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(err.client_message(), "Internal server error");

        let err: AppError = OrderError::Repository(RepositoryError::NotFound).into();
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_client_messages() {
        let err: AppError = OrderError::InsufficientStock {
            product: ProductId::generate(),
            name: "Diagonal Textured Cap".to_string(),
            requested: 3,
        }
        .into();
        assert_eq!(
            err.client_message(),
            "Not enough stock for product: Diagonal Textured Cap"
        );

        let err: AppError = AuthError::MissingToken.into();
        assert_eq!(err.client_message(), "Not authorized, no token");
    }
}

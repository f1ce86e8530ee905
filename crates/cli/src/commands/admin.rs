//! Admin flag management.
//!
//! Registration always creates regular users; this is the only way to grant
//! access to the admin endpoints.
//!
//! # Usage
//!
//! ```bash
//! tw-cli admin promote -e owner@example.com
//! tw-cli admin demote -e owner@example.com
//! ```

use tidewear_core::Email;
use tidewear_server::db::{PgUserRepository, UserRepository};

use super::{CommandError, connect};

/// Set or clear the admin flag of the user with `email`.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), CommandError> {
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let users = PgUserRepository::new(pool);

    let user = users
        .set_admin(&email, is_admin)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;

    if is_admin {
        tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    } else {
        tracing::info!(user_id = %user.id, email = %user.email, "Admin rights removed");
    }

    Ok(())
}

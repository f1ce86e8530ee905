//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TIDEWEAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time:
//! ```text
//! migrations/
//! ├── 20250101000001_catalog.sql
//! ├── 20250101000002_identity.sql
//! └── 20250101000003_sales.sql
//! ```

use super::{CommandError, connect};

/// Run the server database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("schema setup failed: {0}")]
pub struct SchemaError(#[from] sqlx::Error);

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    username      VARCHAR(80)  NOT NULL UNIQUE,
    email         VARCHAR(120) NOT NULL UNIQUE,
    password_hash TEXT
)
"#;

// Upgrades tables created before the password column existed.
const ADD_PASSWORD_COLUMN: &str =
    "ALTER TABLE users ADD COLUMN IF NOT EXISTS password_hash TEXT";

/// Brings the schema up to the current entity shape. Safe to call on
/// every start: creates the `users` table if absent and adds any column
/// a pre-existing table is missing. Never drops or truncates.
pub async fn ensure_schema(db: &PgPool) -> Result<(), SchemaError> {
    sqlx::query(CREATE_USERS).execute(db).await?;
    sqlx::query(ADD_PASSWORD_COLUMN).execute(db).await?;
    info!("database schema is up to date");
    Ok(())
}

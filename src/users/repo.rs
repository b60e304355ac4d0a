use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // set only for registered accounts
}

/// Rejects an empty or missing required field before any query runs.
pub(crate) fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::MissingField(field));
    }
    Ok(value)
}

/// Maps a Postgres unique violation onto the conflicting field by
/// constraint name; anything else stays a store error.
fn map_conflict(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_username_key") => ApiError::DuplicateUsername,
                Some("users_email_key") => ApiError::DuplicateEmail,
                _ => ApiError::Conflict,
            };
        }
    }
    ApiError::Store(e)
}

impl User {
    /// Insert a plain CRUD account with no password. The unique
    /// constraints are the real duplicate guard; a failed insert rolls
    /// back and leaves no row behind.
    pub async fn create(db: &PgPool, username: &str, email: &str) -> Result<User, ApiError> {
        require(username, "username")?;
        require(email, "email")?;

        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_conflict)?;
        tx.commit().await?;
        Ok(user)
    }

    /// Insert a registered account with a password hash.
    pub async fn register(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_conflict)?;
        tx.commit().await?;
        Ok(user)
    }

    /// All users, primary-key ascending so repeated calls are stable.
    pub async fn list_all(db: &PgPool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Change username and email; the id and password hash never move.
    /// On a conflict the transaction rolls back and the prior values
    /// stay untouched.
    pub async fn update(
        db: &PgPool,
        id: i64,
        username: &str,
        email: &str,
    ) -> Result<User, ApiError> {
        require(username, "username")?;
        require(email, "email")?;

        let mut tx = db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, email = $3
            WHERE id = $1
            RETURNING id, username, email, password_hash
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_conflict)?
        .ok_or(ApiError::NotFound)?;
        tx.commit().await?;
        Ok(user)
    }

    /// Deleting an already-deleted id is NotFound, not an error about
    /// the first deletion.
    pub async fn delete(db: &PgPool, id: i64) -> Result<(), ApiError> {
        let mut tx = db.begin().await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        tx.commit().await?;
        Ok(())
    }
}

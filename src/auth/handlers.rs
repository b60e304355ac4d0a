use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{JwtKeys, LoginRequest, RegisterRequest, TokenResponse},
        extractors::AuthUser,
        password::{hash_password, verify_password},
    },
    db::AppState,
    error::ApiError,
    users::{
        dto::PublicUser,
        repo::{require, User},
    },
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    require(&payload.username, "username")?;
    require(&payload.email, "email")?;
    require(&payload.password, "password")?;

    // Pre-checks give the caller a precise error; the unique constraints
    // still decide the winner when two registrations race.
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::DuplicateUsername);
    }
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::register(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    require(&payload.username, "username")?;
    require(&payload.password, "password")?;

    // Unknown user, no stored hash and wrong password all collapse into
    // the same answer.
    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login for unknown username");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let hash = match user.password_hash.as_deref() {
        Some(h) => h,
        None => {
            warn!(user_id = user.id, "login for account without a password");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, hash)? {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.username)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(username): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Validation runs before any query, so a lazily-connecting pool that
    // never reaches a database is enough for these paths.

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            username: "alice".into(),
            email: "a@x.com".into(),
            password: "".into(),
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingField("password")));
    }

    #[tokio::test]
    async fn register_checks_fields_in_order() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            username: "".into(),
            email: "".into(),
            password: "".into(),
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingField("username")));
    }

    #[tokio::test]
    async fn login_rejects_missing_password() {
        let state = AppState::fake();
        let payload = LoginRequest {
            username: "alice".into(),
            password: "  ".into(),
        };
        let err = login(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingField("password")));
    }
}

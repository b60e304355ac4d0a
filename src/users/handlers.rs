use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    db::AppState,
    error::ApiError,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest},
        repo::User,
    },
};

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(_claimant): AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = User::create(&state.db, &payload.username, &payload.email).await?;
    info!(user_id = user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_claimant): AuthUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_claimant): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(_claimant): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::update(&state.db, id, &payload.username, &payload.email).await?;
    info!(user_id = user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(_claimant): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    User::delete(&state.db, id).await?;
    info!(user_id = id, "user deleted");
    Ok(Json(json!({ "message": "user deleted" })))
}

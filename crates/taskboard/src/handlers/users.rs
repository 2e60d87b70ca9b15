//! User listing and registration.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::ApiResult;
use crate::models::{CreateUser, NewUser, UserRead};
use crate::server::AppState;

/// `GET /users/`: every user, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<Vec<UserRead>>> {
    let users = state.storage.list_users().await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

/// `POST /users/`: register a user. Duplicate email or name is a 400.
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserRead>)> {
    let Json(body) = payload?;
    let body = body.validate()?;

    let password_hash = state.hasher.hash(body.password).await?;
    let user = state
        .storage
        .create_user(NewUser {
            name: body.name,
            email: body.email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, created_by = actor.id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

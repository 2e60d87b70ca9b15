//! Token issuance.

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::{Form, Json};
use tracing::{info, warn};

use crate::errors::{ApiError, ApiResult};
use crate::models::{LoginForm, TokenResponse};
use crate::server::AppState;

const INCORRECT_LOGIN: &str = "Incorrect email or password";

/// `POST /auth/login`: exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) = payload?;
    let email = form.username.trim();

    let Some(user) = state.storage.find_user_by_email(email).await? else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::Unauthorized(INCORRECT_LOGIN.to_string()));
    };

    if !state
        .hasher
        .verify(form.password, user.password_hash.clone())
        .await?
    {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(ApiError::Unauthorized(INCORRECT_LOGIN.to_string()));
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = user.id, "User logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

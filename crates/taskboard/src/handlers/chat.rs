//! Natural-language questions about tasks.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Local;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::{ChatRequest, ChatResponse};
use crate::server::AppState;

/// `POST /chat/query`. Model failures still answer 200 with an apology.
pub async fn query(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(body) = payload?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(
            "Pertanyaan tidak boleh kosong".to_string(),
        ));
    }

    let today = Local::now().date_naive();
    let outcome = state
        .assistant
        .respond(question, state.storage.as_ref(), today)
        .await?;

    info!(
        user_id = user.id,
        status = ?outcome.intent.status,
        deadline = ?outcome.intent.deadline,
        used_fallback = outcome.used_fallback,
        tasks = outcome.task_count,
        "Answered chat question"
    );
    Ok(Json(ChatResponse {
        answer: outcome.answer,
    }))
}

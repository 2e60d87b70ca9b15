//! Task CRUD.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tasks::Task;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::{CreateTask, TaskUpdate};
use crate::server::AppState;

/// The assignee, when given, must be an existing user.
async fn ensure_assignee(state: &AppState, assignee_id: Option<i64>) -> ApiResult<()> {
    if let Some(id) = assignee_id {
        if state.storage.get_user(id).await?.is_none() {
            return Err(ApiError::not_found("Assignee"));
        }
    }
    Ok(())
}

/// `GET /tasks/`: every task, newest first.
pub async fn list_tasks(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.storage.list_tasks().await?))
}

/// `POST /tasks/`
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(body) = payload?;
    let new_task = body.validate()?;
    ensure_assignee(&state, new_task.assignee_id).await?;

    let task = state.storage.create_task(new_task).await?;
    info!(task_id = task.id, created_by = actor.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks/{id}`
pub async fn get_task(
    State(state): State<AppState>,
    _user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let Path(id) = id?;
    state
        .storage
        .get_task(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task"))
}

/// `PUT /tasks/{id}`: partial update.
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let changes = body.validate()?;

    if state.storage.get_task(id).await?.is_none() {
        return Err(ApiError::not_found("Task"));
    }
    ensure_assignee(&state, changes.new_assignee()).await?;

    let task = state
        .storage
        .update_task(id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    info!(task_id = id, updated_by = actor.id, status = %task.status, "Task updated");
    Ok(Json(task))
}

/// `DELETE /tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if !state.storage.delete_task(id).await? {
        return Err(ApiError::not_found("Task"));
    }
    info!(task_id = id, deleted_by = actor.id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

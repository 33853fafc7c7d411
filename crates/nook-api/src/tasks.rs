use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use nook_db::Database;
use nook_db::models::{TaskChanges, TaskRow};
use nook_types::api::{CreateTaskRequest, TaskPatch, TaskResponse, TasksCreatedResponse};
use nook_types::models::{Role, TaskStatus};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, join_error};
use crate::middleware::AuthUser;
use crate::policy;

// -- Services --

/// Creates tasks on behalf of the caller. Regular users always get exactly
/// one self-owned task; any assignee field is ignored. Admins may assign to
/// a specific user, or fan out one task per role=user account when no
/// assignee is given. Returns the number of tasks created.
pub fn create(db: &Database, actor: &AuthUser, req: CreateTaskRequest) -> ApiResult<u64> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }

    let created_at = Utc::now().to_rfc3339();
    let mut rows: Vec<TaskRow> = Vec::new();

    match actor.role {
        Role::User => {
            rows.push(new_task_row(&req, &actor.id.to_string(), &created_at));
        }
        Role::Admin => match req.assignee_id {
            Some(assignee_id) => {
                let assignee = db
                    .get_user_by_id(&assignee_id.to_string())?
                    .ok_or(ApiError::NotFound("Assignee not found"))?;
                rows.push(new_task_row(&req, &assignee.id, &created_at));
            }
            None => {
                for user in db.get_users_by_role(Role::User)? {
                    rows.push(new_task_row(&req, &user.id, &created_at));
                }
            }
        },
    }

    db.insert_tasks(&rows)?;
    Ok(rows.len() as u64)
}

/// Admins list every task; users list only their own. The optional status
/// filter applies to either scope.
pub fn list(
    db: &Database,
    actor: &AuthUser,
    status: Option<TaskStatus>,
) -> ApiResult<Vec<TaskResponse>> {
    let owner = policy::list_scope(actor);
    let rows = db.get_tasks(owner.as_deref(), status.map(|s| s.as_str()))?;

    rows.into_iter().map(task_response).collect()
}

/// Partial update: only fields carried by the patch change. An empty patch
/// is a no-op, not an error. Any write stamps `updated_at`/`updated_by`.
pub fn update(db: &Database, actor: &AuthUser, task_id: Uuid, patch: TaskPatch) -> ApiResult<()> {
    let id = task_id.to_string();
    let task = db
        .get_task_by_id(&id)?
        .ok_or(ApiError::NotFound("Task not found"))?;

    policy::require_owner_or_admin(actor, &task.owner_id, "Not allowed to update this task")?;

    if patch.is_empty() {
        return Ok(()); // nothing to update
    }

    if let Some(ref title) = patch.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }

    let changes = TaskChanges {
        title: patch.title,
        description: patch.description,
        status: patch.status.map(|s| s.as_str().to_string()),
    };

    db.update_task_fields(
        &id,
        &changes,
        &Utc::now().to_rfc3339(),
        &actor.id.to_string(),
    )?;
    Ok(())
}

pub fn delete(db: &Database, actor: &AuthUser, task_id: Uuid) -> ApiResult<()> {
    let id = task_id.to_string();
    let task = db
        .get_task_by_id(&id)?
        .ok_or(ApiError::NotFound("Task not found"))?;

    policy::require_owner_or_admin(actor, &task.owner_id, "Not allowed to delete this task")?;

    db.delete_task(&id)?;
    Ok(())
}

fn new_task_row(req: &CreateTaskRequest, owner_id: &str, created_at: &str) -> TaskRow {
    TaskRow {
        id: Uuid::new_v4().to_string(),
        title: req.title.clone(),
        description: req.description.clone(),
        status: req.status.as_str().to_string(),
        owner_id: owner_id.to_string(),
        created_at: created_at.to_string(),
        updated_at: None,
        updated_by: None,
    }
}

fn task_response(row: TaskRow) -> ApiResult<TaskResponse> {
    Ok(TaskResponse {
        id: row.id.parse().context("corrupt task id")?,
        title: row.title,
        description: row.description,
        status: row
            .status
            .parse::<TaskStatus>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?,
        owner_id: row.owner_id.parse().context("corrupt owner id")?,
        created_at: row
            .created_at
            .parse::<DateTime<Utc>>()
            .context("corrupt created_at")?,
        updated_at: row
            .updated_at
            .as_deref()
            .map(|s| s.parse::<DateTime<Utc>>())
            .transpose()
            .context("corrupt updated_at")?,
        updated_by: row
            .updated_by
            .as_deref()
            .map(|s| s.parse::<Uuid>())
            .transpose()
            .context("corrupt updated_by")?,
    })
}

// -- Handlers --

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = tokio::task::spawn_blocking(move || create(&state.db, &user, req))
        .await
        .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(TasksCreatedResponse { created })))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = tokio::task::spawn_blocking(move || list(&state.db, &user, query.status))
        .await
        .map_err(join_error)??;

    Ok(Json(tasks))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<impl IntoResponse> {
    tokio::task::spawn_blocking(move || update(&state.db, &user, task_id, patch))
        .await
        .map_err(join_error)??;

    Ok(Json(serde_json::json!({
        "message": "Task updated successfully"
    })))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    tokio::task::spawn_blocking(move || delete(&state.db, &user, task_id))
        .await
        .map_err(join_error)??;

    Ok(StatusCode::NO_CONTENT)
}

use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nook_db::Database;
use nook_db::models::{NoteChanges, NoteRow};
use nook_types::api::{CreateNoteRequest, NotePatch, NoteResponse};
use nook_types::models::NoteVisibility;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, join_error};
use crate::middleware::AuthUser;
use crate::policy;

// -- Services --

/// Resolves collaborator emails to user ids. Any email that does not match
/// an existing account fails the whole resolution, so no partially shared
/// note is ever written.
fn resolve_shared_emails(db: &Database, emails: &[String]) -> ApiResult<Vec<String>> {
    let users = db.get_users_by_emails(emails)?;

    if users.len() != emails.len() {
        return Err(ApiError::BadRequest(
            "One or more shared users do not exist".to_string(),
        ));
    }

    Ok(users.into_iter().map(|u| u.id).collect())
}

/// Creates a note owned by the caller. visibility=shared requires a
/// non-empty, fully resolvable collaborator email list.
pub fn create(db: &Database, actor: &AuthUser, req: CreateNoteRequest) -> ApiResult<NoteResponse> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Title and content must not be empty".to_string(),
        ));
    }

    let mut shared_ids: Vec<String> = Vec::new();
    if req.visibility == NoteVisibility::Shared {
        let emails = req.shared_with_emails.as_deref().unwrap_or(&[]);
        if emails.is_empty() {
            return Err(ApiError::BadRequest(
                "Shared notes require shared_with_emails".to_string(),
            ));
        }
        shared_ids = resolve_shared_emails(db, emails)?;
    }

    let row = NoteRow {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        content: req.content,
        owner_id: actor.id.to_string(),
        visibility: req.visibility.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
        updated_at: None,
        updated_by: None,
    };
    db.insert_note(&row, &shared_ids)?;

    note_response(row, shared_ids)
}

/// Notes the caller owns, plus public notes, plus shared notes the caller
/// is a collaborator on. Admins get no special read scope here.
pub fn list(db: &Database, actor: &AuthUser) -> ApiResult<Vec<NoteResponse>> {
    let rows = db.get_notes_visible_to(&actor.id.to_string())?;

    let note_ids: Vec<String> = rows.iter().map(|n| n.id.clone()).collect();
    let mut shares: HashMap<String, Vec<String>> = HashMap::new();
    for share in db.get_shares_for_notes(&note_ids)? {
        shares.entry(share.note_id).or_default().push(share.user_id);
    }

    rows.into_iter()
        .map(|row| {
            let shared_with = shares.remove(&row.id).unwrap_or_default();
            note_response(row, shared_with)
        })
        .collect()
}

/// Single-note read through the same visibility predicate as listing.
/// A note that exists but is not visible reads as `NotFound`, so record
/// existence never leaks to unauthorized callers.
pub fn get(db: &Database, actor: &AuthUser, note_id: Uuid) -> ApiResult<NoteResponse> {
    let id = note_id.to_string();
    let row = db
        .get_note_visible_to(&id, &actor.id.to_string())?
        .ok_or(ApiError::NotFound("Note not found or access denied"))?;

    let shared_with = db.get_note_shares(&id)?;
    note_response(row, shared_with)
}

/// Owner-only partial update; admins get no bypass on notes. Setting
/// visibility=shared re-requires a fully resolvable email list, and the
/// resolved ids replace the share set.
pub fn update(db: &Database, actor: &AuthUser, note_id: Uuid, patch: NotePatch) -> ApiResult<()> {
    let id = note_id.to_string();
    let note = db
        .get_note_by_id(&id)?
        .ok_or(ApiError::NotFound("Note not found"))?;

    policy::require_owner(actor, &note.owner_id, "Only the owner can update this note")?;

    if patch.is_empty() {
        return Ok(()); // nothing to update
    }

    if let Some(ref title) = patch.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }
    if let Some(ref content) = patch.content {
        if content.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Content must not be empty".to_string(),
            ));
        }
    }

    let shared_with: Option<Vec<String>> = match patch.visibility {
        Some(NoteVisibility::Shared) => {
            let emails = patch.shared_with_emails.as_deref().unwrap_or(&[]);
            if emails.is_empty() {
                return Err(ApiError::BadRequest(
                    "Shared notes require shared_with_emails".to_string(),
                ));
            }
            Some(resolve_shared_emails(db, emails)?)
        }
        // Leaving shared visibility drops the collaborator set; it only
        // exists while the note is shared.
        Some(_) => Some(Vec::new()),
        None => None,
    };

    let changes = NoteChanges {
        title: patch.title,
        content: patch.content,
        visibility: patch.visibility.map(|v| v.as_str().to_string()),
        shared_with,
    };

    db.update_note_fields(
        &id,
        &changes,
        &Utc::now().to_rfc3339(),
        &actor.id.to_string(),
    )?;
    Ok(())
}

/// Owner-only delete; share rows go with the note.
pub fn delete(db: &Database, actor: &AuthUser, note_id: Uuid) -> ApiResult<()> {
    let id = note_id.to_string();
    let note = db
        .get_note_by_id(&id)?
        .ok_or(ApiError::NotFound("Note not found"))?;

    policy::require_owner(actor, &note.owner_id, "Only the owner can delete this note")?;

    db.delete_note(&id)?;
    Ok(())
}

fn note_response(row: NoteRow, shared_with: Vec<String>) -> ApiResult<NoteResponse> {
    Ok(NoteResponse {
        id: row.id.parse().context("corrupt note id")?,
        title: row.title,
        content: row.content,
        owner_id: row.owner_id.parse().context("corrupt owner id")?,
        visibility: row
            .visibility
            .parse::<NoteVisibility>()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?,
        shared_with: shared_with
            .iter()
            .map(|id| id.parse::<Uuid>())
            .collect::<Result<Vec<_>, _>>()
            .context("corrupt share user id")?,
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

pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let note = tokio::task::spawn_blocking(move || create(&state.db, &user, req))
        .await
        .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<NoteResponse>>> {
    let notes = tokio::task::spawn_blocking(move || list(&state.db, &user))
        .await
        .map_err(join_error)??;

    Ok(Json(notes))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<NoteResponse>> {
    let note = tokio::task::spawn_blocking(move || get(&state.db, &user, note_id))
        .await
        .map_err(join_error)??;

    Ok(Json(note))
}

pub async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<NotePatch>,
) -> ApiResult<impl IntoResponse> {
    tokio::task::spawn_blocking(move || update(&state.db, &user, note_id, patch))
        .await
        .map_err(join_error)??;

    Ok(Json(serde_json::json!({
        "message": "Note updated successfully"
    })))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    tokio::task::spawn_blocking(move || delete(&state.db, &user, note_id))
        .await
        .map_err(join_error)??;

    Ok(StatusCode::NO_CONTENT)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NoteVisibility, TaskStatus};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Tasks --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Admin only: assign to a specific user. Ignored for role=user callers.
    pub assignee_id: Option<Uuid>,
}

/// Partial task update. Absent fields are left untouched; `description`
/// distinguishes an explicit `null` (clear) from an absent key.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

/// Result of task creation. Admin fan-out can create more than one task
/// from a single request.
#[derive(Debug, Serialize, Deserialize)]
pub struct TasksCreatedResponse {
    pub created: u64,
}

// -- Notes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub visibility: NoteVisibility,
    /// Required (non-empty) when visibility is `shared`.
    pub shared_with_emails: Option<Vec<String>>,
}

/// Partial note update; same absent-vs-present semantics as [`TaskPatch`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<NoteVisibility>,
    pub shared_with_emails: Option<Vec<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.visibility.is_none()
            && self.shared_with_emails.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub owner_id: Uuid,
    pub visibility: NoteVisibility,
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}

/// Deserializes `Option<Option<T>>` so a missing key, an explicit `null`,
/// and a value are three distinct states.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_patch_distinguishes_absent_null_and_value() {
        let absent: TaskPatch = serde_json::from_str("{}").unwrap();
        assert!(absent.is_empty());
        assert_eq!(absent.description, None);

        let cleared: TaskPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert!(!cleared.is_empty());
        assert_eq!(cleared.description, Some(None));

        let set: TaskPatch = serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
        assert_eq!(set.title, None);
    }

    #[test]
    fn patches_reject_unknown_fields() {
        assert!(serde_json::from_str::<TaskPatch>(r#"{"owner_id": "x"}"#).is_err());
        assert!(serde_json::from_str::<NotePatch>(r#"{"owner_id": "x"}"#).is_err());
    }

    #[test]
    fn create_task_request_defaults_status_to_pending() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(req.status, TaskStatus::Pending);
        assert_eq!(req.assignee_id, None);
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        let status: TaskStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, TaskStatus::InProgress);

        let vis: NoteVisibility = serde_json::from_str(r#""shared""#).unwrap();
        assert_eq!(vis, NoteVisibility::Shared);
    }
}

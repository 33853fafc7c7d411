/// Database row types that map directly to SQLite rows.
/// Distinct from nook-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub visibility: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

pub struct NoteShareRow {
    pub note_id: String,
    pub user_id: String,
}

/// Changeset for a partial task update. `None` means the column is not
/// touched; `description` carries a second level so an explicit clear
/// (`Some(None)`) is distinct from "leave alone" (`None`).
#[derive(Debug, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

/// Changeset for a partial note update. A `Some` share set replaces the
/// note's collaborator rows wholesale.
#[derive(Debug, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<String>,
    pub shared_with: Option<Vec<String>>,
}

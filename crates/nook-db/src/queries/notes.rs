use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, types::ToSql};

use crate::Database;
use crate::models::{NoteChanges, NoteRow, NoteShareRow};

/// Visibility predicate, evaluated inside the query so records the caller
/// may not see are never materialized: owner, or public, or shared with the
/// caller listed as a collaborator.
const VISIBLE: &str = "(owner_id = ?1
     OR visibility = 'public'
     OR (visibility = 'shared' AND EXISTS (
         SELECT 1 FROM note_shares s WHERE s.note_id = notes.id AND s.user_id = ?1)))";

impl Database {
    pub fn insert_note(&self, note: &NoteRow, shared_with: &[String]) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notes (id, title, content, owner_id, visibility, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    note.id,
                    note.title,
                    note.content,
                    note.owner_id,
                    note.visibility,
                    note.created_at,
                ],
            )?;
            insert_shares(conn, &note.id, shared_with)?;
            Ok(())
        })
    }

    /// Unrestricted lookup, used by the mutation path where existence is
    /// checked before ownership.
    pub fn get_note_by_id(&self, id: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, owner_id, visibility, created_at, updated_at, updated_by
                 FROM notes WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], map_note).optional()?;
            Ok(row)
        })
    }

    /// Single-record read through the visibility predicate. A note that
    /// exists but is not visible to `user_id` comes back as `None`, same as
    /// one that does not exist.
    pub fn get_note_visible_to(&self, id: &str, user_id: &str) -> Result<Option<NoteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT id, title, content, owner_id, visibility, created_at, updated_at, updated_by
                 FROM notes WHERE {VISIBLE} AND id = ?2",
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([user_id, id], map_note).optional()?;
            Ok(row)
        })
    }

    pub fn get_notes_visible_to(&self, user_id: &str) -> Result<Vec<NoteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT id, title, content, owner_id, visibility, created_at, updated_at, updated_by
                 FROM notes WHERE {VISIBLE}
                 ORDER BY created_at DESC",
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_note)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_note_shares(&self, note_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM note_shares WHERE note_id = ?1")?;
            let rows = stmt
                .query_map([note_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch share rows for a set of note IDs.
    pub fn get_shares_for_notes(&self, note_ids: &[String]) -> Result<Vec<NoteShareRow>> {
        if note_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=note_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT note_id, user_id FROM note_shares WHERE note_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn ToSql> = note_ids.iter().map(|id| id as &dyn ToSql).collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(NoteShareRow {
                        note_id: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Applies a changeset plus the update stamp. A `Some` share set in the
    /// changeset replaces the note's collaborator rows wholesale. Callers
    /// must not pass an empty changeset.
    pub fn update_note_fields(
        &self,
        id: &str,
        changes: &NoteChanges,
        updated_at: &str,
        updated_by: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut params: Vec<&dyn ToSql> = Vec::new();

            if let Some(ref title) = changes.title {
                sets.push(format!("title = ?{}", params.len() + 1));
                params.push(title);
            }
            if let Some(ref content) = changes.content {
                sets.push(format!("content = ?{}", params.len() + 1));
                params.push(content);
            }
            if let Some(ref visibility) = changes.visibility {
                sets.push(format!("visibility = ?{}", params.len() + 1));
                params.push(visibility);
            }

            sets.push(format!("updated_at = ?{}", params.len() + 1));
            params.push(&updated_at);
            sets.push(format!("updated_by = ?{}", params.len() + 1));
            params.push(&updated_by);

            let sql = format!(
                "UPDATE notes SET {} WHERE id = ?{}",
                sets.join(", "),
                params.len() + 1
            );
            params.push(&id);

            conn.execute(&sql, params.as_slice())?;

            if let Some(ref shared_with) = changes.shared_with {
                conn.execute("DELETE FROM note_shares WHERE note_id = ?1", [id])?;
                insert_shares(conn, id, shared_with)?;
            }

            Ok(())
        })
    }

    /// Returns false when no row matched. Share rows cascade.
    pub fn delete_note(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn insert_shares(conn: &Connection, note_id: &str, user_ids: &[String]) -> Result<()> {
    if user_ids.is_empty() {
        return Ok(());
    }

    let mut stmt = conn.prepare("INSERT INTO note_shares (note_id, user_id) VALUES (?1, ?2)")?;
    for user_id in user_ids {
        stmt.execute(rusqlite::params![note_id, user_id])?;
    }
    Ok(())
}

fn map_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteRow> {
    Ok(NoteRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        owner_id: row.get(3)?,
        visibility: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        updated_by: row.get(7)?,
    })
}

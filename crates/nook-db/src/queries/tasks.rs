use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, types::Null, types::ToSql};

use crate::Database;
use crate::models::{TaskChanges, TaskRow};

impl Database {
    pub fn insert_task(&self, task: &TaskRow) -> Result<()> {
        self.with_conn(|conn| {
            insert_task_stmt(conn, task)?;
            Ok(())
        })
    }

    /// Batch insert for admin fan-out. One prepared statement under a single
    /// connection lock; an error aborts the remainder (best-effort, not a
    /// transaction).
    pub fn insert_tasks(&self, tasks: &[TaskRow]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO tasks (id, title, description, status, owner_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for task in tasks {
                stmt.execute(rusqlite::params![
                    task.id,
                    task.title,
                    task.description,
                    task.status,
                    task.owner_id,
                    task.created_at,
                ])?;
            }
            Ok(())
        })
    }

    pub fn get_task_by_id(&self, id: &str) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, status, owner_id, created_at, updated_at, updated_by
                 FROM tasks WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], map_task).optional()?;
            Ok(row)
        })
    }

    /// Filtered listing. `owner_id = None` means no ownership restriction
    /// (admin view); `status` narrows further when present.
    pub fn get_tasks(&self, owner_id: Option<&str>, status: Option<&str>) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| query_tasks(conn, owner_id, status))
    }

    /// Applies a changeset: only columns carried by `changes` are written,
    /// plus the update stamp. Callers must not pass an empty changeset.
    pub fn update_task_fields(
        &self,
        id: &str,
        changes: &TaskChanges,
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
            match &changes.description {
                Some(Some(description)) => {
                    sets.push(format!("description = ?{}", params.len() + 1));
                    params.push(description);
                }
                Some(None) => {
                    sets.push(format!("description = ?{}", params.len() + 1));
                    params.push(&Null);
                }
                None => {}
            }
            if let Some(ref status) = changes.status {
                sets.push(format!("status = ?{}", params.len() + 1));
                params.push(status);
            }

            sets.push(format!("updated_at = ?{}", params.len() + 1));
            params.push(&updated_at);
            sets.push(format!("updated_by = ?{}", params.len() + 1));
            params.push(&updated_by);

            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                params.len() + 1
            );
            params.push(&id);

            conn.execute(&sql, params.as_slice())?;
            Ok(())
        })
    }

    /// Returns false when no row matched.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn insert_task_stmt(conn: &Connection, task: &TaskRow) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, title, description, status, owner_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            task.id,
            task.title,
            task.description,
            task.status,
            task.owner_id,
            task.created_at,
        ],
    )?;
    Ok(())
}

fn query_tasks(conn: &Connection, owner_id: Option<&str>, status: Option<&str>) -> Result<Vec<TaskRow>> {
    let mut sql = String::from(
        "SELECT id, title, description, status, owner_id, created_at, updated_at, updated_by
         FROM tasks",
    );
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();

    if let Some(ref owner) = owner_id {
        clauses.push(format!("owner_id = ?{}", params.len() + 1));
        params.push(owner);
    }
    if let Some(ref status) = status {
        clauses.push(format!("status = ?{}", params.len() + 1));
        params.push(status);
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_task)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        updated_by: row.get(7)?,
    })
}

use anyhow::Result;
use nook_types::models::Role;
use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::models::UserRow;

impl Database {
    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![user.id, user.email, user.password, user.role, user.created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, email, password, role, created_at FROM users WHERE id = ?1")?
                .query_row([id], map_user)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .prepare("SELECT id, email, password, role, created_at FROM users WHERE email = ?1")?
                .query_row([email], map_user)
                .optional()?;
            Ok(row)
        })
    }

    /// Batch lookup for share-list resolution. Returns only the rows that
    /// exist; callers compare counts to detect unresolved emails.
    pub fn get_users_by_emails(&self, emails: &[String]) -> Result<Vec<UserRow>> {
        if emails.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=emails.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, email, password, role, created_at FROM users WHERE email IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = emails
                .iter()
                .map(|e| e as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_users_by_role(&self, role: Role) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| query_users_by_role(conn, role.as_str()))
    }
}

fn query_users_by_role(conn: &Connection, role: &str) -> Result<Vec<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, email, password, role, created_at FROM users WHERE role = ?1")?;

    let rows = stmt
        .query_map([role], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

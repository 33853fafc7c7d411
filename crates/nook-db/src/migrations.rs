use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'user',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            status      TEXT NOT NULL DEFAULT 'pending',
            owner_id    TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            updated_at  TEXT,
            updated_by  TEXT REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_owner
            ON tasks(owner_id, status);

        CREATE TABLE IF NOT EXISTS notes (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            owner_id    TEXT NOT NULL REFERENCES users(id),
            visibility  TEXT NOT NULL DEFAULT 'private',
            created_at  TEXT NOT NULL,
            updated_at  TEXT,
            updated_by  TEXT REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_notes_owner
            ON notes(owner_id);

        CREATE TABLE IF NOT EXISTS note_shares (
            note_id     TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            UNIQUE(note_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_note_shares_note
            ON note_shares(note_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

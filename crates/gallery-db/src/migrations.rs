use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reactions (
            id          TEXT PRIMARY KEY,
            image_id    TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            user_name   TEXT NOT NULL,
            emoji       TEXT NOT NULL,
            image_url   TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_image
            ON reactions(image_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_reactions_created
            ON reactions(created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            image_id    TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            user_name   TEXT NOT NULL,
            text        TEXT NOT NULL,
            image_url   TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_image
            ON comments(image_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_comments_created
            ON comments(created_at);

        -- Named blobs of client state (the identity store lives here)
        CREATE TABLE IF NOT EXISTS local_state (
            name        TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE memorials (
                id              INTEGER PRIMARY KEY,
                slug            TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                epitaph         TEXT,
                bio             TEXT,
                birth_date      TEXT,
                death_date      TEXT,
                image_filename  TEXT,
                owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_memorials_owner ON memorials(owner_id);

            CREATE TABLE condolences (
                id                   INTEGER PRIMARY KEY,
                memorial_id          INTEGER NOT NULL REFERENCES memorials(id) ON DELETE CASCADE,
                author_name          TEXT NOT NULL,
                author_email         TEXT,
                author_relationship  TEXT,
                message              TEXT NOT NULL,
                is_approved          INTEGER NOT NULL DEFAULT 0,
                is_featured          INTEGER NOT NULL DEFAULT 0,
                visitor_id           TEXT,
                ip_address           TEXT,
                created_at           TEXT NOT NULL DEFAULT (datetime('now')),
                approved_at          TEXT
            );

            CREATE INDEX idx_condolences_memorial ON condolences(memorial_id, is_approved);

            CREATE TABLE media_items (
                id                 INTEGER PRIMARY KEY,
                memorial_id        INTEGER NOT NULL REFERENCES memorials(id) ON DELETE CASCADE,
                filename           TEXT NOT NULL,
                original_filename  TEXT,
                media_type         TEXT NOT NULL DEFAULT 'image',
                mime_type          TEXT,
                file_size          INTEGER,
                title              TEXT,
                caption            TEXT,
                taken_at           TEXT,
                location           TEXT,
                display_order      INTEGER NOT NULL DEFAULT 0,
                is_featured        INTEGER NOT NULL DEFAULT 0,
                is_cover           INTEGER NOT NULL DEFAULT 0,
                created_at         TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_media_memorial ON media_items(memorial_id);

            CREATE TABLE timeline_events (
                id              INTEGER PRIMARY KEY,
                memorial_id     INTEGER NOT NULL REFERENCES memorials(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                description     TEXT,
                event_date      TEXT NOT NULL,
                event_type      TEXT NOT NULL DEFAULT 'general',
                image_filename  TEXT,
                icon            TEXT,
                display_order   INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT
            );

            CREATE INDEX idx_timeline_memorial ON timeline_events(memorial_id, event_date);

            CREATE TABLE reactions (
                id             INTEGER PRIMARY KEY,
                memorial_id    INTEGER NOT NULL REFERENCES memorials(id) ON DELETE CASCADE,
                reaction_type  TEXT NOT NULL,
                visitor_id     TEXT NOT NULL,
                created_at     TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(memorial_id, reaction_type, visitor_id)
            );

            CREATE INDEX idx_reactions_memorial ON reactions(memorial_id);

            CREATE TABLE visits (
                id           INTEGER PRIMARY KEY,
                memorial_id  INTEGER NOT NULL REFERENCES memorials(id) ON DELETE CASCADE,
                ip_address   TEXT,
                user_agent   TEXT,
                referrer     TEXT,
                country      TEXT,
                city         TEXT,
                visited_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_visits_memorial ON visits(memorial_id, visited_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreResult;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (principals, relations, messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE students (
                id          INTEGER PRIMARY KEY,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE clubs (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                category    TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE memberships (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id  INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
                club_id     INTEGER NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(student_id, club_id)
            );

            CREATE INDEX idx_memberships_club ON memberships(club_id);

            CREATE TABLE bookmarks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id  INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
                club_id     INTEGER NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(student_id, club_id)
            );

            CREATE INDEX idx_bookmarks_club ON bookmarks(club_id);

            -- AUTOINCREMENT: message ids are never reused, even after a rollback.
            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_kind     TEXT NOT NULL CHECK (sender_kind IN ('student', 'club')),
                sender_id       INTEGER NOT NULL,
                receiver_kind   TEXT NOT NULL CHECK (receiver_kind IN ('student', 'club')),
                receiver_id     INTEGER NOT NULL,
                body            TEXT NOT NULL CHECK (length(trim(body)) > 0),
                sent_at         TEXT NOT NULL,
                read_at         TEXT,
                CHECK (sender_kind <> receiver_kind OR sender_id <> receiver_id)
            );

            CREATE INDEX idx_messages_receiver
                ON messages(receiver_kind, receiver_id, sender_kind, sender_id);
            CREATE INDEX idx_messages_sender
                ON messages(sender_kind, sender_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

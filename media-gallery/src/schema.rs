use rusqlite::{Connection, Result};

/// Initialize the media index schema.
///
/// On a real device the index is owned by the platform; this layout is what
/// [`IndexSource`](crate::source::IndexSource) expects. Embedders that
/// maintain their own index (and every test fixture) create it here.
pub fn init_index_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM media_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_media_schema_v1(conn)?;
        conn.execute("INSERT INTO media_schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create media index schema version 1
fn create_media_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY,
            date_added INTEGER,
            date_modified INTEGER NOT NULL DEFAULT 0,
            path TEXT NOT NULL,
            bucket_id TEXT NOT NULL,
            bucket_name TEXT,
            mime_type TEXT,
            orientation INTEGER,
            width INTEGER,
            height INTEGER,
            is_live_photo INTEGER NOT NULL DEFAULT 0 CHECK(is_live_photo IN (0,1)),
            paired_video_path TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_images_bucket ON images(bucket_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_images_date_added ON images(date_added)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY,
            date_added INTEGER,
            date_modified INTEGER NOT NULL DEFAULT 0,
            path TEXT NOT NULL,
            bucket_id TEXT NOT NULL,
            bucket_name TEXT,
            mime_type TEXT,
            orientation INTEGER,
            duration_ms INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_videos_bucket ON videos(bucket_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_videos_date_added ON videos(date_added)",
        [],
    )?;

    // The platform's own thumbnail registry (asset id -> rendered preview).
    conn.execute(
        "CREATE TABLE IF NOT EXISTS thumbnails (
            asset_id TEXT NOT NULL,
            kind INTEGER NOT NULL,
            path TEXT NOT NULL,
            PRIMARY KEY (asset_id, kind)
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_index_schema(&conn).unwrap();
        init_index_schema(&conn).unwrap();

        let version: i32 = conn
            .query_row(
                "SELECT MAX(version) FROM media_schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 1);
    }
}

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
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                full_name   TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_user ON sessions(user_id);

            CREATE TABLE news_categories (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT NOT NULL DEFAULT '',
                color       TEXT NOT NULL DEFAULT 'blue',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE news (
                id            TEXT PRIMARY KEY,
                title         TEXT NOT NULL,
                content       TEXT NOT NULL,
                excerpt       TEXT NOT NULL DEFAULT '',
                image_url     TEXT NOT NULL DEFAULT '',
                category_id   TEXT REFERENCES news_categories(id) ON DELETE SET NULL,
                author_id     TEXT REFERENCES users(id) ON DELETE SET NULL,
                status        TEXT NOT NULL DEFAULT 'draft',
                priority      TEXT NOT NULL DEFAULT 'normal',
                published_at  TEXT,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE INDEX idx_news_published ON news(status, published_at);
            CREATE INDEX idx_news_category ON news(category_id);

            CREATE TABLE news_comments (
                id          TEXT PRIMARY KEY,
                news_id     TEXT NOT NULL REFERENCES news(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_news ON news_comments(news_id, created_at);

            CREATE TABLE resident_info (
                id                 TEXT PRIMARY KEY,
                user_id            TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                full_name          TEXT NOT NULL,
                phone              TEXT NOT NULL DEFAULT '',
                house_number       TEXT NOT NULL,
                block              TEXT NOT NULL,
                family_members     INTEGER NOT NULL DEFAULT 1,
                occupation         TEXT NOT NULL DEFAULT '',
                emergency_contact  TEXT NOT NULL DEFAULT '',
                vehicle_info       TEXT NOT NULL DEFAULT '',
                notes              TEXT NOT NULL DEFAULT '',
                is_public          INTEGER NOT NULL DEFAULT 1,
                created_at         TEXT NOT NULL,
                updated_at         TEXT NOT NULL
            );

            CREATE INDEX idx_residents_directory ON resident_info(is_public, block, house_number);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_twice_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}

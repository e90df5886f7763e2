use crate::models::{SessionUserRow, UserRow};
use crate::{Database, inserted};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, email, password, full_name, role, created_at";

impl Database {
    // -- Users --

    /// Returns false when the email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        full_name: &str,
        role: &str,
        created_at: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            inserted(conn.execute(
                "INSERT INTO users (id, email, password, full_name, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, email, password_hash, full_name, role, created_at),
            ))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Returns false when no such user exists.
    pub fn set_user_role(&self, id: &str, role: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", (role, id))?;
            Ok(changed > 0)
        })
    }

    // -- Sessions --

    pub fn create_session(
        &self,
        id: &str,
        user_id: &str,
        created_at: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, created_at, expires_at),
            )?;
            Ok(())
        })
    }

    /// Resolve a session that has not yet expired at `now`.
    pub fn get_session_user(&self, session_id: &str, now: &str) -> Result<Option<SessionUserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT s.id, s.expires_at,
                            u.id, u.email, u.password, u.full_name, u.role, u.created_at
                     FROM sessions s
                     JOIN users u ON u.id = s.user_id
                     WHERE s.id = ?1 AND s.expires_at > ?2",
                    (session_id, now),
                    |row| {
                        Ok(SessionUserRow {
                            session_id: row.get(0)?,
                            expires_at: row.get(1)?,
                            user: UserRow {
                                id: row.get(2)?,
                                email: row.get(3)?,
                                password: row.get(4)?,
                                full_name: row.get(5)?,
                                role: row.get(6)?,
                                created_at: row.get(7)?,
                            },
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Drop every session that expired before `now`. Returns how many went.
    pub fn delete_expired_sessions(&self, now: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
            Ok(deleted)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        full_name: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "ani@kalita.id", "hash", "Ani", "user", "2026-01-01T00:00:00.000000Z")
            .unwrap();
        db
    }

    #[test]
    fn users_are_found_by_email_and_id() {
        let db = seeded();
        let by_email = db.get_user_by_email("ani@kalita.id").unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
        assert_eq!(db.get_user_by_id("u1").unwrap().unwrap().full_name, "Ani");
        assert!(db.get_user_by_email("nobody@kalita.id").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = seeded();
        let dup = db.create_user("u2", "ani@kalita.id", "h", "Ani 2", "user", "2026-01-01T00:00:00.000000Z");
        assert!(!dup.unwrap());
        assert!(db.get_user_by_id("u2").unwrap().is_none());
    }

    #[test]
    fn role_updates_report_missing_users() {
        let db = seeded();
        assert!(db.set_user_role("u1", "admin").unwrap());
        assert_eq!(db.get_user_by_id("u1").unwrap().unwrap().role, "admin");
        assert!(!db.set_user_role("ghost", "admin").unwrap());
    }

    #[test]
    fn sessions_expire_and_can_be_revoked() {
        let db = seeded();
        db.create_session("s1", "u1", "2026-01-01T00:00:00.000000Z", "2026-02-01T00:00:00.000000Z")
            .unwrap();

        let live = db.get_session_user("s1", "2026-01-15T00:00:00.000000Z").unwrap().unwrap();
        assert_eq!(live.user.email, "ani@kalita.id");
        assert!(db.get_session_user("s1", "2026-03-01T00:00:00.000000Z").unwrap().is_none());

        assert!(db.delete_session("s1").unwrap());
        assert!(db.get_session_user("s1", "2026-01-15T00:00:00.000000Z").unwrap().is_none());
    }

    #[test]
    fn expired_sessions_are_pruned() {
        let db = seeded();
        db.create_session("old", "u1", "2026-01-01T00:00:00.000000Z", "2026-01-02T00:00:00.000000Z")
            .unwrap();
        db.create_session("new", "u1", "2026-01-01T00:00:00.000000Z", "2026-12-01T00:00:00.000000Z")
            .unwrap();

        assert_eq!(db.delete_expired_sessions("2026-06-01T00:00:00.000000Z").unwrap(), 1);
        assert!(db.get_session_user("new", "2026-06-01T00:00:00.000000Z").unwrap().is_some());
    }
}

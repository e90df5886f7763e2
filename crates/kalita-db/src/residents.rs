use crate::models::ResidentRow;
use crate::Database;
use anyhow::Result;
use kalita_types::api::UpsertResidentRequest;
use rusqlite::{OptionalExtension, Row, params};

const RESIDENT_COLUMNS: &str = "id, user_id, full_name, phone, house_number, block, family_members,
    occupation, emergency_contact, vehicle_info, notes, is_public, created_at, updated_at";

impl Database {
    /// Public directory entries ordered by block then house number,
    /// optionally narrowed to one block.
    pub fn list_public_residents(&self, block: Option<&str>) -> Result<Vec<ResidentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RESIDENT_COLUMNS} FROM resident_info
                 WHERE is_public = 1 AND (?1 IS NULL OR block = ?1)
                 ORDER BY block ASC, house_number ASC"
            ))?;
            let rows = stmt
                .query_map([block], map_resident)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_resident(&self, id: &str) -> Result<Option<ResidentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {RESIDENT_COLUMNS} FROM resident_info WHERE id = ?1"),
                    [id],
                    map_resident,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_resident_by_user(&self, user_id: &str) -> Result<Option<ResidentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {RESIDENT_COLUMNS} FROM resident_info WHERE user_id = ?1"),
                    [user_id],
                    map_resident,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Insert-or-replace keyed on `user_id`. An existing record keeps its id
    /// and `created_at`; every other column takes the new values.
    pub fn upsert_resident(
        &self,
        new_id: &str,
        user_id: &str,
        fields: &UpsertResidentRequest,
        now: &str,
    ) -> Result<ResidentRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO resident_info (id, user_id, full_name, phone, house_number, block,
                                            family_members, occupation, emergency_contact,
                                            vehicle_info, notes, is_public, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
                 ON CONFLICT(user_id) DO UPDATE SET
                     full_name = excluded.full_name,
                     phone = excluded.phone,
                     house_number = excluded.house_number,
                     block = excluded.block,
                     family_members = excluded.family_members,
                     occupation = excluded.occupation,
                     emergency_contact = excluded.emergency_contact,
                     vehicle_info = excluded.vehicle_info,
                     notes = excluded.notes,
                     is_public = excluded.is_public,
                     updated_at = excluded.updated_at",
                params![
                    new_id,
                    user_id,
                    fields.full_name,
                    fields.phone,
                    fields.house_number,
                    fields.block,
                    fields.family_members,
                    fields.occupation,
                    fields.emergency_contact,
                    fields.vehicle_info,
                    fields.notes,
                    fields.is_public,
                    now,
                ],
            )?;
            let row = tx.query_row(
                &format!("SELECT {RESIDENT_COLUMNS} FROM resident_info WHERE user_id = ?1"),
                [user_id],
                map_resident,
            )?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn delete_resident(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM resident_info WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn map_resident(row: &Row<'_>) -> rusqlite::Result<ResidentRow> {
    Ok(ResidentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        phone: row.get(3)?,
        house_number: row.get(4)?,
        block: row.get(5)?,
        family_members: row.get(6)?,
        occupation: row.get(7)?,
        emergency_contact: row.get(8)?,
        vehicle_info: row.get(9)?,
        notes: row.get(10)?,
        is_public: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, block: &str, house: &str, public: bool) -> UpsertResidentRequest {
        UpsertResidentRequest {
            full_name: name.into(),
            phone: "08123456789".into(),
            house_number: house.into(),
            block: block.into(),
            family_members: 4,
            occupation: "Wiraswasta".into(),
            emergency_contact: String::new(),
            vehicle_info: String::new(),
            notes: String::new(),
            is_public: public,
        }
    }

    fn seeded(users: &[&str]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for id in users {
            db.create_user(id, &format!("{id}@kalita.id"), "hash", id, "user", "2026-01-01T00:00:00.000000Z")
                .unwrap();
        }
        db
    }

    #[test]
    fn upsert_twice_keeps_one_row_with_latest_values() {
        let db = seeded(&["u1"]);
        let first = db
            .upsert_resident("r1", "u1", &request("Ani", "A", "1", true), "2026-01-02T00:00:00.000000Z")
            .unwrap();
        let second = db
            .upsert_resident("r2", "u1", &request("Ani Wijaya", "B", "9", false), "2026-01-03T00:00:00.000000Z")
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.full_name, "Ani Wijaya");
        assert_eq!(second.block, "B");
        assert!(!second.is_public);
        assert_eq!(second.created_at, "2026-01-02T00:00:00.000000Z");
        assert_eq!(second.updated_at, "2026-01-03T00:00:00.000000Z");

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM resident_info", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
        assert!(db.get_resident("r2").unwrap().is_none());
    }

    #[test]
    fn directory_lists_public_rows_by_block_then_house() {
        let db = seeded(&["u1", "u2", "u3", "u4"]);
        let now = "2026-01-02T00:00:00.000000Z";
        db.upsert_resident("r1", "u1", &request("Citra", "B", "2", true), now).unwrap();
        db.upsert_resident("r2", "u2", &request("Budi", "A", "7", true), now).unwrap();
        db.upsert_resident("r3", "u3", &request("Dewi", "A", "3", true), now).unwrap();
        db.upsert_resident("r4", "u4", &request("Eko", "A", "1", false), now).unwrap();

        let ids: Vec<String> = db.list_public_residents(None).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["r3", "r2", "r1"]);

        let block_b: Vec<String> =
            db.list_public_residents(Some("B")).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(block_b, vec!["r1"]);
    }

    #[test]
    fn own_record_is_visible_even_when_private() {
        let db = seeded(&["u1"]);
        db.upsert_resident("r1", "u1", &request("Ani", "A", "1", false), "2026-01-02T00:00:00.000000Z")
            .unwrap();

        assert!(db.get_resident_by_user("u1").unwrap().is_some());
        assert!(db.list_public_residents(None).unwrap().is_empty());
        assert!(db.get_resident_by_user("u2").unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_a_row_went() {
        let db = seeded(&["u1"]);
        db.upsert_resident("r1", "u1", &request("Ani", "A", "1", true), "2026-01-02T00:00:00.000000Z")
            .unwrap();
        assert!(db.delete_resident("r1").unwrap());
        assert!(!db.delete_resident("r1").unwrap());
    }
}

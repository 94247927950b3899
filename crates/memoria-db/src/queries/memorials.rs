use crate::Database;
use crate::models::MemorialRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn map_memorial(row: &Row) -> rusqlite::Result<MemorialRow> {
    Ok(MemorialRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        epitaph: row.get(3)?,
        bio: row.get(4)?,
        birth_date: row.get(5)?,
        death_date: row.get(6)?,
        image_filename: row.get(7)?,
        owner_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const MEMORIAL_COLS: &str =
    "id, slug, name, epitaph, bio, birth_date, death_date, image_filename, owner_id, created_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn create_memorial(
        &self,
        owner_id: i64,
        slug: &str,
        name: &str,
        epitaph: Option<&str>,
        bio: Option<&str>,
        birth_date: Option<&str>,
        death_date: Option<&str>,
    ) -> Result<MemorialRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO memorials (slug, name, epitaph, bio, birth_date, death_date, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![slug, name, epitaph, bio, birth_date, death_date, owner_id],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {} FROM memorials WHERE id = ?1", MEMORIAL_COLS);
            conn.query_row(&sql, [id], map_memorial).map_err(Into::into)
        })
    }

    pub fn get_memorial(&self, id: i64) -> Result<Option<MemorialRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM memorials WHERE id = ?1", MEMORIAL_COLS);
            conn.query_row(&sql, [id], map_memorial).optional().map_err(Into::into)
        })
    }

    pub fn get_memorial_by_slug(&self, slug: &str) -> Result<Option<MemorialRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM memorials WHERE slug = ?1", MEMORIAL_COLS);
            conn.query_row(&sql, [slug], map_memorial).optional().map_err(Into::into)
        })
    }

    pub fn slug_exists(&self, slug: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM memorials WHERE slug = ?1",
                [slug],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    /// All memorials owned by a user, newest first.
    pub fn list_memorials_by_owner(&self, owner_id: i64) -> Result<Vec<MemorialRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM memorials WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
                MEMORIAL_COLS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], map_memorial)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial update; absent fields keep their current value. The slug is
    /// never touched.
    #[allow(clippy::too_many_arguments)]
    pub fn update_memorial(
        &self,
        id: i64,
        name: Option<&str>,
        epitaph: Option<&str>,
        bio: Option<&str>,
        birth_date: Option<&str>,
        death_date: Option<&str>,
    ) -> Result<Option<MemorialRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE memorials SET
                     name = COALESCE(?2, name),
                     epitaph = COALESCE(?3, epitaph),
                     bio = COALESCE(?4, bio),
                     birth_date = COALESCE(?5, birth_date),
                     death_date = COALESCE(?6, death_date)
                 WHERE id = ?1",
                params![id, name, epitaph, bio, birth_date, death_date],
            )?;
            let sql = format!("SELECT {} FROM memorials WHERE id = ?1", MEMORIAL_COLS);
            conn.query_row(&sql, [id], map_memorial).optional().map_err(Into::into)
        })
    }

    pub fn set_memorial_image(&self, id: i64, filename: &str) -> Result<Option<MemorialRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE memorials SET image_filename = ?2 WHERE id = ?1",
                params![id, filename],
            )?;
            let sql = format!("SELECT {} FROM memorials WHERE id = ?1", MEMORIAL_COLS);
            conn.query_row(&sql, [id], map_memorial).optional().map_err(Into::into)
        })
    }

    /// Cascades to condolences, media, timeline events, reactions and visits.
    pub fn delete_memorial(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM memorials WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{open_test_db, seed_user};

    #[test]
    fn create_list_update_delete() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");

        let m = db
            .create_memorial(owner, "juan-perez-a1b2c3d4", "Juan Pérez", Some("Siempre en nuestros corazones"), None, Some("1950-03-15"), Some("2024-01-20"))
            .unwrap();
        assert_eq!(m.owner_id, owner);
        assert_eq!(m.slug, "juan-perez-a1b2c3d4");

        let listed = db.list_memorials_by_owner(owner).unwrap();
        assert_eq!(listed.len(), 1);

        let updated = db
            .update_memorial(m.id, Some("Juan Pérez García"), None, Some("Una vida plena."), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Juan Pérez García");
        assert_eq!(updated.bio.as_deref(), Some("Una vida plena."));
        // Untouched fields survive the partial update.
        assert_eq!(updated.epitaph.as_deref(), Some("Siempre en nuestros corazones"));
        assert_eq!(updated.slug, m.slug);

        assert!(db.delete_memorial(m.id).unwrap());
        assert!(db.get_memorial(m.id).unwrap().is_none());
        assert!(!db.delete_memorial(m.id).unwrap());
    }

    #[test]
    fn slug_lookup_and_uniqueness() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        db.create_memorial(owner, "maria-lopez-00000001", "María López", None, None, None, None)
            .unwrap();

        assert!(db.slug_exists("maria-lopez-00000001").unwrap());
        assert!(!db.slug_exists("otro-slug").unwrap());
        assert!(db.get_memorial_by_slug("maria-lopez-00000001").unwrap().is_some());

        // The slug column is UNIQUE.
        assert!(
            db.create_memorial(owner, "maria-lopez-00000001", "Otra", None, None, None, None)
                .is_err()
        );
    }

    #[test]
    fn delete_cascades_to_children() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let m = db
            .create_memorial(owner, "juan-a1b2c3d4", "Juan", None, None, None, None)
            .unwrap();

        db.insert_visit(m.id, Some("203.0.113.7"), None, None).unwrap();
        db.toggle_reaction(m.id, "candle", "visitor-1").unwrap();
        db.insert_condolence(m.id, "Pedro", None, None, "Un abrazo enorme para la familia.", None, None)
            .unwrap();

        assert!(db.delete_memorial(m.id).unwrap());
        assert_eq!(db.visit_count(m.id, None).unwrap(), 0);
        assert_eq!(db.reaction_counts(m.id, None).unwrap().len(), 0);
    }
}

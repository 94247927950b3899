use crate::Database;
use crate::models::MediaItemRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn map_media(row: &Row) -> rusqlite::Result<MediaItemRow> {
    Ok(MediaItemRow {
        id: row.get(0)?,
        memorial_id: row.get(1)?,
        filename: row.get(2)?,
        original_filename: row.get(3)?,
        media_type: row.get(4)?,
        mime_type: row.get(5)?,
        file_size: row.get(6)?,
        title: row.get(7)?,
        caption: row.get(8)?,
        taken_at: row.get(9)?,
        location: row.get(10)?,
        display_order: row.get(11)?,
        is_featured: row.get(12)?,
        is_cover: row.get(13)?,
        created_at: row.get(14)?,
    })
}

const MEDIA_COLS: &str = "id, memorial_id, filename, original_filename, media_type, mime_type, \
     file_size, title, caption, taken_at, location, display_order, is_featured, is_cover, created_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_media_item(
        &self,
        memorial_id: i64,
        filename: &str,
        original_filename: Option<&str>,
        media_type: &str,
        mime_type: Option<&str>,
        file_size: Option<i64>,
        title: Option<&str>,
        caption: Option<&str>,
        taken_at: Option<&str>,
        location: Option<&str>,
    ) -> Result<MediaItemRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO media_items
                     (memorial_id, filename, original_filename, media_type, mime_type,
                      file_size, title, caption, taken_at, location)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    memorial_id,
                    filename,
                    original_filename,
                    media_type,
                    mime_type,
                    file_size,
                    title,
                    caption,
                    taken_at,
                    location
                ],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {} FROM media_items WHERE id = ?1", MEDIA_COLS);
            conn.query_row(&sql, [id], map_media).map_err(Into::into)
        })
    }

    pub fn get_media_item(&self, id: i64) -> Result<Option<MediaItemRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM media_items WHERE id = ?1", MEDIA_COLS);
            conn.query_row(&sql, [id], map_media).optional().map_err(Into::into)
        })
    }

    pub fn list_media_items(&self, memorial_id: i64) -> Result<Vec<MediaItemRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM media_items WHERE memorial_id = ?1
                 ORDER BY display_order ASC, created_at DESC, id DESC",
                MEDIA_COLS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([memorial_id], map_media)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_media_item(
        &self,
        id: i64,
        title: Option<&str>,
        caption: Option<&str>,
        taken_at: Option<&str>,
        location: Option<&str>,
        display_order: Option<i64>,
        is_featured: Option<bool>,
    ) -> Result<Option<MediaItemRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE media_items SET
                     title = COALESCE(?2, title),
                     caption = COALESCE(?3, caption),
                     taken_at = COALESCE(?4, taken_at),
                     location = COALESCE(?5, location),
                     display_order = COALESCE(?6, display_order),
                     is_featured = COALESCE(?7, is_featured)
                 WHERE id = ?1",
                params![id, title, caption, taken_at, location, display_order, is_featured],
            )?;
            let sql = format!("SELECT {} FROM media_items WHERE id = ?1", MEDIA_COLS);
            conn.query_row(&sql, [id], map_media).optional().map_err(Into::into)
        })
    }

    pub fn delete_media_item(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM media_items WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// (memorial_id, owner_id) for authorization checks.
    pub fn media_item_owner(&self, id: i64) -> Result<Option<(i64, i64)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT g.memorial_id, m.owner_id
                 FROM media_items g JOIN memorials m ON m.id = g.memorial_id
                 WHERE g.id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{open_test_db, seed_memorial, seed_user};

    #[test]
    fn gallery_ordering_and_update() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        let a = db
            .insert_media_item(memorial, "aaa.jpg", Some("boda.jpg"), "image", Some("image/jpeg"), Some(1024), Some("Boda"), None, Some("1975-06-01"), Some("Sevilla"))
            .unwrap();
        let b = db
            .insert_media_item(memorial, "bbb.mp4", None, "video", Some("video/mp4"), None, None, None, None, None)
            .unwrap();

        // Lower display_order sorts first.
        db.update_media_item(b.id, None, None, None, None, Some(-1), None).unwrap();
        let items = db.list_media_items(memorial).unwrap();
        assert_eq!(items[0].id, b.id);
        assert_eq!(items[1].id, a.id);
        assert_eq!(items[1].media_type, "image");

        let updated = db
            .update_media_item(a.id, Some("Boda de Juan"), Some("Día inolvidable"), None, None, None, Some(true))
            .unwrap()
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("Boda de Juan"));
        assert!(updated.is_featured);
        assert_eq!(updated.taken_at.as_deref(), Some("1975-06-01"));

        assert_eq!(db.media_item_owner(a.id).unwrap(), Some((memorial, owner)));
        assert!(db.delete_media_item(a.id).unwrap());
        assert!(db.get_media_item(a.id).unwrap().is_none());
    }
}

use crate::Database;
use crate::models::CondolenceRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn map_condolence(row: &Row) -> rusqlite::Result<CondolenceRow> {
    Ok(CondolenceRow {
        id: row.get(0)?,
        memorial_id: row.get(1)?,
        author_name: row.get(2)?,
        author_email: row.get(3)?,
        author_relationship: row.get(4)?,
        message: row.get(5)?,
        is_approved: row.get(6)?,
        is_featured: row.get(7)?,
        visitor_id: row.get(8)?,
        ip_address: row.get(9)?,
        created_at: row.get(10)?,
        approved_at: row.get(11)?,
    })
}

const CONDOLENCE_COLS: &str = "id, memorial_id, author_name, author_email, author_relationship, \
     message, is_approved, is_featured, visitor_id, ip_address, created_at, approved_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_condolence(
        &self,
        memorial_id: i64,
        author_name: &str,
        author_email: Option<&str>,
        author_relationship: Option<&str>,
        message: &str,
        visitor_id: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<CondolenceRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO condolences
                     (memorial_id, author_name, author_email, author_relationship, message, visitor_id, ip_address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![memorial_id, author_name, author_email, author_relationship, message, visitor_id, ip_address],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {} FROM condolences WHERE id = ?1", CONDOLENCE_COLS);
            conn.query_row(&sql, [id], map_condolence).map_err(Into::into)
        })
    }

    pub fn get_condolence(&self, id: i64) -> Result<Option<CondolenceRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM condolences WHERE id = ?1", CONDOLENCE_COLS);
            conn.query_row(&sql, [id], map_condolence).optional().map_err(Into::into)
        })
    }

    /// Condolences of a memorial, featured first then newest, plus the total
    /// matching count (before limit/offset).
    pub fn list_condolences(
        &self,
        memorial_id: i64,
        approved_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CondolenceRow>, i64)> {
        self.with_conn(|conn| {
            let filter = if approved_only {
                "memorial_id = ?1 AND is_approved = 1"
            } else {
                "memorial_id = ?1"
            };

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM condolences WHERE {}", filter),
                [memorial_id],
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {} FROM condolences WHERE {}
                 ORDER BY is_featured DESC, created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
                CONDOLENCE_COLS, filter
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![memorial_id, limit, offset], map_condolence)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    pub fn pending_condolence_count(&self, memorial_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM condolences WHERE memorial_id = ?1 AND is_approved = 0",
                [memorial_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
    }

    /// Moderation update. `approved_at` is stamped on the first transition to
    /// approved and never cleared afterwards.
    pub fn moderate_condolence(
        &self,
        id: i64,
        is_approved: Option<bool>,
        is_featured: Option<bool>,
    ) -> Result<Option<CondolenceRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE condolences SET
                     approved_at = CASE
                         WHEN ?2 = 1 AND is_approved = 0 THEN datetime('now')
                         ELSE approved_at
                     END,
                     is_approved = COALESCE(?2, is_approved),
                     is_featured = COALESCE(?3, is_featured)
                 WHERE id = ?1",
                params![id, is_approved, is_featured],
            )?;
            let sql = format!("SELECT {} FROM condolences WHERE id = ?1", CONDOLENCE_COLS);
            conn.query_row(&sql, [id], map_condolence).optional().map_err(Into::into)
        })
    }

    pub fn delete_condolence(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM condolences WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// (memorial_id, owner_id) for authorization checks on moderation.
    pub fn condolence_owner(&self, id: i64) -> Result<Option<(i64, i64)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT c.memorial_id, m.owner_id
                 FROM condolences c JOIN memorials m ON m.id = c.memorial_id
                 WHERE c.id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

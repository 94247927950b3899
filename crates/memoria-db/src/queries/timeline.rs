use crate::Database;
use crate::models::TimelineEventRow;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn map_event(row: &Row) -> rusqlite::Result<TimelineEventRow> {
    Ok(TimelineEventRow {
        id: row.get(0)?,
        memorial_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        event_date: row.get(4)?,
        event_type: row.get(5)?,
        image_filename: row.get(6)?,
        icon: row.get(7)?,
        display_order: row.get(8)?,
        created_at: row.get(9)?,
    })
}

const EVENT_COLS: &str = "id, memorial_id, title, description, event_date, event_type, \
     image_filename, icon, display_order, created_at";

impl Database {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_timeline_event(
        &self,
        memorial_id: i64,
        title: &str,
        description: Option<&str>,
        event_date: &str,
        event_type: &str,
        icon: Option<&str>,
        display_order: i64,
    ) -> Result<TimelineEventRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO timeline_events
                     (memorial_id, title, description, event_date, event_type, icon, display_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![memorial_id, title, description, event_date, event_type, icon, display_order],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {} FROM timeline_events WHERE id = ?1", EVENT_COLS);
            conn.query_row(&sql, [id], map_event).map_err(Into::into)
        })
    }

    pub fn get_timeline_event(&self, id: i64) -> Result<Option<TimelineEventRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM timeline_events WHERE id = ?1", EVENT_COLS);
            conn.query_row(&sql, [id], map_event).optional().map_err(Into::into)
        })
    }

    /// Events ordered chronologically; `YYYY` dates sort before `YYYY-MM-DD`
    /// of the same year, which reads naturally on the timeline.
    pub fn list_timeline_events(&self, memorial_id: i64) -> Result<Vec<TimelineEventRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM timeline_events WHERE memorial_id = ?1
                 ORDER BY event_date ASC, display_order ASC, id ASC",
                EVENT_COLS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([memorial_id], map_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_timeline_event(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
        event_date: Option<&str>,
        event_type: Option<&str>,
        icon: Option<&str>,
        display_order: Option<i64>,
    ) -> Result<Option<TimelineEventRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE timeline_events SET
                     title = COALESCE(?2, title),
                     description = COALESCE(?3, description),
                     event_date = COALESCE(?4, event_date),
                     event_type = COALESCE(?5, event_type),
                     icon = COALESCE(?6, icon),
                     display_order = COALESCE(?7, display_order),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                params![id, title, description, event_date, event_type, icon, display_order],
            )?;
            let sql = format!("SELECT {} FROM timeline_events WHERE id = ?1", EVENT_COLS);
            conn.query_row(&sql, [id], map_event).optional().map_err(Into::into)
        })
    }

    pub fn set_timeline_event_image(
        &self,
        id: i64,
        filename: &str,
    ) -> Result<Option<TimelineEventRow>> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE timeline_events SET image_filename = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![id, filename],
            )?;
            let sql = format!("SELECT {} FROM timeline_events WHERE id = ?1", EVENT_COLS);
            conn.query_row(&sql, [id], map_event).optional().map_err(Into::into)
        })
    }

    pub fn delete_timeline_event(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM timeline_events WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// (memorial_id, owner_id) for authorization checks.
    pub fn timeline_event_owner(&self, id: i64) -> Result<Option<(i64, i64)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT t.memorial_id, m.owner_id
                 FROM timeline_events t JOIN memorials m ON m.id = t.memorial_id
                 WHERE t.id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

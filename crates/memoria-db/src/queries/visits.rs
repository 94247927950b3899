use crate::{Database, DateRange};
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Records a visit and returns its id. Geolocation arrives later via
    /// [`Database::set_visit_location`].
    pub fn insert_visit(
        &self,
        memorial_id: i64,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO visits (memorial_id, ip_address, user_agent, referrer)
                 VALUES (?1, ?2, ?3, ?4)",
                params![memorial_id, ip_address, user_agent, referrer],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn set_visit_location(
        &self,
        visit_id: i64,
        country: Option<&str>,
        city: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE visits SET country = ?2, city = ?3 WHERE id = ?1",
                params![visit_id, country, city],
            )?;
            Ok(())
        })
    }

    /// Total visits of a memorial, optionally scoped to a day range.
    pub fn visit_count(&self, memorial_id: i64, range: Option<DateRange>) -> Result<i64> {
        self.with_conn(|conn| {
            let n = match range {
                Some(r) => conn.query_row(
                    "SELECT COUNT(*) FROM visits
                     WHERE memorial_id = ?1 AND date(visited_at) BETWEEN ?2 AND ?3",
                    params![memorial_id, r.start.to_string(), r.end.to_string()],
                    |row| row.get(0),
                )?,
                None => conn.query_row(
                    "SELECT COUNT(*) FROM visits WHERE memorial_id = ?1",
                    [memorial_id],
                    |row| row.get(0),
                )?,
            };
            Ok(n)
        })
    }

    pub fn today_visit_count(&self, memorial_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM visits
                 WHERE memorial_id = ?1 AND date(visited_at) = date('now')",
                [memorial_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
    }

    pub fn week_visit_count(&self, memorial_id: i64) -> Result<i64> {
        self.rolling_visit_count(memorial_id, "-7 days")
    }

    pub fn month_visit_count(&self, memorial_id: i64) -> Result<i64> {
        self.rolling_visit_count(memorial_id, "-30 days")
    }

    fn rolling_visit_count(&self, memorial_id: i64, modifier: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM visits
                 WHERE memorial_id = ?1 AND visited_at >= datetime('now', ?2)",
                params![memorial_id, modifier],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
    }

    /// Sparse per-day `(date, count)` rows inside the range, oldest first.
    /// Days without visits are absent; the chart layer densifies.
    pub fn daily_visit_stats(
        &self,
        memorial_id: i64,
        range: DateRange,
    ) -> Result<Vec<(String, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT date(visited_at) AS day, COUNT(*) FROM visits
                 WHERE memorial_id = ?1 AND date(visited_at) BETWEEN ?2 AND ?3
                 GROUP BY day ORDER BY day ASC",
            )?;
            let rows = stmt
                .query_map(
                    params![memorial_id, range.start.to_string(), range.end.to_string()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Total visits across a set of memorials (dashboard rollup).
    pub fn total_visits_for(&self, memorial_ids: &[i64], range: Option<DateRange>) -> Result<i64> {
        if memorial_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=memorial_ids.len()).map(|i| format!("?{}", i)).collect();
            let mut sql = format!(
                "SELECT COUNT(*) FROM visits WHERE memorial_id IN ({})",
                placeholders.join(", ")
            );

            let mut p: Vec<&dyn rusqlite::types::ToSql> = memorial_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let start;
            let end;
            if let Some(r) = range {
                sql.push_str(&format!(
                    " AND date(visited_at) BETWEEN ?{} AND ?{}",
                    p.len() + 1,
                    p.len() + 2
                ));
                start = r.start.to_string();
                end = r.end.to_string();
                p.push(&start);
                p.push(&end);
            }

            conn.query_row(&sql, p.as_slice(), |row| row.get(0)).map_err(Into::into)
        })
    }

    /// `(country, city, count)` rows sorted by count. Visits whose
    /// geolocation never resolved are excluded.
    pub fn location_stats(&self, memorial_id: i64) -> Result<Vec<(String, Option<String>, i64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT country, city, COUNT(*) AS n FROM visits
                 WHERE memorial_id = ?1 AND country IS NOT NULL
                 GROUP BY country, city
                 ORDER BY n DESC, country ASC",
            )?;
            let rows = stmt
                .query_map([memorial_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{open_test_db, seed_memorial, seed_user};
    use crate::DateRange;
    use chrono::Utc;

    /// Backdates a visit row; SQLite stores visited_at as text.
    fn backdate(db: &crate::Database, visit_id: i64, days_ago: i64) {
        db.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE visits SET visited_at = datetime('now', ?2 || ' days') WHERE id = ?1",
                rusqlite::params![visit_id, -days_ago],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn counts_and_windows() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        let today = db.insert_visit(memorial, Some("203.0.113.1"), Some("Mozilla/5.0"), None).unwrap();
        let two_days = db.insert_visit(memorial, None, None, None).unwrap();
        let old = db.insert_visit(memorial, None, None, None).unwrap();
        backdate(&db, two_days, 2);
        backdate(&db, old, 40);
        let _ = today;

        assert_eq!(db.visit_count(memorial, None).unwrap(), 3);
        assert_eq!(db.today_visit_count(memorial).unwrap(), 1);
        assert_eq!(db.week_visit_count(memorial).unwrap(), 2);
        assert_eq!(db.month_visit_count(memorial).unwrap(), 2);
        assert_eq!(db.total_visits_for(&[memorial], None).unwrap(), 3);
    }

    #[test]
    fn daily_stats_are_sparse_and_ordered() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        let a = db.insert_visit(memorial, None, None, None).unwrap();
        let b = db.insert_visit(memorial, None, None, None).unwrap();
        db.insert_visit(memorial, None, None, None).unwrap();
        backdate(&db, a, 2);
        backdate(&db, b, 2);

        let end = Utc::now().date_naive();
        let start = end - chrono::Duration::days(6);
        let stats = db.daily_visit_stats(memorial, DateRange { start, end }).unwrap();

        // Two distinct days with visits; gap days are simply absent.
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].1, 2);
        assert_eq!(stats[1].1, 1);
        assert!(stats[0].0 < stats[1].0);
    }

    #[test]
    fn location_stats_skip_unresolved() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        let v1 = db.insert_visit(memorial, Some("203.0.113.1"), None, None).unwrap();
        let v2 = db.insert_visit(memorial, Some("203.0.113.2"), None, None).unwrap();
        db.insert_visit(memorial, Some("127.0.0.1"), None, None).unwrap();

        db.set_visit_location(v1, Some("España"), Some("Madrid")).unwrap();
        db.set_visit_location(v2, Some("España"), Some("Madrid")).unwrap();

        let stats = db.location_stats(memorial).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0], ("España".to_string(), Some("Madrid".to_string()), 2));
    }
}

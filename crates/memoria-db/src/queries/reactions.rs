use crate::{Database, DateRange};
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Toggle a reaction: removes it if present, inserts it if not.
    /// Returns true when the reaction was added, false when removed.
    pub fn toggle_reaction(
        &self,
        memorial_id: i64,
        reaction_type: &str,
        visitor_id: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM reactions
                     WHERE memorial_id = ?1 AND reaction_type = ?2 AND visitor_id = ?3",
                    params![memorial_id, reaction_type, visitor_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                conn.execute("DELETE FROM reactions WHERE id = ?1", [id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO reactions (memorial_id, reaction_type, visitor_id) VALUES (?1, ?2, ?3)",
                    params![memorial_id, reaction_type, visitor_id],
                )?;
                Ok(true)
            }
        })
    }

    /// Sparse `(reaction_type, count)` rows for a memorial, optionally scoped
    /// to a day range.
    pub fn reaction_counts(
        &self,
        memorial_id: i64,
        range: Option<DateRange>,
    ) -> Result<Vec<(String, i64)>> {
        self.with_conn(|conn| {
            let rows = match range {
                Some(r) => {
                    let mut stmt = conn.prepare(
                        "SELECT reaction_type, COUNT(*) FROM reactions
                         WHERE memorial_id = ?1 AND date(created_at) BETWEEN ?2 AND ?3
                         GROUP BY reaction_type",
                    )?;
                    let mapped = stmt.query_map(
                        params![memorial_id, r.start.to_string(), r.end.to_string()],
                        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
                    )?;
                    mapped.collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT reaction_type, COUNT(*) FROM reactions
                         WHERE memorial_id = ?1 GROUP BY reaction_type",
                    )?;
                    let mapped = stmt.query_map([memorial_id], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })?;
                    mapped.collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    /// Reaction types a visitor currently holds on a memorial.
    pub fn visitor_reactions(&self, memorial_id: i64, visitor_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT reaction_type FROM reactions
                 WHERE memorial_id = ?1 AND visitor_id = ?2
                 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map(params![memorial_id, visitor_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Total reactions across a set of memorials (dashboard rollup).
    pub fn total_reactions_for(
        &self,
        memorial_ids: &[i64],
        range: Option<DateRange>,
    ) -> Result<i64> {
        if memorial_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=memorial_ids.len()).map(|i| format!("?{}", i)).collect();
            let mut sql = format!(
                "SELECT COUNT(*) FROM reactions WHERE memorial_id IN ({})",
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
                    " AND date(created_at) BETWEEN ?{} AND ?{}",
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
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{open_test_db, seed_memorial, seed_user};

    #[test]
    fn toggle_adds_then_removes() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        assert!(db.toggle_reaction(memorial, "candle", "visitor-1").unwrap());
        let counts = db.reaction_counts(memorial, None).unwrap();
        assert_eq!(counts, vec![("candle".to_string(), 1)]);
        assert_eq!(db.visitor_reactions(memorial, "visitor-1").unwrap(), ["candle"]);

        // Same visitor, same type: removed.
        assert!(!db.toggle_reaction(memorial, "candle", "visitor-1").unwrap());
        assert!(db.reaction_counts(memorial, None).unwrap().is_empty());
        assert!(db.visitor_reactions(memorial, "visitor-1").unwrap().is_empty());
    }

    #[test]
    fn one_visitor_many_types() {
        let (db, _dir) = open_test_db();
        let owner = seed_user(&db, "ana@example.com");
        let memorial = seed_memorial(&db, owner, "juan-a1b2c3d4", "Juan");

        db.toggle_reaction(memorial, "candle", "visitor-1").unwrap();
        db.toggle_reaction(memorial, "heart", "visitor-1").unwrap();
        db.toggle_reaction(memorial, "candle", "visitor-2").unwrap();

        let mut counts = db.reaction_counts(memorial, None).unwrap();
        counts.sort();
        assert_eq!(counts, vec![("candle".to_string(), 2), ("heart".to_string(), 1)]);
        assert_eq!(db.total_reactions_for(&[memorial], None).unwrap(), 3);
        assert_eq!(db.total_reactions_for(&[], None).unwrap(), 0);
    }
}

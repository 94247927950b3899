use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    /// Inserts a user and returns its id. Fails on duplicate email.
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, password) VALUES (?1, ?2)",
                (email, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                [email],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, email, password, is_active, created_at FROM users WHERE {}",
        predicate
    );
    let row = conn
        .query_row(&sql, [param], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                is_active: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::super::test_util::open_test_db;

    #[test]
    fn create_and_fetch_user() {
        let (db, _dir) = open_test_db();
        let id = db.create_user("ana@example.com", "hash").unwrap();

        let user = db.get_user_by_email("ana@example.com").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_active);

        assert!(db.get_user_by_id(id).unwrap().is_some());
        assert!(db.get_user_by_email("nadie@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let (db, _dir) = open_test_db();
        db.create_user("ana@example.com", "hash").unwrap();
        assert!(db.email_exists("ana@example.com").unwrap());
        assert!(db.create_user("ana@example.com", "hash2").is_err());
    }
}

mod condolences;
mod media;
mod memorials;
mod reactions;
mod timeline;
mod users;
mod visits;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::Database;
    use tempfile::TempDir;

    /// Fresh on-disk database in a temp dir. The dir must outlive the db.
    pub fn open_test_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::open(&dir.path().join("test.db")).expect("open db");
        (db, dir)
    }

    /// Registers a user and returns its id.
    pub fn seed_user(db: &Database, email: &str) -> i64 {
        db.create_user(email, "$argon2id$fake-hash").expect("create user")
    }

    /// Creates a memorial for `owner_id` and returns its id.
    pub fn seed_memorial(db: &Database, owner_id: i64, slug: &str, name: &str) -> i64 {
        db.create_memorial(owner_id, slug, name, None, None, None, None)
            .expect("create memorial")
            .id
    }
}

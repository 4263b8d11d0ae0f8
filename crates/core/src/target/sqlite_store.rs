//! SQLite-backed target store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{ClazzType, Target, TargetError, TargetStore};

/// SQLite-backed target store.
pub struct SqliteTargetStore {
    conn: Mutex<Connection>,
}

impl SqliteTargetStore {
    /// Create a new SQLite target store, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, TargetError> {
        let conn = Connection::open(path).map_err(|e| TargetError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite target store (useful for testing).
    pub fn in_memory() -> Result<Self, TargetError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TargetError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TargetError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS targets (
                id TEXT PRIMARY KEY,
                secret TEXT NOT NULL,
                name TEXT NOT NULL,
                teacher TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| TargetError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TargetError> {
        self.conn
            .lock()
            .map_err(|e| TargetError::Database(format!("connection lock poisoned: {}", e)))
    }

    fn row_to_target(row: &rusqlite::Row) -> rusqlite::Result<Target> {
        let category: String = row.get(4)?;
        Ok(Target {
            id: row.get(0)?,
            secret: row.get(1)?,
            name: row.get(2)?,
            teacher: row.get(3)?,
            category: ClazzType::from_code(&category),
        })
    }
}

impl TargetStore for SqliteTargetStore {
    fn list(&self) -> Result<Vec<Target>, TargetError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, secret, name, teacher, category FROM targets ORDER BY id")
            .map_err(|e| TargetError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_target)
            .map_err(|e| TargetError::Database(e.to_string()))?;
        let targets = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TargetError::Database(e.to_string()))?;
        Ok(targets)
    }

    fn get(&self, id: &str) -> Result<Option<Target>, TargetError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, secret, name, teacher, category FROM targets WHERE id = ?1",
            params![id],
            Self::row_to_target,
        )
        .optional()
        .map_err(|e| TargetError::Database(e.to_string()))
    }

    fn save(&self, target: &Target) -> Result<(), TargetError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO targets (id, secret, name, teacher, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                secret = excluded.secret,
                name = excluded.name,
                teacher = excluded.teacher,
                category = excluded.category
            "#,
            params![
                target.id,
                target.secret,
                target.name,
                target.teacher,
                target.category.code()
            ],
        )
        .map_err(|e| TargetError::Database(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), TargetError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM targets WHERE id = ?1", params![id])
            .map_err(|e| TargetError::Database(e.to_string()))?;
        if removed == 0 {
            return Err(TargetError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_list() {
        let store = SqliteTargetStore::in_memory().unwrap();
        store
            .save(&Target::new("2", "s2", "Chemistry", ClazzType::Minor).with_teacher("王五"))
            .unwrap();
        store
            .save(&Target::new("1", "s1", "Biology", ClazzType::InPlan))
            .unwrap();

        let targets = store.list().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, "1");
        assert_eq!(targets[1].teacher, "王五");
        assert_eq!(targets[1].category, ClazzType::Minor);
    }

    #[test]
    fn test_save_replaces_existing() {
        let store = SqliteTargetStore::in_memory().unwrap();
        store
            .save(&Target::new("1", "old", "Biology", ClazzType::InPlan))
            .unwrap();
        store
            .save(&Target::new("1", "new", "Biology", ClazzType::InPlan))
            .unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get("1").unwrap().unwrap().secret, "new");
    }

    #[test]
    fn test_remove() {
        let store = SqliteTargetStore::in_memory().unwrap();
        store
            .save(&Target::new("1", "s", "Biology", ClazzType::InPlan))
            .unwrap();

        store.remove("1").unwrap();
        assert!(store.get("1").unwrap().is_none());
        assert!(matches!(store.remove("1"), Err(TargetError::NotFound(_))));
    }

    #[test]
    fn test_unknown_category_survives() {
        let store = SqliteTargetStore::in_memory().unwrap();
        store
            .save(&Target::new("9", "s", "Special", ClazzType::from_code("ZZKC")))
            .unwrap();
        let target = store.get("9").unwrap().unwrap();
        assert_eq!(target.category.code(), "ZZKC");
    }

    #[test]
    fn test_persists_to_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("targets.db");
        {
            let store = SqliteTargetStore::new(&path).unwrap();
            store
                .save(&Target::new("1", "s", "Biology", ClazzType::InPlan))
                .unwrap();
        }
        let reopened = SqliteTargetStore::new(&path).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 1);
    }
}

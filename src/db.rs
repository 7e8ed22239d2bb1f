// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use memverse_core::ErrorReport;
use memverse_core::Fallible;
use memverse_core::StorageBackend;
use memverse_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

/// SQLite-backed key/value storage for a collection.
pub struct Database {
    conn: Connection,
}

fn db_error(e: rusqlite::Error) -> ErrorReport {
    ErrorReport::new(format!("Database error: {e}"))
}

impl Database {
    pub fn open(path: &Path) -> Fallible<Self> {
        log::debug!("Opening database at {}", path.display());
        let conn = Connection::open(path).map_err(db_error)?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.execute_batch(
            "create table if not exists entries (
                key text primary key,
                value text not null,
                updated_at text not null
            ) strict;",
        )
        .map_err(db_error)?;
        Ok(Self { conn })
    }

    /// Makes every write fail while `on` is set.
    #[cfg(test)]
    pub fn set_query_only(&mut self, on: bool) -> Fallible<()> {
        self.conn
            .pragma_update(None, "query_only", on)
            .map_err(db_error)
    }

    /// All keys, sorted.
    #[cfg(test)]
    pub fn keys(&self) -> Fallible<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("select key from entries order by key")
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }
}

impl StorageBackend for Database {
    fn read(&self, key: &str) -> Fallible<Option<String>> {
        self.conn
            .query_row(
                "select value from entries where key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(db_error)
    }

    fn write(&mut self, key: &str, value: &str) -> Fallible<()> {
        let updated_at = Timestamp::now().to_string();
        self.conn
            .execute(
                "insert into entries (key, value, updated_at) values (?1, ?2, ?3)
                 on conflict (key) do update set value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, updated_at],
            )
            .map_err(db_error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        self.conn
            .execute("delete from entries where key = ?1", params![key])
            .map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_read_missing() -> Fallible<()> {
        let db = Database::in_memory()?;
        assert_eq!(db.read("nothing")?, None);
        Ok(())
    }

    #[test]
    fn test_write_and_overwrite() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        db.write("k", "1")?;
        assert_eq!(db.read("k")?, Some("1".to_string()));
        db.write("k", "2")?;
        assert_eq!(db.read("k")?, Some("2".to_string()));
        assert_eq!(db.keys()?, vec!["k".to_string()]);
        Ok(())
    }

    #[test]
    fn test_remove() -> Fallible<()> {
        let mut db = Database::in_memory()?;
        db.write("k", "1")?;
        db.remove("k")?;
        assert_eq!(db.read("k")?, None);
        // Removing a missing key is not an error.
        db.remove("k")?;
        Ok(())
    }

    #[test]
    fn test_persists_across_connections() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("memverse.db");
        {
            let mut db = Database::open(&path)?;
            db.write("greeting", "\"peace\"")?;
        }
        let db = Database::open(&path)?;
        assert_eq!(db.read("greeting")?, Some("\"peace\"".to_string()));
        Ok(())
    }
}

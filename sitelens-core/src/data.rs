use crate::error::Result;
use crate::model::ReportDataset;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Name under which the active analysis is stored. Each full run replaces
/// it wholesale.
pub const DEFAULT_DATASET: &str = "latest";

pub struct Database {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

impl Database {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Analysis datasets, one JSON document per named record.
            -- Writes replace the whole document; there are no
            -- partial-field updates.
            CREATE TABLE IF NOT EXISTS datasets (
                name TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                base_url TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Whole-document replace-on-write.
    pub fn save_dataset(&self, name: &str, dataset: &ReportDataset) -> Result<()> {
        let document = serde_json::to_string(dataset)?;
        self.conn.execute(
            "INSERT INTO datasets (name, document, base_url, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET
                 document = excluded.document,
                 base_url = excluded.base_url,
                 updated_at = excluded.updated_at",
            params![name, &document, &dataset.base_url, current_timestamp()],
        )?;
        Ok(())
    }

    pub fn load_dataset(&self, name: &str) -> Result<Option<ReportDataset>> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM datasets WHERE name = ?1")?;

        let document: Option<String> = stmt
            .query_row(params![name], |row| row.get(0))
            .optional()?;

        match document {
            Some(document) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    pub fn list_datasets(&self) -> Result<Vec<(String, String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, base_url, updated_at FROM datasets ORDER BY updated_at DESC")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

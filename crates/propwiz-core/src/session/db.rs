//! SQLite access for the session pointer.

use std::path::Path;

use jiff::Timestamp;
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::StoredSession;
use crate::{
    error::{DatabaseResultExt, Result},
    models::DraftId,
};

const SELECT_POINTER_SQL: &str =
    "SELECT draft_id, active_step, updated_at FROM session_pointer WHERE slot = 0";
const UPSERT_POINTER_SQL: &str = "INSERT INTO session_pointer (slot, draft_id, active_step, updated_at) VALUES (0, ?1, 0, ?2)
     ON CONFLICT(slot) DO UPDATE SET
         active_step = CASE WHEN draft_id = excluded.draft_id THEN active_step ELSE 0 END,
         draft_id = excluded.draft_id,
         updated_at = excluded.updated_at";
const UPDATE_STEP_SQL: &str =
    "UPDATE session_pointer SET active_step = ?1, updated_at = ?2 WHERE slot = 0";
const DELETE_POINTER_SQL: &str = "DELETE FROM session_pointer WHERE slot = 0";

/// Connection to the session database.
pub(crate) struct SessionDatabase {
    connection: Connection,
}

impl SessionDatabase {
    /// Opens the database file and makes sure the schema exists.
    pub(crate) fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open session database")?;
        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    fn initialize_schema(&self) -> Result<()> {
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize session schema")?;
        self.apply_migrations()
    }

    /// Early session files stored only the draft id.
    fn apply_migrations(&self) -> Result<()> {
        let has_step_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('session_pointer') WHERE name = 'active_step'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .db_context("Failed to inspect session schema")?;

        if !has_step_column {
            self.connection
                .execute(
                    "ALTER TABLE session_pointer ADD COLUMN active_step INTEGER NOT NULL DEFAULT 0",
                    [],
                )
                .db_context("Failed to add active_step column to session_pointer")?;
        }
        Ok(())
    }

    pub(crate) fn load(&self) -> Result<Option<StoredSession>> {
        self.connection
            .query_row(SELECT_POINTER_SQL, [], |row| {
                let raw_id: String = row.get(0)?;
                let draft_id = DraftId::new(raw_id.as_str()).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        Box::new(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            e.to_string(),
                        )),
                    )
                })?;
                Ok(StoredSession {
                    draft_id,
                    active_step: row.get::<_, i64>(1)?.max(0) as usize,
                    updated_at: row.get::<_, String>(2)?.parse::<Timestamp>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?,
                })
            })
            .optional()
            .db_context("Failed to query session pointer")
    }

    /// Points the session at `draft_id`, replacing any previous pointer.
    /// The recorded step is kept only when the draft is the same.
    pub(crate) fn promote(&self, draft_id: &DraftId) -> Result<()> {
        let now = Timestamp::now().to_string();
        self.connection
            .execute(UPSERT_POINTER_SQL, params![draft_id.as_str(), &now])
            .db_context("Failed to store session pointer")?;
        Ok(())
    }

    /// Returns false when there is no pointer to update.
    pub(crate) fn record_step(&self, active_step: usize) -> Result<bool> {
        let now = Timestamp::now().to_string();
        let changed = self
            .connection
            .execute(UPDATE_STEP_SQL, params![active_step as i64, &now])
            .db_context("Failed to record active step")?;
        Ok(changed > 0)
    }

    /// Returns false when there was no pointer.
    pub(crate) fn clear(&self) -> Result<bool> {
        let removed = self
            .connection
            .execute(DELETE_POINTER_SQL, [])
            .db_context("Failed to clear session pointer")?;
        Ok(removed > 0)
    }
}

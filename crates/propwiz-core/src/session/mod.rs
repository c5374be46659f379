//! Session state: the draft a wizard is bound to, and the durable pointer to
//! the one unfinished draft this client is working on.
//!
//! [`WizardSession`] is the in-memory value the orchestrator hands to every
//! section operation. [`SessionStore`] persists the pointer in SQLite so an
//! interrupted wizard can be resumed; it keeps only the database path and
//! opens a connection per operation on the blocking pool.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::Serialize;
use tokio::task;

use crate::{
    error::{Result, WizardError},
    models::DraftId,
};

mod db;

use db::SessionDatabase;

/// The aggregate a wizard is bound to. Once set, the id never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WizardSession {
    draft_id: Option<DraftId>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session resuming an existing draft.
    pub fn resuming(draft_id: DraftId) -> Self {
        Self {
            draft_id: Some(draft_id),
        }
    }

    pub fn draft_id(&self) -> Option<&DraftId> {
        self.draft_id.as_ref()
    }

    /// Binds the session to `draft_id`.
    ///
    /// Returns true when this call assigned the id, false when the session
    /// was already bound to it.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` when the session is already bound
    /// to a different draft.
    pub fn adopt(&mut self, draft_id: &DraftId) -> Result<bool> {
        match &self.draft_id {
            None => {
                self.draft_id = Some(draft_id.clone());
                Ok(true)
            }
            Some(current) if current == draft_id => Ok(false),
            Some(current) => Err(WizardError::invalid_input("draft_id").with_reason(format!(
                "session is bound to draft {current}, refusing to switch to {draft_id}"
            ))),
        }
    }
}

/// The persisted pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSession {
    pub draft_id: DraftId,
    pub active_step: usize,
    pub updated_at: Timestamp,
}

/// Durable "one active unfinished draft at a time" pointer.
#[derive(Debug, Clone)]
pub struct SessionStore {
    db_path: PathBuf,
}

impl SessionStore {
    /// Opens (creating if needed) the session database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::FileSystem` if the parent directory cannot be
    /// created, `WizardError::Database` if the schema cannot be initialized.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WizardError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let store = Self { db_path };
        store.with_db(|_| Ok(())).await?;
        Ok(store)
    }

    /// `$XDG_DATA_HOME/propwiz/session.db`.
    pub fn default_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("propwiz")
            .place_data_file("session.db")
            .map_err(|e| WizardError::XdgDirectory(e.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn with_db<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SessionDatabase) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let db = SessionDatabase::new(&db_path)?;
            operation(&db)
        })
        .await
        .map_err(|e| WizardError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    pub async fn load(&self) -> Result<Option<StoredSession>> {
        self.with_db(|db| db.load()).await
    }

    /// Makes `draft_id` the active unfinished draft.
    pub async fn promote(&self, draft_id: &DraftId) -> Result<()> {
        let draft_id = draft_id.clone();
        self.with_db(move |db| db.promote(&draft_id)).await
    }

    /// Remembers the active step. Returns false when no draft is stored.
    pub async fn record_step(&self, active_step: usize) -> Result<bool> {
        self.with_db(move |db| db.record_step(active_step)).await
    }

    /// Forgets the pointer. Returns false when none was stored.
    pub async fn clear(&self) -> Result<bool> {
        self.with_db(|db| db.clear()).await
    }
}

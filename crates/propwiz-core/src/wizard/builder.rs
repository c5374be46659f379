//! Builder for creating and configuring Wizard instances.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::info;

use super::Wizard;
use crate::{
    error::{Result, WizardError},
    gateway::{HttpGateway, PersistenceGateway},
    models::DraftId,
    session::{SessionStore, WizardSession},
};

/// Builder for creating and configuring Wizard instances.
#[derive(Clone)]
pub struct WizardBuilder {
    api_base_url: Option<String>,
    api_token: Option<String>,
    gateway: Option<Arc<dyn PersistenceGateway>>,
    session_path: Option<PathBuf>,
    use_session_store: bool,
    resume: Option<DraftId>,
}

impl fmt::Debug for WizardBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardBuilder")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("gateway", &self.gateway.as_ref().map(|_| "<custom>"))
            .field("session_path", &self.session_path)
            .field("use_session_store", &self.use_session_store)
            .field("resume", &self.resume)
            .finish()
    }
}

impl WizardBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            gateway: None,
            session_path: None,
            use_session_store: true,
            resume: None,
        }
    }

    /// Sets the root URL of the listings API.
    pub fn with_api_base_url<S: Into<String>>(mut self, url: Option<S>) -> Self {
        if let Some(url) = url {
            self.api_base_url = Some(url.into());
        }
        self
    }

    /// Sets the bearer token sent with every API request.
    pub fn with_api_token<S: Into<String>>(mut self, token: Option<S>) -> Self {
        if let Some(token) = token {
            self.api_token = Some(token.into());
        }
        self
    }

    /// Uses `gateway` instead of the HTTP gateway.
    pub fn with_gateway(mut self, gateway: Arc<dyn PersistenceGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Sets a custom session database path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/propwiz/session.db` or `~/.local/share/propwiz/session.db`
    pub fn with_session_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.session_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Keeps the session in memory only; nothing is resumed or remembered.
    pub fn without_session_store(mut self) -> Self {
        self.use_session_store = false;
        self
    }

    /// Resumes `draft_id` instead of whatever the session store points at.
    pub fn resume(mut self, draft_id: DraftId) -> Self {
        self.resume = Some(draft_id);
        self
    }

    /// Builds the configured wizard.
    ///
    /// The wizard is bound to a draft when one is being resumed, but its
    /// sections stay empty until [`Wizard::fetch_aggregate`] is called.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Configuration` if neither a gateway nor an API
    /// base URL was given, or the URL is invalid.
    /// Returns `WizardError::FileSystem` or `WizardError::Database` if the
    /// session database cannot be opened.
    pub async fn build(self) -> Result<Wizard> {
        let gateway: Arc<dyn PersistenceGateway> = match (self.gateway, self.api_base_url) {
            (Some(gateway), _) => gateway,
            (None, Some(url)) => Arc::new(HttpGateway::new(&url, self.api_token)?),
            (None, None) => {
                return Err(WizardError::Configuration {
                    message: "no API base URL configured".to_string(),
                })
            }
        };

        let store = if self.use_session_store {
            let path = match self.session_path {
                Some(path) => path,
                None => SessionStore::default_path()?,
            };
            Some(SessionStore::open(path).await?)
        } else {
            None
        };

        let (session, resume_step) = match (self.resume, &store) {
            (Some(draft_id), Some(store)) => {
                let stored = store.load().await?;
                store.promote(&draft_id).await?;
                let step = stored
                    .filter(|stored| stored.draft_id == draft_id)
                    .map(|stored| stored.active_step);
                (WizardSession::resuming(draft_id), step)
            }
            (Some(draft_id), None) => (WizardSession::resuming(draft_id), None),
            (None, Some(store)) => match store.load().await? {
                Some(stored) => (
                    WizardSession::resuming(stored.draft_id),
                    Some(stored.active_step),
                ),
                None => (WizardSession::new(), None),
            },
            (None, None) => (WizardSession::new(), None),
        };

        match session.draft_id() {
            Some(id) => info!("Resuming property draft {id}"),
            None => info!("Starting a new property listing"),
        }

        Ok(Wizard::new(gateway, store, session, resume_step))
    }
}

impl Default for WizardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

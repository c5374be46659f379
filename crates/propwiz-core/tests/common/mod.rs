use std::{path::PathBuf, sync::Arc};

use propwiz_core::{gateway::MemoryGateway, Wizard, WizardBuilder};
use tempfile::TempDir;

/// A wizard over an in-memory gateway with its session file in a temp dir.
pub async fn create_test_wizard() -> (TempDir, Arc<MemoryGateway>, Wizard) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let gateway = Arc::new(MemoryGateway::new());
    let wizard = reopen_wizard(&session_path(&temp_dir), &gateway).await;
    (temp_dir, gateway, wizard)
}

/// A new wizard against the same session file, as after a restart.
pub async fn reopen_wizard(session_path: &PathBuf, gateway: &Arc<MemoryGateway>) -> Wizard {
    WizardBuilder::new()
        .with_gateway(gateway.clone())
        .with_session_path(Some(session_path))
        .build()
        .await
        .expect("Failed to create wizard")
}

pub fn session_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("propwiz").join("session.db")
}

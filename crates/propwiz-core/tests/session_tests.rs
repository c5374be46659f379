mod common;

use std::sync::Arc;

use propwiz_core::{
    gateway::MemoryGateway, DraftId, SectionKind, SessionStore, WizardBuilder, WizardError,
};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_store_creates_its_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = common::session_path(&temp_dir);

    let store = SessionStore::open(&path).await.unwrap();
    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_explicit_resume_replaces_the_stored_pointer() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = common::session_path(&temp_dir);
    let gateway = Arc::new(MemoryGateway::new());
    let stored = SessionStore::open(&path).await.unwrap();
    stored.promote(&DraftId::new("draft-old").unwrap()).await.unwrap();

    let draft_id = gateway
        .insert_aggregate(json!({
            "_id": "draft-new",
            "general_details": { "building_name": "The Mill", "property_type": "Office" }
        }))
        .await
        .unwrap();
    let mut wizard = WizardBuilder::new()
        .with_gateway(gateway.clone())
        .with_session_path(Some(&path))
        .resume(draft_id.clone())
        .build()
        .await
        .unwrap();
    wizard.fetch_aggregate().await.unwrap();

    assert_eq!(wizard.draft_id(), Some(&draft_id));
    assert_eq!(wizard.steps().active(), 1);
    let pointer = stored.load().await.unwrap().unwrap();
    assert_eq!(pointer.draft_id, draft_id);
    assert_eq!(pointer.active_step, 1);
}

#[tokio::test]
async fn test_resuming_a_missing_draft_reports_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = WizardBuilder::new()
        .with_gateway(gateway)
        .with_session_path(Some(common::session_path(&temp_dir)))
        .resume(DraftId::new("draft-gone").unwrap())
        .build()
        .await
        .unwrap();

    let err = wizard.fetch_aggregate().await.unwrap_err();
    assert!(matches!(err, WizardError::DraftNotFound { .. }));
}

#[tokio::test]
async fn test_builder_needs_a_gateway_or_url() {
    let err = WizardBuilder::new()
        .without_session_store()
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::Configuration { .. }));

    let err = WizardBuilder::new()
        .with_api_base_url(Some("not a url"))
        .without_session_store()
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::Configuration { .. }));
}

#[tokio::test]
async fn test_pointer_tracks_the_wizard_across_a_restart() {
    let (temp_dir, gateway, mut wizard) = common::create_test_wizard().await;
    let store = wizard.session_store().cloned().expect("session store is on by default");
    assert_eq!(store.load().await.unwrap(), None);

    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    let draft_id = wizard.draft_id().cloned().unwrap();

    let pointer = store.load().await.unwrap().unwrap();
    assert_eq!(pointer.draft_id, draft_id);
    assert_eq!(pointer.active_step, 1);

    let reopened = common::reopen_wizard(&common::session_path(&temp_dir), &gateway).await;
    assert_eq!(reopened.draft_id(), Some(&draft_id));
    assert_eq!(
        reopened.session_store().map(|store| store.path()),
        Some(store.path())
    );
}

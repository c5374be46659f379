//! Tests for the wizard module.

use serde_json::json;

use super::*;
use crate::gateway::{GatewayCall, MemoryGateway};

async fn create_test_wizard() -> (Arc<MemoryGateway>, Wizard) {
    let gateway = Arc::new(MemoryGateway::new());
    let wizard = WizardBuilder::new()
        .with_gateway(gateway.clone())
        .without_session_store()
        .build()
        .await
        .expect("Failed to build wizard");
    (gateway, wizard)
}

async fn resume_test_wizard(gateway: &Arc<MemoryGateway>, aggregate: Value) -> Wizard {
    let draft_id = gateway
        .insert_aggregate(aggregate)
        .await
        .expect("Failed to seed aggregate");
    WizardBuilder::new()
        .with_gateway(gateway.clone())
        .without_session_store()
        .resume(draft_id)
        .build()
        .await
        .expect("Failed to build wizard")
}

fn fill_general(wizard: &mut Wizard) {
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
}

#[tokio::test]
async fn test_dependent_section_needs_a_draft() {
    let (gateway, mut wizard) = create_test_wizard().await;

    let err = wizard.begin_save(SectionKind::Location).unwrap_err();
    assert!(matches!(
        err,
        WizardError::Precondition {
            section: SectionKind::Location,
            ..
        }
    ));
    let banner = wizard.section(SectionKind::Location).banner().unwrap();
    assert!(banner.contains("General Details"));
    assert!(!wizard.section(SectionKind::Location).is_saving());
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn test_blank_required_fields_are_flagged_without_a_request() {
    let (gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();

    let err = wizard.save_section(SectionKind::GeneralDetails).await.unwrap_err();
    assert!(err.is_field_level());

    let section = wizard.section(SectionKind::GeneralDetails);
    assert_eq!(
        section.errors().get("property_type"),
        Some("Property type is required")
    );
    assert_eq!(section.banner(), None);
    assert!(gateway.calls().await.is_empty());

    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    assert!(wizard.section(SectionKind::GeneralDetails).errors().is_empty());
}

#[tokio::test]
async fn test_second_save_while_pending_is_refused() {
    let (_gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);

    let pending = wizard.begin_save(SectionKind::GeneralDetails).unwrap();
    assert!(pending.is_create());
    assert!(wizard.section(SectionKind::GeneralDetails).is_saving());

    let err = wizard.begin_save(SectionKind::GeneralDetails).unwrap_err();
    assert!(matches!(err, WizardError::SaveInFlight { .. }));
}

#[tokio::test]
async fn test_inline_sections_of_a_bound_draft_are_updated() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(&gateway, json!({ "_id": "draft-42" })).await;
    wizard
        .replace(SectionKind::PropertyDetails, json!({ "epc": { "rating": "B" } }))
        .unwrap();
    fill_general(&mut wizard);

    for kind in [SectionKind::GeneralDetails, SectionKind::PropertyDetails] {
        let pending = wizard.begin_save(kind).unwrap();
        match pending.mode() {
            SaveMode::Update { draft, sub_id } => {
                assert_eq!(draft.as_str(), "draft-42");
                assert_eq!(sub_id.as_str(), "draft-42");
            }
            other => panic!("Expected an update of {kind}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_first_save_mints_the_draft_and_advances() {
    let (gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);

    let receipt = wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    assert!(receipt.created);
    assert!(receipt.refreshed);
    assert_eq!(receipt.navigation, Some(Navigation::Moved { from: 0, to: 1 }));
    assert_eq!(wizard.draft_id(), Some(&receipt.draft_id));
    assert_eq!(wizard.draft().id.as_ref(), Some(&receipt.draft_id));
    assert_eq!(wizard.steps().completed().collect::<Vec<_>>(), vec![0]);
    assert_eq!(wizard.steps().active(), 1);

    let section = wizard.section(SectionKind::GeneralDetails);
    assert!(section.has_existing_data());
    assert!(!section.has_changes());

    let calls = gateway.calls().await;
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_create());
    assert!(calls[1].is_fetch());
}

#[tokio::test]
async fn test_edits_during_a_save_stay_dirty() {
    let (gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);

    let pending = wizard.begin_save(SectionKind::GeneralDetails).unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 5"))
        .unwrap();

    let result = gateway
        .create_section(SectionKind::GeneralDetails, None, pending.payload())
        .await;
    wizard.complete_save(pending, result).await.unwrap();

    let section = wizard.section(SectionKind::GeneralDetails);
    assert_eq!(section.original()["building_name"], json!("Unit 4"));
    assert_eq!(section.working()["building_name"], json!("Unit 5"));
    assert!(section.has_changes());
}

#[tokio::test]
async fn test_late_response_updates_the_owning_section_only() {
    let (gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    wizard
        .push_item(
            SectionKind::BusinessDetails,
            "sale_types",
            json!({ "sale_type": "Freehold", "price_value": "250000" }),
        )
        .unwrap();
    let pending = wizard.begin_save(SectionKind::BusinessDetails).unwrap();

    assert_eq!(
        wizard.select_step(0).await.unwrap(),
        Navigation::Moved { from: 1, to: 0 }
    );

    let draft = wizard.draft_id().cloned();
    let result = gateway
        .create_section(SectionKind::BusinessDetails, draft.as_ref(), pending.payload())
        .await;
    let receipt = wizard.complete_save(pending, result).await.unwrap();

    assert_eq!(receipt.navigation, None);
    assert_eq!(wizard.steps().active(), 0);
    assert!(wizard.steps().is_submitted(1));
    assert!(wizard.section(SectionKind::BusinessDetails).has_existing_data());
    assert!(!wizard.section(SectionKind::BusinessDetails).is_saving());
}

#[tokio::test]
async fn test_failed_save_keeps_the_working_copy() {
    let (gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);
    gateway
        .fail_next_save(
            SectionKind::GeneralDetails,
            422,
            json!({ "errors": [
                { "path": "building_name", "msg": "Name already in use" },
                { "msg": "Please review the highlighted fields" }
            ] }),
        )
        .await;

    let err = wizard.save_section(SectionKind::GeneralDetails).await.unwrap_err();
    assert!(err.is_field_level());

    let section = wizard.section(SectionKind::GeneralDetails);
    assert_eq!(section.errors().get("building_name"), Some("Name already in use"));
    assert_eq!(section.banner(), Some("Please review the highlighted fields"));
    assert_eq!(section.working()["building_name"], json!("Unit 4"));
    assert!(!section.is_saving());
    assert_eq!(wizard.draft_id(), None);
    assert_eq!(wizard.steps().completed_count(), 0);

    let receipt = wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    assert!(receipt.created);
    assert!(wizard.section(SectionKind::GeneralDetails).errors().is_empty());
    assert_eq!(wizard.section(SectionKind::GeneralDetails).banner(), None);
}

#[tokio::test]
async fn test_failed_refresh_does_not_fail_the_save() {
    let (gateway, mut wizard) = create_test_wizard().await;
    fill_general(&mut wizard);
    gateway
        .fail_next_fetch(503, json!({ "message": "Service unavailable" }))
        .await;

    let receipt = wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    assert!(!receipt.refreshed);
    assert_eq!(wizard.steps().active(), 1);
}

#[tokio::test]
async fn test_resume_seeds_steps_from_the_aggregate() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(
        &gateway,
        json!({
            "_id": "draft-42",
            "general_details": { "building_name": "The Mill", "property_type": "Office" },
            "business_details": {
                "_id": "biz-1",
                "sale_types": [{ "sale_type": "Freehold", "price_value": 250000 }]
            },
            "location": {
                "_id": "loc-1",
                "coordinates": { "latitude": 53.48, "longitude": -2.24 },
                "address_details": { "postcode": "M1 1AA" }
            }
        }),
    )
    .await;

    wizard.fetch_aggregate().await.unwrap();

    assert_eq!(wizard.steps().completed().collect::<Vec<_>>(), vec![0, 1, 3]);
    assert_eq!(wizard.steps().active(), 2);
    assert_eq!(
        wizard.section(SectionKind::Location).sub_id().map(SubResourceId::as_str),
        Some("loc-1")
    );
    assert_eq!(
        wizard.section(SectionKind::GeneralDetails).working()["building_name"],
        json!("The Mill")
    );
    assert!(!wizard.section(SectionKind::BusinessDetails).has_changes());
}

#[tokio::test]
async fn test_repeated_refresh_leaves_working_copies_alone() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(
        &gateway,
        json!({
            "_id": "draft-42",
            "general_details": { "building_name": "The Mill", "property_type": "Office" }
        }),
    )
    .await;
    wizard.fetch_aggregate().await.unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "summary", json!("Corner plot"))
        .unwrap();
    let before = wizard.section(SectionKind::GeneralDetails).working().clone();

    let id = wizard.draft_id().cloned().unwrap();
    gateway
        .overwrite_slice(
            &id,
            SectionKind::GeneralDetails,
            json!({ "building_name": "Changed elsewhere", "property_type": "Retail" }),
        )
        .await
        .unwrap();
    wizard.fetch_aggregate().await.unwrap();
    wizard.fetch_aggregate().await.unwrap();

    assert_eq!(wizard.section(SectionKind::GeneralDetails).working(), &before);
}

#[tokio::test]
async fn test_edits_made_while_the_first_fetch_is_in_flight_survive() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(
        &gateway,
        json!({
            "_id": "draft-42",
            "general_details": { "building_name": "The Mill", "property_type": "Office" }
        }),
    )
    .await;

    let ticket = wizard.begin_fetch().unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("The Old Mill"))
        .unwrap();
    let draft = gateway.fetch_draft(ticket.draft_id()).await.unwrap();
    wizard.apply_fetch(ticket, draft).unwrap();

    let section = wizard.section(SectionKind::GeneralDetails);
    assert_eq!(section.working()["building_name"], json!("The Old Mill"));
    assert_eq!(section.original()["building_name"], json!("The Mill"));
    assert!(section.has_existing_data());
    assert_eq!(section.first_change().as_deref(), Some("building_name"));
}

#[tokio::test]
async fn test_fetch_for_another_draft_is_rejected() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(&gateway, json!({ "_id": "draft-1" })).await;
    gateway.insert_aggregate(json!({ "_id": "draft-2" })).await.unwrap();

    let ticket = wizard.begin_fetch().unwrap();
    let other = gateway
        .fetch_draft(&DraftId::new("draft-2").unwrap())
        .await
        .unwrap();
    assert!(wizard.apply_fetch(ticket, other).is_err());
    assert_eq!(wizard.draft_id().map(DraftId::as_str), Some("draft-1"));
}

#[tokio::test]
async fn test_fetch_without_a_draft_is_invalid() {
    let (_gateway, mut wizard) = create_test_wizard().await;
    let err = wizard.fetch_aggregate().await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_collect_edits_reports_each_section_once() {
    let (_gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("U"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::Features, "feature_notes", json!("Lift access"))
        .unwrap();

    assert_eq!(
        wizard.collect_edits(),
        vec![SectionKind::GeneralDetails, SectionKind::Features]
    );
    assert_eq!(
        wizard.live(SectionKind::GeneralDetails)["building_name"],
        json!("Unit 4")
    );
    assert!(wizard.collect_edits().is_empty());
}

#[tokio::test]
async fn test_next_requires_a_saved_step() {
    let (_gateway, mut wizard) = create_test_wizard().await;
    assert!(wizard.next().await.unwrap().is_blocked());

    fill_general(&mut wizard);
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    wizard.select_step(0).await.unwrap();
    assert_eq!(
        wizard.next().await.unwrap(),
        Navigation::Moved { from: 0, to: 1 }
    );
}

#[tokio::test]
async fn test_saving_the_last_step_finalizes() {
    let gateway = Arc::new(MemoryGateway::new());
    let mut wizard = resume_test_wizard(
        &gateway,
        json!({
            "_id": "draft-42",
            "general_details": { "building_name": "The Mill", "property_type": "Office" },
            "business_details": { "_id": "biz-1", "sale_types": [{ "sale_type": "Freehold", "price_value": 1 }] },
            "property_details": { "epc": { "rating": "B" } },
            "location": {
                "_id": "loc-1",
                "coordinates": { "latitude": 53.48, "longitude": -2.24 },
                "address_details": { "postcode": "M1 1AA" }
            },
            "virtual_tours": { "_id": "vt-1", "virtual_tours": [{ "url": "https://tours.example/1" }] },
            "features": { "_id": "ft-1", "features": ["Parking"] },
            "images": [{ "_id": "img-1", "file_name": "front.jpg" }]
        }),
    )
    .await;
    wizard.fetch_aggregate().await.unwrap();
    assert_eq!(wizard.active_section(), SectionKind::Documents);
    assert!(wizard.active_view().action_label() == "Save");

    wizard
        .push_item(
            SectionKind::Documents,
            "documents",
            json!({ "document_type": "EPC", "file_name": "epc.pdf" }),
        )
        .unwrap();
    let receipt = wizard.save_section(SectionKind::Documents).await.unwrap();

    assert!(receipt.finalized);
    assert!(wizard.is_finalized());
    assert!(wizard.overview().finalized);
    assert!(matches!(
        wizard.edit(SectionKind::Documents, "documents", json!([])),
        Err(WizardError::Finalized { .. })
    ));
    assert!(matches!(
        wizard.select_step(0).await,
        Err(WizardError::Finalized { .. })
    ));
    assert!(matches!(
        wizard.begin_save(SectionKind::GeneralDetails),
        Err(WizardError::Finalized { .. })
    ));
    assert!(!gateway.calls().await.last().is_some_and(GatewayCall::is_fetch));
}

mod common;

use std::sync::Arc;

use common::{create_test_wizard, reopen_wizard, session_path};
use propwiz_core::{
    gateway::{GatewayCall, MemoryGateway},
    Navigation, SectionKind, StepStatus, WizardBuilder, WizardError,
};
use serde_json::json;

#[tokio::test]
async fn test_listing_walkthrough() {
    let (_temp_dir, gateway, mut wizard) = create_test_wizard().await;

    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "size_sq_ft", json!("1200"))
        .unwrap();
    let receipt = wizard
        .save_section(SectionKind::GeneralDetails)
        .await
        .expect("General details should save");

    assert!(receipt.created);
    assert!(wizard.draft_id().is_some());
    assert_eq!(wizard.steps().completed().collect::<Vec<_>>(), vec![0]);
    assert_eq!(wizard.steps().active(), 1);

    wizard
        .push_item(
            SectionKind::BusinessDetails,
            "sale_types",
            json!({ "sale_type": "Freehold", "price_value": 250000 }),
        )
        .unwrap();
    wizard
        .save_section(SectionKind::BusinessDetails)
        .await
        .expect("Business details should save");

    assert_eq!(wizard.steps().completed().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(wizard.steps().active(), 2);

    let jump = wizard.select_step(7).await.unwrap();
    assert!(jump.is_blocked());
    assert_eq!(wizard.steps().active(), 2);

    let overview = wizard.overview();
    assert_eq!(overview.completed_count(), 2);
    assert_eq!(overview.rows[2].status, StepStatus::Active);
    assert!(overview.to_string().contains("(2/8)"));

    let saves: Vec<GatewayCall> = gateway
        .calls()
        .await
        .into_iter()
        .filter(|call| !call.is_fetch())
        .collect();
    assert_eq!(saves.len(), 2);
    assert!(saves.iter().all(GatewayCall::is_create));
}

#[tokio::test]
async fn test_unchanged_update_is_refused_until_edited() {
    let (_temp_dir, gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    let err = wizard
        .save_section(SectionKind::GeneralDetails)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::NoChanges {
            section: SectionKind::GeneralDetails
        }
    ));

    // Cosmetic differences do not count as changes
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("  Unit 4 "))
        .unwrap();
    assert!(wizard
        .save_section(SectionKind::GeneralDetails)
        .await
        .is_err());

    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4B"))
        .unwrap();
    let receipt = wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    assert!(!receipt.created);

    let saves = gateway.saves_of(SectionKind::GeneralDetails).await;
    assert_eq!(saves.len(), 2);
    assert!(saves[0].is_create());
    assert!(saves[1].is_update());
}

#[tokio::test]
async fn test_existing_section_never_creates_again() {
    let (_temp_dir, gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    for postcode in ["M1 1AA", "M1 2BB"] {
        wizard
            .replace(
                SectionKind::Location,
                json!({
                    "coordinates": { "latitude": 53.48, "longitude": -2.24 },
                    "address_details": { "postcode": postcode }
                }),
            )
            .unwrap();
        wizard.save_section(SectionKind::Location).await.unwrap();
    }

    let saves = gateway.saves_of(SectionKind::Location).await;
    assert_eq!(saves.len(), 2);
    assert!(saves[0].is_create());
    match &saves[1] {
        GatewayCall::Update { sub_id, .. } => {
            assert_eq!(
                Some(sub_id),
                wizard.section(SectionKind::Location).sub_id()
            );
        }
        other => panic!("Expected an update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resumed_general_details_update_the_same_draft() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let gateway = Arc::new(MemoryGateway::new());
    let draft_id = gateway
        .insert_aggregate(json!({
            "_id": "draft-1",
            "general_details": { "building_name": "The Mill", "property_type": "Office" }
        }))
        .await
        .unwrap();
    let mut wizard = WizardBuilder::new()
        .with_gateway(gateway.clone())
        .with_session_path(Some(session_path(&temp_dir)))
        .resume(draft_id.clone())
        .build()
        .await
        .unwrap();

    // Saved before the aggregate was ever fetched
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("The Old Mill"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    let receipt = wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    assert!(!receipt.created);
    assert_eq!(receipt.draft_id, draft_id);
    assert_eq!(wizard.draft_id(), Some(&draft_id));

    let saves = gateway.saves_of(SectionKind::GeneralDetails).await;
    assert_eq!(saves.len(), 1);
    match &saves[0] {
        GatewayCall::Update { draft, sub_id, .. } => {
            assert_eq!(draft, &draft_id);
            assert_eq!(sub_id.as_str(), draft_id.as_str());
        }
        other => panic!("Expected an update, got {other:?}"),
    }

    let stored = gateway.aggregate(&draft_id).await.unwrap();
    assert_eq!(stored["general_details"]["building_name"], json!("The Old Mill"));
}

#[tokio::test]
async fn test_server_field_errors_are_shown_on_the_section() {
    let (_temp_dir, gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();

    wizard
        .push_item(
            SectionKind::BusinessDetails,
            "sale_types",
            json!({ "sale_type": "Freehold", "price_value": "250000" }),
        )
        .unwrap();
    wizard
        .push_item(
            SectionKind::BusinessDetails,
            "sale_types",
            json!({ "sale_type": "Leasehold", "price_value": "-1" }),
        )
        .unwrap();
    gateway
        .fail_next_save(
            SectionKind::BusinessDetails,
            422,
            json!({ "errors": [{ "path": "sale_types[1].price_value", "msg": "Price must be positive" }] }),
        )
        .await;

    assert!(wizard
        .save_section(SectionKind::BusinessDetails)
        .await
        .is_err());

    let view = wizard.section_view(SectionKind::BusinessDetails);
    assert_eq!(
        view.errors.get("sale_types.1.price_value"),
        Some("Price must be positive")
    );
    assert_eq!(
        view.errors.get("sale_types[1].price_value"),
        Some("Price must be positive")
    );
    assert!(view.to_string().contains("Price must be positive"));
    assert!(!wizard.steps().is_completed(1));
    assert_eq!(wizard.steps().active(), 1);

    wizard
        .edit(
            SectionKind::BusinessDetails,
            "sale_types[1].price_value",
            json!("1200"),
        )
        .unwrap();
    assert!(wizard
        .section(SectionKind::BusinessDetails)
        .errors()
        .is_empty());
}

#[tokio::test]
async fn test_session_survives_a_restart() {
    let (temp_dir, gateway, mut wizard) = create_test_wizard().await;
    wizard
        .edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))
        .unwrap();
    wizard
        .edit(SectionKind::GeneralDetails, "property_type", json!("Office"))
        .unwrap();
    wizard.save_section(SectionKind::GeneralDetails).await.unwrap();
    let draft_id = wizard.draft_id().cloned().unwrap();

    let stored = wizard
        .session_store()
        .unwrap()
        .load()
        .await
        .unwrap()
        .expect("Pointer should be promoted once the draft exists");
    assert_eq!(stored.draft_id, draft_id);
    assert_eq!(stored.active_step, 1);

    assert_eq!(
        wizard.select_step(0).await.unwrap(),
        Navigation::Moved { from: 1, to: 0 }
    );
    drop(wizard);

    let mut resumed = reopen_wizard(&session_path(&temp_dir), &gateway).await;
    assert_eq!(resumed.draft_id(), Some(&draft_id));
    resumed.fetch_aggregate().await.unwrap();

    assert_eq!(resumed.steps().active(), 0);
    assert!(resumed.steps().is_completed(0));
    assert_eq!(
        resumed.section(SectionKind::GeneralDetails).working()["building_name"],
        json!("Unit 4")
    );
    assert!(resumed
        .section(SectionKind::GeneralDetails)
        .has_existing_data());
}

#[tokio::test]
async fn test_finishing_clears_the_session_pointer() {
    let (temp_dir, gateway, mut wizard) = create_test_wizard().await;

    wizard
        .replace(
            SectionKind::GeneralDetails,
            json!({ "building_name": "Unit 4", "property_type": "Office" }),
        )
        .unwrap();
    wizard
        .replace(
            SectionKind::BusinessDetails,
            json!({ "sale_types": [{ "sale_type": "Freehold", "price_value": 1 }] }),
        )
        .unwrap();
    wizard
        .replace(SectionKind::PropertyDetails, json!({ "epc": { "rating": "B" } }))
        .unwrap();
    wizard
        .replace(
            SectionKind::Location,
            json!({
                "coordinates": { "latitude": 53.48, "longitude": -2.24 },
                "address_details": { "postcode": "M1 1AA" }
            }),
        )
        .unwrap();
    wizard
        .replace(
            SectionKind::VirtualTours,
            json!({ "virtual_tours": [{ "url": "https://tours.example/1" }] }),
        )
        .unwrap();
    wizard
        .replace(SectionKind::Features, json!({ "features": ["Parking"] }))
        .unwrap();
    wizard
        .replace(SectionKind::Images, json!({ "images": [{ "file_name": "front.jpg" }] }))
        .unwrap();
    wizard
        .replace(
            SectionKind::Documents,
            json!({ "documents": [{ "document_type": "EPC", "file_name": "epc.pdf" }] }),
        )
        .unwrap();

    let mut last = None;
    for kind in SectionKind::ALL {
        assert_eq!(wizard.active_section(), kind);
        last = Some(wizard.save_section(kind).await.unwrap());
    }

    let receipt = last.unwrap();
    assert!(receipt.finalized);
    assert!(wizard.is_finalized());
    assert!(wizard.steps().all_completed());
    assert!(matches!(
        wizard.next().await,
        Err(WizardError::Finalized { .. })
    ));

    let reopened = reopen_wizard(&session_path(&temp_dir), &gateway).await;
    assert_eq!(reopened.draft_id(), None);
}

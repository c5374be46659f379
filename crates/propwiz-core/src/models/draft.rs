//! The property draft aggregate and its reconciliation from API responses.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{DraftId, SectionKind, SubResourceId, SubResourceStyle};
use crate::error::{Result, WizardError};

/// Bookkeeping keys the API adds to every stored record.
const META_KEYS: &[&str] = &[
    "_id",
    "property_id",
    "__v",
    "created_at",
    "updated_at",
    "createdAt",
    "updatedAt",
];

/// One persisted section slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRecord {
    /// Sub-resource id, when the section has been saved at least once
    pub id: Option<SubResourceId>,

    /// Section fields with bookkeeping keys removed
    pub data: Value,
}

impl SectionRecord {
    pub fn new(id: Option<SubResourceId>, data: Value) -> Self {
        Self { id, data }
    }
}

/// The in-progress listing record composed of up to eight sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyDraft {
    /// Aggregate id, absent until the first section is saved
    pub id: Option<DraftId>,

    sections: BTreeMap<SectionKind, SectionRecord>,
}

impl PropertyDraft {
    /// The client-side empty shell used before anything is saved.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An aggregate known only by id, with no section data yet.
    pub fn with_id(id: DraftId) -> Self {
        Self {
            id: Some(id),
            sections: BTreeMap::new(),
        }
    }

    /// Builds the typed aggregate from the `data` object of a fetch response.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` when the payload is not an object
    /// or carries no `_id`.
    pub fn from_api(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            WizardError::invalid_input("data").with_reason("aggregate payload must be an object")
        })?;

        let id = object
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WizardError::invalid_input("_id").with_reason("aggregate payload carries no id")
            })
            .and_then(DraftId::new)?;

        let mut draft = Self::with_id(id);
        for kind in SectionKind::ALL {
            if let Some(record) = object
                .get(kind.aggregate_key())
                .and_then(|slice| reconcile_slice(kind, slice, &draft.id))
            {
                draft.sections.insert(kind, record);
            }
        }
        Ok(draft)
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionRecord> {
        self.sections.get(&kind)
    }

    /// Whether the aggregate already holds data for the section.
    pub fn has_data(&self, kind: SectionKind) -> bool {
        self.sections.contains_key(&kind)
    }

    pub fn sub_resource_id(&self, kind: SectionKind) -> Option<&SubResourceId> {
        self.section(kind).and_then(|record| record.id.as_ref())
    }

    /// Installs or replaces a section slice.
    pub fn set_section(&mut self, kind: SectionKind, record: SectionRecord) {
        self.sections.insert(kind, record);
    }

    /// Sections with data, in step order.
    pub fn sections_with_data(&self) -> impl Iterator<Item = SectionKind> + '_ {
        self.sections.keys().copied()
    }

    /// True when every section holds data.
    pub fn is_complete(&self) -> bool {
        self.sections.len() == SectionKind::ALL.len()
    }
}

/// Turns one aggregate slice into a section record, or `None` when the slice
/// holds no data.
fn reconcile_slice(kind: SectionKind, slice: &Value, draft_id: &Option<DraftId>) -> Option<SectionRecord> {
    let (own_id, data) = match slice {
        Value::Object(fields) => {
            let own_id = fields
                .get("_id")
                .and_then(Value::as_str)
                .and_then(|raw| SubResourceId::new(raw).ok());
            let data: Map<String, Value> = fields
                .iter()
                .filter(|(key, _)| !META_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if data.is_empty() {
                return None;
            }
            (own_id, Value::Object(data))
        }
        Value::Array(items) if !items.is_empty() => {
            let field = kind.list_field()?;
            let mut data = Map::new();
            data.insert(field.to_string(), Value::Array(items.clone()));
            (None, Value::Object(data))
        }
        _ => return None,
    };

    let id = match kind.style() {
        SubResourceStyle::Inline => draft_id.as_ref().map(SubResourceId::from),
        SubResourceStyle::Linked => own_id,
    };
    Some(SectionRecord::new(id, data))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_aggregate() -> Value {
        json!({
            "_id": "draft-1",
            "general_details": {
                "building_name": "Unit 4",
                "property_type": "Office"
            },
            "business_details": {
                "_id": "biz-9",
                "property_id": "draft-1",
                "sale_types": [{ "sale_type": "Freehold", "price_value": 250000 }],
                "__v": 0
            },
            "property_details": null,
            "location": {},
            "documents": [{ "document_type": "EPC", "file_name": "epc.pdf" }],
            "images": []
        })
    }

    #[test]
    fn test_from_api_requires_an_id() {
        assert!(PropertyDraft::from_api(&json!({ "general_details": {} })).is_err());
        assert!(PropertyDraft::from_api(&json!([])).is_err());
    }

    #[test]
    fn test_inline_sections_use_the_aggregate_id() {
        let draft = PropertyDraft::from_api(&sample_aggregate()).unwrap();
        assert_eq!(
            draft.sub_resource_id(SectionKind::GeneralDetails).map(|id| id.as_str()),
            Some("draft-1")
        );
    }

    #[test]
    fn test_linked_sections_keep_their_own_id_and_drop_bookkeeping() {
        let draft = PropertyDraft::from_api(&sample_aggregate()).unwrap();
        let business = draft.section(SectionKind::BusinessDetails).unwrap();

        assert_eq!(business.id.as_ref().map(|id| id.as_str()), Some("biz-9"));
        assert!(business.data.get("_id").is_none());
        assert!(business.data.get("__v").is_none());
        assert!(business.data.get("property_id").is_none());
        assert_eq!(business.data["sale_types"][0]["price_value"], json!(250000));
    }

    #[test]
    fn test_empty_slices_mean_no_data() {
        let draft = PropertyDraft::from_api(&sample_aggregate()).unwrap();
        assert!(!draft.has_data(SectionKind::PropertyDetails));
        assert!(!draft.has_data(SectionKind::Location));
        assert!(!draft.has_data(SectionKind::Images));
        assert!(!draft.has_data(SectionKind::Features));
    }

    #[test]
    fn test_bare_arrays_are_wrapped_under_their_list_field() {
        let draft = PropertyDraft::from_api(&sample_aggregate()).unwrap();
        let documents = draft.section(SectionKind::Documents).unwrap();

        assert_eq!(documents.id, None);
        assert_eq!(documents.data["documents"][0]["file_name"], json!("epc.pdf"));
    }

    #[test]
    fn test_sections_with_data_are_in_step_order() {
        let draft = PropertyDraft::from_api(&sample_aggregate()).unwrap();
        let kinds: Vec<_> = draft.sections_with_data().collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::GeneralDetails,
                SectionKind::BusinessDetails,
                SectionKind::Documents
            ]
        );
        assert!(!draft.is_complete());
    }
}

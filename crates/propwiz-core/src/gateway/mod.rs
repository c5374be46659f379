//! Create/update/fetch contract against the remote property aggregate.
//!
//! The orchestrator only talks to a [`PersistenceGateway`]. Two
//! implementations ship with the crate:
//!
//! - [`HttpGateway`]: the REST API, routed per section
//! - [`MemoryGateway`]: an in-process aggregate that records every call, used
//!   by tests and the offline demo
//!
//! Both decode failures the same way: a body carrying an `errors` list becomes
//! [`WizardError::Validation`] (via [`map_errors`]), anything else a single
//! banner-level [`WizardError::Api`].

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Result, WizardError},
    models::{DraftId, PropertyDraft, SectionKind, SubResourceId, SubResourceStyle},
    validation::{map_errors, ApiFieldError},
};

pub mod http;
pub mod memory;

pub use http::HttpGateway;
pub use memory::{GatewayCall, MemoryGateway};

/// What a successful create or update reported back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOutcome {
    /// Aggregate id; minted by the first general-details create
    pub draft_id: Option<DraftId>,
    /// Sub-resource id of the saved section, when the response carried one
    pub sub_id: Option<SubResourceId>,
    /// Server confirmation message
    pub message: Option<String>,
}

impl SaveOutcome {
    /// Reads a success body (`{ message, data: { _id } }`).
    ///
    /// For a general-details create, `data._id` is the new aggregate id. For
    /// every other linked section it is the sub-resource id. Inline sections
    /// are identified by the aggregate id itself.
    pub fn from_response(kind: SectionKind, draft: Option<&DraftId>, body: &Value) -> Result<Self> {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(String::from);
        let returned_id = body
            .get("data")
            .and_then(|data| data.get("_id"))
            .and_then(Value::as_str);

        let draft_id = match (draft, kind.requires_draft()) {
            (Some(id), _) => Some(id.clone()),
            (None, false) => {
                let raw = returned_id.ok_or_else(|| WizardError::Api {
                    status: None,
                    message: "The server did not return an id for the new property".to_string(),
                })?;
                Some(DraftId::new(raw)?)
            }
            (None, true) => None,
        };

        let sub_id = match kind.style() {
            SubResourceStyle::Inline => draft_id.as_ref().map(SubResourceId::from),
            SubResourceStyle::Linked => returned_id.and_then(|raw| SubResourceId::new(raw).ok()),
        };

        Ok(Self {
            draft_id,
            sub_id,
            message,
        })
    }
}

/// Remote persistence of the aggregate and its section sub-resources.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// First save of a section. For general details with no aggregate yet,
    /// this also mints the aggregate id.
    async fn create_section(
        &self,
        kind: SectionKind,
        draft: Option<&DraftId>,
        payload: &Value,
    ) -> Result<SaveOutcome>;

    /// Subsequent save of a section that already has a sub-resource.
    async fn update_section(
        &self,
        kind: SectionKind,
        draft: &DraftId,
        sub_id: &SubResourceId,
        payload: &Value,
    ) -> Result<SaveOutcome>;

    /// Full aggregate with every sub-record inlined.
    async fn fetch_draft(&self, id: &DraftId) -> Result<PropertyDraft>;
}

/// Decodes a failure body into a field-level or banner-level error.
///
/// `fallback` is used when the body carries neither an `errors` list nor a
/// `message`, typically the HTTP status line.
pub fn decode_error_body(status: Option<u16>, body: &Value, fallback: &str) -> WizardError {
    if let Some(entries) = body.get("errors").and_then(Value::as_array) {
        let entries: Vec<ApiFieldError> = entries
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect();
        let mapped = map_errors(&entries);
        if !mapped.fields.is_empty() {
            return WizardError::Validation {
                errors: mapped.fields,
                general: mapped.banner,
            };
        }
        if let Some(banner) = mapped.banner {
            return WizardError::Api {
                status,
                message: banner,
            };
        }
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(|| fallback.to_string());
    WizardError::Api { status, message }
}

//! In-process gateway holding aggregates as JSON.
//!
//! Behaves like the REST API closely enough for the orchestrator: the first
//! general-details create mints an aggregate id, linked sections get their own
//! `_id`, and fetches return the aggregate with every slice inlined. Every call
//! is recorded, and failures can be scripted per section.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{decode_error_body, PersistenceGateway, SaveOutcome};
use crate::{
    error::{Result, WizardError},
    models::{DraftId, PropertyDraft, SectionKind, SubResourceId, SubResourceStyle},
};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create {
        kind: SectionKind,
        draft: Option<DraftId>,
        payload: Value,
    },
    Update {
        kind: SectionKind,
        draft: DraftId,
        sub_id: SubResourceId,
        payload: Value,
    },
    Fetch {
        draft: DraftId,
    },
}

impl GatewayCall {
    pub fn is_create(&self) -> bool {
        matches!(self, GatewayCall::Create { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, GatewayCall::Update { .. })
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, GatewayCall::Fetch { .. })
    }

    /// Section the call saved, if it was a save.
    pub fn kind(&self) -> Option<SectionKind> {
        match self {
            GatewayCall::Create { kind, .. } | GatewayCall::Update { kind, .. } => Some(*kind),
            GatewayCall::Fetch { .. } => None,
        }
    }
}

/// A scripted failure: status code and error body.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    status: u16,
    body: Value,
}

impl ScriptedFailure {
    fn into_error(self) -> WizardError {
        decode_error_body(
            Some(self.status),
            &self.body,
            &format!("Request failed with status {}", self.status),
        )
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    aggregates: BTreeMap<DraftId, Map<String, Value>>,
    calls: Vec<GatewayCall>,
    save_failures: BTreeMap<SectionKind, VecDeque<ScriptedFailure>>,
    fetch_failures: VecDeque<ScriptedFailure>,
    next_id: u64,
}

impl MemoryState {
    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn take_save_failure(&mut self, kind: SectionKind) -> Option<WizardError> {
        self.save_failures
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
            .map(ScriptedFailure::into_error)
    }

    fn aggregate_mut(&mut self, draft: &DraftId) -> Result<&mut Map<String, Value>> {
        self.aggregates.get_mut(draft).ok_or_else(|| WizardError::Api {
            status: Some(404),
            message: "Property not found.".to_string(),
        })
    }
}

/// Gateway backed by in-memory aggregates.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an aggregate as the API would return it from a fetch. The
    /// aggregate must carry an `_id`.
    pub async fn insert_aggregate(&self, aggregate: Value) -> Result<DraftId> {
        let object = aggregate.as_object().cloned().ok_or_else(|| {
            WizardError::invalid_input("aggregate").with_reason("must be a JSON object")
        })?;
        let id = object
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| WizardError::invalid_input("_id").with_reason("aggregate carries no id"))
            .and_then(DraftId::new)?;
        self.state.lock().await.aggregates.insert(id.clone(), object);
        Ok(id)
    }

    /// Makes the next save of `kind` fail with the given status and body.
    pub async fn fail_next_save(&self, kind: SectionKind, status: u16, body: Value) {
        self.state
            .lock()
            .await
            .save_failures
            .entry(kind)
            .or_default()
            .push_back(ScriptedFailure { status, body });
    }

    /// Makes the next fetch fail with the given status and body.
    pub async fn fail_next_fetch(&self, status: u16, body: Value) {
        self.state
            .lock()
            .await
            .fetch_failures
            .push_back(ScriptedFailure { status, body });
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().await.calls.clone()
    }

    /// Save calls (creates and updates) received for one section.
    pub async fn saves_of(&self, kind: SectionKind) -> Vec<GatewayCall> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.kind() == Some(kind))
            .cloned()
            .collect()
    }

    /// The stored aggregate, as a fetch would return it.
    pub async fn aggregate(&self, id: &DraftId) -> Option<Value> {
        self.state
            .lock()
            .await
            .aggregates
            .get(id)
            .cloned()
            .map(Value::Object)
    }

    /// Replaces one slice of a stored aggregate, as another client might.
    pub async fn overwrite_slice(&self, id: &DraftId, kind: SectionKind, slice: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .aggregate_mut(id)?
            .insert(kind.aggregate_key().to_string(), slice);
        Ok(())
    }
}

fn store_linked(aggregate: &mut Map<String, Value>, kind: SectionKind, sub_id: &SubResourceId, draft: &DraftId, payload: &Value) {
    let mut slice = payload.as_object().cloned().unwrap_or_default();
    slice.insert("_id".to_string(), Value::String(sub_id.to_string()));
    slice.insert("property_id".to_string(), Value::String(draft.to_string()));
    aggregate.insert(kind.aggregate_key().to_string(), Value::Object(slice));
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn create_section(
        &self,
        kind: SectionKind,
        draft: Option<&DraftId>,
        payload: &Value,
    ) -> Result<SaveOutcome> {
        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall::Create {
            kind,
            draft: draft.cloned(),
            payload: payload.clone(),
        });
        if let Some(error) = state.take_save_failure(kind) {
            return Err(error);
        }

        let draft = match draft {
            Some(draft) => draft.clone(),
            None if !kind.requires_draft() => {
                let id = DraftId::new(state.mint("draft"))?;
                let mut aggregate = Map::new();
                aggregate.insert("_id".to_string(), Value::String(id.to_string()));
                state.aggregates.insert(id.clone(), aggregate);
                id
            }
            None => {
                return Err(WizardError::Api {
                    status: Some(400),
                    message: "Property id is required".to_string(),
                })
            }
        };

        let sub_id = match kind.style() {
            SubResourceStyle::Inline => SubResourceId::from(&draft),
            SubResourceStyle::Linked => SubResourceId::new(state.mint(kind.as_str()))?,
        };
        let aggregate = state.aggregate_mut(&draft)?;
        match kind.style() {
            SubResourceStyle::Inline => {
                aggregate.insert(kind.aggregate_key().to_string(), payload.clone());
            }
            SubResourceStyle::Linked => store_linked(aggregate, kind, &sub_id, &draft, payload),
        }

        Ok(SaveOutcome {
            draft_id: Some(draft),
            sub_id: Some(sub_id),
            message: Some(format!("{} saved", kind.title())),
        })
    }

    async fn update_section(
        &self,
        kind: SectionKind,
        draft: &DraftId,
        sub_id: &SubResourceId,
        payload: &Value,
    ) -> Result<SaveOutcome> {
        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall::Update {
            kind,
            draft: draft.clone(),
            sub_id: sub_id.clone(),
            payload: payload.clone(),
        });
        if let Some(error) = state.take_save_failure(kind) {
            return Err(error);
        }

        let aggregate = state.aggregate_mut(draft)?;
        match kind.style() {
            SubResourceStyle::Inline => {
                aggregate.insert(kind.aggregate_key().to_string(), payload.clone());
            }
            SubResourceStyle::Linked => store_linked(aggregate, kind, sub_id, draft, payload),
        }

        Ok(SaveOutcome {
            draft_id: Some(draft.clone()),
            sub_id: Some(sub_id.clone()),
            message: Some(format!("{} updated", kind.title())),
        })
    }

    async fn fetch_draft(&self, id: &DraftId) -> Result<PropertyDraft> {
        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall::Fetch { draft: id.clone() });
        if let Some(failure) = state.fetch_failures.pop_front() {
            return Err(failure.into_error());
        }

        let aggregate = state
            .aggregates
            .get(id)
            .ok_or_else(|| WizardError::DraftNotFound { id: id.to_string() })?;
        PropertyDraft::from_api(&Value::Object(aggregate.clone()))
    }
}

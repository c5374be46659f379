//! The wizard orchestrator.
//!
//! [`Wizard`] owns the aggregate record, the step controller and one
//! [`SectionDraft`] per section, and is the only component that talks to the
//! [`PersistenceGateway`].
//!
//! Every asynchronous action is split into a synchronous *begin* half, the
//! gateway call, and a *complete* half:
//!
//! ```text
//! begin_save(kind) ──▶ gateway create/update ──▶ complete_save(pending, result)
//!        │                                               │
//!   snapshot payload                        route result to the owning
//!   mark section saving                     section, whatever step is active
//!
//! begin_fetch() ──▶ gateway fetch ──▶ apply_fetch(ticket, draft)
//!        │                                   │
//!   record edit versions            hydrate sections that have not
//!                                   been edited since the ticket
//! ```
//!
//! [`Wizard::save_section`] and [`Wizard::fetch_aggregate`] chain the halves;
//! callers that need to interleave edits or navigation with an in-flight
//! request use the halves directly.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use propwiz_core::{gateway::MemoryGateway, SectionKind, WizardBuilder};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut wizard = WizardBuilder::new()
//!     .with_gateway(Arc::new(MemoryGateway::new()))
//!     .without_session_store()
//!     .build()
//!     .await?;
//!
//! wizard.edit(SectionKind::GeneralDetails, "building_name", json!("Unit 4"))?;
//! wizard.edit(SectionKind::GeneralDetails, "property_type", json!("Office"))?;
//! let receipt = wizard.save_section(SectionKind::GeneralDetails).await?;
//! println!("{receipt}");
//! # Ok(())
//! # }
//! ```

use std::{fmt, sync::Arc};

use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    display::{SaveReceipt, SectionView, StepOverview, StepRow},
    error::{Result, WizardError},
    fields::FieldPath,
    gateway::{PersistenceGateway, SaveOutcome},
    mailbox::{mailbox, Inbox},
    models::{DraftId, PropertyDraft, SectionKind, SubResourceId, SubResourceStyle, STEP_COUNT},
    session::{SessionStore, WizardSession},
    steps::{Navigation, StepController},
    store::{Hydration, SectionDraft},
};

pub mod builder;

#[cfg(test)]
mod tests;

pub use builder::WizardBuilder;

/// Edit versions of every section at the moment a fetch was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    draft_id: DraftId,
    versions: [u64; STEP_COUNT],
}

impl FetchTicket {
    pub fn draft_id(&self) -> &DraftId {
        &self.draft_id
    }

    pub fn version(&self, kind: SectionKind) -> u64 {
        self.versions[kind.index()]
    }
}

/// How a pending save reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveMode {
    /// First save of the section; `draft` is absent only when general
    /// details mint the aggregate
    Create { draft: Option<DraftId> },
    Update {
        draft: DraftId,
        sub_id: SubResourceId,
    },
}

/// A save that has been started but whose result has not been applied.
#[derive(Debug, Clone)]
pub struct PendingSave {
    kind: SectionKind,
    mode: SaveMode,
    payload: Value,
    version: u64,
}

impl PendingSave {
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn mode(&self) -> &SaveMode {
        &self.mode
    }

    /// The exact payload sent; it becomes the section's snapshot on success.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The section's edit version when the payload was taken.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_create(&self) -> bool {
        matches!(self.mode, SaveMode::Create { .. })
    }
}

/// Coordinator of the eight sections, the step controller and the gateway.
pub struct Wizard {
    gateway: Arc<dyn PersistenceGateway>,
    store: Option<SessionStore>,
    session: WizardSession,
    draft: PropertyDraft,
    steps: StepController,
    /// Indexed by step
    sections: Vec<SectionDraft>,
    inboxes: Vec<Inbox<Value>>,
    live: Vec<Value>,
    resume_step: Option<usize>,
    finalized: bool,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("session", &self.session)
            .field("steps", &self.steps)
            .field("store", &self.store)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl Wizard {
    pub(crate) fn new(
        gateway: Arc<dyn PersistenceGateway>,
        store: Option<SessionStore>,
        session: WizardSession,
        resume_step: Option<usize>,
    ) -> Self {
        let mut sections = Vec::with_capacity(STEP_COUNT);
        let mut inboxes = Vec::with_capacity(STEP_COUNT);
        let mut live = Vec::with_capacity(STEP_COUNT);
        for kind in SectionKind::ALL {
            let (publisher, inbox) = mailbox();
            let section = SectionDraft::new(kind, publisher);
            live.push(section.working().clone());
            sections.push(section);
            inboxes.push(inbox);
        }

        Self {
            gateway,
            store,
            session,
            draft: PropertyDraft::empty(),
            steps: StepController::new(),
            sections,
            inboxes,
            live,
            resume_step,
            finalized: false,
        }
    }

    /// The session value carrying the bound draft id, if any.
    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// The aggregate id this wizard is bound to.
    ///
    /// `None` until General Details is saved for the first time or a draft
    /// is resumed. Once set it never changes for the life of the wizard.
    pub fn draft_id(&self) -> Option<&DraftId> {
        self.session.draft_id()
    }

    /// The aggregate as of the last applied fetch.
    pub fn draft(&self) -> &PropertyDraft {
        &self.draft
    }

    pub fn steps(&self) -> &StepController {
        &self.steps
    }

    /// The durable pointer store, absent when the wizard was built with
    /// [`WizardBuilder::without_session_store`].
    pub fn session_store(&self) -> Option<&SessionStore> {
        self.store.as_ref()
    }

    /// True once the last step was saved with every step completed. A
    /// finalized wizard refuses edits, saves and navigation.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The draft store of one section: working copy, snapshot, field
    /// errors and banner.
    pub fn section(&self, kind: SectionKind) -> &SectionDraft {
        &self.sections[kind.index()]
    }

    fn section_mut(&mut self, kind: SectionKind) -> &mut SectionDraft {
        &mut self.sections[kind.index()]
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            return Err(WizardError::Finalized {
                draft_id: self
                    .draft_id()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
        }
        Ok(())
    }

    // Fetching

    /// Records every section's edit version ahead of a fetch.
    ///
    /// The returned ticket travels with the request and is handed back to
    /// [`Wizard::apply_fetch`]. A section edited after the ticket was issued
    /// keeps its working copy when the response is applied.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` when no draft has been created or
    /// resumed yet.
    pub fn begin_fetch(&self) -> Result<FetchTicket> {
        let draft_id = self.draft_id().cloned().ok_or_else(|| {
            WizardError::invalid_input("draft_id")
                .with_reason("no property draft has been created or resumed")
        })?;
        let mut versions = [0; STEP_COUNT];
        for (slot, section) in versions.iter_mut().zip(&self.sections) {
            *slot = section.version();
        }
        Ok(FetchTicket { draft_id, versions })
    }

    /// Installs a fetched aggregate and hydrates the sections.
    ///
    /// Each section is offered the aggregate once per draft id. Sections
    /// that already hydrated for this id are left alone, so repeated
    /// refreshes never overwrite work in progress.
    ///
    /// The first aggregate seen for a draft seeds the step state: every
    /// section with persisted data is completed, and the first gap becomes
    /// the active step (or the stored resume step, when it is selectable).
    /// Later refreshes of the same draft only fold in newly persisted steps
    /// and leave the active step where it is.
    ///
    /// # Arguments
    ///
    /// * `ticket` - The ticket from [`Wizard::begin_fetch`] for this request
    /// * `draft` - The aggregate the gateway returned
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` when the aggregate has no id or
    /// its id differs from the ticket's draft.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use propwiz_core::{gateway::{MemoryGateway, PersistenceGateway}, DraftId, WizardBuilder};
    /// # async {
    /// let gateway = Arc::new(MemoryGateway::new());
    /// let mut wizard = WizardBuilder::new()
    ///     .with_gateway(gateway.clone())
    ///     .resume(DraftId::new("draft-1")?)
    ///     .without_session_store()
    ///     .build()
    ///     .await?;
    ///
    /// let ticket = wizard.begin_fetch()?;
    /// let draft = gateway.fetch_draft(ticket.draft_id()).await?;
    /// wizard.apply_fetch(ticket, draft)?;
    /// # Result::<(), propwiz_core::WizardError>::Ok(())
    /// # };
    /// ```
    pub fn apply_fetch(&mut self, ticket: FetchTicket, draft: PropertyDraft) -> Result<()> {
        let Some(id) = draft.id.clone() else {
            return Err(WizardError::invalid_input("_id").with_reason("fetched aggregate has no id"));
        };
        if id != ticket.draft_id {
            return Err(WizardError::invalid_input("_id").with_reason(format!(
                "fetched draft {id} does not match requested draft {}",
                ticket.draft_id
            )));
        }
        self.session.adopt(&id)?;

        let initial = self.draft.id.as_ref() != Some(&id);
        for section in &mut self.sections {
            let kind = section.kind();
            match section.hydrate(&draft, ticket.version(kind)) {
                Hydration::Preserved => {
                    warn!("Kept local edits to {kind}: they are newer than the fetched draft {id}")
                }
                outcome => debug!("Hydration of {kind} for draft {id}: {outcome:?}"),
            }
        }

        let persisted: Vec<usize> = draft.sections_with_data().map(SectionKind::index).collect();
        if initial {
            self.steps = StepController::seeded(persisted);
            if let Some(step) = self.resume_step.take() {
                if self.steps.can_select(step) {
                    self.steps.select(step);
                }
            }
            debug!("Seeded steps from draft {id}: active step {}", self.steps.active());
        } else {
            self.steps.merge_persisted(persisted);
        }

        self.draft = draft;
        self.collect_edits();
        Ok(())
    }

    /// Pulls the full aggregate and applies it.
    ///
    /// Chains [`Wizard::begin_fetch`], the gateway call and
    /// [`Wizard::apply_fetch`], then remembers the active step in the
    /// session store.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidInput` without a bound draft,
    /// `WizardError::DraftNotFound` when the server has no such draft, and
    /// any transport or API error from the gateway.
    pub async fn fetch_aggregate(&mut self) -> Result<()> {
        let ticket = self.begin_fetch()?;
        let draft = self.gateway.fetch_draft(ticket.draft_id()).await?;
        self.apply_fetch(ticket, draft)?;
        self.persist_step().await;
        Ok(())
    }

    // Saving

    /// Checks a section can be saved and snapshots its payload.
    ///
    /// Checks run in order: a save already in flight, a missing aggregate
    /// for a dependent section, blank required fields, and finally (for a
    /// section that already has a sub-resource) whether anything changed.
    /// Structural and field failures are recorded on the section.
    ///
    /// The mode is an update when the section already has a sub-resource,
    /// or when it is stored inline on an aggregate that already exists.
    /// Otherwise it is a create. The returned [`PendingSave`] holds an exact
    /// copy of the working data, and the section stays marked as saving
    /// until [`Wizard::complete_save`] receives the result.
    ///
    /// # Errors
    ///
    /// * `WizardError::Finalized` once the listing is finished
    /// * `WizardError::SaveInFlight` while this section is already saving
    /// * `WizardError::Precondition` for a dependent section with no draft
    /// * `WizardError::Validation` when required fields are blank
    /// * `WizardError::NoChanges` for an unchanged existing section
    pub fn begin_save(&mut self, kind: SectionKind) -> Result<PendingSave> {
        self.ensure_open()?;
        let draft_id = self.draft_id().cloned();
        let section = self.section_mut(kind);

        if section.is_saving() {
            return Err(WizardError::SaveInFlight { section: kind });
        }

        if kind.requires_draft() && draft_id.is_none() {
            let error = WizardError::precondition(
                kind,
                "the property draft has not been created yet; save General Details first",
            );
            section.record_failure(&error);
            return Err(error);
        }

        let missing = section.missing_required();
        if !missing.is_empty() {
            let error = WizardError::validation(missing);
            section.record_failure(&error);
            return Err(error);
        }

        // An inline section lives on the aggregate itself, so once the
        // aggregate exists it is updated even before its slice was fetched.
        let existing = section.sub_id().cloned();
        let mode = match (draft_id, existing.clone(), kind.style()) {
            (Some(draft), Some(sub_id), _) => SaveMode::Update { draft, sub_id },
            (Some(draft), None, SubResourceStyle::Inline) => SaveMode::Update {
                sub_id: SubResourceId::from(&draft),
                draft,
            },
            (draft, _, _) => SaveMode::Create { draft },
        };

        if existing.is_some() {
            match section.first_change() {
                Some(path) => debug!("{kind} changed at {path}"),
                None => {
                    debug!("{kind} unchanged since its last save");
                    return Err(WizardError::NoChanges { section: kind });
                }
            }
        }

        section.set_saving(true);
        Ok(PendingSave {
            kind,
            mode,
            payload: section.working().clone(),
            version: section.version(),
        })
    }

    /// Applies a gateway result to the section that issued the save.
    ///
    /// On success the aggregate id is adopted if it was just minted, the
    /// sent payload becomes the section snapshot and the step is marked
    /// submitted. If the saved section is still the active step the wizard
    /// moves on, or finalizes after the last step. On failure the error is
    /// recorded on the section and returned; its working copy is untouched.
    ///
    /// The result is always routed to `pending`'s own section, so a response
    /// arriving after the user moved elsewhere updates the right store and
    /// never drags the user back.
    ///
    /// # Arguments
    ///
    /// * `pending` - The save returned by [`Wizard::begin_save`]
    /// * `result` - What the gateway answered for it
    ///
    /// # Returns
    ///
    /// A [`SaveReceipt`] describing the saved section, whether it was
    /// created, and any navigation that followed
    pub async fn complete_save(
        &mut self,
        pending: PendingSave,
        result: Result<SaveOutcome>,
    ) -> Result<SaveReceipt> {
        let kind = pending.kind;
        self.section_mut(kind).set_saving(false);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("Saving {kind} failed: {error}");
                self.section_mut(kind).record_failure(&error);
                return Err(error);
            }
        };

        let draft_id = match outcome.draft_id.clone().or_else(|| self.draft_id().cloned()) {
            Some(id) => id,
            None => {
                let error = WizardError::Api {
                    status: None,
                    message: "The server did not return a property id".to_string(),
                };
                self.section_mut(kind).record_failure(&error);
                return Err(error);
            }
        };
        if self.session.adopt(&draft_id)? {
            info!("Property draft {draft_id} created");
            self.adopt_minted(&draft_id).await;
        }

        let sub_id = outcome.sub_id.clone().or_else(|| match kind.style() {
            SubResourceStyle::Inline => Some(SubResourceId::from(&draft_id)),
            SubResourceStyle::Linked => None,
        });
        let created = pending.is_create();
        self.section_mut(kind).commit(pending.payload, sub_id);
        self.steps.mark_submitted(kind.index());
        info!("{kind} saved for draft {draft_id}");

        let mut navigation = None;
        if self.steps.active() == kind.index() {
            if kind.is_last() && self.steps.all_completed() {
                self.finalize(&draft_id).await;
            } else {
                navigation = Some(self.steps.advance());
                self.persist_step().await;
            }
        }

        Ok(SaveReceipt {
            kind,
            created,
            draft_id,
            message: outcome.message,
            navigation,
            refreshed: false,
            finalized: self.finalized,
        })
    }

    /// Saves one section: begin, gateway call, complete, then a best-effort
    /// refresh of the aggregate.
    ///
    /// A failed refresh does not fail the save; the receipt reports it with
    /// `refreshed == false` and the local data stays on screen.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use propwiz_core::{gateway::MemoryGateway, SectionKind, WizardBuilder};
    /// # async {
    /// let mut wizard = WizardBuilder::new()
    ///     .with_gateway(Arc::new(MemoryGateway::new()))
    ///     .without_session_store()
    ///     .build()
    ///     .await?;
    ///
    /// wizard.edit(SectionKind::GeneralDetails, "building_name", serde_json::json!("Unit 4"))?;
    /// wizard.edit(SectionKind::GeneralDetails, "property_type", serde_json::json!("Office"))?;
    /// let receipt = wizard.save_section(SectionKind::GeneralDetails).await?;
    /// assert!(receipt.created);
    /// # Result::<(), propwiz_core::WizardError>::Ok(())
    /// # };
    /// ```
    pub async fn save_section(&mut self, kind: SectionKind) -> Result<SaveReceipt> {
        let pending = self.begin_save(kind)?;
        let result = match pending.mode() {
            SaveMode::Create { draft } => {
                self.gateway
                    .create_section(kind, draft.as_ref(), pending.payload())
                    .await
            }
            SaveMode::Update { draft, sub_id } => {
                self.gateway
                    .update_section(kind, draft, sub_id, pending.payload())
                    .await
            }
        };
        let sent_version = pending.version();

        let mut receipt = self.complete_save(pending, result).await?;
        if !receipt.finalized {
            receipt.refreshed = self.refresh_after_save(kind, sent_version).await;
        }
        Ok(receipt)
    }

    /// The saving section's ticket entry is the version its payload was
    /// taken at, so edits made while the save was in flight are kept.
    async fn refresh_after_save(&mut self, kind: SectionKind, sent_version: u64) -> bool {
        let mut ticket = match self.begin_fetch() {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Skipping refresh after saving {kind}: {e}");
                return false;
            }
        };
        ticket.versions[kind.index()] = sent_version;

        let fetched = self.gateway.fetch_draft(ticket.draft_id()).await;
        match fetched.and_then(|draft| self.apply_fetch(ticket, draft)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Refreshing the draft after saving {kind} failed: {e}");
                false
            }
        }
    }

    async fn adopt_minted(&mut self, draft_id: &DraftId) {
        if self.draft.id.is_none() {
            self.draft = PropertyDraft::with_id(draft_id.clone());
        }
        for section in &mut self.sections {
            section.adopt_minted(draft_id);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.promote(draft_id).await {
                warn!("Could not remember draft {draft_id}: {e}");
            }
        }
    }

    async fn finalize(&mut self, draft_id: &DraftId) {
        self.finalized = true;
        info!("Listing wizard for draft {draft_id} finalized");
        if let Some(store) = &self.store {
            if let Err(e) = store.clear().await {
                warn!("Could not clear the session pointer: {e}");
            }
        }
    }

    async fn persist_step(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.record_step(self.steps.active()).await {
                warn!("Could not record the active step: {e}");
            }
        }
    }

    // Editing

    /// Writes one field of a section's working copy.
    ///
    /// `path` uses dot or bracket form (`sale_types.0.price_value` or
    /// `sale_types[0].price_value`). Intermediate objects and lists are
    /// created as needed, and any field error recorded at the path is
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidFieldPath` for a malformed path or one
    /// that does not fit the current data; the working copy is then left
    /// exactly as it was.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use propwiz_core::{gateway::MemoryGateway, SectionKind, WizardBuilder};
    /// # async {
    /// let mut wizard = WizardBuilder::new()
    ///     .with_gateway(Arc::new(MemoryGateway::new()))
    ///     .without_session_store()
    ///     .build()
    ///     .await?;
    ///
    /// wizard.edit(SectionKind::Location, "address_details.postcode", serde_json::json!("E1 6AN"))?;
    /// assert!(wizard.section(SectionKind::Location).has_changes());
    /// # Result::<(), propwiz_core::WizardError>::Ok(())
    /// # };
    /// ```
    pub fn edit(&mut self, kind: SectionKind, path: &str, value: Value) -> Result<()> {
        self.ensure_open()?;
        let path: FieldPath = path.parse()?;
        self.section_mut(kind).edit(&path, value)
    }

    /// Appends an entry to a repeated list, returning its position.
    pub fn push_item(&mut self, kind: SectionKind, list: &str, item: Value) -> Result<usize> {
        self.ensure_open()?;
        let list: FieldPath = list.parse()?;
        self.section_mut(kind).push_item(&list, item)
    }

    /// Removes the entry at `index` from a repeated list and returns it.
    pub fn remove_item(&mut self, kind: SectionKind, list: &str, index: usize) -> Result<Value> {
        self.ensure_open()?;
        let list: FieldPath = list.parse()?;
        self.section_mut(kind).remove_item(&list, index)
    }

    /// Replaces a section's working copy wholesale, e.g. from a file.
    pub fn replace(&mut self, kind: SectionKind, value: Value) -> Result<()> {
        self.ensure_open()?;
        self.section_mut(kind).replace(value)
    }

    /// Drains every section mailbox into the live view, returning the
    /// sections that published since the last call.
    pub fn collect_edits(&mut self) -> Vec<SectionKind> {
        let mut updated = Vec::new();
        for (kind, (inbox, live)) in SectionKind::ALL
            .into_iter()
            .zip(self.inboxes.iter_mut().zip(self.live.iter_mut()))
        {
            if let Some(value) = inbox.take() {
                *live = value;
                updated.push(kind);
            }
        }
        updated
    }

    /// The latest settled working copy the orchestrator has seen.
    pub fn live(&self, kind: SectionKind) -> &Value {
        &self.live[kind.index()]
    }

    // Navigation

    /// Moves to the next step once the active one has been submitted.
    ///
    /// A refused move is not an error: the returned [`Navigation::Blocked`]
    /// names the reason and the active step is unchanged. A move is
    /// remembered in the session store.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Finalized` once the listing is finished.
    pub async fn next(&mut self) -> Result<Navigation> {
        self.ensure_open()?;
        let navigation = self.steps.advance();
        if let Navigation::Moved { .. } = navigation {
            self.persist_step().await;
        }
        Ok(navigation)
    }

    /// Jumps to a step through the step selector.
    ///
    /// Completed steps, the active step and the step right after the
    /// furthest completed one are reachable. Anything else comes back as
    /// [`Navigation::Blocked`].
    ///
    /// # Arguments
    ///
    /// * `step` - Zero-based step index
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use propwiz_core::{gateway::MemoryGateway, SectionKind, WizardBuilder};
    /// # async {
    /// let mut wizard = WizardBuilder::new()
    ///     .with_gateway(Arc::new(MemoryGateway::new()))
    ///     .without_session_store()
    ///     .build()
    ///     .await?;
    ///
    /// let navigation = wizard.select_step(5).await?;
    /// assert!(navigation.is_blocked());
    /// # Result::<(), propwiz_core::WizardError>::Ok(())
    /// # };
    /// ```
    pub async fn select_step(&mut self, step: usize) -> Result<Navigation> {
        self.ensure_open()?;
        let navigation = self.steps.select(step);
        if let Navigation::Moved { .. } = navigation {
            self.persist_step().await;
        }
        Ok(navigation)
    }

    // Views

    /// The section shown by the active step.
    pub fn active_section(&self) -> SectionKind {
        SectionKind::from_index(self.steps.active()).unwrap_or(SectionKind::GeneralDetails)
    }

    /// Everything needed to render the active step.
    pub fn active_view(&self) -> SectionView {
        self.section_view(self.active_section())
    }

    /// A snapshot of one section for rendering: server data, working copy,
    /// dirty flag, field errors, banner and the save/update action label.
    pub fn section_view(&self, kind: SectionKind) -> SectionView {
        let section = self.section(kind);
        SectionView {
            kind,
            status: self.steps.status(kind.index()),
            server: self.draft.section(kind).map(|record| record.data.clone()),
            working: section.working().clone(),
            has_existing_data: section.has_existing_data(),
            sub_id: section.sub_id().cloned(),
            dirty: section.has_changes(),
            errors: section.errors().clone(),
            banner: section.banner().map(String::from),
            saving: section.is_saving(),
        }
    }

    /// Per-step status for the step selector.
    ///
    /// Each row carries the step's status, whether it is completed, whether
    /// its section exists on the server, and whether an existing section has
    /// unsaved edits. The overview renders as markdown through `Display`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use propwiz_core::{gateway::MemoryGateway, SectionKind, WizardBuilder};
    /// # async {
    /// let mut wizard = WizardBuilder::new()
    ///     .with_gateway(Arc::new(MemoryGateway::new()))
    ///     .without_session_store()
    ///     .build()
    ///     .await?;
    ///
    /// let overview = wizard.overview();
    /// assert_eq!(overview.completed_count(), 0);
    /// println!("{overview}");
    /// # Result::<(), propwiz_core::WizardError>::Ok(())
    /// # };
    /// ```
    pub fn overview(&self) -> StepOverview {
        StepOverview {
            draft_id: self.draft_id().cloned(),
            rows: SectionKind::ALL
                .iter()
                .map(|kind| {
                    let section = self.section(*kind);
                    StepRow {
                        kind: *kind,
                        status: self.steps.status(kind.index()),
                        completed: self.steps.is_completed(kind.index()),
                        has_existing_data: section.has_existing_data(),
                        dirty: section.has_existing_data() && section.has_changes(),
                    }
                })
                .collect(),
            finalized: self.finalized,
        }
    }
}

//! Per-section working copy and last-persisted snapshot.

use serde_json::Value;

use crate::{
    changes::ChangeDetector,
    error::{Result, WizardError},
    fields::FieldPath,
    mailbox::Publisher,
    models::{DraftId, PropertyDraft, SectionKind, SubResourceId},
    schema::SectionSchema,
    validation::FieldErrors,
};

/// Outcome of offering aggregate data to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Working copy and snapshot replaced with the server slice
    Hydrated,
    /// The draft has no data for this section; both reset to empty defaults
    Reset,
    /// Same aggregate id as the last hydration; working copy untouched
    Unchanged,
    /// New aggregate id, but local edits advanced past the fetch; the
    /// snapshot and ids were adopted and the working copy kept
    Preserved,
}

/// Working copy of one section, owned by the user's edits once hydrated.
#[derive(Debug)]
pub struct SectionDraft {
    kind: SectionKind,
    detector: ChangeDetector,
    working: Value,
    original: Value,
    sub_id: Option<SubResourceId>,
    hydrated_for: Option<DraftId>,
    version: u64,
    errors: FieldErrors,
    banner: Option<String>,
    saving: bool,
    publisher: Publisher<Value>,
}

impl SectionDraft {
    /// An empty section publishing its working copy to `publisher`.
    pub fn new(kind: SectionKind, publisher: Publisher<Value>) -> Self {
        let defaults = SectionSchema::of(kind).defaults();
        Self {
            kind,
            detector: ChangeDetector::new(kind),
            working: defaults.clone(),
            original: defaults,
            sub_id: None,
            hydrated_for: None,
            version: 0,
            errors: FieldErrors::default(),
            banner: None,
            saving: false,
            publisher,
        }
    }

    /// Offers a freshly fetched aggregate to this section.
    ///
    /// Fires at most once per distinct aggregate id. `issued_version` is this
    /// section's edit version when the fetch was issued; if local edits have
    /// advanced past it, the working copy is kept.
    pub fn hydrate(&mut self, draft: &PropertyDraft, issued_version: u64) -> Hydration {
        let Some(id) = draft.id.as_ref() else {
            return Hydration::Unchanged;
        };
        let record = draft.section(self.kind);

        if self.hydrated_for.as_ref() == Some(id) {
            if self.sub_id.is_none() {
                self.sub_id = record.and_then(|record| record.id.clone());
            }
            return Hydration::Unchanged;
        }

        let server = record
            .map(|record| record.data.clone())
            .unwrap_or_else(|| SectionSchema::of(self.kind).defaults());
        self.sub_id = record.and_then(|record| record.id.clone());
        self.hydrated_for = Some(id.clone());

        if self.version > issued_version {
            self.original = server;
            return Hydration::Preserved;
        }

        self.working = server.clone();
        self.original = server;
        self.errors.clear();
        self.banner = None;
        self.publisher.publish(self.working.clone());
        if record.is_some() {
            Hydration::Hydrated
        } else {
            Hydration::Reset
        }
    }

    /// Marks the section as belonging to an aggregate this session just
    /// minted, so the follow-up fetch is treated as a same-id refresh.
    pub fn adopt_minted(&mut self, id: &DraftId) {
        if self.hydrated_for.is_none() {
            self.hydrated_for = Some(id.clone());
        }
    }

    /// Writes one field of the working copy.
    pub fn edit(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        path.set(&mut self.working, value)?;
        self.errors.clear_path(&path.to_dot());
        self.touch();
        Ok(())
    }

    /// Appends an entry to a repeated list, returning its position.
    pub fn push_item(&mut self, list: &FieldPath, item: Value) -> Result<usize> {
        let position = list.push(&mut self.working, item)?;
        self.errors.clear_path(&list.to_dot());
        self.touch();
        Ok(position)
    }

    /// Removes an entry from a repeated list.
    ///
    /// Messages recorded against the list are dropped, since positions after
    /// the removed entry shift.
    pub fn remove_item(&mut self, list: &FieldPath, index: usize) -> Result<Value> {
        let removed = list.remove(&mut self.working, index)?;
        self.errors.clear_path(&list.to_dot());
        self.touch();
        Ok(removed)
    }

    /// Replaces the whole working copy.
    pub fn replace(&mut self, value: Value) -> Result<()> {
        if !value.is_object() {
            return Err(WizardError::invalid_input(self.kind.as_str())
                .with_reason("section data must be a JSON object"));
        }
        self.working = value;
        self.errors.clear();
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
        self.publisher.publish(self.working.clone());
    }

    /// Whether the working copy differs from the snapshot on any comparable
    /// field, after normalization.
    pub fn has_changes(&self) -> bool {
        self.detector.has_changes(&self.working, &self.original)
    }

    /// Dot path of the first differing field, in schema order.
    pub fn first_change(&self) -> Option<String> {
        self.detector.first_change(&self.working, &self.original)
    }

    /// Required fields left blank in the working copy.
    pub fn missing_required(&self) -> FieldErrors {
        SectionSchema::of(self.kind).missing_required(&self.working)
    }

    pub(crate) fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    /// Installs the payload that was just persisted as the new snapshot.
    pub fn commit(&mut self, sent: Value, sub_id: Option<SubResourceId>) {
        self.original = sent;
        if sub_id.is_some() {
            self.sub_id = sub_id;
        }
        self.errors.clear();
        self.banner = None;
    }

    /// Records a failed save; the working copy is left as it is.
    pub fn record_failure(&mut self, error: &WizardError) {
        match error {
            WizardError::Validation { errors, general } => {
                self.errors = errors.clone();
                self.banner = general.clone();
            }
            other => self.banner = other.banner(),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// The data the user is editing.
    pub fn working(&self) -> &Value {
        &self.working
    }

    /// The last persisted snapshot: the fetched slice, or the payload of the
    /// last successful save.
    pub fn original(&self) -> &Value {
        &self.original
    }

    pub fn sub_id(&self) -> Option<&SubResourceId> {
        self.sub_id.as_ref()
    }

    /// Whether the section already has a persisted sub-resource.
    pub fn has_existing_data(&self) -> bool {
        self.sub_id.is_some()
    }

    pub fn hydrated_for(&self) -> Option<&DraftId> {
        self.hydrated_for.as_ref()
    }

    /// Monotonic counter bumped by every local edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Field errors from the last failed save, keyed by dot path.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Section-level message shown above the form.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }
}

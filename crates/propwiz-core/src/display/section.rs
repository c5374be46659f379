//! One section's state as the form would render it.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::StepLabel;
use crate::{
    models::{SectionKind, SubResourceId},
    steps::StepStatus,
    validation::FieldErrors,
};

/// Snapshot of a section: what the server holds, what the user is editing,
/// and any errors from the last save attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub kind: SectionKind,
    pub status: StepStatus,
    /// The section's slice of the last fetched aggregate
    pub server: Option<Value>,
    pub working: Value,
    pub has_existing_data: bool,
    pub sub_id: Option<SubResourceId>,
    pub dirty: bool,
    pub errors: FieldErrors,
    pub banner: Option<String>,
    pub saving: bool,
}

impl SectionView {
    /// The label of the section's primary action.
    pub fn action_label(&self) -> &'static str {
        match (self.has_existing_data, self.kind.is_last()) {
            (false, _) => "Save",
            (true, true) => "Finish",
            (true, false) => "Update",
        }
    }
}

impl fmt::Display for SectionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", StepLabel(self.kind), self.status.with_icon())?;
        writeln!(f)?;

        match &self.sub_id {
            Some(id) if self.has_existing_data => writeln!(f, "- **Record**: saved ({id})")?,
            _ => writeln!(f, "- **Record**: not saved yet")?,
        }
        writeln!(
            f,
            "- **Unsaved changes**: {}",
            if self.dirty { "yes" } else { "no" }
        )?;
        if self.saving {
            writeln!(f, "- **Saving**: in progress")?;
        }
        writeln!(f, "- **Action**: {}", self.action_label())?;

        if let Some(banner) = &self.banner {
            writeln!(f)?;
            writeln!(f, "> **Error:** {banner}")?;
        }

        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Field errors")?;
            writeln!(f)?;
            for (path, message) in self.errors.iter() {
                writeln!(f, "- `{path}`: {message}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "## Data")?;
        writeln!(f)?;
        writeln!(f, "```json")?;
        let pretty = serde_json::to_string_pretty(&self.working).map_err(|_| fmt::Error)?;
        writeln!(f, "{pretty}")?;
        writeln!(f, "```")
    }
}

//! The step selector.

use std::fmt;

use serde::Serialize;

use super::StepLabel;
use crate::{
    models::{DraftId, SectionKind},
    steps::StepStatus,
};

/// One step's row in the selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRow {
    pub kind: SectionKind,
    pub status: StepStatus,
    pub completed: bool,
    /// The section has a persisted sub-resource
    pub has_existing_data: bool,
    /// Persisted, with local edits not yet saved
    pub dirty: bool,
}

/// Status of all eight steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOverview {
    pub draft_id: Option<DraftId>,
    pub rows: Vec<StepRow>,
    pub finalized: bool,
}

impl StepOverview {
    pub fn completed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.completed)
            .count()
    }

    pub fn active(&self) -> Option<SectionKind> {
        self.rows
            .iter()
            .find(|row| row.status == StepStatus::Active)
            .map(|row| row.kind)
    }
}

impl fmt::Display for StepOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Property listing ({}/{})",
            self.completed_count(),
            self.rows.len()
        )?;
        writeln!(f)?;
        match &self.draft_id {
            Some(id) => writeln!(f, "- **Draft**: {id}")?,
            None => writeln!(f, "- **Draft**: not created yet")?,
        }
        if self.finalized {
            writeln!(f, "- **State**: finalized")?;
        } else if let Some(kind) = self.active() {
            writeln!(f, "- **Current**: {}", StepLabel(kind))?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(
                f,
                "{}. {} ({})",
                row.kind.index() + 1,
                row.kind.title(),
                row.status.with_icon()
            )?;
            if row.dirty {
                write!(f, " *unsaved changes*")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Outcomes of saving and moving between steps.

use std::fmt;

use serde::Serialize;

use super::StepLabel;
use crate::{
    models::{DraftId, SectionKind},
    steps::Navigation,
};

/// What happened when a section was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReceipt {
    pub kind: SectionKind,
    /// First save of the section rather than an update
    pub created: bool,
    pub draft_id: DraftId,
    /// Confirmation text from the server, if any
    pub message: Option<String>,
    /// Set when the saved section was the active step
    #[serde(skip)]
    pub navigation: Option<Navigation>,
    /// The follow-up fetch of the aggregate succeeded
    pub refreshed: bool,
    pub finalized: bool,
}

impl fmt::Display for SaveReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.created { "Created" } else { "Updated" };
        writeln!(f, "{verb} {} for draft {}", self.kind.title(), self.draft_id)?;
        if let Some(message) = &self.message {
            writeln!(f)?;
            writeln!(f, "> {message}")?;
        }

        if self.finalized {
            writeln!(f)?;
            writeln!(f, "All steps are complete. The listing is finished.")?;
        } else if let Some(navigation) = &self.navigation {
            writeln!(f)?;
            writeln!(f, "{navigation}")?;
        }

        if !self.refreshed && !self.finalized {
            writeln!(f)?;
            writeln!(f, "*Could not refresh the draft; showing local data.*")?;
        }
        Ok(())
    }
}

fn label(step: usize) -> String {
    match SectionKind::from_index(step) {
        Some(kind) => StepLabel(kind).to_string(),
        None => format!("Step {}", step + 1),
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Navigation::Moved { to, .. } => write!(f, "Moved to {}", label(*to)),
            Navigation::Stayed(step) => write!(f, "Staying on {}", label(*step)),
            Navigation::Blocked {
                requested, reason, ..
            } => write!(f, "Cannot open {}: {reason}", label(*requested)),
        }
    }
}

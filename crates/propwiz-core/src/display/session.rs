//! Display for the persisted session pointer.

use std::fmt;

use super::{LocalDateTime, StepLabel};
use crate::{models::SectionKind, session::StoredSession};

impl fmt::Display for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Unfinished listing")?;
        writeln!(f)?;
        writeln!(f, "- **Draft**: {}", self.draft_id)?;
        match SectionKind::from_index(self.active_step) {
            Some(kind) => writeln!(f, "- **Last step**: {}", StepLabel(kind))?,
            None => writeln!(f, "- **Last step**: unknown ({})", self.active_step)?,
        }
        writeln!(f, "- **Updated**: {}", LocalDateTime(&self.updated_at))
    }
}

//! Markdown views of wizard state.
//!
//! The orchestrator never formats anything itself. It hands out plain view
//! structs that own a snapshot of the state they describe, and each view
//! implements `Display` as markdown so the same output works on a terminal
//! (through a markdown renderer) and in plain logs.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │     Wizard      │    │   View structs  │    │    Markdown     │
//! │ (steps, drafts) │───▶│ (owned snapshot)│───▶│     output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`overview`]: The step selector, one row per step ([`StepOverview`])
//! - [`section`]: One section's working copy, errors and banner ([`SectionView`])
//! - [`receipt`]: The outcome of a save ([`SaveReceipt`]) and of navigation
//! - [`session`]: The persisted session pointer
//! - [`status`]: One-line confirmations ([`OperationStatus`])
//! - [`datetime`]: Timestamps in the system time zone
//!
//! Step numbers are shown 1-based; everywhere else in the crate steps are
//! 0-based indices.
//!
//! ## Usage
//!
//! ```rust
//! use propwiz_core::display::OperationStatus;
//!
//! let cleared = OperationStatus::success("Session pointer cleared".to_string());
//! assert!(cleared.to_string().starts_with("Success:"));
//! ```

pub mod datetime;
pub mod overview;
pub mod receipt;
pub mod section;
pub mod session;
pub mod status;

pub use datetime::LocalDateTime;
pub use overview::{StepOverview, StepRow};
pub use receipt::SaveReceipt;
pub use section::SectionView;
pub use status::OperationStatus;

use crate::models::SectionKind;

/// `Step 3: Property Details`
pub(crate) struct StepLabel(pub SectionKind);

impl std::fmt::Display for StepLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {}: {}", self.0.index() + 1, self.0.title())
    }
}

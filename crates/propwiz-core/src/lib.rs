//! Core library for the property listing wizard.
//!
//! A property listing is built in eight steps, each editing one section of
//! a server-side aggregate. This crate keeps a local working copy of every
//! section, decides when a section has real changes, routes saves to create
//! or update endpoints, folds server validation errors back onto fields,
//! gates navigation between steps, and remembers the unfinished draft so it
//! can be resumed.
//!
//! # Architecture
//!
//! - [`wizard`]: The orchestrator ([`Wizard`]) and its builder
//! - [`store`]: One working copy and snapshot per section ([`SectionDraft`])
//! - [`steps`]: The step navigation state machine ([`StepController`])
//! - [`changes`] and [`normalize`]: Meaningful-change detection
//! - [`gateway`]: The persistence seam, with HTTP and in-memory gateways
//! - [`session`]: The durable pointer to the active unfinished draft
//! - [`display`]: Markdown views of all of the above
//!
//! # Quick Start
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
//!     .with_session_path(Some("session.db"))
//!     .build()
//!     .await?;
//!
//! wizard.edit(SectionKind::GeneralDetails, "building_name", json!("The Mill"))?;
//! wizard.edit(SectionKind::GeneralDetails, "property_type", json!("Office"))?;
//! let receipt = wizard.save_section(SectionKind::GeneralDetails).await?;
//! println!("{receipt}");
//! println!("{}", wizard.overview());
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod display;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod mailbox;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod session;
pub mod steps;
pub mod store;
pub mod validation;
pub mod wizard;

// Re-export commonly used types
pub use display::{LocalDateTime, OperationStatus, SaveReceipt, SectionView, StepOverview};
pub use error::{Result, WizardError};
pub use fields::FieldPath;
pub use gateway::{PersistenceGateway, SaveOutcome};
pub use models::{DraftId, PropertyDraft, SectionKind, SubResourceId, STEP_COUNT};
pub use session::{SessionStore, StoredSession, WizardSession};
pub use steps::{Navigation, StepController, StepStatus};
pub use store::SectionDraft;
pub use validation::FieldErrors;
pub use wizard::{FetchTicket, PendingSave, SaveMode, Wizard, WizardBuilder};

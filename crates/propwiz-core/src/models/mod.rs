//! Data models for the property draft aggregate.
//!
//! A [`PropertyDraft`] is built incrementally across eight sections
//! ([`SectionKind`]). Each section is persisted independently as a sub-record
//! of the aggregate, identified by a [`SubResourceId`] once it has been saved
//! at least once; the aggregate itself is identified by a [`DraftId`] minted
//! by the first save.
//!
//! Section contents are kept as JSON objects: they are form state addressed
//! by field path, and the remote API speaks JSON. Their shape is described by
//! [`crate::schema::SectionSchema`].

pub mod draft;
pub mod ids;
pub mod section;

pub use draft::{PropertyDraft, SectionRecord};
pub use ids::{DraftId, SubResourceId};
pub use section::{SectionKind, SubResourceStyle, STEP_COUNT};

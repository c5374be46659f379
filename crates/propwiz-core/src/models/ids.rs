//! Server-issued identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WizardError};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wraps a server-issued id, rejecting blank values.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(WizardError::invalid_input($field).with_reason("id must not be empty"));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = WizardError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = WizardError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of the property draft aggregate.
    DraftId,
    "draft_id"
);

opaque_id!(
    /// Identifier of a section's sub-record.
    SubResourceId,
    "sub_resource_id"
);

impl From<&DraftId> for SubResourceId {
    /// Inline sections are addressed by the aggregate id.
    fn from(id: &DraftId) -> Self {
        SubResourceId(id.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_ids_are_rejected() {
        assert!(DraftId::new("").is_err());
        assert!(DraftId::new("   ").is_err());
        assert!(SubResourceId::new("\t").is_err());
    }

    #[test]
    fn test_ids_are_trimmed() {
        let id = DraftId::new(" 65f1c0ffee ").unwrap();
        assert_eq!(id.as_str(), "65f1c0ffee");
        assert_eq!(id.to_string(), "65f1c0ffee");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id: DraftId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        assert!(serde_json::from_str::<DraftId>("\"\"").is_err());
    }
}

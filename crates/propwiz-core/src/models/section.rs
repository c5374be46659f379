//! The eight independently-persisted sections of a property draft.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of wizard steps, one per section.
pub const STEP_COUNT: usize = 8;

/// Type-safe enumeration of draft sections, in wizard order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    GeneralDetails,
    BusinessDetails,
    PropertyDetails,
    Location,
    VirtualTours,
    Features,
    Images,
    Documents,
}

/// Where a section's data lives relative to the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubResourceStyle {
    /// Stored on the aggregate record itself; its id is the aggregate id
    Inline,
    /// Stored as a separate record with its own `_id`
    Linked,
}

impl SectionKind {
    /// All sections in step order.
    pub const ALL: [SectionKind; STEP_COUNT] = [
        SectionKind::GeneralDetails,
        SectionKind::BusinessDetails,
        SectionKind::PropertyDetails,
        SectionKind::Location,
        SectionKind::VirtualTours,
        SectionKind::Features,
        SectionKind::Images,
        SectionKind::Documents,
    ];

    /// Zero-based step index of this section.
    pub fn index(self) -> usize {
        match self {
            SectionKind::GeneralDetails => 0,
            SectionKind::BusinessDetails => 1,
            SectionKind::PropertyDetails => 2,
            SectionKind::Location => 3,
            SectionKind::VirtualTours => 4,
            SectionKind::Features => 5,
            SectionKind::Images => 6,
            SectionKind::Documents => 7,
        }
    }

    /// Section for a step index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Command-line slug.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::GeneralDetails => "general",
            SectionKind::BusinessDetails => "business",
            SectionKind::PropertyDetails => "property",
            SectionKind::Location => "location",
            SectionKind::VirtualTours => "virtual-tours",
            SectionKind::Features => "features",
            SectionKind::Images => "images",
            SectionKind::Documents => "documents",
        }
    }

    /// Human-readable step title.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::GeneralDetails => "General Details",
            SectionKind::BusinessDetails => "Business Details",
            SectionKind::PropertyDetails => "Property Details",
            SectionKind::Location => "Location",
            SectionKind::VirtualTours => "Virtual Tours",
            SectionKind::Features => "Features",
            SectionKind::Images => "Images",
            SectionKind::Documents => "Documents",
        }
    }

    /// Key of this section's slice in the aggregate response.
    pub fn aggregate_key(&self) -> &'static str {
        match self {
            SectionKind::GeneralDetails => "general_details",
            SectionKind::BusinessDetails => "business_details",
            SectionKind::PropertyDetails => "property_details",
            SectionKind::Location => "location",
            SectionKind::VirtualTours => "virtual_tours",
            SectionKind::Features => "features",
            SectionKind::Images => "images",
            SectionKind::Documents => "documents",
        }
    }

    /// List field a bare-array aggregate slice is wrapped under.
    pub fn list_field(&self) -> Option<&'static str> {
        match self {
            SectionKind::VirtualTours => Some("virtual_tours"),
            SectionKind::Images => Some("images"),
            SectionKind::Documents => Some("documents"),
            _ => None,
        }
    }

    pub fn style(&self) -> SubResourceStyle {
        match self {
            SectionKind::GeneralDetails | SectionKind::PropertyDetails => SubResourceStyle::Inline,
            _ => SubResourceStyle::Linked,
        }
    }

    /// Whether saving this section requires an existing aggregate id.
    ///
    /// Only general details may mint the aggregate.
    pub fn requires_draft(&self) -> bool {
        *self != SectionKind::GeneralDetails
    }

    /// Whether this is the final wizard step.
    pub fn is_last(&self) -> bool {
        self.index() == STEP_COUNT - 1
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "general" | "general-details" => Ok(SectionKind::GeneralDetails),
            "business" | "business-details" => Ok(SectionKind::BusinessDetails),
            "property" | "property-details" => Ok(SectionKind::PropertyDetails),
            "location" => Ok(SectionKind::Location),
            "virtual-tours" | "tours" => Ok(SectionKind::VirtualTours),
            "features" => Ok(SectionKind::Features),
            "images" => Ok(SectionKind::Images),
            "documents" => Ok(SectionKind::Documents),
            _ => Err(format!("Invalid section: {s}")),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trips_through_all() {
        for (position, kind) in SectionKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
            assert_eq!(SectionKind::from_index(position), Some(*kind));
        }
        assert_eq!(SectionKind::from_index(STEP_COUNT), None);
    }

    #[test]
    fn test_from_str_accepts_slugs_and_aliases() {
        assert_eq!("general".parse(), Ok(SectionKind::GeneralDetails));
        assert_eq!("Business_Details".parse(), Ok(SectionKind::BusinessDetails));
        assert_eq!("virtual-tours".parse(), Ok(SectionKind::VirtualTours));
        assert_eq!("TOURS".parse(), Ok(SectionKind::VirtualTours));
        assert!("garden".parse::<SectionKind>().is_err());
    }

    #[test]
    fn test_only_general_details_may_mint_the_draft() {
        let independent: Vec<_> = SectionKind::ALL
            .iter()
            .filter(|kind| !kind.requires_draft())
            .collect();
        assert_eq!(independent, vec![&SectionKind::GeneralDetails]);
    }

    #[test]
    fn test_inline_sections() {
        assert_eq!(SectionKind::GeneralDetails.style(), SubResourceStyle::Inline);
        assert_eq!(SectionKind::PropertyDetails.style(), SubResourceStyle::Inline);
        assert_eq!(SectionKind::Location.style(), SubResourceStyle::Linked);
    }
}

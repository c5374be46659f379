//! Per-section field layouts.
//!
//! One [`SectionSchema`] per section lists the comparable field paths used for
//! dirty-checking, the paths that must be filled before a save is attempted,
//! and yields the empty defaults a form starts from.

use serde_json::{Map, Value};

use crate::{
    fields::{FieldPath, Segment},
    models::SectionKind,
    normalize::{normalize, Canonical},
    validation::FieldErrors,
};

/// Field layout of one section.
#[derive(Debug)]
pub struct SectionSchema {
    pub kind: SectionKind,
    fields: &'static [&'static str],
    required: &'static [&'static str],
}

static SCHEMAS: [SectionSchema; 8] = [
    SectionSchema {
        kind: SectionKind::GeneralDetails,
        fields: &[
            "building_name",
            "property_type",
            "property_sub_type",
            "tenure",
            "size_sq_ft",
            "floors",
            "year_built",
            "summary",
        ],
        required: &["building_name", "property_type"],
    },
    SectionSchema {
        kind: SectionKind::BusinessDetails,
        fields: &[
            "business_rates.rateable_value",
            "business_rates.rates_payable",
            "descriptions.short",
            "descriptions.long",
            "sale_types[].sale_type",
            "sale_types[].price_value",
            "sale_types[].price_qualifier",
            "sale_types[].vat_applicable",
        ],
        required: &["sale_types[].sale_type", "sale_types[].price_value"],
    },
    SectionSchema {
        kind: SectionKind::PropertyDetails,
        fields: &[
            "epc.rating",
            "epc.score",
            "epc.expiry_date",
            "council_tax.band",
            "rateable_value",
            "planning.use_class",
            "planning.listed_building",
            "planning.conservation_area",
        ],
        required: &[],
    },
    SectionSchema {
        kind: SectionKind::Location,
        fields: &[
            "coordinates.latitude",
            "coordinates.longitude",
            "address_details.address_line_1",
            "address_details.address_line_2",
            "address_details.town",
            "address_details.county",
            "address_details.postcode",
            "address_details.country",
            "map_settings.zoom",
            "map_settings.show_exact_location",
            "geocoding_info.place_id",
            "geocoding_info.formatted_address",
        ],
        required: &[
            "coordinates.latitude",
            "coordinates.longitude",
            "address_details.postcode",
        ],
    },
    SectionSchema {
        kind: SectionKind::VirtualTours,
        fields: &[
            "virtual_tours[].title",
            "virtual_tours[].url",
            "virtual_tours[].provider",
        ],
        required: &["virtual_tours[].url"],
    },
    SectionSchema {
        kind: SectionKind::Features,
        fields: &["features[]", "additional_features[]", "feature_notes"],
        required: &[],
    },
    SectionSchema {
        kind: SectionKind::Images,
        fields: &[
            "images[].file_name",
            "images[].file_path",
            "images[].caption",
            "images[].is_primary",
        ],
        required: &["images[].file_name"],
    },
    SectionSchema {
        kind: SectionKind::Documents,
        fields: &[
            "documents[].document_type",
            "documents[].file_name",
            "documents[].file_path",
        ],
        required: &["documents[].document_type", "documents[].file_name"],
    },
];

impl SectionSchema {
    /// The schema for a section.
    pub fn of(kind: SectionKind) -> &'static SectionSchema {
        &SCHEMAS[kind.index()]
    }

    /// Comparable field paths, in declaration order.
    pub fn field_paths(&self) -> Vec<FieldPath> {
        parse_all(self.fields)
    }

    pub fn required_paths(&self) -> Vec<FieldPath> {
        parse_all(self.required)
    }

    /// Empty form state: blank leaves, empty lists.
    pub fn defaults(&self) -> Value {
        let mut root = Map::new();
        for path in self.field_paths() {
            let keys: Vec<&str> = path
                .segments()
                .iter()
                .map_while(|segment| match segment {
                    Segment::Key(key) => Some(key.as_str()),
                    _ => None,
                })
                .collect();
            let is_list = keys.len() < path.segments().len();
            insert_default(&mut root, &keys, is_list);
        }
        Value::Object(root)
    }

    /// Field errors for every required location left blank.
    ///
    /// A required path through a list also requires the list to hold at
    /// least one entry.
    pub fn missing_required(&self, working: &Value) -> FieldErrors {
        let mut errors = FieldErrors::default();
        for path in self.required_paths() {
            collect_missing(path.segments(), Some(working), String::new(), &mut errors);
        }
        errors
    }
}

fn insert_default(node: &mut Map<String, Value>, keys: &[&str], is_list: bool) {
    let Some((first, rest)) = keys.split_first() else {
        return;
    };
    if rest.is_empty() {
        node.entry(first.to_string()).or_insert_with(|| {
            if is_list {
                Value::Array(Vec::new())
            } else {
                Value::String(String::new())
            }
        });
        return;
    }
    let child = node
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(inner) = child {
        insert_default(inner, rest, is_list);
    }
}

fn parse_all(raw: &[&str]) -> Vec<FieldPath> {
    raw.iter().filter_map(|path| path.parse().ok()).collect()
}

fn collect_missing(segments: &[Segment], value: Option<&Value>, prefix: String, errors: &mut FieldErrors) {
    let Some((segment, rest)) = segments.split_first() else {
        if normalize(value) == Canonical::Empty {
            errors.insert(&prefix, format!("{} is required", label(&prefix)));
        }
        return;
    };

    match segment {
        Segment::Key(key) => {
            let child = value.and_then(|v| v.get(key));
            collect_missing(rest, child, join(&prefix, key), errors);
        }
        Segment::Index(index) => {
            let child = value.and_then(|v| v.get(*index));
            collect_missing(rest, child, join(&prefix, &index.to_string()), errors);
        }
        Segment::Each => match value.and_then(Value::as_array) {
            Some(items) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    collect_missing(rest, Some(item), join(&prefix, &index.to_string()), errors);
                }
            }
            _ => {
                if errors.get(&prefix).is_none() {
                    errors.insert(&prefix, "At least one entry is required");
                }
            }
        },
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// `sale_types.0.price_value` becomes `Price value`.
fn label(path: &str) -> String {
    let last = path
        .rsplit('.')
        .find(|part| !part.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(path);
    let spaced = last.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

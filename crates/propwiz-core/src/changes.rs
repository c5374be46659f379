//! Dirty-checking of a section working copy against its persisted snapshot.

use serde_json::Value;

use crate::{
    fields::{FieldPath, Segment},
    models::SectionKind,
    normalize::normalize,
    schema::SectionSchema,
};

/// Compares working copies against snapshots over one section's field paths.
///
/// Every comparable leaf is normalized before comparison, repeated lists are
/// walked position-for-position, and a list length difference is a change on
/// its own. Element order matters.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    kind: SectionKind,
    paths: Vec<FieldPath>,
}

impl ChangeDetector {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            paths: SectionSchema::of(kind).field_paths(),
        }
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// True on the first comparable field that differs.
    pub fn has_changes(&self, current: &Value, original: &Value) -> bool {
        self.first_change(current, original).is_some()
    }

    /// The dot path of the first differing field, in schema order.
    pub fn first_change(&self, current: &Value, original: &Value) -> Option<String> {
        self.paths.iter().find_map(|path| {
            first_difference(path.segments(), Some(current), Some(original), String::new())
        })
    }
}

/// Convenience wrapper over [`ChangeDetector::has_changes`].
pub fn has_changes(kind: SectionKind, current: &Value, original: &Value) -> bool {
    ChangeDetector::new(kind).has_changes(current, original)
}

fn first_difference(
    segments: &[Segment],
    current: Option<&Value>,
    original: Option<&Value>,
    at: String,
) -> Option<String> {
    let Some((segment, rest)) = segments.split_first() else {
        return (normalize(current) != normalize(original)).then_some(at);
    };

    match segment {
        Segment::Key(key) => first_difference(
            rest,
            current.and_then(|v| v.get(key)),
            original.and_then(|v| v.get(key)),
            child(&at, key),
        ),
        Segment::Index(index) => first_difference(
            rest,
            current.and_then(|v| v.get(*index)),
            original.and_then(|v| v.get(*index)),
            child(&at, &index.to_string()),
        ),
        Segment::Each => {
            let current = items(current);
            let original = items(original);
            if current.len() != original.len() {
                return Some(at);
            }
            current
                .iter()
                .zip(original)
                .enumerate()
                .find_map(|(index, (cur, orig))| {
                    first_difference(rest, Some(cur), Some(orig), child(&at, &index.to_string()))
                })
        }
    }
}

/// Elements of a list value; anything that is not a list counts as empty.
fn items(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}

fn child(at: &str, segment: &str) -> String {
    if at.is_empty() {
        segment.to_string()
    } else {
        format!("{at}.{segment}")
    }
}

//! Field paths into section working copies.
//!
//! Paths use dot notation (`address_details.postcode`), numeric segments for
//! list positions (`sale_types.1.price_value`, or `sale_types[1].price_value`
//! in bracket form), and `[]` for "every element" (`sale_types[].price_value`)
//! in schema paths.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use crate::error::{Result, WizardError};

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member
    Key(String),
    /// List position
    Index(usize),
    /// Every list element
    Each,
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the path addresses one concrete location.
    pub fn is_concrete(&self) -> bool {
        !self.segments.contains(&Segment::Each)
    }

    /// Canonical dot form, the key used for field errors.
    pub fn to_dot(&self) -> String {
        self.to_string()
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Looks up the value at a concrete path.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| step(current, segment))
    }

    /// Writes `new` at this path, creating intermediate objects and lists.
    ///
    /// A list position may address an existing element or the slot just past
    /// the end (which appends). The whole path is checked before anything is
    /// written, so a rejected path leaves `root` untouched.
    pub fn set(&self, root: &mut Value, new: Value) -> Result<()> {
        self.check_writable(root)?;
        let target = self.slot(root)?;
        *target = new;
        Ok(())
    }

    /// Appends `item` to the list at this path, creating the list if absent.
    pub fn push(&self, root: &mut Value, item: Value) -> Result<usize> {
        self.check_writable(root)?;
        match self.get(root) {
            None | Some(Value::Null) | Some(Value::Array(_)) => {}
            Some(_) => return Err(WizardError::field_path(self.to_string(), "not a list")),
        }

        let target = self.slot(root)?;
        if target.is_null() {
            *target = Value::Array(Vec::new());
        }
        match target {
            Value::Array(items) => {
                items.push(item);
                Ok(items.len() - 1)
            }
            _ => Err(WizardError::field_path(self.to_string(), "not a list")),
        }
    }

    /// Removes and returns the element at `index` of the list at this path.
    pub fn remove(&self, root: &mut Value, index: usize) -> Result<Value> {
        match self.get(root) {
            Some(Value::Array(items)) if index < items.len() => {}
            Some(Value::Array(items)) => {
                return Err(WizardError::field_path(
                    self.to_string(),
                    format!("index {index} out of range for list of {}", items.len()),
                ))
            }
            _ => return Err(WizardError::field_path(self.to_string(), "not a list")),
        }

        match self.slot(root)? {
            Value::Array(items) => Ok(items.remove(index)),
            _ => Err(WizardError::field_path(self.to_string(), "not a list")),
        }
    }

    /// Walks the path read-only and reports the first segment `slot` would
    /// refuse. Absent and null locations count as materializable.
    fn check_writable(&self, root: &Value) -> Result<()> {
        let mut current = Some(root);
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Each, _) => {
                    return Err(WizardError::field_path(
                        self.to_string(),
                        "wildcard paths cannot be written",
                    ))
                }
                (Segment::Key(_), None | Some(Value::Null)) => None,
                (Segment::Key(key), Some(Value::Object(fields))) => fields.get(key),
                (Segment::Key(key), Some(_)) => {
                    return Err(WizardError::field_path(
                        self.to_string(),
                        format!("'{key}' is not inside an object"),
                    ))
                }
                (Segment::Index(0), None | Some(Value::Null)) => None,
                (Segment::Index(index), None | Some(Value::Null)) => {
                    return Err(WizardError::field_path(
                        self.to_string(),
                        format!("index {index} out of range for list of 0"),
                    ))
                }
                (Segment::Index(index), Some(Value::Array(items))) => {
                    if *index > items.len() {
                        return Err(WizardError::field_path(
                            self.to_string(),
                            format!("index {index} out of range for list of {}", items.len()),
                        ));
                    }
                    items.get(*index)
                }
                (Segment::Index(index), Some(Value::Object(fields))) => {
                    fields.get(&index.to_string())
                }
                (Segment::Index(index), Some(_)) => {
                    return Err(WizardError::field_path(
                        self.to_string(),
                        format!("position {index} is not inside a list"),
                    ))
                }
            };
        }
        Ok(())
    }

    /// Mutable access to the location at this path, materializing it.
    fn slot<'a>(&self, root: &'a mut Value) -> Result<&'a mut Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => {
                    if current.is_null() {
                        *current = Value::Object(Map::new());
                    }
                    match current {
                        Value::Object(fields) => fields.entry(key.clone()).or_insert(Value::Null),
                        _ => {
                            return Err(WizardError::field_path(
                                self.to_string(),
                                format!("'{key}' is not inside an object"),
                            ))
                        }
                    }
                }
                Segment::Index(index) => {
                    if current.is_null() {
                        *current = Value::Array(Vec::new());
                    }
                    match current {
                        Value::Array(items) => {
                            if *index == items.len() {
                                items.push(Value::Null);
                            } else if *index > items.len() {
                                return Err(WizardError::field_path(
                                    self.to_string(),
                                    format!(
                                        "index {index} out of range for list of {}",
                                        items.len()
                                    ),
                                ));
                            }
                            &mut items[*index]
                        }
                        Value::Object(fields) => {
                            fields.entry(index.to_string()).or_insert(Value::Null)
                        }
                        _ => {
                            return Err(WizardError::field_path(
                                self.to_string(),
                                format!("position {index} is not inside a list"),
                            ))
                        }
                    }
                }
                Segment::Each => {
                    return Err(WizardError::field_path(
                        self.to_string(),
                        "wildcard paths cannot be written",
                    ))
                }
            };
        }
        Ok(current)
    }
}

fn step<'a>(current: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (segment, current) {
        (Segment::Key(key), Value::Object(fields)) => fields.get(key),
        (Segment::Index(index), Value::Array(items)) => items.get(*index),
        (Segment::Index(index), Value::Object(fields)) => fields.get(&index.to_string()),
        _ => None,
    }
}

impl FromStr for FieldPath {
    type Err = WizardError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WizardError::field_path(raw, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in normalize_path(trimmed).split('.') {
            let segment = match part {
                "" => return Err(WizardError::field_path(raw, "empty segment")),
                "[]" => Segment::Each,
                digits if digits.bytes().all(|b| b.is_ascii_digit()) => {
                    Segment::Index(digits.parse().map_err(|_| {
                        WizardError::field_path(raw, format!("position '{digits}' is too large"))
                    })?)
                }
                key if key.contains('[') || key.contains(']') => {
                    return Err(WizardError::field_path(raw, "unbalanced brackets"))
                }
                key => Segment::Key(key.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Each => write!(f, "[]")?,
                other => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    match other {
                        Segment::Key(key) => write!(f, "{key}")?,
                        Segment::Index(index) => write!(f, "{index}")?,
                        Segment::Each => {}
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rewrites bracket list positions to dot form: `a[0].c` becomes `a.0.c`.
///
/// Wildcards (`a[].c`) are kept as a `[]` segment: `a.[].c`.
pub fn normalize_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '[' => {
                let mut inner = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    out.push('[');
                    out.push_str(&inner);
                    continue;
                }
                if !out.is_empty() && !out.ends_with('.') {
                    out.push('.');
                }
                if inner.trim().is_empty() {
                    out.push_str("[]");
                } else {
                    out.push_str(inner.trim());
                }
                if chars.peek().is_some_and(|next| *next != '.') {
                    out.push('.');
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Rewrites numeric dot segments to bracket form: `a.0.c` becomes `a[0].c`.
pub fn bracket_path(dot: &str) -> String {
    let mut out = String::with_capacity(dot.len() + 4);
    for part in dot.split('.') {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) && !out.is_empty() {
            out.push('[');
            out.push_str(part);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(part);
        }
    }
    out
}

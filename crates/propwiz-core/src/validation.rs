//! Backend validation errors mapped onto section fields.
//!
//! A failed save reports a list of `{ path, msg }` pairs whose paths may use
//! either dot (`sale_types.1.price_value`) or bracket
//! (`sale_types[1].price_value`) notation. [`map_errors`] folds both into one
//! dot-path keyed [`FieldErrors`], so fields never need to know which
//! convention the backend used.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::fields::{bracket_path, normalize_path};

/// One entry of a backend error list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFieldError {
    #[serde(default, alias = "param", alias = "field")]
    pub path: Option<String>,
    #[serde(alias = "message")]
    pub msg: String,
}

impl ApiFieldError {
    pub fn new(path: Option<&str>, msg: impl Into<String>) -> Self {
        Self {
            path: path.map(String::from),
            msg: msg.into(),
        }
    }
}

/// Result of mapping an error list: inline field messages plus an optional
/// banner for errors that name no field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedErrors {
    pub fields: FieldErrors,
    pub banner: Option<String>,
}

/// Field messages keyed by canonical dot path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Records a message, normalizing the path to dot form. The first
    /// message recorded for a path wins.
    pub fn insert(&mut self, path: &str, message: impl Into<String>) {
        self.0
            .entry(normalize_path(path.trim()))
            .or_insert_with(|| message.into());
    }

    /// Looks up the message for a field: exact dot path first, then the
    /// bracket-equivalent.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0
            .get(path)
            .or_else(|| self.0.get(&normalize_path(path)))
            .or_else(|| self.0.get(&bracket_path(path)))
            .map(String::as_str)
    }

    /// Clears the message for a field and for anything beneath it.
    ///
    /// Returns the number of messages removed.
    pub fn clear_path(&mut self, path: &str) -> usize {
        let dot = normalize_path(path);
        let nested = format!("{dot}.");
        let before = self.0.len();
        self.0.retain(|key, _| key != &dot && !key.starts_with(&nested));
        before - self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(path, msg)| (path.as_str(), msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{path}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Maps a backend error list into field messages and a banner.
///
/// Entries without a path are general errors: they flag no field and are
/// joined into the banner instead.
pub fn map_errors(errors: &[ApiFieldError]) -> MappedErrors {
    let mut mapped = MappedErrors::default();
    let mut general = Vec::new();

    for error in errors {
        match error.path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => mapped.fields.insert(path, error.msg.clone()),
            _ => general.push(error.msg.clone()),
        }
    }

    if !general.is_empty() {
        mapped.banner = Some(general.join(" "));
    }
    mapped
}

//! Field masks for partial updates
//!
//! A [`FieldMask`] lists the field paths a caller intends to modify. A
//! [`Schema`] declares which paths an entity accepts. The same validator
//! serves every update flow in the crate (budgets, expenses, settings).
//!
//! An empty mask selects every field: callers get full-replace semantics by
//! sending no mask at all.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Set of dotted field paths selected for an update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMask {
    paths: Vec<String>,
}

impl FieldMask {
    /// Build a mask from paths; blanks are dropped and duplicates collapsed
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::default();
        for path in paths {
            let path = path.as_ref().trim();
            if !path.is_empty() && !mask.paths.iter().any(|p| p == path) {
                mask.paths.push(path.to_string());
            }
        }
        mask
    }

    /// The empty mask, selecting all fields
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Whether `path` is selected (always true for an empty mask)
    pub fn contains(&self, path: &str) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| p == path)
    }

    /// Replace every explicit child of `prefix` (`prefix.x`, `prefix.y.z`)
    /// with the bare `prefix`, for whole-object replacement
    ///
    /// Must run before [`Schema::validate`] when the caller wants the nested
    /// object replaced rather than patched.
    pub fn collapse_prefix(&mut self, prefix: &str) {
        let child_prefix = format!("{}.", prefix);
        let Some(first) = self
            .paths
            .iter()
            .position(|p| p.starts_with(&child_prefix))
        else {
            return;
        };

        let had_bare = self.paths.iter().any(|p| p == prefix);
        let mut collapsed = Vec::with_capacity(self.paths.len());
        for (i, path) in self.paths.drain(..).enumerate() {
            if i == first && !had_bare {
                collapsed.push(prefix.to_string());
            } else if !path.starts_with(&child_prefix) {
                collapsed.push(path);
            }
        }
        self.paths = collapsed;
    }
}

impl<S: AsRef<str>> FromIterator<S> for FieldMask {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Option<Vec<String>>> for FieldMask {
    fn from(paths: Option<Vec<String>>) -> Self {
        paths.map(Self::new).unwrap_or_default()
    }
}

/// One update-eligible field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// When selected, the field must carry a usable value
    pub required: bool,
    /// Documentation only
    pub description: &'static str,
}

impl Field {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: false,
            description,
        }
    }
}

/// Ordered declaration of the fields an entity accepts in a mask
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    entity: &'static str,
    fields: &'static [Field],
}

impl Schema {
    pub const fn new(entity: &'static str, fields: &'static [Field]) -> Self {
        Self { entity, fields }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn allows(&self, path: &str) -> bool {
        self.field(path).is_some()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.required)
    }

    /// Reject a mask naming any path outside the schema
    ///
    /// Every unknown path is reported, not just the first.
    pub fn validate(&self, mask: &FieldMask) -> LedgerResult<()> {
        let unknown: Vec<&str> = mask
            .paths()
            .iter()
            .map(String::as_str)
            .filter(|p| !self.allows(p))
            .collect();

        if unknown.is_empty() {
            return Ok(());
        }

        let allowed: Vec<&str> = self.fields.iter().map(|f| f.name).collect();
        Err(LedgerError::Validation(format!(
            "unknown fields in {} update mask: {} (allowed: {})",
            self.entity,
            unknown.join(", "),
            allowed.join(", ")
        )))
    }
}

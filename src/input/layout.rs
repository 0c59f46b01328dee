//! Console layouts: which identifiers a macro may use.
//!
//! DESIGN
//! ======
//! A layout maps each identifier to either a plain button or one direction
//! of an axis. The scheduler consults the axis bindings when merging ticks
//! so two sequences never push opposite directions of one axis at once.
//! Layouts come from a named preset or a JSON file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::parse::WAIT_TOKEN;
use super::types::ButtonId;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Negative,
    Positive,
}

/// What an identifier drives on the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Binding {
    Button,
    Axis { axis: String, direction: Direction },
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown console preset: {0}")]
    UnknownPreset(String),
    #[error("invalid input name '{0}'")]
    InvalidName(String),
    #[error("'{0}' is reserved")]
    ReservedName(String),
    #[error("layout has no inputs")]
    Empty,
    #[error("failed to read layout {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("layout parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk layout format.
#[derive(Debug, Deserialize)]
struct LayoutFile {
    name: String,
    bindings: BTreeMap<String, Binding>,
}

#[derive(Debug, Clone)]
pub struct ConsoleLayout {
    name: String,
    bindings: BTreeMap<ButtonId, Binding>,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl ConsoleLayout {
    /// Build a layout, rejecting names the macro grammar could not express.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for an empty table, the reserved `wait` name,
    /// or names containing whitespace, `:` or `+`.
    pub fn new<'a>(
        name: impl Into<String>,
        bindings: impl IntoIterator<Item = (&'a str, Binding)>,
    ) -> Result<Self, LayoutError> {
        let mut table = BTreeMap::new();
        for (raw, binding) in bindings {
            let id = ButtonId::new(raw);
            if id.as_str().is_empty() || id.as_str().contains(|c: char| c.is_whitespace() || c == ':' || c == '+') {
                return Err(LayoutError::InvalidName(raw.to_owned()));
            }
            if id.as_str() == WAIT_TOKEN {
                return Err(LayoutError::ReservedName(raw.to_owned()));
            }
            table.insert(id, binding);
        }
        if table.is_empty() {
            return Err(LayoutError::Empty);
        }
        Ok(Self { name: name.into(), bindings: table })
    }

    /// Look up a built-in layout by name (`snes`, `n64`).
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownPreset`] for any other name.
    pub fn preset(name: &str) -> Result<Self, LayoutError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "snes" => Ok(Self::snes()),
            "n64" => Ok(Self::n64()),
            other => Err(LayoutError::UnknownPreset(other.to_owned())),
        }
    }

    /// Parse a layout from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the JSON is malformed or a name is invalid.
    pub fn from_json(raw: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile = serde_json::from_str(raw)?;
        Self::new(file.name, file.bindings.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    /// Read and parse a JSON layout file.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Io`] if the file cannot be read, otherwise as
    /// [`ConsoleLayout::from_json`].
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| LayoutError::Io { path: path.display().to_string(), source })?;
        Self::from_json(&raw)
    }

    /// Super Nintendo: d-pad on two axes, eight face/shoulder buttons.
    #[must_use]
    pub fn snes() -> Self {
        let mut bindings = dpad_axes("dpad_x", "dpad_y", ["left", "right", "up", "down"]);
        bindings.extend(buttons(&["a", "b", "x", "y", "l", "r", "select", "start"]));
        Self::from_static("snes", bindings)
    }

    /// Nintendo 64: analog stick on two axes, d-pad and C buttons as buttons.
    #[must_use]
    pub fn n64() -> Self {
        let mut bindings = dpad_axes("stick_x", "stick_y", ["left", "right", "up", "down"]);
        bindings.extend(buttons(&[
            "a", "b", "z", "l", "r", "start", "dleft", "dright", "dup", "ddown", "cleft", "cright", "cup", "cdown",
        ]));
        Self::from_static("n64", bindings)
    }

    fn from_static(name: &str, bindings: Vec<(&'static str, Binding)>) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|(id, binding)| (ButtonId::new(id), binding))
            .collect();
        Self { name: name.to_owned(), bindings }
    }
}

fn dpad_axes(x: &str, y: &str, [left, right, up, down]: [&'static str; 4]) -> Vec<(&'static str, Binding)> {
    let bind = |axis: &str, direction| Binding::Axis { axis: axis.to_owned(), direction };
    vec![
        (left, bind(x, Direction::Negative)),
        (right, bind(x, Direction::Positive)),
        (up, bind(y, Direction::Negative)),
        (down, bind(y, Direction::Positive)),
    ]
}

fn buttons(names: &[&'static str]) -> Vec<(&'static str, Binding)> {
    names.iter().map(|n| (*n, Binding::Button)).collect()
}

// =============================================================================
// LOOKUP
// =============================================================================

impl ConsoleLayout {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive identifier lookup.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<ButtonId> {
        let id = ButtonId::new(raw);
        self.bindings.contains_key(&id).then_some(id)
    }

    #[must_use]
    pub fn binding(&self, id: &ButtonId) -> Option<&Binding> {
        self.bindings.get(id)
    }

    /// All identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &ButtonId> {
        self.bindings.keys()
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;

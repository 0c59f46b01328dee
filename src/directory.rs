//! User directory: permissions and input preferences.
//!
//! DESIGN
//! ======
//! The gateway asks two narrow questions: may this user do X, and what is
//! their default input duration. Each is a trait so the gateway can be tested
//! with static stand-ins. `UserDirectory` answers both from a JSON document;
//! users absent from the document get `default_abilities` and no preference.
//! An entry without an `abilities` key inherits the defaults too, while an
//! explicit empty list denies every ability.
//!
//! ```json
//! {
//!   "default_abilities": ["execute-inputs"],
//!   "users": {
//!     "modname": { "abilities": ["execute-inputs", "stop-all-inputs"] },
//!     "slowpoke": { "default_input_duration_ms": 400 },
//!     "banned": { "abilities": [] }
//!   }
//! }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::UserId;

// =============================================================================
// ABILITIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ability {
    ExecuteInputs,
    StopAllInputs,
}

impl Ability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExecuteInputs => "execute-inputs",
            Self::StopAllInputs => "stop-all-inputs",
        }
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

pub trait Permissions: Send + Sync {
    fn has_ability(&self, user: &UserId, ability: Ability) -> bool;
}

pub trait InputPreferences: Send + Sync {
    /// The user's preferred duration for tokens written without one.
    fn default_input_duration_ms(&self, user: &UserId) -> Option<u32>;
}

// =============================================================================
// DIRECTORY
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read user directory {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid user directory: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UserEntry {
    #[serde(default)]
    abilities: Option<BTreeSet<Ability>>,
    default_input_duration_ms: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDirectory {
    #[serde(default)]
    default_abilities: BTreeSet<Ability>,
    #[serde(default)]
    users: HashMap<UserId, UserEntry>,
}

impl UserDirectory {
    /// Everyone may execute inputs; nobody may stop them.
    #[must_use]
    pub fn open() -> Self {
        Self { default_abilities: BTreeSet::from([Ability::ExecuteInputs]), users: HashMap::new() }
    }

    /// Parse a directory document. User names are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Parse`] if the JSON is malformed.
    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        let parsed: Self = serde_json::from_str(raw)?;
        // EDGE: keys deserialize verbatim; re-key through UserId::new to fold case.
        let users = parsed
            .users
            .into_iter()
            .map(|(name, entry)| (UserId::new(name.as_str()), entry))
            .collect();
        Ok(Self { users, ..parsed })
    }

    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| DirectoryError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl Permissions for UserDirectory {
    fn has_ability(&self, user: &UserId, ability: Ability) -> bool {
        match self.users.get(user).and_then(|e| e.abilities.as_ref()) {
            Some(abilities) => abilities.contains(&ability),
            None => self.default_abilities.contains(&ability),
        }
    }
}

impl InputPreferences for UserDirectory {
    fn default_input_duration_ms(&self, user: &UserId) -> Option<u32> {
        self.users
            .get(user)
            .and_then(|e| e.default_input_duration_ms)
            .filter(|ms| *ms > 0)
    }
}

#[cfg(test)]
#[path = "directory_test.rs"]
mod tests;

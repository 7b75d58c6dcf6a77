use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod catalogue;
mod error;
pub mod registry;
pub mod select;
pub mod welcome;

pub use error::ConfigError;
pub use registry::{AnimationRegistry, Registration};
pub use select::{select_weighted, RandomSource, RngSource, ScriptedSource, WeightedSelector};

/// Thematic category used to bias random selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(String);

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Theme {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One page-transition animation, immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub theme: Theme,
    pub tags: BTreeSet<String>,
    /// Relative likelihood within its theme.
    pub weight: u32,
    pub duration_ms: u64,
    /// Sound effects in trigger order.
    pub sounds: Vec<String>,
    pub cancellable: bool,
}

impl AnimationDefinition {
    pub fn new(
        id: impl Into<String>,
        theme: impl Into<Theme>,
        weight: u32,
        duration_ms: u64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            theme: theme.into(),
            tags: BTreeSet::new(),
            weight,
            duration_ms,
            sounds: Vec::new(),
            cancellable: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_sounds<I, S>(mut self, sounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sounds.extend(sounds.into_iter().map(Into::into));
        self
    }

    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    /// True when any of `tags` is carried by this definition.
    pub fn matches_any<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.tags.contains(t.as_ref()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyId);
        }
        if self.weight == 0 {
            return Err(ConfigError::InvalidWeight {
                id: self.id.clone(),
            });
        }
        if self.duration_ms == 0 {
            return Err(ConfigError::InvalidDuration {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

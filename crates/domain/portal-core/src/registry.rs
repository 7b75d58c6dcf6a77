use std::collections::{BTreeMap, HashMap};

use crate::{catalogue, AnimationDefinition, ConfigError, Theme};

/// Result of a non-fatal [`AnimationRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// An entry with the same id already existed; the new one was dropped.
    DuplicateSkipped,
}

/// Catalogue of animation definitions plus per-theme weight multipliers.
///
/// Lookups are deterministic; randomness lives in [`crate::select`].
#[derive(Debug, Clone)]
pub struct AnimationRegistry {
    entries: Vec<AnimationDefinition>,
    index: HashMap<String, usize>,
    theme_weights: BTreeMap<Theme, u32>,
    primary_theme: Theme,
}

impl AnimationRegistry {
    pub fn new(primary_theme: impl Into<Theme>) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            theme_weights: BTreeMap::new(),
            primary_theme: primary_theme.into(),
        }
    }

    /// Checked seeding path: any invalid or duplicate definition is an error.
    pub fn seeded<I>(primary_theme: impl Into<Theme>, defs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = AnimationDefinition>,
    {
        let mut registry = Self::new(primary_theme);
        for def in defs {
            def.validate()?;
            if registry.index.contains_key(&def.id) {
                return Err(ConfigError::DuplicateId { id: def.id });
            }
            registry.push(def);
        }
        Ok(registry)
    }

    fn push(&mut self, def: AnimationDefinition) {
        self.index.insert(def.id.clone(), self.entries.len());
        self.entries.push(def);
    }

    /// Adds a definition at runtime. Duplicate ids are logged and skipped;
    /// invalid weights or durations are still rejected.
    pub fn register(&mut self, def: AnimationDefinition) -> Result<Registration, ConfigError> {
        def.validate()?;
        if self.index.contains_key(&def.id) {
            tracing::warn!(id = %def.id, "animation already registered, skipping");
            return Ok(Registration::DuplicateSkipped);
        }
        self.push(def);
        Ok(Registration::Added)
    }

    pub fn all(&self) -> &[AnimationDefinition] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AnimationDefinition> {
        self.index.get(id).map(|&ix| &self.entries[ix])
    }

    pub fn by_theme(&self, theme: &Theme) -> Vec<&AnimationDefinition> {
        self.entries.iter().filter(|d| &d.theme == theme).collect()
    }

    /// Entries whose tag set intersects `tags`, in registration order.
    pub fn by_tags<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&AnimationDefinition> {
        self.entries.iter().filter(|d| d.matches_any(tags)).collect()
    }

    /// The route's fixed entry animation, when the catalogue names one.
    pub fn page_animation(&self, route: &str) -> Option<&AnimationDefinition> {
        catalogue::default_animation_for(route).and_then(|id| self.get(id))
    }

    pub fn set_theme_weight(
        &mut self,
        theme: impl Into<Theme>,
        weight: u32,
    ) -> Result<(), ConfigError> {
        let theme = theme.into();
        if weight == 0 {
            return Err(ConfigError::InvalidThemeWeight {
                theme: theme.to_string(),
            });
        }
        self.theme_weights.insert(theme, weight);
        Ok(())
    }

    /// Multiplier for `theme`; themes without an entry count as 1.
    pub fn theme_weight(&self, theme: &Theme) -> u32 {
        self.theme_weights.get(theme).copied().unwrap_or(1)
    }

    pub fn theme_weights(&self) -> &BTreeMap<Theme, u32> {
        &self.theme_weights
    }

    pub fn effective_weight(&self, def: &AnimationDefinition) -> u64 {
        u64::from(self.theme_weight(&def.theme)) * u64::from(def.weight)
    }

    pub fn primary_theme(&self) -> &Theme {
        &self.primary_theme
    }

    pub fn set_primary_theme(&mut self, theme: impl Into<Theme>) {
        self.primary_theme = theme.into();
    }

    /// Distinct themes referenced by registered entries, sorted.
    pub fn themes(&self) -> Vec<&Theme> {
        let mut themes: Vec<&Theme> = self.entries.iter().map(|d| &d.theme).collect();
        themes.sort();
        themes.dedup();
        themes
    }
}

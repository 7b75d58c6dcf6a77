use rand::Rng;

use crate::{AnimationDefinition, AnimationRegistry, Theme};

/// Source of uniform draws in `[0, 1)`. Injected so tests can force outcomes.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

impl RngSource<rand::rngs::StdRng> {
    pub fn seeded(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::StdRng::from_entropy())
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            next: 0,
        }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        v.clamp(0.0, 1.0)
    }
}

/// Single weighted draw over entries whose tags intersect `context_tags`,
/// optionally restricted to one theme. `None` on a selection miss.
pub fn select_weighted<'a, S: AsRef<str>>(
    registry: &'a AnimationRegistry,
    context_tags: &[S],
    theme_filter: Option<&Theme>,
    rng: &mut dyn RandomSource,
) -> Option<&'a AnimationDefinition> {
    let candidates: Vec<&AnimationDefinition> = registry
        .by_tags(context_tags)
        .into_iter()
        .filter(|d| theme_filter.map_or(true, |t| &d.theme == t))
        .collect();
    draw(registry, &candidates, rng)
}

fn draw<'a>(
    registry: &AnimationRegistry,
    candidates: &[&'a AnimationDefinition],
    rng: &mut dyn RandomSource,
) -> Option<&'a AnimationDefinition> {
    let last = candidates.last()?;
    // Widened so any number of u32 x u32 weights sums without overflow.
    let total: u128 = candidates
        .iter()
        .map(|d| u128::from(registry.effective_weight(d)))
        .sum();

    let mut r = rng.next_unit() * total as f64;
    for candidate in candidates {
        r -= registry.effective_weight(candidate) as f64;
        if r <= 0.0 {
            return Some(*candidate);
        }
    }
    // Float rounding can leave a sliver of `r`; the last entry absorbs it.
    Some(*last)
}

/// Owns a random source and layers the fallback policy over [`select_weighted`].
pub struct WeightedSelector {
    rng: Box<dyn RandomSource + Send>,
}

impl WeightedSelector {
    pub fn new(rng: impl RandomSource + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    pub fn from_entropy() -> Self {
        Self::new(RngSource::from_entropy())
    }

    pub fn select_weighted_random<'a, S: AsRef<str>>(
        &mut self,
        registry: &'a AnimationRegistry,
        context_tags: &[S],
        theme_filter: Option<&Theme>,
    ) -> Option<&'a AnimationDefinition> {
        select_weighted(registry, context_tags, theme_filter, self.rng.as_mut())
    }

    /// Weighted draw among every entry of `theme`, ignoring tags.
    pub fn pick_from_theme<'a>(
        &mut self,
        registry: &'a AnimationRegistry,
        theme: &Theme,
    ) -> Option<&'a AnimationDefinition> {
        draw(registry, &registry.by_theme(theme), self.rng.as_mut())
    }

    /// Context pick, then a primary-theme pick, then the first registered entry.
    /// Only an empty registry yields `None`.
    pub fn select_or_fallback<'a, S: AsRef<str>>(
        &mut self,
        registry: &'a AnimationRegistry,
        context_tags: &[S],
        theme_filter: Option<&Theme>,
    ) -> Option<&'a AnimationDefinition> {
        if let Some(def) = self.select_weighted_random(registry, context_tags, theme_filter) {
            return Some(def);
        }
        tracing::debug!(
            tags = ?context_tags.iter().map(|t| t.as_ref()).collect::<Vec<&str>>(),
            "no animation matched context, using primary theme"
        );
        let primary = registry.primary_theme().clone();
        self.pick_from_theme(registry, &primary)
            .or_else(|| registry.all().first())
    }

    pub fn unit(&mut self) -> f64 {
        self.rng.next_unit()
    }
}

//! Central configuration constants for animation timing, memory and storage.

/// Distinct visited routes after which repeat animations are reduced.
/// Reduction kicks in once the count strictly exceeds this value.
pub const REDUCE_ANIMATIONS_AFTER_VISITS: usize = 3;

/// Storage key of the persisted "have we seen this before" record.
pub const MEMORY_STORAGE_KEY: &str = "portal.animation-memory";

/// Storage key of the persisted user settings.
pub const SETTINGS_STORAGE_KEY: &str = "portal.settings";

/// Capacity of the engine event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Transition length used when no animation could be resolved at all.
pub const FALLBACK_TRANSITION_MS: u64 = 800;

/// Upper bound on a single step action before it is treated as failed.
pub const STEP_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Theme chosen when a context selection misses.
pub const DEFAULT_PRIMARY_THEME: &str = "solo";

/// Minimum allowed theme weight multiplier.
pub const MIN_THEME_WEIGHT: u32 = 1;

/// Maximum allowed theme weight multiplier.
pub const MAX_THEME_WEIGHT: u32 = 100;

/// Convenience function to clamp a theme weight into allowed range.
pub fn clamp_theme_weight(v: u32) -> u32 {
    v.clamp(MIN_THEME_WEIGHT, MAX_THEME_WEIGHT)
}

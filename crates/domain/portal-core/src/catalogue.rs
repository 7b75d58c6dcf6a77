//! Built-in animation catalogue and route tables.

use crate::{AnimationDefinition, AnimationRegistry, ConfigError};

pub mod themes {
    pub const SOLO: &str = "solo";
    pub const JJK: &str = "jjk";
    pub const DRSTONE: &str = "drstone";
    pub const SAO: &str = "sao";
    pub const NARUTO: &str = "naruto";

    pub const ALL: [&str; 5] = [SOLO, JJK, DRSTONE, SAO, NARUTO];
}

/// Primary theme first, then the secondary themes in decreasing weight.
pub const DEFAULT_THEME_WEIGHTS: [(&str, u32); 5] = [
    (themes::SOLO, 5),
    (themes::JJK, 3),
    (themes::DRSTONE, 2),
    (themes::SAO, 2),
    (themes::NARUTO, 1),
];

/// Tags used when a route has no entry in the tag table.
pub const DEFAULT_ROUTE_TAGS: &[&str] = &["navigation", "page"];

const ROUTE_TAGS: &[(&str, &[&str])] = &[
    ("/", &["home", "entrance", "hero"]),
    ("/about", &["about", "navigation", "page"]),
    ("/vision", &["vision", "reveal", "awakening"]),
    ("/team", &["team", "character", "reveal"]),
    ("/projects", &["projects", "tech", "science"]),
    ("/contact", &["contact", "action", "energy"]),
    ("/login", &["login", "system", "dashboard"]),
    ("/signup", &["signup", "system"]),
    ("/dashboard", &["dashboard", "stats", "profile"]),
    ("/shadow-realm", &["secret", "hidden", "special"]),
    ("/portal-demo", &["demo", "navigation", "transition"]),
    ("/team-demo", &["demo", "team", "character"]),
];

const ROUTE_DEFAULTS: &[(&str, &str)] = &[
    ("/", "gate-opening"),
    ("/about", "portal-transition"),
    ("/vision", "stone-crack"),
    ("/team", "summoning-jutsu"),
    ("/projects", "hologram-materialize"),
    ("/contact", "chakra-burst"),
    ("/login", "shadow-arise"),
    ("/signup", "cursed-portal"),
    ("/dashboard", "hud-boot"),
    ("/shadow-realm", "domain-expansion"),
];

/// Context tags for `route`. Trailing slashes are ignored.
pub fn route_tags(route: &str) -> &'static [&'static str] {
    let route = normalize_route(route);
    ROUTE_TAGS
        .iter()
        .find(|(r, _)| *r == route)
        .map(|(_, tags)| *tags)
        .unwrap_or(DEFAULT_ROUTE_TAGS)
}

/// Id of the fixed entry animation for `route`, if it has one.
pub fn default_animation_for(route: &str) -> Option<&'static str> {
    let route = normalize_route(route);
    ROUTE_DEFAULTS
        .iter()
        .find(|(r, _)| *r == route)
        .map(|(_, id)| *id)
}

pub fn known_routes() -> impl Iterator<Item = &'static str> {
    ROUTE_TAGS.iter().map(|(r, _)| *r)
}

fn normalize_route(route: &str) -> &str {
    let trimmed = route.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

pub fn seed_definitions() -> Vec<AnimationDefinition> {
    use themes::*;

    vec![
        AnimationDefinition::new("gate-opening", SOLO, 10, 2000)
            .named(
                "Gate Opening",
                "Massive dungeon gates slide open revealing shadow realm",
            )
            .with_tags(["home", "entrance", "hero", "navigation"])
            .with_sounds(["gate-opening", "shadow-aura-rise"]),
        AnimationDefinition::new("shadow-arise", SOLO, 8, 1800)
            .named(
                "Shadow Arise",
                "Shadows emerge from the ground like summoned soldiers",
            )
            .with_tags(["login", "system", "entrance", "reveal"])
            .with_sounds(["shadow-emerge", "power-surge"]),
        AnimationDefinition::new("monarch-summon", SOLO, 6, 2200)
            .named(
                "Monarch Summon",
                "Ultimate shadow monarch summoning animation",
            )
            .with_tags(["team", "character", "special"])
            .with_sounds(["summoning-start", "summoning-complete"]),
        AnimationDefinition::new("domain-expansion", JJK, 7, 2000)
            .named(
                "Domain Expansion",
                "Cursed energy domain manifests around the screen",
            )
            .with_tags(["secret", "hidden", "special", "transition"])
            .with_sounds(["cursed-energy", "domain-activate"]),
        AnimationDefinition::new("cursed-portal", JJK, 5, 1600)
            .named(
                "Cursed Portal",
                "Purple-hued portal with cursed energy particles",
            )
            .with_tags(["signup", "navigation", "transition"])
            .with_sounds(["portal-open", "curse-hum"])
            .cancellable(true),
        AnimationDefinition::new("stone-crack", DRSTONE, 4, 1400)
            .named(
                "Stone Crack",
                "Petrification cracks and reveals content like awakening",
            )
            .with_tags(["vision", "reveal", "awakening"])
            .with_sounds(["stone-crack", "crystal-chime"])
            .cancellable(true),
        AnimationDefinition::new("hologram-materialize", DRSTONE, 3, 1200)
            .named(
                "Hologram Materialize",
                "Scientific holographic interface materializes",
            )
            .with_tags(["projects", "tech", "science"])
            .with_sounds(["data-stream", "hologram-on"])
            .cancellable(true),
        AnimationDefinition::new("portal-transition", SAO, 4, 1600)
            .named(
                "Portal Transition",
                "Circular portal with rotating rings and scan lines",
            )
            .with_tags(["about", "navigation", "page", "transition", "demo"])
            .with_sounds(["portal-open", "data-slice"])
            .cancellable(true),
        AnimationDefinition::new("hud-boot", SAO, 3, 1000)
            .named("HUD Boot", "System interface boots up with scan elements")
            .with_tags(["dashboard", "stats", "profile", "system"])
            .with_sounds(["system-boot", "hud-activate"])
            .cancellable(true),
        AnimationDefinition::new("chakra-burst", NARUTO, 3, 1400)
            .named("Chakra Burst", "Orange chakra burst explosion effect")
            .with_tags(["contact", "action", "energy"])
            .with_sounds(["chakra-burst", "energy-release"])
            .cancellable(true),
        AnimationDefinition::new("summoning-jutsu", NARUTO, 2, 2000)
            .named(
                "Summoning Jutsu",
                "Summoning circle with smoke and character reveal",
            )
            .with_tags(["team", "character", "reveal", "demo"])
            .with_sounds(["summoning-jutsu", "smoke-poof"]),
    ]
}

/// Registry seeded with [`seed_definitions`] and [`DEFAULT_THEME_WEIGHTS`].
pub fn builtin_registry() -> Result<AnimationRegistry, ConfigError> {
    let mut registry = AnimationRegistry::seeded(themes::SOLO, seed_definitions())?;
    for (theme, weight) in DEFAULT_THEME_WEIGHTS {
        registry.set_theme_weight(theme, weight)?;
    }
    Ok(registry)
}

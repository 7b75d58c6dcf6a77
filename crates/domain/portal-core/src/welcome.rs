use crate::catalogue::themes;
use crate::RandomSource;

/// Welcome lines shown when the gate opens, tagged with the theme they evoke.
pub const WELCOME_MESSAGES: &[(&str, &str)] = &[
    (themes::SOLO, "Welcome to reality."),
    (themes::SOLO, "Welcome to Shadows."),
    (themes::SOLO, "Feel the fear."),
    (themes::SOLO, "Deal the fear."),
    (themes::SOLO, "Arise, shadow."),
    (themes::SOLO, "Your awakening begins."),
    (themes::SOLO, "The gate has opened."),
    (themes::SOLO, "Ascend beyond mortals."),
    (themes::SOLO, "Embrace the darkness."),
    (themes::SOLO, "Power awaits."),
    (themes::JJK, "Cursed energy flows."),
    (themes::JJK, "Jujutsu begins."),
    (themes::JJK, "Cursed technique activated."),
    (themes::JJK, "Domain expansion incoming."),
    (themes::JJK, "The cursed seal activates."),
    (themes::JJK, "Curse level: Maximum."),
    (themes::DRSTONE, "Science surges forward."),
    (themes::DRSTONE, "Senku's vision realized."),
    (themes::DRSTONE, "Stone age ends here."),
    (themes::DRSTONE, "Technology awakens."),
    (themes::DRSTONE, "Progress never stops."),
    (themes::SAO, "System initialized."),
    (themes::SAO, "Welcome to the system."),
    (themes::SAO, "Loading game parameters."),
    (themes::SAO, "Virtual world activated."),
    (themes::SAO, "Ready player one."),
    (themes::SAO, "Connection established."),
    (themes::NARUTO, "Chakra alignment complete."),
    (themes::NARUTO, "Ninja way activated."),
    (themes::NARUTO, "Seal release."),
    (themes::NARUTO, "Summoning contract signed."),
    (themes::NARUTO, "Ninja legends rise."),
    (themes::NARUTO, "Power of bonds unleashed."),
];

pub fn all() -> impl Iterator<Item = &'static str> {
    WELCOME_MESSAGES.iter().map(|(_, m)| *m)
}

/// Message at `index`, wrapping around the list.
pub fn by_index(index: usize) -> &'static str {
    WELCOME_MESSAGES[index % WELCOME_MESSAGES.len()].1
}

pub fn pick(rng: &mut dyn RandomSource) -> &'static str {
    let ix = (rng.next_unit() * WELCOME_MESSAGES.len() as f64) as usize;
    by_index(ix)
}

pub fn for_theme(theme: &str) -> impl Iterator<Item = &'static str> + '_ {
    WELCOME_MESSAGES
        .iter()
        .filter(move |(t, _)| *t == theme)
        .map(|(_, m)| *m)
}

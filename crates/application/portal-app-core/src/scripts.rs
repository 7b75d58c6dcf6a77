//! Hand-authored multi-step sequences.
//!
//! Steps chain: each one waits its delay after the previous step's hold, so
//! most of these run past their nominal total. None of these can be skipped.

use crate::sequence::{Sequence, SequenceStep};

pub const GATE_OPENING: &str = "gateOpening";
pub const PORTAL_TRANSITION: &str = "portalTransition";
pub const TEAM_SUMMONING: &str = "teamSummoning";
pub const ABOUT_PAGE_ENTRY: &str = "aboutPageEntry";
pub const VISION_PAGE_ENTRY: &str = "visionPageEntry";
pub const TEAM_PAGE_ENTRY: &str = "teamPageEntry";
pub const CONTACT_PAGE_ENTRY: &str = "contactPageEntry";

pub const NAMES: [&str; 7] = [
    GATE_OPENING,
    PORTAL_TRANSITION,
    TEAM_SUMMONING,
    ABOUT_PAGE_ENTRY,
    VISION_PAGE_ENTRY,
    TEAM_PAGE_ENTRY,
    CONTACT_PAGE_ENTRY,
];

/// Gate doors slide apart, a shadow aura rises, then the title glows in.
pub fn gate_opening() -> Sequence {
    Sequence::new(GATE_OPENING, 2000)
        .with_sounds(["gate-opening", "shadow-aura-rise"])
        .step(SequenceStep::new("gateStart", 0, 0))
        .step(SequenceStep::new("gateMovement", 0, 1600))
        .step(SequenceStep::new("auraShadowRise", 400, 1200))
        .step(SequenceStep::new("textGlow", 800, 800))
}

pub fn portal_transition() -> Sequence {
    Sequence::new(PORTAL_TRANSITION, 1600)
        .with_sounds(["portal-open", "data-slice"])
        .step(SequenceStep::new("portalRings", 0, 1600))
        .step(SequenceStep::new("glitchEffect", 800, 400))
        .step(SequenceStep::new("portalFade", 1000, 600))
}

pub fn team_summoning() -> Sequence {
    Sequence::new(TEAM_SUMMONING, 2200)
        .with_sounds(["summoning-start", "shadow-emerge", "summoning-complete"])
        .step(SequenceStep::new("summoningCircle", 0, 800))
        .step(SequenceStep::new("shadowRise", 600, 800))
        .step(SequenceStep::new("characterReveal", 1400, 600))
}

/// Single portal step; the about overlay keys off the sequence name.
pub fn about_page_entry() -> Sequence {
    Sequence::new(ABOUT_PAGE_ENTRY, 1600)
        .with_sounds(["portal-open"])
        .step(SequenceStep::new("portalTransition", 0, 1600))
}

pub fn vision_page_entry() -> Sequence {
    Sequence::new(VISION_PAGE_ENTRY, 1800)
        .with_sounds(["stone-crack", "crystal-chime"])
        .step(SequenceStep::new("stoneCrack", 0, 600))
        .step(SequenceStep::new("stoneToHologram", 600, 800))
        .step(SequenceStep::new("contentReveal", 1400, 400))
}

pub fn team_page_entry() -> Sequence {
    Sequence::new(TEAM_PAGE_ENTRY, 2000)
        .with_sounds(["chakra-gather"])
        .step(SequenceStep::new("chakraGather", 0, 800))
        .step(SequenceStep::new("teamReadiness", 800, 200))
}

pub fn contact_page_entry() -> Sequence {
    Sequence::new(CONTACT_PAGE_ENTRY, 1400)
        .with_sounds(["chakra-burst"])
        .step(SequenceStep::new("chakraBurst", 0, 400))
        .step(SequenceStep::new("formAppear", 400, 600))
}

pub fn by_name(name: &str) -> Option<Sequence> {
    let sequence = match name {
        GATE_OPENING => gate_opening(),
        PORTAL_TRANSITION => portal_transition(),
        TEAM_SUMMONING => team_summoning(),
        ABOUT_PAGE_ENTRY => about_page_entry(),
        VISION_PAGE_ENTRY => vision_page_entry(),
        TEAM_PAGE_ENTRY => team_page_entry(),
        CONTACT_PAGE_ENTRY => contact_page_entry(),
        _ => return None,
    };
    Some(sequence)
}

/// Page-entry script for `route`, if the page has one.
pub fn for_route(route: &str) -> Option<Sequence> {
    match route.trim_end_matches('/') {
        "/about" => Some(about_page_entry()),
        "/vision" => Some(vision_page_entry()),
        "/team" => Some(team_page_entry()),
        "/contact" => Some(contact_page_entry()),
        _ => None,
    }
}

pub fn all() -> Vec<Sequence> {
    NAMES.iter().filter_map(|name| by_name(name)).collect()
}

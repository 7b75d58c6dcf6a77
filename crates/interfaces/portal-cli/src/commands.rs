use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use portal_app_core::{
    scripts, AnimationMemory, EngineEvent, NavigateOptions, NavigateOutcome, PortalSettings,
    Sequence,
};
use portal_core::catalogue::{self, builtin_registry};
use portal_core::{welcome, RandomSource, Theme, WeightedSelector};
use tokio::sync::broadcast;

use crate::{open_session, open_store, random_source, spawn_event_printer, SessionOptions};

pub fn cmd_catalogue(themes_only: bool) -> Result<()> {
    let registry = builtin_registry()?;

    if themes_only {
        println!(":: Themes (primary: {})", registry.primary_theme());
        for theme in registry.themes() {
            println!(
                "   {:<10} weight {:>3}  entries {}",
                theme.as_str(),
                registry.theme_weight(theme),
                registry.by_theme(theme).len()
            );
        }
        return Ok(());
    }

    println!(":: {} animations", registry.len());
    for def in registry.all() {
        let tags: Vec<&str> = def.tags.iter().map(String::as_str).collect();
        println!(
            "   {:<22} {:<8} w={:<3} {:>5}ms {}{}",
            def.id,
            def.theme.as_str(),
            def.weight,
            def.duration_ms,
            if def.cancellable { "skippable " } else { "" },
            tags.join(",")
        );
    }
    println!(":: Scripts: {}", scripts::NAMES.join(", "));
    Ok(())
}

/// One pick, or a histogram over `draws` picks.
pub fn cmd_select(
    options: &SessionOptions,
    tags: Vec<String>,
    theme: Option<String>,
    draws: usize,
) -> Result<()> {
    let store = open_store(options.data_dir.as_deref())?;
    let settings = PortalSettings::load(store.as_ref())?;
    let mut registry = builtin_registry()?;
    settings.apply_to(&mut registry)?;

    let theme = theme.map(Theme::new);
    let mut selector = WeightedSelector::new(random_source(options.seed));

    if draws <= 1 {
        match selector.select_weighted_random(&registry, tags.as_slice(), theme.as_ref()) {
            Some(def) => println!("{} ({}, {}ms)", def.id, def.theme, def.duration_ms),
            None => println!(":: No animation matches {tags:?}"),
        }
        return Ok(());
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for _ in 0..draws {
        let pick = selector.select_weighted_random(&registry, tags.as_slice(), theme.as_ref());
        if let Some(def) = pick {
            *counts.entry(def.id.clone()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        println!(":: No animation matches {tags:?}");
        return Ok(());
    }

    let total_weight: u64 = registry
        .by_tags(tags.as_slice())
        .into_iter()
        .filter(|d| theme.as_ref().map_or(true, |t| &d.theme == t))
        .map(|d| registry.effective_weight(d))
        .sum();
    println!(":: {draws} draws over {tags:?}");
    for (id, count) in &counts {
        let expected = registry
            .get(id)
            .map(|d| registry.effective_weight(d) as f64 / total_weight as f64)
            .unwrap_or_default();
        println!(
            "   {:<22} {:>6}  {:>5.1}% (expected {:>5.1}%)",
            id,
            count,
            *count as f64 * 100.0 / draws as f64,
            expected * 100.0
        );
    }
    Ok(())
}

pub async fn cmd_play(options: &SessionOptions, name: &str) -> Result<()> {
    let app = open_session(options).await?;
    let printer = spawn_event_printer(app.subscribe());
    let outcome = app.play_named(name).await?;
    println!(":: {name}: {outcome:?}");
    printer.abort();
    Ok(())
}

pub async fn cmd_navigate(
    options: &SessionOptions,
    route: &str,
    tags: Vec<String>,
    theme: Option<String>,
    non_blocking: bool,
    page_script: bool,
) -> Result<()> {
    let app = open_session(options).await?;
    let printer = spawn_event_printer(app.subscribe());

    let mut nav = NavigateOptions {
        blocking: !non_blocking && app.settings.blocking_navigation,
        ..NavigateOptions::default()
    }
    .with_tags(tags);
    if let Some(theme) = theme {
        nav = nav.with_theme(theme.as_str());
    }
    if page_script {
        let script: Sequence = scripts::for_route(route)
            .with_context(|| format!("no page script for {route}"))?;
        nav = nav.with_sequence(script);
    }

    // Subscribed up front so a finish that lands during `navigate` is buffered.
    let finished = app.subscribe();
    let animation = match app.navigate(route, nav).await? {
        NavigateOutcome::Navigated {
            animation: Some(id),
            ..
        } => {
            println!(":: Navigated to {route} with {id}");
            Some(id)
        }
        NavigateOutcome::Navigated { animation: None, .. } => {
            println!(":: Navigated to {route} (animation reduced)");
            None
        }
        NavigateOutcome::Dropped => {
            println!(":: Navigation to {route} dropped");
            None
        }
    };

    // Let a non-blocking transition play out before the process exits.
    if let Some(name) = animation {
        wait_for_sequence_end(finished, &name).await;
    }
    printer.abort();
    Ok(())
}

async fn wait_for_sequence_end(mut rx: broadcast::Receiver<EngineEvent>, name: &str) {
    loop {
        match rx.recv().await {
            Ok(EngineEvent::SequenceFinished { name: done, .. }) if done == name => break,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::debug!(skipped = n, "finish watcher lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub async fn cmd_gate(options: &SessionOptions) -> Result<()> {
    let app = open_session(options).await?;
    let printer = spawn_event_printer(app.subscribe());
    if app.open_gate().await {
        println!(":: {}", app.welcome_message());
    } else {
        println!(":: The gate is already open.");
    }
    printer.abort();
    Ok(())
}

pub fn cmd_memory_show(options: &SessionOptions) -> Result<()> {
    let memory = AnimationMemory::new(open_store(options.data_dir.as_deref())?);
    let record = memory.read()?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn cmd_memory_reset(options: &SessionOptions) -> Result<()> {
    let memory = AnimationMemory::new(open_store(options.data_dir.as_deref())?);
    memory.reset()?;
    println!(":: Animation memory cleared.");
    Ok(())
}

pub fn cmd_welcome(options: &SessionOptions, theme: Option<String>) -> Result<()> {
    let mut rng = random_source(options.seed);
    let message = match theme {
        Some(theme) => {
            let candidates: Vec<&str> = welcome::for_theme(&theme).collect();
            if candidates.is_empty() {
                bail!("no welcome messages for theme {theme:?}");
            }
            let ix = (rng.next_unit() * candidates.len() as f64) as usize;
            candidates[ix.min(candidates.len() - 1)]
        }
        None => welcome::pick(&mut rng),
    };
    println!("{message}");
    Ok(())
}

pub fn cmd_settings_show(options: &SessionOptions) -> Result<()> {
    let store = open_store(options.data_dir.as_deref())?;
    let settings = PortalSettings::load(store.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub async fn cmd_settings_set_weight(
    options: &SessionOptions,
    theme: &str,
    weight: u32,
) -> Result<()> {
    if !catalogue::themes::ALL.contains(&theme) {
        tracing::warn!(theme, "theme has no built-in animations");
    }
    let mut app = open_session(options).await?;
    let kept = app.set_theme_weight(theme, weight)?;
    if kept != weight {
        println!(":: Weight clamped to {kept}");
    }
    println!(":: {theme} weight = {kept}");
    Ok(())
}

pub async fn cmd_settings_toggle(
    options: &SessionOptions,
    sound: Option<bool>,
    reduce: Option<bool>,
    blocking: Option<bool>,
) -> Result<()> {
    let mut app = open_session(options).await?;
    if let Some(sound) = sound {
        app.set_sound_enabled(sound)?;
    }
    if let Some(reduce) = reduce {
        app.set_reduce_repeat_animations(reduce)?;
    }
    if let Some(blocking) = blocking {
        app.settings.blocking_navigation = blocking;
        app.save_settings()?;
    }
    println!("{}", serde_json::to_string_pretty(&app.settings)?);
    Ok(())
}

/// Feeds key codes; the completed secret code opens its route.
pub async fn cmd_keys(options: &SessionOptions, keys: Vec<String>) -> Result<()> {
    let app = open_session(options).await?;
    let printer = spawn_event_printer(app.subscribe());

    let mut unlocked = None;
    for key in &keys {
        if let Some(route) = app.key_pressed(key) {
            unlocked = Some(route);
        }
    }
    match unlocked {
        Some(route) => {
            println!(":: Secret unlocked");
            app.navigate_default(route).await?;
        }
        None => println!(":: Nothing happens."),
    }
    printer.abort();
    Ok(())
}

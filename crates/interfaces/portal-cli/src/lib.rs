pub mod commands;
pub mod router;

use std::sync::Arc;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use portal_app_core::{EngineEvent, PortalApplication, SoundSource, TracingAudioBackend};
use portal_core::{RandomSource, RngSource};
use portal_persistence::{FileKeyValueStore, KeyValueStore};
use tokio::sync::broadcast;

pub use router::StdoutRouter;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub data_dir: Option<Utf8PathBuf>,
    pub seed: Option<u64>,
    pub sound_dir: Option<Utf8PathBuf>,
    /// Treat the session as having seen a user gesture.
    pub unlock_audio: bool,
}

pub type Session = PortalApplication<StdoutRouter>;

pub fn open_store(data_dir: Option<&Utf8Path>) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store = match data_dir {
        Some(dir) => FileKeyValueStore::new(dir),
        None => FileKeyValueStore::open_default().context("locating data directory")?,
    };
    tracing::debug!(root = %store.root(), "using data directory");
    Ok(Arc::new(store))
}

pub fn random_source(seed: Option<u64>) -> impl RandomSource + Send + 'static {
    match seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    }
}

pub async fn open_session(options: &SessionOptions) -> anyhow::Result<Session> {
    let store = open_store(options.data_dir.as_deref())?;
    let app = PortalApplication::new(
        store,
        StdoutRouter::starting_at("/"),
        Arc::new(TracingAudioBackend),
        random_source(options.seed),
    )?;

    if let Some(dir) = &options.sound_dir {
        let loaded = load_sound_dir(&app, dir).await?;
        tracing::info!(%dir, loaded, "sound directory loaded");
    }
    if options.unlock_audio {
        app.audio().observe_gesture(portal_app_core::Gesture::Click);
    }
    Ok(app)
}

/// Loads every file in `dir`, named by its file stem. Returns how many decoded.
pub async fn load_sound_dir(app: &Session, dir: &Utf8Path) -> anyhow::Result<usize> {
    let entries = dir
        .read_dir_utf8()
        .with_context(|| format!("reading sound directory {dir}"))?;
    let mut loaded = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(stem) = path.file_stem() else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        if app
            .audio()
            .load_sound(stem, &SoundSource::File(path.to_owned()))
            .await
        {
            loaded += 1;
        }
    }
    Ok(loaded)
}

/// Prints engine events until the channel closes.
pub fn spawn_event_printer(
    mut rx: broadcast::Receiver<EngineEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = describe(&event) {
                        println!("{line}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "event printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

pub fn describe(event: &EngineEvent) -> Option<String> {
    let line = match event {
        EngineEvent::SequenceStarted { name, .. } => format!("   > {name}"),
        EngineEvent::PhaseChanged { phase, .. } => format!("     - {phase}"),
        EngineEvent::SequenceFinished { name, outcome, .. } => {
            format!("   < {name} ({outcome:?})")
        }
        EngineEvent::CancelRefused { name, .. } => format!("   ! {name} cannot be skipped"),
        EngineEvent::NavigationDropped { route } => format!("   ! navigation to {route} dropped"),
        EngineEvent::AudioUnlocked { gesture } => format!("   ~ audio unlocked by {gesture:?}"),
        EngineEvent::NavigationStarted { .. } | EngineEvent::NavigationCompleted { .. } => {
            return None
        }
    };
    Some(line)
}

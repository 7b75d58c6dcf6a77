use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::Context;
use portal_core::catalogue;
use portal_core::{welcome, AnimationRegistry, RandomSource, WeightedSelector};
use portal_persistence::KeyValueStore;
use tokio::sync::broadcast;

use crate::audio::{AudioGate, Gesture};
use crate::clock::TokioClock;
use crate::engine::{PlayOutcome, SequenceEngine};
use crate::events::{EngineEvent, EventBus};
use crate::memory::AnimationMemory;
use crate::navigation::{NavigateOptions, NavigateOutcome, NavigationGate};
use crate::ports::{AudioBackend, Clock, RouterPort};
use crate::scripts;
use crate::secret::SecretCodeDetector;
use crate::sequence::Sequence;
use crate::settings::PortalSettings;

/// Route unlocked by the secret key code.
pub const SECRET_ROUTE: &str = "/shadow-realm";

/// Wires registry, engine, audio, memory and navigation together.
pub struct PortalApplication<R: RouterPort> {
    pub settings: PortalSettings,

    store: Arc<dyn KeyValueStore>,
    registry: Arc<RwLock<AnimationRegistry>>,
    selector: Arc<Mutex<WeightedSelector>>,
    events: EventBus,
    engine: SequenceEngine,
    audio: Arc<AudioGate>,
    memory: Arc<AnimationMemory>,
    navigation: NavigationGate<R>,
    secret: Mutex<SecretCodeDetector>,
}

impl<R: RouterPort> PortalApplication<R> {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        router: R,
        audio_backend: Arc<dyn AudioBackend>,
        rng: impl RandomSource + Send + 'static,
    ) -> anyhow::Result<Self> {
        Self::with_clock(store, router, audio_backend, rng, Arc::new(TokioClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        router: R,
        audio_backend: Arc<dyn AudioBackend>,
        rng: impl RandomSource + Send + 'static,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let settings = PortalSettings::load(store.as_ref()).context("loading settings")?;

        let mut registry = catalogue::builtin_registry().context("seeding animation catalogue")?;
        settings
            .apply_to(&mut registry)
            .context("applying theme weights")?;
        let registry = Arc::new(RwLock::new(registry));
        let selector = Arc::new(Mutex::new(WeightedSelector::new(rng)));

        let events = EventBus::default();
        let audio = Arc::new(AudioGate::new(audio_backend).with_events(events.clone()));
        audio.set_enabled(settings.sound_enabled);

        let engine = SequenceEngine::new(clock.clone(), events.clone())
            .with_sound_sink(audio.clone());
        let memory = Arc::new(AnimationMemory::new(store.clone()).with_clock(clock));
        let navigation = NavigationGate::new(
            registry.clone(),
            selector.clone(),
            engine.clone(),
            Arc::new(router),
            events.clone(),
        )
        .with_memory(memory.clone())
        .reduce_repeat_animations(settings.reduce_repeat_animations);

        tracing::debug!(
            primary_theme = %settings.primary_theme,
            sound = settings.sound_enabled,
            "portal application ready"
        );

        Ok(Self {
            settings,
            store,
            registry,
            selector,
            events,
            engine,
            audio,
            memory,
            navigation,
            secret: Mutex::new(SecretCodeDetector::konami()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &Arc<RwLock<AnimationRegistry>> {
        &self.registry
    }

    pub fn engine(&self) -> &SequenceEngine {
        &self.engine
    }

    pub fn audio(&self) -> &AudioGate {
        &self.audio
    }

    pub fn memory(&self) -> &AnimationMemory {
        &self.memory
    }

    pub fn navigation(&self) -> &NavigationGate<R> {
        &self.navigation
    }

    // --- Actions ---

    pub async fn navigate(
        &self,
        route: &str,
        options: NavigateOptions,
    ) -> anyhow::Result<NavigateOutcome> {
        Ok(self.navigation.navigate(route, options).await?)
    }

    /// Navigates with the configured blocking mode and the route's own tags.
    pub async fn navigate_default(&self, route: &str) -> anyhow::Result<NavigateOutcome> {
        let options = NavigateOptions {
            blocking: self.settings.blocking_navigation,
            ..NavigateOptions::default()
        };
        self.navigate(route, options).await
    }

    pub async fn open_gate(&self) -> bool {
        self.navigation.open_gate().await
    }

    /// A hand-authored script by name, or a registered animation by id.
    pub fn sequence_named(&self, name: &str) -> Option<Sequence> {
        if let Some(sequence) = scripts::by_name(name) {
            return Some(sequence);
        }
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(name).map(Sequence::from_definition)
    }

    pub async fn play_named(&self, name: &str) -> anyhow::Result<PlayOutcome> {
        let sequence = self
            .sequence_named(name)
            .with_context(|| format!("no script or animation named {name:?}"))?;
        Ok(self.engine.play(sequence).await)
    }

    pub fn welcome_message(&self) -> &'static str {
        let mut selector = self.selector.lock().unwrap_or_else(PoisonError::into_inner);
        let ix = (selector.unit() * welcome::WELCOME_MESSAGES.len() as f64) as usize;
        welcome::by_index(ix)
    }

    /// Feeds a key press. Unlocks audio on first use and returns the secret
    /// route once the key code completes.
    pub fn key_pressed(&self, key: &str) -> Option<&'static str> {
        self.audio.observe_gesture(Gesture::KeyDown);
        let mut secret = self.secret.lock().unwrap_or_else(PoisonError::into_inner);
        secret.feed(key).then_some(SECRET_ROUTE)
    }

    // --- Settings ---

    pub fn set_theme_weight(&mut self, theme: &str, weight: u32) -> anyhow::Result<u32> {
        let kept = self.settings.set_theme_weight(theme, weight);
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_theme_weight(theme, kept)?;
        self.save_settings()?;
        Ok(kept)
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> anyhow::Result<()> {
        self.settings.sound_enabled = enabled;
        self.audio.set_enabled(enabled);
        self.save_settings()
    }

    pub fn set_reduce_repeat_animations(&mut self, enabled: bool) -> anyhow::Result<()> {
        self.settings.reduce_repeat_animations = enabled;
        self.navigation.set_reduce_repeat_animations(enabled);
        self.save_settings()
    }

    pub fn save_settings(&self) -> anyhow::Result<()> {
        self.settings
            .save(self.store.as_ref())
            .context("saving settings")
    }
}

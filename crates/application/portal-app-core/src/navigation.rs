use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use portal_core::catalogue;
use portal_core::{AnimationRegistry, Theme, WeightedSelector};

use crate::engine::{PlayHandle, SequenceEngine};
use crate::events::{EngineEvent, EventBus};
use crate::memory::AnimationMemory;
use crate::ports::RouterPort;
use crate::scripts;
use crate::sequence::{Sequence, SequenceStep};

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("route change to {route} failed: {reason}")]
    Router { route: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    /// Finish the transition before the route changes.
    pub blocking: bool,
    /// Selection context; empty means the route's own tags.
    pub context_tags: Vec<String>,
    pub theme: Option<Theme>,
    /// Plays this instead of a selected animation.
    pub sequence: Option<Sequence>,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            blocking: true,
            context_tags: Vec::new(),
            theme: None,
            sequence: None,
        }
    }
}

impl NavigateOptions {
    pub fn non_blocking() -> Self {
        Self {
            blocking: false,
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_theme(mut self, theme: impl Into<Theme>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateOutcome {
    Navigated {
        route: String,
        /// Sequence the engine ran for the transition, if any. When the engine
        /// was already busy this names the sequence that was playing.
        animation: Option<String>,
    },
    /// Another navigation was already in flight.
    Dropped,
}

/// Releases the in-flight flag when dropped.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Couples route changes with transition sequences.
///
/// At most one navigation is in flight; overlapping requests are dropped. In
/// blocking mode the route changes only after the sequence finishes, in
/// non-blocking mode it changes right away while the sequence plays.
pub struct NavigationGate<R: RouterPort> {
    registry: Arc<RwLock<AnimationRegistry>>,
    selector: Arc<Mutex<WeightedSelector>>,
    engine: SequenceEngine,
    router: Arc<R>,
    events: EventBus,
    memory: Option<Arc<AnimationMemory>>,
    reduce_repeat: bool,
    in_flight: Arc<AtomicBool>,
}

impl<R: RouterPort> NavigationGate<R> {
    pub fn new(
        registry: Arc<RwLock<AnimationRegistry>>,
        selector: Arc<Mutex<WeightedSelector>>,
        engine: SequenceEngine,
        router: Arc<R>,
        events: EventBus,
    ) -> Self {
        Self {
            registry,
            selector,
            engine,
            router,
            events,
            memory: None,
            reduce_repeat: false,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_memory(mut self, memory: Arc<AnimationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Skip transitions to already-visited routes once memory says so.
    pub fn reduce_repeat_animations(mut self, enabled: bool) -> Self {
        self.reduce_repeat = enabled;
        self
    }

    pub fn set_reduce_repeat_animations(&mut self, enabled: bool) {
        self.reduce_repeat = enabled;
    }

    pub fn is_navigating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub async fn navigate(
        &self,
        route: &str,
        options: NavigateOptions,
    ) -> Result<NavigateOutcome, NavigationError> {
        let Some(guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!(route, "navigation already in flight, dropping request");
            self.events.publish(EngineEvent::NavigationDropped {
                route: route.to_string(),
            });
            return Ok(NavigateOutcome::Dropped);
        };

        let blocking = options.blocking;
        let sequence = if self.skip_repeat(route) {
            tracing::debug!(route, "repeat visit, skipping transition");
            None
        } else {
            Some(self.resolve(route, options))
        };

        let requested = sequence.as_ref().map(|s| s.name.clone());
        tracing::info!(route, animation = ?requested, blocking, "navigating");
        self.events.publish(EngineEvent::NavigationStarted {
            from: self.router.current_route(),
            route: route.to_string(),
            animation: requested,
            blocking,
        });

        let animation = if blocking {
            let played = match sequence {
                Some(sequence) => {
                    let handle = tracked(self.engine.start(sequence));
                    let played = handle.name().to_string();
                    let outcome = handle.finished().await;
                    tracing::debug!(route, ?outcome, "transition finished");
                    Some(played)
                }
                None => None,
            };
            self.change_route(route)?;
            drop(guard);
            played
        } else {
            self.change_route(route)?;
            match sequence {
                Some(sequence) => {
                    let handle = tracked(self.engine.start(sequence));
                    let played = handle.name().to_string();
                    tokio::spawn(async move {
                        handle.finished().await;
                        drop(guard);
                    });
                    Some(played)
                }
                None => {
                    drop(guard);
                    None
                }
            }
        };

        Ok(NavigateOutcome::Navigated {
            route: route.to_string(),
            animation,
        })
    }

    /// Plays the gate-opening script the first time only. Returns whether it ran.
    pub async fn open_gate(&self) -> bool {
        if let Some(memory) = &self.memory {
            match memory.read() {
                Ok(record) if record.gate_opened => {
                    tracing::debug!("gate already opened");
                    return false;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "could not read animation memory"),
            }
        }

        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("navigation in flight, gate opening deferred");
            return false;
        };

        let outcome = self.engine.play(scripts::gate_opening()).await;
        tracing::info!(?outcome, "gate opened");
        if let Some(memory) = &self.memory {
            if let Err(e) = memory.mark_gate_opened() {
                tracing::warn!(error = %e, "could not persist gate opening");
            }
        }
        true
    }

    fn skip_repeat(&self, route: &str) -> bool {
        if !self.reduce_repeat {
            return false;
        }
        let Some(memory) = &self.memory else {
            return false;
        };
        match memory.read() {
            Ok(record) => record.animations_reduced && record.has_visited(route),
            Err(e) => {
                tracing::warn!(error = %e, "could not read animation memory");
                false
            }
        }
    }

    /// Explicit sequence, then a weighted pick with fallback, then the
    /// route's fixed animation, then a plain fade.
    fn resolve(&self, route: &str, options: NavigateOptions) -> Sequence {
        if let Some(sequence) = options.sequence {
            return sequence;
        }

        let tags: Vec<String> = if options.context_tags.is_empty() {
            catalogue::route_tags(route)
                .iter()
                .map(|t| t.to_string())
                .collect()
        } else {
            options.context_tags
        };

        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let picked = {
            let mut selector = self.selector.lock().unwrap_or_else(PoisonError::into_inner);
            selector
                .select_or_fallback(&registry, tags.as_slice(), options.theme.as_ref())
                .cloned()
        };
        if let Some(def) = picked.or_else(|| registry.page_animation(route).cloned()) {
            return Sequence::from_definition(&def);
        }

        tracing::debug!(route, "registry empty, using plain transition");
        Sequence::new("fallback", portal_config::FALLBACK_TRANSITION_MS)
            .cancellable(true)
            .step(SequenceStep::new(
                "fade",
                0,
                portal_config::FALLBACK_TRANSITION_MS,
            ))
    }

    fn change_route(&self, route: &str) -> Result<(), NavigationError> {
        self.router
            .push(route)
            .map_err(|e| NavigationError::Router {
                route: route.to_string(),
                reason: format!("{e:#}"),
            })?;

        if let Some(memory) = &self.memory {
            if let Err(e) = memory.record_visit(route) {
                tracing::warn!(route, error = %e, "could not record visit");
            }
        }
        self.events.publish(EngineEvent::NavigationCompleted {
            route: route.to_string(),
        });
        Ok(())
    }
}

fn tracked(handle: PlayHandle) -> PlayHandle {
    if !handle.accepted() {
        tracing::warn!(
            running = handle.name(),
            "engine busy, transition follows the running sequence"
        );
    }
    handle
}

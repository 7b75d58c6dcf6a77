use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::{EngineEvent, EventBus};
use crate::ports::{Clock, SoundSink};
use crate::sequence::{Sequence, StepAction};

pub type RunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayOutcome {
    Completed,
    Cancelled,
    /// The run ended without reporting, e.g. its runtime shut down.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResult {
    Cancelled,
    /// The running sequence is not cancellable.
    Refused,
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub is_playing: bool,
    pub current_sequence: Option<String>,
    pub run_id: Option<RunId>,
    pub started_at: Option<Instant>,
}

/// Handle on a started (or already running) sequence.
#[derive(Debug)]
pub struct PlayHandle {
    run_id: RunId,
    name: String,
    accepted: bool,
    done: watch::Receiver<Option<PlayOutcome>>,
}

impl PlayHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// False when the request was ignored because another sequence was playing.
    /// The handle then tracks that other sequence.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    pub async fn finished(mut self) -> PlayOutcome {
        loop {
            let current = *self.done.borrow_and_update();
            if let Some(outcome) = current {
                return outcome;
            }
            if self.done.changed().await.is_err() {
                let last = *self.done.borrow();
                return last.unwrap_or(PlayOutcome::Aborted);
            }
        }
    }
}

struct ActiveRun {
    run_id: RunId,
    name: String,
    cancellable: bool,
    started_at: Instant,
    token: CancellationToken,
    done: watch::Sender<Option<PlayOutcome>>,
}

struct EngineInner {
    clock: Arc<dyn Clock>,
    events: EventBus,
    sounds: Option<Arc<dyn SoundSink>>,
    action_timeout: Duration,
    current: Mutex<Option<ActiveRun>>,
}

/// Plays at most one [`Sequence`] at a time.
///
/// Steps run strictly in order: wait the step's delay, dispatch it, then hold
/// for its duration. The run lasts at least the sequence's total duration.
#[derive(Clone)]
pub struct SequenceEngine {
    inner: Arc<EngineInner>,
}

impl SequenceEngine {
    pub fn new(clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                clock,
                events,
                sounds: None,
                action_timeout: Duration::from_millis(portal_config::STEP_ACTION_TIMEOUT_MS),
                current: Mutex::new(None),
            }),
        }
    }

    /// Must be called before the engine is cloned or started.
    pub fn with_sound_sink(mut self, sink: Arc<dyn SoundSink>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.sounds = Some(sink);
        } else {
            tracing::warn!("sound sink attached to a shared engine, ignoring");
        }
        self
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.action_timeout = timeout;
        }
        self
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state().is_some()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let guard = self.inner.state();
        match guard.as_ref() {
            Some(run) => EngineSnapshot {
                is_playing: true,
                current_sequence: Some(run.name.clone()),
                run_id: Some(run.run_id),
                started_at: Some(run.started_at),
            },
            None => EngineSnapshot {
                is_playing: false,
                current_sequence: None,
                run_id: None,
                started_at: None,
            },
        }
    }

    /// Starts `sequence` in the background.
    ///
    /// While another sequence is playing this is a no-op and the returned
    /// handle tracks the running one. Must be called inside a Tokio runtime;
    /// outside one the run is reported as [`PlayOutcome::Aborted`].
    pub fn start(&self, sequence: Sequence) -> PlayHandle {
        let mut guard = self.inner.state();
        if let Some(active) = guard.as_ref() {
            tracing::debug!(
                requested = %sequence.name,
                running = %active.name,
                "sequence already playing, ignoring request"
            );
            return PlayHandle {
                run_id: active.run_id,
                name: active.name.clone(),
                accepted: false,
                done: active.done.subscribe(),
            };
        }

        let run_id = Uuid::new_v4();
        let (done_tx, done_rx) = watch::channel(None);
        let handle = PlayHandle {
            run_id,
            name: sequence.name.clone(),
            accepted: true,
            done: done_rx,
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(sequence = %sequence.name, "no tokio runtime, sequence not started");
            done_tx.send_replace(Some(PlayOutcome::Aborted));
            return handle;
        };

        let token = CancellationToken::new();
        *guard = Some(ActiveRun {
            run_id,
            name: sequence.name.clone(),
            cancellable: sequence.cancellable,
            started_at: self.inner.clock.now(),
            token: token.clone(),
            done: done_tx,
        });
        drop(guard);

        self.inner.events.publish(EngineEvent::SequenceStarted {
            run_id,
            name: sequence.name.clone(),
        });
        runtime.spawn(run_sequence(self.inner.clone(), run_id, sequence, token));
        handle
    }

    /// Starts `sequence` and waits for whichever run the engine ends up tracking.
    pub async fn play(&self, sequence: Sequence) -> PlayOutcome {
        self.start(sequence).finished().await
    }

    /// Stops a cancellable sequence. State returns to idle immediately; a step
    /// action already in flight still runs to completion.
    pub fn cancel(&self) -> CancelResult {
        let mut guard = self.inner.state();
        let refused = match guard.as_ref() {
            None => return CancelResult::Idle,
            Some(active) if !active.cancellable => Some((active.run_id, active.name.clone())),
            Some(_) => None,
        };
        if let Some((run_id, name)) = refused {
            drop(guard);
            tracing::info!(%run_id, sequence = %name, "sequence is not cancellable");
            self.inner
                .events
                .publish(EngineEvent::CancelRefused { run_id, name });
            return CancelResult::Refused;
        }

        let Some(active) = guard.take() else {
            return CancelResult::Idle;
        };
        drop(guard);

        active.token.cancel();
        active.done.send_replace(Some(PlayOutcome::Cancelled));
        tracing::info!(run_id = %active.run_id, sequence = %active.name, "sequence cancelled");
        self.inner.events.publish(EngineEvent::SequenceFinished {
            run_id: active.run_id,
            name: active.name,
            outcome: PlayOutcome::Cancelled,
        });
        CancelResult::Cancelled
    }
}

impl EngineInner {
    fn state(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears state and reports `outcome`, unless `run_id` is no longer current.
    fn finish(&self, run_id: RunId, outcome: PlayOutcome) {
        let active = {
            let mut guard = self.state();
            match guard.as_ref() {
                Some(active) if active.run_id == run_id => guard.take(),
                _ => None,
            }
        };
        let Some(active) = active else {
            return;
        };

        active.done.send_replace(Some(outcome));
        let elapsed = self.clock.now().saturating_duration_since(active.started_at);
        tracing::info!(
            %run_id,
            sequence = %active.name,
            ?outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "sequence finished"
        );
        self.events.publish(EngineEvent::SequenceFinished {
            run_id,
            name: active.name,
            outcome,
        });
    }

    /// Returns false if cancelled before `duration` elapsed.
    async fn wait(&self, duration: Duration, token: &CancellationToken) -> bool {
        if duration.is_zero() {
            return !token.is_cancelled();
        }
        tokio::select! {
            _ = token.cancelled() => false,
            _ = self.clock.sleep(duration) => true,
        }
    }

    /// Runs a step action, isolating errors, panics and hangs.
    async fn run_action(&self, run_id: RunId, phase: &str, action: &StepAction) -> bool {
        let guarded = AssertUnwindSafe(async { action.invoke().await }).catch_unwind();
        let result = tokio::select! {
            result = guarded => result,
            _ = self.clock.sleep(self.action_timeout) => {
                tracing::warn!(
                    %run_id,
                    phase,
                    timeout_ms = self.action_timeout.as_millis() as u64,
                    "step action timed out"
                );
                return false;
            }
        };

        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(%run_id, phase, error = %format!("{e:#}"), "step action failed");
                false
            }
            Err(_) => {
                tracing::warn!(%run_id, phase, "step action panicked");
                false
            }
        }
    }
}

/// Reports [`PlayOutcome::Aborted`] if the run task is dropped mid-flight.
struct RunGuard {
    inner: Arc<EngineInner>,
    run_id: RunId,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.inner.finish(self.run_id, PlayOutcome::Aborted);
    }
}

async fn run_sequence(
    inner: Arc<EngineInner>,
    run_id: RunId,
    sequence: Sequence,
    token: CancellationToken,
) {
    let _guard = RunGuard {
        inner: inner.clone(),
        run_id,
    };
    let started = inner.clock.now();
    tracing::info!(
        %run_id,
        sequence = %sequence.name,
        steps = sequence.steps.len(),
        total_ms = sequence.total_duration.as_millis() as u64,
        "sequence started"
    );

    if let Some(sink) = &inner.sounds {
        for sound in &sequence.sounds {
            sink.play_sound(sound);
        }
    }

    for step in &sequence.steps {
        if !inner.wait(step.delay, &token).await {
            return;
        }

        tracing::debug!(%run_id, phase = %step.phase, "phase");
        inner.events.publish(EngineEvent::PhaseChanged {
            run_id,
            phase: step.phase.clone(),
        });
        if let (Some(sink), Some(sound)) = (&inner.sounds, &step.sound) {
            sink.play_sound(sound);
        }

        let succeeded = match &step.action {
            Some(action) => inner.run_action(run_id, &step.phase, action).await,
            None => true,
        };
        if token.is_cancelled() {
            return;
        }
        // A failed step forfeits its hold; the next step follows immediately.
        if succeeded && !inner.wait(step.duration, &token).await {
            return;
        }
    }

    let elapsed = inner.clock.now().saturating_duration_since(started);
    if let Some(rest) = sequence.total_duration.checked_sub(elapsed) {
        if !inner.wait(rest, &token).await {
            return;
        }
    }

    inner.finish(run_id, PlayOutcome::Completed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::sequence::SequenceStep;

    fn engine() -> SequenceEngine {
        SequenceEngine::new(Arc::new(TokioClock), EventBus::new(16))
    }

    #[tokio::test(start_paused = true)]
    async fn idle_engine_reports_idle() {
        let engine = engine();
        assert!(!engine.is_playing());
        assert_eq!(engine.cancel(), CancelResult::Idle);
        assert_eq!(engine.snapshot().current_sequence, None);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_tracks_the_running_sequence() {
        let engine = engine();
        let handle = engine.start(
            Sequence::new("intro", 500).step(SequenceStep::new("a", 0, 100)),
        );
        let snap = engine.snapshot();
        assert!(snap.is_playing);
        assert_eq!(snap.current_sequence.as_deref(), Some("intro"));
        assert_eq!(snap.run_id, Some(handle.run_id()));

        assert_eq!(handle.finished().await, PlayOutcome::Completed);
        assert!(!engine.is_playing());
    }

    #[test]
    fn start_outside_a_runtime_is_aborted() {
        let engine = engine();
        let handle = engine.start(Sequence::new("orphan", 10));
        assert!(handle.accepted());
        assert!(!engine.is_playing());
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(rt.block_on(handle.finished()), PlayOutcome::Aborted);
    }
}

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use portal_core::AnimationDefinition;

pub type ActionFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Side effect fired when a step is dispatched.
#[derive(Clone)]
pub struct StepAction(Arc<dyn Fn() -> ActionFuture + Send + Sync>);

impl StepAction {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self(Arc::new(move || f().boxed()))
    }

    /// Wraps a synchronous callback.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(move || std::future::ready(f()))
    }

    pub(crate) fn invoke(&self) -> ActionFuture {
        (self.0)()
    }
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepAction(..)")
    }
}

#[derive(Debug, Clone)]
pub struct SequenceStep {
    pub phase: String,
    /// Wait before dispatch, measured from the previous step's end.
    pub delay: Duration,
    /// Hold after the action completes.
    pub duration: Duration,
    pub sound: Option<String>,
    pub action: Option<StepAction>,
}

impl SequenceStep {
    pub fn new(phase: impl Into<String>, delay_ms: u64, duration_ms: u64) -> Self {
        Self {
            phase: phase.into(),
            delay: Duration::from_millis(delay_ms),
            duration: Duration::from_millis(duration_ms),
            sound: None,
            action: None,
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Time the step occupies when its action succeeds.
    pub fn span(&self) -> Duration {
        self.delay + self.duration
    }
}

/// Ordered list of timed steps with a minimum overall length.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    /// Lower bound on the sequence's total run time.
    pub total_duration: Duration,
    pub steps: Vec<SequenceStep>,
    /// Played once when the sequence starts.
    pub sounds: Vec<String>,
    pub cancellable: bool,
}

impl Sequence {
    pub fn new(name: impl Into<String>, total_ms: u64) -> Self {
        Self {
            name: name.into(),
            total_duration: Duration::from_millis(total_ms),
            steps: Vec::new(),
            sounds: Vec::new(),
            cancellable: false,
        }
    }

    pub fn step(mut self, step: SequenceStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_sounds<I, S>(mut self, sounds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sounds = sounds.into_iter().map(Into::into).collect();
        self
    }

    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    /// Sum of every step's delay and duration.
    pub fn scripted_span(&self) -> Duration {
        self.steps.iter().map(SequenceStep::span).sum()
    }

    /// Expands a registered animation into one step per sound effect.
    ///
    /// Phases are named `"<id>:<n>"` and split the definition's duration
    /// evenly; the last step absorbs any remainder. A definition without
    /// sounds becomes a single step.
    pub fn from_definition(def: &AnimationDefinition) -> Self {
        let mut sequence = Self::new(def.id.clone(), def.duration_ms).cancellable(def.cancellable);
        if def.sounds.is_empty() {
            return sequence.step(SequenceStep::new(format!("{}:0", def.id), 0, def.duration_ms));
        }

        let count = def.sounds.len() as u64;
        let slice = def.duration_ms / count;
        for (n, sound) in def.sounds.iter().enumerate() {
            let is_last = n as u64 == count - 1;
            let duration = if is_last {
                def.duration_ms - slice * (count - 1)
            } else {
                slice
            };
            sequence = sequence.step(
                SequenceStep::new(format!("{}:{n}", def.id), 0, duration).with_sound(sound.clone()),
            );
        }
        sequence
    }
}

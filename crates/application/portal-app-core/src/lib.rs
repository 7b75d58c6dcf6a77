pub mod app;
pub mod audio;
pub mod clock;
pub mod engine;
pub mod events;
pub mod memory;
pub mod navigation;
pub mod ports;
pub mod scripts;
pub mod secret;
pub mod sequence;
pub mod settings;

pub use app::{PortalApplication, SECRET_ROUTE};
pub use audio::{
    AudioError, AudioGate, Gesture, SoundBuffer, SoundFormat, SoundSource, TracingAudioBackend,
};
pub use clock::TokioClock;
pub use engine::{CancelResult, EngineSnapshot, PlayHandle, PlayOutcome, RunId, SequenceEngine};
pub use events::{EngineEvent, EventBus};
pub use memory::{AnimationMemory, MemoryRecord};
pub use navigation::{NavigateOptions, NavigateOutcome, NavigationError, NavigationGate};
pub use ports::*;
pub use secret::SecretCodeDetector;
pub use sequence::{Sequence, SequenceStep, StepAction};
pub use settings::PortalSettings;

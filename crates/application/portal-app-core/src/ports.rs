use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::audio::{AudioError, SoundBuffer, SoundSource};

pub use portal_persistence::KeyValueStore;

/// Time source for every suspension point in the engine.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Host route-change primitive.
pub trait RouterPort: Send + Sync + 'static {
    fn current_route(&self) -> Option<String>;
    fn push(&self, route: &str) -> anyhow::Result<()>;
}

/// Loads and plays decoded sound buffers on the host audio device.
#[async_trait]
pub trait AudioBackend: Send + Sync + 'static {
    async fn decode(&self, name: &str, source: &SoundSource) -> Result<SoundBuffer, AudioError>;
    fn play(&self, buffer: &SoundBuffer) -> Result<(), AudioError>;
}

/// Fire-and-forget sound trigger used by the sequence engine.
pub trait SoundSink: Send + Sync {
    fn play_sound(&self, name: &str) -> bool;
}

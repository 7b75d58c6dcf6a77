use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::events::{EngineEvent, EventBus};
use crate::ports::{AudioBackend, SoundSink};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to read sound {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sound {name} is not a recognised audio format")]
    Decode { name: String },
    #[error("playback of {name} failed: {reason}")]
    Playback { name: String, reason: String },
}

/// User interaction that may unlock audio playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gesture {
    Click,
    Touch,
    KeyDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    File(Utf8PathBuf),
    Inline(Arc<[u8]>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Wav,
    Mp3,
    Ogg,
}

impl SoundFormat {
    /// Sniffs the container from its magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(Self::Wav);
        }
        if bytes.starts_with(b"OggS") {
            return Some(Self::Ogg);
        }
        let mpeg_sync = bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0;
        if bytes.starts_with(b"ID3") || mpeg_sync {
            return Some(Self::Mp3);
        }
        None
    }
}

/// A sound ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundBuffer {
    pub name: String,
    pub format: SoundFormat,
    pub bytes: Arc<[u8]>,
}

type GestureCallback = Box<dyn FnOnce(Gesture) + Send>;

struct AudioState {
    unlocked_by: Option<Gesture>,
    enabled: bool,
    buffers: HashMap<String, Arc<SoundBuffer>>,
    pending: Vec<GestureCallback>,
}

/// Holds sound playback until the first user gesture.
///
/// The unlock is a one-way latch. Callbacks registered through
/// [`AudioGate::on_first_gesture`] fire exactly once, on whichever of click,
/// touch or key-down arrives first.
pub struct AudioGate {
    backend: Arc<dyn AudioBackend>,
    events: Option<EventBus>,
    state: Mutex<AudioState>,
}

impl AudioGate {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            events: None,
            state: Mutex::new(AudioState {
                unlocked_by: None,
                enabled: true,
                buffers: HashMap::new(),
                pending: Vec::new(),
            }),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn state(&self) -> MutexGuard<'_, AudioState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_unlocked(&self) -> bool {
        self.state().unlocked_by.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
        tracing::debug!(enabled, "sound toggled");
    }

    /// Returns true only for the gesture that unlocked audio.
    pub fn observe_gesture(&self, gesture: Gesture) -> bool {
        let callbacks = {
            let mut state = self.state();
            if state.unlocked_by.is_some() {
                return false;
            }
            state.unlocked_by = Some(gesture);
            std::mem::take(&mut state.pending)
        };

        tracing::info!(?gesture, callbacks = callbacks.len(), "audio unlocked");
        if let Some(events) = &self.events {
            events.publish(EngineEvent::AudioUnlocked { gesture });
        }
        for callback in callbacks {
            callback(gesture);
        }
        true
    }

    /// Runs `callback` on the first gesture, or right away if audio is already unlocked.
    pub fn on_first_gesture(&self, callback: impl FnOnce(Gesture) + Send + 'static) {
        let unlocked_by = {
            let mut state = self.state();
            match state.unlocked_by {
                Some(gesture) => Some(gesture),
                None => {
                    state.pending.push(Box::new(callback));
                    return;
                }
            }
        };
        if let Some(gesture) = unlocked_by {
            callback(gesture);
        }
    }

    /// Decodes and caches a sound. Failures are logged and leave the name unplayable.
    pub async fn load_sound(&self, name: &str, source: &SoundSource) -> bool {
        match self.backend.decode(name, source).await {
            Ok(buffer) => {
                tracing::debug!(
                    name,
                    format = ?buffer.format,
                    bytes = buffer.bytes.len(),
                    "sound loaded"
                );
                self.state()
                    .buffers
                    .insert(name.to_string(), Arc::new(buffer));
                true
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to load sound");
                self.state().buffers.remove(name);
                false
            }
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state().buffers.contains_key(name)
    }

    pub fn loaded_sounds(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().buffers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Plays a loaded sound. Silently skipped while locked, disabled or unknown.
    pub fn play_sound(&self, name: &str) -> bool {
        let buffer = {
            let state = self.state();
            if state.unlocked_by.is_none() {
                tracing::trace!(name, "audio locked, skipping sound");
                return false;
            }
            if !state.enabled {
                tracing::trace!(name, "sound disabled, skipping");
                return false;
            }
            match state.buffers.get(name) {
                Some(buffer) => Arc::clone(buffer),
                None => {
                    tracing::debug!(name, "sound not loaded");
                    return false;
                }
            }
        };

        match self.backend.play(&buffer) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(name, error = %e, "sound playback failed");
                false
            }
        }
    }
}

impl SoundSink for AudioGate {
    fn play_sound(&self, name: &str) -> bool {
        AudioGate::play_sound(self, name)
    }
}

/// Backend that decodes real files and reports playback through tracing.
/// Used by headless hosts such as the CLI.
#[derive(Debug, Default)]
pub struct TracingAudioBackend;

#[async_trait]
impl AudioBackend for TracingAudioBackend {
    async fn decode(&self, name: &str, source: &SoundSource) -> Result<SoundBuffer, AudioError> {
        let bytes: Arc<[u8]> = match source {
            SoundSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|err| AudioError::Read {
                    name: name.to_string(),
                    source: err,
                })?
                .into(),
            SoundSource::Inline(bytes) => Arc::clone(bytes),
        };
        let format = SoundFormat::detect(&bytes).ok_or_else(|| AudioError::Decode {
            name: name.to_string(),
        })?;
        Ok(SoundBuffer {
            name: name.to_string(),
            format,
            bytes,
        })
    }

    fn play(&self, buffer: &SoundBuffer) -> Result<(), AudioError> {
        tracing::info!(sound = %buffer.name, format = ?buffer.format, "playing sound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_sniffing() {
        assert_eq!(SoundFormat::detect(b"RIFF\0\0\0\0WAVEfmt "), Some(SoundFormat::Wav));
        assert_eq!(SoundFormat::detect(b"OggS\0"), Some(SoundFormat::Ogg));
        assert_eq!(SoundFormat::detect(b"ID3\x04"), Some(SoundFormat::Mp3));
        assert_eq!(SoundFormat::detect(&[0xFF, 0xFB, 0x90]), Some(SoundFormat::Mp3));
        assert_eq!(SoundFormat::detect(b"<html>"), None);
        assert_eq!(SoundFormat::detect(b""), None);
    }

    #[tokio::test]
    async fn missing_file_fails_to_load() {
        let gate = AudioGate::new(Arc::new(TracingAudioBackend));
        let source = SoundSource::File("/definitely/not/here.mp3".into());
        assert!(!gate.load_sound("ghost", &source).await);
        assert!(!gate.is_loaded("ghost"));
    }

    #[tokio::test]
    async fn undecodable_bytes_replace_a_previous_buffer() {
        let gate = AudioGate::new(Arc::new(TracingAudioBackend));
        let good = SoundSource::Inline(Arc::from(&b"OggS\0\0"[..]));
        let bad = SoundSource::Inline(Arc::from(&b"nope"[..]));
        assert!(gate.load_sound("hum", &good).await);
        assert!(!gate.load_sound("hum", &bad).await);
        assert!(gate.loaded_sounds().is_empty());
    }
}

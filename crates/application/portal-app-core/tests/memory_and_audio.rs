use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use portal_app_core::{
    AnimationMemory, AudioBackend, AudioError, AudioGate, EngineEvent, EventBus, Gesture,
    Sequence, SequenceEngine, SequenceStep, SoundBuffer, SoundFormat, SoundSource, TokioClock,
};
use portal_persistence::{FileKeyValueStore, InMemoryKeyValueStore};

fn file_memory() -> (tempfile::TempDir, Utf8PathBuf, AnimationMemory) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let memory = AnimationMemory::new(Arc::new(FileKeyValueStore::new(root.clone())));
    (dir, root, memory)
}

#[test]
fn visits_are_recorded_once_and_persist() {
    let (_dir, root, memory) = file_memory();
    memory.record_visit("/about").unwrap();
    let record = memory.record_visit("/about").unwrap();
    assert_eq!(record.pages_visited, ["/about"]);
    assert!(record.last_visit.is_some());

    let reopened = AnimationMemory::new(Arc::new(FileKeyValueStore::new(root)));
    assert!(reopened.has_visited("/about").unwrap());
    assert!(!reopened.has_visited("/team").unwrap());
}

#[test]
fn reduction_starts_after_the_fourth_distinct_route() {
    let memory = AnimationMemory::new(Arc::new(InMemoryKeyValueStore::new()));
    for route in ["/", "/about", "/team"] {
        memory.record_visit(route).unwrap();
    }
    memory.record_visit("/about").unwrap();
    assert!(!memory.should_reduce_animations().unwrap());

    let record = memory.record_visit("/contact").unwrap();
    assert!(record.animations_reduced);
    assert_eq!(record.pages_visited.len(), 4);
}

#[test]
fn gate_flag_and_reset() {
    let memory = AnimationMemory::new(Arc::new(InMemoryKeyValueStore::new()));
    assert!(!memory.read().unwrap().gate_opened);
    memory.mark_gate_opened().unwrap();
    memory.record_visit("/").unwrap();
    assert!(memory.read().unwrap().gate_opened);

    memory.reset().unwrap();
    let record = memory.read().unwrap();
    assert!(!record.gate_opened);
    assert!(record.pages_visited.is_empty());
}

#[derive(Default)]
struct SpyBackend {
    played: Mutex<Vec<String>>,
    decodes: AtomicUsize,
}

impl SpyBackend {
    fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioBackend for SpyBackend {
    async fn decode(&self, name: &str, _source: &SoundSource) -> Result<SoundBuffer, AudioError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if name.starts_with("broken") {
            return Err(AudioError::Decode {
                name: name.to_string(),
            });
        }
        Ok(SoundBuffer {
            name: name.to_string(),
            format: SoundFormat::Ogg,
            bytes: Arc::from(&b"OggS"[..]),
        })
    }

    fn play(&self, buffer: &SoundBuffer) -> Result<(), AudioError> {
        if buffer.name == "jammed" {
            return Err(AudioError::Playback {
                name: buffer.name.clone(),
                reason: "device busy".into(),
            });
        }
        self.played.lock().unwrap().push(buffer.name.clone());
        Ok(())
    }
}

fn source() -> SoundSource {
    SoundSource::Inline(Arc::from(&b"OggS"[..]))
}

#[tokio::test]
async fn sounds_stay_silent_until_the_first_gesture() {
    let backend = Arc::new(SpyBackend::default());
    let gate = AudioGate::new(backend.clone());
    assert!(gate.load_sound("gate-opening", &source()).await);

    assert!(!gate.play_sound("gate-opening"));
    assert!(backend.played().is_empty());

    assert!(gate.observe_gesture(Gesture::Touch));
    assert!(gate.play_sound("gate-opening"));
    assert_eq!(backend.played(), ["gate-opening"]);
}

#[tokio::test]
async fn unlock_is_a_one_way_latch() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let gate = AudioGate::new(Arc::new(SpyBackend::default())).with_events(bus);

    let fired = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..2 {
        let fired = fired.clone();
        gate.on_first_gesture(move |g| fired.lock().unwrap().push(g));
    }

    assert!(gate.observe_gesture(Gesture::Click));
    assert!(!gate.observe_gesture(Gesture::KeyDown));
    assert!(!gate.observe_gesture(Gesture::Touch));
    assert_eq!(*fired.lock().unwrap(), [Gesture::Click, Gesture::Click]);

    // Late registration fires immediately with the unlocking gesture.
    let late = fired.clone();
    gate.on_first_gesture(move |g| late.lock().unwrap().push(g));
    assert_eq!(fired.lock().unwrap().len(), 3);

    assert_eq!(
        rx.try_recv().unwrap(),
        EngineEvent::AudioUnlocked {
            gesture: Gesture::Click
        }
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failures_and_toggles_are_quiet() {
    let backend = Arc::new(SpyBackend::default());
    let gate = AudioGate::new(backend.clone());
    gate.observe_gesture(Gesture::KeyDown);

    assert!(!gate.load_sound("broken-chime", &source()).await);
    assert!(!gate.play_sound("broken-chime"));
    assert!(!gate.play_sound("never-loaded"));

    assert!(gate.load_sound("jammed", &source()).await);
    assert!(!gate.play_sound("jammed"));

    assert!(gate.load_sound("hum", &source()).await);
    gate.set_enabled(false);
    assert!(!gate.play_sound("hum"));
    gate.set_enabled(true);
    assert!(gate.play_sound("hum"));

    assert_eq!(backend.played(), ["hum"]);
    assert_eq!(backend.decodes.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn engine_plays_sequence_and_step_sounds_through_the_gate() {
    let backend = Arc::new(SpyBackend::default());
    let gate = Arc::new(AudioGate::new(backend.clone()));
    for name in ["portal-open", "data-slice", "glitch"] {
        gate.load_sound(name, &source()).await;
    }
    let engine = SequenceEngine::new(Arc::new(TokioClock), EventBus::new(16))
        .with_sound_sink(gate.clone());
    let sequence = || {
        Sequence::new("portal", 300)
            .with_sounds(["portal-open", "data-slice"])
            .step(SequenceStep::new("rings", 0, 100))
            .step(SequenceStep::new("glitch", 50, 100).with_sound("glitch"))
    };

    engine.play(sequence()).await;
    assert!(backend.played().is_empty(), "played before any gesture");

    gate.observe_gesture(Gesture::Click);
    engine.play(sequence()).await;
    assert_eq!(backend.played(), ["portal-open", "data-slice", "glitch"]);
}

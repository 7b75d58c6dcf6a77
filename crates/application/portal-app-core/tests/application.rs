use std::sync::{Arc, Mutex};

use portal_app_core::{
    scripts, KeyValueStore, NavigateOutcome, PlayOutcome, PortalApplication, PortalSettings,
    RouterPort, TracingAudioBackend, SECRET_ROUTE,
};
use portal_core::{ScriptedSource, Theme};
use portal_persistence::InMemoryKeyValueStore;

#[derive(Default)]
struct MemoryRouter {
    current: Mutex<Option<String>>,
}

impl RouterPort for MemoryRouter {
    fn current_route(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }

    fn push(&self, route: &str) -> anyhow::Result<()> {
        *self.current.lock().unwrap() = Some(route.to_string());
        Ok(())
    }
}

fn app(store: Arc<InMemoryKeyValueStore>) -> PortalApplication<MemoryRouter> {
    PortalApplication::new(
        store,
        MemoryRouter::default(),
        Arc::new(TracingAudioBackend),
        ScriptedSource::new([0.25, 0.5, 0.75]),
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn stored_settings_shape_the_registry() {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let mut settings = PortalSettings::default();
    settings.primary_theme = "jjk".into();
    settings.sound_enabled = false;
    settings.set_theme_weight("naruto", 40);
    settings.save(store.as_ref()).unwrap();

    let app = app(store);
    let registry = app.registry().read().unwrap();
    assert_eq!(registry.primary_theme(), &Theme::new("jjk"));
    assert_eq!(registry.theme_weight(&Theme::new("naruto")), 40);
    assert!(!app.audio().is_enabled());
}

#[tokio::test(start_paused = true)]
async fn weight_changes_are_clamped_and_persisted() {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let mut app = app(store.clone());
    assert_eq!(app.set_theme_weight("sao", 0).unwrap(), 1);
    assert_eq!(app.set_theme_weight("sao", 7).unwrap(), 7);

    let saved = PortalSettings::load(store.as_ref()).unwrap();
    assert_eq!(saved.theme_weights["sao"], 7);
    assert!(store.get(portal_config::SETTINGS_STORAGE_KEY).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn scripts_and_catalogue_entries_play_by_name() {
    let app = app(Arc::new(InMemoryKeyValueStore::new()));
    assert_eq!(
        app.play_named(scripts::PORTAL_TRANSITION).await.unwrap(),
        PlayOutcome::Completed
    );
    assert_eq!(app.play_named("gate-opening").await.unwrap(), PlayOutcome::Completed);
    assert!(app.play_named("no-such-thing").await.is_err());
}

#[tokio::test(start_paused = true)]
async fn default_navigation_records_the_visit() {
    let app = app(Arc::new(InMemoryKeyValueStore::new()));
    let outcome = app.navigate_default("/projects").await.unwrap();
    assert!(matches!(outcome, NavigateOutcome::Navigated { .. }));
    assert_eq!(
        app.navigation().router().current_route().as_deref(),
        Some("/projects")
    );
    assert!(app.memory().has_visited("/projects").unwrap());
}

#[tokio::test(start_paused = true)]
async fn key_presses_unlock_audio_and_the_secret_route() {
    let app = app(Arc::new(InMemoryKeyValueStore::new()));
    assert!(!app.audio().is_unlocked());

    let mut unlocked = None;
    for key in portal_app_core::secret::KONAMI_CODE {
        unlocked = app.key_pressed(key);
    }
    assert!(app.audio().is_unlocked());
    assert_eq!(unlocked, Some(SECRET_ROUTE));
}

#[tokio::test(start_paused = true)]
async fn welcome_message_comes_from_the_list() {
    let app = app(Arc::new(InMemoryKeyValueStore::new()));
    let message = app.welcome_message();
    assert!(portal_core::welcome::all().any(|m| m == message));
}

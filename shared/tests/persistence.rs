mod common;

use common::{cam, ops, seed, seed_without, Tester, RENDER, START_MS};
use std::collections::BTreeSet;
use webcams_shared::settings::StoredSettings;
use webcams_shared::{
    AppConfig, CatalogSeed, CatalogStorage, EffectFfi, Event, ManualClock, MemoryStorage, Model,
    Settings, SqliteStorage, StorageError, Theme, TimerOperation, WebcamId,
};

fn start(storage: Box<dyn CatalogStorage>) -> Model {
    Model::new(AppConfig::default(), storage, Box::new(ManualClock::at(START_MS))).unwrap()
}

fn favorite_ids(model: &Model) -> BTreeSet<WebcamId> {
    model.catalog.favorites().map(|w| w.id.clone()).collect()
}

#[test]
fn state_survives_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("webcams.sqlite");
    let app = Tester::default();

    let mut model = start(Box::new(SqliteStorage::open(&path).unwrap()));
    assert!(app.view(&model).carousel.is_empty());
    app.update(Event::CatalogSynced(Box::new(seed())), &mut model);
    app.update(
        Event::FavoriteToggled {
            webcam_id: cam("sancy-station"),
        },
        &mut model,
    );
    app.update(Event::DarkThemeToggled { enabled: true }, &mut model);
    app.update(Event::AutorefreshToggled { enabled: true }, &mut model);
    app.update(Event::AutorefreshIntervalEntered { minutes: 30 }, &mut model);
    drop(model);

    let mut model = start(Box::new(SqliteStorage::open(&path).unwrap()));
    let view = app.view(&model);
    assert_eq!(view.theme, Theme::Dark);
    assert!(view.settings.should_autorefresh);
    assert_eq!(view.settings.autorefresh_interval_minutes, 30);
    assert_eq!(view.carousel.len(), 3);
    assert_eq!(favorite_ids(&model), BTreeSet::from([cam("sancy-station")]));

    let update = app.update(Event::AppStarted, &mut model);
    assert!(ops(&update).iter().any(|op| matches!(
        op,
        EffectFfi::Timer(TimerOperation::Schedule { after_secs: 1800, .. })
    )));
}

#[test]
fn sync_keeps_favorites_across_restart_in_memory() {
    let app = Tester::default();
    let mut model = start(Box::new(MemoryStorage::with_catalog(seed())));
    app.update(
        Event::FavoriteToggled {
            webcam_id: cam("pdd-chaine"),
        },
        &mut model,
    );
    app.update(Event::CatalogSynced(Box::new(seed())), &mut model);
    assert!(model.catalog.webcam(&cam("pdd-chaine")).unwrap().is_favorite);

    let model = start(model.into_storage());
    assert!(model.catalog.webcam(&cam("pdd-chaine")).unwrap().is_favorite);
}

/// A webcam that leaves the catalog loses its favorite flag, in memory and on
/// disk alike, so it comes back unfavorited.
fn favorite_of_a_removed_webcam_is_forgotten(storage: Box<dyn CatalogStorage>) {
    let app = Tester::default();
    let mut model = start(storage);
    app.update(
        Event::FavoriteToggled {
            webcam_id: cam("sancy-lac"),
        },
        &mut model,
    );

    app.update(Event::CatalogSynced(Box::new(seed_without("sancy"))), &mut model);
    app.update(Event::CatalogSynced(Box::new(seed())), &mut model);
    assert!(!model.catalog.webcam(&cam("sancy-lac")).unwrap().is_favorite);

    let storage = model.into_storage();
    let stored = storage.load_favorites().unwrap();
    assert!(stored.is_empty());

    let model = start(storage);
    assert_eq!(favorite_ids(&model), stored);
    assert!(!model.catalog.webcam(&cam("sancy-lac")).unwrap().is_favorite);
}

#[test]
fn removed_webcam_is_unfavorited_in_memory_storage() {
    favorite_of_a_removed_webcam_is_forgotten(Box::new(MemoryStorage::with_catalog(seed())));
}

#[test]
fn removed_webcam_is_unfavorited_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = SqliteStorage::open(dir.path().join("webcams.sqlite")).unwrap();
    storage.save_catalog(&seed()).unwrap();
    favorite_of_a_removed_webcam_is_forgotten(Box::new(storage));
}

#[test]
fn duplicate_ids_in_a_sync_are_rejected() {
    let app = Tester::default();
    let mut model = start(Box::new(MemoryStorage::with_catalog(seed())));
    let mut bad = seed();
    let dup = bad.sections[0].webcams[0].clone();
    bad.sections[2].webcams.push(dup);

    let update = app.update(Event::CatalogSynced(Box::new(bad)), &mut model);
    assert_eq!(ops(&update), vec![RENDER]);
    assert_eq!(app.view(&model).error.unwrap().error_code, "VALIDATION_ERROR");
    assert_eq!(model.catalog.len(), 6);
}

/// Reads work, every write fails.
struct ReadOnlyStorage(MemoryStorage);

impl CatalogStorage for ReadOnlyStorage {
    fn load_catalog(&self) -> Result<Option<CatalogSeed>, StorageError> {
        self.0.load_catalog()
    }
    fn save_catalog(&mut self, _: &CatalogSeed) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read-only".into()))
    }
    fn load_favorites(&self) -> Result<BTreeSet<WebcamId>, StorageError> {
        self.0.load_favorites()
    }
    fn save_favorite(&mut self, _: &WebcamId, _: bool) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read-only".into()))
    }
    fn load_settings(&self) -> Result<StoredSettings, StorageError> {
        self.0.load_settings()
    }
    fn save_settings(&mut self, _: &Settings) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("read-only".into()))
    }
}

#[test]
fn failed_writes_change_nothing() {
    let app = Tester::default();
    let mut model = start(Box::new(ReadOnlyStorage(MemoryStorage::with_catalog(seed()))));
    app.update(Event::FavoritesSelected, &mut model);

    let update = app.update(
        Event::FavoriteToggled {
            webcam_id: cam("pdd-summit"),
        },
        &mut model,
    );
    assert_eq!(ops(&update), vec![RENDER]);
    let view = app.view(&model);
    let error = view.error.unwrap();
    assert_eq!(error.error_code, "STORAGE_ERROR");
    assert!(error.is_retryable);
    assert!(view.grid.unwrap().cells.is_empty());
    assert!(!model.catalog.webcam(&cam("pdd-summit")).unwrap().is_favorite);

    app.update(Event::DarkThemeToggled { enabled: true }, &mut model);
    assert_eq!(app.view(&model).theme, Theme::Light);

    let update = app.update(Event::AutorefreshToggled { enabled: true }, &mut model);
    assert!(!ops(&update).iter().any(|op| matches!(op, EffectFfi::Timer(_))));
    assert!(!model.timer.is_armed());
}

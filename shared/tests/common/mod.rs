#![allow(dead_code)]

use crux_core::testing::{AppTester, Update};
use webcams_shared::{
    App, AppConfig, CatalogSeed, Clock, Effect, EffectFfi, Event, ManualClock, MemoryStorage,
    Model, RenderOperation, SectionId, WebcamId,
};

pub const START_MS: u64 = 1_700_000_000_000;

pub fn seed() -> CatalogSeed {
    CatalogSeed::from_json_str(
        r#"{
            "sections": [
                { "id": "lioran", "title": "Le Lioran", "webcams": [
                    { "id": "lioran-pistes", "title": "Pistes", "image_urls": ["https://cams.example/lioran.jpg"] }
                ]},
                { "id": "pdd", "title": "Puy de Dôme", "webcams": [
                    { "id": "pdd-summit", "title": "Sommet", "image_urls": ["https://cams.example/pdd-hd.jpg", "https://cams.example/pdd.jpg"], "tags": ["volcan"] },
                    { "id": "pdd-chaine", "title": "Chaîne des Puys", "image_urls": ["https://cams.example/chaine.jpg"] },
                    { "id": "pdd-antenne", "title": "Antenne", "image_urls": ["not a url", "https://cams.example/antenne.jpg"] }
                ]},
                { "id": "sancy", "title": "Sancy", "webcams": [
                    { "id": "sancy-lac", "title": "Lac Chambon", "image_urls": ["https://cams.example/lac.jpg"] },
                    { "id": "sancy-station", "title": "Station du Mont-Dore" }
                ]}
            ]
        }"#,
    )
    .unwrap()
}

/// `seed()` with every webcam of `section` removed.
pub fn seed_without(section: &str) -> CatalogSeed {
    let mut seed = seed();
    for s in &mut seed.sections {
        if s.id.as_str() == section {
            s.webcams.clear();
        }
    }
    seed
}

pub type Tester = AppTester<App, Effect>;

pub fn app() -> (Tester, Model, ManualClock) {
    let clock = ManualClock::at(START_MS);
    let model = Model::new(
        AppConfig::default(),
        Box::new(MemoryStorage::with_catalog(seed())),
        Box::new(clock.clone()),
    )
    .unwrap();
    (Tester::default(), model, clock)
}

/// App that has launched and shown its carousel once.
pub fn launched() -> (Tester, Model, ManualClock) {
    let (app, mut model, clock) = app();
    app.update(Event::AppStarted, &mut model);
    app.update(
        Event::ScreenAppeared {
            screen: webcams_shared::Screen::Carousel,
        },
        &mut model,
    );
    assert_eq!(app.view(&model).last_update_ms, Some(clock.now().0));
    (app, model, clock)
}

pub fn cam(id: &str) -> WebcamId {
    WebcamId::new(id)
}

pub fn section(id: &str) -> SectionId {
    SectionId::new(id)
}

pub const RENDER: EffectFfi = EffectFfi::Render(RenderOperation);

/// The operations an update asked the shell for, in order.
pub fn ops(update: &Update<Effect, Event>) -> Vec<EffectFfi> {
    update.effects().map(Effect::operation).collect()
}

pub fn renders(update: &Update<Effect, Event>) -> bool {
    update.effects.last().is_some_and(Effect::is_render)
}

mod common;

use common::{cam, launched, ops, Tester, RENDER};
use crux_core::testing::Update;
use crux_core::Request;
use std::time::Duration;
use webcams_shared::{
    Clock, Effect, EffectFfi, Event, ImageCacheOperation, Model, RefreshTrigger, Theme, TimerId,
    TimerOperation,
};

fn clears() -> Vec<EffectFfi> {
    ImageCacheOperation::clear_all()
        .into_iter()
        .map(EffectFfi::ImageCache)
        .collect()
}

/// The schedule request an update made, with its timer id and delay.
fn armed(update: Update<Effect, Event>) -> (Request<TimerOperation>, TimerId, u64) {
    update
        .into_effects()
        .filter_map(Effect::into_timer)
        .find_map(|request| match request.operation.clone() {
            TimerOperation::Schedule { id, after_secs } => Some((request, id, after_secs)),
            TimerOperation::Cancel { .. } => None,
        })
        .unwrap()
}

/// The shell reports the timer went off; returns the event the core asked for.
fn fire(app: &Tester, request: &mut Request<TimerOperation>) -> Event {
    let mut fired = app.resolve(request, ()).unwrap();
    assert_eq!(fired.events.len(), 1);
    fired.events.remove(0)
}

#[test]
fn manual_refresh_clears_cache_and_stamps_time() {
    let (app, mut model, clock) = launched();
    clock.advance(Duration::from_secs(5));

    let update = app.update(
        Event::RefreshRequested {
            trigger: RefreshTrigger::PullToRefresh,
        },
        &mut model,
    );
    let mut expected = clears();
    expected.push(RENDER);
    assert_eq!(ops(&update), expected);

    let view = app.view(&model);
    assert!(!view.is_refreshing);
    assert_eq!(view.last_update_ms, Some(clock.now().0));
}

#[test]
fn offline_refresh_keeps_cache_but_still_updates() {
    let (app, mut model, clock) = launched();
    let offline = || Event::NetworkStatusChanged { online: false };
    assert_eq!(ops(&app.update(offline(), &mut model)), vec![RENDER]);
    assert!(app.update(offline(), &mut model).effects.is_empty());

    clock.advance(Duration::from_secs(30));
    let update = app.update(
        Event::RefreshRequested {
            trigger: RefreshTrigger::Manual,
        },
        &mut model,
    );
    assert_eq!(ops(&update), vec![RENDER]);
    let view = app.view(&model);
    assert_eq!(view.last_update_ms, Some(clock.now().0));
    assert!(!view.is_online);
}

#[test]
fn stale_content_refreshes_when_a_screen_appears() {
    let (app, mut model, clock) = launched();
    app.update(
        Event::SectionSelected {
            section_id: common::section("pdd"),
        },
        &mut model,
    );
    let screen = app.view(&model).navigation[1].clone();

    clock.advance(Duration::from_secs(599));
    let update = app.update(
        Event::ScreenAppeared {
            screen: screen.clone(),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());

    clock.advance(Duration::from_secs(1));
    let update = app.update(Event::ScreenAppeared { screen }, &mut model);
    assert!(ops(&update).starts_with(&clears()));
}

#[test]
fn loaded_images_clear_the_outdated_badge() {
    let (app, mut model, clock) = launched();
    assert!(app.view(&model).carousel[0].webcams.iter().all(|c| c.is_outdated));

    app.update(
        Event::ImageLoaded {
            webcam_id: cam("pdd-summit"),
        },
        &mut model,
    );
    let card = |model: &Model| {
        app.view(model).carousel[0]
            .webcams
            .iter()
            .find(|c| c.id == cam("pdd-summit"))
            .cloned()
            .unwrap()
    };
    assert!(!card(&model).is_outdated);

    clock.advance(Duration::from_secs(601));
    assert!(card(&model).is_outdated);

    // Unknown ids are ignored.
    let update = app.update(
        Event::ImageLoaded {
            webcam_id: cam("gone"),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
}

#[test]
fn autorefresh_timer_follows_settings() {
    let (app, mut model, clock) = launched();

    let update = app.update(Event::AutorefreshToggled { enabled: true }, &mut model);
    let (mut request, first, after_secs) = armed(update);
    assert_eq!(after_secs, 600);

    // The firing refreshes and schedules the next cycle.
    clock.advance(Duration::from_secs(after_secs));
    let event = fire(&app, &mut request);
    assert_eq!(event, Event::TimerFired { id: first.clone() });
    let update = app.update(event, &mut model);
    assert_eq!(
        ops(&update),
        vec![
            EffectFfi::Timer(TimerOperation::Schedule {
                id: first.clone(),
                after_secs: 600
            }),
            EffectFfi::ImageCache(ImageCacheOperation::ClearDisk),
            EffectFfi::ImageCache(ImageCacheOperation::ClearMemory),
            RENDER,
        ]
    );
    assert_eq!(app.view(&model).last_update_ms, Some(clock.now().0));
    let (mut rescheduled, _, _) = armed(update);

    // New interval: old timer cancelled, new one scheduled, nothing fires now.
    let update = app.update(Event::AutorefreshIntervalEntered { minutes: 5 }, &mut model);
    let sent = ops(&update);
    assert_eq!(
        sent[0],
        EffectFfi::Timer(TimerOperation::Cancel { id: first.clone() })
    );
    assert!(!sent
        .iter()
        .any(|op| matches!(op, EffectFfi::ImageCache(ImageCacheOperation::ClearDisk))));
    let (_, second, after_secs) = armed(update);
    assert_eq!(after_secs, 300);
    assert_ne!(first, second);

    // The cancelled timer's late firing is ignored.
    let late = fire(&app, &mut rescheduled);
    assert!(app.update(late, &mut model).effects.is_empty());

    let update = app.update(Event::AutorefreshToggled { enabled: false }, &mut model);
    assert_eq!(
        ops(&update),
        vec![
            EffectFfi::Timer(TimerOperation::Cancel { id: second }),
            RENDER
        ]
    );
    assert!(!app.view(&model).settings.interval_row_visible);
}

#[test]
fn interval_outside_range_is_rejected_and_kept() {
    let (app, mut model, _) = launched();
    assert_eq!(app.view(&model).settings.autorefresh_interval_minutes, 10);

    for minutes in [0, 121, -5] {
        let update = app.update(Event::AutorefreshIntervalEntered { minutes }, &mut model);
        assert_eq!(ops(&update), vec![RENDER]);
        let view = app.view(&model);
        assert_eq!(view.settings.autorefresh_interval_minutes, 10);
        assert_eq!(view.error.unwrap().error_code, "VALIDATION_ERROR");
        app.update(Event::ErrorDismissed, &mut model);
    }

    app.update(Event::AutorefreshIntervalEntered { minutes: 60 }, &mut model);
    assert_eq!(model.settings.autorefresh_interval_secs(), 3600);
    assert!(app.view(&model).error.is_none());

    // Same value again: nothing to do.
    let update = app.update(Event::AutorefreshIntervalEntered { minutes: 60 }, &mut model);
    assert!(update.effects.is_empty());
}

#[test]
fn theme_toggle_renders_once_per_change() {
    let (app, mut model, _) = launched();
    let dark = || Event::DarkThemeToggled { enabled: true };
    assert_eq!(ops(&app.update(dark(), &mut model)), vec![RENDER]);
    assert_eq!(app.view(&model).theme, Theme::Dark);
    assert!(app.update(dark(), &mut model).effects.is_empty());
}

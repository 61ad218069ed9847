//! The core itself: turns [`Event`]s into capability requests against the
//! [`Model`] and projects the [`ViewModel`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{Capabilities, ImageCacheOperation, TimerOperation, UpdateCheckPolicy};
use crate::catalog::{CatalogError, CatalogStore};
use crate::config::AppConfig;
use crate::error::{AppError, UserFacingError};
use crate::event::Event;
use crate::event_bus::{Delivery, EventBus, Notification, Topic};
use crate::model::{Clock, SystemClock, UnixTimeMs};
use crate::navigation::{NavigationRequest, NavigationStack, Screen};
use crate::presenters::{
    CarouselRow, Freshness, GridPresenter, GridSource, GridView, ListPresenter, PruneOutcome,
    SearchPresenter, SearchView, WebcamCard,
};
use crate::refresh::{AutorefreshTimer, RefreshController, RefreshDecision, RefreshTrigger, TimerFire};
use crate::settings::{Settings, StoredSettings, Theme};
use crate::storage::{CatalogStorage, MemoryStorage};

/// Who listens on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscriber {
    Timer,
    Carousel,
    Grid,
    Search,
    Settings,
}

const PRESENTER_TOPICS: [Topic; 3] = [Topic::FavoriteChanged, Topic::ThemeChanged, Topic::Refreshed];

pub struct Model {
    config: AppConfig,
    storage: Box<dyn CatalogStorage>,
    clock: Box<dyn Clock>,
    pub catalog: CatalogStore,
    pub settings: Settings,
    pub refresh: RefreshController,
    pub timer: AutorefreshTimer,
    pub nav: NavigationStack,
    pub list: ListPresenter,
    pub grid: Option<GridPresenter>,
    pub search: SearchPresenter,
    pub bus: EventBus<Subscriber>,
    pub network_online: bool,
    pub active_error: Option<AppError>,
}

/// Empty in-memory catalog on the system clock.
impl Default for Model {
    fn default() -> Self {
        let config = AppConfig::default();
        let catalog = CatalogStore::new(config.section_order.clone());
        let settings = Settings::restore(StoredSettings::default(), &config);
        Self::assemble(
            config,
            Box::new(MemoryStorage::new()),
            Box::new(SystemClock),
            catalog,
            settings,
        )
    }
}

impl Model {
    /// Validates `config` and restores the catalog, favorites and settings
    /// from `storage`.
    #[instrument(skip_all)]
    pub fn new(
        config: AppConfig,
        storage: Box<dyn CatalogStorage>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let catalog = CatalogStore::load(storage.as_ref(), config.section_order.clone())?;
        let settings = Settings::restore(storage.load_settings()?, &config);

        info!(
            webcams = catalog.len(),
            dark = settings.is_dark_theme(),
            autorefresh = settings.should_autorefresh(),
            "core ready"
        );
        Ok(Self::assemble(config, storage, clock, catalog, settings))
    }

    fn assemble(
        config: AppConfig,
        storage: Box<dyn CatalogStorage>,
        clock: Box<dyn Clock>,
        catalog: CatalogStore,
        settings: Settings,
    ) -> Self {
        let mut bus = EventBus::new();
        bus.subscribe(Subscriber::Timer, &[Topic::AutorefreshChanged]);
        bus.subscribe(Subscriber::Carousel, &PRESENTER_TOPICS);
        bus.subscribe(Subscriber::Settings, &[Topic::ThemeChanged, Topic::AutorefreshChanged]);

        Self {
            config,
            storage,
            clock,
            catalog,
            settings,
            refresh: RefreshController::new(),
            timer: AutorefreshTimer::new(),
            nav: NavigationStack::default(),
            list: ListPresenter,
            grid: None,
            search: SearchPresenter::new(),
            bus,
            network_online: true,
            active_error: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> UnixTimeMs {
        self.clock.now()
    }

    /// Hands the storage back, e.g. to start a fresh core on it.
    #[must_use]
    pub fn into_storage(self) -> Box<dyn CatalogStorage> {
        self.storage
    }

    fn freshness(&self) -> Freshness {
        Freshness {
            now: self.clock.now(),
            max_age: self.config.webcam_refresh_interval(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsView {
    pub is_dark_theme: bool,
    pub should_autorefresh: bool,
    pub autorefresh_interval_minutes: u32,
    /// The interval row is hidden while autorefresh is off.
    pub interval_row_visible: bool,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            is_dark_theme: settings.is_dark_theme(),
            should_autorefresh: settings.should_autorefresh(),
            autorefresh_interval_minutes: settings.autorefresh_interval_minutes(),
            interval_row_visible: settings.should_autorefresh(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub theme: Theme,
    /// Mirror of the navigation stack, root first.
    pub navigation: Vec<Screen>,
    pub carousel: Vec<CarouselRow>,
    pub grid: Option<GridView>,
    pub search: Option<SearchView>,
    pub settings: SettingsView,
    /// Webcam on top of the stack, if any.
    pub detail: Option<WebcamCard>,
    pub is_refreshing: bool,
    pub last_update_ms: Option<u64>,
    pub is_online: bool,
    pub error: Option<UserFacingError>,
}

/// Capabilities as seen by one update. `Render` is requested at most once,
/// after every other effect of the update.
struct Cycle<'a> {
    caps: &'a Capabilities,
    render: bool,
}

impl<'a> Cycle<'a> {
    fn new(caps: &'a Capabilities) -> Self {
        Self {
            caps,
            render: false,
        }
    }

    fn render(&mut self) {
        self.render = true;
    }

    fn image_cache(&self, operation: ImageCacheOperation) {
        self.caps.image_cache.perform(operation);
    }

    fn timer(&self, operation: TimerOperation) {
        match operation {
            TimerOperation::Schedule { id, after_secs } => {
                self.caps
                    .timer
                    .schedule(id, after_secs, |id| Event::TimerFired { id });
            }
            TimerOperation::Cancel { id } => self.caps.timer.cancel(id),
        }
    }

    fn navigate(&mut self, request: NavigationRequest) {
        self.caps.navigator.navigate(request);
        self.render();
    }

    fn finish(self) {
        if self.render {
            self.caps.render.render();
        }
    }
}

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[instrument(skip_all, fields(event = event.name()))]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(user_initiated = event.is_user_initiated(), "update");
        let mut cycle = Cycle::new(caps);

        match event {
            Event::AppStarted => {
                cycle.image_cache(ImageCacheOperation::SetMaxAge {
                    secs: model.config.webcam_refresh_interval_secs,
                });
                cycle.image_cache(ImageCacheOperation::CleanExpired);
                caps.update_check.check(UpdateCheckPolicy::Immediately);
                for operation in model.timer.apply(&model.settings) {
                    cycle.timer(operation);
                }
                cycle.render();
            }

            Event::AppForegrounded | Event::AppBecameActive => {
                caps.update_check.check(UpdateCheckPolicy::Daily);
            }

            Event::NetworkStatusChanged { online } => {
                if model.network_online != online {
                    info!(online, "reachability changed");
                    model.network_online = online;
                    cycle.render();
                }
            }

            Event::ScreenAppeared { screen } => {
                if screen.is_grid() && Self::update_grid(model) != PruneOutcome::Unchanged {
                    cycle.render();
                }
                let max_age = model.config.webcam_refresh_interval();
                if model.refresh.needs_refresh(model.now(), max_age) {
                    debug!(?screen, "content stale on appear");
                    Self::refresh(model, RefreshTrigger::Stale, &mut cycle);
                }
            }

            Event::RefreshRequested { trigger } => Self::refresh(model, trigger, &mut cycle),

            Event::TimerFired { id } => match model.timer.fired(&id) {
                TimerFire::Stale => {}
                TimerFire::Due { reschedule } => {
                    cycle.timer(reschedule);
                    Self::refresh(model, RefreshTrigger::Timer, &mut cycle);
                }
            },

            Event::ImageLoaded { webcam_id } => {
                let now = model.now();
                match model.catalog.mark_refreshed(&webcam_id, now) {
                    Ok(()) => cycle.render(),
                    // Webcam dropped by a sync while its image was loading.
                    Err(e) => debug!(error = %e, "image loaded for unknown webcam"),
                }
            }

            Event::SectionSelected { section_id } => {
                match model.list.select_section(&model.catalog, &section_id) {
                    Some(request) => Self::navigate(model, request, &mut cycle),
                    None => warn!(section_id = %section_id, "unknown section selected"),
                }
            }

            Event::FavoritesSelected => {
                Self::navigate(model, NavigationRequest::ShowFavorites, &mut cycle);
            }

            Event::WebcamSelected { webcam_id } => {
                let catalog = &model.catalog;
                let request = match model.nav.top() {
                    Screen::Section { .. } | Screen::Favorites => {
                        model.grid.as_ref().and_then(|g| g.select(&webcam_id))
                    }
                    Screen::Search => model.search.select(catalog, &webcam_id),
                    _ => model.list.select_webcam(catalog, &webcam_id),
                };
                match request {
                    Some(request) => Self::navigate(model, request, &mut cycle),
                    None => Self::fail(model, CatalogError::NotFound(webcam_id).into(), &mut cycle),
                }
            }

            Event::SearchOpened => Self::navigate(model, NavigationRequest::ShowSearch, &mut cycle),
            Event::SettingsOpened => {
                Self::navigate(model, NavigationRequest::ShowSettings, &mut cycle);
            }
            Event::BackRequested => Self::navigate(model, NavigationRequest::Back, &mut cycle),

            Event::FavoriteToggled { webcam_id } => {
                match model.catalog.toggle_favorite(
                    &webcam_id,
                    model.storage.as_mut(),
                    &mut model.bus,
                ) {
                    Ok(_) => cycle.render(),
                    Err(e) => Self::fail(model, e.into(), &mut cycle),
                }
            }

            Event::SearchQueryChanged { query } => {
                if model.search.set_query(query) {
                    cycle.render();
                }
            }

            Event::SearchCleared => {
                if model.search.clear() {
                    cycle.render();
                }
            }

            Event::SearchTagSelected { tag } => {
                if model.search.set_tag(tag) {
                    cycle.render();
                }
            }

            Event::DarkThemeToggled { enabled } => {
                let mut next = model.settings;
                if next.set_dark_theme(enabled) {
                    let theme = next.theme();
                    Self::commit_settings(model, next, Notification::ThemeChanged { theme }, &mut cycle);
                }
            }

            Event::AutorefreshToggled { enabled } => {
                let mut next = model.settings;
                if next.set_autorefresh(enabled) {
                    let changed = Notification::AutorefreshChanged {
                        enabled,
                        interval_secs: next.autorefresh_interval_secs(),
                    };
                    Self::commit_settings(model, next, changed, &mut cycle);
                }
            }

            Event::AutorefreshIntervalEntered { minutes } => {
                let mut next = model.settings;
                match next.set_autorefresh_interval_minutes(minutes) {
                    Ok(secs) if secs == model.settings.autorefresh_interval_secs() => {}
                    Ok(secs) => {
                        let changed = Notification::AutorefreshChanged {
                            enabled: next.should_autorefresh(),
                            interval_secs: secs,
                        };
                        Self::commit_settings(model, next, changed, &mut cycle);
                    }
                    // The field shows the rejected text; a render makes the
                    // shell read the kept value back.
                    Err(e) => Self::fail(model, e.into(), &mut cycle),
                }
            }

            Event::CatalogSynced(seed) => {
                match model.catalog.replace_all(*seed, model.storage.as_mut()) {
                    Ok(()) => {
                        Self::update_grid(model);
                        cycle.render();
                    }
                    Err(e) => Self::fail(model, e.into(), &mut cycle),
                }
            }

            Event::ErrorDismissed => {
                if model.active_error.take().is_some() {
                    cycle.render();
                }
            }
        }

        Self::dispatch_notifications(model, &mut cycle);
        cycle.finish();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let freshness = model.freshness();

        let detail = match model.nav.top() {
            Screen::Webcam { webcam_id } => model
                .catalog
                .webcam(webcam_id)
                .map(|w| WebcamCard::new(w, freshness)),
            _ => None,
        };

        ViewModel {
            theme: model.settings.theme(),
            navigation: model.nav.screens().to_vec(),
            carousel: model.list.rows(&model.catalog, freshness),
            grid: model
                .grid
                .as_ref()
                .map(|g| g.view(&model.catalog, &model.nav, freshness)),
            search: model
                .nav
                .contains(&Screen::Search)
                .then(|| model.search.view(&model.catalog, freshness)),
            settings: SettingsView::from(&model.settings),
            detail,
            is_refreshing: model.refresh.is_refreshing(),
            last_update_ms: model.refresh.last_update().map(|t| t.0),
            is_online: model.network_online,
            error: model.active_error.as_ref().map(UserFacingError::from),
        }
    }
}

impl App {
    fn refresh(model: &mut Model, trigger: RefreshTrigger, cycle: &mut Cycle<'_>) {
        match model.refresh.begin(trigger, model.network_online) {
            RefreshDecision::Dropped => {}
            RefreshDecision::Started { cache } => {
                for operation in cache {
                    cycle.image_cache(operation);
                }
                Self::update_grid(model);
                let at = model.refresh.finish(model.clock.now());
                info!(?trigger, at = at.0, "refreshed");
                model.bus.publish(Notification::Refreshed { at });
                cycle.render();
            }
        }
    }

    fn navigate(model: &mut Model, request: NavigationRequest, cycle: &mut Cycle<'_>) {
        let Some(screen) = request.target() else {
            Self::back(model, cycle);
            return;
        };
        if model.nav.contains(&screen) {
            debug!(?screen, "already presented");
            return;
        }

        let source = match &screen {
            Screen::Section { section_id } => Some(GridSource::Section {
                section_id: section_id.clone(),
            }),
            Screen::Favorites => Some(GridSource::Favorites),
            _ => None,
        };

        if let Some(source) = source {
            let catalog = &model.catalog;
            if let Some(grid) = model.grid.as_mut() {
                // One grid at a time: the previous one's screen goes away.
                model.nav.remove(&grid.source().screen());
                if let Some(cancel) = grid.bind(source, catalog) {
                    cycle.image_cache(cancel);
                }
            } else {
                model.grid = Some(GridPresenter::new(source, catalog));
            }
            model.bus.subscribe(Subscriber::Grid, &PRESENTER_TOPICS);
        } else if screen == Screen::Search {
            model.bus.subscribe(Subscriber::Search, &PRESENTER_TOPICS);
        }

        let is_grid = screen.is_grid();
        model.nav.push(screen);
        if is_grid {
            if let Some(grid) = model.grid.as_mut() {
                grid.attach();
            }
        }

        cycle.navigate(request);
    }

    fn back(model: &mut Model, cycle: &mut Cycle<'_>) {
        let Some(popped) = model.nav.pop() else {
            debug!("back on root ignored");
            return;
        };

        let owns_popped = model
            .grid
            .as_ref()
            .is_some_and(|g| g.source().screen() == popped);
        if owns_popped {
            if let Some(cancel) = model.grid.take().and_then(GridPresenter::dismiss) {
                cycle.image_cache(cancel);
            }
            model.bus.unsubscribe(Subscriber::Grid);
        } else if popped == Screen::Search {
            model.search.reset();
            model.bus.unsubscribe(Subscriber::Search);
        }

        cycle.navigate(NavigationRequest::Back);
    }

    fn update_grid(model: &mut Model) -> PruneOutcome {
        match model.grid.as_mut() {
            Some(grid) => grid.update(&model.catalog, &mut model.nav),
            None => PruneOutcome::Unchanged,
        }
    }

    /// Persists `next` and only then makes it current and announces it.
    fn commit_settings(
        model: &mut Model,
        next: Settings,
        changed: Notification,
        cycle: &mut Cycle<'_>,
    ) {
        match model.storage.save_settings(&next) {
            Ok(()) => {
                model.settings = next;
                model.bus.publish(changed);
                cycle.render();
            }
            Err(e) => Self::fail(model, e.into(), cycle),
        }
    }

    fn fail(model: &mut Model, error: AppError, cycle: &mut Cycle<'_>) {
        warn!(code = error.code(), error = %error, "event failed");
        model.active_error = Some(error);
        cycle.render();
    }

    fn dispatch_notifications(model: &mut Model, cycle: &mut Cycle<'_>) {
        while let Some(Delivery {
            notification,
            recipients,
        }) = model.bus.next_delivery()
        {
            for recipient in recipients {
                Self::deliver(model, recipient, &notification, cycle);
            }
        }
    }

    fn deliver(
        model: &mut Model,
        recipient: Subscriber,
        notification: &Notification,
        cycle: &mut Cycle<'_>,
    ) {
        match (recipient, notification) {
            (Subscriber::Timer, Notification::AutorefreshChanged { .. }) => {
                for operation in model.timer.apply(&model.settings) {
                    cycle.timer(operation);
                }
            }
            (Subscriber::Grid, Notification::FavoriteChanged { .. }) => {
                let outcome = Self::update_grid(model);
                if outcome != PruneOutcome::Unchanged {
                    debug!(?outcome, "grid membership changed");
                }
                cycle.render();
            }
            _ => cycle.render(),
        }
    }
}

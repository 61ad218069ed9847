// lib.rs - shared core of the webcam viewer

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod model;
pub mod navigation;
pub mod presenters;
pub mod refresh;
pub mod settings;
pub mod storage;

pub use app::{App, Model, SettingsView, Subscriber, ViewModel};
pub use capabilities::{
    Capabilities, Effect, EffectFfi, ImageCacheOperation, RenderOperation, TimerId,
    TimerOperation, UpdateCheckPolicy,
};
pub use crux_core::{App as CruxApp, Core};
pub use catalog::{CatalogError, CatalogSeed, CatalogStore};
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind, UserFacingError};
pub use event::Event;
pub use event_bus::{EventBus, Notification};
pub use model::{Clock, ManualClock, Section, SectionId, SystemClock, UnixTimeMs, Webcam, WebcamId};
pub use navigation::{NavigationRequest, NavigationStack, Screen};
pub use presenters::{CarouselRow, GridSource, GridView, SearchView, WebcamCard};
pub use refresh::{
    AutorefreshTimer, RefreshController, RefreshDecision, RefreshState, RefreshTrigger, TimerFire,
};
pub use settings::{Settings, SettingsError, Theme};
pub use storage::{CatalogStorage, MemoryStorage, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::SqliteStorage;

pub const MIN_AUTOREFRESH_MINUTES: i64 = 1;
pub const MAX_AUTOREFRESH_MINUTES: i64 = 120;
pub const SECONDS_PER_MINUTE: u32 = 60;
pub const DEFAULT_AUTOREFRESH_INTERVAL_SECS: u32 = 600;
pub const DEFAULT_WEBCAM_REFRESH_INTERVAL_SECS: u64 = 600;

/// Sections shown on the carousel, top to bottom.
pub const DEFAULT_SECTION_ORDER: &[&str] = &["pdd", "sancy", "lioran"];

use serde::{Deserialize, Serialize};

use crate::capabilities::TimerId;
use crate::catalog::CatalogSeed;
use crate::model::{SectionId, WebcamId};
use crate::navigation::Screen;
use crate::refresh::RefreshTrigger;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    AppStarted,
    AppForegrounded,
    AppBecameActive,
    NetworkStatusChanged {
        online: bool,
    },
    /// The shell finished presenting `screen`.
    ScreenAppeared {
        screen: Screen,
    },

    // Refresh
    RefreshRequested {
        trigger: RefreshTrigger,
    },
    TimerFired {
        id: TimerId,
    },
    ImageLoaded {
        webcam_id: WebcamId,
    },

    // Navigation
    SectionSelected {
        section_id: SectionId,
    },
    FavoritesSelected,
    WebcamSelected {
        webcam_id: WebcamId,
    },
    SearchOpened,
    SettingsOpened,
    BackRequested,

    // Favorites & search
    FavoriteToggled {
        webcam_id: WebcamId,
    },
    SearchQueryChanged {
        query: String,
    },
    SearchCleared,
    /// A tag chip was tapped; `None` removes the filter.
    SearchTagSelected {
        tag: Option<String>,
    },

    // Settings
    DarkThemeToggled {
        enabled: bool,
    },
    AutorefreshToggled {
        enabled: bool,
    },
    /// Raw numeric input from the settings screen, validated by the core.
    AutorefreshIntervalEntered {
        minutes: i64,
    },

    // Data
    CatalogSynced(Box<CatalogSeed>),
    ErrorDismissed,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::AppForegrounded => "app_foregrounded",
            Self::AppBecameActive => "app_became_active",
            Self::NetworkStatusChanged { .. } => "network_status_changed",
            Self::ScreenAppeared { .. } => "screen_appeared",
            Self::RefreshRequested { .. } => "refresh_requested",
            Self::TimerFired { .. } => "timer_fired",
            Self::ImageLoaded { .. } => "image_loaded",
            Self::SectionSelected { .. } => "section_selected",
            Self::FavoritesSelected => "favorites_selected",
            Self::WebcamSelected { .. } => "webcam_selected",
            Self::SearchOpened => "search_opened",
            Self::SettingsOpened => "settings_opened",
            Self::BackRequested => "back_requested",
            Self::FavoriteToggled { .. } => "favorite_toggled",
            Self::SearchQueryChanged { .. } => "search_query_changed",
            Self::SearchCleared => "search_cleared",
            Self::SearchTagSelected { .. } => "search_tag_selected",
            Self::DarkThemeToggled { .. } => "dark_theme_toggled",
            Self::AutorefreshToggled { .. } => "autorefresh_toggled",
            Self::AutorefreshIntervalEntered { .. } => "autorefresh_interval_entered",
            Self::CatalogSynced(_) => "catalog_synced",
            Self::ErrorDismissed => "error_dismissed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        match self {
            Self::RefreshRequested { trigger } => !matches!(
                trigger,
                RefreshTrigger::Timer | RefreshTrigger::Stale
            ),
            Self::SectionSelected { .. }
            | Self::FavoritesSelected
            | Self::WebcamSelected { .. }
            | Self::SearchOpened
            | Self::SettingsOpened
            | Self::BackRequested
            | Self::FavoriteToggled { .. }
            | Self::SearchQueryChanged { .. }
            | Self::SearchCleared
            | Self::SearchTagSelected { .. }
            | Self::DarkThemeToggled { .. }
            | Self::AutorefreshToggled { .. }
            | Self::AutorefreshIntervalEntered { .. }
            | Self::ErrorDismissed => true,
            _ => false,
        }
    }
}

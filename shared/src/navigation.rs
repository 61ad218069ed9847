use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{SectionId, WebcamId};

/// Where a screen that dropped out of the stack goes back in: right after
/// the root.
pub const REINSERT_INDEX: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Screen {
    Carousel,
    Section { section_id: SectionId },
    Favorites,
    Webcam { webcam_id: WebcamId },
    Search,
    Settings,
}

impl Screen {
    /// Screens backed by the grid presenter.
    #[must_use]
    pub fn is_grid(&self) -> bool {
        matches!(self, Self::Section { .. } | Self::Favorites)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationRequest {
    ShowSection { section_id: SectionId },
    ShowFavorites,
    ShowWebcam { webcam_id: WebcamId },
    ShowSearch,
    ShowSettings,
    Back,
}

impl NavigationRequest {
    /// Screen pushed by this request; `None` for `Back`.
    #[must_use]
    pub fn target(&self) -> Option<Screen> {
        match self {
            Self::ShowSection { section_id } => Some(Screen::Section {
                section_id: section_id.clone(),
            }),
            Self::ShowFavorites => Some(Screen::Favorites),
            Self::ShowWebcam { webcam_id } => Some(Screen::Webcam {
                webcam_id: webcam_id.clone(),
            }),
            Self::ShowSearch => Some(Screen::Search),
            Self::ShowSettings => Some(Screen::Settings),
            Self::Back => None,
        }
    }
}

/// The core's copy of the shell's navigation stack. The root is never
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStack {
    screens: Vec<Screen>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(Screen::Carousel)
    }
}

impl NavigationStack {
    #[must_use]
    pub fn new(root: Screen) -> Self {
        Self {
            screens: vec![root],
        }
    }

    #[must_use]
    pub fn root(&self) -> &Screen {
        &self.screens[0]
    }

    #[must_use]
    pub fn top(&self) -> &Screen {
        // Never empty: the root stays.
        &self.screens[self.screens.len() - 1]
    }

    #[must_use]
    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    #[must_use]
    pub fn contains(&self, screen: &Screen) -> bool {
        self.screens.contains(screen)
    }

    #[must_use]
    pub fn position(&self, screen: &Screen) -> Option<usize> {
        self.screens.iter().position(|s| s == screen)
    }

    pub fn push(&mut self, screen: Screen) {
        debug!(?screen, depth = self.screens.len(), "push");
        self.screens.push(screen);
    }

    /// Pops the top screen unless only the root is left.
    pub fn pop(&mut self) -> Option<Screen> {
        if self.screens.len() <= 1 {
            return None;
        }
        self.screens.pop()
    }

    /// Removes `screen` wherever it sits. The root cannot be removed.
    pub fn remove(&mut self, screen: &Screen) -> bool {
        match self.position(screen) {
            Some(0) | None => false,
            Some(i) => {
                self.screens.remove(i);
                true
            }
        }
    }

    pub fn insert_after_root(&mut self, screen: Screen) {
        let at = REINSERT_INDEX.min(self.screens.len());
        self.screens.insert(at, screen);
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Freshness, WebcamCard};
use crate::capabilities::ImageCacheOperation;
use crate::catalog::CatalogStore;
use crate::model::{SectionId, Webcam, WebcamId};
use crate::navigation::{NavigationRequest, NavigationStack, Screen};

pub const FAVORITES_TITLE: &str = "Favorites";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSource {
    Section { section_id: SectionId },
    Favorites,
}

impl GridSource {
    #[must_use]
    pub fn screen(&self) -> Screen {
        match self {
            Self::Section { section_id } => Screen::Section {
                section_id: section_id.clone(),
            },
            Self::Favorites => Screen::Favorites,
        }
    }

    fn members<'a>(&self, catalog: &'a CatalogStore) -> Vec<&'a Webcam> {
        match self {
            Self::Section { section_id } => catalog.sorted_webcams(section_id).collect(),
            Self::Favorites => catalog.favorites().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    Unchanged,
    /// Projection went empty; the grid's screen left the stack.
    Removed,
    /// Projection came back; the screen was put back after the root.
    Reinserted,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridView {
    pub source: GridSource,
    pub title: String,
    pub cells: Vec<WebcamCard>,
    pub is_presented: bool,
}

/// One section (or the favorites) as a grid of webcams.
///
/// Once its screen has been shown the presenter keeps its place in the
/// navigation stack in sync with its contents: an empty grid takes itself off
/// the stack and a non-empty one puts itself back right after the root.
#[derive(Debug)]
pub struct GridPresenter {
    source: GridSource,
    title: String,
    projection: Vec<WebcamId>,
    image_urls: Vec<String>,
    attached: bool,
}

impl GridPresenter {
    #[must_use]
    pub fn new(source: GridSource, catalog: &CatalogStore) -> Self {
        let mut grid = Self {
            source: GridSource::Favorites,
            title: String::new(),
            projection: Vec::new(),
            image_urls: Vec::new(),
            attached: false,
        };
        // Nothing loaded yet, nothing to cancel.
        let _ = grid.bind(source, catalog);
        grid
    }

    #[must_use]
    pub fn source(&self) -> &GridSource {
        &self.source
    }

    #[must_use]
    pub fn projection(&self) -> &[WebcamId] {
        &self.projection
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Points the grid at `source` and recomputes. Returns the cancellation
    /// of image loads that belonged to the previous source, if any.
    pub fn bind(
        &mut self,
        source: GridSource,
        catalog: &CatalogStore,
    ) -> Option<ImageCacheOperation> {
        let cancel = (self.source != source)
            .then(|| self.cancel_loads())
            .flatten();

        self.title = match &source {
            GridSource::Section { section_id } => catalog
                .section(section_id)
                .map(|s| s.title.clone())
                .unwrap_or_default(),
            GridSource::Favorites => FAVORITES_TITLE.to_string(),
        };
        if let GridSource::Section { section_id } = &source {
            info!(section_id = %section_id, "section shown");
        }
        self.source = source;
        self.recompute(catalog);
        cancel
    }

    /// Marks the grid's screen as shown; from now on `update` keeps the stack
    /// in sync.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Recomputes the projection and prunes or reinserts the grid's screen.
    /// Calling it again with unchanged membership changes nothing.
    pub fn update(&mut self, catalog: &CatalogStore, nav: &mut NavigationStack) -> PruneOutcome {
        self.recompute(catalog);

        if !self.attached {
            return PruneOutcome::Unchanged;
        }

        let screen = self.source.screen();
        match (self.projection.is_empty(), nav.contains(&screen)) {
            (true, true) => {
                nav.remove(&screen);
                debug!(?screen, "empty grid removed from navigation");
                PruneOutcome::Removed
            }
            (false, false) => {
                nav.insert_after_root(screen.clone());
                debug!(?screen, "grid reinserted into navigation");
                PruneOutcome::Reinserted
            }
            _ => PruneOutcome::Unchanged,
        }
    }

    #[must_use]
    pub fn select(&self, webcam_id: &WebcamId) -> Option<NavigationRequest> {
        self.projection
            .contains(webcam_id)
            .then(|| NavigationRequest::ShowWebcam {
                webcam_id: webcam_id.clone(),
            })
    }

    /// Tears the grid down, cancelling image loads it started.
    #[must_use]
    pub fn dismiss(mut self) -> Option<ImageCacheOperation> {
        self.attached = false;
        self.cancel_loads()
    }

    #[must_use]
    pub fn view(
        &self,
        catalog: &CatalogStore,
        nav: &NavigationStack,
        freshness: Freshness,
    ) -> GridView {
        GridView {
            source: self.source.clone(),
            title: self.title.clone(),
            cells: self
                .projection
                .iter()
                .filter_map(|id| catalog.webcam(id))
                .map(|w| WebcamCard::new(w, freshness))
                .collect(),
            is_presented: nav.contains(&self.source.screen()),
        }
    }

    fn recompute(&mut self, catalog: &CatalogStore) {
        let members = self.source.members(catalog);
        self.image_urls = members
            .iter()
            .filter_map(|w| w.preferred_image())
            .map(str::to_string)
            .collect();
        self.projection = members.into_iter().map(|w| w.id.clone()).collect();
    }

    fn cancel_loads(&mut self) -> Option<ImageCacheOperation> {
        if self.image_urls.is_empty() {
            return None;
        }
        let urls = std::mem::take(&mut self.image_urls);
        Some(ImageCacheOperation::CancelLoads { urls })
    }
}

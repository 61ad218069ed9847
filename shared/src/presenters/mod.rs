//! Read-only projections of the catalog, one per kind of screen.

mod grid;
mod list;
mod search;

pub use self::grid::{GridPresenter, GridSource, GridView, PruneOutcome};
pub use self::list::{CarouselRow, ListPresenter};
pub use self::search::{SearchPresenter, SearchView};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{UnixTimeMs, Webcam, WebcamId};

/// What a cell needs to show a webcam.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebcamCard {
    pub id: WebcamId,
    pub title: String,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub is_outdated: bool,
}

/// Inputs for the "outdated" badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Freshness {
    pub now: UnixTimeMs,
    pub max_age: Duration,
}

impl WebcamCard {
    #[must_use]
    pub fn new(webcam: &Webcam, freshness: Freshness) -> Self {
        Self {
            id: webcam.id.clone(),
            title: webcam.title.clone(),
            image_url: webcam.preferred_image().map(str::to_string),
            is_favorite: webcam.is_favorite,
            is_outdated: webcam.is_outdated(freshness.now, freshness.max_age),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_freshness() -> Freshness {
    Freshness {
        now: UnixTimeMs(1_700_000_000_000),
        max_age: Duration::from_secs(600),
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Freshness, WebcamCard};
use crate::catalog::CatalogStore;
use crate::model::{Webcam, WebcamId};
use crate::navigation::NavigationRequest;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SearchView {
    pub query: String,
    /// Active tag chip, if any.
    pub tag: Option<String>,
    pub results: Vec<WebcamCard>,
    pub clear_visible: bool,
}

/// Title search over the whole catalog, optionally narrowed to one tag. An
/// empty query lists everything.
#[derive(Debug, Default)]
pub struct SearchPresenter {
    query: String,
    tag: Option<String>,
}

impl SearchPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns false when the query did not change.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        debug!(len = query.len(), "search query changed");
        self.query = query;
        true
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns false when the tag did not change. Blank tags clear the filter.
    pub fn set_tag(&mut self, tag: Option<String>) -> bool {
        let tag = tag
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if tag == self.tag {
            return false;
        }
        debug!(?tag, "search tag changed");
        self.tag = tag;
        true
    }

    /// Empties the text field; the tag chip stays.
    pub fn clear(&mut self) -> bool {
        self.set_query(String::new())
    }

    /// Back to a blank search, e.g. when the screen is left.
    pub fn reset(&mut self) {
        self.query.clear();
        self.tag = None;
    }

    #[must_use]
    pub fn results(&self, catalog: &CatalogStore) -> Vec<WebcamId> {
        self.matches(catalog).map(|w| w.id.clone()).collect()
    }

    #[must_use]
    pub fn view(&self, catalog: &CatalogStore, freshness: Freshness) -> SearchView {
        SearchView {
            query: self.query.clone(),
            tag: self.tag.clone(),
            results: self
                .matches(catalog)
                .map(|w| WebcamCard::new(w, freshness))
                .collect(),
            clear_visible: !self.query.is_empty(),
        }
    }

    /// Results are recomputed on every call, so a webcam removed by a sync
    /// can no longer be selected.
    #[must_use]
    pub fn select(&self, catalog: &CatalogStore, webcam_id: &WebcamId) -> Option<NavigationRequest> {
        self.matches(catalog)
            .any(|w| w.id == *webcam_id)
            .then(|| NavigationRequest::ShowWebcam {
                webcam_id: webcam_id.clone(),
            })
    }

    fn matches<'a>(&'a self, catalog: &'a CatalogStore) -> impl Iterator<Item = &'a Webcam> + 'a {
        let tag = self.tag.as_deref();
        catalog
            .search(&self.query)
            .filter(move |w| tag.map_or(true, |t| w.has_tag(t)))
    }
}

//! The catalog: every section and webcam the app knows about, and the single
//! source of truth the presenters project from.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, ErrorKind};
use crate::event_bus::{EventBus, Notification};
use crate::model::{Section, SectionId, UnixTimeMs, Webcam, WebcamId};
use crate::storage::{CatalogStorage, StorageError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("webcam not found: {0}")]
    NotFound(WebcamId),

    #[error("webcam {0} appears more than once in the catalog")]
    DuplicateWebcam(WebcamId),

    #[error("section {0} appears more than once in the catalog")]
    DuplicateSection(SectionId),

    #[error("invalid catalog json: {0}")]
    Parse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(id) => {
                AppError::new(ErrorKind::NotFound, format!("webcam not found: {id}"))
                    .with_context("webcam_id", id.0)
            }
            CatalogError::Storage(inner) => inner.into(),
            CatalogError::Parse(_) => AppError::new(ErrorKind::Serialization, e.to_string()),
            CatalogError::DuplicateWebcam(_) | CatalogError::DuplicateSection(_) => {
                AppError::new(ErrorKind::Validation, e.to_string())
            }
        }
    }
}

// --- Seed format: what a catalog sync (or the bundled JSON) delivers ---

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogSeed {
    pub sections: Vec<SectionSeed>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SectionSeed {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub webcams: Vec<WebcamSeed>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WebcamSeed {
    pub id: WebcamId,
    pub title: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogSeed {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    #[must_use]
    pub fn contains_webcam(&self, id: &WebcamId) -> bool {
        self.sections
            .iter()
            .flat_map(|s| &s.webcams)
            .any(|w| &w.id == id)
    }
}

/// Members of one section in (title, id) order.
#[derive(Debug, Clone)]
pub struct SortedWebcams<'a> {
    inner: std::vec::IntoIter<&'a Webcam>,
}

impl<'a> Iterator for SortedWebcams<'a> {
    type Item = &'a Webcam;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for SortedWebcams<'_> {}

#[derive(Debug, Default)]
pub struct CatalogStore {
    section_order: Vec<SectionId>,
    /// Presentation order.
    sections: Vec<Section>,
    webcams: Vec<Webcam>,
    index: HashMap<WebcamId, usize>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(section_order: Vec<SectionId>) -> Self {
        Self {
            section_order,
            ..Self::default()
        }
    }

    /// Reads the persisted catalog and favorites. An empty store yields an
    /// empty catalog until the first sync.
    #[instrument(skip(storage, section_order))]
    pub fn load(
        storage: &dyn CatalogStorage,
        section_order: Vec<SectionId>,
    ) -> Result<Self, CatalogError> {
        let seed = storage.load_catalog()?.unwrap_or_default();
        let favorites = storage.load_favorites()?;

        let mut store = Self::new(section_order);
        store.install(seed, &favorites)?;
        info!(
            sections = store.sections.len(),
            webcams = store.webcams.len(),
            favorites = favorites.len(),
            "catalog loaded"
        );
        Ok(store)
    }

    /// Full catalog refresh. The new catalog is persisted before it replaces
    /// the in-memory one; favorite flags carry over by id.
    #[instrument(skip(self, seed, storage), fields(sections = seed.sections.len()))]
    pub fn replace_all(
        &mut self,
        seed: CatalogSeed,
        storage: &mut dyn CatalogStorage,
    ) -> Result<(), CatalogError> {
        let favorites: BTreeSet<WebcamId> = self
            .webcams
            .iter()
            .filter(|w| w.is_favorite)
            .map(|w| w.id.clone())
            .collect();

        let mut next = Self::new(self.section_order.clone());
        next.install(seed.clone(), &favorites)?;
        storage.save_catalog(&seed)?;

        *self = next;
        info!(webcams = self.webcams.len(), "catalog replaced");
        Ok(())
    }

    fn install(
        &mut self,
        seed: CatalogSeed,
        favorites: &BTreeSet<WebcamId>,
    ) -> Result<(), CatalogError> {
        let mut sections = Vec::with_capacity(seed.sections.len());
        let mut webcams = Vec::new();
        let mut index = HashMap::new();
        let mut seen_sections = HashSet::new();

        for section in seed.sections {
            if !seen_sections.insert(section.id.clone()) {
                return Err(CatalogError::DuplicateSection(section.id));
            }
            for cam in section.webcams {
                if index.contains_key(&cam.id) {
                    return Err(CatalogError::DuplicateWebcam(cam.id));
                }
                index.insert(cam.id.clone(), webcams.len());
                webcams.push(Webcam {
                    is_favorite: favorites.contains(&cam.id),
                    id: cam.id,
                    title: cam.title,
                    image_urls: cam.image_urls,
                    section_id: section.id.clone(),
                    tags: cam.tags,
                    last_refreshed: None,
                });
            }
            sections.push(Section {
                id: section.id,
                title: section.title,
            });
        }

        let order = &self.section_order;
        sections.sort_by_key(|s| order.iter().position(|o| *o == s.id).unwrap_or(usize::MAX));

        self.sections = sections;
        self.webcams = webcams;
        self.index = index;
        Ok(())
    }

    /// Sections in configured presentation order (not sorted).
    #[must_use]
    pub fn all_sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == *id)
    }

    #[must_use]
    pub fn webcam(&self, id: &WebcamId) -> Option<&Webcam> {
        self.index.get(id).map(|&i| &self.webcams[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.webcams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.webcams.is_empty()
    }

    /// Members of `section_id` ordered by (title, id). Recomputed on every
    /// call; clone the iterator to walk the same snapshot twice.
    #[must_use]
    pub fn sorted_webcams(&self, section_id: &SectionId) -> SortedWebcams<'_> {
        let mut members: Vec<&Webcam> = self
            .webcams
            .iter()
            .filter(|w| w.section_id == *section_id)
            .collect();
        members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        SortedWebcams {
            inner: members.into_iter(),
        }
    }

    /// Catalog iteration order: sections in presentation order, each in its
    /// sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Webcam> + '_ {
        self.sections
            .iter()
            .flat_map(move |s| self.sorted_webcams(&s.id))
    }

    /// Case-insensitive substring match on titles. A blank query matches
    /// everything.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Webcam> + 'a {
        let needle = query.trim().to_lowercase();
        self.iter()
            .filter(move |w| needle.is_empty() || w.title.to_lowercase().contains(&needle))
    }

    pub fn favorites(&self) -> impl Iterator<Item = &Webcam> + '_ {
        self.iter().filter(|w| w.is_favorite)
    }

    /// Flips the favorite flag. The new value is written to storage first;
    /// only then is memory updated and `FavoriteChanged` queued.
    #[instrument(skip(self, storage, bus), fields(webcam_id = %id))]
    pub fn toggle_favorite<S: Copy + Eq + std::fmt::Debug>(
        &mut self,
        id: &WebcamId,
        storage: &mut dyn CatalogStorage,
        bus: &mut EventBus<S>,
    ) -> Result<Webcam, CatalogError> {
        let Some(&i) = self.index.get(id) else {
            warn!("favorite toggle on unknown webcam");
            return Err(CatalogError::NotFound(id.clone()));
        };

        let is_favorite = !self.webcams[i].is_favorite;
        storage.save_favorite(id, is_favorite)?;
        self.webcams[i].is_favorite = is_favorite;

        debug!(is_favorite, "favorite toggled");
        bus.publish(Notification::FavoriteChanged {
            webcam_id: id.clone(),
            is_favorite,
        });
        Ok(self.webcams[i].clone())
    }

    /// Records a successful image load reported by the shell.
    pub fn mark_refreshed(&mut self, id: &WebcamId, now: UnixTimeMs) -> Result<(), CatalogError> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        self.webcams[i].last_refreshed = Some(now);
        Ok(())
    }
}

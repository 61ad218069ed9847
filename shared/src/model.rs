use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(WebcamId);
typed_id!(SectionId);

/// Explicit timestamp unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(ms)
    }

    #[must_use]
    pub fn elapsed_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    #[must_use]
    pub fn add(self, d: Duration) -> Self {
        Self(self.0.saturating_add(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)))
    }
}

// --- Clock ---

pub trait Clock: Send {
    fn now(&self) -> UnixTimeMs;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimeMs {
        UnixTimeMs::now()
    }
}

/// Clock the shell (or a test) advances by hand. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    #[must_use]
    pub fn at(ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(ms)))
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, d: Duration) {
        let step = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        // Saturating, like `UnixTimeMs::add`.
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| {
                Some(ms.saturating_add(step))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixTimeMs {
        UnixTimeMs(self.0.load(Ordering::SeqCst))
    }
}

// --- Entities ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Webcam {
    pub id: WebcamId,
    pub title: String,
    /// Ranked image sources, best first.
    pub image_urls: Vec<String>,
    pub section_id: SectionId,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub last_refreshed: Option<UnixTimeMs>,
}

impl Webcam {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        section_id: SectionId,
        image_urls: Vec<String>,
    ) -> Self {
        Self {
            id: WebcamId::new(id),
            title: title.into(),
            image_urls,
            section_id,
            tags: Vec::new(),
            is_favorite: false,
            last_refreshed: None,
        }
    }

    /// First image source that parses as an absolute http(s) URL.
    #[must_use]
    pub fn preferred_image(&self) -> Option<&str> {
        self.image_urls
            .iter()
            .map(String::as_str)
            .find(|candidate| is_resolvable(candidate))
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Outdated once the last successful load is older than `max_age`.
    /// A webcam that never loaded is outdated.
    #[must_use]
    pub fn is_outdated(&self, now: UnixTimeMs, max_age: Duration) -> bool {
        match self.last_refreshed {
            Some(at) => now.elapsed_since(at) > max_age,
            None => true,
        }
    }

    pub(crate) fn sort_key(&self) -> (&str, &str) {
        (self.title.as_str(), self.id.as_str())
    }
}

fn is_resolvable(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(id),
            title: title.into(),
        }
    }

    /// Members of this section ordered by (title, id). The returned iterator is
    /// `Clone`, so it can be restarted without touching the catalog again.
    #[must_use]
    pub fn sorted_webcams<'a>(
        &self,
        catalog: &'a crate::catalog::CatalogStore,
    ) -> crate::catalog::SortedWebcams<'a> {
        catalog.sorted_webcams(&self.id)
    }
}

//! Persistence for the catalog, favorites and settings.
//!
//! Writes are synchronous: when a call returns `Ok`, the record is on disk
//! (or in memory for [`MemoryStorage`]) and callers may announce the change.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::catalog::CatalogSeed;
use crate::error::{AppError, ErrorKind};
use crate::model::WebcamId;
use crate::settings::{Settings, StoredSettings};

#[derive(Error, Debug)]
pub enum StorageError {
    #[cfg(not(target_arch = "wasm32"))]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let kind = match e {
            StorageError::Serialization(_) => ErrorKind::Serialization,
            _ => ErrorKind::Storage,
        };
        AppError::new(kind, e.to_string())
    }
}

/// Records keyed by stable id. Read everything at launch, write on mutation.
///
/// `save_catalog` also drops the favorites of webcams the new catalog no
/// longer contains, in the same write.
pub trait CatalogStorage: Send {
    fn load_catalog(&self) -> Result<Option<CatalogSeed>, StorageError>;
    fn save_catalog(&mut self, seed: &CatalogSeed) -> Result<(), StorageError>;
    fn load_favorites(&self) -> Result<BTreeSet<WebcamId>, StorageError>;
    fn save_favorite(&mut self, id: &WebcamId, is_favorite: bool) -> Result<(), StorageError>;
    fn load_settings(&self) -> Result<StoredSettings, StorageError>;
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    catalog: Option<CatalogSeed>,
    favorites: BTreeSet<WebcamId>,
    settings: StoredSettings,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(seed: CatalogSeed) -> Self {
        Self {
            catalog: Some(seed),
            ..Self::default()
        }
    }
}

impl CatalogStorage for MemoryStorage {
    fn load_catalog(&self) -> Result<Option<CatalogSeed>, StorageError> {
        Ok(self.catalog.clone())
    }

    fn save_catalog(&mut self, seed: &CatalogSeed) -> Result<(), StorageError> {
        self.favorites.retain(|id| seed.contains_webcam(id));
        self.catalog = Some(seed.clone());
        Ok(())
    }

    fn load_favorites(&self) -> Result<BTreeSet<WebcamId>, StorageError> {
        Ok(self.favorites.clone())
    }

    fn save_favorite(&mut self, id: &WebcamId, is_favorite: bool) -> Result<(), StorageError> {
        if is_favorite {
            self.favorites.insert(id.clone());
        } else {
            self.favorites.remove(id);
        }
        Ok(())
    }

    fn load_settings(&self) -> Result<StoredSettings, StorageError> {
        Ok(self.settings)
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        self.settings = settings.stored();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use sqlite::SqliteStorage;

#[cfg(not(target_arch = "wasm32"))]
mod sqlite {
    use rusqlite::{params, Connection, OptionalExtension};
    use std::collections::BTreeSet;
    use std::path::Path;
    use tracing::{debug, info, instrument, warn};

    use super::{CatalogStorage, StorageError};
    use crate::catalog::{CatalogSeed, SectionSeed, WebcamSeed};
    use crate::model::{SectionId, WebcamId};
    use crate::settings::{
        Settings, StoredSettings, KEY_AUTOREFRESH, KEY_AUTOREFRESH_INTERVAL, KEY_DARK_THEME,
    };

    const SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS sections (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            position    INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS webcams (
            id          TEXT PRIMARY KEY,
            section_id  TEXT NOT NULL,
            title       TEXT NOT NULL,
            image_urls  TEXT NOT NULL,
            tags        TEXT NOT NULL,
            position    INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webcams_section_id ON webcams(section_id);
        CREATE TABLE IF NOT EXISTS favorites (
            webcam_id   TEXT PRIMARY KEY
        );
        CREATE TABLE IF NOT EXISTS settings (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL
        );
    ";

    /// SQLite-backed storage, one connection, used from the app's single
    /// update sequence.
    pub struct SqliteStorage {
        conn: Connection,
    }

    impl SqliteStorage {
        #[instrument(skip(path), fields(path = %path.as_ref().display()))]
        pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
            let conn = Connection::open(path.as_ref())?;
            let storage = Self { conn };
            storage.init_schema()?;
            info!("catalog database ready");
            Ok(storage)
        }

        pub fn open_in_memory() -> Result<Self, StorageError> {
            let storage = Self {
                conn: Connection::open_in_memory()?,
            };
            storage.init_schema()?;
            Ok(storage)
        }

        fn init_schema(&self) -> Result<(), StorageError> {
            self.conn.execute_batch(SCHEMA)?;
            Ok(())
        }

        fn read_setting<T: serde::de::DeserializeOwned>(
            &self,
            key: &str,
        ) -> Result<Option<T>, StorageError> {
            let raw: Option<String> = self
                .conn
                .query_row("SELECT value FROM settings WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?;

            Ok(raw.and_then(|value| match serde_json::from_str(&value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(key, error = %e, "ignoring unreadable setting");
                    None
                }
            }))
        }
    }

    fn position(i: usize) -> i64 {
        i64::try_from(i).unwrap_or(i64::MAX)
    }

    impl CatalogStorage for SqliteStorage {
        #[instrument(skip(self))]
        fn load_catalog(&self) -> Result<Option<CatalogSeed>, StorageError> {
            let mut stmt = self
                .conn
                .prepare("SELECT id, title FROM sections ORDER BY position ASC")?;
            let mut sections = stmt
                .query_map([], |row| {
                    Ok(SectionSeed {
                        id: SectionId::new(row.get::<_, String>(0)?),
                        title: row.get(1)?,
                        webcams: Vec::new(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            if sections.is_empty() {
                return Ok(None);
            }

            let mut stmt = self.conn.prepare(
                "SELECT id, section_id, title, image_urls, tags FROM webcams ORDER BY position ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (id, section_id, title, image_urls, tags) in rows {
                let Some(section) = sections.iter_mut().find(|s| s.id.as_str() == section_id)
                else {
                    warn!(webcam_id = %id, section_id, "dropping webcam of unknown section");
                    continue;
                };
                section.webcams.push(WebcamSeed {
                    id: WebcamId::new(id),
                    title,
                    image_urls: serde_json::from_str(&image_urls)?,
                    tags: serde_json::from_str(&tags)?,
                });
            }

            debug!(sections = sections.len(), "catalog loaded");
            Ok(Some(CatalogSeed { sections }))
        }

        #[instrument(skip(self, seed), fields(sections = seed.sections.len()))]
        fn save_catalog(&mut self, seed: &CatalogSeed) -> Result<(), StorageError> {
            let tx = self.conn.transaction()?;
            tx.execute("DELETE FROM webcams", [])?;
            tx.execute("DELETE FROM sections", [])?;

            let mut webcam_position = 0usize;
            for (i, section) in seed.sections.iter().enumerate() {
                tx.execute(
                    "INSERT INTO sections (id, title, position) VALUES (?1, ?2, ?3)",
                    params![section.id.as_str(), section.title, position(i)],
                )?;
                for webcam in &section.webcams {
                    tx.execute(
                        "INSERT INTO webcams (id, section_id, title, image_urls, tags, position)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            webcam.id.as_str(),
                            section.id.as_str(),
                            webcam.title,
                            serde_json::to_string(&webcam.image_urls)?,
                            serde_json::to_string(&webcam.tags)?,
                            position(webcam_position),
                        ],
                    )?;
                    webcam_position += 1;
                }
            }

            let dropped = tx.execute(
                "DELETE FROM favorites WHERE webcam_id NOT IN (SELECT id FROM webcams)",
                [],
            )?;

            tx.commit()?;
            info!(webcams = webcam_position, dropped_favorites = dropped, "catalog saved");
            Ok(())
        }

        fn load_favorites(&self) -> Result<BTreeSet<WebcamId>, StorageError> {
            let mut stmt = self.conn.prepare("SELECT webcam_id FROM favorites")?;
            let favorites = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|id| id.map(WebcamId::new))
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok(favorites)
        }

        #[instrument(skip(self), fields(webcam_id = %id))]
        fn save_favorite(&mut self, id: &WebcamId, is_favorite: bool) -> Result<(), StorageError> {
            if is_favorite {
                self.conn.execute(
                    "INSERT OR IGNORE INTO favorites (webcam_id) VALUES (?1)",
                    params![id.as_str()],
                )?;
            } else {
                self.conn.execute(
                    "DELETE FROM favorites WHERE webcam_id = ?1",
                    params![id.as_str()],
                )?;
            }
            Ok(())
        }

        fn load_settings(&self) -> Result<StoredSettings, StorageError> {
            Ok(StoredSettings {
                is_dark_theme: self.read_setting(KEY_DARK_THEME)?,
                should_autorefresh: self.read_setting(KEY_AUTOREFRESH)?,
                autorefresh_interval_secs: self.read_setting(KEY_AUTOREFRESH_INTERVAL)?,
            })
        }

        #[instrument(skip(self, settings))]
        fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
            let values = [
                (KEY_DARK_THEME, serde_json::to_string(&settings.is_dark_theme())?),
                (KEY_AUTOREFRESH, serde_json::to_string(&settings.should_autorefresh())?),
                (
                    KEY_AUTOREFRESH_INTERVAL,
                    serde_json::to_string(&settings.autorefresh_interval_secs())?,
                ),
            ];

            let tx = self.conn.transaction()?;
            for (key, value) in values {
                tx.execute(
                    "INSERT INTO settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
            }
            tx.commit()?;
            Ok(())
        }
    }
}

//! Settings store — owns the on-disk settings document.
//!
//! [`SettingsStore`] keeps the last successfully persisted document in memory
//! and funnels every mutation through [`SettingsStore::save`]:
//!
//! ```text
//! update(|doc| …) ── lock ──▶ clone current ──▶ mutate ──▶ write temp file
//!                                                         ──▶ fsync ──▶ rename over settings.json
//!                                                         ──▶ replace in-memory copy
//! ```
//!
//! The rename is atomic, so a failed write leaves the previous good document
//! in place on disk *and* in memory. The mutex makes concurrent writers (two
//! render events reconciling at once) take turns.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use super::settings::{ConfigDocument, FieldRule};
use super::AppPaths;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors surfaced by the settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the document or creating its directory failed.
    #[error("settings I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document is not valid JSON for the schema.
    #[error("settings document at {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be serialised.
    #[error("failed to serialise settings: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing or renaming the replacement file failed; the previous
    /// document is untouched.
    #[error("failed to save settings to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

/// Explicitly owned settings store; share it behind an `Arc`.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<ConfigDocument>,
}

impl SettingsStore {
    /// Open the store at the platform-appropriate `settings.json`.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(AppPaths::new().settings_file)
    }

    /// Open the store at `path`.
    ///
    /// On first run (no file) the seed document is written immediately so the
    /// GUI and later loads see the same values.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let (doc, existed) = read_document(&path)?;
        if !existed {
            log::info!("store: no settings at {}, writing seed defaults", path.display());
            write_atomic(&path, &doc)?;
        }
        Ok(Self {
            path,
            current: Mutex::new(doc),
        })
    }

    /// Path of the persisted document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current document.
    pub fn load(&self) -> ConfigDocument {
        self.lock().clone()
    }

    /// Persist `doc` atomically and make it the current document.
    pub fn save(&self, doc: ConfigDocument) -> Result<(), StoreError> {
        let mut current = self.lock();
        write_atomic(&self.path, &doc)?;
        *current = doc;
        Ok(())
    }

    /// Run `f` on a copy of the current document inside the writer critical
    /// section and persist the result.
    ///
    /// Nothing is written when `f` leaves the document unchanged. Returns the
    /// resulting document.
    pub fn update<F>(&self, f: F) -> Result<ConfigDocument, StoreError>
    where
        F: FnOnce(&mut ConfigDocument),
    {
        let mut current = self.lock();
        let mut next = current.clone();
        f(&mut next);
        if next != *current {
            write_atomic(&self.path, &next)?;
            *current = next.clone();
        }
        Ok(next)
    }

    /// Rule for `(note_type_id, field_name)`, if one is registered.
    pub fn get_field_rule(&self, note_type_id: &str, field_name: &str) -> Option<FieldRule> {
        self.lock().field_rule(note_type_id, field_name).cloned()
    }

    /// Insert or replace a single rule and persist.
    pub fn upsert_field_rule(
        &self,
        note_type_id: &str,
        field_name: &str,
        rule: FieldRule,
    ) -> Result<(), StoreError> {
        self.update(|doc| doc.set_field_rule(note_type_id, field_name, rule))
            .map(|_| ())
    }

    /// Overwrite the persisted document with the shipped seed values.
    pub fn reset_to_defaults(&self) -> Result<ConfigDocument, StoreError> {
        let doc = ConfigDocument::default();
        self.save(doc.clone())?;
        log::info!("store: settings reset to defaults");
        Ok(doc)
    }

    fn lock(&self) -> MutexGuard<'_, ConfigDocument> {
        // A panic while holding the lock cannot leave a half-written document:
        // the in-memory copy is only replaced after a successful write.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Persistence helpers
// ---------------------------------------------------------------------------

/// Read the document at `path`; returns the seed document and `false` when
/// the file does not exist.
fn read_document(path: &Path) -> Result<(ConfigDocument, bool), StoreError> {
    if !path.exists() {
        return Ok((ConfigDocument::default(), false));
    }
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((doc, true))
}

/// Write `doc` to a temp file next to `path`, fsync it, then rename it over
/// `path`.
fn write_atomic(path: &Path, doc: &ConfigDocument) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(doc)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let save_err = |source: std::io::Error| StoreError::Save {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(&parent).map_err(save_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(save_err)?;
    tmp.write_all(content.as_bytes()).map_err(save_err)?;
    tmp.as_file().sync_all().map_err(save_err)?;
    tmp.persist(path).map_err(|e| save_err(e.error))?;

    log::debug!("store: saved settings to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

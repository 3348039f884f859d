//! Persisted theme preference
//!
//! A single `"light"`/`"dark"` literal stored under one key. Reads fall back
//! through the ambient OS preference to [`ColorScheme::Dark`]; writes that
//! fail are logged and otherwise ignored, leaving the in-memory value
//! authoritative for the session.

use crate::platform::AmbientPreference;
use crate::scheme::ColorScheme;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Default storage key
pub const DEFAULT_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference storage is unavailable")]
    Unavailable,
    #[error("failed to access preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preference file {path} is not a JSON object: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value storage behind the preference store
pub trait PreferenceBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory backend; clones share the same entries
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: Rc<RefCell<FxHashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let backend = Self::new();
        backend
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        backend
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a flat JSON object on disk
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than blocking the write
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StoreError::Malformed { .. }) => Map::new(),
            Err(err) => return Err(err),
        };
        map.insert(key.to_string(), Value::String(value.to_string()));

        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map)).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content).map_err(io_err)
    }
}

/// Storage that is always unavailable (disabled or blocked storage)
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableBackend;

impl PreferenceBackend for UnavailableBackend {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

/// Reads and writes the single theme preference
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    key: String,
    current: ColorScheme,
}

impl PreferenceStore {
    pub fn new(backend: impl PreferenceBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            key: DEFAULT_KEY.to_string(),
            current: ColorScheme::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve the startup scheme: persisted value, then ambient, then dark
    pub fn read_initial(&mut self, ambient: &dyn AmbientPreference) -> ColorScheme {
        let scheme = self
            .persisted()
            .or_else(|| ambient.scheme())
            .unwrap_or_default();
        tracing::debug!(%scheme, key = %self.key, "resolved initial color scheme");
        self.current = scheme;
        scheme
    }

    /// The valid persisted value, if any. Storage errors read as absent.
    pub fn persisted(&self) -> Option<ColorScheme> {
        let raw = match self.backend.load(&self.key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::debug!(error = %err, "preference storage read failed");
                return None;
            }
        };
        match raw.parse::<ColorScheme>() {
            Ok(scheme) => Some(scheme),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring persisted preference");
                None
            }
        }
    }

    /// Write `scheme` through. The in-memory value is updated even when the
    /// backend refuses the write.
    pub fn commit(&mut self, scheme: ColorScheme) {
        self.current = scheme;
        if let Err(err) = self.backend.save(&self.key, scheme.as_str()) {
            tracing::warn!(error = %err, %scheme, "could not persist color scheme");
        }
    }

    /// The session's authoritative value
    pub fn current(&self) -> ColorScheme {
        self.current
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("key", &self.key)
            .field("current", &self.current)
            .finish()
    }
}

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;

use crate::io::migrate::{self, LegacyFiles, MigrateError};
use crate::model::state::{HistoryState, PersistedState};

const STATE_FILE: &str = "state.json";
const HISTORY_FILE: &str = ".history.json";
const LEGACY_TODOS: &str = "todos.json";
const LEGACY_TAGS: &str = "todo-tags.json";
const LEGACY_SUBTASKS: &str = "subtasks.json";
const LEGACY_THEME: &str = "theme";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not serialize state: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("could not load state: {0}")]
    MigrateError(#[from] MigrateError),
}

/// Load/save contract between the session and wherever state lives.
///
/// `load` returns `Ok(None)` when there is nothing stored yet. The undo
/// history is optional, best-effort data; stores that can't keep it use the
/// default no-op methods.
pub trait StateStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;

    fn load_history(&self) -> Option<HistoryState> {
        None
    }

    fn save_history(&self, _history: &HistoryState) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// State kept as JSON files in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    fn read_optional(&self, name: &str) -> Result<Option<String>, StoreError> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadError { path, source }),
        }
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::WriteError {
            path: self.dir.clone(),
            source,
        })?;
        atomic_write(path, content).map_err(|source| StoreError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Copy an unreadable file to `<name>.bak` so the session can start fresh
    fn back_up_corrupt(&self, name: &str, reason: &dyn std::fmt::Display) {
        let path = self.dir.join(name);
        let bak = self.dir.join(format!("{}.bak", name));
        match fs::copy(&path, &bak) {
            Ok(_) => tracing::warn!(
                path = %path.display(),
                backup = %bak.display(),
                "could not parse {} ({}); starting with an empty list",
                name,
                reason
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                "could not parse {} ({}) and backup failed: {}",
                name,
                reason,
                e
            ),
        }
    }

    fn load_legacy(&self) -> Result<Option<PersistedState>, StoreError> {
        let files = LegacyFiles {
            todos: self.read_optional(LEGACY_TODOS)?,
            tags: self.read_optional(LEGACY_TAGS)?,
            subtasks: self.read_optional(LEGACY_SUBTASKS)?,
            theme: self.read_optional(LEGACY_THEME)?,
        };
        if files.is_empty() {
            return Ok(None);
        }
        let state = match migrate::migrate_legacy(&files) {
            Ok(state) => state,
            Err(e) => {
                let name = match &e {
                    MigrateError::Decode { what, .. } => *what,
                    _ => LEGACY_TODOS,
                };
                self.back_up_corrupt(name, &e);
                return Ok(None);
            }
        };
        tracing::info!(
            dir = %self.dir.display(),
            tasks = state.tasks.len(),
            "migrated legacy per-key files into {}",
            STATE_FILE
        );
        self.save(&state)?;
        Ok(Some(state))
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        let Some(text) = self.read_optional(STATE_FILE)? else {
            return self.load_legacy();
        };

        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                self.back_up_corrupt(STATE_FILE, &e);
                return Ok(None);
            }
        };

        match migrate::migrate(value) {
            Ok((state, upgraded)) => {
                if upgraded {
                    tracing::info!(version = state.version, "upgraded stored state schema");
                    self.save(&state)?;
                }
                Ok(Some(state))
            }
            // Never clobber data written by a newer build
            Err(e @ MigrateError::UnsupportedVersion { .. }) => Err(e.into()),
            Err(e) => {
                self.back_up_corrupt(STATE_FILE, &e);
                Ok(None)
            }
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;
        self.write(&self.state_path(), content.as_bytes())
    }

    fn load_history(&self) -> Option<HistoryState> {
        let path = self.history_path();
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable undo history: {}", e);
                None
            }
        }
    }

    fn save_history(&self, history: &HistoryState) -> Result<(), StoreError> {
        let content = serde_json::to_string(history)?;
        self.write(&self.history_path(), content.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store that keeps state in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<Option<PersistedState>>>,
    history: Rc<RefCell<Option<HistoryState>>>,
    saves: Rc<Cell<usize>>,
    fail_saves: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `state`
    pub fn with_state(state: PersistedState) -> Self {
        let store = Self::default();
        store.state.replace(Some(state));
        store
    }

    /// The last saved state
    pub fn snapshot(&self) -> Option<PersistedState> {
        self.state.borrow().clone()
    }

    pub fn history(&self) -> Option<HistoryState> {
        self.history.borrow().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Make subsequent saves fail, as a full disk would
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_saves.get() {
            return Err(StoreError::WriteError {
                path: PathBuf::from("<memory>"),
                source: io::Error::other("storage quota exceeded"),
            });
        }
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, StoreError> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        self.check_writable()?;
        self.state.replace(Some(state.clone()));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load_history(&self) -> Option<HistoryState> {
        self.history.borrow().clone()
    }

    fn save_history(&self, history: &HistoryState) -> Result<(), StoreError> {
        self.check_writable()?;
        self.history.replace(Some(history.clone()));
        Ok(())
    }
}

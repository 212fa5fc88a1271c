use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::{Catalog, Session};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access session log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session log {} is not valid session data: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("session log {} could not be read earlier, refusing to overwrite it", .path.display())]
    Unreadable { path: PathBuf },

    #[error("failed to serialize sessions: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable home of the whole session list
pub trait SessionStore {
    /// Read every stored session. A store that was never written is empty.
    fn load(&self) -> Result<Vec<Session>, StoreError>;
    /// Replace the stored list with `sessions`.
    fn save_all(&self, sessions: &[Session]) -> Result<(), StoreError>;
}

/// Session list kept as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sessions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> Result<Vec<Session>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session log yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let sessions: Vec<Session> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        debug!(count = sessions.len(), "loaded session log");
        Ok(sessions)
    }

    fn save_all(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let data = serde_json::to_vec_pretty(sessions)?;

        // write beside the target and rename over it, so a crash mid-write
        // leaves the previous document in place
        let tmp_path = self.tmp_path();
        let write_tmp = || -> io::Result<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&data)?;
            tmp.sync_all()
        };
        if let Err(e) = write_tmp().and_then(|()| fs::rename(&tmp_path, &self.path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.io_err(e));
        }

        debug!(count = sessions.len(), path = %self.path.display(), "saved session log");
        Ok(())
    }
}

/// The in-memory canonical copy of the session log.
///
/// Loaded once, appended to, and written through to its store in full after
/// every append. Readers take cheap snapshots that later appends never touch.
pub struct SessionLog<S: SessionStore> {
    store: S,
    sessions: Arc<Vec<Session>>,
    version: u64,
    load_error: Option<StoreError>,
}

impl<S: SessionStore> SessionLog<S> {
    /// Load the log. Unreadable or corrupt data starts an empty log instead
    /// of failing; the cause stays available from [`SessionLog::load_error`].
    pub fn open(store: S, catalog: &Catalog) -> Self {
        let (sessions, load_error): (Vec<Session>, _) = match store.load() {
            Ok(sessions) => (
                sessions
                    .into_iter()
                    .map(|s| s.normalized(catalog))
                    .collect(),
                None,
            ),
            Err(e) => {
                warn!("starting with an empty session log: {e}");
                (Vec::new(), Some(e))
            }
        };

        Self {
            store,
            sessions: Arc::new(sessions),
            version: 0,
            load_error,
        }
    }

    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn snapshot(&self) -> Arc<Vec<Session>> {
        Arc::clone(&self.sessions)
    }

    /// Bumped on every append
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Add a session and persist the whole log. On a failed write the
    /// session stays in memory; calling [`SessionLog::persist`] retries.
    ///
    /// A log whose file could not be read at all is never written, since
    /// that would replace the history on disk. A corrupt one is.
    pub fn append(&mut self, session: Session) -> Result<(), StoreError> {
        self.ensure_writable()?;
        Arc::make_mut(&mut self.sessions).push(session);
        self.version += 1;
        self.persist()?;
        info!(total = self.sessions.len(), "session recorded");
        Ok(())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.store.save_all(&self.sessions)
    }

    /// Fails when writing would clobber a log that could not be read.
    pub fn ensure_writable(&self) -> Result<(), StoreError> {
        match &self.load_error {
            Some(StoreError::Io { path, .. }) => Err(StoreError::Unreadable {
                path: path.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

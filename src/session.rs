use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT;
use crate::practice::PracticeSnapshot;
use crate::solve::SolveEntry;
use crate::stats::{compute_session_stats, SessionStats};
use crate::timer::SolveResult;

/// Persisted form of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub selected_event: String,
    pub current_scramble: String,
    #[serde(default)]
    pub solve_history: Vec<SolveEntry>,
}

/// The solves of one practice session, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    selected_event: String,
    current_scramble: String,
    history: Vec<SolveEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT, String::new())
    }
}

impl Session {
    pub fn new(event_id: &str, scramble: String) -> Self {
        Self {
            selected_event: event_id.to_string(),
            current_scramble: scramble,
            history: Vec::new(),
        }
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            selected_event: snapshot.selected_event,
            current_scramble: snapshot.current_scramble,
            history: snapshot.solve_history,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected_event: self.selected_event.clone(),
            current_scramble: self.current_scramble.clone(),
            solve_history: self.history.clone(),
        }
    }

    pub fn selected_event(&self) -> &str {
        &self.selected_event
    }

    pub fn current_scramble(&self) -> &str {
        &self.current_scramble
    }

    pub fn history(&self) -> &[SolveEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Change event. Solves already recorded stay in the history.
    pub fn select_event(&mut self, event_id: &str) {
        self.selected_event = event_id.to_string();
    }

    pub fn set_scramble(&mut self, scramble: String) {
        self.current_scramble = scramble;
    }

    /// Append a finished solve under the current event and scramble
    pub fn record(&mut self, result: SolveResult, created_at_ms: i64) -> &SolveEntry {
        let entry = SolveEntry {
            id: self.fresh_id(created_at_ms),
            elapsed_ms: result.elapsed_ms,
            event_id: self.selected_event.clone(),
            scramble_text: self.current_scramble.clone(),
            created_at_ms,
            inspection_outcome: result.inspection_outcome,
        };
        tracing::debug!(id = %entry.id, event = %entry.event_id, "solve recorded");
        self.history.push(entry);
        &self.history[self.history.len() - 1]
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn stats(&self) -> SessionStats {
        compute_session_stats(&self.history)
    }

    fn fresh_id(&self, created_at_ms: i64) -> String {
        loop {
            let id = format!("{created_at_ms:x}-{:08x}", rand::random::<u32>());
            if !self.history.iter().any(|e| e.id == id) {
                return id;
            }
        }
    }
}

const MAX_SESSION_ID_LEN: usize = 64;

/// Storage ids map one to one onto file names, so only a plain
/// alphabet is accepted.
pub fn validate_session_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidSessionId(id.to_string()))
    }
}

/// Load and save session snapshots by storage id.
///
/// Each id also has an optional practice round stored alongside it.
pub trait SessionStore {
    /// `None` when nothing valid is stored under `id`
    fn load(&self, id: &str) -> Option<SessionSnapshot>;
    fn save(&self, id: &str, snapshot: &SessionSnapshot) -> Result<()>;

    fn load_practice(&self, id: &str) -> Option<PracticeSnapshot>;
    fn save_practice(&self, id: &str, snapshot: &PracticeSnapshot) -> Result<()>;
    /// Forget the practice round. Nothing stored is not an error.
    fn remove_practice(&self, id: &str) -> Result<()>;
}

/// One JSON file per storage id
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let dir = AppDirs::sessions_dir().unwrap_or_else(|| PathBuf::from("cubetime_sessions"));
        Self { dir }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_session_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    // `.` never appears in a valid id, so this cannot collide with a session
    fn practice_path_for(&self, id: &str) -> Result<PathBuf> {
        validate_session_id(id)?;
        Ok(self.dir.join(format!("{id}.practice.json")))
    }

    fn write_json<T: Serialize>(&self, path: PathBuf, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_vec_pretty(value)?;
        fs::write(path, data)?;
        Ok(())
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, id: &str) -> Option<SessionSnapshot> {
        let path = self.path_for(id).ok()?;
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice::<SessionSnapshot>(&bytes) {
            Ok(snapshot) if !snapshot.selected_event.is_empty() => Some(snapshot),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "ignoring session without an event");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session");
                None
            }
        }
    }

    fn save(&self, id: &str, snapshot: &SessionSnapshot) -> Result<()> {
        self.write_json(self.path_for(id)?, snapshot)
    }

    fn load_practice(&self, id: &str) -> Option<PracticeSnapshot> {
        let path = self.practice_path_for(id).ok()?;
        let bytes = fs::read(&path).ok()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable practice round");
            })
            .ok()
    }

    fn save_practice(&self, id: &str, snapshot: &PracticeSnapshot) -> Result<()> {
        self.write_json(self.practice_path_for(id)?, snapshot)
    }

    fn remove_practice(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.practice_path_for(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

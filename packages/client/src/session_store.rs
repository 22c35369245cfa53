//! Session Store: the authenticated identity, persisted as JSON on disk.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// `{userId, username}` resolved by login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: i64,
    pub username: String,
}

/// File-backed session storage
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/pairline/session.json`
    pub fn default_path() -> Result<PathBuf, ClientError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ClientError::SessionStore("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("pairline").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session. A missing or unreadable file means "not logged in".
    pub fn load(&self) -> Option<Session> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&contents) {
            Ok(session) => {
                tracing::debug!(
                    "Loaded session for {} from {}",
                    session.username,
                    self.path.display()
                );
                Some(session)
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::SessionStore(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ClientError::SessionStore(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| ClientError::SessionStore(e.to_string()))?;

        tracing::info!("Session saved for {}", session.username);
        Ok(())
    }

    /// Remove the stored session. Clearing an empty store succeeds.
    pub fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::SessionStore(e.to_string())),
        }
    }
}

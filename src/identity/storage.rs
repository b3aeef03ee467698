//! Local persistence for the issued session.
//!
//! The browser client keeps its session in local storage so a reload picks
//! it back up; here the same role is played by a JSON file, or by memory
//! when nothing should outlive the process.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::{IdentityError, Session};

pub trait SessionStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns [`IdentityError::Storage`] if the stored session is unreadable.
    fn load(&self) -> Result<Option<Session>, IdentityError>;

    /// # Errors
    ///
    /// Returns [`IdentityError::Storage`] if the session cannot be written.
    fn save(&self, session: &Session) -> Result<(), IdentityError>;

    /// # Errors
    ///
    /// Returns [`IdentityError::Storage`] if the stored session cannot be removed.
    fn clear(&self) -> Result<(), IdentityError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Session>>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>, IdentityError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &Session) -> Result<(), IdentityError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), IdentityError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>, IdentityError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IdentityError::Storage(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| IdentityError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, session: &Session) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IdentityError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| IdentityError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| IdentityError::Storage(format!("{}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), IdentityError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IdentityError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

//! Token persistence.
//!
//! A single record per upstream service, written on every mutation so
//! the credential survives restarts. The backend is pluggable; the
//! default writes one JSON file atomically (temp file + rename).

use std::fs;
use std::path::PathBuf;

use qbo_types::TokenState;

use crate::error::AppResult;

/// Durable storage for one [`TokenState`] record.
pub trait TokenStore: Send + Sync {
    /// Read the persisted record. `Ok(None)` when nothing is stored yet.
    fn load(&self) -> AppResult<Option<TokenState>>;

    /// Upsert the record.
    fn save(&self, state: &TokenState) -> AppResult<()>;

    /// Delete the record.
    fn clear(&self) -> AppResult<()>;
}

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AppResult<Option<TokenState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let state: TokenState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    fn save(&self, state: &TokenState) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");

        // Write to temp file first, then atomic rename
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_state() -> TokenState {
        TokenState {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Some(Utc::now()),
            company_id: Some("9130350".to_string()),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        assert!(store.load().unwrap().is_none());

        let state = sample_state();
        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, state.access_token);
        assert_eq!(loaded.company_id, state.company_id);
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        store.save(&sample_state()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("tokens.json"));
        store.save(&sample_state()).unwrap();
        assert!(store.load().unwrap().is_some());
    }
}

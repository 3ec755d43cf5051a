//! File-backed credential persistence.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so a reader never sees a truncated document at the token path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};

/// Persisted credential storage at a fixed path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store writing to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credential.
    ///
    /// Returns `Ok(None)` if no token file exists.
    pub fn load(&self) -> AuthResult<Option<Credential>> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            AuthError::storage(format!(
                "failed to read token file {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e)
        })?;

        Credential::from_json(&content).map(Some)
    }

    /// Serializes and saves a credential, replacing any previous file.
    pub fn save(&self, credential: &Credential) -> AuthResult<()> {
        let content = credential.to_json()?;
        self.write_atomic(&content)
    }

    fn write_atomic(&self, content: &str) -> AuthResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::storage(format!(
                    "failed to create token directory {}: {}",
                    parent.display(),
                    e
                ))
                .with_source(e)
            })?;
        }

        let temp_path = self.temp_path();

        if let Err(e) = write_private(&temp_path, content) {
            let _ = fs::remove_file(&temp_path);
            return Err(AuthError::storage(format!(
                "failed to write token file {}: {}",
                temp_path.display(),
                e
            ))
            .with_source(e));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(AuthError::storage(format!(
                "failed to replace token file {}: {}",
                self.path.display(),
                e
            ))
            .with_source(e));
        }

        info!("saved credential to {:?}", self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Creates (or truncates) `path` and writes `content`, owner-only on Unix.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorCode;

    fn credential(token: &str) -> Credential {
        Credential::new(token, vec!["scope1".to_string()]).with_refresh_token("refresh")
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));

        store.save(&credential("first")).unwrap();
        assert!(store.path().exists());

        let loaded = CredentialStore::new(store.path()).load().unwrap().unwrap();
        assert_eq!(loaded, credential("first"));
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));

        store
            .save(&credential("a-much-longer-first-token").with_expires_in(3600))
            .unwrap();
        let second = Credential::new("b", vec![]);
        store.save(&second).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, second.to_json().unwrap());
        assert_eq!(content, r#"{"token":"b","scopes":[]}"#);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&credential("abc")).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("token.json")]);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("token.json"));
        store.save(&credential("abc")).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_onto_directory_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("token.json");
        fs::create_dir(&target).unwrap();

        let store = CredentialStore::new(&target);
        let err = store.save(&credential("abc")).unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::StorageError);
        assert!(target.is_dir());
        assert!(!dir.path().join("token.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&credential("abc")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        fs::write(store.path(), "{").unwrap();
        assert!(store.load().is_err());
    }
}

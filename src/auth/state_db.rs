//! Token source backed by the desktop client's SQLite state database.
//!
//! The client keeps its session in `ItemTable` under the
//! `antigravityAuthStatus` key as a JSON document whose `apiKey` field holds
//! the bearer token. The client refreshes it on its own, so a forced refresh
//! here simply re-reads the row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{CredentialError, CredentialSource, mask_token};

/// Row key holding the auth status document.
pub const AUTH_STATUS_KEY: &str = "antigravityAuthStatus";

/// Reads tokens from `state.vscdb`.
pub struct StateDbCredentials {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl StateDbCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<String, CredentialError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_token(&path))
            .await
            .map_err(|e| CredentialError::storage(format!("spawn_blocking join error: {e}")))?
    }
}

fn read_token(path: &Path) -> Result<String, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::unavailable(format!(
            "state database not found at {}",
            path.display()
        )));
    }

    let conn = rusqlite::Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let raw: String = conn
        .query_row(
            "SELECT value FROM ItemTable WHERE key = ?",
            [AUTH_STATUS_KEY],
            |r| r.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                CredentialError::unavailable("not signed in (no auth status row)")
            }
            other => other.into(),
        })?;

    let status: Value = serde_json::from_str(&raw)
        .map_err(|e| CredentialError::storage(format!("Failed to parse auth status: {e}")))?;

    status
        .get("apiKey")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CredentialError::unavailable("auth status has no apiKey"))
}

#[async_trait]
impl CredentialSource for StateDbCredentials {
    async fn get_token(&self) -> Result<String, CredentialError> {
        if let Some(token) = self.cached.read().await.clone() {
            return Ok(token);
        }
        let token = self.read().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn force_refresh(&self) -> Result<String, CredentialError> {
        self.cached.write().await.take();
        let token = self.read().await?;
        debug!(token = %mask_token(&token), "Re-read token from state database");
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    fn name(&self) -> &str {
        "state_db"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_db(dir: &tempfile::TempDir, value: Option<&str>) -> PathBuf {
        let path = dir.path().join("state.vscdb");
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
            [],
        )
        .unwrap();
        if let Some(value) = value {
            conn.execute(
                "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
                [AUTH_STATUS_KEY, value],
            )
            .unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_reads_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_db(&dir, Some(r#"{"name":"a","email":"a@b.c","apiKey":"ya29.token-one"}"#));
        let source = StateDbCredentials::new(path);
        assert_eq!(source.get_token().await.unwrap(), "ya29.token-one");
    }

    #[tokio::test]
    async fn test_force_refresh_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_db(&dir, Some(r#"{"apiKey":"first"}"#));
        let source = StateDbCredentials::new(path.clone());
        assert_eq!(source.get_token().await.unwrap(), "first");

        write_db(&dir, Some(r#"{"apiKey":"second"}"#));
        assert_eq!(source.get_token().await.unwrap(), "first");
        assert_eq!(source.force_refresh().await.unwrap(), "second");
        assert_eq!(source.get_token().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = StateDbCredentials::new("/nonexistent/state.vscdb");
        assert!(matches!(
            source.get_token().await,
            Err(CredentialError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_row_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_db(&dir, None);
        let source = StateDbCredentials::new(path);
        assert!(matches!(
            source.get_token().await,
            Err(CredentialError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_db(&dir, Some(r#"{"name":"signed out"}"#));
        let source = StateDbCredentials::new(path);
        assert!(matches!(
            source.force_refresh().await,
            Err(CredentialError::Unavailable(_))
        ));
    }
}

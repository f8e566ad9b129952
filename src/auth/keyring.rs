//! Token source backed by the OS keyring.
//!
//! Feature-gated behind `system-keyring`.

use async_trait::async_trait;
use tracing::instrument;

use super::{CredentialError, CredentialSource};

/// Default keyring service name.
pub const DEFAULT_SERVICE: &str = "ccgate";

/// Default keyring account name.
pub const DEFAULT_ACCOUNT: &str = "cloudcode";

/// Reads the token stored under `(service, account)`.
#[derive(Debug, Clone)]
pub struct KeyringCredentials {
    service: String,
    account: String,
}

impl Default for KeyringCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE, DEFAULT_ACCOUNT)
    }
}

impl KeyringCredentials {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    async fn read(&self) -> Result<String, CredentialError> {
        let service = self.service.clone();
        let account = self.account.clone();
        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &account)?;
            let token = entry.get_password()?;
            if token.trim().is_empty() {
                return Err(CredentialError::unavailable("keyring entry is empty"));
            }
            Ok(token.trim().to_string())
        })
        .await
        .map_err(|e| CredentialError::storage(format!("spawn_blocking join error: {e}")))?
    }
}

#[async_trait]
impl CredentialSource for KeyringCredentials {
    #[instrument(skip(self))]
    async fn get_token(&self) -> Result<String, CredentialError> {
        self.read().await
    }

    #[instrument(skip(self))]
    async fn force_refresh(&self) -> Result<String, CredentialError> {
        self.read().await
    }

    fn name(&self) -> &str {
        "keyring"
    }
}

//! The credential collaborator consumed by the gateway core.

use crate::auth::error::CredentialError;

/// Supplies the bearer token sent to the backend.
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current token. Implementations may serve it from a cache.
    async fn get_token(&self) -> Result<String, CredentialError>;

    /// Drop any cached token and obtain a fresh one.
    async fn force_refresh(&self) -> Result<String, CredentialError>;

    /// Short name for logs and `/health`.
    fn name(&self) -> &str;
}

//! Token source reading an environment variable.

use async_trait::async_trait;

use super::{CredentialError, CredentialSource};

/// Reads the token from an environment variable on every call, so a refresh
/// picks up a value exported after startup.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    fn read(&self) -> Result<String, CredentialError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(CredentialError::unavailable(format!("{} is not set", self.var))),
        }
    }
}

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn get_token(&self) -> Result<String, CredentialError> {
        self.read()
    }

    async fn force_refresh(&self) -> Result<String, CredentialError> {
        self.read()
    }

    fn name(&self) -> &str {
        "env"
    }
}

/// A fixed token. Used by tests and for one-off runs.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn get_token(&self) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }

    async fn force_refresh(&self) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_env_missing_is_unavailable() {
        let source = EnvCredentials::new("CCGATE_TEST_TOKEN_SURELY_UNSET");
        assert!(matches!(
            source.get_token().await,
            Err(CredentialError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticCredentials::new("tok");
        assert_eq!(source.get_token().await.unwrap(), "tok");
        assert_eq!(source.force_refresh().await.unwrap(), "tok");
        assert_eq!(source.name(), "static");
    }
}

//! Error types for the credential layer.

/// Errors raised by a [`CredentialSource`](super::CredentialSource).
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No credential can be produced right now.
    #[error("Credential unavailable: {0}")]
    Unavailable(String),

    /// The backing store could not be read.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CredentialError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        CredentialError::Unavailable(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        CredentialError::Storage(msg.into())
    }
}

impl From<rusqlite::Error> for CredentialError {
    fn from(e: rusqlite::Error) -> Self {
        CredentialError::Storage(format!("SQLite error: {e}"))
    }
}

#[cfg(feature = "system-keyring")]
impl From<keyring::Error> for CredentialError {
    fn from(e: keyring::Error) -> Self {
        match e {
            keyring::Error::NoEntry => CredentialError::Unavailable("no keyring entry".to_string()),
            other => CredentialError::Storage(format!("Keyring error: {other}")),
        }
    }
}

//! Credential sources for the backend bearer token.

pub mod env;
pub mod error;
#[cfg(feature = "system-keyring")]
pub mod keyring;
pub mod state_db;
pub mod traits;

pub use env::{EnvCredentials, StaticCredentials};
pub use error::CredentialError;
#[cfg(feature = "system-keyring")]
pub use self::keyring::KeyringCredentials;
pub use state_db::StateDbCredentials;
pub use traits::CredentialSource;

/// Redact a token for logs and responses.
///
/// Tokens of 12 characters or fewer are fully hidden; longer tokens keep
/// their first and last four characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

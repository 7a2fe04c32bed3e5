//! Minimal account handling: registration, cookie sessions, and logout.
//!
//! Passwords are stored as SHA-256 hex digests and session tokens are
//! opaque random strings mapped to usernames in storage. There is no
//! expiry bookkeeping server-side; the cookie's max age bounds a session's
//! useful life.

use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{Storage, StorageError};

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "wiki_session";

/// Cookie lifetime in seconds (30 days).
pub const SESSION_MAX_AGE: u64 = 60 * 60 * 24 * 30;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error("Username too short")]
    UsernameTooShort,

    #[error("Password must be at least 4 characters")]
    PasswordTooShort,

    #[error("Username already taken")]
    UsernameTaken,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// SHA-256 hex digest of a password.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Registers a new account. The username is trimmed before validation.
pub async fn register(storage: &dyn Storage, username: &str, password: &str) -> AuthResult<String> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if username.chars().count() < 2 {
        return Err(AuthError::UsernameTooShort);
    }
    if password.chars().count() < 4 {
        return Err(AuthError::PasswordTooShort);
    }
    if storage.user_exists(username).await? {
        return Err(AuthError::UsernameTaken);
    }

    storage.set_user(username, &hash_password(password)).await?;
    tracing::info!(%username, "registered new user");
    Ok(username.to_string())
}

/// Verifies credentials and opens a session. Returns the session token,
/// or `None` when the username or password is wrong.
pub async fn login(
    storage: &dyn Storage,
    username: &str,
    password: &str,
) -> AuthResult<Option<String>> {
    let username = username.trim();
    let Some(stored_hash) = storage.get_user(username).await? else {
        return Ok(None);
    };
    if stored_hash != hash_password(password) {
        return Ok(None);
    }

    let token = new_session_token();
    storage.set_session(&token, username).await?;
    tracing::info!(%username, "opened session");
    Ok(Some(token))
}

/// Username for a session token, or `None` when the token is unknown.
pub async fn verify_session(storage: &dyn Storage, token: &str) -> AuthResult<Option<String>> {
    if token.is_empty() {
        return Ok(None);
    }
    Ok(storage.get_session(token).await?)
}

/// Closes a session. Unknown tokens are ignored.
pub async fn logout(storage: &dyn Storage, token: &str) -> AuthResult<()> {
    if !token.is_empty() {
        storage.delete_session(token).await?;
    }
    Ok(())
}

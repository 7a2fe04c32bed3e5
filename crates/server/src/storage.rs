//! Storage abstraction for users, sessions, and per-user read logs.
//!
//! Two interchangeable backends implement the same capability trait:
//! [`JsonStorage`] keeps everything in a directory of JSON files (local
//! development), and [`UpstashStorage`] talks to an Upstash Redis REST
//! endpoint (hosted deployments). The backend is selected once at startup
//! from the environment; nothing in the article pipeline depends on this
//! module.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use vitalis_core::safe_filename;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key-value request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key-value store rejected request: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Capability interface over the two interchangeable backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Password hash for a username, or `None` when unregistered.
    async fn get_user(&self, username: &str) -> StorageResult<Option<String>>;

    async fn set_user(&self, username: &str, password_hash: &str) -> StorageResult<()>;

    async fn user_exists(&self, username: &str) -> StorageResult<bool> {
        Ok(self.get_user(username).await?.is_some())
    }

    async fn get_all_users(&self) -> StorageResult<HashMap<String, String>>;

    async fn set_session(&self, session_id: &str, username: &str) -> StorageResult<()>;

    /// Username for a session token, or `None` when unknown.
    async fn get_session(&self, session_id: &str) -> StorageResult<Option<String>>;

    async fn delete_session(&self, session_id: &str) -> StorageResult<()>;

    /// Ordered read log for a user; missing or malformed data reads as empty.
    async fn get_log(&self, username: &str) -> StorageResult<Vec<Value>>;

    async fn save_log(&self, username: &str, log: &[Value]) -> StorageResult<()>;
}

/// Selects the storage backend from the environment.
///
/// An Upstash/Vercel KV REST credential pair selects the remote backend;
/// otherwise a local JSON data directory is used (`VITALIS_DATA_DIR`,
/// default `data`).
pub fn from_env() -> Arc<dyn Storage> {
    let url = env::var("KV_REST_API_URL")
        .or_else(|_| env::var("UPSTASH_REDIS_REST_URL"))
        .ok();
    let token = env::var("KV_REST_API_TOKEN")
        .or_else(|_| env::var("UPSTASH_REDIS_REST_TOKEN"))
        .ok();

    match (url, token) {
        (Some(url), Some(token)) => {
            tracing::info!("using Upstash key-value storage backend");
            Arc::new(UpstashStorage::new(url, token))
        }
        _ => {
            let data_dir = env::var("VITALIS_DATA_DIR").unwrap_or_else(|_| "data".to_string());
            tracing::info!(%data_dir, "using local JSON storage backend");
            Arc::new(JsonStorage::new(data_dir))
        }
    }
}

/// File-based JSON storage for local development.
///
/// Users and sessions live in one JSON map file each; each user's read log
/// is its own file under `logs/`. Corrupt files read as empty rather than
/// failing the request.
pub struct JsonStorage {
    data_dir: PathBuf,
}

impl JsonStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    fn sessions_file(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }

    fn log_file(&self, username: &str) -> PathBuf {
        self.data_dir.join("logs").join(format!("{}.json", safe_filename(username)))
    }

    fn load_map(&self, path: &Path) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring corrupt storage file");
                HashMap::new()
            }
        }
    }

    fn save_map(&self, path: &Path, map: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn get_user(&self, username: &str) -> StorageResult<Option<String>> {
        Ok(self.load_map(&self.users_file()).remove(username))
    }

    async fn set_user(&self, username: &str, password_hash: &str) -> StorageResult<()> {
        let path = self.users_file();
        let mut users = self.load_map(&path);
        users.insert(username.to_string(), password_hash.to_string());
        self.save_map(&path, &users)
    }

    async fn get_all_users(&self) -> StorageResult<HashMap<String, String>> {
        Ok(self.load_map(&self.users_file()))
    }

    async fn set_session(&self, session_id: &str, username: &str) -> StorageResult<()> {
        let path = self.sessions_file();
        let mut sessions = self.load_map(&path);
        sessions.insert(session_id.to_string(), username.to_string());
        self.save_map(&path, &sessions)
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<String>> {
        Ok(self.load_map(&self.sessions_file()).remove(session_id))
    }

    async fn delete_session(&self, session_id: &str) -> StorageResult<()> {
        let path = self.sessions_file();
        let mut sessions = self.load_map(&path);
        if sessions.remove(session_id).is_some() {
            self.save_map(&path, &sessions)?;
        }
        Ok(())
    }

    async fn get_log(&self, username: &str) -> StorageResult<Vec<Value>> {
        let Ok(raw) = fs::read_to_string(self.log_file(username)) else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            _ => Ok(Vec::new()),
        }
    }

    async fn save_log(&self, username: &str, log: &[Value]) -> StorageResult<()> {
        let path = self.log_file(username);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(log)?)?;
        Ok(())
    }
}

const USERS_KEY: &str = "wiki:users";
const SESSIONS_KEY: &str = "wiki:sessions";

/// Upstash Redis REST storage for hosted deployments.
///
/// Users and sessions are hash fields; each read log is one string key
/// holding a JSON array.
pub struct UpstashStorage {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl UpstashStorage {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into(), token: token.into() }
    }

    fn log_key(username: &str) -> String {
        format!("wiki:log:{username}")
    }

    /// Executes one Redis command via the Upstash REST endpoint and
    /// returns its `result` field.
    async fn command(&self, command: &[&str]) -> StorageResult<Value> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Backend(format!("status {}", response.status())));
        }

        let body: Value = response.json().await?;
        if let Some(err) = body.get("error").and_then(Value::as_str) {
            return Err(StorageError::Backend(err.to_string()));
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl Storage for UpstashStorage {
    async fn get_user(&self, username: &str) -> StorageResult<Option<String>> {
        let result = self.command(&["HGET", USERS_KEY, username]).await?;
        Ok(result.as_str().map(str::to_string))
    }

    async fn set_user(&self, username: &str, password_hash: &str) -> StorageResult<()> {
        self.command(&["HSET", USERS_KEY, username, password_hash]).await?;
        Ok(())
    }

    async fn get_all_users(&self) -> StorageResult<HashMap<String, String>> {
        // HGETALL comes back as a flat [field, value, ...] array.
        let result = self.command(&["HGETALL", USERS_KEY]).await?;
        let mut users = HashMap::new();
        if let Value::Array(items) = result {
            for pair in items.chunks(2) {
                if let [field, value] = pair
                    && let (Some(field), Some(value)) = (field.as_str(), value.as_str())
                {
                    users.insert(field.to_string(), value.to_string());
                }
            }
        }
        Ok(users)
    }

    async fn set_session(&self, session_id: &str, username: &str) -> StorageResult<()> {
        self.command(&["HSET", SESSIONS_KEY, session_id, username]).await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<String>> {
        let result = self.command(&["HGET", SESSIONS_KEY, session_id]).await?;
        Ok(result.as_str().map(str::to_string))
    }

    async fn delete_session(&self, session_id: &str) -> StorageResult<()> {
        self.command(&["HDEL", SESSIONS_KEY, session_id]).await?;
        Ok(())
    }

    async fn get_log(&self, username: &str) -> StorageResult<Vec<Value>> {
        let result = self.command(&["GET", &Self::log_key(username)]).await?;
        let Some(raw) = result.as_str() else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            _ => Ok(Vec::new()),
        }
    }

    async fn save_log(&self, username: &str, log: &[Value]) -> StorageResult<()> {
        let payload = serde_json::to_string(&json!(log))?;
        self.command(&["SET", &Self::log_key(username), &payload]).await?;
        Ok(())
    }
}

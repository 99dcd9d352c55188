use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::portal::Session;

const SESSION_FILE: &str = "session.json";

/// Session persisted between CLI invocations, tied to the server that
/// issued it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub server: String,
    pub session: Session,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(server: impl Into<String>, session: Session) -> Self {
        Self {
            server: server.into(),
            session,
            saved_at: Utc::now(),
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("AUTHORNEST_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("authornest")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_session() -> anyhow::Result<Option<StoredSession>> {
    load_session_from(&get_config_dir()?)
}

pub fn save_session(stored: &StoredSession) -> anyhow::Result<()> {
    save_session_to(&get_config_dir()?, stored)
}

pub fn clear_session() -> anyhow::Result<()> {
    clear_session_in(&get_config_dir()?)
}

pub fn load_session_from(config_dir: &Path) -> anyhow::Result<Option<StoredSession>> {
    let session_file = config_dir.join(SESSION_FILE);

    if !session_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(session_file)?;
    let stored: StoredSession = serde_json::from_str(&content)?;
    Ok(Some(stored))
}

pub fn save_session_to(config_dir: &Path, stored: &StoredSession) -> anyhow::Result<()> {
    let session_file = config_dir.join(SESSION_FILE);

    let content = serde_json::to_string_pretty(stored)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session_in(config_dir: &Path) -> anyhow::Result<()> {
    let session_file = config_dir.join(SESSION_FILE);
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}

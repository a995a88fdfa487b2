use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::roster::Roster;
use crate::session::AuthRecord;

const DATA_DIR: &str = "roster_terminal";
const AUTH_FILE: &str = "auth.json";
const TEAMS_FILE: &str = "teams.json";

/// The two durable records, one JSON file each. Loads return owned snapshots, saves take
/// them; nothing here is cached between calls.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `ROSTER_DATA_DIR`, then the XDG data dir, then `./roster_terminal`.
    pub fn resolve(config: &AppConfig) -> Self {
        let dir = config
            .data_dir
            .clone()
            .or_else(default_data_dir)
            .unwrap_or_else(|| PathBuf::from(DATA_DIR));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_auth(&self) -> Result<AuthRecord> {
        read_record(&self.dir.join(AUTH_FILE)).context("load auth record")
    }

    pub fn save_auth(&self, auth: &AuthRecord) -> Result<()> {
        write_record(&self.dir.join(AUTH_FILE), auth).context("save auth record")
    }

    pub fn clear_auth(&self) -> Result<()> {
        remove_record(&self.dir.join(AUTH_FILE)).context("clear auth record")
    }

    pub fn load_teams(&self) -> Result<Roster> {
        read_record(&self.dir.join(TEAMS_FILE)).context("load teams record")
    }

    pub fn save_teams(&self, roster: &Roster) -> Result<()> {
        write_record(&self.dir.join(TEAMS_FILE), roster).context("save teams record")
    }

    pub fn clear_teams(&self) -> Result<()> {
        remove_record(&self.dir.join(TEAMS_FILE)).context("clear teams record")
    }
}

fn read_record<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(trimmed).with_context(|| format!("parse {}", path.display()))
}

fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let json = serde_json::to_string(value).context("serialize record")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn remove_record(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

fn default_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR),
    )
}

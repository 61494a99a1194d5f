use a11ylens_core::{Paths, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::warn;

pub const KEY_BASE_URL: &str = "base_url";
pub const KEY_AI_ENABLED: &str = "ai_enabled";
pub const KEY_SCREENSHOT_ENABLED: &str = "screenshot_enabled";
pub const KEY_REPORT_HISTORY: &str = "report_history";
pub const KEY_AUTH_TOKEN: &str = "auth_token";

/// Flat JSON key-value blob. Every write rewrites the whole file; concurrent
/// writers are not coordinated and the last one wins.
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    pub fn new(paths: &Paths) -> Self {
        Self {
            path: paths.prefs_file(),
        }
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "Preferences file is corrupt, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get(key)?.and_then(|v| v.as_bool()).unwrap_or(default))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        self.write_all(&map)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// Mobile companion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MobilePrefs {
    pub base_url: Option<String>,
    pub ai_enabled: bool,
    pub screenshot_enabled: bool,
    pub auth_token: Option<String>,
}

impl MobilePrefs {
    pub fn load(store: &PrefStore) -> Result<Self> {
        Ok(Self {
            base_url: store.get_string(KEY_BASE_URL)?,
            ai_enabled: store.get_bool(KEY_AI_ENABLED, true)?,
            screenshot_enabled: store.get_bool(KEY_SCREENSHOT_ENABLED, false)?,
            auth_token: store.get_string(KEY_AUTH_TOKEN)?,
        })
    }

    pub fn save(&self, store: &PrefStore) -> Result<()> {
        match &self.base_url {
            Some(url) => store.set(KEY_BASE_URL, Value::String(url.clone()))?,
            None => store.remove(KEY_BASE_URL)?,
        }
        store.set(KEY_AI_ENABLED, Value::Bool(self.ai_enabled))?;
        store.set(KEY_SCREENSHOT_ENABLED, Value::Bool(self.screenshot_enabled))?;
        match &self.auth_token {
            Some(token) => store.set(KEY_AUTH_TOKEN, Value::String(token.clone())),
            None => store.remove(KEY_AUTH_TOKEN),
        }
    }
}

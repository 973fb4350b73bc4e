use serde::Deserialize;
use std::path::{Path, PathBuf};

use ae_toolkit_core::store::supabase::SupabaseConfig;
use ae_toolkit_core::StoreError;

const DEFAULT_CONFIG_FILE: &str = "aet.toml";
const DEFAULT_SESSION_FILE: &str = ".aet-session.json";

/// Settings read from `aet.toml`, then overridden by the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSection {
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load the explicit file if given (it must exist), otherwise
    /// `aet.toml` in the working directory when present.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e).into())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank("SUPABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = non_blank("SUPABASE_KEY") {
            self.store.anon_key = Some(key);
        }
        if let Some(path) = non_blank("AET_SESSION_FILE") {
            self.session.path = Some(PathBuf::from(path));
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }

    pub fn supabase(&self) -> Result<SupabaseConfig, StoreError> {
        let url = self.store.url.clone().ok_or_else(|| {
            StoreError::Config("store URL missing: set SUPABASE_URL or [store] url".into())
        })?;
        let anon_key = self.store.anon_key.clone().ok_or_else(|| {
            StoreError::Config("store key missing: set SUPABASE_KEY or [store] anon_key".into())
        })?;
        let mut config = SupabaseConfig::new(url, anon_key);
        if let Some(timeout) = self.store.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_toml_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [store]
            url = "https://abc.supabase.co"
            anon_key = "anon"
            timeout_seconds = 5

            [session]
            path = "/tmp/aet.json"
            "#,
        )
        .unwrap();
        let store = config.supabase().unwrap();
        assert_eq!(store.url, "https://abc.supabase.co");
        assert_eq!(store.timeout_seconds, 5);
        assert_eq!(config.session_path(), PathBuf::from("/tmp/aet.json"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::from_toml_str("[store]\nurl = \"https://file\"\n").unwrap();
        let env: HashMap<&str, &str> =
            [("SUPABASE_URL", "https://env"), ("SUPABASE_KEY", "k"), ("AET_SESSION_FILE", " ")]
                .into_iter()
                .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.store.url.as_deref(), Some("https://env"));
        assert_eq!(config.store.anon_key.as_deref(), Some("k"));
        assert_eq!(config.session_path(), PathBuf::from(DEFAULT_SESSION_FILE));
    }

    #[test]
    fn test_missing_store_settings() {
        let config = AppConfig::default();
        assert!(matches!(config.supabase(), Err(StoreError::Config(_))));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUPABASE_URL_ENV: &str = "ANIMESHELF_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "ANIMESHELF_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub metadata: MetadataConfig,

    pub backend: BackendConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Language of user-facing messages: "en" or "es"
    pub locale: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            locale: "en".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub base_url: String,

    /// Per-request timeout. Requests are never retried.
    pub timeout_ms: u64,

    /// Ask the metadata service to leave out adult titles
    pub sfw: bool,

    pub seasonal_limit: u32,

    /// Quiet period after the last keystroke before a search is sent
    pub search_debounce_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            timeout_ms: 2000,
            sfw: true,
            seasonal_limit: 12,
            search_debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database on this machine
    #[default]
    Embedded,
    /// Hosted Supabase project (GoTrue + PostgREST)
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    pub database_path: String,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    pub supabase_url: String,

    pub supabase_anon_key: String,

    pub request_timeout_secs: u64,

    /// Where the current session is kept between runs.
    /// Defaults to `<data dir>/animeshelf/session.json`.
    pub session_file: Option<String>,

    /// Redirect target handed to the OAuth provider
    pub oauth_redirect_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Embedded,
            database_path: "sqlite:data/animeshelf.db".to_string(),
            max_db_connections: 5,
            min_db_connections: 1,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            request_timeout_secs: 10,
            session_file: None,
            oauth_redirect_url: None,
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub fn session_file_path(&self) -> PathBuf {
        if let Some(path) = &self.session_file {
            return PathBuf::from(path);
        }

        dirs::data_dir()
            .map(|dir| dir.join("animeshelf").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("data").join("session.json"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Lifetime of an access token issued by the embedded backend
    pub session_ttl_secs: i64,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            session_ttl_secs: 3600,
            min_password_length: 6,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            metadata: MetadataConfig::default(),
            backend: BackendConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Supabase credentials may come from the environment (or `.env`) instead of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(SUPABASE_URL_ENV) {
            self.backend.supabase_url = url;
        }
        if let Ok(key) = std::env::var(SUPABASE_ANON_KEY_ENV) {
            self.backend.supabase_anon_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("animeshelf").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".animeshelf").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Supabase {
            if self.backend.supabase_url.trim().is_empty() {
                anyhow::bail!("backend.supabase_url cannot be empty when kind = \"supabase\"");
            }
            if self.backend.supabase_anon_key.trim().is_empty() {
                anyhow::bail!("backend.supabase_anon_key cannot be empty when kind = \"supabase\"");
            }
            url::Url::parse(&self.backend.supabase_url).context("Invalid backend.supabase_url")?;
        }

        url::Url::parse(&self.metadata.base_url).context("Invalid metadata.base_url")?;

        if self.metadata.timeout_ms == 0 {
            anyhow::bail!("metadata.timeout_ms must be > 0");
        }

        if !(1..=25).contains(&self.metadata.seasonal_limit) {
            anyhow::bail!("metadata.seasonal_limit must be between 1 and 25");
        }

        if self.security.session_ttl_secs <= 0 {
            anyhow::bail!("security.session_ttl_secs must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.metadata.timeout_ms, 2000);
        assert_eq!(config.metadata.seasonal_limit, 12);
        assert_eq!(config.metadata.search_debounce_ms, 500);
        assert_eq!(config.backend.kind, BackendKind::Embedded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[metadata]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("kind = \"embedded\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [backend]
            kind = "supabase"
            supabase_url = "https://demo.supabase.co"
            supabase_anon_key = "anon"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.backend.kind, BackendKind::Supabase);
        assert!(config.validate().is_ok());

        assert_eq!(config.metadata.base_url, "https://api.jikan.moe/v4");
    }

    #[test]
    fn test_supabase_requires_credentials() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Supabase;
        assert!(config.validate().is_err());

        config.backend.supabase_url = "https://demo.supabase.co".to_string();
        assert!(config.validate().is_err());

        config.backend.supabase_anon_key = "anon".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seasonal_limit_bounds() {
        let mut config = Config::default();
        config.metadata.seasonal_limit = 0;
        assert!(config.validate().is_err());
        config.metadata.seasonal_limit = 26;
        assert!(config.validate().is_err());
    }
}

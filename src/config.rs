use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{
    APIFY_TOKEN_ENV, APIFY_TOKEN_PREFIX, SOCIAVAULT_KEY_ENV, SOCIAVAULT_KEY_PREFIX,
};
use crate::error::{FinderError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Which provider backs a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Apify,
    Sociavault,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidates requested from the sound search
    pub sound_limit: usize,
    pub default_max_results: usize,
    pub max_results_cap: usize,
    pub enrichment_concurrency: usize,
    /// Optional floor below which the best candidate is rejected
    pub min_match_score: Option<i32>,
    /// Fallback keyword video search
    pub keyword_source: Provider,
    pub profile_source: Provider,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sound_limit: 10,
            default_max_results: 5,
            max_results_cap: 10,
            enrichment_concurrency: 3,
            min_match_score: None,
            keyword_source: Provider::Sociavault,
            profile_source: Provider::Apify,
        }
    }
}

impl SearchConfig {
    /// Clamp a caller-supplied limit into `1..=max_results_cap`
    pub fn clamp_max_results(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_results)
            .clamp(1, self.max_results_cap.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    /// Zero disables the token bucket
    pub requests_per_min: u32,
    /// Zero disables the concurrency cap
    pub concurrency: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            requests_per_min: 60,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory of the daily-rolled JSON log
    pub dir: String,
    pub file: bool,
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            file: true,
            filter: "artist_finder=info,warn".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FinderError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.search.sound_limit == 0 {
            return Err(FinderError::Config("search.sound_limit must be at least 1".into()));
        }
        if self.search.max_results_cap == 0 {
            return Err(FinderError::Config("search.max_results_cap must be at least 1".into()));
        }
        if self.http.timeout_seconds == 0 {
            return Err(FinderError::Config("http.timeout_seconds must be at least 1".into()));
        }
        Ok(())
    }
}

/// Provider credentials read from the environment (after `.env` is loaded)
#[derive(Clone, Default)]
pub struct Credentials {
    pub apify_token: Option<String>,
    pub sociavault_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("apify_token", &self.apify_token.as_ref().map(|_| "***"))
            .field("sociavault_key", &self.sociavault_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            apify_token: read(APIFY_TOKEN_ENV),
            sociavault_key: read(SOCIAVAULT_KEY_ENV),
        }
    }

    pub fn apify_token(&self) -> Result<&str> {
        validated(self.apify_token.as_deref(), APIFY_TOKEN_ENV, APIFY_TOKEN_PREFIX)
    }

    pub fn sociavault_key(&self) -> Result<&str> {
        validated(self.sociavault_key.as_deref(), SOCIAVAULT_KEY_ENV, SOCIAVAULT_KEY_PREFIX)
    }
}

fn validated<'a>(value: Option<&'a str>, name: &str, prefix: &str) -> Result<&'a str> {
    match value {
        None => Err(FinderError::Config(format!("{} is not set", name))),
        Some(v) if !v.starts_with(prefix) => Err(FinderError::Config(format!(
            "{} is malformed (expected prefix '{}')",
            name, prefix
        ))),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.sound_limit, 10);
        assert_eq!(config.search.default_max_results, 5);
        assert_eq!(config.search.enrichment_concurrency, 3);
        assert_eq!(config.search.keyword_source, Provider::Sociavault);
        assert_eq!(config.search.profile_source, Provider::Apify);
        assert_eq!(config.http.timeout_seconds, 60);
        assert_eq!(config.server.addr, "127.0.0.1:3000");
        assert_eq!(config.logging.dir, "logs");
        assert!(config.logging.file);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[search]\nsound_limit = 20\nmin_match_score = 5\nkeyword_source = \"apify\"\nprofile_source = \"sociavault\"\n\n[http]\ntimeout_seconds = 15"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.search.sound_limit, 20);
        assert_eq!(config.search.min_match_score, Some(5));
        assert_eq!(config.search.keyword_source, Provider::Apify);
        assert_eq!(config.search.profile_source, Provider::Sociavault);
        assert_eq!(config.http.timeout_seconds, 15);
        assert_eq!(config.http.requests_per_min, 60);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nsound_limit = 0").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.is_configuration());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[search]\nprofile_source = \"myspace\"").unwrap();
        assert!(Config::load(file.path()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.search.max_results_cap, 10);
    }

    #[test]
    fn test_clamp_max_results() {
        let search = SearchConfig::default();
        assert_eq!(search.clamp_max_results(None), 5);
        assert_eq!(search.clamp_max_results(Some(0)), 1);
        assert_eq!(search.clamp_max_results(Some(50)), 10);
        assert_eq!(search.clamp_max_results(Some(3)), 3);
    }

    #[test]
    fn test_credential_validation() {
        let creds = Credentials {
            apify_token: Some("apify_api_abc".into()),
            sociavault_key: Some("pk_test_abc".into()),
        };
        assert_eq!(creds.apify_token().unwrap(), "apify_api_abc");
        assert!(creds.sociavault_key().unwrap_err().is_configuration());
        assert!(Credentials::default().apify_token().unwrap_err().is_configuration());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials {
            apify_token: Some("apify_api_secret".into()),
            sociavault_key: None,
        };
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}

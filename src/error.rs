use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },
}

impl FinderError {
    /// Configuration failures are the only errors that escape a resolution;
    /// everything else is an upstream problem that degrades to "no data".
    pub fn is_configuration(&self) -> bool {
        matches!(self, FinderError::Config(_) | FinderError::Toml(_))
    }

    pub fn api(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        FinderError::Api {
            provider,
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_configuration() {
        assert!(FinderError::Config("missing token".into()).is_configuration());
        assert!(!FinderError::api("apify", 502, "bad gateway").is_configuration());
        let toml_err = toml::from_str::<toml::Value>("sound_limit = ").unwrap_err();
        assert!(FinderError::from(toml_err).is_configuration());
    }

    #[test]
    fn test_api_error_message_names_provider() {
        let err = FinderError::api("sociavault", 429, "rate limited");
        assert_eq!(err.to_string(), "sociavault API error (429): rate limited");
    }
}

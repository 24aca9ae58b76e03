use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    /// Reads `DONEZO_API_URL`, `DONEZO_TOKEN`, `DONEZO_EMAIL` and
    /// `DONEZO_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_url = match non_empty("DONEZO_API_URL") {
            Some(url) => normalize_api_url(&url)?,
            None => DEFAULT_API_URL.to_string(),
        };

        Ok(Self {
            api_url,
            token: non_empty("DONEZO_TOKEN"),
            email: non_empty("DONEZO_EMAIL"),
            password: non_empty("DONEZO_PASSWORD"),
        })
    }
}

pub fn normalize_api_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            name: "DONEZO_API_URL",
            value: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.token, None);
    }

    #[test]
    fn trims_trailing_slashes_and_ignores_blank_values() {
        let config = config(&[
            ("DONEZO_API_URL", "https://todo.example.com/"),
            ("DONEZO_TOKEN", "  "),
            ("DONEZO_EMAIL", "user@example.com"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://todo.example.com");
        assert_eq!(config.token, None);
        assert_eq!(config.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn rejects_url_without_scheme() {
        assert!(matches!(
            config(&[("DONEZO_API_URL", "localhost:8080")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}

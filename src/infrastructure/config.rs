use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::application::FanOut;
use crate::domain::{ports::FieldSelection, DomainError};

pub const DEFAULT_CONFIG_PATH: &str = "config/search.yaml";
pub const CONFIG_PATH_ENV: &str = "SEARCH_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Weaviate,
    Qdrant,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weaviate" => Ok(Self::Weaviate),
            "qdrant" => Ok(Self::Qdrant),
            "memory" => Ok(Self::Memory),
            other => Err(DomainError::config(format!("unknown store backend: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub weaviate: WeaviateConfig,
    pub qdrant: QdrantConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeaviateConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub fan_out: FanOut,
    /// Per-search deadline. No deadline when unset.
    pub timeout_ms: Option<u64>,
    pub title_field: String,
    pub body_field: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fan_out: FanOut::Sequential,
            timeout_ms: None,
            title_field: "title".to_string(),
            body_field: "body".to_string(),
        }
    }
}

impl SearchConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn fields(&self) -> FieldSelection {
        FieldSelection::new(&self.title_field, &self.body_field)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads `SEARCH_CONFIG` (or `config/search.yaml`), then applies environment
    /// overrides. A missing default file yields the built-in defaults; a
    /// missing file that was asked for explicitly is an error.
    pub fn load() -> Result<Self, DomainError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| DomainError::config(format!("failed to read {path}: {e}")))?;
            Self::from_yaml(&raw)?
        } else if explicit.is_some() {
            return Err(DomainError::config(format!("config file not found: {path}")));
        } else {
            Self::default()
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| DomainError::config(format!("invalid config: {e}")))
    }

    /// Applies environment-style overrides from `lookup` and validates the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DomainError::config(format!("invalid SERVER_PORT: {port}")))?;
        }
        if let Some(backend) = lookup("STORE_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(url) = lookup("WEAVIATE_URL") {
            self.store.weaviate.url = url;
        }
        if let Some(key) = lookup("WEAVIATE_API_KEY") {
            self.store.weaviate.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.store.qdrant.url = url;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.store.qdrant.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(timeout) = lookup("SEARCH_TIMEOUT_MS") {
            let ms = timeout
                .parse()
                .map_err(|_| DomainError::config(format!("invalid SEARCH_TIMEOUT_MS: {timeout}")))?;
            self.search.timeout_ms = Some(ms);
        }
        if let Some(fan_out) = lookup("SEARCH_FAN_OUT") {
            self.search.fan_out = fan_out.parse()?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let url = match self.store.backend {
            StoreBackend::Weaviate => Some(("store.weaviate.url", &self.store.weaviate.url)),
            StoreBackend::Qdrant => Some(("store.qdrant.url", &self.store.qdrant.url)),
            StoreBackend::Memory => None,
        };
        if let Some((name, url)) = url {
            if url.trim().is_empty() {
                return Err(DomainError::config(format!("{name} must not be empty")));
            }
        }
        if self.store.weaviate.timeout_ms == 0 {
            return Err(DomainError::config("store.weaviate.timeout_ms must be positive"));
        }
        if self.search.timeout_ms == Some(0) {
            return Err(DomainError::config("search.timeout_ms must be positive"));
        }
        if self.search.title_field.trim().is_empty() || self.search.body_field.trim().is_empty() {
            return Err(DomainError::config("search field names must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.backend, StoreBackend::Weaviate);
        assert_eq!(config.search.fan_out, FanOut::Sequential);
        assert_eq!(config.search.deadline(), None);
        assert_eq!(config.search.fields(), FieldSelection::default());
    }

    #[test]
    fn test_partial_yaml() {
        let config = AppConfig::from_yaml(
            r#"
store:
  backend: qdrant
  qdrant:
    url: http://qdrant:6334
search:
  fan_out: concurrent
  timeout_ms: 2500
  body_field: content
logging:
  format: json
"#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Qdrant);
        assert_eq!(config.store.qdrant.url, "http://qdrant:6334");
        assert_eq!(config.search.fan_out, FanOut::Concurrent);
        assert_eq!(config.search.deadline(), Some(Duration::from_millis(2500)));
        assert_eq!(config.search.fields().body, "content");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .with_overrides(env(&[
                ("SERVER_PORT", "9090"),
                ("STORE_BACKEND", "memory"),
                ("SEARCH_FAN_OUT", "concurrent"),
                ("WEAVIATE_API_KEY", ""),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.search.fan_out, FanOut::Concurrent);
        assert_eq!(config.store.weaviate.api_key, None);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        assert!(AppConfig::default()
            .with_overrides(env(&[("SERVER_PORT", "eighty")]))
            .is_err());
        assert!(AppConfig::default()
            .with_overrides(env(&[("STORE_BACKEND", "pinecone")]))
            .is_err());
        assert!(AppConfig::default()
            .with_overrides(env(&[("SEARCH_TIMEOUT_MS", "0")]))
            .is_err());
    }

    #[test]
    fn test_empty_backend_url_rejected() {
        let mut config = AppConfig::default();
        config.store.weaviate.url = " ".to_string();
        assert!(matches!(config.validate(), Err(DomainError::Config(_))));

        config.store.backend = StoreBackend::Memory;
        assert!(config.validate().is_ok());
    }
}

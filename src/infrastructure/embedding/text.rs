use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError};
use crate::infrastructure::config::EmbeddingConfig;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI embedding model used to vectorize search concepts. The provider
/// client is built once and shared by every `embed` call.
pub struct TextEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    /// Fails when `OPENAI_API_KEY` is not set, so a misconfigured deployment
    /// is caught at startup instead of on the first search.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        if std::env::var(API_KEY_ENV).map_or(true, |key| key.trim().is_empty()) {
            return Err(DomainError::config(format!(
                "{API_KEY_ENV} is required for the qdrant backend"
            )));
        }

        Ok(Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let model = self.client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text)
            .map_err(|e| DomainError::unavailable(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::unavailable(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(|(_doc, emb)| emb.first().vec.into_iter().map(|x| x as f32).collect())
            .ok_or_else(|| DomainError::internal_store("no embedding returned"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_and_missing_key() {
        let config = EmbeddingConfig::default();
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                let embedding = TextEmbedding::from_config(&config).unwrap();
                assert_eq!(embedding.dimension(), config.dimension);
                assert_eq!(embedding.model, config.model);
            }
            _ => assert!(matches!(
                TextEmbedding::from_config(&config),
                Err(DomainError::Config(_))
            )),
        }
    }
}

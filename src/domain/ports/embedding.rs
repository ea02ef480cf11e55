use crate::domain::errors::DomainError;
use async_trait::async_trait;

/// Turns a textual concept into a vector for stores that only search by vector.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;
    fn dimension(&self) -> usize;
}

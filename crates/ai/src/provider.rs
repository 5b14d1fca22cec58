use async_trait::async_trait;

use crate::EmbedError;

/// Maps a free-text query to a fixed-length vector in the same space as the
/// stored camera embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbedError>;

  /// Dimensionality every returned vector is checked against.
  fn dimensions(&self) -> usize;
}

/// Maps a camera still (encoded image bytes) into the same vector space as
/// [`EmbeddingProvider`] queries.
#[async_trait]
pub trait ImageEmbeddingProvider: Send + Sync {
  async fn embed_image(&self, image: &[u8]) -> Result<Vec<f32>, EmbedError>;

  fn dimensions(&self) -> usize;
}

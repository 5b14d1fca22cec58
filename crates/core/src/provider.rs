use async_trait::async_trait;

use crate::Candidate;

/// Failure of a camera storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Db(#[from] sea_orm::DbErr),

  #[error("camera store unavailable: {0}")]
  Unavailable(String),
}

/// Knobs forwarded to the similarity search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
  /// Maximum number of rows to return.
  pub match_count: u64,
  /// Rows whose similarity (`1 - distance`) does not exceed this are
  /// filtered out by the store.
  pub match_threshold: f64,
}

impl Default for SearchParams {
  fn default() -> Self {
    Self {
      match_count: 25,
      match_threshold: 0.0,
    }
  }
}

/// Nearest-neighbour lookup over the stored camera embeddings.
#[async_trait]
pub trait SimilaritySearchProvider: Send + Sync {
  /// Candidates with `distance` set, sorted by ascending distance.
  async fn search(
    &self,
    embedding: &[f32],
    params: SearchParams,
  ) -> Result<Vec<Candidate>, StoreError>;
}

/// Unranked sample of known cameras, used when ranked search has nothing.
#[async_trait]
pub trait CameraSource: Send + Sync {
  async fn sample(&self, limit: u64) -> Result<Vec<Candidate>, StoreError>;
}

/// Write side used by the indexer.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
  /// Every known camera id, in a stable order.
  async fn camera_ids(&self) -> Result<Vec<String>, StoreError>;

  /// Replace a camera's embedding and mark it indexed. Returns the number of
  /// rows touched, zero when the camera is unknown.
  async fn store_embedding(&self, camera_id: &str, embedding: &[f32]) -> Result<u64, StoreError>;
}
